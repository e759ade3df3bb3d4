use thiserror::Error;
use async_graphql::ErrorExtensions;

use crate::docker::client::DockerError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unknown {family} variant: {tag}")]
    UnknownVariant { family: &'static str, tag: String },

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(msg) => ApiError::Validation(msg),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
        }
    }
}

impl From<DockerError> for ApiError {
    fn from(err: DockerError) -> Self {
        ApiError::UpstreamUnavailable(err.to_string())
    }
}

// GraphQL integration: Add structured error codes to ApiError
impl ApiError {
    /// Convert ApiError to async_graphql::Error with structured error codes.
    /// Internal errors are sanitized to avoid leaking backend details.
    pub fn extend(self) -> async_graphql::Error {
        let (code, message) = match &self {
            ApiError::NotFound(_) => ("NOT_FOUND", self.to_string()),
            ApiError::Validation(_) => ("VALIDATION_FAILED", self.to_string()),
            ApiError::Conflict(_) => ("CONFLICT", self.to_string()),
            ApiError::UnknownVariant { .. } => ("UNKNOWN_VARIANT", self.to_string()),
            ApiError::UpstreamUnavailable(_) => ("UPSTREAM_UNAVAILABLE", self.to_string()),
            ApiError::InvalidValue(_) => ("INVALID_VALUE", self.to_string()),
            ApiError::Internal(ref detail) => {
                // Log the full detail server-side but don't expose to client
                tracing::error!("Internal error: {}", detail);
                ("INTERNAL_SERVER_ERROR", "An internal error occurred".to_string())
            }
        };

        async_graphql::Error::new(message)
            .extend_with(|_err, e| e.set("code", code))
    }
}

/// Startup-time mismatch between the resolver map and the type definitions.
/// Any of these prevents the service from serving queries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaAssemblyError {
    #[error("Failed to parse type definitions: {0}")]
    Parse(String),

    #[error("Unsupported definition in type definitions: {0}")]
    Unsupported(String),

    #[error("Duplicate resolver binding for {type_name}.{field_name}")]
    DuplicateBinding { type_name: String, field_name: String },

    #[error("Resolver map references unknown type: {0}")]
    UnknownType(String),

    #[error("Resolver map references unknown field: {type_name}.{field_name}")]
    UnknownField { type_name: String, field_name: String },

    #[error("Resolver bound to {type_name} which is not {expected}")]
    WrongKind { type_name: String, expected: &'static str },

    #[error("Missing resolver for {type_name}.{field_name}")]
    MissingResolver { type_name: String, field_name: String },

    #[error("Missing type resolver for abstract type {0}")]
    MissingTypeResolver(String),

    #[error("Missing binding for custom scalar {0}")]
    MissingScalar(String),

    #[error("Schema build failed: {0}")]
    Build(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_of(err: async_graphql::Error) -> String {
        let ext = serde_json::to_value(err.extensions).unwrap();
        ext["code"].as_str().expect("code extension").to_string()
    }

    #[test]
    fn test_codes() {
        assert_eq!(code_of(ApiError::NotFound("x".into()).extend()), "NOT_FOUND");
        assert_eq!(code_of(ApiError::Validation("x".into()).extend()), "VALIDATION_FAILED");
        assert_eq!(code_of(ApiError::Conflict("x".into()).extend()), "CONFLICT");
        assert_eq!(
            code_of(ApiError::UnknownVariant { family: "AfterBuildTask", tag: "x".into() }.extend()),
            "UNKNOWN_VARIANT"
        );
        assert_eq!(code_of(ApiError::UpstreamUnavailable("x".into()).extend()), "UPSTREAM_UNAVAILABLE");
    }

    #[test]
    fn test_internal_is_sanitized() {
        let err = ApiError::Internal("db password wrong".into()).extend();
        assert!(!err.message.contains("password"));
        assert_eq!(code_of(err), "INTERNAL_SERVER_ERROR");
    }

    #[test]
    fn test_store_error_conversion() {
        let err: ApiError = StoreError::Conflict("projects.name".into()).into();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn test_docker_error_is_upstream() {
        let err: ApiError = DockerError::ConnectionFailed("socket gone".into()).into();
        assert!(matches!(err, ApiError::UpstreamUnavailable(ref m) if m.contains("socket gone")));
    }
}
