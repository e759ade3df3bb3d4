//! Task families and their discriminator-based type resolution.
//!
//! Each family lists its `type` tags in declaration order; resolution scans
//! that table and takes the first match. A tag the table does not know is a
//! data/schema mismatch and fails with `UnknownVariant`.

use serde_json::Value;
use tracing::error;

use super::TypeResolver;
use crate::error::{ApiError, ApiResult};

pub trait TaskFamily: Copy + 'static {
    /// Name of the abstract schema type.
    const FAMILY: &'static str;

    /// `(type tag, variant)` pairs, in declaration order.
    const VARIANTS: &'static [(&'static str, Self)];

    /// Concrete schema type for the variant.
    fn type_name(self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeforeBuildTaskKind {
    Copy,
    Interpolate,
}

impl TaskFamily for BeforeBuildTaskKind {
    const FAMILY: &'static str = "BeforeBuildTask";

    const VARIANTS: &'static [(&'static str, Self)] = &[
        ("copy", Self::Copy),
        ("interpolate", Self::Interpolate),
    ];

    fn type_name(self) -> &'static str {
        match self {
            Self::Copy => "CopyBeforeBuildTask",
            Self::Interpolate => "InterpolateBeforeBuildTask",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterBuildTaskKind {
    ExecuteHostCommand,
    ExecuteServiceCommand,
    CopyAssetIntoContainer,
}

impl TaskFamily for AfterBuildTaskKind {
    const FAMILY: &'static str = "AfterBuildTask";

    const VARIANTS: &'static [(&'static str, Self)] = &[
        ("executeHostCommand", Self::ExecuteHostCommand),
        ("executeServiceCommand", Self::ExecuteServiceCommand),
        ("copyAssetIntoContainer", Self::CopyAssetIntoContainer),
    ];

    fn type_name(self) -> &'static str {
        match self {
            Self::ExecuteHostCommand => "ExecuteHostCommandAfterBuildTask",
            Self::ExecuteServiceCommand => "ExecuteServiceCommandAfterBuildTask",
            Self::CopyAssetIntoContainer => "CopyAssetIntoContainerAfterBuildTask",
        }
    }
}

/// Variant of `F` selected by the value's `type` attribute.
pub fn resolve_variant<F: TaskFamily>(value: &Value) -> ApiResult<F> {
    let tag = value.get("type").and_then(Value::as_str);
    let found = tag.and_then(|tag| {
        F::VARIANTS
            .iter()
            .find(|(known, _)| *known == tag)
            .map(|(_, variant)| *variant)
    });

    match found {
        Some(variant) => Ok(variant),
        None => {
            let tag = tag.map(str::to_string).unwrap_or_else(|| "<missing>".to_string());
            error!(family = F::FAMILY, tag = %tag, "Task value has a type unknown to the schema");
            Err(ApiError::UnknownVariant { family: F::FAMILY, tag })
        }
    }
}

/// Type resolver for the abstract schema type of family `F`.
pub fn type_resolver<F: TaskFamily>() -> TypeResolver {
    TypeResolver::new(|value| resolve_variant::<F>(value).map(F::type_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_before_build_tags() {
        let resolver = type_resolver::<BeforeBuildTaskKind>();
        assert_eq!(
            resolver.resolve(&json!({"type": "copy", "sourcePath": "a"})).unwrap(),
            "CopyBeforeBuildTask"
        );
        assert_eq!(
            resolver.resolve(&json!({"type": "interpolate"})).unwrap(),
            "InterpolateBeforeBuildTask"
        );
    }

    #[test]
    fn test_after_build_tags() {
        let resolver = type_resolver::<AfterBuildTaskKind>();
        let cases = [
            ("executeHostCommand", "ExecuteHostCommandAfterBuildTask"),
            ("executeServiceCommand", "ExecuteServiceCommandAfterBuildTask"),
            ("copyAssetIntoContainer", "CopyAssetIntoContainerAfterBuildTask"),
        ];
        for (tag, expected) in cases {
            assert_eq!(resolver.resolve(&json!({"type": tag})).unwrap(), expected);
        }
    }

    #[test]
    fn test_unknown_tag_is_fatal() {
        let err = resolve_variant::<BeforeBuildTaskKind>(&json!({"type": "executeHostCommand"})).unwrap_err();
        match err {
            ApiError::UnknownVariant { family, tag } => {
                assert_eq!(family, "BeforeBuildTask");
                assert_eq!(tag, "executeHostCommand");
            }
            other => panic!("unexpected error {:?}", other),
        }

        let err = resolve_variant::<AfterBuildTaskKind>(&json!({"type": "copy"})).unwrap_err();
        assert!(matches!(err, ApiError::UnknownVariant { family: "AfterBuildTask", .. }));
    }

    #[test]
    fn test_missing_or_non_string_tag() {
        assert!(resolve_variant::<AfterBuildTaskKind>(&json!({})).is_err());
        assert!(resolve_variant::<AfterBuildTaskKind>(&json!({"type": 1})).is_err());
        // Tags are case-sensitive.
        assert!(resolve_variant::<BeforeBuildTaskKind>(&json!({"type": "Copy"})).is_err());
    }

    #[test]
    fn test_every_variant_is_listed() {
        for (tag, variant) in BeforeBuildTaskKind::VARIANTS {
            assert_eq!(resolve_variant::<BeforeBuildTaskKind>(&json!({"type": tag})).unwrap(), *variant);
        }
        for (tag, variant) in AfterBuildTaskKind::VARIANTS {
            assert_eq!(resolve_variant::<AfterBuildTaskKind>(&json!({"type": tag})).unwrap(), *variant);
        }
    }
}
