use serde_json::Value;

use super::Resolver;
use crate::error::ApiError;
use crate::store::Document;

/// Resolver rendering the extracted value as a YAML document string.
pub fn yaml_resolver<F>(extract: F) -> Resolver
where
    F: Fn(&Document) -> Option<Value> + Send + Sync + 'static,
{
    Resolver::new(move |parent, _args| {
        let rendered = match extract(parent) {
            None | Some(Value::Null) => Ok(Value::Null),
            Some(value) => serde_yaml::to_string(&value)
                .map(Value::String)
                .map_err(|e| ApiError::Internal(format!("YAML serialization failed: {}", e))),
        };
        async move { rendered }
    })
}
