//! Resolver building blocks.
//!
//! A [`Resolver`] produces the value of one schema field from the parent
//! document and the field arguments. Resolvers are plain data: cheap to
//! clone, `Send + Sync`, and their futures own everything they touch, so
//! the executor may run any number of them concurrently.

pub mod container;
pub mod date;
pub mod factory;
pub mod polymorphic;
pub mod yaml;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::ApiResult;

/// Field arguments, converted to JSON.
pub type Args = Map<String, Value>;

pub type ResolverFuture = Pin<Box<dyn Future<Output = ApiResult<Value>> + Send + 'static>>;

#[derive(Clone)]
pub struct Resolver(Arc<dyn Fn(&Value, &Args) -> ResolverFuture + Send + Sync>);

impl Resolver {
    /// Wrap a function of `(parent, args)`. Whatever the returned future needs
    /// from the parent or the arguments must be extracted before it is built.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(&Value, &Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<Value>> + Send + 'static,
    {
        Self(Arc::new(move |parent, args| Box::pin(f(parent, args))))
    }

    pub fn resolve(&self, parent: &Value, args: &Args) -> ResolverFuture {
        (self.0)(parent, args)
    }
}

/// Picks the concrete object type for a value of a union or interface type.
#[derive(Clone)]
pub struct TypeResolver(Arc<dyn Fn(&Value) -> ApiResult<&'static str> + Send + Sync>);

impl TypeResolver {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> ApiResult<&'static str> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn resolve(&self, value: &Value) -> ApiResult<&'static str> {
        (self.0)(value)
    }
}

/// String attribute of a document, if present and non-empty.
pub fn attribute(document: &Value, name: &str) -> Option<String> {
    document
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
