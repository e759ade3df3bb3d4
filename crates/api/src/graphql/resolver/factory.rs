//! Generic per-entity resolver factory.
//!
//! One [`ResolverFactory`] per repository serves every field that touches
//! that entity: the root `Query.project` lookup and every nested
//! `*.project` relationship use the same item resolver, differing only in
//! how the id (or, for lists, the filter) is derived from the context.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::{Args, Resolver};
use crate::error::{ApiError, ApiResult};
use crate::store::{Document, Filter, Repository};

/// Parent document → lookup id. Must be pure.
pub type IdDerivation = Arc<dyn Fn(&Document) -> Option<String> + Send + Sync>;

/// Parent document and field arguments → list filter. Must be pure.
pub type FilterDerivation = Arc<dyn Fn(&Document, &Args) -> Filter + Send + Sync>;

pub fn derive_id<F>(f: F) -> IdDerivation
where
    F: Fn(&Document) -> Option<String> + Send + Sync + 'static,
{
    Arc::new(f)
}

pub fn derive_filter<F>(f: F) -> FilterDerivation
where
    F: Fn(&Document, &Args) -> Filter + Send + Sync + 'static,
{
    Arc::new(f)
}

pub struct ResolverFactory<R: ?Sized> {
    repository: Arc<R>,
}

impl<R: Repository + ?Sized + 'static> ResolverFactory<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Single entity by id, or `null` when it does not exist.
    ///
    /// Without a derivation the id comes from the `id` argument and a missing
    /// or malformed one is a `NotFound` error. With a derivation the id comes
    /// from the parent and an underivable id is an empty relation.
    pub fn item_resolver(&self, derive: Option<IdDerivation>) -> Resolver {
        let repository = self.repository.clone();
        let collection = repository.collection().name;

        Resolver::new(move |parent, args| {
            let repository = repository.clone();
            let id = match &derive {
                Some(derive) => Ok(derive(parent).filter(|id| !id.is_empty())),
                None => id_argument(args, collection).map(Some),
            };

            async move {
                let Some(id) = id? else {
                    return Ok(Value::Null);
                };
                Ok(repository.find_by_id(&id).await?.unwrap_or(Value::Null))
            }
        })
    }

    /// All matching entities, never `null`.
    ///
    /// Without a derivation every non-null argument becomes an equality
    /// criterion, so a call without arguments lists the whole collection.
    pub fn list_resolver(&self, derive: Option<FilterDerivation>) -> Resolver {
        let repository = self.repository.clone();

        Resolver::new(move |parent, args| {
            let repository = repository.clone();
            let filter = match &derive {
                Some(derive) => derive(parent, args),
                None => Filter::from_arguments(args),
            };

            async move {
                let documents = repository.find(&filter).await?;
                Ok(Value::Array(documents))
            }
        })
    }

    /// Persist `args.input` and return the stored entity with its generated id.
    pub fn create_item_resolver(&self) -> Resolver {
        let repository = self.repository.clone();
        let collection = repository.collection().name;

        Resolver::new(move |_parent, args| {
            let repository = repository.clone();
            let input = args.get("input").cloned().unwrap_or(Value::Null);

            async move {
                if !input.is_object() {
                    return Err(ApiError::Validation(format!(
                        "{} input must be an object",
                        collection
                    )));
                }
                let created = repository.create(input).await?;
                debug!(collection, id = ?created.get("id"), "Created via mutation");
                Ok(created)
            }
        })
    }

    /// Delete by `args.id`, returning the entity as it was before removal.
    /// Unlike lookups, a missing target is an error.
    pub fn remove_item_resolver(&self) -> Resolver {
        let repository = self.repository.clone();
        let collection = repository.collection().name;

        Resolver::new(move |_parent, args| {
            let repository = repository.clone();
            let id = id_argument(args, collection);

            async move {
                let id = id?;
                repository
                    .remove(&id)
                    .await?
                    .ok_or_else(|| ApiError::NotFound(format!("{} {} does not exist", collection, id)))
            }
        })
    }

    /// First entity of the collection, or `null` when it is empty.
    pub fn single_resolver(&self) -> Resolver {
        let repository = self.repository.clone();

        Resolver::new(move |_parent, _args| {
            let repository = repository.clone();
            async move {
                let documents = repository.find(&Filter::new()).await?;
                Ok(documents.into_iter().next().unwrap_or(Value::Null))
            }
        })
    }
}

fn id_argument(args: &Args, collection: &str) -> ApiResult<String> {
    match args.get("id") {
        Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        other => Err(ApiError::NotFound(format!(
            "malformed {} id: {}",
            collection,
            other.map(Value::to_string).unwrap_or_else(|| "missing".to_string())
        ))),
    }
}
