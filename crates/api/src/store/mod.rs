//! Entity storage: the repositories every resolver factory reads from.
//!
//! Entities are JSON documents keyed by `id`. The [`Repository`] trait is the
//! seam the GraphQL layer depends on; [`memory::MemoryRepository`] is the
//! implementation shipped with the service.

pub mod collection;
pub mod memory;
pub mod seed;

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use self::collection::Collection;
use self::memory::MemoryRepository;

/// A stored entity. Always a JSON object carrying a string `id`.
pub type Document = Value;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
}

/// Match criterion for a single attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// Attribute is present and equal to the value.
    Equals(Value),
    /// `true`: attribute present and non-null. `false`: absent or null.
    #[allow(dead_code)]
    Exists(bool),
    /// Attribute present, non-null and not the empty string.
    NonEmpty,
}

impl Criterion {
    pub fn matches(&self, value: Option<&Value>) -> bool {
        match self {
            Criterion::Equals(expected) => value == Some(expected),
            Criterion::Exists(wanted) => {
                let present = !matches!(value, None | Some(Value::Null));
                present == *wanted
            }
            Criterion::NonEmpty => match value {
                None | Some(Value::Null) => false,
                Some(Value::String(s)) => !s.is_empty(),
                Some(_) => true,
            },
        }
    }
}

/// Attribute name → criterion. An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter(BTreeMap<String, Criterion>);

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(attribute.into(), Criterion::Equals(value.into()));
        self
    }

    #[allow(dead_code)]
    pub fn exists(mut self, attribute: impl Into<String>, wanted: bool) -> Self {
        self.0.insert(attribute.into(), Criterion::Exists(wanted));
        self
    }

    pub fn non_empty(mut self, attribute: impl Into<String>) -> Self {
        self.0.insert(attribute.into(), Criterion::NonEmpty);
        self
    }

    /// Equality filter over every non-null client argument.
    pub fn from_arguments(args: &Map<String, Value>) -> Self {
        let criteria = args
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.clone(), Criterion::Equals(v.clone())))
            .collect();
        Self(criteria)
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.0
            .iter()
            .all(|(attribute, criterion)| criterion.matches(document.get(attribute)))
    }
}

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Query/CRUD primitives for one entity collection.
///
/// Implementations must be `Send + Sync` so a single instance can serve
/// concurrently executing resolvers.
pub trait Repository: Send + Sync {
    fn collection(&self) -> &'static Collection;

    /// All documents matching `filter`, in a stable order.
    fn find<'a>(&'a self, filter: &'a Filter) -> StoreFuture<'a, Vec<Document>>;

    fn find_by_id<'a>(&'a self, id: &'a str) -> StoreFuture<'a, Option<Document>>;

    /// Validate and persist `input`, returning the stored document with its generated `id`.
    fn create(&self, input: Document) -> StoreFuture<'_, Document>;

    /// Delete by id, returning the document as it was before removal.
    fn remove<'a>(&'a self, id: &'a str) -> StoreFuture<'a, Option<Document>>;
}

/// One repository per entity collection.
#[derive(Clone)]
pub struct Repositories {
    pub projects: Arc<MemoryRepository>,
    pub definitions: Arc<MemoryRepository>,
    pub instances: Arc<MemoryRepository>,
    pub logs: Arc<MemoryRepository>,
    pub assets: Arc<MemoryRepository>,
    pub users: Arc<MemoryRepository>,
    pub public_ssh_keys: Arc<MemoryRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            projects: Arc::new(MemoryRepository::new(&collection::PROJECTS)),
            definitions: Arc::new(MemoryRepository::new(&collection::DEFINITIONS)),
            instances: Arc::new(MemoryRepository::new(&collection::INSTANCES)),
            logs: Arc::new(MemoryRepository::new(&collection::LOGS)),
            assets: Arc::new(MemoryRepository::new(&collection::ASSETS)),
            users: Arc::new(MemoryRepository::new(&collection::USERS)),
            public_ssh_keys: Arc::new(MemoryRepository::new(&collection::PUBLIC_SSH_KEYS)),
        }
    }

    /// Look up a repository by its collection name.
    pub fn by_name(&self, name: &str) -> Option<&Arc<MemoryRepository>> {
        [
            &self.projects,
            &self.definitions,
            &self.instances,
            &self.logs,
            &self.assets,
            &self.users,
            &self.public_ssh_keys,
        ]
        .into_iter()
        .find(|repo| repo.collection().name == name)
    }
}

impl Default for Repositories {
    fn default() -> Self {
        Self::in_memory()
    }
}
