//! In-memory repository.
//!
//! Documents are kept in insertion order, which gives list queries a stable
//! ordering. The lock is only ever held inside synchronous sections, never
//! across an `.await`.

use chrono::{SecondsFormat, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use super::collection::Collection;
use super::{Document, Filter, Repository, StoreError, StoreFuture};

pub struct MemoryRepository {
    collection: &'static Collection,
    documents: RwLock<Vec<Document>>,
}

impl MemoryRepository {
    pub fn new(collection: &'static Collection) -> Self {
        Self {
            collection,
            documents: RwLock::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Insert a document that may already carry an `id` (seed data).
    /// Runs the same validation as [`Repository::create`].
    pub fn insert(&self, document: Document) -> Result<Document, StoreError> {
        let keep_id = document
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        self.store(document, keep_id)
    }

    fn store(&self, input: Document, id: Option<String>) -> Result<Document, StoreError> {
        let Value::Object(mut attributes) = input else {
            return Err(StoreError::Validation(format!(
                "{} input must be an object",
                self.collection.name
            )));
        };

        let missing: Vec<&str> = self
            .collection
            .required
            .iter()
            .copied()
            .filter(|name| match attributes.get(*name) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            })
            .collect();
        if !missing.is_empty() {
            return Err(StoreError::Validation(format!(
                "{} is missing required attributes: {}",
                self.collection.name,
                missing.join(", ")
            )));
        }

        let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        attributes.insert("id".to_string(), Value::String(id.clone()));
        if self.collection.stamps_created_at && attributes.get("createdAt").map_or(true, Value::is_null) {
            let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            attributes.insert("createdAt".to_string(), Value::String(now));
        }
        let document = Value::Object(attributes);

        let mut documents = self.documents.write();
        if documents.iter().any(|d| d.get("id") == document.get("id")) {
            return Err(StoreError::Conflict(format!(
                "{} already contains id {}",
                self.collection.name, id
            )));
        }
        for group in self.collection.unique {
            if conflicts(&documents, &document, group) {
                return Err(StoreError::Conflict(format!(
                    "{} with the same {} already exists",
                    self.collection.name,
                    group.join(" + ")
                )));
            }
        }
        documents.push(document.clone());
        drop(documents);

        debug!(collection = self.collection.name, id = %id, "Document created");
        Ok(document)
    }
}

/// True when an existing document has the same values for every attribute in `group`.
/// Groups the candidate does not fully populate never conflict.
fn conflicts(existing: &[Document], candidate: &Document, group: &[&str]) -> bool {
    let Some(key) = group
        .iter()
        .map(|attr| candidate.get(*attr).filter(|v| !v.is_null()))
        .collect::<Option<Vec<_>>>()
    else {
        return false;
    };

    existing.iter().any(|doc| {
        group
            .iter()
            .zip(&key)
            .all(|(attr, value)| doc.get(*attr) == Some(*value))
    })
}

impl Repository for MemoryRepository {
    fn collection(&self) -> &'static Collection {
        self.collection
    }

    fn find<'a>(&'a self, filter: &'a Filter) -> StoreFuture<'a, Vec<Document>> {
        Box::pin(async move {
            let documents = self.documents.read();
            Ok(documents.iter().filter(|d| filter.matches(d)).cloned().collect())
        })
    }

    fn find_by_id<'a>(&'a self, id: &'a str) -> StoreFuture<'a, Option<Document>> {
        Box::pin(async move {
            let documents = self.documents.read();
            Ok(documents
                .iter()
                .find(|d| d.get("id").and_then(Value::as_str) == Some(id))
                .cloned())
        })
    }

    fn create(&self, input: Document) -> StoreFuture<'_, Document> {
        Box::pin(async move { self.store(input, None) })
    }

    fn remove<'a>(&'a self, id: &'a str) -> StoreFuture<'a, Option<Document>> {
        Box::pin(async move {
            let mut documents = self.documents.write();
            let position = documents
                .iter()
                .position(|d| d.get("id").and_then(Value::as_str) == Some(id));
            let removed = position.map(|idx| documents.remove(idx));
            drop(documents);

            if removed.is_some() {
                debug!(collection = self.collection.name, id = %id, "Document removed");
            }
            Ok(removed)
        })
    }
}
