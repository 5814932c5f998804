//! Storage façade
//!
//! The single entry point all business logic depends on. A `Storage` is
//! constructed once at startup — backed by MongoDB when a connection string
//! is configured, by the flat-file backend otherwise — and handed to (or
//! cloned into) every call site. There is no global mutable "active backend"
//! state; initialization order stays explicit and testable.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::backend::{DocumentStore, FileStore};
use crate::config::StorageConfig;
use crate::document::Document;
use crate::errors::StorageResult;
use crate::query::{PageResult, Predicate};

#[cfg(feature = "mongodb")]
use crate::backend::MongoStore;

/// Uniform storage API over the active backend.
///
/// Cheap to clone; clones share the same backend and its per-collection
/// write locks.
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn DocumentStore>,
}

impl Storage {
    /// Wrap an already-constructed backend
    pub fn new(backend: Arc<dyn DocumentStore>) -> Self {
        Self { backend }
    }

    /// Create a flat-file-backed façade rooted at `data_dir`
    pub fn file<P: AsRef<Path>>(data_dir: P) -> StorageResult<Self> {
        Ok(Self::new(Arc::new(FileStore::new(data_dir)?)))
    }

    /// Create a MongoDB-backed façade
    #[cfg(feature = "mongodb")]
    pub async fn mongo(connection_string: &str, database: &str) -> StorageResult<Self> {
        Ok(Self::new(Arc::new(
            MongoStore::new(connection_string, database).await?,
        )))
    }

    /// Select and construct the backend from configuration: MongoDB iff a
    /// connection string is present, flat-file otherwise.
    pub async fn from_config(config: &StorageConfig) -> StorageResult<Self> {
        match &config.database_url {
            #[cfg(feature = "mongodb")]
            Some(url) => Self::mongo(url, &config.database_name).await,
            #[cfg(not(feature = "mongodb"))]
            Some(_) => Err(crate::errors::StorageError::configuration(
                "a database connection string is configured but the crate \
                 was built without the `mongodb` feature",
            )),
            None => Self::file(&config.data_dir),
        }
    }

    /// Name of the active backend ("file" or "mongodb")
    pub fn backend_type(&self) -> &'static str {
        self.backend.backend_type()
    }

    /// Check if the active backend is reachable and usable
    pub async fn is_available(&self) -> bool {
        self.backend.is_available().await
    }

    /// Return the entire collection in backend-native order
    pub async fn read(&self, collection: &str) -> StorageResult<Vec<Document>> {
        self.backend.read(collection).await
    }

    /// Return all documents for which `predicate` holds
    pub async fn find<F>(&self, collection: &str, predicate: F) -> StorageResult<Vec<Document>>
    where
        F: Fn(&Document) -> bool + Send + Sync + 'static,
    {
        self.backend.find(collection, &predicate).await
    }

    /// Return the document whose `id` equals the argument exactly, or `None`
    pub async fn find_by_id(
        &self,
        collection: &str,
        id: &str,
    ) -> StorageResult<Option<Document>> {
        self.backend.find_by_id(collection, id).await
    }

    /// Batch lookup keyed by id; missing ids are absent from the result
    pub async fn find_by_ids(
        &self,
        collection: &str,
        ids: &[String],
    ) -> StorageResult<HashMap<String, Document>> {
        self.backend.find_by_ids(collection, ids).await
    }

    /// Persist a new document, assigning an id if the caller supplied none
    pub async fn create(&self, collection: &str, document: Document) -> StorageResult<Document> {
        self.backend.create(collection, document).await
    }

    /// Persist a batch of documents as a single write
    pub async fn create_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> StorageResult<Vec<Document>> {
        self.backend.create_many(collection, documents).await
    }

    /// Shallow-merge `fields` into the document with the given id
    pub async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> StorageResult<Document> {
        self.backend.update(collection, id, fields).await
    }

    /// Remove a document by id; returns whether one was removed
    pub async fn delete(&self, collection: &str, id: &str) -> StorageResult<bool> {
        self.backend.delete(collection, id).await
    }

    /// Page through the whole collection
    pub async fn paginate(
        &self,
        collection: &str,
        page: usize,
        limit: usize,
    ) -> StorageResult<PageResult> {
        self.backend.paginate(collection, page, limit, None).await
    }

    /// Page through the documents matching `predicate`
    pub async fn paginate_filtered<F>(
        &self,
        collection: &str,
        page: usize,
        limit: usize,
        predicate: F,
    ) -> StorageResult<PageResult>
    where
        F: Fn(&Document) -> bool + Send + Sync + 'static,
    {
        let predicate: &Predicate = &predicate;
        self.backend
            .paginate(collection, page, limit, Some(predicate))
            .await
    }
}
