//! Storage backend trait
//!
//! Defines the uniform contract every storage backend satisfies. Business
//! logic never talks to a concrete backend; it goes through the
//! [`Storage`](crate::storage::Storage) façade, which holds one of these as
//! a trait object selected at startup.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::document::Document;
use crate::errors::StorageResult;
use crate::query::{PageResult, Predicate};

/// Core trait for document storage backends
///
/// All operations take the logical collection name as their first argument.
/// Collections are created implicitly on first write. Mutating operations
/// (`create`, `create_many`, `update`, `delete`) are serialized per
/// collection; reads may interleave with writers but always observe a
/// consistent snapshot.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Get the backend type name (e.g. "file", "mongodb")
    fn backend_type(&self) -> &'static str;

    /// Check if the backend is reachable and usable
    async fn is_available(&self) -> bool;

    /// Return the entire collection, unfiltered, in backend-native order
    async fn read(&self, collection: &str) -> StorageResult<Vec<Document>>;

    /// Return all documents for which `predicate` holds, in the same order
    /// as [`read`](Self::read). Predicates are opaque closures, so this is
    /// always a full collection scan.
    async fn find(&self, collection: &str, predicate: &Predicate) -> StorageResult<Vec<Document>>;

    /// Return the document whose `id` field equals `id`, or `None`.
    ///
    /// No identifier normalization happens here — callers with ids of
    /// uncertain provenance normalize first.
    async fn find_by_id(&self, collection: &str, id: &str) -> StorageResult<Option<Document>>;

    /// Batch lookup keyed by id. Missing ids are simply absent from the
    /// result map. Implemented as a single scan (or a single `$in` query),
    /// never as N sequential `find_by_id` calls.
    async fn find_by_ids(
        &self,
        collection: &str,
        ids: &[String],
    ) -> StorageResult<HashMap<String, Document>>;

    /// Persist a new document and return it as stored, with its `id`
    /// assigned if the caller did not supply one.
    async fn create(&self, collection: &str, document: Document) -> StorageResult<Document>;

    /// Persist a batch of documents as a single write (one file rewrite or
    /// one bulk insert), not N sequential creates. Required for
    /// migration-scale workloads.
    async fn create_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> StorageResult<Vec<Document>>;

    /// Shallow-merge `fields` into the document matched by exact `id` and
    /// return the merged document. Fails with
    /// [`StorageError::NotFound`](crate::StorageError::NotFound) when no
    /// document has that id.
    ///
    /// The `id` field itself is immutable: an `id` key in `fields` is
    /// dropped rather than merged, since rewriting it could collide with
    /// another document and break per-collection id uniqueness.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> StorageResult<Document>;

    /// Remove the document with the given `id`; returns whether a document
    /// was actually removed.
    async fn delete(&self, collection: &str, id: &str) -> StorageResult<bool>;

    /// Filter (when a predicate is given) then slice into a 1-indexed page
    /// of `limit` documents, with totals counted before slicing.
    async fn paginate(
        &self,
        collection: &str,
        page: usize,
        limit: usize,
        predicate: Option<&Predicate>,
    ) -> StorageResult<PageResult>;
}
