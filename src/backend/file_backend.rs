//! Flat-file storage backend
//!
//! Each collection maps to one file under the data directory containing a
//! JSON array of documents, named `<kebab-cased-collection>.json`. Every
//! mutation acquires the collection's write lock, loads and parses the file,
//! applies the change in memory, serializes the full array to a uniquely
//! named temporary file, and atomically renames it over the original. The
//! file is never written in place, so a crash or a concurrent reader can
//! never observe a truncated or half-written collection.
//!
//! Insertion order is preserved and is the iteration order of `read`.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

use super::traits::DocumentStore;
use super::to_kebab_case;
use crate::document::{doc_id, merge_fields, set_doc_id, Document, ID_FIELD};
use crate::errors::{StorageError, StorageResult};
use crate::id::{collection_prefix, generate_id};
use crate::lock::CollectionLocks;
use crate::query::{apply_filter, paginate_docs, PageResult, Predicate};

/// Flat-file document storage backend
pub struct FileStore {
    data_dir: PathBuf,
    locks: CollectionLocks,
}

impl FileStore {
    /// Create a flat-file backend rooted at `data_dir`.
    ///
    /// The directory is created if it does not exist.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> StorageResult<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();

        // Create the data directory if it doesn't exist (synchronously for constructor)
        std::fs::create_dir_all(&data_dir)?;

        Ok(Self {
            data_dir,
            locks: CollectionLocks::new(),
        })
    }

    /// Get the data directory
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the file backing `collection`
    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}.json", to_kebab_case(collection)))
    }

    /// Load and parse a collection file. A missing file reads as an empty
    /// collection; a file that exists but cannot be parsed is fatal.
    async fn load(&self, collection: &str) -> StorageResult<Vec<Document>> {
        let path = self.collection_path(collection);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map_err(|e| StorageError::corruption(path, e.to_string()))
    }

    /// Serialize the full collection to a temporary file, then atomically
    /// rename it over the original.
    async fn persist(&self, collection: &str, docs: &[Document]) -> StorageResult<()> {
        let path = self.collection_path(collection);
        let temp_path = path.with_file_name(format!(
            "{}.tmp.{}",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            Uuid::new_v4()
        ));

        let content = serde_json::to_string_pretty(docs)
            .map_err(|e| StorageError::serialization(e.to_string()))?;

        let result = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(content.as_bytes()).await?;
            file.sync_all().await?;
            fs::rename(&temp_path, &path).await?;
            Ok(())
        }
        .await;

        if result.is_err() {
            let _ = fs::remove_file(&temp_path).await;
        }
        result
    }

    /// Assign a custom-format id, retrying until it collides with nothing
    /// already in `taken`.
    fn assign_id(collection: &str, doc: &mut Document, taken: &mut HashSet<String>) {
        let prefix = collection_prefix(collection);
        loop {
            let id = generate_id(&prefix);
            if taken.insert(id.clone()) {
                set_doc_id(doc, id);
                return;
            }
        }
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    fn backend_type(&self) -> &'static str {
        "file"
    }

    async fn is_available(&self) -> bool {
        fs::metadata(&self.data_dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    async fn read(&self, collection: &str) -> StorageResult<Vec<Document>> {
        self.load(collection).await
    }

    async fn find(&self, collection: &str, predicate: &Predicate) -> StorageResult<Vec<Document>> {
        Ok(apply_filter(self.load(collection).await?, predicate))
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> StorageResult<Option<Document>> {
        let docs = self.load(collection).await?;
        Ok(docs.into_iter().find(|doc| doc_id(doc) == Some(id)))
    }

    async fn find_by_ids(
        &self,
        collection: &str,
        ids: &[String],
    ) -> StorageResult<HashMap<String, Document>> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let docs = self.load(collection).await?;

        // One scan regardless of how many ids were requested
        let mut found = HashMap::with_capacity(wanted.len());
        for doc in docs {
            if let Some(id) = doc_id(&doc) {
                if wanted.contains(id) {
                    found.insert(id.to_string(), doc);
                }
            }
        }
        Ok(found)
    }

    async fn create(&self, collection: &str, mut document: Document) -> StorageResult<Document> {
        let _guard = self.locks.acquire(collection).await;

        let mut docs = self.load(collection).await?;
        let mut taken: HashSet<String> = docs
            .iter()
            .filter_map(|d| doc_id(d).map(str::to_string))
            .collect();

        match doc_id(&document).map(str::to_string) {
            Some(id) if taken.contains(&id) => {
                return Err(StorageError::duplicate_id(collection, id));
            }
            Some(_) => {}
            None => Self::assign_id(collection, &mut document, &mut taken),
        }

        docs.push(document.clone());
        self.persist(collection, &docs).await?;
        debug!(collection, count = docs.len(), "created document");

        Ok(document)
    }

    async fn create_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> StorageResult<Vec<Document>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        let _guard = self.locks.acquire(collection).await;

        let mut docs = self.load(collection).await?;
        let mut taken: HashSet<String> = docs
            .iter()
            .filter_map(|d| doc_id(d).map(str::to_string))
            .collect();

        let mut stored = Vec::with_capacity(documents.len());
        for mut document in documents {
            if let Some(id) = doc_id(&document).map(str::to_string) {
                if !taken.insert(id.clone()) {
                    return Err(StorageError::duplicate_id(collection, id));
                }
            } else {
                Self::assign_id(collection, &mut document, &mut taken);
            }
            docs.push(document.clone());
            stored.push(document);
        }

        // One file rewrite for the whole batch
        self.persist(collection, &docs).await?;
        debug!(collection, batch = stored.len(), "created document batch");

        Ok(stored)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        mut fields: Document,
    ) -> StorageResult<Document> {
        let _guard = self.locks.acquire(collection).await;

        // The id field is immutable under update
        fields.remove(ID_FIELD);

        let mut docs = self.load(collection).await?;
        let target = docs
            .iter_mut()
            .find(|doc| doc_id(doc) == Some(id))
            .ok_or_else(|| StorageError::not_found(collection, id))?;

        merge_fields(target, &fields);
        let updated = target.clone();

        self.persist(collection, &docs).await?;
        Ok(updated)
    }

    async fn delete(&self, collection: &str, id: &str) -> StorageResult<bool> {
        let _guard = self.locks.acquire(collection).await;

        let mut docs = self.load(collection).await?;
        let before = docs.len();
        docs.retain(|doc| doc_id(doc) != Some(id));

        if docs.len() == before {
            return Ok(false);
        }
        self.persist(collection, &docs).await?;
        Ok(true)
    }

    async fn paginate(
        &self,
        collection: &str,
        page: usize,
        limit: usize,
        predicate: Option<&Predicate>,
    ) -> StorageResult<PageResult> {
        let mut docs = self.load(collection).await?;
        if let Some(predicate) = predicate {
            docs = apply_filter(docs, predicate);
        }
        Ok(paginate_docs(docs, page, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::from_value;
    use crate::id::is_custom_format;
    use serde_json::json;
    use tempfile::TempDir;

    fn doc(value: serde_json::Value) -> Document {
        from_value(value).unwrap()
    }

    fn store() -> (TempDir, FileStore) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_create_assigns_custom_id() {
        let (_dir, store) = store();

        let created = store.create("users", doc(json!({"name": "Ana"}))).await.unwrap();
        let id = doc_id(&created).unwrap();
        assert!(id.starts_with("usr_"));
        assert!(is_custom_format(id));

        let found = store.find_by_id("users", id).await.unwrap().unwrap();
        assert_eq!(found["name"], json!("Ana"));
    }

    #[tokio::test]
    async fn test_create_keeps_caller_id() {
        let (_dir, store) = store();

        let created = store
            .create("users", doc(json!({"id": "usr_custom", "name": "Bo"})))
            .await
            .unwrap();
        assert_eq!(doc_id(&created), Some("usr_custom"));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_id() {
        let (_dir, store) = store();
        store
            .create("users", doc(json!({"id": "usr_1", "name": "Ana"})))
            .await
            .unwrap();

        let err = store
            .create("users", doc(json!({"id": "usr_1", "name": "Bo"})))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::DuplicateId { .. }));
    }

    #[tokio::test]
    async fn test_read_preserves_insertion_order() {
        let (_dir, store) = store();
        for i in 0..5 {
            store
                .create("items", doc(json!({"id": format!("itm_{i}"), "n": i})))
                .await
                .unwrap();
        }

        let docs = store.read("items").await.unwrap();
        let ns: Vec<u64> = docs.iter().map(|d| d["n"].as_u64().unwrap()).collect();
        assert_eq!(ns, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_missing_collection_reads_empty() {
        let (_dir, store) = store();
        assert!(store.read("nonexistent").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let (_dir, store) = store();
        store
            .create("sessions", doc(json!({"id": "ses_1", "status": "pending", "room": "B12"})))
            .await
            .unwrap();

        let updated = store
            .update("sessions", "ses_1", doc(json!({"status": "approved"})))
            .await
            .unwrap();
        assert_eq!(updated["status"], json!("approved"));
        assert_eq!(updated["room"], json!("B12"));

        // Persisted, not just returned
        let reread = store.find_by_id("sessions", "ses_1").await.unwrap().unwrap();
        assert_eq!(reread["status"], json!("approved"));
        assert_eq!(reread["room"], json!("B12"));
    }

    #[tokio::test]
    async fn test_update_cannot_rewrite_id() {
        let (_dir, store) = store();
        store
            .create("users", doc(json!({"id": "usr_1", "name": "Ana"})))
            .await
            .unwrap();
        store
            .create("users", doc(json!({"id": "usr_2", "name": "Bo"})))
            .await
            .unwrap();

        // An id key in the merge fields is dropped, not applied
        let updated = store
            .update("users", "usr_2", doc(json!({"id": "usr_1", "name": "Cleo"})))
            .await
            .unwrap();
        assert_eq!(doc_id(&updated), Some("usr_2"));
        assert_eq!(updated["name"], json!("Cleo"));

        let all = store.read("users").await.unwrap();
        let ids: HashSet<&str> = all.iter().filter_map(doc_id).collect();
        assert_eq!(ids.len(), all.len());
        assert!(ids.contains("usr_1") && ids.contains("usr_2"));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let (_dir, store) = store();
        let err = store
            .update("sessions", "ses_missing", doc(json!({"x": 1})))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_reports_removal() {
        let (_dir, store) = store();
        store
            .create("users", doc(json!({"id": "usr_1"})))
            .await
            .unwrap();

        assert!(store.delete("users", "usr_1").await.unwrap());
        assert!(!store.delete("users", "usr_1").await.unwrap());
        assert!(store.find_by_id("users", "usr_1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_many_single_batch() {
        let (_dir, store) = store();
        let batch: Vec<Document> = (0..20)
            .map(|i| doc(json!({"n": i})))
            .collect();

        let stored = store.create_many("bulk", batch).await.unwrap();
        assert_eq!(stored.len(), 20);
        assert!(stored.iter().all(|d| doc_id(d).is_some()));

        // All ids distinct
        let ids: HashSet<&str> = stored.iter().filter_map(doc_id).collect();
        assert_eq!(ids.len(), 20);

        assert_eq!(store.read("bulk").await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_fatal() {
        let (dir, store) = store();
        std::fs::write(dir.path().join("users.json"), "{not json").unwrap();

        let err = store.read("users").await.unwrap_err();
        assert!(matches!(err, StorageError::Corruption { .. }));
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let (dir, store) = store();
        store.create("users", doc(json!({"name": "Ana"}))).await.unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp."))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_stray_temp_file_does_not_affect_reads() {
        // Simulates a crash between temp-file write and rename: the
        // original file must stay valid and authoritative.
        let (dir, store) = store();
        store
            .create("users", doc(json!({"id": "usr_1", "name": "Ana"})))
            .await
            .unwrap();

        std::fs::write(
            dir.path().join("users.json.tmp.deadbeef"),
            "[{\"id\": \"usr_ghost\"}",
        )
        .unwrap();

        let docs = store.read("users").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(doc_id(&docs[0]), Some("usr_1"));
    }

    #[tokio::test]
    async fn test_find_by_ids_single_scan_semantics() {
        let (_dir, store) = store();
        for i in 0..3 {
            store
                .create("users", doc(json!({"id": format!("usr_{i}")})))
                .await
                .unwrap();
        }

        let found = store
            .find_by_ids(
                "users",
                &["usr_0".into(), "usr_2".into(), "usr_nope".into()],
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.contains_key("usr_0"));
        assert!(found.contains_key("usr_2"));
        assert!(!found.contains_key("usr_nope"));
    }

    #[tokio::test]
    async fn test_concurrent_disjoint_updates_both_land() {
        let (_dir, store) = store();
        let store = std::sync::Arc::new(store);
        store
            .create("docs", doc(json!({"id": "doc_1"})))
            .await
            .unwrap();

        let a = {
            let store = store.clone();
            tokio::spawn(async move { store.update("docs", "doc_1", doc(json!({"a": 1}))).await })
        };
        let b = {
            let store = store.clone();
            tokio::spawn(async move { store.update("docs", "doc_1", doc(json!({"b": 2}))).await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let final_doc = store.find_by_id("docs", "doc_1").await.unwrap().unwrap();
        assert_eq!(final_doc["a"], json!(1));
        assert_eq!(final_doc["b"], json!(2));
    }

    #[tokio::test]
    async fn test_paginate_with_predicate() {
        let (_dir, store) = store();
        let batch: Vec<Document> = (0..10)
            .map(|i| doc(json!({"id": format!("itm_{i}"), "n": i})))
            .collect();
        store.create_many("items", batch).await.unwrap();

        let even = |d: &Document| d["n"].as_u64().unwrap() % 2 == 0;
        let page = store
            .paginate("items", 2, 2, Some(&even as &Predicate))
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 5);
        assert_eq!(page.pagination.total_pages, 3);
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0]["n"], json!(4));
    }
}
