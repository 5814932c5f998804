//! MongoDB storage backend
//!
//! Translates the uniform [`DocumentStore`] contract into driver calls
//! against a remote MongoDB (or DocumentDB-compatible) deployment. Enable
//! the `mongodb` feature to compile this backend.
//!
//! Predicates are opaque closures, so `find` and `paginate` cannot be pushed
//! down as native queries: this backend scans the collection into memory and
//! evaluates predicates client-side, keeping observable behavior identical
//! to the flat-file backend even though the cost model differs.
//!
//! Documents inserted without a caller-supplied `id` receive the driver's
//! ObjectId; its 24-hex form is copied into the document's `id` field before
//! returning, so upper layers never see the `_id` primary-key mechanism.

use std::collections::HashMap;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId, Document as BsonDocument};
use mongodb::options::{ClientOptions, ReturnDocument};
use mongodb::{Client, Collection};

use super::traits::DocumentStore;
use super::to_kebab_case;
use crate::document::{doc_id, set_doc_id, Document, ID_FIELD};
use crate::errors::{StorageError, StorageResult};
use crate::lock::CollectionLocks;
use crate::query::{apply_filter, paginate_docs, PageResult, Predicate};

/// Upper bound on documents per bulk-insert call, so migration-scale
/// batches never produce a single oversized network payload.
const INSERT_CHUNK_SIZE: usize = 500;

/// MongoDB document storage backend
pub struct MongoStore {
    client: Client,
    database_name: String,
    locks: CollectionLocks,
}

impl MongoStore {
    /// Connect to a MongoDB deployment.
    ///
    /// # Arguments
    /// * `connection_string` - MongoDB connection string
    /// * `database` - Database holding all logical collections
    pub async fn new(connection_string: &str, database: &str) -> StorageResult<Self> {
        let client_options = ClientOptions::parse(connection_string)
            .await
            .map_err(|e| StorageError::unavailable(e.to_string()))?;

        let client = Client::with_options(client_options)
            .map_err(|e| StorageError::unavailable(e.to_string()))?;

        Ok(Self {
            client,
            database_name: database.to_string(),
            locks: CollectionLocks::new(),
        })
    }

    fn collection(&self, name: &str) -> Collection<BsonDocument> {
        // Physical names match the flat-file backend's layout, so data
        // migrated between backends stays reachable by its logical name
        self.client
            .database(&self.database_name)
            .collection(&to_kebab_case(name))
    }

    /// Scan the whole collection into memory
    async fn scan(&self, collection: &str) -> StorageResult<Vec<Document>> {
        let mut cursor = self
            .collection(collection)
            .find(doc! {})
            .await
            .map_err(driver_error)?;

        let mut docs = Vec::new();
        while let Some(doc) = cursor.try_next().await.map_err(driver_error)? {
            docs.push(from_bson_doc(doc)?);
        }
        Ok(docs)
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    fn backend_type(&self) -> &'static str {
        "mongodb"
    }

    async fn is_available(&self) -> bool {
        self.client
            .database(&self.database_name)
            .run_command(doc! { "ping": 1 })
            .await
            .is_ok()
    }

    async fn read(&self, collection: &str) -> StorageResult<Vec<Document>> {
        self.scan(collection).await
    }

    async fn find(&self, collection: &str, predicate: &Predicate) -> StorageResult<Vec<Document>> {
        Ok(apply_filter(self.scan(collection).await?, predicate))
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> StorageResult<Option<Document>> {
        // Records migrated under a native primary key may carry the looked-up
        // id as their `_id` rather than in the `id` field, so a string that
        // parses as an ObjectId matches on either.
        let filter = match ObjectId::parse_str(id) {
            Ok(oid) => doc! { "$or": [ { "id": id }, { "_id": oid } ] },
            Err(_) => doc! { "id": id },
        };

        let found = self
            .collection(collection)
            .find_one(filter)
            .await
            .map_err(driver_error)?;

        found.map(from_bson_doc).transpose()
    }

    async fn find_by_ids(
        &self,
        collection: &str,
        ids: &[String],
    ) -> StorageResult<HashMap<String, Document>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        // One $in query instead of N point lookups
        let mut cursor = self
            .collection(collection)
            .find(doc! { "id": { "$in": ids.to_vec() } })
            .await
            .map_err(driver_error)?;

        let mut found = HashMap::with_capacity(ids.len());
        while let Some(doc) = cursor.try_next().await.map_err(driver_error)? {
            let doc = from_bson_doc(doc)?;
            if let Some(id) = doc_id(&doc) {
                found.insert(id.to_string(), doc);
            }
        }
        Ok(found)
    }

    async fn create(&self, collection: &str, mut document: Document) -> StorageResult<Document> {
        let _guard = self.locks.acquire(collection).await;
        let coll = self.collection(collection);

        let result = coll
            .insert_one(to_bson_doc(&document)?)
            .await
            .map_err(driver_error)?;

        if doc_id(&document).is_none() {
            // The database assigned a native id; copy it into the document's
            // `id` field so callers never depend on `_id`.
            let oid = result.inserted_id.as_object_id().ok_or_else(|| {
                StorageError::serialization("insert did not yield an ObjectId")
            })?;
            let native_id = oid.to_hex();

            coll.update_one(doc! { "_id": oid }, doc! { "$set": { "id": &native_id } })
                .await
                .map_err(driver_error)?;
            set_doc_id(&mut document, native_id);
        }

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
        let coll = self.collection(collection);

        let mut stored = documents;
        for chunk_start in (0..stored.len()).step_by(INSERT_CHUNK_SIZE) {
            let chunk_end = (chunk_start + INSERT_CHUNK_SIZE).min(stored.len());
            let chunk: Vec<BsonDocument> = stored[chunk_start..chunk_end]
                .iter()
                .map(to_bson_doc)
                .collect::<StorageResult<_>>()?;

            let result = coll.insert_many(chunk).await.map_err(driver_error)?;

            // Backfill native ids for any documents inserted without one
            for (index, inserted_id) in &result.inserted_ids {
                let document = &mut stored[chunk_start + index];
                if doc_id(document).is_none() {
                    if let Some(oid) = inserted_id.as_object_id() {
                        let native_id = oid.to_hex();
                        coll.update_one(
                            doc! { "_id": oid },
                            doc! { "$set": { "id": &native_id } },
                        )
                        .await
                        .map_err(driver_error)?;
                        set_doc_id(document, native_id);
                    }
                }
            }
        }

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

        if fields.is_empty() {
            // $set rejects an empty document; an empty merge is a lookup
            return self
                .find_by_id(collection, id)
                .await?
                .ok_or_else(|| StorageError::not_found(collection, id));
        }

        let updated = self
            .collection(collection)
            .find_one_and_update(doc! { "id": id }, doc! { "$set": to_bson_doc(&fields)? })
            .return_document(ReturnDocument::After)
            .await
            .map_err(driver_error)?
            .ok_or_else(|| StorageError::not_found(collection, id))?;

        from_bson_doc(updated)
    }

    async fn delete(&self, collection: &str, id: &str) -> StorageResult<bool> {
        let _guard = self.locks.acquire(collection).await;

        let result = self
            .collection(collection)
            .delete_one(doc! { "id": id })
            .await
            .map_err(driver_error)?;

        Ok(result.deleted_count > 0)
    }

    async fn paginate(
        &self,
        collection: &str,
        page: usize,
        limit: usize,
        predicate: Option<&Predicate>,
    ) -> StorageResult<PageResult> {
        let mut docs = self.scan(collection).await?;
        if let Some(predicate) = predicate {
            docs = apply_filter(docs, predicate);
        }
        Ok(paginate_docs(docs, page, limit))
    }
}

fn driver_error(e: mongodb::error::Error) -> StorageError {
    StorageError::unavailable(e.to_string())
}

fn to_bson_doc(doc: &Document) -> StorageResult<BsonDocument> {
    bson::to_document(doc).map_err(|e| StorageError::serialization(e.to_string()))
}

/// Convert a driver document back to the engine's JSON shape, dropping the
/// internal `_id` primary key on the way out.
fn from_bson_doc(mut doc: BsonDocument) -> StorageResult<Document> {
    doc.remove("_id");
    bson::from_document(doc).map_err(|e| StorageError::serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    // CRUD tests require a running MongoDB instance:
    //   docker run -dt -p 27017:27017 mongo
    // Run with: cargo test --features mongodb -- --ignored

    use super::*;
    use crate::document::from_value;
    use serde_json::json;

    const TEST_URL: &str = "mongodb://localhost:27017";
    const TEST_DB: &str = "docstore_test";

    fn doc(value: serde_json::Value) -> Document {
        from_value(value).unwrap()
    }

    #[test]
    fn test_bson_round_trip_strips_internal_id() {
        let mut bson_doc = bson::to_document(&doc(json!({"id": "usr_1", "name": "Ana"}))).unwrap();
        bson_doc.insert("_id", ObjectId::new());

        let back = from_bson_doc(bson_doc).unwrap();
        assert_eq!(doc_id(&back), Some("usr_1"));
        assert!(!back.contains_key("_id"));
        assert_eq!(back["name"], json!("Ana"));
    }

    #[tokio::test]
    async fn test_collection_names_match_file_backend_layout() {
        // Parsing a plain (non-SRV) connection string does no I/O, so the
        // physical naming can be checked without a server
        let store = MongoStore::new(TEST_URL, TEST_DB).await.unwrap();
        assert_eq!(store.collection("users").name(), "users");
        assert_eq!(
            store.collection("sessionRequests").name(),
            "session-requests"
        );
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB instance
    async fn test_mongo_connection() {
        let store = MongoStore::new(TEST_URL, TEST_DB).await.unwrap();
        assert!(store.is_available().await);
        assert_eq!(store.backend_type(), "mongodb");
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB instance
    async fn test_mongo_crud_cycle() {
        let store = MongoStore::new(TEST_URL, TEST_DB).await.unwrap();
        let collection = "crud_cycle";

        let created = store
            .create(collection, doc(json!({"name": "Ana"})))
            .await
            .unwrap();
        let id = doc_id(&created).unwrap().to_string();
        // Driver-assigned native id was copied into `id`
        assert!(crate::id::is_native_format(&id));

        let found = store.find_by_id(collection, &id).await.unwrap().unwrap();
        assert_eq!(found["name"], json!("Ana"));

        let updated = store
            .update(collection, &id, doc(json!({"name": "Bo", "active": true})))
            .await
            .unwrap();
        assert_eq!(updated["name"], json!("Bo"));
        assert_eq!(updated["active"], json!(true));

        assert!(store.delete(collection, &id).await.unwrap());
        assert!(!store.delete(collection, &id).await.unwrap());
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB instance
    async fn test_mongo_update_ignores_id_field() {
        let store = MongoStore::new(TEST_URL, TEST_DB).await.unwrap();
        let collection = "id_immutable";

        store
            .create(collection, doc(json!({"id": "itm_keep", "name": "Ana"})))
            .await
            .unwrap();

        let updated = store
            .update(collection, "itm_keep", doc(json!({"id": "itm_evil", "name": "Bo"})))
            .await
            .unwrap();
        assert_eq!(doc_id(&updated), Some("itm_keep"));
        assert_eq!(updated["name"], json!("Bo"));

        store.delete(collection, "itm_keep").await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB instance
    async fn test_mongo_create_many_and_batch_lookup() {
        let store = MongoStore::new(TEST_URL, TEST_DB).await.unwrap();
        let collection = "batch_cycle";

        let batch: Vec<Document> = (0..3)
            .map(|i| doc(json!({"id": format!("itm_batch{i}"), "n": i})))
            .collect();
        let stored = store.create_many(collection, batch).await.unwrap();
        assert_eq!(stored.len(), 3);

        let found = store
            .find_by_ids(
                collection,
                &["itm_batch0".into(), "itm_batch2".into(), "itm_nope".into()],
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 2);

        for doc in &stored {
            store.delete(collection, doc_id(doc).unwrap()).await.unwrap();
        }
    }
}
