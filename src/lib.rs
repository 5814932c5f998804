//! docstore - Backend-agnostic document storage engine
//!
//! One uniform contract — create, read, update, delete, paginate — over two
//! incompatible physical backends: a flat-file collection store and a
//! MongoDB-compatible document database. Business logic talks only to the
//! [`Storage`] façade, selected once at startup; per-collection write
//! ordering is guaranteed without transactions, and the [`IdNormalizer`]
//! reconciles the two identifier schemes that appear interchangeably in
//! client requests.
//!
//! # Example
//!
//! ```no_run
//! use docstore::{Storage, StorageConfig, IdNormalizer};
//! use serde_json::json;
//!
//! async fn example() -> docstore::StorageResult<()> {
//!     // MongoDB iff DOCSTORE_DATABASE_URL is set, flat-file otherwise
//!     let storage = Storage::from_config(&StorageConfig::load(None)).await?;
//!
//!     let ana = storage
//!         .create("users", json!({"name": "Ana"}).as_object().unwrap().clone())
//!         .await?;
//!
//!     let page = storage.paginate("users", 1, 10).await?;
//!     assert_eq!(page.pagination.page, 1);
//!
//!     // Ids arrive in two formats; normalize before comparing
//!     let normalizer = IdNormalizer::new(storage.clone());
//!     let canonical = normalizer.normalize_user_id("507f1f77bcf86cd799439011").await;
//!
//!     let _ = (ana, canonical);
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - **`mongodb`** (default) - the external-database backend and the
//!   flat-file → MongoDB migration utility. Without it the crate is
//!   flat-file only.
//!
//! # What this is not
//!
//! Not a transactional database: no multi-document ACID, no write-ahead log
//! beyond single-file atomicity, no query planner. Filters are arbitrary
//! predicates evaluated by full collection scan.

#![warn(missing_docs)]

pub mod backend;
pub mod config;
pub mod document;
pub mod errors;
pub mod id;
pub mod lock;
pub mod normalizer;
pub mod query;
pub mod storage;

/// Flat-file → MongoDB migration utility (enabled with the `mongodb` feature)
#[cfg(feature = "mongodb")]
pub mod migrate;

pub use backend::{DocumentStore, FileStore};
pub use config::StorageConfig;
pub use document::{doc_id, merge_fields, set_doc_id, Document, ID_FIELD};
pub use errors::{StorageError, StorageResult};
pub use id::{is_custom_format, is_native_format};
pub use normalizer::IdNormalizer;
pub use query::{PageInfo, PageResult};
pub use storage::Storage;

#[cfg(feature = "mongodb")]
pub use backend::MongoStore;
