//! One-shot flat-file → MongoDB migration
//!
//! Reads every collection file under the flat-file data directory and
//! bulk-inserts its contents into the destination database. Collections
//! that already contain documents in the destination are skipped, so the
//! migration is idempotent and can be re-run after a partial failure.

use tokio::fs;
use tracing::{debug, info};

use crate::backend::{DocumentStore, FileStore, MongoStore};
use crate::errors::StorageResult;

/// Outcome of a migration run
#[derive(Debug, Default)]
pub struct MigrationReport {
    /// Collections imported, with the number of documents each contributed
    pub migrated: Vec<(String, usize)>,
    /// Collections left untouched because the destination already held documents
    pub skipped: Vec<String>,
}

impl MigrationReport {
    /// Total number of documents written to the destination
    pub fn total_documents(&self) -> usize {
        self.migrated.iter().map(|(_, count)| count).sum()
    }
}

/// Import every collection file from `source` into `destination`.
///
/// The collection name is the file stem, which for files written by
/// [`FileStore`] is already the kebab-cased logical name.
pub async fn migrate_all(
    source: &FileStore,
    destination: &MongoStore,
) -> StorageResult<MigrationReport> {
    let mut report = MigrationReport::default();

    let mut entries = fs::read_dir(source.data_dir()).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_collection_file = path.extension().and_then(|e| e.to_str()) == Some("json");
        if !is_collection_file {
            continue;
        }
        let collection = match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem.to_string(),
            None => continue,
        };

        if !destination.read(&collection).await?.is_empty() {
            debug!(collection = %collection, "destination already populated, skipping");
            report.skipped.push(collection);
            continue;
        }

        let documents = source.read(&collection).await?;
        let count = documents.len();
        if count > 0 {
            destination.create_many(&collection, documents).await?;
        }
        info!(collection = %collection, count, "migrated collection");
        report.migrated.push((collection, count));
    }

    Ok(report)
}
