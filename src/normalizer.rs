//! Identifier normalizer
//!
//! Client requests and records imported before the canonical-id migration
//! may reference a user by either identifier scheme: the application's
//! custom `<prefix>_<suffix>` format or the database-native 24-hex format.
//! Every comparison against domain data ("is this user a participant in
//! this session") must normalize both sides to the canonical custom scheme
//! first, or legitimate matches silently fail.
//!
//! Normalization is advisory, not authoritative, and it never errors. When
//! a native-format id cannot be resolved (the user does not exist, or the
//! lookup itself fails) the input is returned unchanged, so callers are
//! never blocked by an unresolved identifier.

use futures_util::future::join_all;
use tracing::debug;

use crate::document::doc_id;
use crate::id::is_custom_format;
use crate::storage::Storage;

/// Collection holding user documents
const USERS_COLLECTION: &str = "users";

/// Resolves identifiers of uncertain provenance to the canonical custom
/// format used throughout business logic.
#[derive(Clone)]
pub struct IdNormalizer {
    storage: Storage,
}

impl IdNormalizer {
    /// Create a normalizer backed by the given storage façade
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Resolve a user identifier to its canonical custom form.
    ///
    /// Custom-format ids are already canonical and short-circuit. Native
    /// ids are looked up in the `users` collection; when the matching user
    /// carries a custom-format `id`, that value is returned. In every other
    /// case (unknown id, lookup error, or a string matching neither format)
    /// the input comes back unchanged.
    pub async fn normalize_user_id(&self, id: &str) -> String {
        if is_custom_format(id) {
            return id.to_string();
        }

        match self.storage.find_by_id(USERS_COLLECTION, id).await {
            Ok(Some(user)) => match doc_id(&user) {
                Some(canonical) if is_custom_format(canonical) => canonical.to_string(),
                _ => id.to_string(),
            },
            Ok(None) => id.to_string(),
            Err(e) => {
                // Best-effort by design: resolution failures fall back to
                // the original id instead of propagating.
                debug!(id, error = %e, "user id normalization lookup failed");
                id.to_string()
            }
        }
    }

    /// Batch form of [`normalize_user_id`](Self::normalize_user_id):
    /// order-preserving, with the lookups resolved concurrently.
    pub async fn normalize_user_ids(&self, ids: &[String]) -> Vec<String> {
        join_all(ids.iter().map(|id| self.normalize_user_id(id))).await
    }
}
