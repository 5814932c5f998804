//! Storage Backend Abstraction
//!
//! This module provides a trait-based abstraction over the two physical
//! storage backends. The flat-file backend is the default; the MongoDB
//! backend is enabled with the `mongodb` feature and selected at startup
//! when a connection string is configured.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │      Storage        │
//! │     (façade)        │
//! └──────────┬──────────┘
//!            │
//! ┌──────────▼──────────┐
//! │   DocumentStore     │  <-- Trait
//! │      (async)        │
//! └──────────┬──────────┘
//!            │
//!     ┌──────┴──────┐
//!     │             │
//! ┌───▼───┐   ┌─────▼─────┐
//! │ File  │   │  MongoDB  │
//! │ Store │   │   Store   │
//! └───────┘   └───────────┘
//! ```

mod traits;
mod file_backend;

pub use traits::*;
pub use file_backend::*;

#[cfg(feature = "mongodb")]
mod mongo_backend;

#[cfg(feature = "mongodb")]
pub use mongo_backend::MongoStore;

/// Map a logical collection name to its physical form (`sessionRequests`
/// → `session-requests`). Both backends share this mapping, so data
/// migrated from one to the other stays addressable by the same logical
/// name. Path separators and dots are dropped so a collection name can
/// never escape the flat-file data directory.
pub(crate) fn to_kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            'A'..='Z' => {
                if !out.is_empty() && !out.ends_with('-') {
                    out.push('-');
                }
                out.push(c.to_ascii_lowercase());
            }
            '_' | ' ' => {
                if !out.is_empty() && !out.ends_with('-') {
                    out.push('-');
                }
            }
            '/' | '\\' | '.' => {}
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::to_kebab_case;

    #[test]
    fn test_to_kebab_case() {
        assert_eq!(to_kebab_case("users"), "users");
        assert_eq!(to_kebab_case("sessionRequests"), "session-requests");
        assert_eq!(to_kebab_case("credit_grants"), "credit-grants");
        assert_eq!(to_kebab_case("../etc/passwd"), "etcpasswd");
    }

    #[test]
    fn test_to_kebab_case_is_idempotent() {
        // Migration feeds file stems (already physical names) back in as
        // collection names, so re-mapping must be a no-op
        for name in ["users", "sessionRequests", "credit_grants"] {
            let once = to_kebab_case(name);
            assert_eq!(to_kebab_case(&once), once);
        }
    }
}
