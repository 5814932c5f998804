//! Identifier formats and custom-id generation
//!
//! Two identifier schemes coexist in stored data:
//!
//! - *Custom format*: `<prefix>_<random-suffix>` (e.g. `usr_9f3ac0`),
//!   assigned by the engine or by business logic at creation time. Always
//!   contains an underscore.
//! - *Native format*: a 24-character hexadecimal string assigned by the
//!   external document database, or inherited by records migrated from it
//!   before they were given a custom id.
//!
//! The format predicates here are deliberately best-effort heuristics
//! (underscore ⇒ custom, 24 hex chars ⇒ native). They cannot be strengthened
//! without risking mismatches against identifiers already persisted under
//! these rules, so callers that need certainty must track provenance
//! themselves.

use uuid::Uuid;

/// Length of the random suffix in generated custom ids
const SUFFIX_LEN: usize = 10;

/// Length of a prefix derived from a collection name
const PREFIX_LEN: usize = 3;

/// True iff `id` is exactly 24 hexadecimal characters (a native
/// database-assigned identifier).
pub fn is_native_format(id: &str) -> bool {
    id.len() == 24 && id.bytes().all(|b| b.is_ascii_hexdigit())
}

/// True iff `id` contains an underscore and is not native format (a
/// custom application-assigned identifier).
pub fn is_custom_format(id: &str) -> bool {
    id.contains('_') && !is_native_format(id)
}

/// Generate a custom-format identifier with the given prefix.
///
/// The suffix is drawn from UUID v4 entropy; uniqueness within a collection
/// is still checked by the caller at insert time.
pub fn generate_id(prefix: &str) -> String {
    let entropy = Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &entropy[..SUFFIX_LEN])
}

/// Derive an id prefix from a collection name: the first character followed
/// by subsequent consonants, padded from the remaining characters and
/// truncated to three (`users` → `usr`, `sessions` → `sss`).
pub fn collection_prefix(collection: &str) -> String {
    let lower = collection.to_lowercase();
    let mut chars = lower.chars().filter(|c| c.is_ascii_alphanumeric());

    let first = match chars.next() {
        Some(c) => c,
        None => return "doc".to_string(),
    };
    let rest: Vec<char> = chars.collect();
    let is_vowel = |c: &char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u');

    std::iter::once(first)
        .chain(rest.iter().copied().filter(|c| !is_vowel(c)))
        .chain(rest.iter().copied().filter(is_vowel))
        .take(PREFIX_LEN)
        .collect()
}
