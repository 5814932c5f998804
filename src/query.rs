//! Filter and pagination engine shared by all backends
//!
//! Predicates are opaque closures evaluated by full collection scan; there
//! is no query planner and no index layer. Both backends funnel their
//! `find`/`paginate` results through this module so the observable filter
//! and page semantics are identical regardless of where the documents came
//! from.

use serde::{Deserialize, Serialize};

use crate::document::Document;

/// Predicate over a document, evaluated during collection scans
pub type Predicate = dyn Fn(&Document) -> bool + Send + Sync;

/// Page metadata computed before slicing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Requested page number, 1-indexed
    pub page: usize,
    /// Requested page size
    pub limit: usize,
    /// Number of documents matching the filter, counted before slicing
    pub total: usize,
    /// `ceil(total / limit)`
    #[serde(rename = "totalPages")]
    pub total_pages: usize,
}

/// A page of documents plus its pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// Documents on the requested page
    pub data: Vec<Document>,
    /// Page metadata
    pub pagination: PageInfo,
}

/// Retain the documents matching `predicate`, preserving order
pub fn apply_filter(docs: Vec<Document>, predicate: &Predicate) -> Vec<Document> {
    docs.into_iter().filter(|doc| predicate(doc)).collect()
}

/// Slice `docs` into page `page` of size `limit`.
///
/// `page` is 1-indexed and never validated against bounds: an out-of-range
/// page yields an empty `data` with the metadata still describing the full
/// match set. A `limit` of zero is clamped to one to keep `total_pages`
/// finite.
pub fn paginate_docs(docs: Vec<Document>, page: usize, limit: usize) -> PageResult {
    let limit = limit.max(1);
    let page = page.max(1);
    let total = docs.len();
    let total_pages = total.div_ceil(limit);

    let start = (page - 1).saturating_mul(limit);
    let data: Vec<Document> = docs.into_iter().skip(start).take(limit).collect();

    PageResult {
        data,
        pagination: PageInfo {
            page,
            limit,
            total,
            total_pages,
        },
    }
}
