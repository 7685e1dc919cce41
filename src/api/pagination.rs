use serde::Serialize;

pub(crate) const fn default_limit() -> i64 {
    100
}

const MAX_LIMIT: i64 = 1000;

/// Clamps raw paging inputs to the bounds the list queries accept.
pub(crate) fn clamp_page(skip: i64, limit: i64) -> (i64, i64) {
    (skip.max(0), limit.clamp(1, MAX_LIMIT))
}

#[derive(Debug, Serialize)]
pub(crate) struct PaginatedResponse<T> {
    pub(crate) items: Vec<T>,
    pub(crate) total_count: i64,
    pub(crate) skip: i64,
    pub(crate) limit: i64,
}
