use serde::{Deserialize, Serialize};

pub const MAX_LIMIT: usize = 100;

pub fn clamp_limit(limit: usize) -> usize {
    limit.clamp(1, MAX_LIMIT)
}

pub fn clamp_page(page: usize) -> usize {
    page.max(1)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl Pagination {
    pub fn new(page: usize, limit: usize, total_items: usize) -> Self {
        let total_pages = if total_items == 0 {
            1
        } else {
            (total_items + limit - 1) / limit
        };
        Self {
            page,
            limit,
            total_pages,
            total_items,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// Slices an already-sorted `items` to the requested 1-indexed page.
pub fn paginate<T: Clone>(items: &[T], page: usize, limit: usize) -> Vec<T> {
    let start = (page - 1) * limit;
    if start >= items.len() {
        return Vec::new();
    }
    let end = (start + limit).min(items.len());
    items[start..end].to_vec()
}
