//! Pagination and query helpers for the Fleetdesk API
//!
//! Provides standardized pagination and search across list endpoints.

use serde::{Deserialize, Serialize};

/// Default page size if not specified
pub const DEFAULT_PAGE_SIZE: i64 = 25;
/// Maximum allowed page size
pub const MAX_PAGE_SIZE: i64 = 100;
/// Default page number (1-indexed for API consumers)
pub const DEFAULT_PAGE: i64 = 1;

/// Standard pagination query parameters
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page
    #[serde(default = "default_per_page")]
    pub per_page: i64,
    /// Free-text search query
    pub search: Option<String>,
}

fn default_page() -> i64 {
    DEFAULT_PAGE
}

fn default_per_page() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl PaginationParams {
    /// Get SQL OFFSET value
    pub fn offset(&self) -> i64 {
        let page = self.page.max(1);
        (page - 1) * self.limit()
    }

    /// Get SQL LIMIT value
    pub fn limit(&self) -> i64 {
        self.per_page.clamp(1, MAX_PAGE_SIZE)
    }

    /// Get search pattern for ILIKE queries
    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_ref()
            .filter(|q| !q.trim().is_empty())
            .map(|q| format!("%{}%", q.trim()))
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PAGE_SIZE,
            search: None,
        }
    }
}

/// Pagination metadata returned with list responses
#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    /// Current page (1-indexed)
    pub page: i64,
    /// Items per page
    pub per_page: i64,
    /// Total number of items
    pub total: i64,
    /// Total number of pages
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let total_pages = (total as f64 / per_page as f64).ceil() as i64;
        Self {
            page,
            per_page,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

/// Standard paginated response wrapper
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, params: &PaginationParams, total: i64) -> Self {
        Self {
            meta: PaginationMeta::new(params.page.max(1), params.limit(), total),
            data,
        }
    }
}
