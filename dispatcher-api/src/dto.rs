pub mod conversation;
pub mod dispatch;

pub use conversation::*;
pub use dispatch::*;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_PAGE_SIZE: i64 = 20;

// Pagination structures
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct PaginationQuery {
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}

impl PaginationQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}
