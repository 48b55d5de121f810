use serde::Serialize;

use crate::store::{Document, Window};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// Resolved page number and size, both at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Out-of-range values fall back to the defaults; `limit` is capped.
    pub fn new(page: i64, limit: i64) -> Self {
        let page = u64::try_from(page).ok().filter(|p| *p >= 1).unwrap_or(DEFAULT_PAGE);
        let limit = u64::try_from(limit)
            .ok()
            .filter(|l| *l >= 1)
            .map_or(DEFAULT_LIMIT, |l| l.min(MAX_LIMIT));
        Self { page, limit }
    }

    /// Build from raw query-string values. Missing, non-numeric or
    /// non-positive values are replaced independently by page 1 and size 10.
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        let parse = |raw: Option<&str>| raw.and_then(|value| value.trim().parse::<i64>().ok());
        Self::new(parse(page).unwrap_or(0), parse(limit).unwrap_or(0))
    }

    /// First record only.
    pub fn single() -> Self {
        Self { page: 1, limit: 1 }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn window(&self) -> Window {
        Window {
            skip: self.skip(),
            limit: self.limit,
        }
    }
}

/// One page of composed records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T = Document> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl<T> Page<T> {
    pub fn empty(request: PageRequest) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: request.page(),
            limit: request.limit(),
        }
    }

    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.limit.max(1))
    }
}
