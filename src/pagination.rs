//! Stateless skip/limit paging.
//!
//! Paging parameters come straight from the request query string. Anything
//! that is not a usable integer falls back to the listing's default instead of
//! failing the request.

use serde::Deserialize;

/// Page size for transactions, coin history and masternodes.
pub const DEFAULT_LIMIT: u64 = 10;
/// Page size for peer listings.
pub const PEER_LIMIT: u64 = 500;
/// Fixed size of the "latest transactions" listing.
pub const LATEST_TX_LIMIT: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    skip: u64,
    limit: u64,
}

impl Page {
    /// A zero `limit` is bumped to one so a page is never unbounded.
    pub fn new(skip: u64, limit: u64) -> Self {
        Self {
            skip,
            limit: limit.max(1),
        }
    }

    pub fn first(limit: u64) -> Self {
        Self::new(0, limit)
    }

    pub fn skip(&self) -> u64 {
        self.skip
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Number of pages needed to show `total` records at this page size.
    pub fn pages(&self, total: u64) -> u64 {
        page_count(total, self.limit)
    }
}

/// `1` when everything fits on one page, otherwise `ceil(total / limit)`.
pub fn page_count(total: u64, limit: u64) -> u64 {
    let limit = limit.max(1);
    if total <= limit {
        1
    } else {
        total.div_ceil(limit)
    }
}

/// Raw `?skip=&limit=` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub skip: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
}

impl PageParams {
    pub fn new(skip: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            skip: skip.map(str::to_string),
            limit: limit.map(str::to_string),
        }
    }

    /// Resolve into a [`Page`], defaulting skip to 0 and limit to `default_limit`.
    pub fn page(&self, default_limit: u64) -> Page {
        let skip = parse_count(self.skip.as_deref()).unwrap_or(0);
        let limit = parse_count(self.limit.as_deref())
            .filter(|l| *l > 0)
            .unwrap_or(default_limit);
        Page::new(skip, limit)
    }
}

fn parse_count(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
}
