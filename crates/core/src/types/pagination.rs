//! Offset pagination shared by every list endpoint.

use serde::{Deserialize, Serialize};

/// Validated page/limit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Largest page size a caller may ask for.
    pub const MAX_LIMIT: u32 = 100;

    /// Build from raw query values, falling back to page 1 and
    /// `default_limit`; the limit is clamped to `1..=MAX_LIMIT`.
    #[must_use]
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: u32) -> Self {
        let page = page
            .filter(|p| *p >= 1)
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(1);
        let limit = limit
            .filter(|l| *l >= 1)
            .map_or(default_limit, |l| {
                u32::try_from(l).unwrap_or(Self::MAX_LIMIT)
            })
            .clamp(1, Self::MAX_LIMIT);
        Self { page, limit }
    }

    /// One-based page number.
    #[must_use]
    pub const fn page(self) -> u32 {
        self.page
    }

    /// Page size.
    #[must_use]
    pub const fn limit(self) -> u32 {
        self.limit
    }

    /// Rows to skip.
    #[must_use]
    pub const fn offset(self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

/// The `pagination` envelope returned with every list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    /// `ceil(total / limit)`.
    pub pages: u64,
}

impl Pagination {
    /// Envelope for `request` over `total` matching rows.
    #[must_use]
    pub const fn new(request: PageRequest, total: u64) -> Self {
        let limit = request.limit as u64;
        Self {
            page: request.page,
            limit: request.limit,
            total,
            pages: total.div_ceil(limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_clamping() {
        let req = PageRequest::new(None, None, 12);
        assert_eq!((req.page(), req.limit(), req.offset()), (1, 12, 0));

        let req = PageRequest::new(Some(0), Some(-5), 10);
        assert_eq!((req.page(), req.limit()), (1, 10));

        let req = PageRequest::new(Some(3), Some(5000), 10);
        assert_eq!((req.page(), req.limit(), req.offset()), (3, 100, 200));
    }

    #[test]
    fn test_pages_is_ceiling() {
        let req = PageRequest::new(Some(1), Some(10), 10);
        assert_eq!(Pagination::new(req, 0).pages, 0);
        assert_eq!(Pagination::new(req, 10).pages, 1);
        assert_eq!(Pagination::new(req, 11).pages, 2);
    }
}
