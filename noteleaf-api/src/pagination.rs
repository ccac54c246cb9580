/// Page parameters and response envelopes
///
/// Every list endpoint takes `?page=&page_size=` (zero-based page index)
/// and answers `{data, metadata}` via [`ListResponse`], so clients can
/// walk pages without counting on their own. Detail endpoints wrap their
/// record in [`DataResponse`], keeping one envelope shape across the API.

use serde::{Deserialize, Serialize};

/// Default number of items per page
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Query parameters for paginated list endpoints
///
/// `page` is zero-based. Out-of-range values are clamped rather than
/// rejected; an empty page past the end is a valid response.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: i64,

    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageParams {
    /// Page index, clamped to zero or above
    pub fn page(&self) -> i64 {
        self.page.max(0)
    }

    /// Page size, clamped to at least one item
    pub fn page_size(&self) -> i64 {
        self.page_size.max(1)
    }

    /// Number of rows to skip
    pub fn offset(&self) -> i64 {
        self.page() * self.page_size()
    }
}

/// Pagination metadata attached to every list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
    /// Zero-based index of this page
    pub current_page: i64,

    /// Requested page size
    pub page_size: i64,

    /// Total matching items across all pages
    pub total_items: i64,

    /// Total number of pages (zero when there are no items)
    pub total_pages: i64,

    /// Next page index, absent on the last page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page: Option<i64>,

    /// Previous page index, absent on the first page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_page: Option<i64>,
}

impl PageMeta {
    /// Builds metadata for a page given the total item count
    pub fn new(params: &PageParams, total_items: i64) -> Self {
        let page = params.page();
        let page_size = params.page_size();
        let total_pages = if total_items == 0 {
            0
        } else {
            (total_items + page_size - 1) / page_size
        };

        let next_page = if page + 1 < total_pages {
            Some(page + 1)
        } else {
            None
        };
        let previous_page = if page > 0 { Some(page - 1) } else { None };

        Self {
            current_page: page,
            page_size,
            total_items,
            total_pages,
            next_page,
            previous_page,
        }
    }
}

/// Envelope for paginated list responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub metadata: PageMeta,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>, params: &PageParams, total_items: i64) -> Self {
        Self {
            data,
            metadata: PageMeta::new(params, total_items),
        }
    }
}

/// Envelope for detail responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Envelope for mutation endpoints that return only an outcome message
///
/// `warning` carries non-fatal cleanup failures, e.g. an attachment row
/// that was deleted while its backing file could not be removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            warning: None,
        }
    }

    pub fn with_warning(message: impl Into<String>, warning: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            warning: Some(warning.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_meta_middle_page() {
        let params = PageParams { page: 1, page_size: 10 };
        let meta = PageMeta::new(&params, 35);

        assert_eq!(meta.total_pages, 4);
        assert_eq!(meta.next_page, Some(2));
        assert_eq!(meta.previous_page, Some(0));
    }

    #[test]
    fn test_page_meta_first_and_last_page() {
        let params = PageParams { page: 0, page_size: 10 };
        let meta = PageMeta::new(&params, 35);
        assert_eq!(meta.previous_page, None);
        assert_eq!(meta.next_page, Some(1));

        let params = PageParams { page: 3, page_size: 10 };
        let meta = PageMeta::new(&params, 35);
        assert_eq!(meta.next_page, None);
        assert_eq!(meta.previous_page, Some(2));
    }

    #[test]
    fn test_page_meta_empty() {
        let meta = PageMeta::new(&PageParams::default(), 0);
        assert_eq!(meta.total_pages, 0);
        assert_eq!(meta.next_page, None);
        assert_eq!(meta.previous_page, None);
    }

    #[test]
    fn test_page_params_clamping() {
        let params = PageParams { page: -3, page_size: 0 };
        assert_eq!(params.page(), 0);
        assert_eq!(params.page_size(), 1);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_offset() {
        let params = PageParams { page: 4, page_size: 25 };
        assert_eq!(params.offset(), 100);
    }
}
