use serde::Serialize;

/// Success envelope. Failures go through [`super::error::ErrorResponse`].
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(status_code: u16, message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            status_code,
            message: Some(message.into()),
            data: Some(data),
        }
    }

    pub fn success_empty(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            success: true,
            status_code,
            message: Some(message.into()),
            data: None,
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Pagination {
    pub total_items: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub next_page: Option<u64>,
    pub prev_page: Option<u64>,
    pub size: u64,
}

/// Compute pagination metadata for a 1-based `page` of `size` items.
/// An empty result set still reports one (empty) page.
#[must_use]
pub fn paginate(total_items: u64, page: u64, size: u64) -> Pagination {
    let total_pages = total_items.div_ceil(size).max(1);

    Pagination {
        total_items,
        total_pages,
        current_page: page,
        next_page: (page < total_pages).then(|| page + 1),
        prev_page: (page > 1).then(|| page - 1),
        size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_middle_page() {
        let p = paginate(25, 2, 10);

        assert_eq!(p.total_pages, 3);
        assert_eq!(p.next_page, Some(3));
        assert_eq!(p.prev_page, Some(1));
    }

    #[test]
    fn paginate_first_and_last_page() {
        let first = paginate(25, 1, 10);
        assert_eq!(first.prev_page, None);
        assert_eq!(first.next_page, Some(2));

        let last = paginate(25, 3, 10);
        assert_eq!(last.next_page, None);
        assert_eq!(last.prev_page, Some(2));
    }

    #[test]
    fn paginate_exact_multiple() {
        let p = paginate(20, 2, 10);

        assert_eq!(p.total_pages, 2);
        assert_eq!(p.next_page, None);
    }

    #[test]
    fn paginate_empty_set() {
        let p = paginate(0, 1, 10);

        assert_eq!(p.total_pages, 1);
        assert_eq!(p.next_page, None);
        assert_eq!(p.prev_page, None);
    }
}
