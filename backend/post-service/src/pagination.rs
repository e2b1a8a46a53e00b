//! Length-aware page payload for list endpoints

use serde::Serialize;

use crate::models::Post;
use crate::store::PageSlice;

/// Where a page sits and how it was requested
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// 1-based
    pub page: u64,
    pub per_page: u64,
    /// Request path the page is served from
    pub path: String,
    /// Query parameters repeated on every generated URL, in order
    pub appends: Vec<(String, String)>,
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    fn url(&self, page: u64) -> String {
        let mut query: Vec<String> = self
            .appends
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        query.push(format!("page={page}"));
        format!("{}?{}", self.path, query.join("&"))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub current_page: u64,
    pub data: Vec<Post>,
    pub first_page_url: String,
    pub from: Option<u64>,
    pub last_page: u64,
    pub last_page_url: String,
    pub next_page_url: Option<String>,
    pub path: String,
    pub per_page: u64,
    pub prev_page_url: Option<String>,
    pub to: Option<u64>,
    pub total: u64,
}

impl Page {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn build(request: &PageRequest, slice: PageSlice) -> Self {
        let total = slice.total;
        let per_page = request.per_page.max(1);
        let last_page = total.div_ceil(per_page).max(1);
        let count = slice.items.len() as u64;

        let (from, to) = if count == 0 {
            (None, None)
        } else {
            let from = request.offset() + 1;
            (Some(from), Some(from + count - 1))
        };

        let next_page_url = (request.page < last_page).then(|| request.url(request.page + 1));
        let prev_page_url = (request.page > 1).then(|| request.url(request.page - 1));

        Self {
            current_page: request.page,
            data: slice.items,
            first_page_url: request.url(1),
            from,
            last_page,
            last_page_url: request.url(last_page),
            next_page_url,
            path: request.path.clone(),
            per_page,
            prev_page_url,
            to,
            total,
        }
    }
}
