use axum::http::Uri;
use serde::{Deserialize, Serialize};
use url::Url;

pub const RECIPE_PAGE_SIZE: i64 = 6;
pub const USER_PAGE_SIZE: i64 = 10;
/// Upper bound for a client-supplied `limit`.
pub const MAX_PAGE_SIZE: i64 = 100;

/// `?page=N&limit=M` or `?limit=M&offset=K`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageMode {
    Number(i64),
    Offset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: i64,
    pub offset: i64,
    mode: PageMode,
}

impl PageParams {
    pub fn resolve(&self, default_size: i64) -> PageRequest {
        let limit = self
            .limit
            .filter(|limit| *limit > 0)
            .map_or(default_size, |limit| limit.min(MAX_PAGE_SIZE));
        match self.offset {
            Some(offset) => PageRequest {
                limit,
                offset: offset.max(0),
                mode: PageMode::Offset,
            },
            None => {
                let page = self.page.filter(|page| *page > 0).unwrap_or(1);
                PageRequest {
                    limit,
                    offset: (page - 1).saturating_mul(limit),
                    mode: PageMode::Number(page),
                }
            }
        }
    }
}

/// Paginated list envelope: `{count, next, previous, results}`.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// `current` is the absolute URL of the request being answered; the
    /// `next`/`previous` links keep its other query parameters.
    pub fn new(results: Vec<T>, count: i64, request: &PageRequest, current: &Url) -> Self {
        let end = request.offset.saturating_add(request.limit);
        let has_next = end < count;
        let has_previous = request.offset > 0;

        let (next, previous) = match request.mode {
            PageMode::Number(page) => (
                has_next.then(|| with_param(current, "page", Some(page.saturating_add(1)))),
                has_previous.then(|| with_param(current, "page", (page > 2).then_some(page - 1))),
            ),
            PageMode::Offset => {
                let back = request.offset.saturating_sub(request.limit);
                (
                    has_next.then(|| with_param(current, "offset", Some(end))),
                    has_previous.then(|| with_param(current, "offset", (back > 0).then_some(back))),
                )
            }
        };

        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

/// Absolute URL of the current request relative to the public base.
pub fn request_url(public_url: &Url, uri: &Uri) -> Url {
    let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    public_url.join(path).unwrap_or_else(|_| public_url.clone())
}

fn with_param(current: &Url, key: &str, value: Option<i64>) -> String {
    let pairs: Vec<(String, String)> = current
        .query_pairs()
        .filter(|(k, _)| k != key)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut url = current.clone();
    url.set_query(None);
    if !pairs.is_empty() || value.is_some() {
        let mut query = url.query_pairs_mut();
        for (k, v) in &pairs {
            query.append_pair(k, v);
        }
        if let Some(value) = value {
            query.append_pair(key, &value.to_string());
        }
    }
    url.to_string()
}
