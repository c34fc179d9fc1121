// ABOUTME: Page-number pagination with absolute next/previous links
// ABOUTME: Resolves page and page_size query parameters against a result count
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

use serde::Serialize;
use url::Url;

use crate::constants::{messages, pagination};
use crate::errors::{AppError, AppResult};

/// Page selector strings resolving to the last page
const LAST_PAGE_STRINGS: [&str; 1] = ["last"];

/// Paginated response envelope
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    /// Total number of matching items across all pages
    pub count: u64,
    /// Absolute URL of the next page
    pub next: Option<String>,
    /// Absolute URL of the previous page
    pub previous: Option<String>,
    /// Items on this page
    pub results: Vec<T>,
}

/// Raw pagination query parameters
#[derive(Debug, Clone, Default)]
pub struct PageParams {
    /// Requested page (1-based number or `last`)
    pub page: Option<String>,
    /// Requested page size
    pub page_size: Option<String>,
}

impl PageParams {
    /// Effective page size: a positive integer capped at the maximum, else the default
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
            .as_deref()
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|size| *size > 0)
            .map_or(pagination::DEFAULT_PAGE_SIZE, |size| {
                size.min(pagination::MAX_PAGE_SIZE)
            })
    }

    /// Resolve the requested page against `count` matching items
    ///
    /// # Errors
    ///
    /// Returns a 404 `Invalid page.` error for non-numeric or out of range pages
    pub fn resolve(&self, count: u64) -> AppResult<PageWindow> {
        let page_size = self.page_size();
        let num_pages = count.div_ceil(u64::from(page_size)).max(1);

        let number = match self.page.as_deref() {
            None => 1,
            Some(raw) if LAST_PAGE_STRINGS.contains(&raw) => num_pages,
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| AppError::not_found_detail(messages::INVALID_PAGE))?,
        };

        if number < 1 || number > num_pages {
            return Err(AppError::not_found_detail(messages::INVALID_PAGE));
        }

        Ok(PageWindow {
            number,
            page_size,
            num_pages,
            count,
        })
    }
}

/// A resolved page within a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-based page number
    pub number: u64,
    /// Items per page
    pub page_size: u32,
    /// Total pages (at least one)
    pub num_pages: u64,
    /// Total matching items
    pub count: u64,
}

impl PageWindow {
    /// SQL offset of the first item on this page
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.number - 1) * self.page_size as u64
    }

    /// SQL limit for this page
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.page_size as u64
    }

    /// Wrap `results` in a [`Page`] with links derived from the request URL
    #[must_use]
    pub fn into_page<T>(self, results: Vec<T>, request_url: &Url) -> Page<T> {
        let next = (self.number < self.num_pages)
            .then(|| page_link(request_url, Some(self.number + 1)));
        let previous = (self.number > 1).then(|| {
            let target = self.number - 1;
            page_link(request_url, (target > 1).then_some(target))
        });

        Page {
            count: self.count,
            next,
            previous,
            results,
        }
    }
}

/// Rewrite the `page` query parameter of `url`; `None` removes it
fn page_link(url: &Url, page: Option<u64>) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != pagination::PAGE_QUERY_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    if let Some(page) = page {
        pairs.push((pagination::PAGE_QUERY_PARAM.to_owned(), page.to_string()));
    }
    pairs.sort();

    let mut link = url.clone();
    if pairs.is_empty() {
        link.set_query(None);
    } else {
        link.query_pairs_mut().clear().extend_pairs(pairs);
    }
    link.to_string()
}
