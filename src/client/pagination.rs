// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Pagination helpers for WAPI list operations.
//!
//! WAPI lists are fetched with `_paging=1&_max_results=N`; each page carries a
//! `next_page_id` until the last one. Fetching in pages keeps large result sets
//! (thousands of records in a zone) from hitting the appliance's result limit.

use serde_json::Value;
use std::future::Future;
use tracing::debug;
use url::Url;

use crate::constants::{NEXT_PAGE_ID_FIELD, RESULT_FIELD};
use crate::errors::ClientError;

/// One page of a list response.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    pub next_page_id: Option<String>,
}

impl Page {
    /// Parse a list response.
    ///
    /// Accepts both the paged `{"result": [...], "next_page_id": "..."}` form and a
    /// bare JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error if the response is neither.
    pub fn from_response(response: Value, url: &Url) -> Result<Self, ClientError> {
        match response {
            Value::Array(items) => Ok(Self {
                items,
                next_page_id: None,
            }),
            Value::Object(mut map) => {
                let items = match map.remove(RESULT_FIELD) {
                    Some(Value::Array(items)) => items,
                    Some(Value::Null) | None => Vec::new(),
                    Some(_) => {
                        return Err(ClientError::InvalidResponse {
                            url: url.to_string(),
                            reason: format!("'{RESULT_FIELD}' is not a list"),
                        })
                    }
                };
                let next_page_id = map
                    .remove(NEXT_PAGE_ID_FIELD)
                    .and_then(|v| v.as_str().map(str::to_string))
                    .filter(|id| !id.is_empty());
                Ok(Self {
                    items,
                    next_page_id,
                })
            }
            other => Err(ClientError::InvalidResponse {
                url: url.to_string(),
                reason: format!("expected a list response, got {other}"),
            }),
        }
    }
}

/// Fetch every page of a list.
///
/// `fetch_page` is called with `None` for the first page and with the previous
/// page's `next_page_id` afterwards, until a page comes back without one.
///
/// # Errors
///
/// Returns the first error raised by `fetch_page`.
pub async fn list_all_pages<F, Fut>(mut fetch_page: F) -> Result<Vec<Value>, ClientError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page, ClientError>>,
{
    let mut all_items = Vec::new();
    let mut page_id = None;
    let mut page_count = 0;

    loop {
        page_count += 1;
        let page = fetch_page(page_id.take()).await?;

        let item_count = page.items.len();
        all_items.extend(page.items);

        debug!(
            page = page_count,
            items_in_page = item_count,
            total_items = all_items.len(),
            "Fetched page from WAPI"
        );

        match page.next_page_id {
            Some(next) => page_id = Some(next),
            None => break,
        }
    }

    debug!(
        total_pages = page_count,
        total_items = all_items.len(),
        "Completed paginated list operation"
    );

    Ok(all_items)
}

#[cfg(test)]
#[path = "pagination_tests.rs"]
mod pagination_tests;
