//! Gift card lookup across the paginated Shopify collection.
//!
//! Shopify cannot be asked for a card by its last four characters, so a
//! lookup walks the collection page by page until it finds an eligible card
//! or runs out of pages. Each page depends on the previous page's last cursor,
//! so fetches are strictly sequential.
//!
//! ```text
//!   Fetching(None) ──fetch ok──▶ Evaluating(page)
//!        ▲                          │ eligible card ──▶ Found
//!        │                          │ no next page  ──▶ Exhausted (NotFound)
//!        └──── Fetching(last cursor)┘ next page
//! ```
//!
//! Any fetch error ends the scan. So does a page limit, a next page with no
//! cursor to continue from, or a cursor that was already requested (the
//! upstream is not advancing and the scan would never end).

use std::collections::HashSet;
use std::future::Future;

use chrono::{DateTime, Utc};
use guna_core::{GiftCardPage, LookupKey, SearchResult, first_eligible};
use thiserror::Error;
use tracing::instrument;

use crate::shopify::{AdminClient, ShopifyError};

/// A paginated gift card collection.
pub trait GiftCardSource: Send + Sync {
    /// Fetch the page following `after`, or the first page when `None`.
    fn fetch_page(
        &self,
        after: Option<&str>,
    ) -> impl Future<Output = Result<GiftCardPage, ShopifyError>> + Send;
}

impl GiftCardSource for AdminClient {
    async fn fetch_page(&self, after: Option<&str>) -> Result<GiftCardPage, ShopifyError> {
        self.fetch_gift_card_page(after).await
    }
}

/// Errors that end a scan without an answer.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Fetching a page failed.
    #[error("fetching page {page} failed: {source}")]
    Upstream {
        /// 1-based number of the page that failed.
        page: usize,
        #[source]
        source: ShopifyError,
    },

    /// A page claimed more results but had no edge to continue from.
    #[error("page {page} reports a next page but has no cursor")]
    MissingCursor {
        /// 1-based page number.
        page: usize,
    },

    /// The cursor to continue from had already been requested.
    #[error("page {page} returned a cursor that was already requested")]
    CursorNotAdvancing {
        /// 1-based page number.
        page: usize,
    },

    /// The page budget ran out before the collection did.
    #[error("no match within {max_pages} pages")]
    PageLimitExceeded {
        /// Configured page budget.
        max_pages: usize,
    },
}

enum ScanState {
    Fetching { after: Option<String> },
    Evaluating { page: GiftCardPage },
}

/// Drives a [`GiftCardSource`] until a lookup key is resolved.
#[derive(Debug)]
pub struct PaginationScanner<'a, S> {
    source: &'a S,
    max_pages: usize,
}

impl<'a, S: GiftCardSource> PaginationScanner<'a, S> {
    /// Create a scanner that fetches at most `max_pages` pages.
    #[must_use]
    pub const fn new(source: &'a S, max_pages: usize) -> Self {
        Self { source, max_pages }
    }

    /// Search for the first card eligible for `key` at `now`.
    ///
    /// Stops fetching as soon as a page contains an eligible card.
    ///
    /// # Errors
    ///
    /// Returns a [`ScanError`] if any page fetch fails or pagination cannot
    /// make progress. Cards seen on earlier pages are discarded.
    #[instrument(skip(self, key), fields(key_len = key.len(), max_pages = self.max_pages))]
    pub async fn run(&self, key: &LookupKey, now: DateTime<Utc>) -> Result<SearchResult, ScanError> {
        let mut requested: HashSet<String> = HashSet::new();
        let mut pages_fetched = 0;
        let mut state = ScanState::Fetching { after: None };

        loop {
            state = match state {
                ScanState::Fetching { after } => {
                    if pages_fetched == self.max_pages {
                        return Err(ScanError::PageLimitExceeded {
                            max_pages: self.max_pages,
                        });
                    }
                    pages_fetched += 1;

                    let page = self
                        .source
                        .fetch_page(after.as_deref())
                        .await
                        .map_err(|source| ScanError::Upstream {
                            page: pages_fetched,
                            source,
                        })?;

                    ScanState::Evaluating { page }
                }
                ScanState::Evaluating { page } => {
                    if let Some(card) = first_eligible(&page.edges, key, now) {
                        tracing::debug!(pages_fetched, "Gift card found");
                        return Ok(SearchResult::Found(card.clone()));
                    }

                    if !page.has_next_page {
                        tracing::debug!(pages_fetched, "Gift card collection exhausted");
                        return Ok(SearchResult::NotFound);
                    }

                    let cursor = page.end_cursor().ok_or(ScanError::MissingCursor {
                        page: pages_fetched,
                    })?;

                    if !requested.insert(cursor.to_owned()) {
                        return Err(ScanError::CursorNotAdvancing {
                            page: pages_fetched,
                        });
                    }

                    ScanState::Fetching {
                        after: Some(cursor.to_owned()),
                    }
                }
            };
        }
    }
}
