//! Nearest non-empty page search

use crate::store::Store;
use tideline_core::{ChannelId, Page, Result, SourceId};

/// Search direction along a channel's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards page 0.
    Backward,
    /// Towards the current page.
    Forward,
}

/// Find the nearest page at or beyond `page` that holds messages.
///
/// Backward searches stop at page 0, forward searches at the current page;
/// both give up after `paging.max_page_scan` fetches and return the last page
/// examined. Fetched pages are merged into the store as a side effect.
///
/// # Errors
///
/// Propagates the first failed page fetch.
pub async fn next_page_number(
    store: &Store,
    channel: &ChannelId,
    page: Page,
    direction: Direction,
    source: &SourceId,
) -> Result<Page> {
    let current = store.current_page();
    let max_scan = store.config().paging.max_page_scan;

    match direction {
        Direction::Backward => {
            if page < 0 {
                return Ok(0);
            }
            let mut p = page.min(current);
            let mut examined = p;
            for _ in 0..max_scan {
                if p < 0 {
                    return Ok(0);
                }
                examined = p;
                if !store.message_page(source, channel, p).await?.is_empty() {
                    tracing::debug!(%channel, from = page, found = p, "found earlier page");
                    return Ok(p);
                }
                if p == 0 {
                    return Ok(0);
                }
                p -= 1;
            }
            tracing::debug!(%channel, from = page, stopped = examined, "backward page scan exhausted");
            Ok(examined.max(0))
        }
        Direction::Forward => {
            if page > current {
                return Ok(current);
            }
            let mut p = page.max(0);
            let mut examined = p;
            for _ in 0..max_scan {
                if p >= current {
                    return Ok(current);
                }
                examined = p;
                if !store.message_page(source, channel, p).await?.is_empty() {
                    tracing::debug!(%channel, from = page, found = p, "found later page");
                    return Ok(p);
                }
                p += 1;
            }
            tracing::debug!(%channel, from = page, stopped = examined, "forward page scan exhausted");
            Ok(examined.min(current))
        }
    }
}
