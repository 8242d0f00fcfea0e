use serde::Serialize;

use crate::{protocol::SearchResponse, store::ParameterStore};

pub const DEFAULT_ROWS: u64 = 10;

/// One slot of a windowed pager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageItem {
    Page(u32),
    Gap,
}

/// Page numbers to show for `current` out of `total` pages.
///
/// The first and last pages are always present. Around them sit outer windows
/// of `outer` pages, and around `current` an inner window of `inner` pages on
/// each side (shifted inwards when it would run past either end). A hole of
/// exactly one page is filled in; longer holes collapse to a single
/// [`PageItem::Gap`].
pub fn windowed_pages(current: u32, total: u32, inner: u32, outer: u32) -> Vec<PageItem> {
    if total == 0 {
        return Vec::new();
    }
    let (current, total, inner, outer) = (
        i64::from(current),
        i64::from(total),
        i64::from(inner),
        i64::from(outer),
    );

    let mut window_from = current - inner;
    let mut window_to = current + inner;
    if window_to > total {
        window_from = (window_from - (window_to - total)).max(0);
        window_to = total;
    }
    if window_from < 1 {
        window_to = total.min(window_to + (1 - window_from));
        window_from = 1;
    }

    let mut visible = vec![1];
    visible.extend(2..=(1 + outer).min(window_from - 1));
    if 1 + outer == window_from - 2 {
        visible.push(window_from - 1);
    }
    visible.extend(window_from.max(2)..=window_to.min(total - 1));
    if total - outer == window_to + 2 {
        visible.push(window_to + 1);
    }
    visible.extend((total - outer).max(window_to + 1)..total);
    if total > 1 {
        visible.push(total);
    }

    let mut items = Vec::with_capacity(visible.len() + 2);
    let mut previous: Option<i64> = None;
    for page in visible {
        if page < 1 || page > total || previous.is_some_and(|prev| page <= prev) {
            continue;
        }
        if previous.is_some_and(|prev| page > prev + 1) {
            items.push(PageItem::Gap);
        }
        // 1 <= page <= total, and total came from a u32
        items.push(PageItem::Page(page as u32));
        previous = Some(page);
    }
    items
}

/// Where a result page sits within the whole result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PagerState {
    pub per_page: u64,
    pub offset: u64,
    pub total: u64,
    pub current_page: u64,
    pub total_pages: u64,
}

impl PagerState {
    /// Rows and offset come from the echoed request parameters when the
    /// engine reports them, otherwise from the store.
    pub fn from_response(store: &ParameterStore, response: &SearchResponse) -> Self {
        let per_page = response
            .header_param("rows")
            .filter(|rows| *rows > 0)
            .or_else(|| store_u64(store, "rows").filter(|rows| *rows > 0))
            .unwrap_or(DEFAULT_ROWS);
        let offset = response
            .header_param("start")
            .or_else(|| store_u64(store, "start"))
            .unwrap_or(0);
        Self::new(per_page, offset, response.response.num_found)
    }

    pub fn new(per_page: u64, offset: u64, total: u64) -> Self {
        let per_page = per_page.max(1);
        let offset = offset - offset % per_page;
        Self {
            per_page,
            offset,
            total,
            current_page: (offset + 1).div_ceil(per_page),
            total_pages: total.div_ceil(per_page),
        }
    }

    pub fn previous_page(&self) -> Option<u64> {
        (self.current_page > 1).then(|| self.current_page - 1)
    }

    pub fn next_page(&self) -> Option<u64> {
        (self.current_page < self.total_pages).then(|| self.current_page + 1)
    }

    /// Link relation for a page link.
    pub fn rel(&self, page: u64) -> &'static str {
        if Some(page) == self.previous_page() {
            if page == 1 {
                "prevstart"
            } else {
                "prev"
            }
        } else if Some(page) == self.next_page() {
            "next"
        } else if page == 1 {
            "start"
        } else {
            ""
        }
    }

    /// The `start` parameter that shows `page`.
    pub fn offset_for(&self, page: u64) -> u64 {
        page.saturating_sub(1) * self.per_page
    }

    /// "first to last of total", or `None` when nothing was found.
    pub fn display_range(&self) -> Option<String> {
        if self.total == 0 {
            return None;
        }
        let first = (self.offset + 1).min(self.total);
        let last = (self.offset + self.per_page).min(self.total);
        Some(format!("{first} to {last} of {}", self.total))
    }

    pub fn pages(&self, inner: u32, outer: u32) -> Vec<PageItem> {
        let clamp = |value: u64| u32::try_from(value).unwrap_or(u32::MAX);
        windowed_pages(
            clamp(self.current_page),
            clamp(self.total_pages),
            inner,
            outer,
        )
    }
}

fn store_u64(store: &ParameterStore, name: &str) -> Option<u64> {
    store
        .first_value(name)?
        .as_scalar()?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
#[path = "tests/pagination_tests.rs"]
mod tests;
