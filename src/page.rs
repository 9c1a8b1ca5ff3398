//! Server-query state of the grid: page, page size, sort and filters.
//!
//! Every setter reports whether the outgoing query changed so the controller
//! knows when a re-fetch is owed. `total_records` / `total_pages` are only
//! written by [`PageState::apply_total`] after a successful fetch.

use std::collections::BTreeMap;
use std::fmt;

pub const DEFAULT_PAGE_SIZE: usize = 12;
pub const MAX_PAGE_SIZE: usize = 1000;
pub const DEFAULT_SORT_COLUMN: &str = "date";

pub const FILTER_SEARCH: &str = "search";
pub const FILTER_STATUS: &str = "status";
pub const FILTER_SINCE: &str = "since";
pub const FILTER_END: &str = "end";

/// Pages shown on either side of the current one in the compact page list.
pub const PAGE_NEIGHBORS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of everything the list endpoint needs for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub page: usize,
    pub page_size: usize,
    pub sort_column: String,
    pub sort_direction: SortDirection,
    pub filters: BTreeMap<String, String>,
}

impl Query {
    /// Query-string pairs in wire order: paging, sorting, then filters by key.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("pageSize".to_string(), self.page_size.to_string()),
            ("sortColumn".to_string(), self.sort_column.clone()),
            ("sortDirection".to_string(), self.sort_direction.to_string()),
        ];
        pairs.extend(self.filters.iter().map(|(k, v)| (k.clone(), v.clone())));
        pairs
    }
}

#[derive(Debug, Clone)]
pub struct PageState {
    current_page: usize,
    page_size: usize,
    sort_column: String,
    sort_direction: SortDirection,
    filters: BTreeMap<String, String>,
    total_records: usize,
    total_pages: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PageState {
    pub fn new(page_size: usize) -> Self {
        Self {
            current_page: 1,
            page_size: page_size.max(1),
            sort_column: DEFAULT_SORT_COLUMN.to_string(),
            sort_direction: SortDirection::Desc,
            filters: BTreeMap::new(),
            total_records: 0,
            total_pages: 0,
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn sort_column(&self) -> &str {
        &self.sort_column
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    pub fn filters(&self) -> &BTreeMap<String, String> {
        &self.filters
    }

    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters.get(key).map(String::as_str)
    }

    pub fn total_records(&self) -> usize {
        self.total_records
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn query(&self) -> Query {
        Query {
            page: self.current_page,
            page_size: self.page_size,
            sort_column: self.sort_column.clone(),
            sort_direction: self.sort_direction,
            filters: self.filters.clone(),
        }
    }

    /// Moves to `page`. Rejects 0, the current page, and pages past the last
    /// known page once a total has been reported.
    pub fn set_page(&mut self, page: usize) -> bool {
        if page == 0 || page == self.current_page {
            return false;
        }
        if self.total_pages > 0 && page > self.total_pages {
            return false;
        }
        self.current_page = page;
        true
    }

    pub fn set_page_size(&mut self, page_size: usize) -> bool {
        let page_size = page_size.max(1);
        if page_size == self.page_size {
            return false;
        }
        self.page_size = page_size;
        self.current_page = 1;
        self.total_pages = self.total_records.div_ceil(page_size);
        true
    }

    pub fn set_sort(&mut self, column: &str, direction: SortDirection) -> bool {
        if column == self.sort_column && direction == self.sort_direction {
            return false;
        }
        self.sort_column = column.to_string();
        self.sort_direction = direction;
        true
    }

    /// Sets (or, for `None` / blank values, removes) a filter and always
    /// returns to page 1. Returns whether the resulting query differs.
    pub fn set_filter(&mut self, key: &str, value: Option<&str>) -> bool {
        let before = self.query();
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => {
                self.filters.insert(key.to_string(), v.to_string());
            }
            None => {
                self.filters.remove(key);
            }
        }
        self.current_page = 1;
        self.query() != before
    }

    /// True when no filter narrows the listing.
    pub fn is_unfiltered(&self) -> bool {
        self.filters.is_empty()
    }

    pub(crate) fn apply_total(&mut self, total: usize) {
        self.total_records = total;
        self.total_pages = total.div_ceil(self.page_size);
    }

    /// 1-based inclusive record range of the current page, `(0, 0)` when empty.
    pub fn showing_range(&self) -> (usize, usize) {
        if self.total_records == 0 {
            return (0, 0);
        }
        let start = (self.current_page - 1)
            .saturating_mul(self.page_size)
            .saturating_add(1);
        let end = start
            .saturating_add(self.page_size - 1)
            .min(self.total_records);
        (start.min(end), end)
    }

    /// Pulls a page number left past the end of a shrunken result set back
    /// onto the last page. Returns whether that page still has to be fetched;
    /// an empty result set goes to page 1 with nothing to fetch.
    pub(crate) fn clamp_to_last_page(&mut self) -> bool {
        if self.total_pages == 0 {
            self.current_page = 1;
            return false;
        }
        if self.current_page <= self.total_pages {
            return false;
        }
        self.current_page = self.total_pages;
        true
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// One slot of the rendered page navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Previous { target: usize, enabled: bool },
    Page { number: usize, current: bool },
    Gap,
    Next { target: usize, enabled: bool },
}

/// Compact navigation: first, last, current ± [`PAGE_NEIGHBORS`], with one
/// [`PageLink::Gap`] per run of hidden pages. Empty for a single page.
pub fn page_links(current: usize, total: usize) -> Vec<PageLink> {
    if total <= 1 {
        return Vec::new();
    }
    let current = current.clamp(1, total);
    let low = current.saturating_sub(PAGE_NEIGHBORS).max(1);
    let high = (current + PAGE_NEIGHBORS).min(total);

    let mut visible: Vec<usize> = Vec::with_capacity(PAGE_NEIGHBORS * 2 + 3);
    visible.push(1);
    visible.extend((low..=high).filter(|&p| p != 1 && p != total));
    visible.push(total);

    let mut links = vec![PageLink::Previous {
        target: current.saturating_sub(1).max(1),
        enabled: current > 1,
    }];
    let mut prev: Option<usize> = None;
    for page in visible {
        if prev.is_some_and(|p| page > p + 1) {
            links.push(PageLink::Gap);
        }
        links.push(PageLink::Page {
            number: page,
            current: page == current,
        });
        prev = Some(page);
    }
    links.push(PageLink::Next {
        target: (current + 1).min(total),
        enabled: current < total,
    });
    links
}
