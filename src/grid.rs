//! Grid controller: owns page state, selection and the loaded page.
//!
//! The controller is synchronous. Anything that changes the server query
//! returns a [`FetchTicket`]; the caller runs the fetch and feeds the result
//! back through [`GridController::apply`]. Each ticket carries a generation
//! number and only the most recently issued generation may land, so a slow
//! response can never overwrite a newer one.

use crate::app::Run;
use crate::card::{self, SelectionChanged};
use crate::collection::{RunCollection, RunPage};
use crate::error::FetchError;
use crate::page::{
    page_links, PageLink, PageState, Query, SortDirection, FILTER_END, FILTER_SEARCH,
    FILTER_SINCE, FILTER_STATUS,
};
use crate::selection::{Selected, SelectionTracker};
use std::collections::BTreeMap;

/// Initial grid settings, normally built from the command line.
#[derive(Debug, Clone)]
pub struct GridConfig {
    pub page_size: usize,
    pub sort_column: String,
    pub sort_direction: SortDirection,
    pub filters: BTreeMap<String, String>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            page_size: crate::page::DEFAULT_PAGE_SIZE,
            sort_column: crate::page::DEFAULT_SORT_COLUMN.to_string(),
            sort_direction: SortDirection::Desc,
            filters: BTreeMap::new(),
        }
    }
}

/// A fetch the caller must perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub query: Query,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridStatus {
    Idle,
    Fetching { generation: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Failed,
    /// Superseded by a later ticket; dropped without touching state.
    Stale,
}

/// Outbound notifications, drained by the UI each frame.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    SelectionChanged(Vec<Selected>),
    FetchFailed { message: String },
    SelectionPruned(Vec<String>),
}

#[derive(Debug)]
pub struct GridController {
    page: PageState,
    selection: SelectionTracker,
    runs: RunCollection,
    generation: u64,
    status: GridStatus,
    last_error: Option<String>,
    events: Vec<GridEvent>,
    follow_up: Option<FetchTicket>,
}

impl Default for GridController {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

impl GridController {
    pub fn new(config: GridConfig) -> Self {
        let mut page = PageState::new(config.page_size);
        page.set_sort(&config.sort_column, config.sort_direction);
        for (key, value) in &config.filters {
            page.set_filter(key, Some(value));
        }
        Self {
            page,
            selection: SelectionTracker::new(),
            runs: RunCollection::new(),
            generation: 0,
            status: GridStatus::Idle,
            last_error: None,
            events: Vec::new(),
            follow_up: None,
        }
    }

    pub fn page_state(&self) -> &PageState {
        &self.page
    }

    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    pub fn runs(&self) -> &[Run] {
        self.runs.runs()
    }

    pub fn status(&self) -> GridStatus {
        self.status
    }

    pub fn is_fetching(&self) -> bool {
        matches!(self.status, GridStatus::Fetching { .. })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn take_events(&mut self) -> Vec<GridEvent> {
        std::mem::take(&mut self.events)
    }

    /// Fetch owed after a landed page moved the current page, if any.
    pub fn take_follow_up(&mut self) -> Option<FetchTicket> {
        self.follow_up.take()
    }

    // --- Fetch lifecycle ---

    /// Issues a ticket for the current query, superseding any in flight.
    pub fn refresh(&mut self) -> FetchTicket {
        self.follow_up = None;
        self.generation += 1;
        self.status = GridStatus::Fetching {
            generation: self.generation,
        };
        tracing::debug!(generation = self.generation, page = self.page.current_page(), "fetch issued");
        FetchTicket {
            generation: self.generation,
            query: self.page.query(),
        }
    }

    fn refresh_if(&mut self, changed: bool) -> Option<FetchTicket> {
        changed.then(|| self.refresh())
    }

    /// Lands a fetch result. Failures leave the loaded page and totals as
    /// they were and emit exactly one [`GridEvent::FetchFailed`].
    pub fn apply(&mut self, generation: u64, result: Result<RunPage, FetchError>) -> ApplyOutcome {
        if generation != self.generation {
            tracing::debug!(generation, latest = self.generation, "discarding stale response");
            return ApplyOutcome::Stale;
        }
        self.status = GridStatus::Idle;
        match result {
            Ok(page) => {
                self.land_page(page);
                self.last_error = None;
                if self.page.clamp_to_last_page() {
                    tracing::debug!(page = self.page.current_page(), "result set shrank; moving to last page");
                    let ticket = self.refresh();
                    self.follow_up = Some(ticket);
                }
                ApplyOutcome::Applied
            }
            Err(e) => {
                tracing::warn!(generation, kind = ?e.kind(), "fetch failed: {e}");
                let message = e.user_message();
                self.last_error = Some(message.clone());
                self.events.push(GridEvent::FetchFailed { message });
                ApplyOutcome::Failed
            }
        }
    }

    fn land_page(&mut self, page: RunPage) {
        let complete_listing = self.page.is_unfiltered()
            && self.page.current_page() == 1
            && page.total <= page.data.len();

        self.page.apply_total(page.total);
        self.runs.replace(page.data);

        let mut pruned = self.selection.forget(page.removed.iter().map(String::as_str));
        if complete_listing {
            pruned.extend(self.selection.retain_existing(self.runs.runs()));
        }
        self.sync_selected_flags();

        if !pruned.is_empty() {
            tracing::debug!(?pruned, "dropped deleted runs from selection");
            self.events.push(GridEvent::SelectionPruned(pruned));
            self.emit_selection();
        }
    }

    fn sync_selected_flags(&mut self) {
        let selection = &self.selection;
        for run in self.runs.iter_mut() {
            run.selected = selection.has(&run.id);
        }
    }

    // --- Query-affecting actions ---

    pub fn go_to_page(&mut self, page: usize) -> Option<FetchTicket> {
        let changed = self.page.set_page(page);
        self.refresh_if(changed)
    }

    pub fn next_page(&mut self) -> Option<FetchTicket> {
        if !self.page.has_next() {
            return None;
        }
        self.go_to_page(self.page.current_page() + 1)
    }

    pub fn previous_page(&mut self) -> Option<FetchTicket> {
        if !self.page.has_previous() {
            return None;
        }
        self.go_to_page(self.page.current_page() - 1)
    }

    pub fn first_page(&mut self) -> Option<FetchTicket> {
        self.go_to_page(1)
    }

    pub fn last_page(&mut self) -> Option<FetchTicket> {
        let last = self.page.total_pages();
        self.go_to_page(last)
    }

    /// Follows a rendered navigation link. Disabled links and gaps are inert.
    pub fn follow_link(&mut self, link: PageLink) -> Option<FetchTicket> {
        match link {
            PageLink::Previous { target, enabled } | PageLink::Next { target, enabled } => {
                if enabled {
                    self.go_to_page(target)
                } else {
                    None
                }
            }
            PageLink::Page { number, .. } => self.go_to_page(number),
            PageLink::Gap => None,
        }
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Option<FetchTicket> {
        let changed = self.page.set_page_size(page_size);
        self.refresh_if(changed)
    }

    pub fn set_sort(&mut self, column: &str, direction: SortDirection) -> Option<FetchTicket> {
        let changed = self.page.set_sort(column, direction);
        self.refresh_if(changed)
    }

    pub fn flip_sort_direction(&mut self) -> Option<FetchTicket> {
        let column = self.page.sort_column().to_string();
        let direction = self.page.sort_direction().flipped();
        self.set_sort(&column, direction)
    }

    /// Called once typing has settled.
    pub fn set_search(&mut self, term: &str) -> Option<FetchTicket> {
        let changed = self.page.set_filter(FILTER_SEARCH, Some(term));
        self.refresh_if(changed)
    }

    pub fn set_status_filter(&mut self, status: Option<&str>) -> Option<FetchTicket> {
        let changed = self.page.set_filter(FILTER_STATUS, status);
        self.refresh_if(changed)
    }

    pub fn set_date_range(&mut self, since: Option<&str>, end: Option<&str>) -> Option<FetchTicket> {
        let since_changed = self.page.set_filter(FILTER_SINCE, since);
        let end_changed = self.page.set_filter(FILTER_END, end);
        self.refresh_if(since_changed || end_changed)
    }

    // --- Selection (local only, never fetches) ---

    /// Flips the card for `id` and applies its notification.
    pub fn toggle(&mut self, id: &str) -> bool {
        let Some(run) = self.runs.get_mut(id) else {
            return false;
        };
        let note = card::toggle(run);
        self.on_selection_changed(&note);
        true
    }

    pub fn on_selection_changed(&mut self, note: &SelectionChanged) {
        if note.run.selected {
            self.selection.add(&note.run.id);
        } else {
            self.selection.remove(&note.run.id);
        }
        if let Some(run) = self.runs.get_mut(&note.run.id) {
            run.selected = note.run.selected;
        }
        self.emit_selection();
    }

    /// Selects every run on the loaded page (not the whole filtered result).
    pub fn select_all_on_page(&mut self) {
        let ids: Vec<String> = self.runs.ids().map(str::to_string).collect();
        self.selection.select_all(ids.iter().map(String::as_str));
        for run in self.runs.iter_mut() {
            run.selected = true;
        }
        self.emit_selection();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        for run in self.runs.iter_mut() {
            run.selected = false;
        }
        self.emit_selection();
    }

    /// Prunes runs that some other channel reported as deleted.
    pub fn forget_runs<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        let pruned = self.selection.forget(ids);
        if pruned.is_empty() {
            return;
        }
        self.sync_selected_flags();
        self.events.push(GridEvent::SelectionPruned(pruned));
        self.emit_selection();
    }

    pub fn get_selected(&self) -> Vec<Selected> {
        self.selection.get_selected(self.runs.runs())
    }

    fn emit_selection(&mut self) {
        let selected = self.get_selected();
        self.events.push(GridEvent::SelectionChanged(selected));
    }

    // --- View helpers ---

    pub fn page_links(&self) -> Vec<PageLink> {
        page_links(self.page.current_page(), self.page.total_pages())
    }

    /// `(first, last, total)` for the "Showing X-Y of Z" line.
    pub fn showing(&self) -> (usize, usize, usize) {
        let (start, end) = self.page.showing_range();
        (start, end, self.page.total_records())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::RunStatus;
    use pretty_assertions::assert_eq;

    fn run(id: &str) -> Run {
        Run {
            id: id.to_string(),
            name: None,
            status: RunStatus::Completed,
            date: None,
            tags: Vec::new(),
            metrics: Default::default(),
            selected: false,
        }
    }

    fn page_of(ids: &[&str], total: usize) -> RunPage {
        RunPage {
            data: ids.iter().map(|id| run(id)).collect(),
            total,
            removed: Vec::new(),
        }
    }

    fn loaded(ids: &[&str], total: usize) -> GridController {
        let mut grid = GridController::default();
        let t = grid.refresh();
        grid.apply(t.generation, Ok(page_of(ids, total)));
        grid.take_events();
        grid
    }

    #[test]
    fn refresh_bumps_generation_and_enters_fetching() {
        let mut grid = GridController::default();
        let a = grid.refresh();
        let b = grid.refresh();
        assert_eq!(a.generation + 1, b.generation);
        assert_eq!(grid.status(), GridStatus::Fetching { generation: b.generation });
    }

    #[test]
    fn config_applies_sort_and_filters() {
        let mut filters = BTreeMap::new();
        filters.insert(FILTER_STATUS.to_string(), "failed".to_string());
        let grid = GridController::new(GridConfig {
            page_size: 5,
            sort_column: "accuracy".to_string(),
            sort_direction: SortDirection::Asc,
            filters,
        });
        let q = grid.page_state().query();
        assert_eq!(q.page_size, 5);
        assert_eq!(q.sort_column, "accuracy");
        assert_eq!(q.sort_direction, SortDirection::Asc);
        assert_eq!(q.filters.get("status").map(String::as_str), Some("failed"));
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut grid = GridController::default();
        let a = grid.refresh();
        let b = grid.refresh();
        assert_eq!(grid.apply(b.generation, Ok(page_of(&["b1"], 1))), ApplyOutcome::Applied);
        assert_eq!(grid.apply(a.generation, Ok(page_of(&["a1"], 50))), ApplyOutcome::Stale);
        assert_eq!(grid.runs()[0].id, "b1");
        assert_eq!(grid.page_state().total_records(), 1);
        assert_eq!(grid.status(), GridStatus::Idle);
    }

    #[test]
    fn stale_failure_is_silent() {
        let mut grid = GridController::default();
        let a = grid.refresh();
        let _b = grid.refresh();
        let outcome = grid.apply(a.generation, Err(FetchError::Unavailable("down".into())));
        assert_eq!(outcome, ApplyOutcome::Stale);
        assert!(grid.take_events().is_empty());
        assert!(grid.is_fetching());
    }

    #[test]
    fn failure_keeps_last_good_page() {
        let mut grid = loaded(&["r1", "r2"], 30);
        let t = grid.next_page().unwrap();
        let outcome = grid.apply(
            t.generation,
            Err(FetchError::Status {
                status: 500,
                body: String::new(),
            }),
        );
        assert_eq!(outcome, ApplyOutcome::Failed);
        assert_eq!(grid.runs().len(), 2);
        assert_eq!(grid.page_state().total_records(), 30);
        let events = grid.take_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], GridEvent::FetchFailed { .. }));
        assert!(grid.last_error().is_some());
    }

    #[test]
    fn success_clears_last_error() {
        let mut grid = GridController::default();
        let t = grid.refresh();
        grid.apply(t.generation, Err(FetchError::Unavailable("x".into())));
        let t = grid.refresh();
        grid.apply(t.generation, Ok(page_of(&["r1"], 1)));
        assert!(grid.last_error().is_none());
    }

    #[test]
    fn shrunken_total_moves_to_last_page_and_refetches() {
        let mut grid = loaded(&["r1"], 108);
        let t = grid.last_page().unwrap();
        assert_eq!(t.query.page, 9);
        assert_eq!(grid.apply(t.generation, Ok(page_of(&[], 90))), ApplyOutcome::Applied);

        assert_eq!(grid.page_state().current_page(), 8);
        assert_eq!(grid.page_state().total_pages(), 8);
        assert_eq!(grid.showing(), (85, 90, 90));
        let follow = grid.take_follow_up().unwrap();
        assert_eq!(follow.query.page, 8);
        assert_eq!(follow.generation, grid.generation());
        assert!(grid.is_fetching());
        assert!(grid.take_follow_up().is_none());

        let links = grid.page_links();
        assert_eq!(links[0], PageLink::Previous { target: 7, enabled: true });
        assert!(links.contains(&PageLink::Page { number: 8, current: true }));

        grid.apply(follow.generation, Ok(page_of(&["r85"], 90)));
        assert!(grid.take_follow_up().is_none());
        assert_eq!(grid.page_state().current_page(), 8);
    }

    #[test]
    fn empty_result_set_returns_to_first_page_without_follow_up() {
        let mut grid = loaded(&["r1"], 36);
        let t = grid.next_page().unwrap();
        grid.apply(t.generation, Ok(page_of(&[], 0)));
        assert!(grid.take_follow_up().is_none());
        assert!(!grid.is_fetching());
        assert_eq!(grid.page_state().current_page(), 1);
    }

    #[test]
    fn newer_refresh_drops_pending_follow_up() {
        let mut grid = loaded(&["r1"], 108);
        let t = grid.last_page().unwrap();
        grid.apply(t.generation, Ok(page_of(&[], 90)));
        grid.set_search("bert");
        assert!(grid.take_follow_up().is_none());
    }

    #[test]
    fn navigation_bounds() {
        let mut grid = loaded(&["r1"], 36);
        assert!(grid.previous_page().is_none());
        assert!(grid.first_page().is_none());
        let t = grid.last_page().unwrap();
        assert_eq!(t.query.page, 3);
        grid.apply(t.generation, Ok(page_of(&["r30"], 36)));
        assert!(grid.next_page().is_none());
        assert_eq!(grid.previous_page().unwrap().query.page, 2);
    }

    #[test]
    fn disabled_links_do_not_fetch() {
        let mut grid = loaded(&["r1"], 36);
        let before = grid.generation();
        let prev = grid.page_links()[0];
        assert_eq!(prev, PageLink::Previous { target: 1, enabled: false });
        assert!(grid.follow_link(prev).is_none());
        assert!(grid.follow_link(PageLink::Gap).is_none());
        assert_eq!(grid.generation(), before);
        let t = grid.follow_link(PageLink::Page { number: 3, current: false });
        assert_eq!(t.unwrap().query.page, 3);
    }

    #[test]
    fn toggle_updates_tracker_without_fetch() {
        let mut grid = loaded(&["r1", "r2"], 2);
        let gen = grid.generation();
        assert!(grid.toggle("r2"));
        assert!(grid.selection().has("r2"));
        assert!(grid.runs()[1].selected);
        assert_eq!(grid.generation(), gen);
        assert!(!grid.is_fetching());
        assert!(grid.toggle("r2"));
        assert!(!grid.selection().has("r2"));
        assert!(!grid.toggle("nope"));
    }

    #[test]
    fn toggle_emits_selection_changed_with_payload() {
        let mut grid = loaded(&["r1"], 1);
        grid.toggle("r1");
        let events = grid.take_events();
        match &events[..] {
            [GridEvent::SelectionChanged(sel)] => {
                assert_eq!(sel.len(), 1);
                assert_eq!(sel[0].id(), "r1");
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn selected_flags_restored_after_fetch() {
        let mut grid = loaded(&["r1", "r2"], 40);
        grid.toggle("r1");
        let t = grid.next_page().unwrap();
        grid.apply(t.generation, Ok(page_of(&["r3"], 40)));
        let t = grid.previous_page().unwrap();
        grid.apply(t.generation, Ok(page_of(&["r1", "r2"], 40)));
        assert!(grid.runs()[0].selected);
        assert!(!grid.runs()[1].selected);
    }

    #[test]
    fn removed_ids_are_pruned() {
        let mut grid = loaded(&["r1", "r2"], 40);
        grid.toggle("r1");
        grid.toggle("r2");
        grid.take_events();
        let t = grid.refresh();
        let mut page = page_of(&["r1"], 39);
        page.removed = vec!["r2".to_string()];
        grid.apply(t.generation, Ok(page));
        assert!(!grid.selection().has("r2"));
        assert!(grid.selection().has("r1"));
        let events = grid.take_events();
        assert!(events.contains(&GridEvent::SelectionPruned(vec!["r2".to_string()])));
    }

    #[test]
    fn complete_unfiltered_listing_prunes_missing() {
        let mut grid = loaded(&["r1", "r2", "r3"], 3);
        grid.select_all_on_page();
        let t = grid.refresh();
        grid.apply(t.generation, Ok(page_of(&["r1", "r3"], 2)));
        assert_eq!(grid.selection().ids().collect::<Vec<_>>(), vec!["r1", "r3"]);
    }

    #[test]
    fn filtered_listing_never_prunes() {
        let mut grid = loaded(&["r1", "r2"], 2);
        grid.select_all_on_page();
        let t = grid.set_status_filter(Some("failed")).unwrap();
        grid.apply(t.generation, Ok(page_of(&["r2"], 1)));
        assert_eq!(grid.selection().len(), 2);
    }

    #[test]
    fn forget_runs_prunes_and_unflags() {
        let mut grid = loaded(&["r1"], 10);
        grid.toggle("r1");
        grid.forget_runs(["r1"]);
        assert!(grid.selection().is_empty());
        assert!(!grid.runs()[0].selected);
    }

    #[test]
    fn search_and_status_are_conjunctive() {
        let mut grid = loaded(&["r1"], 50);
        grid.set_search("bert");
        let t = grid.set_status_filter(Some("running")).unwrap();
        assert_eq!(t.query.filters.get("search").map(String::as_str), Some("bert"));
        assert_eq!(t.query.filters.get("status").map(String::as_str), Some("running"));
        let t = grid.set_status_filter(None).unwrap();
        assert_eq!(t.query.filters.get("search").map(String::as_str), Some("bert"));
        assert!(!t.query.filters.contains_key("status"));
    }

    #[test]
    fn date_range_filter_resets_page() {
        let mut grid = loaded(&["r1"], 50);
        let t = grid.next_page().unwrap();
        grid.apply(t.generation, Ok(page_of(&["r13"], 50)));
        let t = grid.set_date_range(Some("2024-01-01"), None).unwrap();
        assert_eq!(t.query.page, 1);
        assert_eq!(t.query.filters.get("since").map(String::as_str), Some("2024-01-01"));
    }

    #[test]
    fn flip_sort_refetches() {
        let mut grid = GridController::default();
        let t = grid.flip_sort_direction().unwrap();
        assert_eq!(t.query.sort_direction, SortDirection::Asc);
    }

    #[test]
    fn showing_info() {
        let grid = loaded(&["r1"], 97);
        assert_eq!(grid.showing(), (1, 12, 97));
        assert_eq!(grid.page_state().total_pages(), 9);
    }
}
