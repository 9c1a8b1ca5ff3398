use crate::collection::RunPage;
use crate::error::FetchError;
use crate::grid::{ApplyOutcome, FetchTicket, GridController, GridEvent};
use crate::input::Action;
use crate::loading::LoadingCounter;
use crate::page::{FILTER_END, FILTER_SEARCH, FILTER_SINCE, FILTER_STATUS};
use crate::plot::{PlotRequest, PlotSummary};
use crate::selection::Selected;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

// UI constants
pub const NOTIFICATION_TTL_SECS: u64 = 5;
pub const ERROR_TTL_SECS: u64 = 10;
pub const NARROW_WIDTH_THRESHOLD: u16 = 60;
pub const SEARCH_DEBOUNCE_MS: u64 = 300;

/// Status filter values cycled with `s`; `None` means all statuses.
pub const STATUS_FILTER_CYCLE: [Option<&str>; 5] = [
    None,
    Some("completed"),
    Some("running"),
    Some("failed"),
    Some("pending"),
];

/// Page sizes stepped through with `+` / `-`.
pub const PAGE_SIZE_STEPS: [usize; 5] = [6, 12, 24, 48, 96];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum RunStatus {
    Completed,
    Running,
    Failed,
    Pending,
    /// Any status the client has no special handling for, kept verbatim.
    Other(String),
}

impl Default for RunStatus {
    fn default() -> Self {
        RunStatus::Other("unknown".to_string())
    }
}

impl From<String> for RunStatus {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "completed" => RunStatus::Completed,
            "running" => RunStatus::Running,
            "failed" => RunStatus::Failed,
            "pending" => RunStatus::Pending,
            _ => RunStatus::Other(s),
        }
    }
}

impl RunStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Completed => "completed",
            RunStatus::Running => "running",
            RunStatus::Failed => "failed",
            RunStatus::Pending => "pending",
            RunStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
    Missing,
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Number(n) => write!(f, "{n}"),
            MetricValue::Text(s) => f.write_str(s),
            MetricValue::Missing => f.write_str("—"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Run {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: RunStatus,
    #[serde(default, deserialize_with = "de_date")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metrics: BTreeMap<String, MetricValue>,
    /// Local UI state; mirrors the selection set for loaded runs.
    #[serde(skip)]
    pub selected: bool,
}

impl Run {
    pub fn title(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("Run #{}", self.id),
        }
    }

    pub fn date_label(&self) -> String {
        self.date
            .map_or_else(|| "—".to_string(), |d| d.format("%Y-%m-%d").to_string())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Run ids arrive as strings or integers; both normalize to `String`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Int(i64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Text(s) => s,
            RawId::Int(n) => n.to_string(),
        }
    }
}

fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(RawId::deserialize(deserializer)?.into_string())
}

pub(crate) fn de_ids<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let raw = Option::<Vec<RawId>>::deserialize(deserializer)?;
    Ok(raw.unwrap_or_default().into_iter().map(RawId::into_string).collect())
}

/// Accepts RFC 3339, naive `YYYY-MM-DDTHH:MM:SS[.f]` (taken as UTC) and bare dates.
pub fn parse_run_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn de_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_run_date(raw.trim())
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid run date '{raw}'"))),
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub timestamp: Instant,
}

pub struct DetailOverlay {
    pub title: String,
    pub lines: Vec<(String, String)>,
}

pub enum ActiveOverlay {
    None,
    Detail(DetailOverlay),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
}

/// Side effects the event loop has to carry out after an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Fetch(FetchTicket),
    /// Raw search text, to be debounced before it reaches the grid.
    Search(String),
    Plot(PlotRequest),
}

/// Immutable configuration set at startup.
pub struct AppConfig {
    pub endpoint: String,
    pub plot_enabled: bool,
    pub version_string: String,
}

pub struct AppState {
    pub config: AppConfig,
    pub grid: GridController,

    // Card navigation
    pub cursor: usize,
    pub columns: usize,

    // Search box
    pub input_mode: InputMode,
    pub search_input: String,

    // Transient UI
    pub notifications: Vec<Notification>,
    pub error: Option<(String, Instant)>,
    pub spinner_frame: usize,
    pub loading: LoadingCounter,
    pub overlay: ActiveOverlay,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(config: AppConfig, grid: GridController, loading: LoadingCounter) -> Self {
        let search_input = grid
            .page_state()
            .filter(FILTER_SEARCH)
            .unwrap_or_default()
            .to_string();
        Self {
            config,
            grid,
            cursor: 0,
            columns: 1,
            input_mode: InputMode::Normal,
            search_input,
            notifications: Vec::new(),
            error: None,
            spinner_frame: 0,
            loading,
            overlay: ActiveOverlay::None,
            should_quit: false,
        }
    }

    pub fn handle_action(&mut self, action: Action) -> Option<Command> {
        match action {
            Action::Quit => self.should_quit = true,
            Action::DismissError => self.clear_error(),
            Action::MoveLeft => self.move_cursor_by(-1),
            Action::MoveRight => self.move_cursor_by(1),
            Action::MoveUp => self.move_cursor_by(-(self.columns.max(1) as isize)),
            Action::MoveDown => self.move_cursor_by(self.columns.max(1) as isize),
            Action::ToggleSelect => {
                if let Some(id) = self.current_run_id().map(str::to_string) {
                    self.grid.toggle(&id);
                }
            }
            Action::SelectPage => {
                self.grid.select_all_on_page();
                let n = self.grid.runs().len();
                self.notify(format!("Selected {n} runs on this page"));
            }
            Action::ClearSelection => self.grid.clear_selection(),
            Action::NextPage => return self.grid.next_page().map(Command::Fetch),
            Action::PrevPage => return self.grid.previous_page().map(Command::Fetch),
            Action::FirstPage => return self.grid.first_page().map(Command::Fetch),
            Action::LastPage => return self.grid.last_page().map(Command::Fetch),
            Action::StartSearch => self.input_mode = InputMode::Search,
            Action::SearchInput(c) => {
                self.search_input.push(c);
                return Some(Command::Search(self.search_input.clone()));
            }
            Action::SearchBackspace => {
                self.search_input.pop();
                return Some(Command::Search(self.search_input.clone()));
            }
            Action::SubmitSearch => {
                self.input_mode = InputMode::Normal;
                let term = self.search_input.clone();
                return self.grid.set_search(&term).map(Command::Fetch);
            }
            Action::LeaveSearch => self.input_mode = InputMode::Normal,
            Action::CycleStatus => {
                let next = next_status_filter(self.grid.page_state().filter(FILTER_STATUS));
                return self.grid.set_status_filter(next).map(Command::Fetch);
            }
            Action::FlipSort => return self.grid.flip_sort_direction().map(Command::Fetch),
            Action::GrowPage => {
                let size = step_page_size(self.grid.page_state().page_size(), true);
                return self.grid.set_page_size(size).map(Command::Fetch);
            }
            Action::ShrinkPage => {
                let size = step_page_size(self.grid.page_state().page_size(), false);
                return self.grid.set_page_size(size).map(Command::Fetch);
            }
            Action::Refresh => return Some(Command::Fetch(self.grid.refresh())),
            Action::ShowSelection => self.open_selection_overlay(),
            Action::Plot => return self.plot_selected(false),
            Action::PlotMulti => return self.plot_selected(true),
            Action::CloseOverlay => self.close_overlay(),
            Action::None => {}
        }
        None
    }

    /// Debounced search text has settled.
    pub fn on_search_settled(&mut self, term: &str) -> Option<Command> {
        self.grid.set_search(term).map(Command::Fetch)
    }

    pub fn on_page_loaded(&mut self, generation: u64, result: Result<RunPage, FetchError>) -> ApplyOutcome {
        let outcome = self.grid.apply(generation, result);
        if outcome == ApplyOutcome::Applied {
            self.clamp_cursor();
        }
        self.absorb_grid_events();
        outcome
    }

    /// Re-fetch owed because the landed page moved past a shrunken result set.
    pub fn take_follow_up(&mut self) -> Option<Command> {
        self.grid.take_follow_up().map(Command::Fetch)
    }

    pub fn on_plot_loaded(&mut self, result: Result<PlotSummary, FetchError>) {
        match result {
            Ok(summary) => {
                let lines = if summary.traces.is_empty() {
                    vec![("traces".to_string(), "none returned".to_string())]
                } else {
                    summary
                        .traces
                        .iter()
                        .map(|t| (t.name.clone(), format!("{} points", t.points)))
                        .collect()
                };
                self.overlay = ActiveOverlay::Detail(DetailOverlay {
                    title: format!("Plot ({} traces)", summary.traces.len()),
                    lines,
                });
            }
            Err(e) => self.set_error(format!("Plot request failed: {e}")),
        }
    }

    /// Turns controller events into toasts and notifications.
    pub fn absorb_grid_events(&mut self) {
        for event in self.grid.take_events() {
            match event {
                GridEvent::FetchFailed { message } => self.set_error(message),
                GridEvent::SelectionPruned(ids) => {
                    self.notify(format!("{} selected runs no longer exist", ids.len()));
                }
                GridEvent::SelectionChanged(selected) => {
                    tracing::debug!(count = selected.len(), "selection changed");
                }
            }
        }
    }

    fn plot_selected(&mut self, multi: bool) -> Option<Command> {
        if !self.config.plot_enabled {
            self.set_error("No plot endpoint configured (use --plot-url)".to_string());
            return None;
        }
        let page = self.grid.page_state();
        let request = PlotRequest::for_selection(
            &self.grid.get_selected(),
            multi,
            page.filter(FILTER_SINCE),
            page.filter(FILTER_END),
        );
        match request {
            Some(req) => Some(Command::Plot(req)),
            None => {
                self.set_error("Select at least one run to plot".to_string());
                None
            }
        }
    }

    pub fn open_selection_overlay(&mut self) {
        let selected = self.grid.get_selected();
        let lines = if selected.is_empty() {
            vec![("—".to_string(), "nothing selected".to_string())]
        } else {
            selected.iter().map(selection_line).collect()
        };
        self.overlay = ActiveOverlay::Detail(DetailOverlay {
            title: format!("Selected runs ({})", selected.len()),
            lines,
        });
    }

    pub fn has_overlay(&self) -> bool {
        matches!(self.overlay, ActiveOverlay::Detail(_))
    }

    pub fn close_overlay(&mut self) {
        self.overlay = ActiveOverlay::None;
    }

    pub fn current_run_id(&self) -> Option<&str> {
        self.grid.runs().get(self.cursor).map(|r| r.id.as_str())
    }

    fn move_cursor_by(&mut self, delta: isize) {
        let len = self.grid.runs().len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let target = self.cursor as isize + delta;
        if (0..len as isize).contains(&target) {
            self.cursor = target as usize;
        }
    }

    fn clamp_cursor(&mut self) {
        let len = self.grid.runs().len();
        if self.cursor >= len {
            self.cursor = len.saturating_sub(1);
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    pub fn advance_spinner(&mut self) {
        self.spinner_frame = self.spinner_frame.wrapping_add(1);
    }

    pub fn notify(&mut self, message: String) {
        self.notifications.push(Notification {
            message,
            timestamp: Instant::now(),
        });
    }

    pub fn prune_notifications(&mut self) {
        self.notifications
            .retain(|n| n.timestamp.elapsed().as_secs() < NOTIFICATION_TTL_SECS);
    }

    pub fn set_error(&mut self, msg: String) {
        self.error = Some((msg, Instant::now()));
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn prune_error(&mut self) {
        if let Some((_, t)) = &self.error {
            if t.elapsed().as_secs() >= ERROR_TTL_SECS {
                self.error = None;
            }
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|(msg, _)| msg.as_str())
    }
}

fn selection_line(selected: &Selected) -> (String, String) {
    match selected {
        Selected::Loaded(run) => {
            let metrics = run
                .metrics
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(" ");
            let detail = if metrics.is_empty() {
                run.status.to_string()
            } else {
                format!("{} · {metrics}", run.status)
            };
            (run.id.clone(), detail)
        }
        Selected::Placeholder { id } => (id.clone(), "(on another page)".to_string()),
    }
}

pub fn next_status_filter(current: Option<&str>) -> Option<&'static str> {
    let idx = STATUS_FILTER_CYCLE
        .iter()
        .position(|s| *s == current)
        .unwrap_or(0);
    STATUS_FILTER_CYCLE[(idx + 1) % STATUS_FILTER_CYCLE.len()]
}

pub fn step_page_size(current: usize, grow: bool) -> usize {
    if grow {
        PAGE_SIZE_STEPS
            .iter()
            .copied()
            .find(|&s| s > current)
            .unwrap_or(current)
    } else {
        PAGE_SIZE_STEPS
            .iter()
            .rev()
            .copied()
            .find(|&s| s < current)
            .unwrap_or(current)
    }
}
