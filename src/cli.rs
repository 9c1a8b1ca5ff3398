use crate::grid::GridConfig;
use crate::page::{
    SortDirection, FILTER_END, FILTER_SEARCH, FILTER_SINCE, FILTER_STATUS, MAX_PAGE_SIZE,
};
use crate::source::validate_endpoint;
use clap::Parser;
use reqwest::Url;
use std::collections::BTreeMap;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/api/runs";

#[derive(Parser, Debug)]
#[command(name = "runboard", version, about = "Browse and select experiment runs in the terminal")]
pub struct Cli {
    /// Runs list endpoint
    #[arg(short, long, default_value = DEFAULT_ENDPOINT, value_parser = validate_endpoint)]
    pub url: Url,

    /// Metrics plot endpoint (plotting is disabled without it)
    #[arg(long, value_parser = validate_endpoint)]
    pub plot_url: Option<Url>,

    /// Runs per page (at most 1000)
    #[arg(short = 'n', long, default_value_t = 12, value_parser = clap::value_parser!(u64).range(1..=MAX_PAGE_SIZE as u64))]
    pub page_size: u64,

    /// Column to sort by
    #[arg(long, default_value = crate::page::DEFAULT_SORT_COLUMN)]
    pub sort_column: String,

    #[arg(long, value_enum, default_value_t = SortDirection::Desc)]
    pub sort_direction: SortDirection,

    /// Only show runs with this status
    #[arg(short, long)]
    pub status: Option<String>,

    /// Initial search term
    #[arg(long)]
    pub search: Option<String>,

    /// Only runs on or after this date (YYYY-MM-DD)
    #[arg(long, value_parser = validate_date)]
    pub since: Option<String>,

    /// Only runs on or before this date (YYYY-MM-DD)
    #[arg(long, value_parser = validate_date)]
    pub end: Option<String>,

    /// Request timeout in seconds
    #[arg(short, long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Enable verbose logging to $XDG_STATE_HOME/runboard/debug.log
    #[arg(long)]
    pub verbose: bool,
}

impl Cli {
    pub fn grid_config(&self) -> GridConfig {
        let mut filters = BTreeMap::new();
        for (key, value) in [
            (FILTER_SEARCH, &self.search),
            (FILTER_STATUS, &self.status),
            (FILTER_SINCE, &self.since),
            (FILTER_END, &self.end),
        ] {
            if let Some(v) = value {
                filters.insert(key.to_string(), v.clone());
            }
        }
        GridConfig {
            page_size: usize::try_from(self.page_size).unwrap_or(MAX_PAGE_SIZE),
            sort_column: self.sort_column.clone(),
            sort_direction: self.sort_direction,
            filters,
        }
    }
}

/// Accepts `YYYY-MM-DD` only; the server receives the value unchanged.
pub fn validate_date(raw: &str) -> Result<String, String> {
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|_| raw.to_string())
        .map_err(|_| format!("Invalid date '{raw}'. Expected YYYY-MM-DD."))
}
