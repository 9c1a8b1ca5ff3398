//! The currently loaded page of runs and the list-endpoint response parser.

use crate::app::Run;
use crate::error::FetchError;
use serde::Deserialize;

/// Body of a successful list request.
#[derive(Debug, Clone, Deserialize)]
pub struct RunPage {
    pub data: Vec<Run>,
    pub total: usize,
    /// Ids the server reports as permanently deleted. Optional extension.
    #[serde(default, deserialize_with = "crate::app::de_ids")]
    pub removed: Vec<String>,
}

pub fn parse_page(json: &str) -> Result<RunPage, FetchError> {
    let page: RunPage = serde_json::from_str(json)?;
    Ok(page)
}

#[derive(Debug, Clone, Default)]
pub struct RunCollection {
    runs: Vec<Run>,
}

impl RunCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, runs: Vec<Run>) {
        self.runs = runs;
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Run> {
        self.runs.iter_mut()
    }

    pub fn get(&self, id: &str) -> Option<&Run> {
        self.runs.iter().find(|r| r.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Run> {
        self.runs.iter_mut().find(|r| r.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.runs.iter().map(|r| r.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}
