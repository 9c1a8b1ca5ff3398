//! Cross-page selection.
//!
//! Only identifiers are stored, so a selection survives the run scrolling off
//! the loaded page. Ids are kept sorted to give consumers a stable order.

use crate::app::Run;
use std::collections::BTreeSet;

/// One entry of [`SelectionTracker::get_selected`].
#[derive(Debug, Clone, PartialEq)]
pub enum Selected {
    /// The run is on the loaded page; full record available.
    Loaded(Run),
    /// The run lives on a page that is not loaded; only the id is known.
    Placeholder { id: String },
}

impl Selected {
    pub fn id(&self) -> &str {
        match self {
            Selected::Loaded(run) => &run.id,
            Selected::Placeholder { id } => id,
        }
    }

    pub fn run(&self) -> Option<&Run> {
        match self {
            Selected::Loaded(run) => Some(run),
            Selected::Placeholder { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    ids: BTreeSet<String>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: &str) -> bool {
        self.ids.insert(id.to_string())
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.ids.remove(id)
    }

    pub fn has(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Adds every id in `ids`; returns how many were newly selected.
    pub fn select_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) -> usize {
        ids.into_iter().filter(|id| self.add(id)).count()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Full records for selected runs on `loaded`, placeholders for the rest.
    pub fn get_selected(&self, loaded: &[Run]) -> Vec<Selected> {
        self.ids
            .iter()
            .map(|id| match loaded.iter().find(|r| &r.id == id) {
                Some(run) => {
                    let mut run = run.clone();
                    run.selected = true;
                    Selected::Loaded(run)
                }
                None => Selected::Placeholder { id: id.clone() },
            })
            .collect()
    }

    /// Drops ids known to be gone from the source. Returns the ids removed.
    pub fn forget<'a>(&mut self, gone: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        gone.into_iter()
            .filter(|id| self.ids.remove(*id))
            .map(str::to_string)
            .collect()
    }

    /// Keeps only ids present in `existing`, used when a response is known to
    /// list the complete data set. Returns the ids removed.
    pub fn retain_existing(&mut self, existing: &[Run]) -> Vec<String> {
        let gone: Vec<String> = self
            .ids
            .iter()
            .filter(|id| !existing.iter().any(|r| &r.id == *id))
            .cloned()
            .collect();
        for id in &gone {
            self.ids.remove(id);
        }
        gone
    }
}
