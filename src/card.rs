//! Per-run card: badge colors, the display model and the checkbox toggle.
//!
//! The card never touches the selection set. Toggling flips the run's flag and
//! hands back a [`SelectionChanged`] for the controller to apply.

use crate::app::{Run, RunStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeColor {
    Success,
    Primary,
    Danger,
    Warning,
    Secondary,
}

pub fn status_badge(status: &RunStatus) -> BadgeColor {
    match status {
        RunStatus::Completed => BadgeColor::Success,
        RunStatus::Running => BadgeColor::Primary,
        RunStatus::Failed => BadgeColor::Danger,
        RunStatus::Pending => BadgeColor::Warning,
        RunStatus::Other(_) => BadgeColor::Secondary,
    }
}

/// Notification emitted when a card's checkbox flips.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionChanged {
    pub run: Run,
}

pub fn toggle(run: &mut Run) -> SelectionChanged {
    run.selected = !run.selected;
    SelectionChanged { run: run.clone() }
}

/// Everything a renderer needs to draw one card.
#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub title: String,
    pub status: String,
    pub badge: BadgeColor,
    pub date: String,
    pub tags: Vec<String>,
    pub metrics: Vec<String>,
    pub selected: bool,
}

impl CardView {
    pub fn from_run(run: &Run) -> Self {
        Self {
            title: run.title(),
            status: run.status.to_string(),
            badge: status_badge(&run.status),
            date: run.date_label(),
            tags: run.tags.clone(),
            metrics: run
                .metrics
                .iter()
                .map(|(name, value)| format!("{name}: {value}"))
                .collect(),
            selected: run.selected,
        }
    }
}
