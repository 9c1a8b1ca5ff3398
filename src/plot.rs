//! Metrics-plot request built from the current selection.
//!
//! Drawing is left to the server's figure; the client only reports what came
//! back (trace names and point counts).

use crate::error::FetchError;
use crate::selection::Selected;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotRequest {
    pub runs: Vec<String>,
    /// One chart per metric instead of a single combined chart.
    pub multi: bool,
    pub since: Option<String>,
    pub end: Option<String>,
}

impl PlotRequest {
    /// `None` when nothing is selected.
    pub fn for_selection(
        selected: &[Selected],
        multi: bool,
        since: Option<&str>,
        end: Option<&str>,
    ) -> Option<Self> {
        if selected.is_empty() {
            return None;
        }
        Some(Self {
            runs: selected.iter().map(|s| s.id().to_string()).collect(),
            multi,
            since: since.map(str::to_string),
            end: end.map(str::to_string),
        })
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("multicharts".to_string(), if self.multi { "1" } else { "0" }.to_string()),
            ("runs".to_string(), self.runs.join(",")),
        ];
        if let Some(since) = &self.since {
            pairs.push(("since".to_string(), since.clone()));
        }
        if let Some(end) = &self.end {
            pairs.push(("end".to_string(), end.clone()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceSummary {
    pub name: String,
    pub points: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlotSummary {
    pub traces: Vec<TraceSummary>,
}

#[derive(Deserialize)]
struct RawTrace {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    x: Vec<serde_json::Value>,
    #[serde(default)]
    y: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFigure {
    Figure { data: Vec<RawTrace> },
    Traces(Vec<RawTrace>),
}

pub fn parse_plot(json: &str) -> Result<PlotSummary, FetchError> {
    let traces = match serde_json::from_str::<RawFigure>(json)? {
        RawFigure::Figure { data } | RawFigure::Traces(data) => data,
    };
    Ok(PlotSummary {
        traces: traces
            .into_iter()
            .enumerate()
            .map(|(i, t)| TraceSummary {
                name: t.name.unwrap_or_else(|| format!("trace {}", i + 1)),
                points: t.x.len().max(t.y.len()),
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_selection_builds_nothing() {
        assert!(PlotRequest::for_selection(&[], false, None, None).is_none());
    }

    #[test]
    fn pairs_include_date_range() {
        let selected = vec![
            Selected::Placeholder { id: "r1".to_string() },
            Selected::Placeholder { id: "r4".to_string() },
        ];
        let req = PlotRequest::for_selection(&selected, true, Some("2024-01-01"), None).unwrap();
        assert_eq!(
            req.to_pairs(),
            vec![
                ("multicharts".to_string(), "1".to_string()),
                ("runs".to_string(), "r1,r4".to_string()),
                ("since".to_string(), "2024-01-01".to_string()),
            ]
        );
    }

    #[test]
    fn parses_figure_object() {
        let summary = parse_plot(
            r#"{"data":[{"name":"acc","x":[1,2,3],"y":[0.1,0.2,0.3]},{"y":[1]}],"layout":{}}"#,
        )
        .unwrap();
        assert_eq!(
            summary.traces,
            vec![
                TraceSummary { name: "acc".to_string(), points: 3 },
                TraceSummary { name: "trace 2".to_string(), points: 1 },
            ]
        );
    }

    #[test]
    fn parses_bare_trace_array() {
        let summary = parse_plot(r#"[{"name":"loss","x":[],"y":[]}]"#).unwrap();
        assert_eq!(summary.traces.len(), 1);
        assert_eq!(summary.traces[0].points, 0);
    }

    #[test]
    fn rejects_non_figure() {
        assert!(parse_plot(r#""nope""#).is_err());
    }
}
