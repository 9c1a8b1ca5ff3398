use crate::app::{AppState, InputMode};
use crate::page::{FILTER_END, FILTER_SEARCH, FILTER_SINCE, FILTER_STATUS};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

const BRAILLE_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub fn spinner_frame(idx: usize) -> char {
    BRAILLE_FRAMES[idx % BRAILLE_FRAMES.len()]
}

/// Short `key:value` summary of the active filters, in a fixed order.
pub fn filter_summary(state: &AppState) -> String {
    let page = state.grid.page_state();
    let mut parts = Vec::new();
    if let Some(status) = page.filter(FILTER_STATUS) {
        parts.push(format!("status:{status}"));
    }
    if let Some(search) = page.filter(FILTER_SEARCH) {
        parts.push(format!("search:\"{search}\""));
    }
    match (page.filter(FILTER_SINCE), page.filter(FILTER_END)) {
        (Some(since), Some(end)) => parts.push(format!("{since}..{end}")),
        (Some(since), None) => parts.push(format!("since {since}")),
        (None, Some(end)) => parts.push(format!("until {end}")),
        (None, None) => {}
    }
    parts.join(" ")
}

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let page = state.grid.page_state();
    let mut spans = vec![
        Span::styled(
            format!(" {} ", state.config.version_string),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("│ "),
        Span::styled(
            state.config.endpoint.as_str(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            format!("[{} {}]", page.sort_column(), page.sort_direction()),
            Style::default().fg(Color::Yellow),
        ),
    ];

    let filters = filter_summary(state);
    if !filters.is_empty() {
        spans.push(Span::styled(
            format!(" {filters}"),
            Style::default().fg(Color::Magenta),
        ));
    }

    let selected = state.grid.selection().len();
    if selected > 0 {
        spans.push(Span::styled(
            format!(" ✔ {selected} selected"),
            Style::default().fg(Color::Green),
        ));
    }

    if state.is_loading() {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            spinner_frame(state.spinner_frame).to_string(),
            Style::default().fg(Color::Yellow),
        ));
    }

    if state.error_message().is_some() {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            "!",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray)),
    );

    f.render_widget(header, area);
}

/// One-line search box, shown while typing or when a search is active.
pub fn render_search(f: &mut Frame, area: Rect, state: &AppState) {
    let editing = state.input_mode == InputMode::Search;
    let style = if editing {
        Style::default().fg(Color::White)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let mut spans = vec![
        Span::styled(" / ", Style::default().fg(Color::Cyan)),
        Span::styled(state.search_input.as_str(), style),
    ];
    if editing {
        spans.push(Span::styled("▏", Style::default().fg(Color::Cyan)));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
