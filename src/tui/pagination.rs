use crate::app::AppState;
use crate::page::PageLink;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

pub fn showing_text(start: usize, end: usize, total: usize) -> String {
    format!("Showing {start}-{end} of {total} runs")
}

/// Plain-text label for one link, as drawn in the bar.
pub fn link_label(link: &PageLink) -> String {
    match link {
        PageLink::Previous { .. } => "‹ Prev".to_string(),
        PageLink::Next { .. } => "Next ›".to_string(),
        PageLink::Page { number, current } => {
            if *current {
                format!("[{number}]")
            } else {
                number.to_string()
            }
        }
        PageLink::Gap => "…".to_string(),
    }
}

fn link_style(link: &PageLink) -> Style {
    match link {
        PageLink::Previous { enabled, .. } | PageLink::Next { enabled, .. } => {
            if *enabled {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::DarkGray)
            }
        }
        PageLink::Page { current: true, .. } => Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
        PageLink::Page { .. } => Style::default().fg(Color::White),
        PageLink::Gap => Style::default().fg(Color::DarkGray),
    }
}

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let (start, end, total) = state.grid.showing();
    let mut spans = vec![Span::styled(
        showing_text(start, end, total),
        Style::default().fg(Color::DarkGray),
    )];

    let links = state.grid.page_links();
    if !links.is_empty() {
        spans.push(Span::raw("   "));
        for (i, link) in links.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(link_label(link), link_style(link)));
        }
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
