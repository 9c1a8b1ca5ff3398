use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::{AppState, InputMode};

pub fn hints(state: &AppState, narrow: bool) -> &'static [(&'static str, &'static str)] {
    if state.has_overlay() {
        &[("q/Esc", "close")]
    } else if state.input_mode == InputMode::Search {
        &[("type", "search"), ("Enter", "apply"), ("Esc", "leave")]
    } else if narrow {
        &[
            ("spc", "sel"),
            ("n/p", "page"),
            ("/", "find"),
            ("v", "view"),
            ("q", "quit"),
        ]
    } else {
        &[
            ("←↓↑→", "move"),
            ("space", "select"),
            ("a/c", "page/clear"),
            ("n/p", "page"),
            ("/", "search"),
            ("s", "status"),
            ("o", "sort"),
            ("+/-", "size"),
            ("v", "selected"),
            ("P/M", "plot"),
            ("q", "quit"),
        ]
    }
}

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let narrow = area.width < crate::app::NARROW_WIDTH_THRESHOLD;

    let line = if let Some(notif) = state.notifications.last() {
        Line::from(vec![
            Span::styled("★ ", Style::default().fg(Color::Yellow)),
            Span::styled(&notif.message, Style::default().fg(Color::Yellow)),
        ])
    } else {
        let mut spans: Vec<Span> = Vec::new();
        for (i, (key, desc)) in hints(state, narrow).iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(*key, Style::default().fg(Color::Cyan)));
            spans.push(Span::styled(
                format!(" {desc}"),
                Style::default().fg(Color::DarkGray),
            ));
        }
        Line::from(spans)
    };

    let footer = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(footer, area);
}
