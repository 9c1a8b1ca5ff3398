use crate::card::{BadgeColor, CardView};
use crate::tui::truncate;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

pub fn badge_color(badge: BadgeColor) -> Color {
    match badge {
        BadgeColor::Success => Color::Green,
        BadgeColor::Primary => Color::Blue,
        BadgeColor::Danger => Color::Red,
        BadgeColor::Warning => Color::Yellow,
        BadgeColor::Secondary => Color::Gray,
    }
}

pub fn checkbox(selected: bool) -> &'static str {
    if selected {
        "[x]"
    } else {
        "[ ]"
    }
}

pub fn render(f: &mut Frame, area: Rect, view: &CardView, focused: bool) {
    let inner_width = area.width.saturating_sub(2) as usize;

    let border = if focused {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else if view.selected {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let title = format!(" {} {} ", checkbox(view.selected), view.title);
    let block = Block::default()
        .title(truncate(&title, inner_width))
        .borders(Borders::ALL)
        .border_style(border);

    let badge = Span::styled(
        format!(" {} ", view.status),
        Style::default()
            .fg(Color::Black)
            .bg(badge_color(view.badge))
            .add_modifier(Modifier::BOLD),
    );
    let status_line = Line::from(vec![
        badge,
        Span::raw(" "),
        Span::styled(view.date.clone(), Style::default().fg(Color::DarkGray)),
    ]);

    let tags = view
        .tags
        .iter()
        .map(|t| format!("#{t}"))
        .collect::<Vec<_>>()
        .join(" ");
    let tags_line = Line::from(Span::styled(
        truncate(&tags, inner_width),
        Style::default().fg(Color::Magenta),
    ));

    let metrics_line = Line::from(Span::styled(
        truncate(&view.metrics.join("  "), inner_width),
        Style::default().fg(Color::White),
    ));

    let paragraph = Paragraph::new(vec![status_line, tags_line, metrics_line]).block(block);
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn badge_colors_distinct() {
        let all = [
            BadgeColor::Success,
            BadgeColor::Primary,
            BadgeColor::Danger,
            BadgeColor::Warning,
            BadgeColor::Secondary,
        ];
        let colors: std::collections::HashSet<_> = all.iter().map(|b| badge_color(*b)).collect();
        assert_eq!(colors.len(), all.len());
    }

    #[test]
    fn checkbox_glyphs() {
        assert_eq!(checkbox(true), "[x]");
        assert_eq!(checkbox(false), "[ ]");
    }
}
