use crate::app::DetailOverlay;
use crate::tui::truncate;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

/// Centered key/value list used for the selection overview and plot summaries.
pub fn render(f: &mut Frame, overlay: &DetailOverlay) {
    let area = f.area();

    // +2 border +1 bottom hint; cap before casting to u16
    let content_height = (overlay.lines.len().min(u16::MAX as usize - 3) as u16).saturating_add(3);
    let width = (area.width * 6 / 10).max(30).min(area.width);
    let height = content_height.max(5).min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    f.render_widget(Clear, overlay_area);

    let block = Block::default()
        .title(format!(" {} ", overlay.title))
        .title_bottom(Line::from(" q/Esc close ").centered())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .style(Style::default().bg(Color::Black));

    let inner_width = width.saturating_sub(2) as usize;
    let label_width = overlay
        .lines
        .iter()
        .map(|(l, _)| UnicodeWidthStr::width(l.as_str()))
        .max()
        .unwrap_or(0)
        .min(inner_width / 2);
    let value_max = inner_width.saturating_sub(label_width + 2);

    let lines: Vec<Line> = overlay
        .lines
        .iter()
        .map(|(label, value)| {
            let label = truncate(label, label_width);
            Line::from(vec![
                Span::styled(
                    format!("{label:>label_width$}  "),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
                Span::styled(truncate(value, value_max), Style::default().fg(Color::White)),
            ])
        })
        .collect();

    f.render_widget(Paragraph::new(lines).block(block), overlay_area);
}
