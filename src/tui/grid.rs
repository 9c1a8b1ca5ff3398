use crate::app::AppState;
use crate::card::CardView;
use crate::tui::card;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

pub const CARD_WIDTH: u16 = 30;
pub const CARD_HEIGHT: u16 = 5;

/// Cards per row for a grid area `width` columns wide.
pub fn columns_for(width: u16) -> usize {
    usize::from((width / CARD_WIDTH).max(1))
}

/// First row to draw so the row holding `cursor` stays visible.
pub fn scroll_rows(cursor: usize, columns: usize, visible_rows: usize) -> usize {
    let row = cursor / columns.max(1);
    let visible = visible_rows.max(1);
    if row >= visible {
        row + 1 - visible
    } else {
        0
    }
}

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let runs = state.grid.runs();
    if runs.is_empty() {
        let msg = if state.is_loading() {
            "Loading runs…"
        } else if state.grid.page_state().is_unfiltered() {
            "No runs found"
        } else {
            "No runs match the current filters"
        };
        f.render_widget(
            Paragraph::new(msg).style(Style::default().fg(Color::DarkGray)),
            area,
        );
        return;
    }

    let columns = columns_for(area.width);
    let card_width = area.width / columns as u16;
    let visible_rows = usize::from((area.height / CARD_HEIGHT).max(1));
    let first_row = scroll_rows(state.cursor, columns, visible_rows);

    for (i, run) in runs.iter().enumerate().skip(first_row * columns) {
        let row = i / columns - first_row;
        if row >= visible_rows {
            break;
        }
        let col = i % columns;
        let y = area.y + row as u16 * CARD_HEIGHT;
        let height = CARD_HEIGHT.min(area.bottom().saturating_sub(y));
        if height == 0 {
            break;
        }
        let rect = Rect::new(area.x + col as u16 * card_width, y, card_width, height);
        card::render(f, rect, &CardView::from_run(run), i == state.cursor);
    }
}
