use crate::app::{ActiveOverlay, AppState, InputMode};
use crate::page::FILTER_SEARCH;
use crate::tui::{detail_overlay, footer, grid, header, pagination};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

pub fn render(f: &mut Frame, state: &AppState) {
    let show_search = state.input_mode == InputMode::Search
        || state.grid.page_state().filter(FILTER_SEARCH).is_some();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),                          // header
            Constraint::Length(u16::from(show_search)),     // search box
            Constraint::Min(1),                             // cards
            Constraint::Length(1),                          // pagination
            Constraint::Length(2),                          // footer
        ])
        .split(f.area());

    header::render(f, chunks[0], state);
    if show_search {
        header::render_search(f, chunks[1], state);
    }
    grid::render(f, chunks[2], state);
    pagination::render(f, chunks[3], state);
    footer::render(f, chunks[4], state);

    if let Some(err) = state.error_message() {
        let area = f.area();
        if area.height > 6 && area.width >= 4 {
            let err_area = Rect {
                x: area.x + 1,
                y: area.y + area.height.saturating_sub(6),
                width: area.width.saturating_sub(2),
                height: 3,
            };
            let err_widget = Paragraph::new(err.to_owned())
                .style(Style::default().fg(Color::Red))
                .block(
                    Block::default()
                        .title(" Error (Esc to dismiss) ")
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Red)),
                )
                .wrap(Wrap { trim: true });
            f.render_widget(ratatui::widgets::Clear, err_area);
            f.render_widget(err_widget, err_area);
        }
    }

    // Overlay (drawn on top of everything)
    match &state.overlay {
        ActiveOverlay::Detail(overlay) => detail_overlay::render(f, overlay),
        ActiveOverlay::None => {}
    }
}
