use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    DismissError,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    ToggleSelect,
    SelectPage,
    ClearSelection,
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    StartSearch,
    SearchInput(char),
    SearchBackspace,
    SubmitSearch,
    LeaveSearch,
    CycleStatus,
    FlipSort,
    GrowPage,
    ShrinkPage,
    Refresh,
    ShowSelection,
    Plot,
    PlotMulti,
    CloseOverlay,
    None,
}

/// Captures the UI state needed to interpret a key press.
#[derive(Debug, Clone, Default)]
pub struct InputContext {
    pub has_error: bool,
    pub is_loading: bool,
    pub has_overlay: bool,
    pub searching: bool,
}

pub fn map_key(key: KeyEvent, ctx: &InputContext) -> Action {
    if key.kind != KeyEventKind::Press {
        return Action::None;
    }

    // Ctrl+C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    if ctx.has_overlay {
        return match key.code {
            KeyCode::Char('q' | 'v') | KeyCode::Esc | KeyCode::Enter => Action::CloseOverlay,
            _ => Action::None,
        };
    }

    // The search box swallows printable keys.
    if ctx.searching {
        return match key.code {
            KeyCode::Enter => Action::SubmitSearch,
            KeyCode::Esc => Action::LeaveSearch,
            KeyCode::Backspace => Action::SearchBackspace,
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                Action::SearchInput(c)
            }
            _ => Action::None,
        };
    }

    match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Esc => {
            if ctx.has_error {
                Action::DismissError
            } else {
                Action::Quit
            }
        }
        KeyCode::Up | KeyCode::Char('k') => Action::MoveUp,
        KeyCode::Down | KeyCode::Char('j') => Action::MoveDown,
        KeyCode::Left | KeyCode::Char('h') => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::MoveRight,
        KeyCode::Char(' ') => Action::ToggleSelect,
        KeyCode::Char('a') => Action::SelectPage,
        KeyCode::Char('c') => Action::ClearSelection,
        KeyCode::Char('n' | ']') | KeyCode::PageDown => Action::NextPage,
        KeyCode::Char('p' | '[') | KeyCode::PageUp => Action::PrevPage,
        KeyCode::Char('g') | KeyCode::Home => Action::FirstPage,
        KeyCode::Char('G') | KeyCode::End => Action::LastPage,
        KeyCode::Char('/') => Action::StartSearch,
        KeyCode::Char('s') => Action::CycleStatus,
        KeyCode::Char('o') => Action::FlipSort,
        KeyCode::Char('+' | '=') => Action::GrowPage,
        KeyCode::Char('-') => Action::ShrinkPage,
        KeyCode::Char('r') if !ctx.is_loading => Action::Refresh,
        KeyCode::Char('v') => Action::ShowSelection,
        KeyCode::Char('P') => Action::Plot,
        KeyCode::Char('M') => Action::PlotMulti,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn press_with(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn release(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        }
    }

    fn ctx() -> InputContext {
        InputContext::default()
    }

    fn ctx_search() -> InputContext {
        InputContext {
            searching: true,
            ..Default::default()
        }
    }

    #[test]
    fn release_events_ignored() {
        assert_eq!(map_key(release(KeyCode::Char('q')), &ctx()), Action::None);
    }

    #[test]
    fn ctrl_c_quits_everywhere() {
        let key = press_with(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(key, &ctx()), Action::Quit);
        assert_eq!(map_key(key, &ctx_search()), Action::Quit);
        let overlay = InputContext {
            has_overlay: true,
            ..Default::default()
        };
        assert_eq!(map_key(key, &overlay), Action::Quit);
    }

    #[test]
    fn esc_dismisses_error_before_quitting() {
        let with_error = InputContext {
            has_error: true,
            ..Default::default()
        };
        assert_eq!(map_key(press(KeyCode::Esc), &with_error), Action::DismissError);
        assert_eq!(map_key(press(KeyCode::Esc), &ctx()), Action::Quit);
    }

    #[test]
    fn movement_keys() {
        assert_eq!(map_key(press(KeyCode::Char('h')), &ctx()), Action::MoveLeft);
        assert_eq!(map_key(press(KeyCode::Right), &ctx()), Action::MoveRight);
        assert_eq!(map_key(press(KeyCode::Char('k')), &ctx()), Action::MoveUp);
        assert_eq!(map_key(press(KeyCode::Down), &ctx()), Action::MoveDown);
    }

    #[test]
    fn paging_keys() {
        for code in [KeyCode::Char('n'), KeyCode::Char(']'), KeyCode::PageDown] {
            assert_eq!(map_key(press(code), &ctx()), Action::NextPage);
        }
        for code in [KeyCode::Char('p'), KeyCode::Char('['), KeyCode::PageUp] {
            assert_eq!(map_key(press(code), &ctx()), Action::PrevPage);
        }
        assert_eq!(map_key(press(KeyCode::Home), &ctx()), Action::FirstPage);
        assert_eq!(map_key(press(KeyCode::Char('G')), &ctx()), Action::LastPage);
    }

    #[test]
    fn selection_keys() {
        assert_eq!(map_key(press(KeyCode::Char(' ')), &ctx()), Action::ToggleSelect);
        assert_eq!(map_key(press(KeyCode::Char('a')), &ctx()), Action::SelectPage);
        assert_eq!(map_key(press(KeyCode::Char('c')), &ctx()), Action::ClearSelection);
        assert_eq!(map_key(press(KeyCode::Char('v')), &ctx()), Action::ShowSelection);
    }

    #[test]
    fn refresh_suppressed_while_loading() {
        let loading = InputContext {
            is_loading: true,
            ..Default::default()
        };
        assert_eq!(map_key(press(KeyCode::Char('r')), &ctx()), Action::Refresh);
        assert_eq!(map_key(press(KeyCode::Char('r')), &loading), Action::None);
    }

    #[test]
    fn search_mode_captures_text() {
        assert_eq!(map_key(press(KeyCode::Char('/')), &ctx()), Action::StartSearch);
        assert_eq!(map_key(press(KeyCode::Char('q')), &ctx_search()), Action::SearchInput('q'));
        assert_eq!(map_key(press(KeyCode::Char(' ')), &ctx_search()), Action::SearchInput(' '));
        assert_eq!(map_key(press(KeyCode::Backspace), &ctx_search()), Action::SearchBackspace);
        assert_eq!(map_key(press(KeyCode::Enter), &ctx_search()), Action::SubmitSearch);
        assert_eq!(map_key(press(KeyCode::Esc), &ctx_search()), Action::LeaveSearch);
    }

    #[test]
    fn overlay_only_closes() {
        let overlay = InputContext {
            has_overlay: true,
            ..Default::default()
        };
        assert_eq!(map_key(press(KeyCode::Esc), &overlay), Action::CloseOverlay);
        assert_eq!(map_key(press(KeyCode::Char('v')), &overlay), Action::CloseOverlay);
        assert_eq!(map_key(press(KeyCode::Char('n')), &overlay), Action::None);
    }

    #[test]
    fn query_keys() {
        assert_eq!(map_key(press(KeyCode::Char('s')), &ctx()), Action::CycleStatus);
        assert_eq!(map_key(press(KeyCode::Char('o')), &ctx()), Action::FlipSort);
        assert_eq!(map_key(press(KeyCode::Char('+')), &ctx()), Action::GrowPage);
        assert_eq!(map_key(press(KeyCode::Char('-')), &ctx()), Action::ShrinkPage);
        assert_eq!(map_key(press(KeyCode::Char('P')), &ctx()), Action::Plot);
        assert_eq!(map_key(press(KeyCode::Char('M')), &ctx()), Action::PlotMulti);
    }
}
