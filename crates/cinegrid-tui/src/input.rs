use cinegrid_core::SortMode;
use ratatui::crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};

use crate::action::Action;

/// Map a crossterm terminal event to a TUI action.
pub fn map_event(event: &Event) -> Action {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            // Ctrl+C always quits
            if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                return Action::Quit;
            }
            map_key(key)
        }
        Event::Mouse(mouse) => map_mouse(mouse),
        Event::Resize(w, h) => Action::Resize(*w, *h),
        _ => Action::None,
    }
}

fn map_mouse(mouse: &MouseEvent) -> Action {
    match mouse.kind {
        MouseEventKind::ScrollDown => Action::MoveDown,
        MouseEventKind::ScrollUp => Action::MoveUp,
        _ => Action::None,
    }
}

fn map_key(key: &KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('j') | KeyCode::Down => Action::MoveDown,
        KeyCode::Char('k') | KeyCode::Up => Action::MoveUp,
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::PageDown,
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::PageUp,
        KeyCode::PageDown => Action::PageDown,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::Char('g') | KeyCode::Home => Action::GoTop,
        KeyCode::Char('G') | KeyCode::End => Action::GoBottom,
        KeyCode::Enter => Action::Select,
        KeyCode::Esc | KeyCode::Backspace => Action::NavigateBack,
        KeyCode::Char('s') => Action::CycleSort,
        KeyCode::Char('1') => Action::ChooseSort(SortMode::Popularity),
        KeyCode::Char('2') => Action::ChooseSort(SortMode::Rating),
        KeyCode::Char('3') => Action::ChooseSort(SortMode::Favorites),
        KeyCode::Char('f') | KeyCode::Char(' ') => Action::ToggleFavorite,
        KeyCode::Char('n') => Action::LoadMore,
        KeyCode::Char('r') => Action::Reload,
        KeyCode::Char('?') => Action::ToggleHelp,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn number_keys_choose_sort_mode() {
        assert_eq!(
            map_event(&press(KeyCode::Char('3'))),
            Action::ChooseSort(SortMode::Favorites)
        );
        assert_eq!(map_event(&press(KeyCode::Char('s'))), Action::CycleSort);
    }

    #[test]
    fn ctrl_c_quits() {
        let ev = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(map_event(&ev), Action::Quit);
    }

    #[test]
    fn resize_is_forwarded() {
        assert_eq!(map_event(&Event::Resize(140, 40)), Action::Resize(140, 40));
    }
}
