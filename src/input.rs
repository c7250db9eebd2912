//! Keyboard input handling.
//!
//! Maps terminal key events to [`App`] actions.  What a key does depends on
//! the current [`Mode`]: the URL box swallows printable characters, the
//! status picker owns the arrow keys, and so on.
//!
//! ## For contributors
//!
//! To add a new keybinding:
//!
//! 1. Add a method on [`App`] for the action (if one doesn't exist).  If it
//!    needs IO, have it return [`Effect`]s rather than doing the work.
//! 2. Add a `KeyCode` match arm in the handler for the right mode.
//! 3. Update the help text in [`crate::ui`]'s status bar.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{App, Mode};
use crate::effect::Effect;

/// Process a single key event, updating app state accordingly.
///
/// Only reacts to key-press events (ignoring release / repeat) so that each
/// physical keypress triggers exactly one action.  Returns the effects the
/// key asked for.
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Vec<Effect> {
    if key.kind != KeyEventKind::Press {
        return Vec::new();
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.quit = true;
        return Vec::new();
    }

    match app.mode {
        Mode::Browse => browse(app, key.code),
        Mode::AddUrl { .. } => add_url(app, key.code),
        Mode::Detail { .. } => match key.code {
            KeyCode::Char('o') => app.open_listing_url(),
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('i') => {
                app.close_overlay();
                Vec::new()
            }
            _ => Vec::new(),
        },
        Mode::PickStatus { .. } => match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                app.move_picker(-1);
                Vec::new()
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.move_picker(1);
                Vec::new()
            }
            KeyCode::Enter => app.confirm_status(),
            KeyCode::Esc | KeyCode::Char('q') => {
                app.close_overlay();
                Vec::new()
            }
            _ => Vec::new(),
        },
        Mode::ConfirmDelete { .. } => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.close_overlay();
                Vec::new()
            }
            _ => Vec::new(),
        },
    }
}

fn browse(app: &mut App, code: KeyCode) -> Vec<Effect> {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::Home | KeyCode::Char('g') => app.select_first(),
        KeyCode::End | KeyCode::Char('G') => app.select_last(),
        KeyCode::Char('a') => app.open_add_url(),
        KeyCode::Enter | KeyCode::Char('i') => app.open_detail(),
        KeyCode::Char('s') => app.open_status_picker(),
        KeyCode::Char('d') => app.open_delete_confirm(),
        KeyCode::Char('r') => return app.refresh(),
        KeyCode::Char('o') => return app.open_listing_url(),
        _ => {}
    }
    Vec::new()
}

fn add_url(app: &mut App, code: KeyCode) -> Vec<Effect> {
    match code {
        KeyCode::Enter => return app.confirm_add_url(),
        KeyCode::Esc => app.close_overlay(),
        KeyCode::Backspace => {
            if let Mode::AddUrl { input } = &mut app.mode {
                input.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Mode::AddUrl { input } = &mut app.mode {
                input.push(c);
            }
        }
        _ => {}
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::listing;
    use crate::msg::Msg;
    use crossterm::event::KeyEventState;

    fn press(app: &mut App, code: KeyCode) -> Vec<Effect> {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn loaded_app() -> App {
        let mut civic = listing("1", "Civic");
        civic.url = "https://marketplace.example/item/1".into();
        let mut app = App::new();
        app.apply(Msg::Listings {
            seq: 1,
            listings: vec![civic, listing("2", "F-150")],
        });
        app
    }

    #[test]
    fn ignores_key_release() {
        let mut app = App::new();
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        handle_key_event(&mut app, release);
        assert!(!app.quit);
    }

    #[test]
    fn q_quits_from_browse() {
        let mut app = App::new();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.quit);
    }

    #[test]
    fn ctrl_c_quits_from_any_mode() {
        let mut app = App::new();
        app.open_add_url();
        handle_key_event(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(app.quit);
    }

    #[test]
    fn typing_in_url_box_does_not_trigger_shortcuts() {
        let mut app = App::new();
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "https://q.example/dr");
        press(&mut app, KeyCode::Backspace);

        assert!(!app.quit);
        assert_eq!(
            app.mode,
            Mode::AddUrl {
                input: "https://q.example/d".into()
            }
        );

        let effects = press(&mut app, KeyCode::Enter);
        assert_eq!(
            effects,
            vec![Effect::CreateListing {
                provisional_id: "local-1".into(),
                url: "https://q.example/d".into(),
            }]
        );
        assert_eq!(app.mode, Mode::Browse);
    }

    #[test]
    fn esc_cancels_url_box() {
        let mut app = App::new();
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "https://x");
        assert!(press(&mut app, KeyCode::Esc).is_empty());
        assert_eq!(app.mode, Mode::Browse);
        assert!(app.store.is_empty());
    }

    #[test]
    fn r_requests_refresh() {
        let mut app = App::new();
        assert_eq!(press(&mut app, KeyCode::Char('r')), vec![Effect::Refresh]);
    }

    #[test]
    fn status_picker_keys() {
        let mut app = loaded_app();
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);

        let effects = press(&mut app, KeyCode::Enter);
        assert_eq!(effects.len(), 1);
        assert!(matches!(
            &effects[0],
            Effect::UpdateStatus { id, status } if id == "1" && status.as_str() == "viewed"
        ));
    }

    #[test]
    fn delete_needs_confirmation() {
        let mut app = loaded_app();
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('d'));
        assert!(press(&mut app, KeyCode::Char('n')).is_empty());
        assert_eq!(app.mode, Mode::Browse);

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(
            press(&mut app, KeyCode::Char('y')),
            vec![Effect::DeleteListing { id: "1".into() }]
        );
    }

    #[test]
    fn enter_opens_and_closes_detail() {
        let mut app = loaded_app();
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Detail { id: "1".into() });
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, Mode::Browse);
        assert!(!app.quit, "esc in a modal closes it instead of quitting");
    }

    #[test]
    fn o_opens_listing_url_from_browse_and_detail() {
        let mut app = loaded_app();
        press(&mut app, KeyCode::Char('j'));
        let open = vec![Effect::OpenUrl {
            url: "https://marketplace.example/item/1".into(),
        }];

        assert_eq!(press(&mut app, KeyCode::Char('o')), open);

        press(&mut app, KeyCode::Enter);
        assert_eq!(press(&mut app, KeyCode::Char('o')), open);
        assert_eq!(app.mode, Mode::Detail { id: "1".into() });
    }

    #[test]
    fn o_in_url_box_is_just_text() {
        let mut app = loaded_app();
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('a'));
        assert!(press(&mut app, KeyCode::Char('o')).is_empty());
        assert_eq!(app.mode, Mode::AddUrl { input: "o".into() });
    }
}
