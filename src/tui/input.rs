//! Terminal event translation: quit keys and resizes become lifecycle
//! signals on the shared bus.

use std::thread;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use flume::Sender;

use crate::signal::{LifecycleSignal, TerminateReason};

/// Translate one terminal event into a lifecycle signal, if it carries one.
pub fn map_event(event: &Event) -> Option<LifecycleSignal> {
    match event {
        Event::Resize(..) => Some(LifecycleSignal::Relayout),
        Event::Key(key) => {
            // Only act on the initial press so one keystroke maps to one
            // signal.
            if key.kind != KeyEventKind::Press {
                return None;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                    Some(LifecycleSignal::Terminate(TerminateReason::Quit))
                }
                // Raw mode swallows SIGINT; Ctrl-C arrives as a key event.
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    Some(LifecycleSignal::Terminate(TerminateReason::Quit))
                }
                _ => None,
            }
        }
        _ => None,
    }
}

/// Forward terminal events to the signal bus from a detached thread. The
/// thread ends when the receiving side is gone.
pub fn spawn_input_pump(tx: Sender<LifecycleSignal>) {
    thread::spawn(move || loop {
        let event = match event::read() {
            Ok(event) => event,
            Err(err) => {
                log::error!("input read error: {err}");
                break;
            }
        };
        if let Some(signal) = map_event(&event) {
            if tx.send(signal).is_err() {
                break;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyEventState};

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn quit_keys_terminate() {
        for event in [
            press(KeyCode::Char('q'), KeyModifiers::NONE),
            press(KeyCode::Char('Q'), KeyModifiers::NONE),
            press(KeyCode::Esc, KeyModifiers::NONE),
            press(KeyCode::Char('c'), KeyModifiers::CONTROL),
        ] {
            assert_eq!(
                map_event(&event),
                Some(LifecycleSignal::Terminate(TerminateReason::Quit))
            );
        }
    }

    #[test]
    fn resize_requests_relayout() {
        assert_eq!(
            map_event(&Event::Resize(80, 24)),
            Some(LifecycleSignal::Relayout)
        );
    }

    #[test]
    fn key_release_is_ignored() {
        let event = Event::Key(KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        });
        assert_eq!(map_event(&event), None);
    }

    #[test]
    fn ordinary_keys_are_ignored() {
        assert_eq!(map_event(&press(KeyCode::Char('x'), KeyModifiers::NONE)), None);
        assert_eq!(map_event(&press(KeyCode::Enter, KeyModifiers::NONE)), None);
    }
}
