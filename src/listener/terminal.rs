// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use std::io;
use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MediaKeyCode, ModifierKeyCode,
};
use crossterm::terminal;
use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{debug, error, info, span, Level};

use super::{forward, Flow};
use crate::cancel::CancelHandle;
use crate::keys::{NamedKey, RawKeyEvent};

/// How long a poll waits before checking for cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A driver that reads key presses from the terminal in raw mode.
///
/// Only keys typed into the terminal are seen. Ctrl+C cancels the quit handle.
pub struct Driver {
    quit: CancelHandle,
}

/// Keeps the terminal in raw mode while alive.
struct RawMode;

impl RawMode {
    fn enable() -> Result<RawMode, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(RawMode)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl Driver {
    pub fn new(quit: CancelHandle) -> Driver {
        Driver { quit }
    }

    /// Handles one terminal event.
    fn handle_event(keys_tx: &Sender<RawKeyEvent>, quit: &CancelHandle, event: Event) -> Flow {
        let Event::Key(key) = event else {
            return Flow::Continue;
        };
        if key.kind != KeyEventKind::Press {
            return Flow::Continue;
        }
        if is_interrupt(&key) {
            info!("Interrupt received");
            quit.cancel();
            return Flow::Stop;
        }
        match to_raw_event(&key) {
            Some(raw) => forward(keys_tx, raw),
            None => Flow::Continue,
        }
    }
}

fn is_interrupt(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
}

/// Converts a crossterm key event into a raw key event.
fn to_raw_event(key: &KeyEvent) -> Option<RawKeyEvent> {
    let named = match key.code {
        KeyCode::Char(' ') => NamedKey::Space,
        KeyCode::Char(c) => return Some(RawKeyEvent::Char(c)),
        KeyCode::Enter => NamedKey::Enter,
        KeyCode::Backspace => NamedKey::Backspace,
        KeyCode::Tab | KeyCode::BackTab => NamedKey::Tab,
        KeyCode::Esc => NamedKey::Escape,
        KeyCode::CapsLock => NamedKey::CapsLock,
        KeyCode::Up => NamedKey::Up,
        KeyCode::Down => NamedKey::Down,
        KeyCode::Left => NamedKey::Left,
        KeyCode::Right => NamedKey::Right,
        KeyCode::Home => NamedKey::Home,
        KeyCode::End => NamedKey::End,
        KeyCode::PageUp => NamedKey::PageUp,
        KeyCode::PageDown => NamedKey::PageDown,
        KeyCode::Insert => NamedKey::Insert,
        KeyCode::Delete => NamedKey::Delete,
        KeyCode::F(n) => NamedKey::F(n),
        KeyCode::Modifier(modifier) => match modifier {
            ModifierKeyCode::LeftShift => NamedKey::ShiftLeft,
            ModifierKeyCode::RightShift => NamedKey::ShiftRight,
            ModifierKeyCode::LeftControl => NamedKey::ControlLeft,
            ModifierKeyCode::RightControl => NamedKey::ControlRight,
            ModifierKeyCode::LeftAlt => NamedKey::AltLeft,
            ModifierKeyCode::RightAlt => NamedKey::AltRight,
            other => NamedKey::Other(format!("{:?}", other)),
        },
        KeyCode::Media(media) => match media {
            MediaKeyCode::RaiseVolume => NamedKey::MediaVolumeUp,
            MediaKeyCode::LowerVolume => NamedKey::MediaVolumeDown,
            MediaKeyCode::PlayPause => NamedKey::MediaPlayPause,
            other => NamedKey::Other(format!("{:?}", other)),
        },
        KeyCode::Null => return None,
        other => NamedKey::Other(format!("{:?}", other)),
    };
    Some(RawKeyEvent::Named(named))
}

impl super::Driver for Driver {
    fn monitor_keys(
        &self,
        keys_tx: Sender<RawKeyEvent>,
        cancel: CancelHandle,
    ) -> JoinHandle<Result<(), io::Error>> {
        let quit = self.quit.clone();
        tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "terminal driver");
            let _enter = span.enter();

            let result = Driver::run(&keys_tx, &cancel, &quit);
            if let Err(e) = &result {
                error!(err = %e, "Terminal driver failed");
            }
            // Stopping the driver ends the session.
            quit.cancel();
            result
        })
    }
}

impl Driver {
    fn run(
        keys_tx: &Sender<RawKeyEvent>,
        cancel: &CancelHandle,
        quit: &CancelHandle,
    ) -> Result<(), io::Error> {
        let _raw_mode = RawMode::enable()?;
        info!("Terminal driver started.");

        while !cancel.is_cancelled() {
            if !event::poll(POLL_INTERVAL)? {
                continue;
            }
            if Driver::handle_event(keys_tx, quit, event::read()?) == Flow::Stop {
                break;
            }
        }

        debug!("Terminal driver stopped.");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crossterm::event::KeyEventState;
    use tokio::sync::mpsc;

    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    fn convert(code: KeyCode) -> Option<RawKeyEvent> {
        to_raw_event(&KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_to_raw_event() {
        assert_eq!(convert(KeyCode::Char('a')), Some(RawKeyEvent::Char('a')));
        assert_eq!(convert(KeyCode::Char('Q')), Some(RawKeyEvent::Char('Q')));
        assert_eq!(
            convert(KeyCode::Char(' ')),
            Some(RawKeyEvent::Named(NamedKey::Space))
        );
        assert_eq!(
            convert(KeyCode::Enter),
            Some(RawKeyEvent::Named(NamedKey::Enter))
        );
        assert_eq!(
            convert(KeyCode::BackTab),
            Some(RawKeyEvent::Named(NamedKey::Tab))
        );
        assert_eq!(
            convert(KeyCode::F(5)),
            Some(RawKeyEvent::Named(NamedKey::F(5)))
        );
        assert_eq!(
            convert(KeyCode::Modifier(ModifierKeyCode::RightAlt)),
            Some(RawKeyEvent::Named(NamedKey::AltRight))
        );
        assert_eq!(
            convert(KeyCode::Media(MediaKeyCode::RaiseVolume)),
            Some(RawKeyEvent::Named(NamedKey::MediaVolumeUp))
        );
        assert!(matches!(
            convert(KeyCode::PrintScreen),
            Some(RawKeyEvent::Named(NamedKey::Other(_)))
        ));
        assert_eq!(convert(KeyCode::Null), None);
    }

    #[test]
    fn test_handle_event_forwards_presses() {
        let (tx, mut rx) = mpsc::channel(8);
        let quit = CancelHandle::new();

        let flow = Driver::handle_event(&tx, &quit, press(KeyCode::Char('x'), KeyModifiers::NONE));
        assert_eq!(flow, Flow::Continue);
        assert_eq!(rx.try_recv().unwrap(), RawKeyEvent::Char('x'));

        // Releases and non-key events are ignored.
        let release = Event::Key(KeyEvent::new_with_kind_and_state(
            KeyCode::Char('x'),
            KeyModifiers::NONE,
            KeyEventKind::Release,
            KeyEventState::NONE,
        ));
        assert_eq!(Driver::handle_event(&tx, &quit, release), Flow::Continue);
        assert_eq!(
            Driver::handle_event(&tx, &quit, Event::FocusGained),
            Flow::Continue
        );
        assert!(rx.try_recv().is_err());
        assert!(!quit.is_cancelled());
    }

    #[test]
    fn test_handle_event_interrupt() {
        let (tx, mut rx) = mpsc::channel(8);
        let quit = CancelHandle::new();

        let flow = Driver::handle_event(
            &tx,
            &quit,
            press(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert_eq!(flow, Flow::Stop);
        assert!(quit.is_cancelled());
        assert!(rx.try_recv().is_err());
    }
}
