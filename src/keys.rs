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

//! Key event normalization.
//!
//! Raw key presses from a listener are reduced to a [CanonicalKeyId], the name used by
//! sound profile timing documents (`KeyA`, `Num1`, `Space`, `ShiftLeft`, `F5`, ...).

use std::fmt;

/// A raw key press as delivered by a listener, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawKeyEvent {
    /// A key that produced a printable character.
    Char(char),
    /// A key identified by name rather than by the character it produces.
    Named(NamedKey),
}

/// Non-character keys a listener can report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamedKey {
    Space,
    Enter,
    Backspace,
    Tab,
    /// A shift key whose side is unknown.
    Shift,
    ShiftLeft,
    ShiftRight,
    /// A control key whose side is unknown.
    Control,
    ControlLeft,
    ControlRight,
    /// An alt key whose side is unknown.
    Alt,
    AltLeft,
    AltRight,
    CapsLock,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    /// A function key, by number.
    F(u8),
    MediaVolumeUp,
    MediaVolumeDown,
    MediaPlayPause,
    /// Anything else the listener saw. The payload is only used for diagnostics.
    Other(String),
}

/// The normalized name of a physical key.
///
/// Values only come from the fixed vocabulary below, so they can be compared and hashed
/// cheaply and never need to be allocated on the key path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalKeyId(&'static str);

impl CanonicalKeyId {
    /// Returns the identifier as it appears in timing documents.
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Finds the vocabulary entry with the given name.
    pub(crate) fn lookup(name: &str) -> Option<CanonicalKeyId> {
        VOCABULARY
            .iter()
            .copied()
            .find(|id| *id == name)
            .map(CanonicalKeyId)
    }
}

impl fmt::Display for CanonicalKeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

const LETTERS: [&str; 26] = [
    "KeyA", "KeyB", "KeyC", "KeyD", "KeyE", "KeyF", "KeyG", "KeyH", "KeyI", "KeyJ", "KeyK",
    "KeyL", "KeyM", "KeyN", "KeyO", "KeyP", "KeyQ", "KeyR", "KeyS", "KeyT", "KeyU", "KeyV",
    "KeyW", "KeyX", "KeyY", "KeyZ",
];

const DIGITS: [&str; 10] = [
    "Num0", "Num1", "Num2", "Num3", "Num4", "Num5", "Num6", "Num7", "Num8", "Num9",
];

const FUNCTION_KEYS: [&str; 12] = [
    "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "F11", "F12",
];

/// Every identifier the normalizer can produce.
const VOCABULARY: &[&str] = &[
    "KeyA", "KeyB", "KeyC", "KeyD", "KeyE", "KeyF", "KeyG", "KeyH", "KeyI", "KeyJ", "KeyK",
    "KeyL", "KeyM", "KeyN", "KeyO", "KeyP", "KeyQ", "KeyR", "KeyS", "KeyT", "KeyU", "KeyV",
    "KeyW", "KeyX", "KeyY", "KeyZ", "Num0", "Num1", "Num2", "Num3", "Num4", "Num5", "Num6",
    "Num7", "Num8", "Num9", "Space", "Minus", "Equal", "LeftBracket", "RightBracket",
    "BackSlash", "SemiColon", "Quote", "BackQuote", "Comma", "Dot", "Slash", "Return",
    "Backspace", "Tab", "ShiftLeft", "ShiftRight", "ControlLeft", "ControlRight", "Alt", "AltGr",
    "CapsLock", "Escape", "UpArrow", "DownArrow", "LeftArrow", "RightArrow", "Home", "End",
    "PageUp", "PageDown", "Insert", "Delete", "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8",
    "F9", "F10", "F11", "F12",
];

/// Maps a raw key event to its canonical identifier.
///
/// Returns `None` for keys outside the vocabulary. That is an expected outcome (the key
/// simply has no sound), not an error.
pub fn normalize(event: &RawKeyEvent) -> Option<CanonicalKeyId> {
    match event {
        RawKeyEvent::Char(c) => normalize_char(*c),
        RawKeyEvent::Named(key) => normalize_named(key),
    }
}

fn normalize_char(c: char) -> Option<CanonicalKeyId> {
    if c.is_ascii_alphabetic() {
        let index = (c.to_ascii_uppercase() as u8 - b'A') as usize;
        return Some(CanonicalKeyId(LETTERS[index]));
    }
    if c.is_ascii_digit() {
        return Some(CanonicalKeyId(DIGITS[(c as u8 - b'0') as usize]));
    }

    let name = match c {
        ' ' => "Space",
        '-' => "Minus",
        '=' => "Equal",
        '[' => "LeftBracket",
        ']' => "RightBracket",
        '\\' => "BackSlash",
        ';' => "SemiColon",
        '\'' => "Quote",
        '`' => "BackQuote",
        ',' => "Comma",
        '.' => "Dot",
        '/' => "Slash",
        _ => return None,
    };
    Some(CanonicalKeyId(name))
}

fn normalize_named(key: &NamedKey) -> Option<CanonicalKeyId> {
    let name = match key {
        NamedKey::Space => "Space",
        NamedKey::Enter => "Return",
        NamedKey::Backspace => "Backspace",
        NamedKey::Tab => "Tab",
        NamedKey::Shift | NamedKey::ShiftLeft => "ShiftLeft",
        NamedKey::ShiftRight => "ShiftRight",
        NamedKey::Control | NamedKey::ControlLeft => "ControlLeft",
        NamedKey::ControlRight => "ControlRight",
        NamedKey::Alt | NamedKey::AltLeft => "Alt",
        NamedKey::AltRight => "AltGr",
        NamedKey::CapsLock => "CapsLock",
        NamedKey::Escape => "Escape",
        NamedKey::Up => "UpArrow",
        NamedKey::Down => "DownArrow",
        NamedKey::Left => "LeftArrow",
        NamedKey::Right => "RightArrow",
        NamedKey::Home => "Home",
        NamedKey::End => "End",
        NamedKey::PageUp => "PageUp",
        NamedKey::PageDown => "PageDown",
        NamedKey::Insert => "Insert",
        NamedKey::Delete => "Delete",
        NamedKey::F(n @ 1..=12) => FUNCTION_KEYS[(*n - 1) as usize],
        NamedKey::F(_)
        | NamedKey::MediaVolumeUp
        | NamedKey::MediaVolumeDown
        | NamedKey::MediaPlayPause
        | NamedKey::Other(_) => return None,
    };
    Some(CanonicalKeyId(name))
}
