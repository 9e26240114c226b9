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

//! Mechanical keyboard sounds cut from sprite-sheet sound profiles.
//!
//! A profile is a folder holding one waveform with every key's sound back to back
//! (`sound.ogg`) and a timing document (`config.json`) saying where each key's sound starts
//! and how long it lasts. Key presses are normalized to canonical key names, the matching
//! segment is copied out of the loaded profile and handed to a fixed pool of playback voices.

pub mod audio;
pub mod cancel;
pub mod config;
pub mod keys;
pub mod listener;
pub mod session;
pub mod snapshot;
pub mod sprite;
pub mod store;
#[cfg(test)]
mod testutil;
