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

//! Sprite-sheet sound profiles.
//!
//! A profile is one decoded waveform holding every key sound back-to-back plus a timing
//! index saying where each key's sound lives. Loading produces an immutable
//! [ProfileSnapshot]; each key press extracts a freshly owned [Segment] from it.

mod decoder;
mod engine;
mod error;
mod timing;

pub use decoder::DecodedWaveform;
pub use engine::{extract, load, load_folder, ProfileSnapshot, Segment, CONFIG_FILE, SOUND_FILES};
pub use error::{ConfigError, DecodeError, LoadError};
pub use timing::{TimingDocument, TimingEntry, TimingIndex};
