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
use std::path::PathBuf;

/// Errors produced while decoding a sprite-sheet waveform.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Unrecognized audio container: {0}")]
    Probe(#[source] symphonia::core::errors::Error),

    #[error("No audio track found")]
    NoTrack,

    #[error("Sample rate not specified")]
    MissingSampleRate,

    #[error("Unsupported codec: {0}")]
    Codec(#[source] symphonia::core::errors::Error),

    #[error("Failed reading audio stream: {0}")]
    Read(#[source] symphonia::core::errors::Error),

    #[error("Audio stream contains no samples")]
    Empty,

    #[error("Invalid waveform format: {0}")]
    InvalidFormat(String),
}

/// Errors produced while parsing a timing document (`config.json`).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Malformed document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Missing required field `{0}`")]
    MissingField(&'static str),

    #[error("Entry `{key}`: {reason}")]
    InvalidEntry { key: String, reason: &'static str },
}

/// Errors that abort loading a profile. The previously active profile, if any, is unaffected.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to decode waveform: {0}")]
    Decode(#[from] DecodeError),

    #[error("Invalid timing document: {0}")]
    Config(#[from] ConfigError),

    #[error("Profile folder {} has no {file}", .folder.display())]
    MissingFile { folder: PathBuf, file: &'static str },

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
