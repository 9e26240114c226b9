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

/// Typed error for settings load/parse failures so callers can distinguish
/// e.g. parse errors from out of range values without string matching.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Settings load/parse error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("volume must be between 0.0 and 1.0, got {0}")]
    Volume(f32),

    #[error("{0} must be at least 1")]
    Zero(&'static str),
}
