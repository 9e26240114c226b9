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

//! Application settings, read from an optional YAML file and `CLACK_` environment variables.

use std::env;
use std::path::{Path, PathBuf};

use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use tracing::debug;

mod audio;
mod error;

pub use audio::Audio;
pub use error::SettingsError;

const DEFAULT_VOLUME: f32 = 0.7;
const DEFAULT_EVENT_QUEUE: usize = 256;
const DEFAULT_STATE_FILE: &str = ".clack_profiles.json";

/// Top level settings.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Settings {
    /// Audio output.
    #[serde(default)]
    audio: Audio,

    /// Keystroke volume in [0.0, 1.0] (default: 0.7).
    volume: Option<f32>,

    /// Per-keystroke diagnostics (default: false).
    debug: Option<bool>,

    /// Where the profile store lives (default: ~/.clack_profiles.json).
    state_file: Option<PathBuf>,

    /// Capacity of the key event queue (default: 256).
    event_queue: Option<usize>,
}

impl Settings {
    /// Loads settings from the given YAML file, if any, overlaid with `CLACK_` environment
    /// variables. Nested keys use a double underscore, e.g. `CLACK_AUDIO__MAX_VOICES`.
    pub fn load(path: Option<&Path>) -> Result<Settings, SettingsError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            debug!(path = ?path, "Reading settings file");
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml));
        }
        Settings::from_builder(builder.add_source(environment()))
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Settings, SettingsError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if let Some(volume) = self.volume {
            if !(0.0..=1.0).contains(&volume) {
                return Err(SettingsError::Volume(volume));
            }
        }
        if self.event_queue == Some(0) {
            return Err(SettingsError::Zero("event_queue"));
        }
        if self.audio.channels() == 0 {
            return Err(SettingsError::Zero("audio.channels"));
        }
        if self.audio.sample_rate() == 0 {
            return Err(SettingsError::Zero("audio.sample_rate"));
        }
        if self.audio.max_voices() == 0 {
            return Err(SettingsError::Zero("audio.max_voices"));
        }
        Ok(())
    }

    /// Applies command line overrides.
    pub fn with_overrides(
        mut self,
        volume: Option<f32>,
        debug: bool,
    ) -> Result<Settings, SettingsError> {
        if volume.is_some() {
            self.volume = volume;
        }
        if debug {
            self.debug = Some(true);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    /// Returns the volume (default: 0.7).
    pub fn volume(&self) -> f32 {
        self.volume.unwrap_or(DEFAULT_VOLUME)
    }

    /// Returns whether debug mode is on (default: false).
    pub fn debug(&self) -> bool {
        self.debug.unwrap_or(false)
    }

    /// Returns the profile store path (default: ~/.clack_profiles.json).
    pub fn state_file(&self) -> PathBuf {
        match &self.state_file {
            Some(state_file) => state_file.clone(),
            None => home_dir().join(DEFAULT_STATE_FILE),
        }
    }

    /// Returns the key event queue capacity (default: 256).
    pub fn event_queue(&self) -> usize {
        self.event_queue.unwrap_or(DEFAULT_EVENT_QUEUE)
    }
}

fn environment() -> Environment {
    Environment::with_prefix("CLACK")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn home_dir() -> PathBuf {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}
