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

//! Loading profiles and extracting per-key segments.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use super::decoder::DecodedWaveform;
use super::error::LoadError;
use super::timing::{TimingDocument, TimingEntry, TimingIndex};
use crate::keys::CanonicalKeyId;

/// Name of the timing document inside a profile folder.
pub const CONFIG_FILE: &str = "config.json";

/// Accepted sprite-sheet file names, in order of preference.
pub const SOUND_FILES: [&str; 4] = ["sound.ogg", "sound.wav", "sound.flac", "sound.mp3"];

/// Keys shown when summarizing a freshly loaded profile.
const SUMMARY_KEYS: [&str; 4] = ["KeyA", "Space", "Return", "Backspace"];

/// An immutable, loaded profile: the master waveform and its timing index.
///
/// Snapshots are shared behind an `Arc` and never change. Switching profiles replaces the
/// whole snapshot.
#[derive(Debug)]
pub struct ProfileSnapshot {
    name: String,
    waveform: DecodedWaveform,
    index: TimingIndex,
}

impl ProfileSnapshot {
    pub fn new(name: String, waveform: DecodedWaveform, index: TimingIndex) -> ProfileSnapshot {
        ProfileSnapshot {
            name,
            waveform,
            index,
        }
    }

    /// The profile name from the timing document.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn waveform(&self) -> &DecodedWaveform {
        &self.waveform
    }

    pub fn index(&self) -> &TimingIndex {
        &self.index
    }

    /// Returns the timing entries of a few common keys, for display.
    pub fn summary(&self) -> Vec<(CanonicalKeyId, TimingEntry)> {
        SUMMARY_KEYS
            .iter()
            .filter_map(|name| CanonicalKeyId::lookup(name))
            .filter_map(|key| self.index.get(key).map(|entry| (key, *entry)))
            .collect()
    }
}

/// An owned copy of one key's sound, ready to hand to playback.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl Segment {
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Segment {
        Segment {
            samples,
            channels,
            sample_rate,
        }
    }

    /// Interleaved samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    /// Scales every sample by the given gain.
    pub fn apply_gain(&mut self, gain: f32) {
        if gain == 1.0 {
            return;
        }
        self.samples.iter_mut().for_each(|sample| *sample *= gain);
    }
}

/// Builds a snapshot from an in-memory waveform file and timing document.
///
/// Nothing is returned unless both decode and parse succeed. The waveform is decoded first,
/// so when both inputs are bad the error is `LoadError::Decode`.
pub fn load(
    waveform_bytes: Vec<u8>,
    extension: Option<&str>,
    config_bytes: &[u8],
) -> Result<ProfileSnapshot, LoadError> {
    let waveform = DecodedWaveform::decode(waveform_bytes, extension)?;
    let document = TimingDocument::parse(config_bytes)?;

    info!(
        profile = %document.name,
        keys = document.index.len(),
        channels = waveform.channels(),
        sample_rate = waveform.sample_rate(),
        duration_ms = waveform.duration().as_millis() as u64,
        "Profile loaded"
    );

    Ok(ProfileSnapshot::new(document.name, waveform, document.index))
}

/// Loads a profile folder holding a `sound.*` sprite sheet and `config.json`.
pub fn load_folder(folder: &Path) -> Result<ProfileSnapshot, LoadError> {
    let config_path = folder.join(CONFIG_FILE);
    if !config_path.is_file() {
        return Err(LoadError::MissingFile {
            folder: folder.to_path_buf(),
            file: CONFIG_FILE,
        });
    }
    let sound_path = SOUND_FILES
        .iter()
        .map(|name| folder.join(name))
        .find(|path| path.is_file())
        .ok_or_else(|| LoadError::MissingFile {
            folder: folder.to_path_buf(),
            file: "sound.ogg",
        })?;

    info!(folder = ?folder, sound = ?sound_path, "Loading sprite sheet profile");

    let read = |path: &Path| {
        fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
    };
    let config_bytes = read(&config_path)?;
    let sound_bytes = read(&sound_path)?;
    let extension = sound_path.extension().and_then(|ext| ext.to_str());

    load(sound_bytes, extension, &config_bytes)
}

/// Copies the sound for `key` out of the snapshot.
///
/// Returns `None` when the key has no timing entry or when its range starts at or beyond
/// the end of the waveform. Ranges running past the end are clamped, so the segment may be
/// shorter than the entry asks for.
pub fn extract(snapshot: &ProfileSnapshot, key: CanonicalKeyId) -> Option<Segment> {
    let entry = snapshot.index.get(key)?;
    let waveform = &snapshot.waveform;
    let total = waveform.frames() as u64;

    let (start, end) = entry.frame_range(waveform.sample_rate());
    if start >= total {
        debug!(key = %key, start, total, "Timing entry starts past the end of the waveform");
        return None;
    }
    let end = end.min(total);
    if end <= start {
        return None;
    }

    let samples = waveform
        .frame_range(start as usize, end as usize)
        .to_vec();
    Some(Segment::new(
        samples,
        waveform.channels(),
        waveform.sample_rate(),
    ))
}
