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

use std::collections::HashMap;
use std::fmt;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::error::ConfigError;
use crate::keys::CanonicalKeyId;

/// Where a key's sound lives inside the sprite sheet, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingEntry {
    start_ms: f64,
    duration_ms: f64,
}

impl TimingEntry {
    /// Creates a timing entry. Both values must be finite and non-negative.
    pub fn new(start_ms: f64, duration_ms: f64) -> Option<TimingEntry> {
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        if valid(start_ms) && valid(duration_ms) {
            Some(TimingEntry {
                start_ms,
                duration_ms,
            })
        } else {
            None
        }
    }

    pub fn start_ms(&self) -> f64 {
        self.start_ms
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    /// Returns the unclamped frame range `(start, end)` at the given sample rate.
    ///
    /// Start and length are rounded independently, half up, so the length of a segment never
    /// depends on where it sits in the sheet.
    pub fn frame_range(&self, sample_rate: u32) -> (u64, u64) {
        let start = ms_to_frames(self.start_ms, sample_rate);
        let length = ms_to_frames(self.duration_ms, sample_rate);
        (start, start.saturating_add(length))
    }
}

/// Converts milliseconds to frames, rounding half up.
fn ms_to_frames(ms: f64, sample_rate: u32) -> u64 {
    (ms * sample_rate as f64 / 1000.0 + 0.5).floor() as u64
}

/// Immutable key to timing mapping for one profile.
#[derive(Debug, Clone, Default)]
pub struct TimingIndex {
    entries: HashMap<CanonicalKeyId, TimingEntry>,
}

impl TimingIndex {
    pub fn get(&self, key: CanonicalKeyId) -> Option<&TimingEntry> {
        self.entries.get(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(CanonicalKeyId, TimingEntry)> for TimingIndex {
    /// Later pairs replace earlier pairs with the same key.
    fn from_iter<I: IntoIterator<Item = (CanonicalKeyId, TimingEntry)>>(iter: I) -> Self {
        TimingIndex {
            entries: iter.into_iter().collect(),
        }
    }
}

/// A parsed and validated `config.json`.
#[derive(Debug, Clone)]
pub struct TimingDocument {
    pub name: String,
    pub index: TimingIndex,
}

/// The `defines` object with every entry kept in document order, duplicates included.
struct Defines(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for Defines {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DefinesVisitor;

        impl<'de> Visitor<'de> for DefinesVisitor {
            type Value = Defines;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of key names to [start_ms, duration_ms] pairs")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Defines, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    entries.push((key, value));
                }
                Ok(Defines(entries))
            }
        }

        deserializer.deserialize_map(DefinesVisitor)
    }
}

#[derive(Deserialize)]
struct RawDocument {
    name: Option<String>,
    defines: Option<Defines>,
}

impl TimingDocument {
    /// Parses a timing document.
    ///
    /// Entries are validated in document order. When a key appears more than once the last
    /// occurrence wins. Keys outside the canonical vocabulary and `null` entries are skipped.
    pub fn parse(bytes: &[u8]) -> Result<TimingDocument, ConfigError> {
        let raw: RawDocument = serde_json::from_slice(bytes)?;
        let name = raw.name.ok_or(ConfigError::MissingField("name"))?;
        let defines = raw.defines.ok_or(ConfigError::MissingField("defines"))?;

        let total = defines.0.len();
        let mut entries = Vec::with_capacity(total);
        let mut unknown = 0usize;
        let mut unbound = 0usize;
        for (key, value) in defines.0 {
            if value.is_null() {
                unbound += 1;
                continue;
            }
            let entry = parse_pair(&key, &value)?;
            match CanonicalKeyId::lookup(&key) {
                Some(id) => entries.push((id, entry)),
                None => {
                    debug!(key = %key, "Skipping timing entry for unknown key");
                    unknown += 1;
                }
            }
        }

        let matched = entries.len();
        let index: TimingIndex = entries.into_iter().collect();
        let overridden = matched - index.len();
        if overridden > 0 {
            debug!(overridden, "Duplicate timing entries replaced by later ones");
        }
        if index.is_empty() && total > 0 {
            warn!(
                profile = %name,
                entries = total,
                "No timing entries use known key names"
            );
        }
        debug!(
            profile = %name,
            keys = index.len(),
            unknown,
            unbound,
            "Timing document parsed"
        );

        Ok(TimingDocument { name, index })
    }
}

fn parse_pair(key: &str, value: &Value) -> Result<TimingEntry, ConfigError> {
    let invalid = |reason| ConfigError::InvalidEntry {
        key: key.to_string(),
        reason,
    };

    let pair = value
        .as_array()
        .ok_or_else(|| invalid("expected [start_ms, duration_ms]"))?;
    if pair.len() != 2 {
        return Err(invalid("expected exactly two numbers"));
    }
    let start = pair[0].as_f64().ok_or_else(|| invalid("start_ms is not a number"))?;
    let duration = pair[1]
        .as_f64()
        .ok_or_else(|| invalid("duration_ms is not a number"))?;

    TimingEntry::new(start, duration).ok_or_else(|| invalid("values must be non-negative"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{normalize, RawKeyEvent};

    fn key(c: char) -> CanonicalKeyId {
        normalize(&RawKeyEvent::Char(c)).unwrap()
    }

    #[test]
    fn test_parse_document() {
        let doc = TimingDocument::parse(
            br#"{
                "id": "ignored",
                "name": "Cherry MX Blue",
                "key_define_type": "single",
                "defines": {
                    "KeyA": [0, 100],
                    "Space": [250.5, 80],
                    "Return": null
                }
            }"#,
        )
        .unwrap();

        assert_eq!(doc.name, "Cherry MX Blue");
        assert_eq!(doc.index.len(), 2);
        assert_eq!(doc.index.get(key('a')), Some(&TimingEntry::new(0.0, 100.0).unwrap()));
        assert_eq!(
            doc.index.get(key(' ')),
            Some(&TimingEntry::new(250.5, 80.0).unwrap())
        );
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let doc = TimingDocument::parse(
            br#"{"name": "dup", "defines": {"KeyA": [0, 10], "KeyB": [5, 5], "KeyA": [20, 30]}}"#,
        )
        .unwrap();

        assert_eq!(doc.index.len(), 2);
        assert_eq!(doc.index.get(key('a')), Some(&TimingEntry::new(20.0, 30.0).unwrap()));
    }

    #[test]
    fn test_unknown_keys_are_skipped() {
        let doc = TimingDocument::parse(
            br#"{"name": "codes", "defines": {"30": [0, 10], "KeyA": [0, 5]}}"#,
        )
        .unwrap();
        assert_eq!(doc.index.len(), 1);
    }

    #[test]
    fn test_missing_fields() {
        assert!(matches!(
            TimingDocument::parse(br#"{"defines": {}}"#),
            Err(ConfigError::MissingField("name"))
        ));
        assert!(matches!(
            TimingDocument::parse(br#"{"name": "x"}"#),
            Err(ConfigError::MissingField("defines"))
        ));
    }

    #[test]
    fn test_invalid_pairs() {
        for defines in [
            r#"{"KeyA": [0]}"#,
            r#"{"KeyA": [0, 1, 2]}"#,
            r#"{"KeyA": ["0", 1]}"#,
            r#"{"KeyA": [-1, 10]}"#,
            r#"{"KeyA": [0, -10]}"#,
            r#"{"KeyA": "sound.wav"}"#,
        ] {
            let doc = format!(r#"{{"name": "bad", "defines": {}}}"#, defines);
            match TimingDocument::parse(doc.as_bytes()) {
                Err(ConfigError::InvalidEntry { key, .. }) => assert_eq!(key, "KeyA"),
                other => panic!("expected invalid entry for {}, got {:?}", defines, other),
            }
        }
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            TimingDocument::parse(b"{\"name\": "),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            TimingDocument::parse(br#"{"name": "x", "defines": [1, 2]}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_frame_range_rounding() {
        let entry = TimingEntry::new(0.0, 100.0).unwrap();
        assert_eq!(entry.frame_range(44100), (0, 4410));

        // 1ms at 500Hz is exactly half a frame and rounds up.
        let entry = TimingEntry::new(1.0, 1.0).unwrap();
        assert_eq!(entry.frame_range(500), (1, 2));

        // 0.01ms at 44100Hz is 0.441 frames and rounds down.
        let entry = TimingEntry::new(0.01, 0.01).unwrap();
        assert_eq!(entry.frame_range(44100), (0, 0));
    }

    #[test]
    fn test_timing_entry_rejects_invalid() {
        assert!(TimingEntry::new(-0.5, 1.0).is_none());
        assert!(TimingEntry::new(0.0, f64::NAN).is_none());
        assert!(TimingEntry::new(f64::INFINITY, 1.0).is_none());
    }
}
