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

//! Persisted profile selection.
//!
//! The store is a small JSON document mapping profile names to folders, plus the name of the
//! current profile:
//!
//! ```json
//! {"profiles": {"cherry": "/home/me/sounds/cherry"}, "current_profile": "cherry"}
//! ```
//!
//! Every change is written back immediately.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unable to access profile store {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("profile store {} is corrupt: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no profile named {0}")]
    NotFound(String),

    #[error("a profile named {0} already exists")]
    Duplicate(String),

    #[error("profile names must not be empty")]
    EmptyName,

    #[error("profile {0} was saved in an old format and has been removed, please add it again")]
    LegacyFormatProfile(String),

    #[error("profile {0} has an unrecognized entry")]
    InvalidEntry(String),
}

/// A stored profile: a name and the folder holding its sound and timing files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub folder: PathBuf,
}

/// The on-disk document.
#[derive(Serialize, Deserialize, Default)]
struct State {
    #[serde(default)]
    profiles: BTreeMap<String, Value>,
    #[serde(default)]
    current_profile: Option<String>,
}

/// A JSON backed profile store.
pub struct ProfileStore {
    path: PathBuf,
    state: State,
}

impl ProfileStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<ProfileStore, StoreError> {
        let path = path.into();
        let state = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => State::default(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        Ok(ProfileStore { path, state })
    }

    /// Writes the store back to disk.
    pub fn save(&self) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_vec_pretty(&self.state).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(io_err)
    }

    /// Adds a profile. Names are trimmed and must be unique.
    pub fn add(&mut self, name: &str, folder: &Path) -> Result<(), StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        if self.state.profiles.contains_key(name) {
            return Err(StoreError::Duplicate(name.to_string()));
        }

        self.state.profiles.insert(
            name.to_string(),
            Value::String(folder.to_string_lossy().into_owned()),
        );
        self.save()?;
        info!(profile = name, folder = ?folder, "Added profile");
        Ok(())
    }

    /// Removes a profile. Removing the current profile clears the selection.
    pub fn remove(&mut self, name: &str) -> Result<(), StoreError> {
        if self.state.profiles.remove(name).is_none() {
            return Err(StoreError::NotFound(name.to_string()));
        }
        if self.state.current_profile.as_deref() == Some(name) {
            self.state.current_profile = None;
        }
        self.save()?;
        info!(profile = name, "Removed profile");
        Ok(())
    }

    /// Makes `name` the current profile.
    pub fn select(&mut self, name: &str) -> Result<(), StoreError> {
        if !self.state.profiles.contains_key(name) {
            return Err(StoreError::NotFound(name.to_string()));
        }
        self.state.current_profile = Some(name.to_string());
        self.save()
    }

    /// Returns the current profile name. When the stored selection is unset or no longer
    /// exists, the first profile by name is used instead.
    pub fn selected(&self) -> Option<&str> {
        match &self.state.current_profile {
            Some(current) if self.state.profiles.contains_key(current) => Some(current),
            _ => self.state.profiles.keys().next().map(String::as_str),
        }
    }

    /// Looks up the folder for `name`.
    ///
    /// Entries written by older versions hold a list instead of a folder. They are removed
    /// from the store when found and reported as [StoreError::LegacyFormatProfile].
    pub fn resolve(&mut self, name: &str) -> Result<Profile, StoreError> {
        match self.state.profiles.get(name) {
            None => Err(StoreError::NotFound(name.to_string())),
            Some(Value::String(folder)) => Ok(Profile {
                name: name.to_string(),
                folder: PathBuf::from(folder),
            }),
            Some(Value::Array(_)) => {
                warn!(profile = name, "Old profile format detected, removing profile");
                self.state.profiles.remove(name);
                if self.state.current_profile.as_deref() == Some(name) {
                    self.state.current_profile = None;
                }
                self.save()?;
                Err(StoreError::LegacyFormatProfile(name.to_string()))
            }
            Some(_) => Err(StoreError::InvalidEntry(name.to_string())),
        }
    }

    /// Lists profiles by name with their folders. Entries that are not a folder have none.
    pub fn list(&self) -> Vec<(&str, Option<&Path>)> {
        self.state
            .profiles
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str().map(Path::new)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, ProfileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::load(dir.path().join("profiles.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_missing_file_is_empty() {
        let (_dir, store) = store();
        assert!(store.list().is_empty());
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn test_add_select_persist() {
        let (dir, mut store) = store();
        store.add("cherry", Path::new("/sounds/cherry")).unwrap();
        store.add(" topre ", Path::new("/sounds/topre")).unwrap();
        store.select("topre").unwrap();

        let mut reopened = ProfileStore::load(dir.path().join("profiles.json")).unwrap();
        assert_eq!(reopened.selected(), Some("topre"));
        assert_eq!(
            reopened.list(),
            vec![
                ("cherry", Some(Path::new("/sounds/cherry"))),
                ("topre", Some(Path::new("/sounds/topre"))),
            ]
        );
        assert_eq!(
            reopened.resolve("cherry").unwrap(),
            Profile {
                name: "cherry".to_string(),
                folder: PathBuf::from("/sounds/cherry"),
            }
        );
    }

    #[test]
    fn test_add_rejects_duplicates_and_empty() {
        let (_dir, mut store) = store();
        store.add("cherry", Path::new("/a")).unwrap();
        assert!(matches!(
            store.add("cherry", Path::new("/b")),
            Err(StoreError::Duplicate(_))
        ));
        assert!(matches!(
            store.add("  ", Path::new("/b")),
            Err(StoreError::EmptyName)
        ));
        assert_eq!(store.resolve("cherry").unwrap().folder, PathBuf::from("/a"));
    }

    #[test]
    fn test_remove_clears_selection() {
        let (_dir, mut store) = store();
        store.add("a", Path::new("/a")).unwrap();
        store.add("b", Path::new("/b")).unwrap();
        store.select("b").unwrap();

        store.remove("b").unwrap();
        // Falls back to the first profile by name.
        assert_eq!(store.selected(), Some("a"));
        assert!(matches!(store.remove("b"), Err(StoreError::NotFound(_))));
        assert!(matches!(store.select("b"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_selected_falls_back_when_stale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        fs::write(
            &path,
            r#"{"profiles": {"zeta": "/z", "alpha": "/a"}, "current_profile": "gone"}"#,
        )
        .unwrap();

        let store = ProfileStore::load(&path).unwrap();
        assert_eq!(store.selected(), Some("alpha"));
    }

    #[test]
    fn test_legacy_entry_is_purged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        fs::write(
            &path,
            r#"{"profiles": {"old": ["a.wav", "b.wav"], "new": "/n"}, "current_profile": "old"}"#,
        )
        .unwrap();

        let mut store = ProfileStore::load(&path).unwrap();
        assert!(matches!(
            store.resolve("old"),
            Err(StoreError::LegacyFormatProfile(name)) if name == "old"
        ));

        let reopened = ProfileStore::load(&path).unwrap();
        assert_eq!(reopened.list(), vec![("new", Some(Path::new("/n")))]);
        assert_eq!(reopened.selected(), Some("new"));
    }

    #[test]
    fn test_invalid_entry_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        fs::write(&path, r#"{"profiles": {"odd": 42}}"#).unwrap();

        let mut store = ProfileStore::load(&path).unwrap();
        assert!(matches!(
            store.resolve("odd"),
            Err(StoreError::InvalidEntry(_))
        ));
        assert_eq!(store.list(), vec![("odd", None)]);
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            ProfileStore::load(&path),
            Err(StoreError::Parse { .. })
        ));
    }
}
