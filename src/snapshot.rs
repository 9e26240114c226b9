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

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tracing::info;

use crate::keys::CanonicalKeyId;
use crate::sprite::{self, ProfileSnapshot, Segment};

/// Holds the current profile snapshot and swaps it atomically.
///
/// Readers take a full `Arc` for the duration of a lookup, so a switch never pulls a
/// snapshot out from under an extraction in progress.
#[derive(Default)]
pub struct SnapshotManager {
    current: ArcSwapOption<ProfileSnapshot>,
}

impl SnapshotManager {
    pub fn new() -> SnapshotManager {
        SnapshotManager::default()
    }

    /// Makes `snapshot` current and returns the one it replaced.
    pub fn switch(&self, snapshot: Arc<ProfileSnapshot>) -> Option<Arc<ProfileSnapshot>> {
        info!(profile = snapshot.name(), "Switching profile snapshot");
        self.current.swap(Some(snapshot))
    }

    /// Returns the current snapshot.
    pub fn current(&self) -> Option<Arc<ProfileSnapshot>> {
        self.current.load_full()
    }

    /// Drops the current snapshot.
    pub fn clear(&self) -> Option<Arc<ProfileSnapshot>> {
        self.current.swap(None)
    }

    /// Extracts the segment for `key` from the current snapshot.
    pub fn extract(&self, key: CanonicalKeyId) -> Option<Segment> {
        let guard = self.current.load();
        sprite::extract((*guard).as_ref()?, key)
    }
}
