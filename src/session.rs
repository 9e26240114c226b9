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

//! The enable/disable lifecycle: loading profiles, swapping snapshots and routing key presses
//! to playback.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc::{self, Receiver};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, span, warn, Instrument, Level};

use crate::audio::PlaybackScheduler;
use crate::cancel::CancelHandle;
use crate::keys::{self, RawKeyEvent};
use crate::listener::Driver;
use crate::snapshot::SnapshotManager;
use crate::sprite::{self, LoadError, ProfileSnapshot};
use crate::store::{ProfileStore, StoreError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no profile selected")]
    NoProfileSelected,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("profile loader failed: {0}")]
    Loader(#[from] JoinError),
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Disabled,
    Loading,
    Ready,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            State::Disabled => "disabled",
            State::Loading => "loading",
            State::Ready => "ready",
        };
        write!(f, "{}", state)
    }
}

/// Settings read on every keystroke.
pub struct Controls {
    /// f32 bits of the volume.
    volume: AtomicU32,
    debug: AtomicBool,
}

impl Controls {
    pub fn new(volume: f32, debug: bool) -> Controls {
        let controls = Controls {
            volume: AtomicU32::new(0),
            debug: AtomicBool::new(debug),
        };
        controls.set_volume(volume);
        controls
    }

    /// Volume in [0.0, 1.0]. Only keystrokes after the change are affected.
    pub fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::Relaxed))
    }

    pub fn set_volume(&self, volume: f32) {
        let volume = if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        };
        self.volume.store(volume.to_bits(), Ordering::Relaxed);
    }

    /// Whether per-keystroke diagnostics are logged.
    pub fn debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    pub fn set_debug(&self, debug: bool) {
        self.debug.store(debug, Ordering::Relaxed);
    }
}

/// Holds the session in `Loading`. Dropped without `finish`, it puts the session back to
/// `Disabled`.
struct LoadingGuard<'a> {
    state: &'a Mutex<State>,
    finished: bool,
}

impl<'a> LoadingGuard<'a> {
    fn enter(state: &'a Mutex<State>) -> LoadingGuard<'a> {
        *state.lock() = State::Loading;
        LoadingGuard {
            state,
            finished: false,
        }
    }

    fn finish(mut self, state: State) {
        *self.state.lock() = state;
        self.finished = true;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            *self.state.lock() = State::Disabled;
        }
    }
}

/// The running listener and dispatcher.
struct Listening {
    cancel: CancelHandle,
    listener: JoinHandle<Result<(), io::Error>>,
    dispatcher: JoinHandle<()>,
}

/// Ties the profile store, snapshot manager, key listener and playback together.
pub struct Session {
    store: Mutex<ProfileStore>,
    snapshots: Arc<SnapshotManager>,
    scheduler: PlaybackScheduler,
    controls: Arc<Controls>,
    driver: Arc<dyn Driver>,
    event_queue: usize,
    state: Mutex<State>,
    /// Serializes enable, switch and disable. Holds the listener while enabled.
    listening: tokio::sync::Mutex<Option<Listening>>,
}

impl Session {
    pub fn new(
        store: ProfileStore,
        scheduler: PlaybackScheduler,
        driver: Arc<dyn Driver>,
        controls: Arc<Controls>,
        event_queue: usize,
    ) -> Session {
        Session {
            store: Mutex::new(store),
            snapshots: Arc::new(SnapshotManager::new()),
            scheduler,
            controls,
            driver,
            event_queue: event_queue.max(1),
            state: Mutex::new(State::Disabled),
            listening: tokio::sync::Mutex::new(None),
        }
    }

    pub fn state(&self) -> State {
        *self.state.lock()
    }

    pub fn controls(&self) -> &Arc<Controls> {
        &self.controls
    }

    /// Returns the snapshot currently used for playback.
    pub fn current(&self) -> Option<Arc<ProfileSnapshot>> {
        self.snapshots.current()
    }

    /// Returns the selected profile name.
    pub fn selected(&self) -> Option<String> {
        self.store.lock().selected().map(str::to_string)
    }

    fn set_state(&self, state: State) {
        *self.state.lock() = state;
    }

    /// Loads the selected profile and starts listening for keys.
    ///
    /// On failure, or if the returned future is dropped before it completes, the session is
    /// left disabled. Enabling an enabled session does nothing.
    pub async fn enable(&self) -> Result<(), SessionError> {
        let mut listening = self.listening.lock().await;
        if listening.is_some() {
            return Ok(());
        }

        let loading = LoadingGuard::enter(&self.state);
        let snapshot = match self.load_selected().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(err = %e, "Unable to enable keyboard sounds");
                return Err(e);
            }
        };
        let profile = snapshot.name().to_string();
        self.snapshots.switch(snapshot);

        *listening = Some(self.start_listening());
        loading.finish(State::Ready);
        info!(profile = %profile, "Keyboard sounds enabled");
        Ok(())
    }

    /// Selects a different profile.
    ///
    /// While enabled the new profile is loaded before it replaces the current one, and a
    /// failed load leaves the current one playing. While disabled only the selection changes.
    pub async fn switch_profile(&self, name: &str) -> Result<(), SessionError> {
        let listening = self.listening.lock().await;
        self.store.lock().select(name)?;
        info!(profile = name, "Selected profile");

        if listening.is_none() {
            return Ok(());
        }

        match self.load_selected().await {
            Ok(snapshot) => {
                self.snapshots.switch(snapshot);
                Ok(())
            }
            Err(e) => {
                warn!(
                    err = %e,
                    profile = name,
                    "Unable to switch profile, keeping the current one"
                );
                Err(e)
            }
        }
    }

    /// Stops listening for keys. Sounds already playing finish on their own.
    pub async fn disable(&self) {
        let mut listening = self.listening.lock().await;
        if let Some(Listening {
            cancel,
            listener,
            dispatcher,
        }) = listening.take()
        {
            cancel.cancel();
            match listener.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(err = %e, "Key listener failed"),
                Err(e) => error!(err = %e, "Key listener panicked"),
            }
            if let Err(e) = dispatcher.await {
                error!(err = %e, "Dispatcher panicked");
            }
        }
        self.snapshots.clear();
        self.set_state(State::Disabled);
        info!("Keyboard sounds disabled");
    }

    /// Resolves the selected profile and loads it off the async runtime.
    async fn load_selected(&self) -> Result<Arc<ProfileSnapshot>, SessionError> {
        let folder: PathBuf = {
            let mut store = self.store.lock();
            let name = store
                .selected()
                .ok_or(SessionError::NoProfileSelected)?
                .to_string();
            store.resolve(&name)?.folder
        };

        let snapshot = tokio::task::spawn_blocking(move || sprite::load_folder(&folder)).await??;

        let rate = snapshot.waveform().sample_rate();
        if rate != self.scheduler.sample_rate() {
            warn!(
                profile = snapshot.name(),
                profile_rate = rate,
                output_rate = self.scheduler.sample_rate(),
                "Sample rate mismatch, sounds will play at the wrong pitch"
            );
        }
        Ok(Arc::new(snapshot))
    }

    fn start_listening(&self) -> Listening {
        let cancel = CancelHandle::new();
        let (keys_tx, keys_rx) = mpsc::channel(self.event_queue);

        let dispatcher = tokio::spawn(
            dispatch(
                keys_rx,
                self.snapshots.clone(),
                self.scheduler.clone(),
                self.controls.clone(),
            )
            .instrument(span!(Level::INFO, "dispatcher")),
        );
        let listener = self.driver.monitor_keys(keys_tx, cancel.clone());

        Listening {
            cancel,
            listener,
            dispatcher,
        }
    }
}

/// Turns key presses into playback until every sender is gone.
async fn dispatch(
    mut keys_rx: Receiver<RawKeyEvent>,
    snapshots: Arc<SnapshotManager>,
    scheduler: PlaybackScheduler,
    controls: Arc<Controls>,
) {
    debug!("Dispatcher started");
    while let Some(event) = keys_rx.recv().await {
        let verbose = controls.debug();
        let Some(key) = keys::normalize(&event) else {
            if verbose {
                debug!(event = ?event, "Key has no canonical name");
            }
            continue;
        };

        match snapshots.extract(key) {
            Some(segment) => {
                if verbose {
                    debug!(key = %key, frames = segment.frames(), "Playing key");
                }
                scheduler.play(segment, controls.volume());
            }
            None => {
                if verbose {
                    debug!(key = %key, "No sound mapped for key");
                }
            }
        }
    }
    debug!("Dispatcher stopped");
}
