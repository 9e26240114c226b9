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

use thiserror::Error;

mod cpal;
pub mod mixer;
pub mod scheduler;
pub mod voice;

pub use self::cpal::{list_devices, DeviceInfo, Output};
pub use mixer::Mixer;
pub use scheduler::PlaybackScheduler;
pub use voice::{Claim, VoicePool};

/// Errors from opening or driving an output device.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no output device found with name {0}")]
    NoDevice(String),

    #[error("unsupported device sample format {0}")]
    UnsupportedFormat(String),

    #[error("unable to enumerate devices: {0}")]
    Devices(#[from] ::cpal::DevicesError),

    #[error("unable to read device name: {0}")]
    DeviceName(#[from] ::cpal::DeviceNameError),

    #[error("unable to read default output config: {0}")]
    DefaultConfig(#[from] ::cpal::DefaultStreamConfigError),

    #[error("unable to build output stream: {0}")]
    BuildStream(#[from] ::cpal::BuildStreamError),

    #[error("unable to start output stream: {0}")]
    PlayStream(#[from] ::cpal::PlayStreamError),

    #[error("output stream thread exited before reporting")]
    StreamThread,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
