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

use std::{fmt, thread};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, Sender};
use tracing::{error, info, span, Level};

use crate::audio::{mixer::Mixer, scheduler::PlaybackScheduler, AudioError};
use crate::config;

/// An output device known to cpal.
pub struct DeviceInfo {
    /// The name of the device.
    name: String,
    /// The maximum number of channels the device supports.
    max_channels: u16,
    /// The host ID of the device.
    host_id: cpal::HostId,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name,
            self.max_channels,
            self.host_id.name()
        )
    }
}

/// Lists output devices across all available hosts.
pub fn list_devices() -> Result<Vec<DeviceInfo>, AudioError> {
    // Suppress noisy output here.
    let _shh_stdout = shh::stdout()?;
    let _shh_stderr = shh::stderr()?;

    let mut devices = Vec::new();
    for host_id in cpal::available_hosts() {
        let host = match cpal::host_from_id(host_id) {
            Ok(host) => host,
            Err(e) => {
                error!(err = %e, host = host_id.name(), "Unable to open host");
                continue;
            }
        };
        let host_devices = match host.output_devices() {
            Ok(host_devices) => host_devices,
            Err(e) => {
                error!(
                    err = %e,
                    host = host_id.name(),
                    "Unable to list devices for host"
                );
                continue;
            }
        };

        for device in host_devices {
            let Ok(output_configs) = device.supported_output_configs() else {
                continue;
            };
            let max_channels = output_configs
                .map(|output_config| output_config.channels())
                .max()
                .unwrap_or(0);
            if max_channels == 0 {
                continue;
            }

            devices.push(DeviceInfo {
                name: device.name()?,
                max_channels,
                host_id,
            });
        }
    }

    devices.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(devices)
}

/// Finds the configured device, or the default output device when none is named.
fn find_device(name: Option<&str>) -> Result<cpal::Device, AudioError> {
    let _shh_stderr = shh::stderr()?;

    let Some(name) = name else {
        return cpal::default_host()
            .default_output_device()
            .ok_or_else(|| AudioError::NoDevice("default".to_string()));
    };

    for host_id in cpal::available_hosts() {
        let Ok(host) = cpal::host_from_id(host_id) else {
            continue;
        };
        let Ok(devices) = host.output_devices() else {
            continue;
        };
        for device in devices {
            if device.name().is_ok_and(|device_name| device_name.trim() == name) {
                return Ok(device);
            }
        }
    }

    Err(AudioError::NoDevice(name.to_string()))
}

/// Builds an output stream that renders the mixer straight into the device buffer.
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut mixer: Mixer,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let mut scratch: Vec<f32> = Vec::new();
    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            scratch.resize(data.len(), 0.0);
            mixer.render(&mut scratch);
            for (dst, src) in data.iter_mut().zip(scratch.iter()) {
                *dst = T::from_sample(*src);
            }
        },
        |err| error!("CPAL output stream error: {}", err),
        None,
    )
}

/// Opens the device and starts the stream. Must run on the thread that will own the stream.
fn open_stream(audio: &config::Audio, mixer: Mixer) -> Result<(cpal::Stream, String), AudioError> {
    let device = find_device(audio.device())?;
    let name = device.name()?;
    let sample_format = device.default_output_config()?.sample_format();

    let config = cpal::StreamConfig {
        channels: mixer.channels(),
        sample_rate: cpal::SampleRate(mixer.sample_rate()),
        buffer_size: cpal::BufferSize::Default,
    };

    let stream = match sample_format {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, mixer)?,
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, mixer)?,
        cpal::SampleFormat::I32 => build_stream::<i32>(&device, &config, mixer)?,
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, mixer)?,
        other => return Err(AudioError::UnsupportedFormat(format!("{:?}", other))),
    };
    stream.play()?;

    Ok((stream, name))
}

/// A running output stream fed by a [PlaybackScheduler].
///
/// cpal streams are not `Send`, so the stream is created and kept alive on its own thread.
/// Dropping the output stops the stream.
pub struct Output {
    /// Name of the device in use.
    device: String,
    /// Scheduler feeding the stream's mixer.
    scheduler: PlaybackScheduler,
    /// Dropping this stops the output thread.
    shutdown: Option<Sender<()>>,
    /// Handle to the output thread.
    output_thread: Option<thread::JoinHandle<()>>,
}

impl Output {
    /// Starts an output stream for the configured device.
    pub fn start(audio: &config::Audio) -> Result<Output, AudioError> {
        let (scheduler, mixer) =
            PlaybackScheduler::new(audio.channels(), audio.sample_rate(), audio.max_voices());
        let (ready_tx, ready_rx) = bounded::<Result<String, AudioError>>(1);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

        let audio = audio.clone();
        let output_thread = thread::spawn(move || {
            let span = span!(Level::INFO, "audio output");
            let _enter = span.enter();

            let stream = match open_stream(&audio, mixer) {
                Ok((stream, name)) => {
                    let _ = ready_tx.send(Ok(name));
                    stream
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            // Returns once the sender is dropped.
            let _ = shutdown_rx.recv();
            drop(stream);
            info!("Output stream stopped");
        });

        let device = match ready_rx.recv() {
            Ok(Ok(device)) => device,
            Ok(Err(e)) => {
                let _ = output_thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = output_thread.join();
                return Err(AudioError::StreamThread);
            }
        };

        info!(
            device = %device,
            channels = scheduler.channels(),
            sample_rate = scheduler.sample_rate(),
            "Output stream started"
        );

        Ok(Output {
            device,
            scheduler,
            shutdown: Some(shutdown_tx),
            output_thread: Some(output_thread),
        })
    }

    /// Returns a scheduler that plays through this output.
    pub fn scheduler(&self) -> PlaybackScheduler {
        self.scheduler.clone()
    }

    pub fn device(&self) -> &str {
        &self.device
    }
}

impl Drop for Output {
    fn drop(&mut self) {
        self.shutdown.take();
        if let Some(thread) = self.output_thread.take() {
            let _ = thread.join();
        }
    }
}
