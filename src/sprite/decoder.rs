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

use std::io::Cursor;
use std::time::Duration;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use tracing::debug;

use super::error::DecodeError;

/// A fully decoded waveform held in memory as interleaved f32 samples.
///
/// Never mutated after construction. Extraction copies out of it.
pub struct DecodedWaveform {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
    frames: usize,
}

impl DecodedWaveform {
    /// Creates a waveform from interleaved samples. A trailing partial frame is dropped.
    pub fn new(
        mut samples: Vec<f32>,
        channels: u16,
        sample_rate: u32,
    ) -> Result<DecodedWaveform, DecodeError> {
        if channels == 0 {
            return Err(DecodeError::InvalidFormat("zero channels".to_string()));
        }
        if sample_rate == 0 {
            return Err(DecodeError::InvalidFormat("zero sample rate".to_string()));
        }

        let frames = samples.len() / channels as usize;
        samples.truncate(frames * channels as usize);
        samples.shrink_to_fit();

        Ok(DecodedWaveform {
            samples,
            channels,
            sample_rate,
            frames,
        })
    }

    /// Decodes a complete audio file held in memory. The extension, if known, is used as a
    /// hint for format probing.
    pub fn decode(bytes: Vec<u8>, extension: Option<&str>) -> Result<DecodedWaveform, DecodeError> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = extension {
            hint.with_extension(extension);
        }

        let meta_opts: MetadataOptions = Default::default();
        let fmt_opts: FormatOptions = Default::default();
        let probed = get_probe()
            .format(&hint, mss, &fmt_opts, &meta_opts)
            .map_err(DecodeError::Probe)?;
        let mut format_reader = probed.format;

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(DecodeError::NoTrack)?;
        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or(DecodeError::MissingSampleRate)?;
        let mut channels = track
            .codec_params
            .channels
            .map(|c| c.count() as u16)
            .unwrap_or(0);

        let decoder_opts: DecoderOptions = Default::default();
        let mut decoder = get_codecs()
            .make(&track.codec_params, &decoder_opts)
            .map_err(DecodeError::Codec)?;

        let mut samples: Vec<f32> = Vec::new();
        loop {
            let packet = match format_reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                // Some readers report the end of the stream as a decode error.
                Err(SymphoniaError::DecodeError(_)) => break,
                Err(e) => return Err(DecodeError::Read(e)),
            };
            if packet.track_id() != track_id {
                continue;
            }

            // A dropped packet would shift every later offset in the sheet.
            let decoded = packet_result(decoder.decode(&packet))?;

            let spec = *decoded.spec();
            if channels == 0 {
                channels = spec.channels.count() as u16;
            }
            if decoded.frames() == 0 {
                continue;
            }
            let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            buffer.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buffer.samples());
        }

        if samples.is_empty() {
            return Err(DecodeError::Empty);
        }
        debug!(samples = samples.len(), channels, sample_rate, "Decoded waveform");

        DecodedWaveform::new(samples, channels, sample_rate)
    }

    /// Interleaved samples for the whole waveform.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of channels.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Total number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames as f64 / self.sample_rate as f64)
    }

    /// Interleaved samples for frames `start..end`. The caller guarantees the range is in bounds.
    pub(super) fn frame_range(&self, start: usize, end: usize) -> &[f32] {
        let channels = self.channels as usize;
        &self.samples[start * channels..end * channels]
    }
}

impl std::fmt::Debug for DecodedWaveform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedWaveform")
            .field("channels", &self.channels)
            .field("sample_rate", &self.sample_rate)
            .field("frames", &self.frames)
            .finish()
    }
}

/// Maps the result of decoding one packet. Any failure fails the whole decode.
fn packet_result<T>(result: Result<T, SymphoniaError>) -> Result<T, DecodeError> {
    result.map_err(DecodeError::Read)
}
