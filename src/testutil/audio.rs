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

use std::{fs, io::Cursor, path::Path};

use hound::{SampleFormat, WavSpec, WavWriter};

/// A deterministic saw wave in [-1.0, 1.0). Every sample is exactly representable in both
/// f32 and 16 bit WAV files.
pub fn ramp(len: usize) -> Vec<f32> {
    (0..len).map(|i| (i % 256) as f32 / 128.0 - 1.0).collect()
}

/// Encodes interleaved samples as a 32 bit float WAV file.
pub fn wav_bytes_f32(samples: &[f32], channels: u16, sample_rate: u32) -> Vec<u8> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
        for sample in samples {
            writer.write_sample(*sample).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Encodes interleaved samples as a 16 bit integer WAV file.
pub fn wav_bytes_i16(samples: &[i16], channels: u16, sample_rate: u32) -> Vec<u8> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
        for sample in samples {
            writer.write_sample(*sample).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Writes a mono profile folder: a `sound.wav` of `frames` ramp samples and a `config.json`
/// with the given name and `defines` object.
pub fn write_profile(folder: &Path, name: &str, defines: &str, frames: usize, sample_rate: u32) {
    fs::create_dir_all(folder).unwrap();
    fs::write(
        folder.join("sound.wav"),
        wav_bytes_f32(&ramp(frames), 1, sample_rate),
    )
    .unwrap();
    fs::write(
        folder.join("config.json"),
        format!(r#"{{"name": "{}", "defines": {}}}"#, name, defines),
    )
    .unwrap();
}
