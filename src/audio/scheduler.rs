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

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use crossbeam_channel::Sender;
use tracing::debug;

use crate::audio::mixer::{Mixer, Trigger};
use crate::sprite::Segment;

/// Hands segments to the mixer without blocking.
///
/// The scheduler is cheap to clone. Every clone feeds the same mixer.
#[derive(Clone)]
pub struct PlaybackScheduler {
    triggers: Sender<Trigger>,
    next_seq: Arc<AtomicU64>,
    channels: u16,
    sample_rate: u32,
}

impl PlaybackScheduler {
    /// Creates a scheduler and the mixer it feeds. The mixer should be moved to whatever
    /// renders audio.
    pub fn new(channels: u16, sample_rate: u32, max_voices: usize) -> (PlaybackScheduler, Mixer) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mixer = Mixer::new(channels, sample_rate, max_voices, rx);
        (
            PlaybackScheduler {
                triggers: tx,
                next_seq: Arc::new(AtomicU64::new(0)),
                channels: mixer.channels(),
                sample_rate,
            },
            mixer,
        )
    }

    /// Starts playing the segment at the given gain, which is clamped to [0.0, 1.0].
    ///
    /// The gain is baked into the segment here, so later volume changes leave this sound
    /// alone. Silent triggers are skipped.
    pub fn play(&self, mut segment: Segment, gain: f32) {
        let gain = if gain.is_nan() {
            0.0
        } else {
            gain.clamp(0.0, 1.0)
        };
        if gain == 0.0 || segment.frames() == 0 {
            return;
        }
        segment.apply_gain(gain);

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        if self.triggers.send(Trigger { seq, segment }).is_err() {
            debug!(seq, "Mixer is gone, dropping trigger");
        }
    }

    /// Output channel count of the mixer.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Output sample rate of the mixer.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn segment(value: f32, frames: usize) -> Segment {
        Segment::new(vec![value; frames], 1, 44100)
    }

    #[test]
    fn test_play_applies_gain() {
        let (scheduler, mut mixer) = PlaybackScheduler::new(1, 44100, 4);
        scheduler.play(segment(0.5, 4), 0.5);

        let mut out = vec![0.0; 4];
        mixer.render(&mut out);
        assert_eq!(out, vec![0.25; 4]);
    }

    #[test]
    fn test_play_clamps_gain() {
        let (scheduler, mut mixer) = PlaybackScheduler::new(1, 44100, 4);
        scheduler.play(segment(0.5, 2), 7.0);

        let mut out = vec![0.0; 2];
        mixer.render(&mut out);
        assert_eq!(out, vec![0.5; 2]);
    }

    #[test]
    fn test_play_skips_silent() {
        let (scheduler, mut mixer) = PlaybackScheduler::new(1, 44100, 4);
        scheduler.play(segment(0.5, 4), 0.0);
        scheduler.play(segment(0.5, 4), -1.0);
        scheduler.play(segment(0.5, 4), f32::NAN);
        scheduler.play(segment(0.5, 0), 1.0);

        let mut out = vec![0.0; 4];
        mixer.render(&mut out);
        assert_eq!(mixer.active_voices(), 0);
        assert!(out.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_play_without_mixer() {
        let (scheduler, mixer) = PlaybackScheduler::new(2, 48000, 4);
        drop(mixer);
        scheduler.play(segment(0.5, 4), 1.0);
        assert_eq!(scheduler.channels(), 2);
        assert_eq!(scheduler.sample_rate(), 48000);
    }

    #[test]
    fn test_rapid_typing_is_bounded_by_pool() {
        let (scheduler, mut mixer) = PlaybackScheduler::new(2, 44100, 32);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let scheduler = scheduler.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        scheduler.play(segment(0.01, 1000), 1.0);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut out = vec![0.0; 64];
        mixer.render(&mut out);
        assert_eq!(mixer.active_voices(), 32);
    }
}
