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

//! Voice allocation for polyphonic keystroke playback.
//!
//! Handles voice claiming, release and stealing.

use std::fmt;

use crate::sprite::Segment;

/// A segment being rendered in one voice slot.
pub struct Voice {
    /// Trigger sequence number. Lower numbers started earlier.
    seq: u64,
    /// The owned segment.
    segment: Segment,
    /// Next frame to render.
    position: usize,
}

impl Voice {
    /// Creates a new voice positioned at the start of the segment.
    pub fn new(seq: u64, segment: Segment) -> Voice {
        Voice {
            seq,
            segment,
            position: 0,
        }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Frames left to render.
    pub fn remaining(&self) -> usize {
        self.segment.frames().saturating_sub(self.position)
    }

    /// Returns true once the whole segment has been rendered.
    pub fn is_finished(&self) -> bool {
        self.remaining() == 0
    }

    /// Mixes up to `frames` frames into the interleaved `out` buffer, which has `channels`
    /// channels per frame. Output channel `c` reads segment channel `c % segment_channels`, so
    /// mono segments feed every output channel.
    pub fn render_into(&mut self, out: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }
        let source_channels = self.segment.channels().max(1) as usize;
        let frames = (out.len() / channels).min(self.remaining());
        let samples = self.segment.samples();

        for (frame, out_frame) in out.chunks_exact_mut(channels).take(frames).enumerate() {
            let base = (self.position + frame) * source_channels;
            for (channel, sample) in out_frame.iter_mut().enumerate() {
                *sample += samples[base + channel % source_channels];
            }
        }

        self.position += frames;
    }
}

/// The result of claiming a voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claim {
    /// The slot the new voice occupies.
    pub slot: usize,
    /// Sequence number of the voice that was cut off to make room, if any.
    pub stolen: Option<u64>,
}

/// A fixed number of voice slots.
pub struct VoicePool {
    voices: Vec<Option<Voice>>,
}

impl VoicePool {
    /// Creates a pool with the given number of slots. At least one slot is always allocated.
    pub fn new(max_voices: usize) -> VoicePool {
        VoicePool {
            voices: (0..max_voices.max(1)).map(|_| None).collect(),
        }
    }

    /// Places the voice in a free slot. When every slot is busy the least recently started
    /// voice is replaced and its sequence number reported.
    pub fn claim(&mut self, voice: Voice) -> Claim {
        if let Some(slot) = self.voices.iter().position(Option::is_none) {
            self.voices[slot] = Some(voice);
            return Claim { slot, stolen: None };
        }

        let (slot, stolen) = self
            .voices
            .iter()
            .enumerate()
            .filter_map(|(slot, voice)| voice.as_ref().map(|voice| (slot, voice.seq)))
            .min_by_key(|(_, seq)| *seq)
            .unwrap_or((0, 0));
        self.voices[slot] = Some(voice);
        Claim {
            slot,
            stolen: Some(stolen),
        }
    }

    /// Frees a slot.
    pub fn release(&mut self, slot: usize) {
        if let Some(voice) = self.voices.get_mut(slot) {
            *voice = None;
        }
    }

    /// Returns the current number of busy slots.
    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|voice| voice.is_some()).count()
    }

    pub fn capacity(&self) -> usize {
        self.voices.len()
    }

    /// Sequence number of the voice in the given slot.
    pub fn seq(&self, slot: usize) -> Option<u64> {
        self.voices.get(slot)?.as_ref().map(Voice::seq)
    }

    /// Renders every active voice into `out` and releases the ones that finish.
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        for slot in self.voices.iter_mut() {
            let finished = match slot {
                Some(voice) => {
                    voice.render_into(out, channels);
                    voice.is_finished()
                }
                None => false,
            };
            if finished {
                *slot = None;
            }
        }
    }
}

impl fmt::Debug for VoicePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoicePool")
            .field("active_voices", &self.active_count())
            .field("max_voices", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_voice(seq: u64, frames: usize) -> Voice {
        Voice::new(seq, Segment::new(vec![0.5; frames], 1, 44100))
    }

    #[test]
    fn test_claim_free_slots() {
        let mut pool = VoicePool::new(3);
        for seq in 1..=3 {
            let claim = pool.claim(make_voice(seq, 10));
            assert_eq!(claim.slot, seq as usize - 1);
            assert_eq!(claim.stolen, None);
        }
        assert_eq!(pool.active_count(), 3);
    }

    #[test]
    fn test_claim_steals_oldest() {
        let mut pool = VoicePool::new(3);
        for seq in 1..=3 {
            pool.claim(make_voice(seq, 10));
        }

        let claim = pool.claim(make_voice(4, 10));
        assert_eq!(claim, Claim { slot: 0, stolen: Some(1) });
        assert_eq!(pool.active_count(), 3);

        let claim = pool.claim(make_voice(5, 10));
        assert_eq!(claim, Claim { slot: 1, stolen: Some(2) });
        assert_eq!(pool.seq(0), Some(4));
        assert_eq!(pool.seq(1), Some(5));
        assert_eq!(pool.seq(2), Some(3));
    }

    #[test]
    fn test_claim_reuses_released_slot() {
        let mut pool = VoicePool::new(2);
        pool.claim(make_voice(1, 10));
        pool.claim(make_voice(2, 10));
        pool.release(0);
        assert_eq!(pool.active_count(), 1);

        let claim = pool.claim(make_voice(3, 10));
        assert_eq!(claim, Claim { slot: 0, stolen: None });

        // Out of range releases are ignored.
        pool.release(10);
        assert_eq!(pool.active_count(), 2);
    }

    #[test]
    fn test_zero_capacity_has_one_slot() {
        let mut pool = VoicePool::new(0);
        assert_eq!(pool.capacity(), 1);
        pool.claim(make_voice(1, 10));
        let claim = pool.claim(make_voice(2, 10));
        assert_eq!(claim, Claim { slot: 0, stolen: Some(1) });
    }

    #[test]
    fn test_render_releases_finished() {
        let mut pool = VoicePool::new(4);
        pool.claim(make_voice(1, 4));
        pool.claim(make_voice(2, 10));

        let mut out = vec![0.0; 8];
        pool.render(&mut out, 2);
        // Both voices are mono and feed both output channels.
        assert_eq!(out, vec![1.0; 8]);
        assert_eq!(pool.active_count(), 1);
        assert_eq!(pool.seq(0), None);
        assert_eq!(pool.seq(1), Some(2));
    }

    #[test]
    fn test_render_channel_mapping() {
        let segment = Segment::new(vec![0.1, 0.2, 0.3, 0.4], 2, 44100);
        let mut voice = Voice::new(1, segment);

        // Four output channels read segment channels 0, 1, 0, 1.
        let mut out = vec![0.0; 8];
        voice.render_into(&mut out, 4);
        assert_eq!(out, vec![0.1, 0.2, 0.1, 0.2, 0.3, 0.4, 0.3, 0.4]);
        assert!(voice.is_finished());
    }

    #[test]
    fn test_render_partial() {
        let mut voice = make_voice(1, 5);
        let mut out = vec![0.0; 3];
        voice.render_into(&mut out, 1);
        assert_eq!(voice.remaining(), 2);

        let mut out = vec![0.0; 3];
        voice.render_into(&mut out, 1);
        assert_eq!(out, vec![0.5, 0.5, 0.0]);
        assert!(voice.is_finished());
    }
}
