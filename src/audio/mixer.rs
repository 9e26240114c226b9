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

// Mixing of keystroke voices into an output buffer. The mixer lives on the audio callback
// thread and receives triggers over a channel, so nothing here blocks or locks.
use crossbeam_channel::Receiver;
use tracing::debug;

use crate::audio::voice::{Voice, VoicePool};
use crate::sprite::Segment;

/// A request to start playing a segment.
pub(crate) struct Trigger {
    pub(crate) seq: u64,
    pub(crate) segment: Segment,
}

/// Owns the voice pool and renders it on demand.
pub struct Mixer {
    /// Number of output channels.
    channels: u16,
    /// Output sample rate.
    sample_rate: u32,
    /// Active voices.
    pool: VoicePool,
    /// Incoming triggers from the scheduler.
    triggers: Receiver<Trigger>,
}

impl Mixer {
    pub(crate) fn new(
        channels: u16,
        sample_rate: u32,
        max_voices: usize,
        triggers: Receiver<Trigger>,
    ) -> Mixer {
        Mixer {
            channels: channels.max(1),
            sample_rate,
            pool: VoicePool::new(max_voices),
            triggers,
        }
    }

    /// Fills the interleaved `out` buffer with the next block of audio.
    ///
    /// Pending triggers are started first, then every voice is mixed in. Voices that reach the
    /// end of their segment release their slot. The mix is hard clipped to [-1.0, 1.0].
    pub fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);

        while let Ok(trigger) = self.triggers.try_recv() {
            let claim = self.pool.claim(Voice::new(trigger.seq, trigger.segment));
            if let Some(stolen) = claim.stolen {
                debug!(
                    slot = claim.slot,
                    stolen,
                    max_voices = self.pool.capacity(),
                    "Voice limit reached, stealing oldest"
                );
            }
        }

        self.pool.render(out, self.channels as usize);
        out.iter_mut()
            .for_each(|sample| *sample = sample.clamp(-1.0, 1.0));
    }

    /// Returns the number of voices currently playing.
    pub fn active_voices(&self) -> usize {
        self.pool.active_count()
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
