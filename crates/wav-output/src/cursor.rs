//! Playback cursor over the active sound.
//!
//! The cursor is the only state shared between the caller thread and the device
//! callback. The adapter keeps it behind a mutex so a new sound (or a stop) replaces
//! position and data together.

use std::sync::Arc;

use crate::mix::mix_s16_le;

/// Coarse playback state reported by [`PlaybackStatus`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing has been played since open.
    Idle,
    Playing,
    /// The active sound drained to the end.
    Finished,
    /// Playback was stopped by a `play(None)` request.
    Stopped,
}

/// Snapshot of the cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    pub remaining_bytes: usize,
    pub played_bytes: usize,
}

/// Result of one fill pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FillResult {
    /// Bytes mixed from the active sound.
    pub mixed: usize,
    /// `true` exactly once, on the pass that consumed the last byte.
    pub finished: bool,
}

#[derive(Debug)]
pub struct PlaybackCursor {
    data: Option<Arc<[u8]>>,
    pos: usize,
    state: PlaybackState,
}

impl Default for PlaybackCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackCursor {
    pub fn new() -> Self {
        Self {
            data: None,
            pos: 0,
            state: PlaybackState::Idle,
        }
    }

    /// Start playing `data` from the beginning, replacing any active sound.
    pub fn start(&mut self, data: Arc<[u8]>) {
        self.state = if data.is_empty() {
            PlaybackState::Finished
        } else {
            PlaybackState::Playing
        };
        self.data = Some(data);
        self.pos = 0;
    }

    /// Drop the active sound; subsequent fills are silent.
    pub fn stop(&mut self) {
        self.data = None;
        self.pos = 0;
        self.state = PlaybackState::Stopped;
    }

    /// Forget everything, as after a fresh open.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn remaining(&self) -> usize {
        self.data
            .as_ref()
            .map(|d| d.len().saturating_sub(self.pos))
            .unwrap_or(0)
    }

    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            state: self.state,
            remaining_bytes: self.remaining(),
            played_bytes: self.pos,
        }
    }

    /// Zero `out`, then mix up to `min(out.len(), remaining)` bytes of the active sound
    /// into it and advance.
    pub fn fill(&mut self, out: &mut [u8], volume: u8) -> FillResult {
        out.fill(0);

        let Some(data) = self.data.as_ref() else {
            return FillResult {
                mixed: 0,
                finished: false,
            };
        };
        let remaining = data.len().saturating_sub(self.pos);
        if remaining == 0 {
            return FillResult {
                mixed: 0,
                finished: false,
            };
        }

        let len = out.len().min(remaining);
        mix_s16_le(&mut out[..len], &data[self.pos..self.pos + len], volume);
        self.pos += len;

        let finished = self.pos >= data.len();
        if finished {
            self.state = PlaybackState::Finished;
        }
        FillResult {
            mixed: len,
            finished,
        }
    }
}
