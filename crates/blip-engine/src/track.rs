//! Per-track playback state.

/// Playback status of one track.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrackStatus {
    /// Not started; no events pending.
    #[default]
    Idle,
    /// Actively consuming events.
    Playing,
    /// End of sequence reached.
    Complete,
    /// Interrupt command, external request, or malformed stream.
    Interrupted,
}

/// Read redirect while a track plays inside a substring.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SubstringCursor {
    /// Which substring is being played.
    pub id: u8,
    /// Next byte offset within it.
    pub pos: usize,
    /// Its total length, cached at redirect time.
    pub len: usize,
}

/// Runtime state for one track.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Track {
    pub status: TrackStatus,
    /// Earliest time the next event may fire (wrapping milliseconds).
    pub play_next_time: u32,
    /// Extra repeat passes remaining.
    pub repeat_count: u8,
    /// Is a repeat rewind point armed?
    pub repeat_armed: bool,
    /// Set while reads are redirected into a substring.
    pub substring: Option<SubstringCursor>,
    /// External interrupt request, honored on the next service tick.
    pub interrupt_requested: bool,
}

/// Wrapping `now >= target` comparison for a 32-bit millisecond clock.
pub(crate) fn time_reached(now: u32, target: u32) -> bool {
    now.wrapping_sub(target) < u32::MAX / 2
}
