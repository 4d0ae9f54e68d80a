//! External collaborator interfaces: the sound device and the clock.

/// Driver for a programmable sound generator voice bank.
///
/// Calls are assumed synchronous and non-blocking; the service routine
/// invokes them from its realtime path.
pub trait SoundChip {
    /// Sound `pitch` on `track`'s voice. [`blip_ir::notes::REST`] asks
    /// for silence.
    fn play_note(&mut self, track: u8, pitch: u8);

    /// Set `track`'s voice level (0-15).
    fn set_volume(&mut self, track: u8, level: u8);
}

/// Monotonic millisecond time source. The value may wrap around
/// `u32::MAX`; the engine compares times with wrapping arithmetic.
pub trait Clock {
    fn now(&self) -> u32;
}
