//! Shared byte arena partitioned into per-track ring buffers.
//!
//! One fixed array holds every track's pending byte-code. Each track
//! owns a contiguous region of it, used as a circular buffer with
//! independent producer (`next_in`) and consumer (`next_out`) cursors,
//! so tracks cannot corrupt each other by construction.
//!
//! Cursor discipline for split producer/consumer contexts: `next_in`
//! is written only by `put`, `next_out` only by `get`. Maintenance
//! operations (`optimize`, `clear`) move both cursors and must only
//! run while neither side is active.

use blip_ir::{stream_len, StreamLen};
use heapless::Vec;

/// Backing storage for all track regions, in bytes.
pub const TRACK_ARENA_SIZE: usize = 192;

/// Number of PSG voices driven by the sequencer.
pub const MAX_TRACKS: usize = 3;

/// Error type for track buffer operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferError {
    /// The track's region has no free byte; the write was rejected.
    Full,
    /// Track index out of range.
    BadTrack,
    /// Capacity below one byte per track or above the backing array.
    BadCapacity,
}

/// One track's circular region within the shared arena.
#[derive(Clone, Copy, Debug)]
struct Region {
    /// First arena index owned by this track.
    start: usize,
    /// One past the last arena index owned by this track.
    end: usize,
    /// Write cursor, advanced only by `put`.
    next_in: usize,
    /// Read cursor, advanced only by `get`.
    next_out: usize,
    /// Bytes buffered and not yet read.
    ready: usize,
    /// Bytes read but retained for a repeat rewind.
    held: usize,
    /// Rewind target while a repeat hold is armed.
    hold_start: usize,
    /// Is a repeat hold armed?
    holding: bool,
}

impl Region {
    fn new(start: usize, end: usize) -> Self {
        Region {
            start,
            end,
            next_in: start,
            next_out: start,
            ready: 0,
            held: 0,
            hold_start: start,
            holding: false,
        }
    }

    fn len(&self) -> usize {
        self.end - self.start
    }

    fn free(&self) -> usize {
        self.len() - self.ready - self.held
    }

    fn step(&self, cursor: usize) -> usize {
        if cursor + 1 == self.end {
            self.start
        } else {
            cursor + 1
        }
    }
}

/// The shared arena and its per-track ring buffers.
pub struct TrackArena {
    data: [u8; TRACK_ARENA_SIZE],
    regions: Vec<Region, MAX_TRACKS>,
}

impl TrackArena {
    /// Partition `total` bytes of the arena evenly across all tracks.
    /// The remainder goes one byte at a time to the lowest tracks.
    pub fn new(total: usize) -> Result<Self, BufferError> {
        if total < MAX_TRACKS || total > TRACK_ARENA_SIZE {
            return Err(BufferError::BadCapacity);
        }
        let base = total / MAX_TRACKS;
        let extra = total % MAX_TRACKS;
        let mut regions = Vec::new();
        let mut at = 0;
        for t in 0..MAX_TRACKS {
            let len = base + usize::from(t < extra);
            regions.push(Region::new(at, at + len)).ok();
            at += len;
        }
        Ok(TrackArena { data: [0; TRACK_ARENA_SIZE], regions })
    }

    /// Append one byte to the track's region.
    pub fn put(&mut self, track: usize, byte: u8) -> Result<(), BufferError> {
        let r = self.regions.get_mut(track).ok_or(BufferError::BadTrack)?;
        if r.free() == 0 {
            return Err(BufferError::Full);
        }
        self.data[r.next_in] = byte;
        r.next_in = r.step(r.next_in);
        r.ready += 1;
        Ok(())
    }

    /// Pop one byte from the track's region.
    ///
    /// With `cmd_check` set, the read is deferred (`None`) unless the
    /// full event starting at the read cursor is buffered, per the
    /// shared arity table — a command is never half-consumed.
    pub fn get(&mut self, track: usize, cmd_check: bool) -> Option<u8> {
        if cmd_check {
            let need = self.pending_event_len(track)?;
            let r = self.regions.get(track)?;
            // An event larger than the whole region can never become
            // complete; let the read through and the decoder fails the
            // track instead of stalling it forever.
            if need <= r.len() && r.ready < need {
                return None;
            }
        }
        let r = self.regions.get_mut(track)?;
        if r.ready == 0 {
            return None;
        }
        let byte = self.data[r.next_out];
        r.next_out = r.step(r.next_out);
        r.ready -= 1;
        if r.holding {
            r.held += 1;
        }
        Some(byte)
    }

    /// Read a buffered byte without consuming it, `offset` bytes past
    /// the read cursor.
    pub fn peek(&self, track: usize, offset: usize) -> Option<u8> {
        let r = self.regions.get(track)?;
        if offset >= r.ready {
            return None;
        }
        let idx = r.start + (r.next_out - r.start + offset) % r.len();
        Some(self.data[idx])
    }

    /// Total bytes the pending event needs, from the arity table.
    /// `None` until enough bytes are buffered to tell.
    pub fn pending_event_len(&self, track: usize) -> Option<usize> {
        let first = self.peek(track, 0)?;
        match stream_len(first) {
            StreamLen::Fixed(n) => Some(n),
            StreamLen::LengthPrefixed => self.peek(track, 1).map(|n| 2 + n as usize),
        }
    }

    // === repeat hold ===

    /// Arm a repeat hold: bytes consumed from here on are retained
    /// instead of being handed back to the producer, so a rewind can
    /// never replay overwritten data.
    pub fn begin_hold(&mut self, track: usize) {
        if let Some(r) = self.regions.get_mut(track) {
            r.hold_start = r.next_out;
            r.held = 0;
            r.holding = true;
        }
    }

    /// Rewind the read cursor to the hold point, making the held bytes
    /// readable again. The hold stays armed.
    pub fn rewind_to_hold(&mut self, track: usize) {
        if let Some(r) = self.regions.get_mut(track) {
            if r.holding {
                r.next_out = r.hold_start;
                r.ready += r.held;
                r.held = 0;
            }
        }
    }

    /// Drop the hold, returning the held bytes to the producer.
    pub fn release_hold(&mut self, track: usize) {
        if let Some(r) = self.regions.get_mut(track) {
            r.held = 0;
            r.holding = false;
        }
    }

    // === diagnostics ===

    /// Bytes free for the producer in the track's region.
    pub fn free(&self, track: usize) -> Result<usize, BufferError> {
        self.regions.get(track).map(Region::free).ok_or(BufferError::BadTrack)
    }

    /// Bytes buffered and not yet read.
    pub fn ready(&self, track: usize) -> usize {
        self.regions.get(track).map_or(0, |r| r.ready)
    }

    /// The most free space any single track has.
    pub fn largest_free(&self) -> usize {
        self.regions.iter().map(Region::free).max().unwrap_or(0)
    }

    /// The least free space any single track has.
    pub fn smallest_free(&self) -> usize {
        self.regions.iter().map(Region::free).min().unwrap_or(0)
    }

    /// Free space summed over every track.
    pub fn total_free(&self) -> usize {
        self.regions.iter().map(Region::free).sum()
    }

    // === maintenance ===

    /// Empty one track's region, dropping any hold.
    pub fn clear(&mut self, track: usize) {
        if let Some(r) = self.regions.get_mut(track) {
            *r = Region::new(r.start, r.end);
        }
    }

    /// Empty every region.
    pub fn clear_all(&mut self) {
        for r in self.regions.iter_mut() {
            *r = Region::new(r.start, r.end);
        }
    }

    /// Slide each region's live bytes (held + unread) to the region
    /// start, preserving their order. Other tracks' regions are never
    /// touched. Callers must not run this concurrently with `put` or
    /// `get` on the same arena.
    pub fn optimize(&mut self) {
        let TrackArena { data, regions } = self;
        for r in regions.iter_mut() {
            let live_start = if r.holding { r.hold_start } else { r.next_out };
            data[r.start..r.end].rotate_left(live_start - r.start);
            let len = r.len();
            r.hold_start = r.start;
            r.next_out = r.start + r.held % len;
            r.next_in = r.start + (r.held + r.ready) % len;
        }
    }
}
