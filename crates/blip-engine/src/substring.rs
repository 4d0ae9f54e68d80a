//! Named byte-code substrings, stored once and replayed by reference.
//!
//! Repeated note phrases are written to a secondary arena a single
//! time and played back through a 4-bit id, instead of being streamed
//! into a track buffer again and again. Space is bump-allocated;
//! deletions leave gaps that [`SubstringStore::optimize`] squeezes out.

/// Backing storage for substring byte-code, in bytes.
pub const SUBSTRING_ARENA_SIZE: usize = 128;

/// Substring ids are 4-bit, so at most 16 can be live at once.
pub const MAX_SUBSTRINGS: usize = 16;

/// Error type for substring operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubstringError {
    /// The id already names a live (or loading) substring.
    AlreadyLive,
    /// The id names no live substring.
    NotFound,
    /// Not enough space left in the substring arena.
    NoSpace,
    /// Id outside 0-15.
    BadId,
    /// A track is mid-playback of a substring; the operation was refused.
    Busy,
}

/// A committed substring's location in the arena.
#[derive(Clone, Copy, Debug)]
struct Descriptor {
    /// Offset of the first byte.
    start: usize,
    /// Byte length, cached so playback needs no end marker scan.
    len: usize,
}

/// Reception state while a substring's payload is arriving.
#[derive(Clone, Copy, Debug)]
struct Pending {
    id: u8,
    /// Where the payload is being appended.
    add_start: usize,
    /// Payload bytes expected.
    want: usize,
    /// Payload bytes received so far.
    got: usize,
}

/// Fixed-capacity table of named byte subsequences.
pub struct SubstringStore {
    data: [u8; SUBSTRING_ARENA_SIZE],
    /// Descriptors indexed by substring id.
    slots: [Option<Descriptor>; MAX_SUBSTRINGS],
    /// Bump allocation point; space below it may hold deleted gaps.
    top: usize,
    pending: Option<Pending>,
}

impl SubstringStore {
    /// Create an empty store.
    pub fn new() -> Self {
        SubstringStore {
            data: [0; SUBSTRING_ARENA_SIZE],
            slots: [None; MAX_SUBSTRINGS],
            top: 0,
            pending: None,
        }
    }

    /// Begin receiving `len` payload bytes for substring `id`.
    ///
    /// A zero-length substring commits immediately.
    pub fn begin_add(&mut self, id: u8, len: usize) -> Result<(), SubstringError> {
        let slot = self.slots.get(id as usize).ok_or(SubstringError::BadId)?;
        if self.pending.is_some() {
            return Err(SubstringError::Busy);
        }
        if slot.is_some() {
            return Err(SubstringError::AlreadyLive);
        }
        if len > SUBSTRING_ARENA_SIZE - self.top {
            return Err(SubstringError::NoSpace);
        }
        self.pending = Some(Pending { id, add_start: self.top, want: len, got: 0 });
        if len == 0 {
            self.commit();
        }
        Ok(())
    }

    /// Append one payload byte, committing the descriptor when the
    /// last expected byte arrives. Returns true once committed.
    pub fn push(&mut self, byte: u8) -> Result<bool, SubstringError> {
        let done = {
            let p = self.pending.as_mut().ok_or(SubstringError::NotFound)?;
            self.data[p.add_start + p.got] = byte;
            p.got += 1;
            p.got == p.want
        };
        if done {
            self.commit();
        }
        Ok(done)
    }

    /// Abandon an in-progress reception, freeing nothing.
    pub fn abort_add(&mut self) {
        self.pending = None;
    }

    fn commit(&mut self) {
        if let Some(p) = self.pending.take() {
            self.slots[p.id as usize] = Some(Descriptor { start: p.add_start, len: p.want });
            self.top = p.add_start + p.want;
        }
    }

    /// Delete substring `id`. Its bytes stay in place until the next
    /// [`SubstringStore::optimize`].
    pub fn delete(&mut self, id: u8) -> Result<(), SubstringError> {
        let slot = self.slots.get_mut(id as usize).ok_or(SubstringError::BadId)?;
        if slot.take().is_none() {
            return Err(SubstringError::NotFound);
        }
        Ok(())
    }

    /// Location of a live substring, as `(start, len)`.
    pub fn lookup(&self, id: u8) -> Option<(usize, usize)> {
        self.slots
            .get(id as usize)
            .copied()
            .flatten()
            .map(|d| (d.start, d.len))
    }

    /// Read one byte of a live substring.
    pub fn byte_at(&self, id: u8, offset: usize) -> Option<u8> {
        let (start, len) = self.lookup(id)?;
        if offset >= len {
            return None;
        }
        Some(self.data[start + offset])
    }

    /// The bytes of a live substring.
    pub fn bytes(&self, id: u8) -> Option<&[u8]> {
        let (start, len) = self.lookup(id)?;
        Some(&self.data[start..start + len])
    }

    /// Count of live substrings.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Bytes available for new substrings before compaction.
    pub fn free_space(&self) -> usize {
        SUBSTRING_ARENA_SIZE - self.top
    }

    /// Slide live substrings down over deleted gaps and rewrite their
    /// offsets. Callers must ensure no track is mid-playback of a
    /// substring, since every live offset may move.
    pub fn optimize(&mut self) {
        if self.pending.is_some() {
            return;
        }
        // Walk live descriptors in arena order so each slides into
        // space already vacated below it.
        let mut order = [0usize; MAX_SUBSTRINGS];
        let mut live = 0;
        for (id, slot) in self.slots.iter().enumerate() {
            if slot.is_some() {
                order[live] = id;
                live += 1;
            }
        }
        let slots = &self.slots;
        order[..live].sort_unstable_by_key(|&id| slots[id].map_or(0, |d| d.start));

        let mut at = 0;
        for &id in &order[..live] {
            if let Some(d) = self.slots[id] {
                if d.start != at {
                    self.data.copy_within(d.start..d.start + d.len, at);
                }
                self.slots[id] = Some(Descriptor { start: at, len: d.len });
                at += d.len;
            }
        }
        self.top = at;
    }
}

impl Default for SubstringStore {
    fn default() -> Self {
        SubstringStore::new()
    }
}
