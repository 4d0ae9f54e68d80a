//! PLAY-command note lengths.
//!
//! A length byte names a power-of-two divisor of a whole note
//! (1 = whole, 2 = half, 4 = quarter, ... 128). A dotted length adds
//! half the base duration and is stored as the base divisor plus the
//! next divisor up, e.g. dotted quarter = 4 + 8 = 12.

/// A validated note-length byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoteLength(u8);

impl NoteLength {
    /// Whole note.
    pub const L1: NoteLength = NoteLength(1);
    /// Half note.
    pub const L2: NoteLength = NoteLength(2);
    /// Quarter note.
    pub const L4: NoteLength = NoteLength(4);
    /// Eighth note.
    pub const L8: NoteLength = NoteLength(8);
    /// Sixteenth note.
    pub const L16: NoteLength = NoteLength(16);
    /// Thirty-second note.
    pub const L32: NoteLength = NoteLength(32);
    /// Sixty-fourth note.
    pub const L64: NoteLength = NoteLength(64);
    /// 128th note.
    pub const L128: NoteLength = NoteLength(128);

    /// Dotted whole note (whole + half).
    pub const L1_DOTTED: NoteLength = NoteLength(3);
    /// Dotted half note.
    pub const L2_DOTTED: NoteLength = NoteLength(6);
    /// Dotted quarter note.
    pub const L4_DOTTED: NoteLength = NoteLength(12);
    /// Dotted eighth note.
    pub const L8_DOTTED: NoteLength = NoteLength(24);
    /// Dotted sixteenth note.
    pub const L16_DOTTED: NoteLength = NoteLength(48);
    /// Dotted thirty-second note.
    pub const L32_DOTTED: NoteLength = NoteLength(96);

    /// Validate a raw length byte.
    ///
    /// Accepts the power-of-two divisors 1..=128 and the dotted values
    /// 3, 6, 12, 24, 48, 96. Everything else is rejected.
    pub fn from_byte(byte: u8) -> Option<NoteLength> {
        if byte == 0 {
            return None;
        }
        if byte.is_power_of_two() {
            return Some(NoteLength(byte));
        }
        if byte % 3 == 0 && (byte / 3).is_power_of_two() && byte / 3 <= 32 {
            return Some(NoteLength(byte));
        }
        None
    }

    /// The raw wire byte.
    pub const fn as_byte(self) -> u8 {
        self.0
    }

    /// True for the dotted variants.
    pub fn is_dotted(self) -> bool {
        self.0 % 3 == 0
    }

    /// Duration in milliseconds given the tempo base (milliseconds per
    /// whole note).
    pub fn duration_ms(self, whole_note_ms: u32) -> u32 {
        if self.is_dotted() {
            let base = (self.0 / 3) as u32;
            whole_note_ms / base + whole_note_ms / (base * 2)
        } else {
            whole_note_ms / self.0 as u32
        }
    }
}

/// Milliseconds per whole note at the given beats-per-minute, with a
/// beat being a quarter note.
pub fn whole_note_ms(bpm: u16) -> u32 {
    240_000 / bpm.max(1) as u32
}
