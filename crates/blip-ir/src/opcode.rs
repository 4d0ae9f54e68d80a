//! First-byte classification and the per-opcode arity table.
//!
//! A byte with the high bit clear is a note/rest event; with the high
//! bit set, bits 6-4 select an opcode and bits 3-0 carry an inline
//! 4-bit value. The arity table here is the single source of truth for
//! how many bytes an event occupies, shared by the decoder and the
//! ring buffer's command-completeness check.

/// High bit distinguishing a command byte from a note/rest byte.
pub const CMD_BIT: u8 = 0b1000_0000;

/// Bits 6-4 of a command byte select the opcode.
pub const CMD_OPCODE_MASK: u8 = 0b0111_0000;

/// Bits 3-0 of a command byte carry the inline 4-bit value.
pub const CMD_VALUE_MASK: u8 = 0b0000_1111;

/// Low 7 bits of a note byte hold the pitch index.
pub const PITCH_MASK: u8 = 0b0111_1111;

/// Canonical end-of-sequence byte.
pub const END_OF_SEQUENCE: u8 = 0xFF;

/// Command opcodes, taken from bits 6-4 of a command byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    /// Set track volume from the inline value.
    Volume = 0,
    /// Arm a repeat, inline value = extra passes.
    Repeat = 1,
    /// Interrupt this track.
    Interrupt = 2,
    /// Store a substring, inline value = id, length-prefixed payload follows.
    AddSubstring = 3,
    /// Delete substring, inline value = id.
    DeleteSubstring = 4,
    /// Redirect playback into substring, inline value = id.
    PlaySubstring = 5,
    /// Unassigned; decoding it is an error.
    Reserved = 6,
    /// End of the track's stream.
    EndSequence = 7,
}

impl Opcode {
    /// Extract the opcode from a command byte.
    /// Returns `None` for a note/rest byte.
    pub fn from_byte(byte: u8) -> Option<Opcode> {
        if byte & CMD_BIT == 0 {
            return None;
        }
        Some(match (byte & CMD_OPCODE_MASK) >> 4 {
            0 => Opcode::Volume,
            1 => Opcode::Repeat,
            2 => Opcode::Interrupt,
            3 => Opcode::AddSubstring,
            4 => Opcode::DeleteSubstring,
            5 => Opcode::PlaySubstring,
            6 => Opcode::Reserved,
            _ => Opcode::EndSequence,
        })
    }
}

/// Build a command byte from an opcode and its inline 4-bit value.
pub fn command_byte(op: Opcode, value: u8) -> u8 {
    CMD_BIT | ((op as u8) << 4) | (value & CMD_VALUE_MASK)
}

/// Number of bytes an event occupies in the stream, derived from its
/// first byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamLen {
    /// The event is exactly this many bytes, first byte included.
    Fixed(usize),
    /// The second byte is a payload count; total = 2 + payload.
    LengthPrefixed,
}

/// The arity table.
///
/// A note/rest byte is followed by one note-length byte. ADD_SUBSTRING
/// is followed by a payload-count byte and that many payload bytes.
/// Every other command is a single byte.
pub fn stream_len(first: u8) -> StreamLen {
    match Opcode::from_byte(first) {
        None => StreamLen::Fixed(2),
        Some(Opcode::AddSubstring) => StreamLen::LengthPrefixed,
        Some(_) => StreamLen::Fixed(1),
    }
}
