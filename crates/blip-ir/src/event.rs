//! Decoded byte-code events and the decode/encode pair.

use arrayvec::ArrayVec;

use crate::note_length::NoteLength;
use crate::opcode::{command_byte, Opcode, CMD_VALUE_MASK, PITCH_MASK};

/// Largest number of header bytes [`Event::encode`] can produce.
/// ADD_SUBSTRING payload bytes follow the header separately.
pub const MAX_EVENT_HEADER: usize = 2;

/// Error type for byte-code decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// The reserved opcode was encountered.
    ReservedOpcode,
    /// The event needs an argument byte that was not supplied.
    Truncated,
    /// A note carried a length byte outside the PLAY-command set.
    BadNoteLength,
}

/// A single decoded byte-code event.
///
/// ADD_SUBSTRING payload bytes are not carried here; the engine streams
/// them from the track buffer straight into the substring store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// Note or rest: pitches 0-126 sound, [`crate::notes::REST`] is silence.
    Note { pitch: u8, length: NoteLength },
    /// Set the track volume (0-15).
    Volume(u8),
    /// Arm a repeat of the phrase that follows; the value is the
    /// number of extra passes, 0 disarms.
    Repeat(u8),
    /// Stop this track, leaving buffered bytes unread.
    Interrupt,
    /// Begin storing substring `id`; `len` payload bytes follow.
    AddSubstring { id: u8, len: u8 },
    /// Remove substring `id`.
    DeleteSubstring(u8),
    /// Redirect playback into substring `id`.
    PlaySubstring(u8),
    /// End of the track's stream.
    EndOfSequence,
}

impl Event {
    /// Decode an event from its first byte plus the single argument
    /// byte the arity table calls for (`None` when it needs none).
    pub fn decode(first: u8, arg: Option<u8>) -> Result<Event, DecodeError> {
        match Opcode::from_byte(first) {
            None => {
                let raw = arg.ok_or(DecodeError::Truncated)?;
                let length = NoteLength::from_byte(raw).ok_or(DecodeError::BadNoteLength)?;
                Ok(Event::Note { pitch: first & PITCH_MASK, length })
            }
            Some(op) => {
                let value = first & CMD_VALUE_MASK;
                match op {
                    Opcode::Volume => Ok(Event::Volume(value)),
                    Opcode::Repeat => Ok(Event::Repeat(value)),
                    Opcode::Interrupt => Ok(Event::Interrupt),
                    Opcode::AddSubstring => {
                        let len = arg.ok_or(DecodeError::Truncated)?;
                        Ok(Event::AddSubstring { id: value, len })
                    }
                    Opcode::DeleteSubstring => Ok(Event::DeleteSubstring(value)),
                    Opcode::PlaySubstring => Ok(Event::PlaySubstring(value)),
                    Opcode::Reserved => Err(DecodeError::ReservedOpcode),
                    Opcode::EndSequence => Ok(Event::EndOfSequence),
                }
            }
        }
    }

    /// Encode the event's header bytes for a producer.
    pub fn encode(&self) -> ArrayVec<u8, MAX_EVENT_HEADER> {
        let mut out = ArrayVec::new();
        match *self {
            Event::Note { pitch, length } => {
                out.push(pitch & PITCH_MASK);
                out.push(length.as_byte());
            }
            Event::Volume(v) => out.push(command_byte(Opcode::Volume, v)),
            Event::Repeat(count) => out.push(command_byte(Opcode::Repeat, count)),
            Event::Interrupt => out.push(command_byte(Opcode::Interrupt, 0)),
            Event::AddSubstring { id, len } => {
                out.push(command_byte(Opcode::AddSubstring, id));
                out.push(len);
            }
            Event::DeleteSubstring(id) => out.push(command_byte(Opcode::DeleteSubstring, id)),
            Event::PlaySubstring(id) => out.push(command_byte(Opcode::PlaySubstring, id)),
            Event::EndOfSequence => out.push(command_byte(Opcode::EndSequence, 0x0F)),
        }
        out
    }
}
