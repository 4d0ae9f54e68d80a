//! Byte-code wire format for the blip sequencer.
//!
//! This crate defines the densely packed byte-code consumed by the
//! playback engine: note/rest events, command events, the per-opcode
//! arity table, and PLAY-command note lengths. Producers encode with
//! these types and the engine decodes with them, so the two sides of
//! the wire cannot disagree.
//!
//! Designed to be `no_std` compatible.

#![cfg_attr(not(feature = "std"), no_std)]

mod event;
mod note_length;
pub mod notes;
mod opcode;

pub use event::{DecodeError, Event, MAX_EVENT_HEADER};
pub use note_length::{whole_note_ms, NoteLength};
pub use opcode::{
    command_byte, stream_len, Opcode, StreamLen, CMD_BIT, CMD_OPCODE_MASK, CMD_VALUE_MASK,
    END_OF_SEQUENCE, PITCH_MASK,
};
