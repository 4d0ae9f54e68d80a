//! Real-time multi-track byte-code sequencer engine.
//!
//! A [`Sequencer`] drives up to three PSG voices from packed byte-code
//! streamed into per-track ring buffers. The host provides a
//! millisecond [`Clock`] and a [`SoundChip`] driver and calls
//! [`Sequencer::service`] periodically; every call does a bounded
//! amount of work and never allocates.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod arena;
pub mod sequencer;
pub mod substring;
pub mod track;
pub mod traits;

pub use arena::{BufferError, TrackArena, MAX_TRACKS, TRACK_ARENA_SIZE};
pub use sequencer::Sequencer;
pub use substring::{SubstringError, SubstringStore, MAX_SUBSTRINGS, SUBSTRING_ARENA_SIZE};
pub use track::TrackStatus;
pub use traits::{Clock, SoundChip};
