//! The playback scheduler: per-track state machines driven by a
//! periodic service call.
//!
//! `Sequencer` owns the track buffer arena, the substring store and
//! the per-track runtime state. A host calls [`Sequencer::service`]
//! once per tick; each call does a bounded amount of work — at most
//! one decoded event per track — and never blocks.

use blip_ir::{stream_len, whole_note_ms, Event, NoteLength, StreamLen, PITCH_MASK};

use crate::arena::{BufferError, TrackArena, MAX_TRACKS};
use crate::substring::{SubstringError, SubstringStore};
use crate::track::{time_reached, SubstringCursor, Track, TrackStatus};
use crate::traits::{Clock, SoundChip};

/// Outcome of trying to read one event for a track.
enum Fetch {
    /// Nothing buffered yet; retry next tick.
    NoData,
    /// Undecodable or truncated stream; the track must fail.
    Malformed,
    /// A complete event was consumed.
    Got(Event),
}

/// A complete multi-track sequencer instance.
///
/// All storage is owned inline; construction never allocates and the
/// instance can live in a `static`.
pub struct Sequencer {
    arena: TrackArena,
    substrings: SubstringStore,
    tracks: heapless::Vec<Track, MAX_TRACKS>,
    /// Tempo base: milliseconds per whole note.
    whole_note_ms: u32,
}

impl Sequencer {
    /// Create a sequencer with `total_capacity` bytes of track buffer
    /// split across all tracks, at the given tempo.
    pub fn new(total_capacity: usize, tempo_bpm: u16) -> Result<Self, BufferError> {
        let arena = TrackArena::new(total_capacity)?;
        let mut tracks = heapless::Vec::new();
        for _ in 0..MAX_TRACKS {
            tracks.push(Track::default()).ok();
        }
        Ok(Sequencer {
            arena,
            substrings: SubstringStore::new(),
            tracks,
            whole_note_ms: whole_note_ms(tempo_bpm),
        })
    }

    /// Change the tempo. Applies to notes decoded from here on.
    pub fn set_tempo(&mut self, tempo_bpm: u16) {
        self.whole_note_ms = whole_note_ms(tempo_bpm);
    }

    // === producer side ===

    /// Append one raw byte-code byte to a track's buffer.
    pub fn put(&mut self, track: usize, byte: u8) -> Result<(), BufferError> {
        self.arena.put(track, byte)
    }

    /// Append a two-byte note event atomically: rejected whole when
    /// fewer than two bytes are free.
    pub fn put_note(
        &mut self,
        track: usize,
        pitch: u8,
        length: NoteLength,
    ) -> Result<(), BufferError> {
        if self.arena.free(track)? < 2 {
            return Err(BufferError::Full);
        }
        self.arena.put(track, pitch & PITCH_MASK)?;
        self.arena.put(track, length.as_byte())
    }

    /// Append an encoded event's header bytes atomically.
    pub fn put_event(&mut self, track: usize, event: &Event) -> Result<(), BufferError> {
        let bytes = event.encode();
        if self.arena.free(track)? < bytes.len() {
            return Err(BufferError::Full);
        }
        for &b in &bytes {
            self.arena.put(track, b)?;
        }
        Ok(())
    }

    // === transport ===

    /// Start playback on every track that has buffered byte-code.
    /// Complete or interrupted tracks restart from their current
    /// buffer contents; empty tracks stay idle.
    pub fn start<C: Clock>(&mut self, clock: &C) {
        let now = clock.now();
        for (t, track) in self.tracks.iter_mut().enumerate() {
            if track.status == TrackStatus::Playing {
                continue;
            }
            if self.arena.ready(t) == 0 {
                continue;
            }
            self.arena.release_hold(t);
            *track = Track {
                status: TrackStatus::Playing,
                play_next_time: now,
                ..Track::default()
            };
        }
    }

    /// Stop all playback and empty every track buffer.
    pub fn stop(&mut self) {
        self.arena.clear_all();
        for track in self.tracks.iter_mut() {
            *track = Track::default();
        }
    }

    /// Request an interrupt of one track. Takes effect on the next
    /// service tick, not immediately.
    pub fn interrupt(&mut self, track: usize) {
        if let Some(tr) = self.tracks.get_mut(track) {
            tr.interrupt_requested = true;
        }
    }

    /// Empty one track's buffer and return it to idle.
    pub fn clear_track(&mut self, track: usize) {
        self.arena.clear(track);
        if let Some(tr) = self.tracks.get_mut(track) {
            *tr = Track::default();
        }
    }

    // === diagnostics ===

    /// True while any track is playing.
    pub fn is_playing(&self) -> bool {
        self.tracks.iter().any(|t| t.status == TrackStatus::Playing)
    }

    /// One track's status.
    pub fn track_status(&self, track: usize) -> Option<TrackStatus> {
        self.tracks.get(track).map(|t| t.status)
    }

    /// Bytes a producer can still write to one track.
    pub fn buffer_available(&self, track: usize) -> usize {
        self.arena.free(track).unwrap_or(0)
    }

    /// Free buffer bytes summed over every track.
    pub fn total_buffer_available(&self) -> usize {
        self.arena.total_free()
    }

    /// The most free space any single track buffer has.
    pub fn largest_free_buffer(&self) -> usize {
        self.arena.largest_free()
    }

    /// The least free space any single track buffer has.
    pub fn smallest_free_buffer(&self) -> usize {
        self.arena.smallest_free()
    }

    /// Count of live substrings.
    pub fn substring_count(&self) -> usize {
        self.substrings.live_count()
    }

    /// Bytes available for new substrings before compaction.
    pub fn substring_space(&self) -> usize {
        self.substrings.free_space()
    }

    // === maintenance ===

    /// Compact every track buffer. Callers must not run this while a
    /// producer or the service routine may touch the arena.
    pub fn optimize_buffers(&mut self) {
        self.arena.optimize();
    }

    /// Compact the substring arena. Refused while any track is playing
    /// inside a substring, since live offsets would move under it.
    pub fn optimize_substrings(&mut self) -> Result<(), SubstringError> {
        if self.tracks.iter().any(|t| t.substring.is_some()) {
            return Err(SubstringError::Busy);
        }
        self.substrings.optimize();
        Ok(())
    }

    // === service ===

    /// The periodic handler. Consumes at most one due event per track.
    /// Returns true while any track is still playing.
    pub fn service<C: Clock, S: SoundChip>(&mut self, clock: &C, chip: &mut S) -> bool {
        let now = clock.now();
        for t in 0..MAX_TRACKS {
            self.service_track(t, now, chip);
        }
        self.is_playing()
    }

    fn service_track<S: SoundChip>(&mut self, t: usize, now: u32, chip: &mut S) {
        {
            let track = match self.tracks.get_mut(t) {
                Some(tr) => tr,
                None => return,
            };
            if track.interrupt_requested {
                track.interrupt_requested = false;
                if track.status == TrackStatus::Playing {
                    track.status = TrackStatus::Interrupted;
                    track.substring = None;
                    return;
                }
            }
            if track.status != TrackStatus::Playing {
                return;
            }
            if !time_reached(now, track.play_next_time) {
                return;
            }
        }
        match self.next_event(t) {
            // a producer may still be filling the buffer; not an error
            Fetch::NoData => {}
            Fetch::Malformed => self.interrupt_track(t),
            Fetch::Got(ev) => self.apply_event(t, ev, now, chip),
        }
    }

    /// Read the next event from the track buffer, or from the
    /// substring the track is redirected into.
    fn next_event(&mut self, t: usize) -> Fetch {
        let cursor = self.tracks.get(t).and_then(|tr| tr.substring);
        if let Some(cur) = cursor {
            if cur.pos < cur.len {
                return self.next_substring_event(t, cur);
            }
            // substring exhausted: restore the saved track position
            if let Some(tr) = self.tracks.get_mut(t) {
                tr.substring = None;
            }
        }
        self.next_buffer_event(t)
    }

    fn next_substring_event(&mut self, t: usize, cur: SubstringCursor) -> Fetch {
        let first = match self.substrings.byte_at(cur.id, cur.pos) {
            Some(b) => b,
            // deleted out from under the redirect
            None => return Fetch::Malformed,
        };
        let need = match stream_len(first) {
            StreamLen::Fixed(n) => n,
            // substrings cannot carry nested ADD_SUBSTRING payloads
            StreamLen::LengthPrefixed => return Fetch::Malformed,
        };
        if cur.pos + need > cur.len {
            return Fetch::Malformed;
        }
        let arg = if need > 1 {
            self.substrings.byte_at(cur.id, cur.pos + 1)
        } else {
            None
        };
        let ev = match Event::decode(first, arg) {
            Ok(ev) => ev,
            Err(_) => return Fetch::Malformed,
        };
        match ev {
            // redirect depth is 1, and a repeat's rewind target would
            // be ambiguous inside a substring
            Event::PlaySubstring(_) | Event::Repeat(_) => return Fetch::Malformed,
            _ => {}
        }
        if let Some(c) = self.tracks.get_mut(t).and_then(|tr| tr.substring.as_mut()) {
            c.pos += need;
        }
        Fetch::Got(ev)
    }

    fn next_buffer_event(&mut self, t: usize) -> Fetch {
        let first = match self.arena.get(t, true) {
            Some(b) => b,
            None => return Fetch::NoData,
        };
        let arg = match stream_len(first) {
            StreamLen::Fixed(1) => None,
            _ => self.arena.get(t, false),
        };
        match Event::decode(first, arg) {
            Ok(ev) => Fetch::Got(ev),
            Err(_) => Fetch::Malformed,
        }
    }

    fn apply_event<S: SoundChip>(&mut self, t: usize, ev: Event, now: u32, chip: &mut S) {
        match ev {
            Event::Note { pitch, length } => {
                chip.play_note(t as u8, pitch);
                let dur = length.duration_ms(self.whole_note_ms);
                if let Some(tr) = self.tracks.get_mut(t) {
                    tr.play_next_time = now.wrapping_add(dur);
                }
            }
            Event::Volume(level) => chip.set_volume(t as u8, level),
            Event::Repeat(count) => self.arm_repeat(t, count),
            Event::Interrupt => self.interrupt_track(t),
            Event::AddSubstring { id, len } => self.receive_substring(t, id, len),
            Event::DeleteSubstring(id) => {
                let inside = self
                    .tracks
                    .get(t)
                    .and_then(|tr| tr.substring)
                    .map_or(false, |c| c.id == id);
                if inside || self.substrings.delete(id).is_err() {
                    self.interrupt_track(t);
                }
            }
            Event::PlaySubstring(id) => match self.substrings.lookup(id) {
                Some((_, len)) => {
                    if let Some(tr) = self.tracks.get_mut(t) {
                        tr.substring = Some(SubstringCursor { id, pos: 0, len });
                    }
                }
                None => self.interrupt_track(t),
            },
            Event::EndOfSequence => self.end_of_sequence(t),
        }
    }

    fn arm_repeat(&mut self, t: usize, count: u8) {
        if count == 0 {
            self.arena.release_hold(t);
            if let Some(tr) = self.tracks.get_mut(t) {
                tr.repeat_armed = false;
                tr.repeat_count = 0;
            }
        } else {
            self.arena.begin_hold(t);
            if let Some(tr) = self.tracks.get_mut(t) {
                tr.repeat_armed = true;
                tr.repeat_count = count;
            }
        }
    }

    fn end_of_sequence(&mut self, t: usize) {
        let rewind = match self.tracks.get_mut(t) {
            Some(tr) => {
                tr.substring = None;
                if tr.repeat_count > 0 {
                    tr.repeat_count -= 1;
                    true
                } else {
                    tr.repeat_armed = false;
                    tr.status = TrackStatus::Complete;
                    false
                }
            }
            None => return,
        };
        if rewind {
            self.arena.rewind_to_hold(t);
        } else {
            self.arena.release_hold(t);
        }
    }

    /// Stream an ADD_SUBSTRING payload out of the track buffer into
    /// the store. The command check guaranteed the payload is buffered.
    fn receive_substring(&mut self, t: usize, id: u8, len: u8) {
        if self.substrings.begin_add(id, len as usize).is_err() {
            self.interrupt_track(t);
            return;
        }
        for _ in 0..len {
            let byte = match self.arena.get(t, false) {
                Some(b) => b,
                None => {
                    self.substrings.abort_add();
                    self.interrupt_track(t);
                    return;
                }
            };
            if self.substrings.push(byte).is_err() {
                self.interrupt_track(t);
                return;
            }
        }
    }

    /// Force a track to Interrupted, abandoning any substring redirect.
    /// Buffered bytes stay unread.
    fn interrupt_track(&mut self, t: usize) {
        if let Some(tr) = self.tracks.get_mut(t) {
            tr.status = TrackStatus::Interrupted;
            tr.substring = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blip_ir::notes::{NC4, NE4, NG4, REST};
    use blip_ir::{command_byte, Opcode, END_OF_SEQUENCE};
    use core::cell::Cell;

    struct TestChip {
        notes: Vec<(u8, u8)>,
        volumes: Vec<(u8, u8)>,
    }

    impl TestChip {
        fn new() -> Self {
            TestChip { notes: Vec::new(), volumes: Vec::new() }
        }
    }

    impl SoundChip for TestChip {
        fn play_note(&mut self, track: u8, pitch: u8) {
            self.notes.push((track, pitch));
        }

        fn set_volume(&mut self, track: u8, level: u8) {
            self.volumes.push((track, level));
        }
    }

    struct TestClock(Cell<u32>);

    impl TestClock {
        fn new() -> Self {
            TestClock(Cell::new(0))
        }

        fn starting_at(ms: u32) -> Self {
            TestClock(Cell::new(ms))
        }

        fn advance(&self, ms: u32) {
            self.0.set(self.0.get().wrapping_add(ms));
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> u32 {
            self.0.get()
        }
    }

    /// 10 bytes per track, whole note = 1000ms (quarter = 250ms).
    fn test_seq() -> Sequencer {
        Sequencer::new(30, 240).unwrap()
    }

    fn put_all(seq: &mut Sequencer, track: usize, bytes: &[u8]) {
        for &b in bytes {
            seq.put(track, b).unwrap();
        }
    }

    /// Service once per simulated millisecond.
    fn run(seq: &mut Sequencer, clock: &TestClock, chip: &mut TestChip, ms: u32) {
        for _ in 0..ms {
            seq.service(clock, chip);
            clock.advance(1);
        }
    }

    // === timing ===

    #[test]
    fn note_plays_then_gate_holds_until_duration_elapses() {
        let mut seq = test_seq();
        let clock = TestClock::new();
        let mut chip = TestChip::new();
        seq.put_note(0, NC4, NoteLength::L4).unwrap();
        put_all(&mut seq, 0, &[END_OF_SEQUENCE]);
        seq.start(&clock);

        seq.service(&clock, &mut chip);
        assert_eq!(chip.notes, vec![(0, NC4)]);

        clock.advance(249);
        seq.service(&clock, &mut chip);
        assert_eq!(seq.track_status(0), Some(TrackStatus::Playing));

        clock.advance(1); // quarter note elapsed
        seq.service(&clock, &mut chip);
        assert_eq!(seq.track_status(0), Some(TrackStatus::Complete));
    }

    #[test]
    fn note_rest_end_sequence_completes_with_exactly_two_events() {
        let mut seq = test_seq();
        let clock = TestClock::new();
        let mut chip = TestChip::new();
        seq.put_note(0, NC4, NoteLength::L4).unwrap();
        seq.put_note(0, REST, NoteLength::L4).unwrap();
        put_all(&mut seq, 0, &[END_OF_SEQUENCE]);
        seq.start(&clock);

        run(&mut seq, &clock, &mut chip, 1000);
        assert_eq!(chip.notes, vec![(0, NC4), (0, REST)]);
        assert_eq!(seq.track_status(0), Some(TrackStatus::Complete));

        // no calls after completion
        run(&mut seq, &clock, &mut chip, 500);
        assert_eq!(chip.notes.len(), 2);
    }

    #[test]
    fn tempo_change_stretches_later_notes() {
        let mut seq = test_seq();
        let clock = TestClock::new();
        let mut chip = TestChip::new();
        seq.set_tempo(60); // whole note = 4000ms, quarter = 1000ms
        seq.put_note(0, NC4, NoteLength::L4).unwrap();
        seq.put_note(0, NE4, NoteLength::L4).unwrap();
        seq.start(&clock);

        seq.service(&clock, &mut chip);
        clock.advance(999);
        seq.service(&clock, &mut chip);
        assert_eq!(chip.notes.len(), 1);
        clock.advance(1);
        seq.service(&clock, &mut chip);
        assert_eq!(chip.notes.len(), 2);
    }

    #[test]
    fn timing_gate_survives_clock_wraparound() {
        let mut seq = test_seq();
        let clock = TestClock::starting_at(u32::MAX - 100);
        let mut chip = TestChip::new();
        seq.put_note(0, NC4, NoteLength::L4).unwrap();
        seq.put_note(0, NE4, NoteLength::L4).unwrap();
        put_all(&mut seq, 0, &[END_OF_SEQUENCE]);
        seq.start(&clock);

        run(&mut seq, &clock, &mut chip, 1000);
        assert_eq!(chip.notes, vec![(0, NC4), (0, NE4)]);
        assert_eq!(seq.track_status(0), Some(TrackStatus::Complete));
    }

    // === commands ===

    #[test]
    fn volume_applies_without_consuming_time() {
        let mut seq = test_seq();
        let clock = TestClock::new();
        let mut chip = TestChip::new();
        put_all(&mut seq, 0, &[command_byte(Opcode::Volume, 9)]);
        seq.put_note(0, NC4, NoteLength::L4).unwrap();
        seq.start(&clock);

        seq.service(&clock, &mut chip);
        assert_eq!(chip.volumes, vec![(0, 9)]);
        assert!(chip.notes.is_empty());

        // note fires on the very next tick, no gate in between
        seq.service(&clock, &mut chip);
        assert_eq!(chip.notes, vec![(0, NC4)]);
    }

    #[test]
    fn repeat_replays_phrase_then_completes() {
        let mut seq = test_seq();
        let clock = TestClock::new();
        let mut chip = TestChip::new();
        put_all(&mut seq, 0, &[command_byte(Opcode::Repeat, 2)]);
        seq.put_note(0, NC4, NoteLength::L16).unwrap();
        seq.put_note(0, NE4, NoteLength::L16).unwrap();
        put_all(&mut seq, 0, &[END_OF_SEQUENCE]);
        seq.start(&clock);

        run(&mut seq, &clock, &mut chip, 2000);
        // initial pass + 2 repeats
        assert_eq!(
            chip.notes,
            vec![(0, NC4), (0, NE4), (0, NC4), (0, NE4), (0, NC4), (0, NE4)]
        );
        assert_eq!(seq.track_status(0), Some(TrackStatus::Complete));
    }

    #[test]
    fn repeat_zero_disarms() {
        let mut seq = test_seq();
        let clock = TestClock::new();
        let mut chip = TestChip::new();
        put_all(&mut seq, 0, &[command_byte(Opcode::Repeat, 0)]);
        seq.put_note(0, NC4, NoteLength::L16).unwrap();
        put_all(&mut seq, 0, &[END_OF_SEQUENCE]);
        seq.start(&clock);

        run(&mut seq, &clock, &mut chip, 500);
        assert_eq!(chip.notes, vec![(0, NC4)]);
        assert_eq!(seq.track_status(0), Some(TrackStatus::Complete));
    }

    #[test]
    fn interrupt_command_stops_consumption() {
        let mut seq = test_seq();
        let clock = TestClock::new();
        let mut chip = TestChip::new();
        put_all(&mut seq, 0, &[command_byte(Opcode::Interrupt, 0)]);
        seq.put_note(0, NC4, NoteLength::L4).unwrap();
        seq.start(&clock);

        run(&mut seq, &clock, &mut chip, 100);
        assert_eq!(seq.track_status(0), Some(TrackStatus::Interrupted));
        assert!(chip.notes.is_empty());
        // the note bytes are still buffered, unread
        assert_eq!(seq.buffer_available(0), 10 - 2);
    }

    #[test]
    fn external_interrupt_takes_effect_next_tick() {
        let mut seq = test_seq();
        let clock = TestClock::new();
        let mut chip = TestChip::new();
        seq.put_note(0, NC4, NoteLength::L4).unwrap();
        seq.start(&clock);
        seq.interrupt(0);

        seq.service(&clock, &mut chip);
        assert_eq!(seq.track_status(0), Some(TrackStatus::Interrupted));
        assert!(chip.notes.is_empty());
    }

    // === failure isolation ===

    #[test]
    fn reserved_opcode_interrupts_only_that_track() {
        let mut seq = test_seq();
        let clock = TestClock::new();
        let mut chip = TestChip::new();
        put_all(&mut seq, 0, &[command_byte(Opcode::Reserved, 0)]);
        seq.put_note(1, NC4, NoteLength::L16).unwrap();
        put_all(&mut seq, 1, &[END_OF_SEQUENCE]);
        seq.start(&clock);

        run(&mut seq, &clock, &mut chip, 200);
        assert_eq!(seq.track_status(0), Some(TrackStatus::Interrupted));
        assert_eq!(seq.track_status(1), Some(TrackStatus::Complete));
        assert_eq!(chip.notes, vec![(1, NC4)]);
    }

    #[test]
    fn invalid_note_length_interrupts() {
        let mut seq = test_seq();
        let clock = TestClock::new();
        let mut chip = TestChip::new();
        put_all(&mut seq, 0, &[NC4, 5]); // 5 is not a PLAY length
        seq.start(&clock);

        seq.service(&clock, &mut chip);
        assert_eq!(seq.track_status(0), Some(TrackStatus::Interrupted));
        assert!(chip.notes.is_empty());
    }

    #[test]
    fn half_buffered_note_waits_for_producer() {
        let mut seq = test_seq();
        let clock = TestClock::new();
        let mut chip = TestChip::new();
        put_all(&mut seq, 0, &[NC4]); // length byte still missing
        seq.start(&clock);

        run(&mut seq, &clock, &mut chip, 10);
        assert!(chip.notes.is_empty());
        assert_eq!(seq.track_status(0), Some(TrackStatus::Playing));

        put_all(&mut seq, 0, &[NoteLength::L4.as_byte()]);
        seq.service(&clock, &mut chip);
        assert_eq!(chip.notes, vec![(0, NC4)]);
    }

    // === substrings ===

    #[test]
    fn substring_roundtrip_plays_stored_phrase() {
        let mut seq = test_seq();
        let clock = TestClock::new();
        let mut chip = TestChip::new();
        put_all(
            &mut seq,
            0,
            &[
                command_byte(Opcode::AddSubstring, 1),
                4,
                NC4,
                NoteLength::L16.as_byte(),
                NE4,
                NoteLength::L16.as_byte(),
                command_byte(Opcode::PlaySubstring, 1),
            ],
        );
        seq.put_note(0, NG4, NoteLength::L16).unwrap();
        put_all(&mut seq, 0, &[END_OF_SEQUENCE]);
        seq.start(&clock);

        run(&mut seq, &clock, &mut chip, 1000);
        assert_eq!(chip.notes, vec![(0, NC4), (0, NE4), (0, NG4)]);
        assert_eq!(seq.track_status(0), Some(TrackStatus::Complete));
        assert_eq!(seq.substring_count(), 1);
    }

    #[test]
    fn substring_replayed_by_reference() {
        let mut seq = test_seq();
        let clock = TestClock::new();
        let mut chip = TestChip::new();
        put_all(
            &mut seq,
            0,
            &[
                command_byte(Opcode::AddSubstring, 0),
                2,
                NC4,
                NoteLength::L16.as_byte(),
                command_byte(Opcode::PlaySubstring, 0),
                command_byte(Opcode::PlaySubstring, 0),
                END_OF_SEQUENCE,
            ],
        );
        seq.start(&clock);

        run(&mut seq, &clock, &mut chip, 1000);
        assert_eq!(chip.notes, vec![(0, NC4), (0, NC4)]);
        assert_eq!(seq.track_status(0), Some(TrackStatus::Complete));
    }

    #[test]
    fn dangling_substring_reference_interrupts() {
        let mut seq = test_seq();
        let clock = TestClock::new();
        let mut chip = TestChip::new();
        put_all(&mut seq, 0, &[command_byte(Opcode::PlaySubstring, 9)]);
        seq.start(&clock);

        seq.service(&clock, &mut chip);
        assert_eq!(seq.track_status(0), Some(TrackStatus::Interrupted));
    }

    #[test]
    fn nested_play_substring_interrupts() {
        let mut seq = test_seq();
        let clock = TestClock::new();
        let mut chip = TestChip::new();
        put_all(
            &mut seq,
            0,
            &[
                command_byte(Opcode::AddSubstring, 0),
                1,
                command_byte(Opcode::PlaySubstring, 0),
                command_byte(Opcode::PlaySubstring, 0),
            ],
        );
        seq.start(&clock);

        run(&mut seq, &clock, &mut chip, 10);
        assert_eq!(seq.track_status(0), Some(TrackStatus::Interrupted));
    }

    #[test]
    fn delete_then_play_interrupts() {
        let mut seq = test_seq();
        let clock = TestClock::new();
        let mut chip = TestChip::new();
        put_all(
            &mut seq,
            0,
            &[
                command_byte(Opcode::AddSubstring, 2),
                0,
                command_byte(Opcode::DeleteSubstring, 2),
                command_byte(Opcode::PlaySubstring, 2),
            ],
        );
        seq.start(&clock);

        run(&mut seq, &clock, &mut chip, 10);
        assert_eq!(seq.track_status(0), Some(TrackStatus::Interrupted));
        assert_eq!(seq.substring_count(), 0);
    }

    #[test]
    fn substring_compaction_refused_mid_playback() {
        let mut seq = test_seq();
        let clock = TestClock::new();
        let mut chip = TestChip::new();
        put_all(
            &mut seq,
            0,
            &[
                command_byte(Opcode::AddSubstring, 0),
                2,
                NC4,
                NoteLength::L1.as_byte(),
                command_byte(Opcode::PlaySubstring, 0),
            ],
        );
        seq.start(&clock);
        // consume ADD, PLAY, then the note inside the substring
        seq.service(&clock, &mut chip);
        seq.service(&clock, &mut chip);
        seq.service(&clock, &mut chip);
        assert_eq!(chip.notes, vec![(0, NC4)]);

        assert_eq!(seq.optimize_substrings(), Err(SubstringError::Busy));
    }

    // === transport and buffers ===

    #[test]
    fn put_note_is_atomic_when_nearly_full() {
        let mut seq = test_seq();
        for _ in 0..9 {
            seq.put(0, command_byte(Opcode::Volume, 1)).unwrap();
        }
        assert_eq!(seq.buffer_available(0), 1);
        assert_eq!(seq.put_note(0, NC4, NoteLength::L4), Err(BufferError::Full));
        assert_eq!(seq.buffer_available(0), 1); // nothing was written
        assert_eq!(seq.put(0, END_OF_SEQUENCE), Ok(()));
    }

    #[test]
    fn put_event_roundtrip() {
        let mut seq = test_seq();
        let clock = TestClock::new();
        let mut chip = TestChip::new();
        seq.put_event(0, &Event::Volume(3)).unwrap();
        seq.put_event(0, &Event::Note { pitch: NE4, length: NoteLength::L16 }).unwrap();
        seq.put_event(0, &Event::EndOfSequence).unwrap();
        seq.start(&clock);

        run(&mut seq, &clock, &mut chip, 200);
        assert_eq!(chip.volumes, vec![(0, 3)]);
        assert_eq!(chip.notes, vec![(0, NE4)]);
        assert_eq!(seq.track_status(0), Some(TrackStatus::Complete));
    }

    #[test]
    fn empty_tracks_stay_idle_on_start() {
        let mut seq = test_seq();
        let clock = TestClock::new();
        seq.put_note(1, NC4, NoteLength::L4).unwrap();
        seq.start(&clock);
        assert_eq!(seq.track_status(0), Some(TrackStatus::Idle));
        assert_eq!(seq.track_status(1), Some(TrackStatus::Playing));
        assert_eq!(seq.track_status(2), Some(TrackStatus::Idle));
    }

    #[test]
    fn stop_clears_buffers_and_states() {
        let mut seq = test_seq();
        let clock = TestClock::new();
        let mut chip = TestChip::new();
        seq.put_note(0, NC4, NoteLength::L4).unwrap();
        seq.start(&clock);
        seq.service(&clock, &mut chip);
        seq.stop();

        assert!(!seq.is_playing());
        assert_eq!(seq.track_status(0), Some(TrackStatus::Idle));
        assert_eq!(seq.total_buffer_available(), 30);
    }

    #[test]
    fn restart_after_complete() {
        let mut seq = test_seq();
        let clock = TestClock::new();
        let mut chip = TestChip::new();
        seq.put_note(0, NC4, NoteLength::L16).unwrap();
        put_all(&mut seq, 0, &[END_OF_SEQUENCE]);
        seq.start(&clock);
        run(&mut seq, &clock, &mut chip, 200);
        assert_eq!(seq.track_status(0), Some(TrackStatus::Complete));

        seq.put_note(0, NE4, NoteLength::L16).unwrap();
        put_all(&mut seq, 0, &[END_OF_SEQUENCE]);
        seq.start(&clock);
        run(&mut seq, &clock, &mut chip, 200);
        assert_eq!(chip.notes, vec![(0, NC4), (0, NE4)]);
        assert_eq!(seq.track_status(0), Some(TrackStatus::Complete));
    }

    #[test]
    fn tracks_play_independently() {
        let mut seq = test_seq();
        let clock = TestClock::new();
        let mut chip = TestChip::new();
        seq.put_note(0, NC4, NoteLength::L16).unwrap();
        put_all(&mut seq, 0, &[END_OF_SEQUENCE]);
        seq.put_note(2, NG4, NoteLength::L16).unwrap();
        put_all(&mut seq, 2, &[END_OF_SEQUENCE]);
        seq.start(&clock);

        run(&mut seq, &clock, &mut chip, 200);
        assert_eq!(chip.notes, vec![(0, NC4), (2, NG4)]);
        assert_eq!(seq.track_status(0), Some(TrackStatus::Complete));
        assert_eq!(seq.track_status(2), Some(TrackStatus::Complete));
        assert!(!seq.is_playing());
    }
}
