use crate::decoder::DecodedTrack;
use crate::error::{CodecError, CodecResult};
use crate::midi_importer::MICROSECONDS_PER_MINUTE;
use crate::model::performance::*;
use log::debug;
use midly::num::{u4, u7, u15, u24, u28};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};
use std::fs;
use std::path::Path;

/// Resolution used when none is requested.
pub const DEFAULT_TICKS_PER_BEAT: u16 = 220;

const MAX_U7: u8 = 0x7F;
const MAX_U15: u16 = 0x7FFF;
const MAX_U24: u32 = 0xFF_FFFF;
const MAX_U28: u32 = 0x0FFF_FFFF;

pub fn write_midi_file<P: AsRef<Path>>(
    path: P,
    track: &DecodedTrack,
    ticks_per_beat: u16,
) -> CodecResult<()> {
    let bytes = write_midi_bytes(track, ticks_per_beat)?;
    fs::write(path.as_ref(), &bytes)?;
    debug!(
        "Wrote {} bytes to '{}'",
        bytes.len(),
        path.as_ref().display()
    );

    Ok(())
}

pub fn write_midi_bytes(track: &DecodedTrack, ticks_per_beat: u16) -> CodecResult<Vec<u8>> {
    let smf = track_to_smf(track, ticks_per_beat)?;
    let mut bytes = Vec::new();
    smf.write_std(&mut bytes)?;

    Ok(bytes)
}

/// Builds a format 0 file: a tempo event, the note stream, and an end-of-track marker.
///
/// `Other` events carry nothing writable, their deltas are folded into the next event.
pub fn track_to_smf(track: &DecodedTrack, ticks_per_beat: u16) -> CodecResult<Smf<'static>> {
    if ticks_per_beat == 0 || ticks_per_beat > MAX_U15 {
        return Err(CodecError::InvalidResolution(ticks_per_beat));
    }

    let mut smf = Smf::new(Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(ticks_per_beat)),
    ));

    let mut out: Track<'static> = Vec::with_capacity(track.events.len() + 2);
    out.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(tempo(track.bpm)?)),
    });

    let mut pending_delta: u32 = 0;
    let mut ended = false;
    for event in track.events.iter() {
        let delta = pending_delta.saturating_add(event.delta);
        let kind = match event.kind {
            EventKind::NoteOn { pitch, velocity } => TrackEventKind::Midi {
                channel: u4::new(0),
                message: MidiMessage::NoteOn {
                    key: key(pitch)?,
                    vel: velocity_of(velocity)?,
                },
            },
            EventKind::NoteOff { pitch } => TrackEventKind::Midi {
                channel: u4::new(0),
                message: MidiMessage::NoteOff {
                    key: key(pitch)?,
                    vel: u7::new(0),
                },
            },
            EventKind::SetTempo { bpm } => TrackEventKind::Meta(MetaMessage::Tempo(tempo(bpm)?)),
            EventKind::EndOfTrack => {
                ended = true;
                TrackEventKind::Meta(MetaMessage::EndOfTrack)
            }
            EventKind::Other => {
                pending_delta = delta;
                continue;
            }
        };

        if delta > MAX_U28 {
            return Err(CodecError::DeltaOutOfRange(delta));
        }
        pending_delta = 0;
        out.push(TrackEvent {
            delta: u28::new(delta),
            kind,
        });

        if ended {
            break;
        }
    }

    if !ended {
        if pending_delta > MAX_U28 {
            return Err(CodecError::DeltaOutOfRange(pending_delta));
        }
        out.push(TrackEvent {
            delta: u28::new(pending_delta),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });
    }

    smf.tracks.push(out);
    Ok(smf)
}

fn key(pitch: u8) -> CodecResult<u7> {
    if pitch > MAX_U7 {
        return Err(CodecError::PitchOutOfRange(pitch as u32));
    }
    Ok(u7::new(pitch))
}

fn velocity_of(velocity: u8) -> CodecResult<u7> {
    if velocity > MAX_U7 {
        return Err(CodecError::VelocityOutOfRange(velocity));
    }
    Ok(u7::new(velocity))
}

/// Whole-bpm tempo, fractional bpm is truncated before conversion.
fn tempo(bpm: f64) -> CodecResult<u24> {
    let whole = bpm.trunc();
    if !whole.is_finite() || whole < 1.0 {
        return Err(CodecError::InvalidTempo(bpm));
    }

    let mpqn = (MICROSECONDS_PER_MINUTE / whole) as u32;
    if mpqn == 0 {
        return Err(CodecError::InvalidTempo(bpm));
    }
    if mpqn > MAX_U24 {
        return Err(CodecError::TempoOutOfRange(mpqn));
    }
    Ok(u24::new(mpqn))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::decoder::{DECODED_VELOCITY, decode};
    use crate::encoder::{PITCHES, encode};
    use crate::midi_importer::midi_bytes_to_performance;
    use crate::model::encoding::Attributes;
    use crate::model::grid::Grid;

    fn track(events: Vec<MusicalEvent>) -> DecodedTrack {
        DecodedTrack { bpm: 60.0, events }
    }

    #[test]
    fn writes_a_single_track_file() {
        env_logger::try_init().unwrap_or(());

        let decoded = track(vec![
            MusicalEvent::note_on(0, 60, 100),
            MusicalEvent::note_off(48, 60),
            MusicalEvent::new(1, EventKind::EndOfTrack),
        ]);

        let smf = track_to_smf(&decoded, DEFAULT_TICKS_PER_BEAT).unwrap();
        assert_eq!(smf.header.format, Format::SingleTrack);
        assert_eq!(smf.tracks.len(), 1);
        assert_eq!(smf.tracks[0].len(), 4);
        assert_eq!(
            smf.tracks[0][0].kind,
            TrackEventKind::Meta(MetaMessage::Tempo(u24::new(1_000_000)))
        );
        assert_eq!(smf.tracks[0][2].delta.as_int(), 48);
        assert_eq!(
            smf.tracks[0][3].kind,
            TrackEventKind::Meta(MetaMessage::EndOfTrack)
        );
    }

    #[test]
    fn appends_missing_end_of_track_and_skips_other() {
        env_logger::try_init().unwrap_or(());

        let decoded = track(vec![
            MusicalEvent::new(5, EventKind::Other),
            MusicalEvent::note_on(3, 61, 90),
            MusicalEvent::new(7, EventKind::Other),
        ]);

        let smf = track_to_smf(&decoded, 96).unwrap();
        let events = &smf.tracks[0];
        assert_eq!(events.len(), 3);
        assert_eq!(events[1].delta.as_int(), 8);
        assert_eq!(events[2].delta.as_int(), 7);
        assert_eq!(events[2].kind, TrackEventKind::Meta(MetaMessage::EndOfTrack));
    }

    #[test]
    fn rejects_unrepresentable_values() {
        env_logger::try_init().unwrap_or(());

        let bad_pitch = track(vec![MusicalEvent::note_on(0, 128, 100)]);
        assert!(matches!(
            write_midi_bytes(&bad_pitch, DEFAULT_TICKS_PER_BEAT),
            Err(CodecError::PitchOutOfRange(128))
        ));

        let bad_delta = track(vec![MusicalEvent::note_off(MAX_U28 + 1, 60)]);
        assert!(matches!(
            write_midi_bytes(&bad_delta, DEFAULT_TICKS_PER_BEAT),
            Err(CodecError::DeltaOutOfRange(_))
        ));

        let slow = DecodedTrack {
            bpm: 2.0,
            events: vec![],
        };
        assert!(matches!(
            write_midi_bytes(&slow, DEFAULT_TICKS_PER_BEAT),
            Err(CodecError::TempoOutOfRange(30_000_000))
        ));

        let trailing = track(vec![
            MusicalEvent::note_on(0, 60, 100),
            MusicalEvent::new(MAX_U28, EventKind::Other),
            MusicalEvent::new(1, EventKind::Other),
        ]);
        assert!(matches!(
            write_midi_bytes(&trailing, DEFAULT_TICKS_PER_BEAT),
            Err(CodecError::DeltaOutOfRange(0x1000_0000))
        ));

        let fast = DecodedTrack {
            bpm: 1.0e9,
            events: vec![],
        };
        assert!(matches!(
            write_midi_bytes(&fast, DEFAULT_TICKS_PER_BEAT),
            Err(CodecError::InvalidTempo(_))
        ));

        assert!(matches!(
            write_midi_bytes(&track(vec![]), 0),
            Err(CodecError::InvalidResolution(0))
        ));
    }

    #[test]
    fn decoded_matrices_round_trip_through_midi() {
        env_logger::try_init().unwrap_or(());

        let mut hold: Grid = Grid::zeros(4, PITCHES);
        let mut hit: Grid = Grid::zeros(4, PITCHES);
        for row in 0..3 {
            hold.set(row, 62, 1);
        }
        hit.set(0, 62, 1);
        hit.set(2, 62, 1);
        hold.set(3, 69, 1);

        let attributes = Attributes {
            bpm: Some(120.0),
            compressed: false,
            sample: 24,
        };
        let decoded = decode(&hold, Some(&hit), &attributes).unwrap();
        let bytes = write_midi_bytes(&decoded, DEFAULT_TICKS_PER_BEAT).unwrap();

        let performance = midi_bytes_to_performance(&bytes).unwrap();
        assert_eq!(performance.tracks.len(), 1);
        assert_eq!(performance.ticks_per_beat, Some(DEFAULT_TICKS_PER_BEAT));
        assert!((performance.tempo_bpm.unwrap() - 120.0).abs() < 1e-9);
        assert_eq!(
            performance.tracks[0][1],
            MusicalEvent::note_on(0, 62, DECODED_VELOCITY)
        );

        let encoding = encode(&performance, false).unwrap();
        assert_eq!(encoding.hold, hold);

        // a same-tick off/on never leaves the merged grid silent, so the rearticulation
        // at frame 2 is lost while the inferred onset at frame 3 appears
        let mut expected_hit: Grid = Grid::zeros(4, PITCHES);
        expected_hit.set(0, 62, 1);
        expected_hit.set(3, 69, 1);
        assert_eq!(encoding.hit, expected_hit);
        assert_eq!(encoding.attributes.bpm, Some(60.0));
    }
}
