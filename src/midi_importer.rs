use crate::error::CodecResult;
use crate::model::performance::*;
use log::debug;
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::fs;
use std::path::Path;

pub(crate) const MICROSECONDS_PER_MINUTE: f64 = 60_000_000.0;

pub fn import_midi_file<P: AsRef<Path>>(path: P) -> CodecResult<Performance> {
    let bytes = fs::read(path.as_ref())?;
    debug!(
        "Read {} bytes from '{}'",
        bytes.len(),
        path.as_ref().display()
    );

    midi_bytes_to_performance(&bytes)
}

/// Parses a Standard MIDI File into independent per-track event streams.
///
/// Every event keeps its original track-relative delta, so summing deltas in order yields
/// the absolute tick of each event. The tempo is taken from the first tempo meta event
/// found, scanning tracks in file order, and later tempo changes are ignored.
pub fn midi_bytes_to_performance(bytes: &[u8]) -> CodecResult<Performance> {
    let smf = Smf::parse(bytes)?;

    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(t) => Some(t.as_int()),
        Timing::Timecode(fps, subframe) => {
            debug!(
                "SMPTE timecode timing ({:?} fps, {} subframes), ticks are used as-is",
                fps, subframe
            );
            None
        }
    };

    debug!(
        "MIDI format: {:?}, tracks: {}, ticks per beat: {:?}",
        smf.header.format,
        smf.tracks.len(),
        ticks_per_beat
    );

    let mut tempo_bpm: Option<f64> = None;
    let mut tracks: Vec<Vec<MusicalEvent>> = Vec::with_capacity(smf.tracks.len());

    for (track_idx, track) in smf.tracks.iter().enumerate() {
        let mut events: Vec<MusicalEvent> = Vec::with_capacity(track.len());

        for event in track.iter() {
            let kind = match &event.kind {
                TrackEventKind::Meta(MetaMessage::Tempo(micro)) => {
                    let bpm = MICROSECONDS_PER_MINUTE / (micro.as_int().max(1) as f64);
                    if tempo_bpm.is_none() {
                        debug!("Tempo event in track {}: {:.3} bpm", track_idx, bpm);
                        tempo_bpm = Some(bpm);
                    }
                    EventKind::SetTempo { bpm }
                }
                TrackEventKind::Meta(MetaMessage::EndOfTrack) => EventKind::EndOfTrack,
                TrackEventKind::Midi { message, .. } => match message {
                    MidiMessage::NoteOn { key, vel } if vel.as_int() == 0 => EventKind::NoteOff {
                        pitch: key.as_int(),
                    },
                    MidiMessage::NoteOn { key, vel } => EventKind::NoteOn {
                        pitch: key.as_int(),
                        velocity: vel.as_int(),
                    },
                    MidiMessage::NoteOff { key, .. } => EventKind::NoteOff {
                        pitch: key.as_int(),
                    },
                    _ => EventKind::Other,
                },
                _ => EventKind::Other,
            };

            events.push(MusicalEvent::new(event.delta.as_int(), kind));
        }

        debug!("Track {}: {} events", track_idx, events.len());
        tracks.push(events);
    }

    Ok(Performance {
        tracks,
        tempo_bpm,
        ticks_per_beat,
    })
}
