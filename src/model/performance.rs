use serde::{Deserialize, Serialize};

/// The subset of MIDI messages the codec cares about.
///
/// Pitches and deltas are kept wider than their MIDI encodings so that an out-of-range
/// value produced upstream is caught by the writer instead of being silently masked.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum EventKind {
    NoteOn { pitch: u8, velocity: u8 },
    NoteOff { pitch: u8 },
    SetTempo { bpm: f64 },
    EndOfTrack,
    Other,
}

/// An event plus the ticks elapsed since the previous event on the same track.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct MusicalEvent {
    pub delta: u32,
    pub kind: EventKind,
}

impl MusicalEvent {
    pub fn new(delta: u32, kind: EventKind) -> Self {
        Self { delta, kind }
    }

    pub fn note_on(delta: u32, pitch: u8, velocity: u8) -> Self {
        Self::new(delta, EventKind::NoteOn { pitch, velocity })
    }

    pub fn note_off(delta: u32, pitch: u8) -> Self {
        Self::new(delta, EventKind::NoteOff { pitch })
    }
}

/// A parsed MIDI file: one event stream per track plus the first tempo seen.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Performance {
    pub tracks: Vec<Vec<MusicalEvent>>,
    /// Tempo of the first `SetTempo` event in file order, `None` if the file has none.
    pub tempo_bpm: Option<f64>,
    /// `None` for SMPTE timecode files.
    pub ticks_per_beat: Option<u16>,
}

impl Performance {
    /// Absolute tick extent of the longest track.
    pub fn max_ticks(&self) -> u64 {
        self.tracks
            .iter()
            .map(|track| track.iter().map(|e| e.delta as u64).sum::<u64>())
            .max()
            .unwrap_or(0)
    }
}
