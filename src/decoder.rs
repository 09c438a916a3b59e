use crate::encoder::PITCH_CLASSES;
use crate::error::{CodecError, CodecResult};
use crate::model::encoding::Attributes;
use crate::model::grid::Grid;
use crate::model::performance::*;
use log::{debug, info};

/// Velocity given to every reconstructed note.
pub const DECODED_VELOCITY: u8 = 100;

/// Pitch of column 0 when decoding a compressed (pitch-class) grid.
pub const COMPRESSED_PITCH_OFFSET: u32 = 72;

/// A single reconstructed track, ready for the writer.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTrack {
    pub bpm: f64,
    /// Note events followed by an end-of-track marker. Deltas are in upsampled ticks.
    pub events: Vec<MusicalEvent>,
}

impl DecodedTrack {
    pub fn note_on_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::NoteOn { .. }))
            .count()
    }

    pub fn note_off_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::NoteOff { .. }))
            .count()
    }
}

#[derive(Debug, Clone)]
struct ReplayState {
    prev_hold: Vec<u8>,
    tick_offset: u32,
    events: Vec<MusicalEvent>,
}

fn upsampled_rows(grid: &Grid, sample: usize) -> CodecResult<usize> {
    if sample == 0 {
        return Err(CodecError::InvalidSampleSize(sample));
    }
    grid.rows()
        .checked_mul(sample)
        .and_then(|rows| rows.checked_mul(grid.cols()).map(|_| rows))
        .ok_or(CodecError::InvalidSampleSize(sample))
}

/// Repeats each row `sample` times.
pub fn upsample_hold(hold: &Grid, sample: usize) -> CodecResult<Grid> {
    upsampled_rows(hold, sample)?;

    let rows: Vec<&[u8]> = hold
        .iter_rows()
        .flat_map(|row| std::iter::repeat_n(row, sample))
        .collect();
    Grid::from_rows(&rows, hold.cols())
}

/// Places each row at the start of a block of `sample` rows, the rest of the block is zero.
pub fn upsample_hit(hit: &Grid, sample: usize) -> CodecResult<Grid> {
    let rows = upsampled_rows(hit, sample)?;

    let mut out: Grid = Grid::zeros(rows, hit.cols());
    for (frame, row) in hit.iter_rows().enumerate() {
        out.row_mut(frame * sample).copy_from_slice(row);
    }

    Ok(out)
}

/// Rebuilds a single-track note stream from hold/hit matrices.
///
/// A missing `hit` is treated as all zeros, so every onset is inferred from hold alone.
/// Pitches still held on the last row are left open. Octave information dropped by
/// compression is not recovered, compressed columns are placed from pitch 72 upward.
///
/// The stream ends one tick after the last emitted event, so frames after the last note
/// change are not represented. Re-encoding the output only reproduces `hold` when some
/// event falls in its final frame.
///
/// Replay is equivalent to walking [`upsample_hold`] and [`upsample_hit`] row by row, but
/// works a frame at a time: after the first row of a frame nothing can change until the
/// next frame, so the remaining `sample - 1` rows only advance the tick offset.
pub fn decode(
    hold: &Grid,
    hit: Option<&Grid>,
    attributes: &Attributes,
) -> CodecResult<DecodedTrack> {
    let bpm = attributes.bpm.ok_or(CodecError::MissingTempo)?;
    if !bpm.is_finite() || bpm < 1.0 {
        return Err(CodecError::InvalidTempo(bpm));
    }
    let sample = u32::try_from(attributes.sample)
        .ok()
        .filter(|&s| s > 0)
        .ok_or(CodecError::InvalidSampleSize(attributes.sample))?;

    let zeros: Grid;
    let hit = match hit {
        Some(hit) => hit,
        None => {
            zeros = Grid::zeros(hold.rows(), hold.cols());
            &zeros
        }
    };

    info!("Decoding shape {:?}", hold.shape());
    let hold = hold.zip_with(hit, |h, x| (h > 0 || x > 0) as u8)?;
    let hit = hit.map(|x| (x > 0) as u8);

    let translation = if attributes.compressed {
        COMPRESSED_PITCH_OFFSET
    } else {
        0
    };
    let pitches = (0..hold.cols() as u32)
        .map(|col| {
            let pitch = col + translation;
            u8::try_from(pitch).map_err(|_| CodecError::PitchOutOfRange(pitch))
        })
        .collect::<CodecResult<Vec<u8>>>()?;

    if attributes.compressed && hold.cols() != PITCH_CLASSES {
        debug!(
            "Compressed attributes with {} columns, expected {}",
            hold.cols(),
            PITCH_CLASSES
        );
    }

    let initial = ReplayState {
        prev_hold: vec![0; hold.cols()],
        tick_offset: 0,
        events: Vec::new(),
    };

    let mut state = hold.iter_rows().zip(hit.iter_rows()).try_fold(
        initial,
        |state, (hold_row, hit_row)| {
            let mut state = replay_row(state, hold_row, hit_row, &pitches);
            state.tick_offset = state
                .tick_offset
                .checked_add(sample)
                .ok_or(CodecError::DeltaOutOfRange(u32::MAX))?;
            Ok::<_, CodecError>(state)
        },
    )?;

    state
        .events
        .push(MusicalEvent::new(1, EventKind::EndOfTrack));

    let track = DecodedTrack {
        bpm,
        events: state.events,
    };

    info!(
        "On decode {} played {} released",
        track.note_on_count(),
        track.note_off_count()
    );

    Ok(track)
}

/// Emits the events implied by one upsampled row, pitches in ascending order. The caller
/// advances the tick offset.
///
/// The tick offset is shared by every pitch, so each delta counts ticks since the last
/// event of any pitch.
fn replay_row(
    mut state: ReplayState,
    hold_row: &[u8],
    hit_row: &[u8],
    pitches: &[u8],
) -> ReplayState {
    for (col, &pitch) in pitches.iter().enumerate() {
        let held = hold_row[col] == 1;
        let was_held = state.prev_hold[col] == 1;

        if !held && was_held {
            state
                .events
                .push(MusicalEvent::note_off(state.tick_offset, pitch));
            state.tick_offset = 0;
        } else if hit_row[col] == 1 {
            if was_held {
                state
                    .events
                    .push(MusicalEvent::note_off(state.tick_offset, pitch));
                state.tick_offset = 0;
            }
            state
                .events
                .push(MusicalEvent::note_on(state.tick_offset, pitch, DECODED_VELOCITY));
            state.tick_offset = 0;
        } else if held && !was_held {
            state
                .events
                .push(MusicalEvent::note_on(state.tick_offset, pitch, DECODED_VELOCITY));
            state.tick_offset = 0;
        }
    }

    state.prev_hold.copy_from_slice(hold_row);
    state
}
