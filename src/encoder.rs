use crate::error::{CodecError, CodecResult};
use crate::model::encoding::*;
use crate::model::grid::Grid;
use crate::model::performance::*;
use log::{debug, info};

/// Number of MIDI pitches, the column count of an uncompressed grid.
pub const PITCHES: usize = 128;

/// Number of pitch classes, the column count of a compressed grid.
pub const PITCH_CLASSES: usize = 12;

/// Upper bound on encoded frames, 2^20 frames of 128 pitches is 128 MiB of grid.
pub const DEFAULT_MAX_FRAMES: usize = 1 << 20;

/// Encoding options, `sample` is the downsample stride in ticks per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    pub compress: bool,
    pub sample: usize,
    /// Performances that would need more frames than this are rejected before allocating.
    pub max_frames: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            compress: false,
            sample: DEFAULT_SAMPLE_SIZE,
            max_frames: DEFAULT_MAX_FRAMES,
        }
    }
}

/// Encodes a performance with the default stride of 24 ticks per frame.
pub fn encode(performance: &Performance, compress: bool) -> CodecResult<Encoding> {
    encode_with(
        performance,
        EncodeOptions {
            compress,
            ..Default::default()
        },
    )
}

pub fn encode_with(performance: &Performance, options: EncodeOptions) -> CodecResult<Encoding> {
    let mut grid = activity_grid(performance, options.sample, options.max_frames)?;
    debug!("Sampled activity grid shape: {:?}", grid.shape());

    if options.compress {
        grid = compress(&grid);
    }

    let hold = hold_from(&grid);
    let hit = hit_from(&grid);

    info!("Encoded shape {:?}", grid.shape());

    Ok(Encoding {
        hold,
        hit,
        attributes: Attributes {
            bpm: performance.tempo_bpm.map(|bpm| bpm / 2.0),
            compressed: options.compress,
            sample: options.sample,
        },
    })
}

/// Merges every track into one binary `(frames, 128)` grid, keeping only the ticks that
/// fall on a multiple of `sample`.
///
/// The result equals building the full tick-resolution grid and then calling
/// [`downsample`], without ever holding the full grid in memory. Each track is replayed
/// as a fold carrying `(cursor, current)`. A non-zero delta first ORs the current vector
/// into the sampled ticks it spans, then the event updates the vector. Zero-delta events
/// only update the vector, so a note started by a trailing zero-delta tail never reaches
/// the grid.
pub fn activity_grid(
    performance: &Performance,
    sample: usize,
    max_frames: usize,
) -> CodecResult<Grid> {
    if sample == 0 {
        return Err(CodecError::InvalidSampleSize(sample));
    }

    let max_ticks = performance.max_ticks();
    if max_ticks == 0 {
        return Err(CodecError::EmptyPerformance);
    }

    let frames = max_ticks.div_ceil(sample as u64);
    if frames > max_frames as u64 {
        return Err(CodecError::TooManyFrames {
            frames,
            limit: max_frames,
        });
    }

    let sample = sample as u64;
    let mut grid: Grid = Grid::zeros(frames as usize, PITCHES);

    for track in performance.tracks.iter() {
        track
            .iter()
            .fold((0u64, [0u8; PITCHES]), |(cursor, mut current), event| {
                let end = cursor + event.delta as u64;
                let mut tick = cursor.div_ceil(sample) * sample;
                while tick < end {
                    for (cell, &sounding) in grid
                        .row_mut((tick / sample) as usize)
                        .iter_mut()
                        .zip(current.iter())
                    {
                        *cell |= sounding;
                    }
                    tick += sample;
                }

                match event.kind {
                    EventKind::NoteOff { pitch } => current[pitch as usize % PITCHES] = 0,
                    EventKind::NoteOn { pitch, velocity } => {
                        current[pitch as usize % PITCHES] = (velocity > 0) as u8
                    }
                    _ => {}
                }

                (end, current)
            });
    }

    Ok(grid)
}

/// Point-samples every `sample`-th row starting at row 0.
pub fn downsample<T: Copy + Default>(grid: &Grid<T>, sample: usize) -> CodecResult<Grid<T>> {
    if sample == 0 {
        return Err(CodecError::InvalidSampleSize(sample));
    }

    let rows: Vec<&[T]> = grid.iter_rows().step_by(sample).collect();
    Grid::from_rows(&rows, grid.cols())
}

/// Collapses octaves: column `c` of the result is the max over every input column `p`
/// with `p % 12 == c`. A 12-column grid comes back unchanged.
pub fn compress(grid: &Grid) -> Grid {
    let mut out: Grid = Grid::zeros(grid.rows(), PITCH_CLASSES);
    for row in 0..grid.rows() {
        for (pitch, &value) in grid.row(row).iter().enumerate() {
            let class = pitch % PITCH_CLASSES;
            if value > out.get(row, class) {
                out.set(row, class, value);
            }
        }
    }

    out
}

/// 1 where a pitch is sounding, 0 elsewhere.
pub fn hold_from(grid: &Grid) -> Grid {
    grid.map(|v| (v > 0) as u8)
}

/// 1 where a pitch is sounding and its value differs from the previous frame.
/// The frame before row 0 is all zeros.
pub fn hit_from(grid: &Grid) -> Grid {
    let mut hit: Grid = Grid::zeros(grid.rows(), grid.cols());
    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            let current = grid.get(row, col);
            let previous = if row == 0 { 0 } else { grid.get(row - 1, col) };
            hit.set(row, col, (current != previous && current > 0) as u8);
        }
    }

    hit
}

/// Running count of consecutive held frames per pitch, reset to 0 when the pitch is released.
pub fn hold_lengths(hold: &Grid) -> Grid<u32> {
    let mut lengths: Grid<u32> = Grid::zeros(hold.rows(), hold.cols());
    for row in 0..hold.rows() {
        for col in 0..hold.cols() {
            let held = hold.get(row, col).min(1) as u32;
            let previous = if row == 0 { 0 } else { lengths.get(row - 1, col) };
            lengths.set(row, col, (previous + held) * held);
        }
    }

    lengths
}
