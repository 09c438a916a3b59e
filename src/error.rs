use thiserror::Error;

pub type CodecResult<T> = Result<T, CodecError>;

/// Everything that can go wrong while reading, encoding, decoding or writing a performance.
///
/// Every variant is deterministic for a given input, so retrying is never useful.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Failed to parse MIDI container: {0}")]
    Parse(#[from] midly::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No track contains any tick-bearing event, nothing to encode..!")]
    EmptyPerformance,

    #[error("Sample size {0} is not a usable ticks-per-frame stride..!")]
    InvalidSampleSize(usize),

    #[error("Performance needs {frames} frames, more than the limit of {limit}..!")]
    TooManyFrames { frames: u64, limit: usize },

    #[error("Row {row} has {found} columns, expected {expected}..!")]
    RaggedRows {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Hold matrix has shape {hold:?} but hit matrix has shape {hit:?}..!")]
    ShapeMismatch {
        hold: (usize, usize),
        hit: (usize, usize),
    },

    #[error("Attributes carry no tempo, decoding needs a concrete bpm..!")]
    MissingTempo,

    #[error("Tempo {0} bpm cannot be represented..!")]
    InvalidTempo(f64),

    #[error("Pitch {0} is outside the MIDI range 0..=127..!")]
    PitchOutOfRange(u32),

    #[error("Velocity {0} is outside the MIDI range 0..=127..!")]
    VelocityOutOfRange(u8),

    #[error("Resolution of {0} ticks per beat cannot be written..!")]
    InvalidResolution(u16),

    #[error("Tick delta {0} does not fit in a 28-bit MIDI delta..!")]
    DeltaOutOfRange(u32),

    #[error("Tempo of {0} us/qn does not fit in a 24-bit tempo event..!")]
    TempoOutOfRange(u32),
}
