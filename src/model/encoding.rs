use crate::model::grid::Grid;
use serde::{Deserialize, Serialize};

/// Default number of ticks collapsed into one frame.
pub const DEFAULT_SAMPLE_SIZE: usize = 24;

/// Parameters needed to turn a hold/hit pair back into a MIDI stream.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Attributes {
    /// Half the source tempo, `None` when the source had no tempo event.
    pub bpm: Option<f64>,
    pub compressed: bool,
    pub sample: usize,
}

/// Output of the encoder, the narrow interface handed to the sequence model.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Encoding {
    pub hold: Grid,
    pub hit: Grid,
    pub attributes: Attributes,
}
