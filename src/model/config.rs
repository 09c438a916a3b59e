use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pianoroll",
    about = "Encode MIDI files into hold/hit piano-roll matrices and decode them back!"
)]
pub struct Args {
    /// MIDI files to run through the codec.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Collapse octaves into 12 pitch classes before deriving hold/hit.
    #[arg(short, long, default_value_t = false)]
    pub compress: bool,

    /// Ticks per frame when downsampling the activity grid.
    #[arg(short, long, default_value_t = 24)]
    pub sample: usize,

    /// Reject inputs that would encode to more frames than this.
    #[arg(long = "max-frames", default_value_t = 1 << 20)]
    pub max_frames: usize,

    /// Ticks per beat of the written MIDI files.
    #[arg(short, long, default_value_t = 220)]
    pub resolution: u16,

    /// Directory for output files. Defaults to the directory of each input.
    #[arg(short, long = "out-dir")]
    pub out_dir: Option<PathBuf>,

    /// Decode from the hold matrix alone, ignoring hits.
    #[arg(long = "hold-only", default_value_t = false)]
    pub hold_only: bool,

    /// Also write the hold/hit matrices and attributes as `<name>_encoded.json`.
    #[arg(short, long, default_value_t = false)]
    pub dump: bool,

    /// Tempo to use when an input has no tempo event. Without it such files fail to decode.
    #[arg(long = "fallback-bpm")]
    pub fallback_bpm: Option<f64>,
}
