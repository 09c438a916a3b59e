mod decoder;
mod encoder;
mod error;
mod midi_exporter;
mod midi_importer;
mod model;
mod util;

pub use decoder::*;
pub use encoder::*;
pub use error::*;
pub use midi_exporter::*;
pub use midi_importer::*;
pub use model::config::*;
pub use model::encoding::*;
pub use model::grid::*;
pub use model::performance::*;
pub use util::*;
