pub mod config;
pub mod encoding;
pub mod grid;
pub mod performance;
