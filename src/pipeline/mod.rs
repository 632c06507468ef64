//! Pipeline module - IV scoring, feature transforms and dataset I/O

pub mod error;
pub mod features;
pub mod iv;
pub mod loader;

pub use error::*;
pub use features::*;
pub use iv::*;
pub use loader::*;
