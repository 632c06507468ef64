//! Report module - IV rankings and exports

pub mod iv_export;
pub mod summary;

pub use iv_export::*;
pub use summary::*;
