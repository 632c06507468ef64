//! ivscore: credit-risk feature engineering and Information Value scoring
//!
//! A library for deriving credit-risk features from raw loan records and
//! ranking features by their Information Value (IV) against a binary target.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
