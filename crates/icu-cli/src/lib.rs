//! Library side of the ICU feature builder: configuration, logging and the
//! staged pipeline.

pub mod config;
pub mod logging;
pub mod pipeline;
