//! pollwatch - keeps a fixed list of URLs under HEAD polling and
//! periodically logs the latest status of each one.
//!
//! Probing workers, the status aggregator and the backoff scheduler only
//! talk through channels; see [`monitoring`] for the pipeline.

pub mod config;
pub mod error;
pub mod monitoring;
pub mod orchestrator;
pub mod validation;

pub use config::Config;
pub use orchestrator::{Orchestrator, Pipeline};
