//! Core library functions for the diffusion network analyzer

pub mod config;
pub mod data;
pub mod graph;
pub mod influence;
pub mod metrics;
pub mod pipeline;
pub mod storage;

pub use anyhow::{anyhow, Result};
pub use config::Config;
pub use pipeline::{analyze, AnalysisReport};
