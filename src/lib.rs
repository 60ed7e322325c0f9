//! ReviewPulse library: review ingestion, normalization and dashboard analytics.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod report;
pub mod source;
