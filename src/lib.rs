//! Follow-up task filtering and date bucketing.
//!
//! This module exports the core components for testing and integration.

pub mod anchor;
pub mod buckets;
pub mod cli;
pub mod combo;
pub mod config;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod format;
pub mod ingest;
pub mod logging;
pub mod store;
pub mod tracker;
pub mod types;
