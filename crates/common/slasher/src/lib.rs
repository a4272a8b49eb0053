//! Surround and double vote detection over per-epoch min-max spans.

pub mod attestation;
pub mod config;
pub mod detection;
pub mod detector;
pub mod errors;
pub mod locks;
pub mod memory_store;
pub mod span;
pub mod span_table;
