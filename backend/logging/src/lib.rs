//! Structured logging for textra: human-readable diagnostics on stderr and an
//! optional NDJSON log file.

pub mod logger;

pub use logger::init_logger;
