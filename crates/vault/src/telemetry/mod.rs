//! Structured logging and optional OpenTelemetry span export.
//!
//! # Telemetry invariants
//!
//! - Secrets, tokens, and stored values never appear in any span attribute or
//!   log field. Subjects and key names may.
//! - Log level is configurable via `log_level` (default: `info`), overridden by
//!   `RUST_LOG` when set.

pub mod init;

pub use init::{init_telemetry, shutdown};
