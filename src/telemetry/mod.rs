// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Logging and metrics infrastructure.
//!
//! - **Tracing**: structured logs to stderr, level from `console.log_level`,
//!   `--verbose`/`--debug`, or `RUST_LOG`
//! - **Metrics**: in-process counters for tool calls, server operations, and
//!   model requests (recorded when the `telemetry` feature is on)
//!
//! ```rust,ignore
//! use mcpsh::telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(&TelemetryConfig::from_log_level("info"))?;
//! ```

mod init;
pub mod metrics;

pub use init::{init_telemetry, TelemetryConfig, TelemetryGuard};
pub use metrics::{Histogram, Metrics, MetricsSnapshot, OperationMetrics, ToolMetrics, GLOBAL_METRICS};
