// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Shared test infrastructure for codio crates.
//!
//! Every test writes its diagnostics to its own file under
//! `target/test-logs/<date>/`. A passing test prints one line. A failing
//! test prints the log path and size so the full transcript can be opened
//! directly instead of being dumped into the terminal.

// Lets the attribute macros refer to `::codio_test_utils` from inside this crate.
extern crate self as codio_test_utils;

mod guard;
pub mod logging;

pub use codio_test_utils_macros::{logged_test, logged_tokio_test};
pub use guard::TestLoggerGuard;
pub use logging::{TestLogError, TestLogger, create_unique_test_log};
