// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! RAII guard that finalizes a [`TestLogger`] for the test macros.

use std::path::{Path, PathBuf};

use crate::{TestLogError, TestLogger};

/// Finalizes a test log exactly once.
///
/// `finish_success` and `finish_failure` consume the guard. Dropping it
/// without either (an early `?` return or a panic unwind) records a
/// failure.
pub struct TestLoggerGuard {
    logger: TestLogger,
    completed: bool,
}

impl TestLoggerGuard {
    pub fn new(test_name: &str) -> Result<Self, TestLogError> {
        Ok(Self {
            logger: TestLogger::new(test_name)?,
            completed: false,
        })
    }

    /// Borrow the logger for writing test diagnostics.
    pub fn logger(&mut self) -> &mut TestLogger {
        &mut self.logger
    }

    pub fn log_path(&self) -> &Path {
        self.logger.log_path()
    }

    pub fn finish_success(mut self) -> Result<PathBuf, TestLogError> {
        self.completed = true;
        self.logger.write_outcome(None)
    }

    pub fn finish_failure<S: AsRef<str>>(mut self, message: S) -> Result<PathBuf, TestLogError> {
        self.completed = true;
        self.logger.write_outcome(Some(message.as_ref()))
    }
}

impl Drop for TestLoggerGuard {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        let reason = if std::thread::panicking() {
            "test panicked"
        } else {
            "test returned before finishing its log"
        };
        if let Err(err) = self.logger.write_outcome(Some(reason)) {
            eprintln!(
                "failed to finalize test log {}: {}",
                self.logger.log_path().display(),
                err
            );
        }
    }
}
