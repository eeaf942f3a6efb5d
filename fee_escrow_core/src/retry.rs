// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Bounded retries with a fixed delay for chain reads and remote signing.
//!
//! Only errors reporting [`Error::is_retryable`] are retried, so validation
//! failures surface on the first attempt.

use std::{future::Future, time::Duration};

use backoff::backoff::{Backoff, Constant};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub delay_ms: u64,
    /// Per-attempt timeout
    pub timeout_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay_ms: DEFAULT_RETRY_DELAY_MS,
            timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
        }
    }
}

impl RetryPolicy {
    /// A policy that tries exactly once
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Runs `call` until it succeeds, fails with a non-retryable error, or
    /// `max_attempts` is reached.
    ///
    /// # Errors
    ///
    /// Returns the first non-retryable error unchanged, or
    /// [`Error::RetriesExhausted`] once every attempt failed transiently.
    pub async fn retry<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut backoff = Constant::new(self.delay());
        let mut attempts = 0;

        loop {
            attempts += 1;
            let outcome = match tokio::time::timeout(self.timeout(), call()).await {
                Ok(result) => result,
                Err(_) => Err(Error::Timeout {
                    operation: operation.to_owned(),
                    timeout: self.timeout(),
                }),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) if attempts >= max_attempts => {
                    warn!("{operation} failed after {attempts} attempts, giving up: {err}");
                    return Err(Error::RetriesExhausted {
                        operation: operation.to_owned(),
                        attempts,
                        last_error: err.to_string(),
                    });
                }
                Err(err) => {
                    let delay = backoff.next_backoff().unwrap_or_else(|| self.delay());
                    warn!(
                        "{operation} failed, attempt {attempts}/{max_attempts}, retrying in {delay:?}: {err}"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
