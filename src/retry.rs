// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Retry policy for WAPI calls.
//!
//! The grid master answers 429 while it is busy and 5xx while services restart
//! (after a grid restart or a member failover). Those, and connection failures, are
//! retried with exponential backoff and jitter until a total time budget runs out.
//! Everything else fails on the first attempt. Retrying lives in the HTTP client
//! only; resource operations never retry on their own.

use rand::Rng;
use std::time::{Duration, Instant};

use crate::constants::DEFAULT_MAX_RETRY_ELAPSED_SECS;

/// Delay before the first retry (50ms)
const INITIAL_DELAY_MILLIS: u64 = 50;

/// Longest delay between two attempts (10 seconds)
const MAX_DELAY_SECS: u64 = 10;

/// Growth factor between consecutive delays
const DELAY_MULTIPLIER: u32 = 2;

/// Jitter applied to every delay, as a fraction of it (±10%)
const JITTER_FRACTION: f64 = 0.1;

/// How long and how often to retry one request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Total time budget; zero disables retries
    pub max_elapsed: Duration,
    pub multiplier: u32,
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(INITIAL_DELAY_MILLIS),
            max_delay: Duration::from_secs(MAX_DELAY_SECS),
            max_elapsed: Duration::from_secs(DEFAULT_MAX_RETRY_ELAPSED_SECS),
            multiplier: DELAY_MULTIPLIER,
            jitter: JITTER_FRACTION,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = max_elapsed;
        self
    }

    /// Policy that never retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self::default().with_max_elapsed(Duration::ZERO)
    }

    /// Start the clock for one request.
    #[must_use]
    pub fn start(&self) -> Backoff {
        Backoff {
            policy: *self,
            next_delay: self.initial_delay,
            started: Instant::now(),
            retries: 0,
        }
    }
}

/// Backoff state of one request.
#[derive(Debug)]
pub struct Backoff {
    policy: RetryPolicy,
    next_delay: Duration,
    started: Instant,
    retries: u32,
}

impl Backoff {
    /// Delay before the next attempt, or `None` once the time budget is spent.
    ///
    /// The last delay is shortened so the budget is never overrun.
    pub fn next_delay(&mut self) -> Option<Duration> {
        let remaining = self.policy.max_elapsed.checked_sub(self.started.elapsed())?;
        if remaining.is_zero() {
            return None;
        }

        let delay = with_jitter(self.next_delay, self.policy.jitter).min(remaining);
        self.next_delay = self
            .next_delay
            .saturating_mul(self.policy.multiplier)
            .min(self.policy.max_delay);
        self.retries += 1;
        Some(delay)
    }

    /// Retries handed out so far.
    #[must_use]
    pub fn retries(&self) -> u32 {
        self.retries
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

fn with_jitter(delay: Duration, fraction: f64) -> Duration {
    if fraction <= 0.0 {
        return delay;
    }
    let secs = delay.as_secs_f64();
    let spread = secs * fraction;
    let jittered = rand::thread_rng().gen_range((secs - spread)..=(secs + spread));
    Duration::from_secs_f64(jittered.max(0.0))
}

/// True for HTTP statuses worth another attempt: 429, 500, 502, 503 and 504.
#[must_use]
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// True for HTTP statuses worth retrying a create: only 429, which the appliance
/// returns before acting on the request.
#[must_use]
pub fn is_retryable_create_status(status: u16) -> bool {
    status == 429
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod retry_tests;
