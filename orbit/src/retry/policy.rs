//
// Copyright 2026 The Orbit Authors. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Retry classification and inter-attempt delays.

use crate::error::InvocationError;
use crate::reference::InvocationMode;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Error produced when parsing a retry-interval list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid retry interval `{token}`")]
pub struct RetryPolicyParseError {
    /// The token that was not a millisecond count or `-1`.
    pub token: String,
}

/// Decides whether a failed attempt is retried and after how long.
///
/// The policy is a fixed ordered list of inter-attempt delays, one entry
/// per retry. When the list is exhausted the last entry keeps repeating; a
/// leading `-1` in the configured string disables retry entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    intervals: Vec<Duration>,
    enabled: bool,
}

impl RetryPolicy {
    /// Creates a policy with the given inter-attempt delays.
    #[must_use]
    pub fn new(intervals: Vec<Duration>) -> Self {
        let enabled = !intervals.is_empty();
        Self { intervals, enabled }
    }

    /// Creates a policy that never retries.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            intervals: Vec::new(),
            enabled: false,
        }
    }

    /// The delay before retry number `attempt` (1-based), or `None` when
    /// retry is disabled.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if !self.enabled {
            return None;
        }
        let index = (attempt.max(1) as usize - 1).min(self.intervals.len() - 1);
        Some(self.intervals[index])
    }

    /// Whether `error` may be re-attempted.
    ///
    /// Retryable errors stop being retryable once the request bytes of a
    /// twoway call are known transmitted, unless the operation is
    /// idempotent or the caller opted into retrying transmitted requests
    /// (`may_retry_after_sent`): the runtime never silently re-executes a
    /// call the server may already have processed.
    #[must_use]
    pub fn should_retry(
        &self,
        error: &InvocationError,
        after_sent: bool,
        mode: InvocationMode,
        may_retry_after_sent: bool,
    ) -> bool {
        if !self.enabled || !error.is_retryable() {
            return false;
        }
        if after_sent && mode.expects_response() && !may_retry_after_sent {
            return false;
        }
        true
    }

    /// How many on-the-spot rebinds a stale handler gets before the
    /// condition is treated as a connection failure.
    #[must_use]
    pub(crate) fn handler_retry_limit(&self) -> u32 {
        if self.enabled {
            self.intervals.len() as u32
        } else {
            0
        }
    }
}

impl Default for RetryPolicy {
    /// One immediate retry interval, matching the configuration string
    /// `"0"`.
    fn default() -> Self {
        Self::new(vec![Duration::ZERO])
    }
}

impl FromStr for RetryPolicy {
    type Err = RetryPolicyParseError;

    /// Parses a whitespace-separated millisecond list, e.g. `"0 10 50"`.
    /// A `-1` token disables retry.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut intervals = Vec::new();
        for token in s.split_whitespace() {
            if token == "-1" {
                return Ok(Self::disabled());
            }
            let millis: u64 = token.parse().map_err(|_| RetryPolicyParseError {
                token: token.to_string(),
            })?;
            intervals.push(Duration::from_millis(millis));
        }
        if intervals.is_empty() {
            return Ok(Self::disabled());
        }
        Ok(Self::new(intervals))
    }
}
