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

//! Invocation observability hooks.
//!
//! Every failed attempt is reported exactly once before a retry is
//! scheduled, distinct from the single terminal report the invocation
//! eventually produces. Observers are shared across all proxies of a
//! communicator.

use crate::error::InvocationError;

/// Receives per-invocation lifecycle reports.
///
/// All methods have no-op defaults so implementations only override what
/// they measure. Implementations must be cheap: reports are made from the
/// invocation path, not from a dispatcher.
pub trait InvocationObserver: Send + Sync {
    /// An attempt failed and a retry has been scheduled.
    ///
    /// `attempt` is 1 for the failure of the initial attempt, 2 for the
    /// failure of the first retry, and so on.
    fn attempt_failed(&self, operation: &str, error: &InvocationError, attempt: u32) {
        let _ = (operation, error, attempt);
    }

    /// The invocation completed successfully.
    fn succeeded(&self, operation: &str) {
        let _ = operation;
    }

    /// The invocation failed terminally; no further attempts will be made.
    fn failed(&self, operation: &str, error: &InvocationError) {
        let _ = (operation, error);
    }
}

/// Observer that records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl InvocationObserver for NoopObserver {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;

    #[test]
    fn noop_observer_accepts_reports() {
        let observer = NoopObserver;
        let error = InvocationError::Transport(TransportError::Closed);
        observer.attempt_failed("ping", &error, 1);
        observer.failed("ping", &error);
        observer.succeeded("ping");
    }
}
