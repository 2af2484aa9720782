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

//! Caller-side handles for an in-flight invocation.

use super::OutgoingAsync;
use crate::communicator::Instance;
use crate::error::InvocationError;
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// Handle to one begun invocation.
///
/// Obtained from `Proxy::begin_invoke`; consumed by awaiting
/// [`wait`](Self::wait) or by `Proxy::end_invoke`.
pub struct AsyncResult {
    call: Arc<OutgoingAsync>,
    instance: Arc<Instance>,
}

impl AsyncResult {
    pub(crate) fn new(call: Arc<OutgoingAsync>, instance: Arc<Instance>) -> Self {
        Self { call, instance }
    }

    /// Returns `true` once the request bytes were handed to the transport.
    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.call.is_sent()
    }

    /// Returns `true` once the invocation has a terminal outcome.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.call.is_completed()
    }

    /// The operation name this result belongs to.
    #[must_use]
    pub fn operation(&self) -> &str {
        self.call.operation()
    }

    /// Cancels the invocation. Idempotent; a completed call is untouched.
    pub fn cancel(&self) {
        self.call.cancel();
    }

    /// Waits for completion and consumes the outcome.
    ///
    /// # Errors
    ///
    /// The invocation's terminal [`InvocationError`].
    pub async fn wait(self) -> Result<Bytes, InvocationError> {
        self.call.wait_ready().await;
        self.call.take_result()
    }

    /// Like [`wait`](Self::wait), but a triggered `token` cancels the
    /// pending request before the wait returns.
    ///
    /// # Errors
    ///
    /// The invocation's terminal [`InvocationError`];
    /// [`InvocationError::Canceled`] when the token fired first.
    pub async fn wait_with(self, token: &CancellationToken) -> Result<Bytes, InvocationError> {
        tokio::select! {
            () = self.call.wait_ready() => {}
            () = token.canceled() => {
                self.call.cancel();
                self.call.wait_ready().await;
            }
        }
        self.call.take_result()
    }

    pub(crate) fn call(&self) -> &Arc<OutgoingAsync> {
        &self.call
    }

    pub(crate) fn instance(&self) -> &Arc<Instance> {
        &self.instance
    }
}

#[derive(Default)]
struct TokenInner {
    canceled: AtomicBool,
    notify: Notify,
}

/// A reusable, clonable cancellation signal.
///
/// Triggering is sticky: once canceled, every present and future waiter
/// observes it.
#[derive(Clone, Default)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

impl CancellationToken {
    /// Creates an untriggered token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Triggers the token.
    pub fn cancel(&self) {
        self.inner.canceled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Returns `true` once the token was triggered.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.inner.canceled.load(Ordering::SeqCst)
    }

    /// Resolves when the token is triggered.
    pub async fn canceled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_canceled() {
                return;
            }
            notified.as_mut().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn token_is_sticky() {
        let token = CancellationToken::new();
        assert!(!token.is_canceled());
        token.cancel();
        assert!(token.is_canceled());
        // A waiter arriving after the trigger must still resolve.
        tokio::time::timeout(Duration::from_secs(1), token.canceled())
            .await
            .expect("late waiter must observe cancellation");
    }

    #[tokio::test]
    async fn token_wakes_existing_waiters() {
        let token = CancellationToken::new();
        let waiter = {
            let token = token.clone();
            tokio::spawn(async move { token.canceled().await })
        };
        tokio::task::yield_now().await;
        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter must wake")
            .expect("waiter must not panic");
    }
}
