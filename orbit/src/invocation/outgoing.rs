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

//! Lifecycle of a single invocation.

use crate::error::{InvocationError, TransportError};
use crate::handler::{RequestHandler, SendOutcome};
use crate::proxy::ProxyInner;
use crate::reference::InvocationMode;
use bytes::Bytes;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Runs when the request's bytes have left; the flag says whether the
/// write happened inline on the submitting task.
pub type SentCallback = Box<dyn FnOnce(bool) + Send>;

/// Runs exactly once with the invocation's terminal outcome.
pub type CompletionCallback = Box<dyn FnOnce(Result<Bytes, InvocationError>) + Send>;

const SENT: u8 = 0b0000_0001;
const DONE: u8 = 0b0000_0010;
const OK: u8 = 0b0000_0100;
const END_CALLED: u8 = 0b0000_1000;
const SENT_SYNCHRONOUSLY: u8 = 0b0001_0000;

struct CallState {
    flags: u8,
    /// Failed attempts so far; indexes into the retry-interval list.
    attempt: u32,
    handler: Option<Arc<dyn RequestHandler>>,
    result: Option<Result<Bytes, InvocationError>>,
    timeout_task: Option<JoinHandle<()>>,
    sent_callback: Option<SentCallback>,
    completion_callback: Option<CompletionCallback>,
}

/// One in-flight (or queued, or retried) invocation.
///
/// The state machine is a handful of flag bits plus a result slot behind a
/// mutex held only for O(1) bookkeeping; waiters park on a [`Notify`].
/// Connections drive it through [`sent`](Self::sent),
/// [`finished_ok`](Self::finished_ok) and
/// [`finished_err`](Self::finished_err); failures consult the retry policy
/// before they become terminal.
pub struct OutgoingAsync {
    proxy: Arc<ProxyInner>,
    operation: String,
    idempotent: bool,
    payload: Bytes,
    mode: InvocationMode,
    invocation_timeout: Option<Duration>,
    state: Mutex<CallState>,
    completed: Notify,
}

impl OutgoingAsync {
    pub(crate) fn new(
        proxy: Arc<ProxyInner>,
        operation: impl Into<String>,
        idempotent: bool,
        payload: Bytes,
    ) -> Arc<Self> {
        let mode = proxy.reference().mode();
        let invocation_timeout = proxy
            .reference()
            .invocation_timeout()
            .or_else(|| proxy.instance().default_invocation_timeout());
        Arc::new(Self {
            proxy,
            operation: operation.into(),
            idempotent,
            payload,
            mode,
            invocation_timeout,
            state: Mutex::new(CallState {
                flags: 0,
                attempt: 0,
                handler: None,
                result: None,
                timeout_task: None,
                sent_callback: None,
                completion_callback: None,
            }),
            completed: Notify::new(),
        })
    }

    /// The operation name this invocation carries.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// The marshaled (opaque) request arguments.
    #[must_use]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// The invocation mode.
    #[must_use]
    pub const fn mode(&self) -> InvocationMode {
        self.mode
    }

    /// Whether a response is expected; false for oneway and datagram calls,
    /// which complete as soon as they are sent.
    #[must_use]
    pub const fn expects_response(&self) -> bool {
        self.mode.expects_response()
    }

    /// Returns `true` once the request bytes were handed to the transport.
    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.state.lock().unwrap().flags & SENT != 0
    }

    /// Returns `true` once the invocation has a terminal outcome.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.state.lock().unwrap().flags & DONE != 0
    }

    pub(crate) fn set_sent_callback(&self, callback: SentCallback) {
        self.state.lock().unwrap().sent_callback = Some(callback);
    }

    pub(crate) fn set_completion_callback(&self, callback: CompletionCallback) {
        self.state.lock().unwrap().completion_callback = Some(callback);
    }

    /// Drives the send through the proxy's current handler.
    ///
    /// Invoked once by the proxy and again by the retry queue for each
    /// re-attempt. A [`SendOutcome::RetryWithoutFailure`] clears the
    /// proxy's handler reference and resubmits on the spot; a hard failure
    /// goes through the retry policy.
    pub(crate) async fn invoke(self: &Arc<Self>) {
        if self.is_completed() {
            return;
        }
        self.start_timeout_watchdog();

        let mut handler_retries: u32 = 0;
        loop {
            let handler = self.proxy.request_handler();
            {
                let mut state = self.state.lock().unwrap();
                if state.flags & DONE != 0 {
                    return;
                }
                state.handler = Some(handler.clone());
            }
            match handler.send_async_request(self.clone()).await {
                Ok(SendOutcome::Queued | SendOutcome::Sent { .. }) => return,
                Ok(SendOutcome::RetryWithoutFailure) => {
                    self.proxy.clear_handler(&handler);
                    handler_retries += 1;
                    let limit = self.proxy.instance().retry_policy().handler_retry_limit();
                    if handler_retries > limit {
                        self.complete(Err(TransportError::Closed.into()));
                        return;
                    }
                    trace!(
                        operation = %self.operation,
                        handler_retries,
                        "stale handler, rebinding"
                    );
                }
                Err(error) => {
                    self.handle_exception(error);
                    return;
                }
            }
        }
    }

    /// Marks the request transmitted.
    ///
    /// Invoked by whoever learned the bytes left: the sender itself for a
    /// synchronous write, the connection later for a queued one. A call
    /// that expects no response completes here with an empty payload. The
    /// sent callback, if any, runs through the dispatcher, never on the
    /// connection's stack.
    pub fn sent(&self, synchronously: bool) {
        let callback = {
            let mut state = self.state.lock().unwrap();
            if state.flags & DONE != 0 {
                return;
            }
            state.flags |= SENT;
            if synchronously {
                state.flags |= SENT_SYNCHRONOUSLY;
            }
            state.sent_callback.take()
        };
        trace!(operation = %self.operation, synchronously, "request sent");
        if let Some(callback) = callback {
            self.proxy
                .instance()
                .dispatcher()
                .post(Box::new(move || callback(synchronously)));
        }
        if !self.expects_response() {
            self.complete(Ok(Bytes::new()));
        }
    }

    /// Delivers the successful response payload.
    pub fn finished_ok(&self, payload: Bytes) {
        self.complete(Ok(payload));
    }

    /// Delivers a failure; the retry policy decides whether it is terminal.
    pub fn finished_err(self: &Arc<Self>, error: InvocationError) {
        self.handle_exception(error);
    }

    /// Cancels the invocation explicitly. Idempotent; a completed call is
    /// left untouched.
    pub fn cancel(self: &Arc<Self>) {
        self.cancel_with(InvocationError::Canceled);
    }

    fn cancel_with(self: &Arc<Self>, error: InvocationError) {
        let handler = {
            let state = self.state.lock().unwrap();
            if state.flags & DONE != 0 {
                return;
            }
            state.handler.clone()
        };
        match handler {
            Some(handler) => handler.request_canceled(self, error),
            None => self.report_canceled(error),
        }
    }

    /// Completes the call with a cancellation-class error, bypassing the
    /// retry policy. Idempotent.
    pub(crate) fn report_canceled(&self, error: InvocationError) {
        self.complete(Err(error));
    }

    /// Classifies a failure: schedule a retry or make it terminal.
    fn handle_exception(self: &Arc<Self>, error: InvocationError) {
        let policy = self.proxy.instance().retry_policy();
        let scheduled = {
            let mut state = self.state.lock().unwrap();
            if state.flags & DONE != 0 {
                return;
            }
            state.attempt += 1;
            let after_sent = state.flags & SENT != 0;
            let may_retry_after_sent =
                self.idempotent || self.proxy.reference().retry_transmitted();
            if policy.should_retry(&error, after_sent, self.mode, may_retry_after_sent) {
                policy.delay_for(state.attempt).map(|delay| {
                    state.handler = None;
                    state.flags &= !(SENT | SENT_SYNCHRONOUSLY);
                    (state.attempt, delay)
                })
            } else {
                None
            }
        };

        match scheduled {
            Some((attempt, delay)) => {
                self.proxy
                    .instance()
                    .observer()
                    .attempt_failed(&self.operation, &error, attempt);
                if error.invalidates_endpoints() {
                    if let (Some(cache), Some(adapter_id)) = (
                        self.proxy.instance().locator(),
                        self.proxy.reference().adapter_id(),
                    ) {
                        cache.invalidate(adapter_id);
                    }
                }
                debug!(
                    operation = %self.operation,
                    attempt,
                    ?delay,
                    %error,
                    "scheduling retry"
                );
                self.proxy
                    .instance()
                    .retry_queue()
                    .schedule(self.clone(), delay);
            }
            None => self.complete(Err(error)),
        }
    }

    /// Records the terminal outcome exactly once and wakes everyone.
    fn complete(&self, result: Result<Bytes, InvocationError>) {
        let (callback, timeout_task) = {
            let mut state = self.state.lock().unwrap();
            if state.flags & DONE != 0 {
                return;
            }
            state.flags |= DONE;
            if result.is_ok() {
                state.flags |= OK;
            }
            state.result = Some(result.clone());
            (state.completion_callback.take(), state.timeout_task.take())
        };
        if let Some(task) = timeout_task {
            task.abort();
        }
        let observer = self.proxy.instance().observer();
        match &result {
            Ok(_) => observer.succeeded(&self.operation),
            Err(error) => observer.failed(&self.operation, error),
        }
        if let Some(callback) = callback {
            self.proxy
                .instance()
                .dispatcher()
                .post(Box::new(move || callback(result)));
        }
        self.completed.notify_waiters();
    }

    /// Parks until the invocation reaches a terminal state.
    pub(crate) async fn wait_ready(&self) {
        loop {
            let notified = self.completed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_completed() {
                return;
            }
            notified.as_mut().await;
        }
    }

    /// Consumes the terminal outcome.
    ///
    /// # Panics
    ///
    /// Panics when called twice for the same invocation; consuming a
    /// result twice is a caller bug, not a runtime condition.
    pub(crate) fn take_result(&self) -> Result<Bytes, InvocationError> {
        let mut state = self.state.lock().unwrap();
        assert!(
            state.flags & DONE != 0,
            "invocation result taken before completion"
        );
        assert!(
            state.flags & END_CALLED == 0,
            "invocation result consumed twice"
        );
        state.flags |= END_CALLED;
        state.result.take().unwrap_or(Err(InvocationError::Canceled))
    }

    fn start_timeout_watchdog(self: &Arc<Self>) {
        let Some(duration) = self.invocation_timeout else {
            return;
        };
        let mut state = self.state.lock().unwrap();
        if state.flags & DONE != 0 || state.timeout_task.is_some() {
            return;
        }
        let call = self.clone();
        state.timeout_task = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            warn!(
                operation = %call.operation,
                ?duration,
                "invocation timed out"
            );
            call.cancel_with(InvocationError::TimedOut { duration });
        }));
    }

    pub(crate) fn proxy(&self) -> &Arc<ProxyInner> {
        &self.proxy
    }
}
