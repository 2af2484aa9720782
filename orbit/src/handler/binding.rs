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

//! The queue-until-connected handler.

use super::{BatchBuffer, DirectRequestHandler, RequestHandler, SendOutcome};
use crate::connection::Connection;
use crate::dispatch::Dispatcher;
use crate::error::InvocationError;
use crate::invocation::OutgoingAsync;
use crate::proxy::ProxyInner;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::Semaphore;
use tracing::{debug, trace, warn};

enum QueuedEntry {
    Request(Arc<OutgoingAsync>),
    FlushBatch { payload: Bytes, count: usize },
}

#[derive(Default)]
struct State {
    queue: VecDeque<QueuedEntry>,
    batch: BatchBuffer,
    connection: Option<Arc<dyn Connection>>,
    compress: bool,
    /// Set once the queue has fully drained onto the connection; from then
    /// on submissions forward directly.
    initialized: bool,
    /// Set while the drain is running with the lock released; submissions
    /// arriving meanwhile keep queueing behind the drain.
    flushing: bool,
    /// Terminal binding failure; once set, the handler never initializes.
    error: Option<InvocationError>,
    /// Set when the batch buffer has been handed to the direct handler;
    /// batch operations arriving afterwards must resubmit through the
    /// proxy's current handler.
    retired: bool,
}

/// Handler installed on a proxy while its connection is being established.
///
/// Requests submitted before the binding completes are queued in FIFO
/// order; the submitting task never blocks beyond a short lock hold. When
/// the binding task delivers a connection, the queue drains onto it in
/// submission order and the owning proxy is atomically swapped to a
/// [`DirectRequestHandler`]. When the binding fails, the error is recorded
/// and every queued call is failed through the dispatcher, never
/// synchronously from the drain path.
pub struct BindingRequestHandler {
    state: Mutex<State>,
    batch_gate: Semaphore,
    proxy: Weak<ProxyInner>,
    dispatcher: Arc<dyn Dispatcher>,
}

impl BindingRequestHandler {
    /// Creates a handler for the given proxy.
    ///
    /// The proxy owns the handler strongly; the handler only holds a weak
    /// back-reference so a dropped proxy cannot be kept alive by its own
    /// binding.
    #[must_use]
    pub fn new(proxy: Weak<ProxyInner>, dispatcher: Arc<dyn Dispatcher>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State::default()),
            batch_gate: Semaphore::new(1),
            proxy,
            dispatcher,
        })
    }

    /// Delivers the established connection and drains the queue onto it.
    ///
    /// Called exactly once by the binding task. The queue is drained one
    /// entry at a time with the state lock released around each send, so
    /// submissions arriving mid-drain slot in behind the entries already
    /// queued. On success the owning proxy is swapped to a direct handler.
    pub async fn set_connection(self: &Arc<Self>, connection: Arc<dyn Connection>, compress: bool) {
        {
            let mut state = self.state.lock().unwrap();
            debug_assert!(!state.initialized && !state.flushing);
            state.connection = Some(connection.clone());
            state.compress = compress;
            state.flushing = true;
        }
        debug!(endpoint = %connection.endpoint(), "binding complete, draining queued requests");

        loop {
            let entry = {
                let mut state = self.state.lock().unwrap();
                match state.queue.pop_front() {
                    Some(entry) => entry,
                    None => {
                        state.flushing = false;
                        state.initialized = true;
                        break;
                    }
                }
            };

            let result = match entry {
                QueuedEntry::Request(call) => {
                    if call.is_completed() {
                        // Canceled while queued.
                        continue;
                    }
                    match connection
                        .send_request(call.clone(), compress, call.expects_response())
                        .await
                    {
                        Ok(true) => {
                            call.sent(true);
                            Ok(())
                        }
                        Ok(false) => Ok(()),
                        Err(error) => Err((Some(call), InvocationError::from(error))),
                    }
                }
                QueuedEntry::FlushBatch { payload, count } => connection
                    .send_batch(payload, count, compress)
                    .await
                    .map_err(|error| (None, InvocationError::from(error))),
            };

            if let Err((failed_call, error)) = result {
                warn!(%error, "drain failed, failing remaining queued requests");
                if let Some(call) = failed_call {
                    let error = error.clone();
                    self.dispatcher
                        .post(Box::new(move || call.finished_err(error)));
                }
                self.set_exception(error);
                return;
            }
        }

        // Batch requests accumulated before the connection existed move to
        // the direct handler so a later flush still sees them. From this
        // point on this handler is retired and refuses batch operations.
        let batch = {
            let mut state = self.state.lock().unwrap();
            state.retired = true;
            std::mem::take(&mut state.batch)
        };
        if let Some(proxy) = self.proxy.upgrade() {
            let this: Arc<dyn RequestHandler> = self.clone();
            let direct: Arc<dyn RequestHandler> =
                Arc::new(DirectRequestHandler::with_batch(connection, compress, batch));
            proxy.swap_handler(&this, direct);
        }
    }

    /// Records a terminal binding failure and fails everything queued.
    ///
    /// Queued calls are completed through the dispatcher so their retry
    /// handling never runs on the binding task's stack. The proxy's handler
    /// reference is cleared so the next submission starts a fresh binding.
    pub fn set_exception(self: &Arc<Self>, error: InvocationError) {
        let drained = {
            let mut state = self.state.lock().unwrap();
            state.error = Some(error.clone());
            state.flushing = false;
            state.batch.clear();
            std::mem::take(&mut state.queue)
        };
        debug!(%error, queued = drained.len(), "binding failed");

        for entry in drained {
            match entry {
                QueuedEntry::Request(call) => {
                    let error = error.clone();
                    self.dispatcher
                        .post(Box::new(move || call.finished_err(error)));
                }
                QueuedEntry::FlushBatch { count, .. } => {
                    warn!(count, %error, "queued batch flush dropped by binding failure");
                }
            }
        }

        if let Some(proxy) = self.proxy.upgrade() {
            let this: Arc<dyn RequestHandler> = self.clone();
            proxy.clear_handler(&this);
        }
    }
}

#[async_trait]
impl RequestHandler for BindingRequestHandler {
    async fn send_async_request(
        &self,
        call: Arc<OutgoingAsync>,
    ) -> Result<SendOutcome, InvocationError> {
        let (connection, compress) = {
            let mut state = self.state.lock().unwrap();
            if let Some(error) = &state.error {
                return Err(error.clone());
            }
            if !state.initialized {
                trace!(operation = call.operation(), "queueing behind binding");
                state.queue.push_back(QueuedEntry::Request(call));
                return Ok(SendOutcome::Queued);
            }
            (
                state.connection.clone().ok_or(InvocationError::Canceled)?,
                state.compress,
            )
        };

        if !connection.is_active() {
            return Ok(SendOutcome::RetryWithoutFailure);
        }
        match connection
            .send_request(call.clone(), compress, call.expects_response())
            .await
        {
            Ok(true) => {
                call.sent(true);
                Ok(SendOutcome::Sent { synchronously: true })
            }
            Ok(false) => Ok(SendOutcome::Sent {
                synchronously: false,
            }),
            Err(error) => Err(error.into()),
        }
    }

    async fn enqueue_batch(&self, payload: Bytes) -> Result<SendOutcome, InvocationError> {
        let _permit = self
            .batch_gate
            .acquire()
            .await
            .expect("batch gate is never closed");
        let mut state = self.state.lock().unwrap();
        if let Some(error) = &state.error {
            return Err(error.clone());
        }
        if state.retired {
            // The buffer already moved to the direct handler; appending
            // here would strand the payload.
            return Ok(SendOutcome::RetryWithoutFailure);
        }
        if state.initialized {
            if let Some(connection) = &state.connection {
                if !connection.is_active() && state.batch.is_empty() {
                    return Ok(SendOutcome::RetryWithoutFailure);
                }
            }
        }
        state.batch.append(&payload);
        Ok(SendOutcome::Queued)
    }

    async fn abort_batch(&self) {
        let _permit = self
            .batch_gate
            .acquire()
            .await
            .expect("batch gate is never closed");
        self.state.lock().unwrap().batch.clear();
    }

    async fn flush_batch(&self) -> Result<SendOutcome, InvocationError> {
        let _permit = self
            .batch_gate
            .acquire()
            .await
            .expect("batch gate is never closed");
        let (connection, compress, payload, count) = {
            let mut state = self.state.lock().unwrap();
            if let Some(error) = &state.error {
                return Err(error.clone());
            }
            if state.retired {
                return Ok(SendOutcome::RetryWithoutFailure);
            }
            let (payload, count) = state.batch.take();
            if count == 0 {
                return Ok(SendOutcome::Sent { synchronously: true });
            }
            if !state.initialized {
                state
                    .queue
                    .push_back(QueuedEntry::FlushBatch { payload, count });
                return Ok(SendOutcome::Queued);
            }
            (
                state.connection.clone().ok_or(InvocationError::Canceled)?,
                state.compress,
                payload,
                count,
            )
        };
        connection.send_batch(payload, count, compress).await?;
        Ok(SendOutcome::Sent { synchronously: true })
    }

    fn request_canceled(&self, call: &Arc<OutgoingAsync>, error: InvocationError) {
        {
            let mut state = self.state.lock().unwrap();
            state.queue.retain(|entry| match entry {
                QueuedEntry::Request(queued) => !Arc::ptr_eq(queued, call),
                QueuedEntry::FlushBatch { .. } => true,
            });
        }
        call.report_canceled(error);
    }

    fn connection(&self) -> Option<Arc<dyn Connection>> {
        let state = self.state.lock().unwrap();
        if state.initialized {
            state.connection.clone()
        } else {
            None
        }
    }
}
