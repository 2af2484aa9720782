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

//! Request handlers: the dispatch seam between a proxy and a connection.
//!
//! A proxy never talks to a connection directly; it talks to its current
//! [`RequestHandler`]. While the binding is still being established the
//! handler is a [`BindingRequestHandler`] that queues everything; once a
//! connection exists the proxy is atomically swapped to a
//! [`DirectRequestHandler`] that forwards without queuing. A
//! [`QueueingRequestHandler`] wraps any other handler to serialize
//! operations from multiple sources into one submission order.

mod binding;
mod direct;
mod queueing;

pub use binding::BindingRequestHandler;
pub use direct::DirectRequestHandler;
pub use queueing::{QueueingRequestHandler, SerialExecutor};

use crate::connection::Connection;
use crate::error::InvocationError;
use crate::invocation::OutgoingAsync;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use std::sync::Arc;

/// How a handler disposed of a submitted request.
///
/// Hard failures travel in the `Err` arm of the surrounding `Result`; this
/// type only carries the non-error outcomes, including the
/// retry-without-failure signal that would otherwise have to be a fake
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The request was queued behind an in-progress binding (or into a
    /// batch buffer) and will be transmitted later.
    Queued,
    /// The request was handed to the connection.
    Sent {
        /// Whether the bytes were written inline; when false the
        /// connection reports the send asynchronously.
        synchronously: bool,
    },
    /// The handler is stale and nothing was lost: the caller should clear
    /// the proxy's handler reference and resubmit. Not a failure.
    RetryWithoutFailure,
}

/// Dispatch seam between a proxy and its connection.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Submits one request for transmission.
    ///
    /// # Errors
    ///
    /// An [`InvocationError`] when the request can neither be sent nor
    /// queued; the caller consults the retry policy.
    async fn send_async_request(
        &self,
        call: Arc<OutgoingAsync>,
    ) -> Result<SendOutcome, InvocationError>;

    /// Appends one request to the handler's batch buffer.
    ///
    /// Enqueueing is serialized by a one-permit gate: only one batch
    /// preparation proceeds at a time, a second caller waits.
    ///
    /// # Errors
    ///
    /// An [`InvocationError`] when the handler has already failed
    /// terminally.
    async fn enqueue_batch(&self, payload: Bytes) -> Result<SendOutcome, InvocationError>;

    /// Discards the handler's accumulated batch buffer.
    async fn abort_batch(&self);

    /// Transmits the accumulated batch buffer as one message.
    ///
    /// # Errors
    ///
    /// An [`InvocationError`] when the buffer cannot be sent.
    async fn flush_batch(&self) -> Result<SendOutcome, InvocationError>;

    /// Cancels a pending request with the given error.
    ///
    /// Idempotent: a request that already completed is left untouched.
    fn request_canceled(&self, call: &Arc<OutgoingAsync>, error: InvocationError);

    /// The bound connection, once one exists.
    fn connection(&self) -> Option<Arc<dyn Connection>>;
}

/// Accumulated batch requests awaiting a flush.
#[derive(Debug, Default)]
pub(crate) struct BatchBuffer {
    payload: BytesMut,
    count: usize,
}

impl BatchBuffer {
    pub(crate) fn append(&mut self, payload: &Bytes) {
        self.payload.extend_from_slice(payload);
        self.count += 1;
    }

    pub(crate) fn take(&mut self) -> (Bytes, usize) {
        let count = self.count;
        self.count = 0;
        (self.payload.split().freeze(), count)
    }

    pub(crate) fn clear(&mut self) {
        self.payload.clear();
        self.count = 0;
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.count == 0
    }
}
