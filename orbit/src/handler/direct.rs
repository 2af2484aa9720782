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

//! The fast path: a handler bound to a live connection.

use super::{BatchBuffer, RequestHandler, SendOutcome};
use crate::connection::Connection;
use crate::error::InvocationError;
use crate::invocation::OutgoingAsync;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Forwards every operation straight to its connection.
///
/// This is what a proxy holds after binding completes. Plain sends take no
/// lock at all; only the batch buffer is guarded. A handler whose
/// connection has gone inactive reports [`SendOutcome::RetryWithoutFailure`]
/// so the proxy drops it and rebinds, provided nothing was lost.
pub struct DirectRequestHandler {
    connection: Arc<dyn Connection>,
    compress: bool,
    batch: Mutex<BatchBuffer>,
    batch_gate: Semaphore,
}

impl DirectRequestHandler {
    /// Creates a handler over an established connection.
    #[must_use]
    pub fn new(connection: Arc<dyn Connection>, compress: bool) -> Self {
        Self::with_batch(connection, compress, BatchBuffer::default())
    }

    /// Creates a handler that inherits a batch buffer accumulated while the
    /// connection was still being established.
    pub(crate) fn with_batch(
        connection: Arc<dyn Connection>,
        compress: bool,
        batch: BatchBuffer,
    ) -> Self {
        Self {
            connection,
            compress,
            batch: Mutex::new(batch),
            batch_gate: Semaphore::new(1),
        }
    }
}

#[async_trait]
impl RequestHandler for DirectRequestHandler {
    async fn send_async_request(
        &self,
        call: Arc<OutgoingAsync>,
    ) -> Result<SendOutcome, InvocationError> {
        if !self.connection.is_active() {
            // Nothing was transmitted; the proxy rebinds and resubmits.
            return Ok(SendOutcome::RetryWithoutFailure);
        }
        let response_expected = call.expects_response();
        match self
            .connection
            .send_request(call.clone(), self.compress, response_expected)
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
        let mut batch = self.batch.lock().unwrap();
        if !self.connection.is_active() && batch.is_empty() {
            return Ok(SendOutcome::RetryWithoutFailure);
        }
        batch.append(&payload);
        Ok(SendOutcome::Queued)
    }

    async fn abort_batch(&self) {
        let _permit = self
            .batch_gate
            .acquire()
            .await
            .expect("batch gate is never closed");
        self.batch.lock().unwrap().clear();
    }

    async fn flush_batch(&self) -> Result<SendOutcome, InvocationError> {
        let _permit = self
            .batch_gate
            .acquire()
            .await
            .expect("batch gate is never closed");
        let (payload, count) = self.batch.lock().unwrap().take();
        if count == 0 {
            return Ok(SendOutcome::Sent { synchronously: true });
        }
        self.connection
            .send_batch(payload, count, self.compress)
            .await?;
        Ok(SendOutcome::Sent { synchronously: true })
    }

    fn request_canceled(&self, call: &Arc<OutgoingAsync>, error: InvocationError) {
        call.report_canceled(error);
    }

    fn connection(&self) -> Option<Arc<dyn Connection>> {
        Some(self.connection.clone())
    }
}
