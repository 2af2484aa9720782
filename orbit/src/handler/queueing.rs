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

//! Serialized execution over another handler.

use super::{RequestHandler, SendOutcome};
use crate::connection::Connection;
use crate::error::InvocationError;
use crate::invocation::OutgoingAsync;
use async_trait::async_trait;
use bytes::Bytes;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

/// One dedicated task that runs submitted jobs strictly in submission
/// order, each to completion before the next starts.
pub struct SerialExecutor {
    tx: mpsc::UnboundedSender<Job>,
}

impl Default for SerialExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialExecutor {
    /// Spawns the executor task.
    #[must_use]
    pub fn new() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                job.await;
            }
        });
        Self { tx }
    }

    pub(crate) fn submit(&self, job: Job) {
        // A send failure means the executor task is gone and the caller's
        // oneshot will report it.
        let _ = self.tx.send(job);
    }
}

/// Wraps another handler so that operations submitted from many tasks
/// execute in one well-defined order.
///
/// Every operation is shipped to a shared [`SerialExecutor`] and its result
/// comes back over a oneshot channel. Several queueing handlers sharing one
/// executor produce one global submission order across all of them, which
/// is what communicator-wide batch flushing relies on.
pub struct QueueingRequestHandler {
    delegate: Arc<dyn RequestHandler>,
    executor: Arc<SerialExecutor>,
}

impl QueueingRequestHandler {
    /// Wraps `delegate` so its operations run on `executor`.
    #[must_use]
    pub fn new(delegate: Arc<dyn RequestHandler>, executor: Arc<SerialExecutor>) -> Self {
        Self { delegate, executor }
    }

    async fn run<T, F>(&self, op: F) -> Result<T, InvocationError>
    where
        T: Send + 'static,
        F: FnOnce(Arc<dyn RequestHandler>) -> Pin<Box<dyn Future<Output = T> + Send>>
            + Send
            + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let delegate = self.delegate.clone();
        self.executor.submit(Box::pin(async move {
            let _ = tx.send(op(delegate).await);
        }));
        rx.await.map_err(|_| InvocationError::Canceled)
    }
}

#[async_trait]
impl RequestHandler for QueueingRequestHandler {
    async fn send_async_request(
        &self,
        call: Arc<OutgoingAsync>,
    ) -> Result<SendOutcome, InvocationError> {
        self.run(move |delegate| {
            Box::pin(async move { delegate.send_async_request(call).await })
        })
        .await?
    }

    async fn enqueue_batch(&self, payload: Bytes) -> Result<SendOutcome, InvocationError> {
        self.run(move |delegate| Box::pin(async move { delegate.enqueue_batch(payload).await }))
            .await?
    }

    async fn abort_batch(&self) {
        let _ = self
            .run(move |delegate| Box::pin(async move { delegate.abort_batch().await }))
            .await;
    }

    async fn flush_batch(&self) -> Result<SendOutcome, InvocationError> {
        self.run(move |delegate| Box::pin(async move { delegate.flush_batch().await }))
            .await?
    }

    fn request_canceled(&self, call: &Arc<OutgoingAsync>, error: InvocationError) {
        // Cancellation is latency-sensitive and idempotent; it skips the
        // queue and goes straight to the delegate.
        self.delegate.request_canceled(call, error);
    }

    fn connection(&self) -> Option<Arc<dyn Connection>> {
        self.delegate.connection()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::sync::Semaphore;

    /// Delegate that parks every operation on a gate before recording it.
    struct GatedDelegate {
        gate: Semaphore,
        seen: Mutex<Vec<Bytes>>,
    }

    impl GatedDelegate {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                gate: Semaphore::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl RequestHandler for GatedDelegate {
        async fn send_async_request(
            &self,
            _call: Arc<OutgoingAsync>,
        ) -> Result<SendOutcome, InvocationError> {
            Ok(SendOutcome::Queued)
        }

        async fn enqueue_batch(&self, payload: Bytes) -> Result<SendOutcome, InvocationError> {
            self.gate.acquire().await.expect("gate closed").forget();
            self.seen.lock().unwrap().push(payload);
            Ok(SendOutcome::Queued)
        }

        async fn abort_batch(&self) {}

        async fn flush_batch(&self) -> Result<SendOutcome, InvocationError> {
            Ok(SendOutcome::Sent { synchronously: true })
        }

        fn request_canceled(&self, call: &Arc<OutgoingAsync>, error: InvocationError) {
            call.report_canceled(error);
        }

        fn connection(&self) -> Option<Arc<dyn Connection>> {
            None
        }
    }

    #[tokio::test]
    async fn operations_run_in_submission_order() {
        let executor = Arc::new(SerialExecutor::new());
        let delegate = GatedDelegate::new();
        let handler = Arc::new(QueueingRequestHandler::new(delegate.clone(), executor));

        let mut pending = Vec::new();
        for payload in [&b"first"[..], b"second", b"third"] {
            let handler = handler.clone();
            let payload = Bytes::from_static(payload);
            pending.push(tokio::spawn(
                async move { handler.enqueue_batch(payload).await },
            ));
            // Pin down the submission order before spawning the next caller.
            tokio::task::yield_now().await;
        }

        // The first operation is parked on the gate; the later submissions
        // must wait behind it, not run ahead.
        tokio::task::yield_now().await;
        assert!(delegate.seen.lock().unwrap().is_empty());

        delegate.gate.add_permits(3);
        for task in pending {
            let outcome = task.await.unwrap().unwrap();
            assert_eq!(outcome, SendOutcome::Queued);
        }
        let seen = delegate.seen.lock().unwrap().clone();
        assert_eq!(seen, ["first", "second", "third"]);
    }
}
