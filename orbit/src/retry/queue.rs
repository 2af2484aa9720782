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

//! Delay-ordered re-submission of failed invocations.

use crate::error::InvocationError;
use crate::invocation::OutgoingAsync;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

struct Entry {
    call: Arc<OutgoingAsync>,
    task: Option<JoinHandle<()>>,
}

/// Holds invocations between a failed attempt and its re-submission.
///
/// Each scheduled call gets a timer task that re-invokes its send path
/// when the delay elapses. Outstanding entries are tracked so communicator
/// shutdown can cancel them instead of leaving callers parked forever.
pub struct RetryQueue {
    entries: Mutex<HashMap<u64, Entry>>,
    next_id: AtomicU64,
    shut_down: AtomicBool,
}

impl RetryQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            shut_down: AtomicBool::new(false),
        })
    }

    /// Schedules `call` for re-submission after `delay`.
    ///
    /// On a shut-down queue the call completes immediately as canceled.
    pub fn schedule(self: &Arc<Self>, call: Arc<OutgoingAsync>, delay: Duration) {
        if self.shut_down.load(Ordering::SeqCst) {
            call.report_canceled(InvocationError::Canceled);
            return;
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        // Registered before the timer starts so a zero delay cannot fire
        // into an entry that does not exist yet.
        self.entries.lock().unwrap().insert(
            id,
            Entry {
                call: call.clone(),
                task: None,
            },
        );
        trace!(id, ?delay, operation = call.operation(), "retry scheduled");

        let queue = self.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let entry = queue.entries.lock().unwrap().remove(&id);
            if let Some(entry) = entry {
                entry.call.invoke().await;
            }
        });

        let mut entries = self.entries.lock().unwrap();
        match entries.get_mut(&id) {
            Some(entry) => entry.task = Some(task),
            // Shut down in the meantime; the entry was drained and the
            // call already reported canceled.
            None => task.abort(),
        }
    }

    /// Number of invocations currently awaiting re-submission.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Returns `true` when nothing is awaiting re-submission.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cancels every outstanding entry and rejects future scheduling.
    pub fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
        let drained: Vec<Entry> = {
            let mut entries = self.entries.lock().unwrap();
            entries.drain().map(|(_, entry)| entry).collect()
        };
        if !drained.is_empty() {
            debug!(count = drained.len(), "canceling outstanding retries");
        }
        for entry in drained {
            if let Some(task) = entry.task {
                task.abort();
            }
            entry.call.report_canceled(InvocationError::Canceled);
        }
    }
}
