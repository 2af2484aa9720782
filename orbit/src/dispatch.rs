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

//! Executor seam for user-visible callbacks.
//!
//! Completion and sent callbacks never run on the code path that produced
//! them: a connection finishing a request must not re-enter user code while
//! its own state is mid-transition, and a thread draining another caller's
//! queued requests must not pay for that caller's callback. Everything
//! user-visible is posted through a [`Dispatcher`].

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send>;

/// Posts callbacks for execution off the calling code path.
pub trait Dispatcher: Send + Sync {
    /// Schedule `task` to run later. Must not execute it inline.
    fn post(&self, task: Task);
}

/// Default dispatcher backed by the Tokio runtime.
///
/// Each task runs on its own spawned task; ordering between posted tasks is
/// not guaranteed. Callers that need ordering serialize before posting.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioDispatcher;

impl TokioDispatcher {
    /// Creates a new Tokio-backed dispatcher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dispatcher for TokioDispatcher {
    fn post(&self, task: Task) {
        tokio::spawn(async move {
            task();
        });
    }
}
