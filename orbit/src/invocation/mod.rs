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

//! The asynchronous invocation state machine.
//!
//! One [`OutgoingAsync`] represents one invocation from submission through
//! sent, completed, canceled or retried. The caller holds an
//! [`AsyncResult`] to await, cancel or consume the outcome.

mod outgoing;
mod result;

pub use outgoing::{CompletionCallback, OutgoingAsync, SentCallback};
pub use result::{AsyncResult, CancellationToken};
