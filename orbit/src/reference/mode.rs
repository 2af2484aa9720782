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

//! Invocation modes.

/// How requests made through a reference travel and complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InvocationMode {
    /// Request over a stream transport, response expected.
    #[default]
    Twoway,
    /// Request over a stream transport, no response; complete when sent.
    Oneway,
    /// Oneway requests accumulated and flushed as one message.
    BatchOneway,
    /// Request over a datagram transport, no response.
    Datagram,
    /// Datagram requests accumulated and flushed as one message.
    BatchDatagram,
}

impl InvocationMode {
    /// Returns `true` for modes that require a datagram transport.
    #[must_use]
    pub const fn is_datagram(&self) -> bool {
        matches!(self, Self::Datagram | Self::BatchDatagram)
    }

    /// Returns `true` for modes that accumulate requests into a batch.
    #[must_use]
    pub const fn is_batch(&self) -> bool {
        matches!(self, Self::BatchOneway | Self::BatchDatagram)
    }

    /// Returns `true` if a response is expected; only twoway calls wait
    /// for one, every other mode completes when its bytes are sent.
    #[must_use]
    pub const fn expects_response(&self) -> bool {
        matches!(self, Self::Twoway)
    }

    /// The proxy-string flag for this mode.
    #[must_use]
    pub const fn flag(&self) -> &'static str {
        match self {
            Self::Twoway => "-t",
            Self::Oneway => "-o",
            Self::BatchOneway => "-O",
            Self::Datagram => "-d",
            Self::BatchDatagram => "-D",
        }
    }
}
