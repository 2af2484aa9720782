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

//! Error types for the invocation runtime.
//!
//! Failures are layered the way the runtime recovers from them:
//!
//! 1. **Binding failures** ([`BindingError`]): the reference could not be
//!    resolved to a live connection. Retryable unless no endpoint exists.
//! 2. **Transport failures** ([`TransportError`]): an established connection
//!    failed while a request was on it. Retryable per the retry policy.
//! 3. **Application failures**: user or server reported errors carried
//!    through unchanged. Never retried.
//!
//! Timeouts and explicit cancellation are terminal and never retried. All
//! error types are `Clone` so a terminal error recorded on a request handler
//! can be re-delivered to every caller queued behind the failed binding; I/O
//! sources are held in `Arc` for the same reason.

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while resolving a reference to a connection.
///
/// Binding failures occur before any request bytes reach a connection, so
/// with the exception of [`BindingError::NoEndpoint`] they are safe to retry.
#[derive(Debug, Clone, Error)]
pub enum BindingError {
    /// Endpoint filtering left nothing to connect to.
    ///
    /// This is terminal: retrying the same reference would filter the same
    /// endpoint set down to nothing again.
    #[error("no suitable endpoint for `{proxy}`")]
    NoEndpoint {
        /// Stringified form of the reference that failed to bind.
        proxy: String,
    },

    /// The locator could not resolve an adapter id to endpoints.
    #[error("locator lookup for adapter `{adapter_id}` failed: {message}")]
    LocatorLookup {
        /// The adapter id that was being resolved.
        adapter_id: String,
        /// Description of the lookup failure.
        message: String,
    },

    /// A connection attempt to a concrete endpoint failed.
    #[error("failed to connect to {endpoint}: {source}")]
    ConnectFailed {
        /// Display form of the endpoint that refused the connection.
        endpoint: String,
        /// The underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// A mutation was attempted on a fixed reference.
    ///
    /// A fixed reference is pre-bound to a single connection; operations
    /// that would change its endpoints, adapter id or router cannot succeed.
    #[error("reference is fixed; its binding cannot change")]
    FixedReference,

    /// A fixed reference's connection does not match the reference.
    ///
    /// Raised when the pre-bound connection's endpoint disagrees with the
    /// reference's invocation mode or security requirements.
    #[error("fixed connection is unusable: {reason}")]
    IncompatibleConnection {
        /// Why the connection cannot serve this reference.
        reason: String,
    },
}

impl BindingError {
    /// Returns `true` if re-running the binding could succeed.
    ///
    /// `NoEndpoint` is terminal by definition; lookup and connect failures
    /// are transient network conditions.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::LocatorLookup { .. } | Self::ConnectFailed { .. }
        )
    }
}

/// Errors raised by an established connection.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The connection dropped while in use.
    #[error("connection lost: {reason}")]
    ConnectionLost {
        /// Description of why the connection was lost.
        reason: String,
        /// The underlying I/O error, if available.
        #[source]
        source: Option<Arc<io::Error>>,
    },

    /// Writing a request to the connection failed.
    #[error("send failed: {source}")]
    SendFailed {
        /// The underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// The connection was closed before or during the operation.
    #[error("connection is closed")]
    Closed,
}

impl TransportError {
    /// Returns `true` if the failure may clear on a fresh connection.
    ///
    /// All transport failures are retryable at this layer; whether a given
    /// *invocation* may be retried also depends on how far it got, which the
    /// retry policy decides.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionLost { .. } | Self::SendFailed { .. } | Self::Closed
        )
    }
}

/// Top-level error delivered to invocation callers.
///
/// Composes the binding and transport layers with application failures,
/// timeouts and cancellation. The original layer error is preserved so the
/// caller receives what actually happened rather than a generic wrapper.
#[derive(Debug, Clone)]
pub enum InvocationError {
    /// The reference could not be bound to a connection.
    Binding(BindingError),

    /// An established connection failed during the invocation.
    Transport(TransportError),

    /// The server or application reported a failure.
    ///
    /// Application failures are propagated as-is and never retried.
    Application(Arc<dyn StdError + Send + Sync>),

    /// The invocation timeout elapsed before the call completed.
    TimedOut {
        /// The configured invocation timeout.
        duration: Duration,
    },

    /// The invocation was canceled explicitly.
    Canceled,
}

impl InvocationError {
    /// Returns `true` if the retry policy may re-attempt this failure.
    ///
    /// Timeouts, cancellation and application failures are always terminal;
    /// binding and transport failures defer to their own classification.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Binding(e) => e.is_retryable(),
            Self::Transport(e) => e.is_retryable(),
            Self::Application(_) | Self::TimedOut { .. } | Self::Canceled => false,
        }
    }

    /// Returns `true` if this is a binding-layer failure.
    #[must_use]
    pub const fn is_binding_error(&self) -> bool {
        matches!(self, Self::Binding(_))
    }

    /// Returns `true` if this is a transport-layer failure.
    #[must_use]
    pub const fn is_transport_error(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` if this failure happened at the transport level,
    /// i.e. while connecting to or using a concrete endpoint.
    ///
    /// This is the class of failure that invalidates cached locator results:
    /// the endpoints resolved fine but did not work.
    #[must_use]
    pub const fn invalidates_endpoints(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Binding(BindingError::ConnectFailed { .. })
        )
    }
}

impl fmt::Display for InvocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binding(e) => write!(f, "binding error: {}", e),
            Self::Transport(e) => write!(f, "transport error: {}", e),
            Self::Application(e) => write!(f, "application error: {}", e),
            Self::TimedOut { duration } => {
                write!(f, "invocation timed out after {:?}", duration)
            }
            Self::Canceled => write!(f, "invocation canceled"),
        }
    }
}

impl StdError for InvocationError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Binding(e) => Some(e),
            Self::Transport(e) => Some(e),
            Self::Application(e) => Some(e.as_ref()),
            Self::TimedOut { .. } | Self::Canceled => None,
        }
    }
}

impl From<BindingError> for InvocationError {
    fn from(error: BindingError) -> Self {
        Self::Binding(error)
    }
}

impl From<TransportError> for InvocationError {
    fn from(error: TransportError) -> Self {
        Self::Transport(error)
    }
}
