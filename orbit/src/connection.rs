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

//! Connection and connection-factory seams.
//!
//! The invocation runtime binds references to connections but never opens
//! sockets itself; transports implement these traits. Tests supply mocks.

use crate::endpoint::{Endpoint, EndpointSelection};
use crate::error::{BindingError, TransportError};
use crate::invocation::OutgoingAsync;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

/// An established connection to one endpoint.
///
/// The connection owns request transmission and response correlation. It
/// reports progress back on the call itself: when `send_request` returns
/// `Ok(false)` the write was only queued and the connection must invoke
/// [`OutgoingAsync::sent`] with `synchronously == false` once the bytes
/// leave; when it returns `Ok(true)` the bytes were written inline and the
/// *caller* invokes `sent(true)`. Responses arrive through
/// [`OutgoingAsync::finished_ok`] / [`OutgoingAsync::finished_err`].
#[async_trait]
pub trait Connection: Send + Sync {
    /// Transmits one request.
    ///
    /// Returns whether the request was written synchronously. When
    /// `response_expected` is false the call completes as soon as it is
    /// sent; the connection must not deliver a response for it.
    ///
    /// # Errors
    ///
    /// A [`TransportError`] when the connection cannot accept the request.
    async fn send_request(
        &self,
        call: Arc<OutgoingAsync>,
        compress: bool,
        response_expected: bool,
    ) -> Result<bool, TransportError>;

    /// Transmits an accumulated batch of `count` requests as one message.
    ///
    /// # Errors
    ///
    /// A [`TransportError`] when the connection cannot accept the batch.
    async fn send_batch(
        &self,
        payload: Bytes,
        count: usize,
        compress: bool,
    ) -> Result<(), TransportError>;

    /// The endpoint this connection is bound to.
    fn endpoint(&self) -> &Endpoint;

    /// The connection's idle/operation timeout, if any.
    fn timeout(&self) -> Option<Duration>;

    /// Returns `true` while the connection can accept new requests.
    fn is_active(&self) -> bool;
}

/// Produces (or finds) connections for a candidate endpoint list.
///
/// Implementations typically pool connections keyed by
/// [`Endpoint::equivalent`]; pooling behavior belongs entirely to the
/// factory, the runtime only hands it candidates.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    /// Returns a connection serving one of `endpoints`.
    ///
    /// `has_more` tells the factory whether the caller holds further
    /// candidates to try, so it can fail fast instead of exhausting its own
    /// retries on the last option.
    ///
    /// # Errors
    ///
    /// [`BindingError::ConnectFailed`] when no candidate accepts a
    /// connection.
    async fn create(
        &self,
        endpoints: &[Endpoint],
        has_more: bool,
        selection: EndpointSelection,
    ) -> Result<Arc<dyn Connection>, BindingError>;
}
