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

//! # Orbit
//!
//! Client-side invocation runtime for remote-object middleware: the layer
//! that turns a call on a remote-object handle (a [`Proxy`]) into bytes on
//! a [`Connection`], and turns connection failures into either a retried
//! call or a reported error.
//!
//! The runtime owns three tightly coupled pieces:
//!
//! - **Reference resolution** — a [`Reference`] maps a logical target to
//!   network endpoints: a direct endpoint list, an adapter id resolved
//!   through a locator (with TTL caching and stale-entry retry), or one
//!   pre-bound connection.
//! - **Request-handler binding** — calls made while a connection is still
//!   being established queue on a binding handler and drain in order once
//!   the connection exists, after which the proxy atomically switches to a
//!   direct fast path.
//! - **The invocation state machine** — each call tracks
//!   sent/completed/canceled state, enforces invocation timeouts, and
//!   consults the retry policy on failure.
//!
//! Transports are out of scope: implement [`Connection`] and
//! [`ConnectionFactory`] to plug one in.
//!
//! # Examples
//!
//! ```no_run
//! use bytes::Bytes;
//! use orbit::{
//!     BindingError, Communicator, Connection, ConnectionFactory, Endpoint,
//!     EndpointSelection, OutgoingAsync, TransportError,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! // A loopback transport that answers every request with its own payload.
//! struct EchoConnection {
//!     endpoint: Endpoint,
//! }
//!
//! #[async_trait::async_trait]
//! impl Connection for EchoConnection {
//!     async fn send_request(
//!         &self,
//!         call: Arc<OutgoingAsync>,
//!         _compress: bool,
//!         response_expected: bool,
//!     ) -> Result<bool, TransportError> {
//!         if response_expected {
//!             let payload = call.payload().clone();
//!             call.finished_ok(payload);
//!         }
//!         Ok(true)
//!     }
//!
//!     async fn send_batch(
//!         &self,
//!         _payload: Bytes,
//!         _count: usize,
//!         _compress: bool,
//!     ) -> Result<(), TransportError> {
//!         Ok(())
//!     }
//!
//!     fn endpoint(&self) -> &Endpoint {
//!         &self.endpoint
//!     }
//!
//!     fn timeout(&self) -> Option<Duration> {
//!         None
//!     }
//!
//!     fn is_active(&self) -> bool {
//!         true
//!     }
//! }
//!
//! struct EchoFactory;
//!
//! #[async_trait::async_trait]
//! impl ConnectionFactory for EchoFactory {
//!     async fn create(
//!         &self,
//!         endpoints: &[Endpoint],
//!         _has_more: bool,
//!         _selection: EndpointSelection,
//!     ) -> Result<Arc<dyn Connection>, BindingError> {
//!         Ok(Arc::new(EchoConnection {
//!             endpoint: endpoints[0].clone(),
//!         }))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let communicator = Communicator::builder(Arc::new(EchoFactory)).build();
//!     let proxy = communicator.string_to_proxy("greeter:tcp -h demo -p 4061")?;
//!     let reply = proxy.invoke("sayHello", true, Bytes::from_static(b"hi")).await?;
//!     assert_eq!(reply.as_ref(), b"hi");
//!     communicator.shutdown();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod communicator;
pub mod connection;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod handler;
pub mod invocation;
pub mod locator;
pub mod observer;
pub mod proxy;
pub mod reference;
pub mod retry;

pub use communicator::{Communicator, CommunicatorBuilder};
pub use connection::{Connection, ConnectionFactory};
pub use dispatch::{Dispatcher, TokioDispatcher};
pub use endpoint::{Endpoint, EndpointParseError, EndpointSelection, TransportKind};
pub use error::{BindingError, InvocationError, TransportError};
pub use handler::{
    BindingRequestHandler, DirectRequestHandler, QueueingRequestHandler, RequestHandler,
    SendOutcome, SerialExecutor,
};
pub use invocation::{AsyncResult, CancellationToken, OutgoingAsync};
pub use locator::{LocatorCache, LocatorResolver, Router};
pub use observer::{InvocationObserver, NoopObserver};
pub use proxy::{InvocationHooks, Proxy};
pub use reference::{Binding, Identity, InvocationMode, ProxyParseError, Reference};
pub use retry::{RetryPolicy, RetryQueue};
