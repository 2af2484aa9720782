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

//! The user-facing remote-object handle.

use crate::communicator::Instance;
use crate::error::{BindingError, InvocationError, TransportError};
use crate::handler::{BindingRequestHandler, RequestHandler, SendOutcome};
use crate::invocation::{AsyncResult, CompletionCallback, OutgoingAsync, SentCallback};
use crate::locator::Router;
use crate::reference::{Identity, InvocationMode, Reference};
use bytes::Bytes;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared core of a proxy: the immutable reference plus the atomically
/// replaceable request-handler cell.
pub(crate) struct ProxyInner {
    reference: Reference,
    instance: Arc<Instance>,
    handler: Mutex<Option<Arc<dyn RequestHandler>>>,
}

fn same_handler(a: &Arc<dyn RequestHandler>, b: &Arc<dyn RequestHandler>) -> bool {
    Arc::as_ptr(a).cast::<()>() == Arc::as_ptr(b).cast::<()>()
}

impl ProxyInner {
    pub(crate) fn reference(&self) -> &Reference {
        &self.reference
    }

    pub(crate) fn instance(&self) -> &Arc<Instance> {
        &self.instance
    }

    /// Returns the current handler, binding first if none exists.
    ///
    /// With connection caching the handler is stored on the proxy and
    /// shared by concurrent callers, so at most one binding task (and at
    /// most one factory call) runs per handler. Without caching every call
    /// gets a fresh binding.
    pub(crate) fn request_handler(self: &Arc<Self>) -> Arc<dyn RequestHandler> {
        let caching = self.reference.cache_connection();
        if caching {
            if let Some(handler) = self.handler.lock().unwrap().clone() {
                return handler;
            }
        }

        let binding = BindingRequestHandler::new(
            Arc::downgrade(self),
            self.instance.dispatcher().clone(),
        );
        let handler: Arc<dyn RequestHandler> = binding.clone();
        if caching {
            let mut guard = self.handler.lock().unwrap();
            if let Some(existing) = guard.clone() {
                // Lost the race; the other caller's binding task wins and
                // ours never starts.
                return existing;
            }
            *guard = Some(handler.clone());
        }
        self.instance.spawn_binding(self.reference.clone(), binding);
        handler
    }

    /// The current handler without triggering a binding.
    pub(crate) fn current_handler(&self) -> Option<Arc<dyn RequestHandler>> {
        self.handler.lock().unwrap().clone()
    }

    /// Clears the handler cell if it still holds `old`.
    pub(crate) fn clear_handler(&self, old: &Arc<dyn RequestHandler>) {
        let mut guard = self.handler.lock().unwrap();
        if guard.as_ref().is_some_and(|current| same_handler(current, old)) {
            *guard = None;
        }
    }

    /// Replaces `old` with `new` in the handler cell; a cell that moved on
    /// in the meantime is left alone.
    pub(crate) fn swap_handler(&self, old: &Arc<dyn RequestHandler>, new: Arc<dyn RequestHandler>) {
        let mut guard = self.handler.lock().unwrap();
        if guard.as_ref().is_some_and(|current| same_handler(current, old)) {
            *guard = Some(new);
        }
    }
}

/// Optional per-invocation callbacks.
#[derive(Default)]
pub struct InvocationHooks {
    /// Runs when the request bytes leave, with the synchronous-write flag.
    pub on_sent: Option<SentCallback>,
    /// Runs exactly once with the terminal outcome.
    pub on_completed: Option<CompletionCallback>,
}

/// Handle to a remote object.
///
/// Cheap to clone; clones share the reference and the bound connection.
/// The `with_*` configuration methods return new proxies over mutated
/// references with their own (initially unbound) handler cell.
#[derive(Clone)]
pub struct Proxy {
    inner: Arc<ProxyInner>,
}

impl Proxy {
    pub(crate) fn new(reference: Reference, instance: Arc<Instance>) -> Self {
        let inner = Arc::new(ProxyInner {
            reference,
            instance: instance.clone(),
            handler: Mutex::new(None),
        });
        instance.register_proxy(&inner);
        Self { inner }
    }

    fn rebuild(&self, reference: Reference) -> Self {
        Self::new(reference, self.inner.instance.clone())
    }

    /// The reference behind this proxy.
    #[must_use]
    pub fn reference(&self) -> &Reference {
        self.inner.reference()
    }

    /// The identity of the remote object.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        self.inner.reference().identity()
    }

    /// Returns a proxy addressing the given facet.
    #[must_use]
    pub fn with_facet(&self, facet: impl Into<String>) -> Self {
        self.rebuild(self.reference().with_facet(facet))
    }

    /// Returns a proxy using the given invocation mode.
    #[must_use]
    pub fn with_mode(&self, mode: InvocationMode) -> Self {
        self.rebuild(self.reference().with_mode(mode))
    }

    /// Returns a proxy restricted to secure endpoints.
    #[must_use]
    pub fn with_secure(&self, secure: bool) -> Self {
        self.rebuild(self.reference().with_secure(secure))
    }

    /// Returns a proxy preferring secure endpoints.
    #[must_use]
    pub fn with_prefer_secure(&self, prefer_secure: bool) -> Self {
        self.rebuild(self.reference().with_prefer_secure(prefer_secure))
    }

    /// Returns a proxy with a compression override.
    #[must_use]
    pub fn with_compress(&self, compress: Option<bool>) -> Self {
        self.rebuild(self.reference().with_compress(compress))
    }

    /// Returns a proxy with an endpoint timeout override.
    #[must_use]
    pub fn with_timeout(&self, timeout: Option<Duration>) -> Self {
        self.rebuild(self.reference().with_timeout(timeout))
    }

    /// Returns a proxy bound within the given connection group.
    #[must_use]
    pub fn with_connection_id(&self, connection_id: impl Into<String>) -> Self {
        self.rebuild(self.reference().with_connection_id(connection_id))
    }

    /// Returns a proxy using the given endpoint-selection policy.
    #[must_use]
    pub fn with_selection(&self, selection: crate::endpoint::EndpointSelection) -> Self {
        self.rebuild(self.reference().with_selection(selection))
    }

    /// Returns a proxy that caches (or rebinds per call) its connection.
    #[must_use]
    pub fn with_cache_connection(&self, cache_connection: bool) -> Self {
        self.rebuild(self.reference().with_cache_connection(cache_connection))
    }

    /// Returns a proxy with the given invocation timeout.
    #[must_use]
    pub fn with_invocation_timeout(&self, timeout: Option<Duration>) -> Self {
        self.rebuild(self.reference().with_invocation_timeout(timeout))
    }

    /// Returns a proxy that opts into retrying transmitted twoway
    /// requests; only safe for idempotent-or-tolerant callers.
    #[must_use]
    pub fn with_retry_transmitted(&self, retry_transmitted: bool) -> Self {
        self.rebuild(self.reference().with_retry_transmitted(retry_transmitted))
    }

    /// Returns a proxy over a different direct endpoint list.
    ///
    /// # Errors
    ///
    /// [`BindingError::FixedReference`] when the proxy is fixed.
    pub fn with_endpoints(
        &self,
        endpoints: impl Into<Arc<[crate::endpoint::Endpoint]>>,
    ) -> Result<Self, BindingError> {
        Ok(self.rebuild(self.reference().with_endpoints(endpoints)?))
    }

    /// Returns a proxy resolving a different adapter id.
    ///
    /// # Errors
    ///
    /// [`BindingError::FixedReference`] when the proxy is fixed.
    pub fn with_adapter_id(&self, adapter_id: impl Into<String>) -> Result<Self, BindingError> {
        Ok(self.rebuild(self.reference().with_adapter_id(adapter_id)?))
    }

    /// Returns a proxy with a different locator-cache TTL.
    ///
    /// The TTL only governs locator lookups; on a direct proxy it has no
    /// target and the returned proxy is unchanged.
    ///
    /// # Errors
    ///
    /// [`BindingError::FixedReference`] when the proxy is fixed.
    pub fn with_locator_ttl(&self, ttl: Option<Duration>) -> Result<Self, BindingError> {
        Ok(self.rebuild(self.reference().with_locator_ttl(ttl)?))
    }

    /// Returns a proxy resolving through the given router.
    ///
    /// # Errors
    ///
    /// [`BindingError::FixedReference`] when the proxy is fixed.
    pub fn with_router(&self, router: Option<Arc<dyn Router>>) -> Result<Self, BindingError> {
        Ok(self.rebuild(self.reference().with_router(router)?))
    }

    /// Invokes `operation` and waits for the outcome.
    ///
    /// On a batch-mode proxy the request is appended to the batch buffer
    /// and the call completes immediately with an empty payload;
    /// [`flush_batch_requests`](Self::flush_batch_requests) transmits the
    /// buffer.
    ///
    /// # Errors
    ///
    /// The invocation's terminal [`InvocationError`].
    pub async fn invoke(
        &self,
        operation: &str,
        idempotent: bool,
        args: Bytes,
    ) -> Result<Bytes, InvocationError> {
        if self.reference().mode().is_batch() {
            self.enqueue_batch_request(args).await?;
            return Ok(Bytes::new());
        }
        self.begin_invoke(operation, idempotent, args).await.wait().await
    }

    /// Starts an invocation and returns a handle to its outcome.
    ///
    /// # Panics
    ///
    /// Panics on a batch-mode proxy; batch requests have no per-request
    /// outcome, use [`invoke`](Self::invoke).
    pub async fn begin_invoke(&self, operation: &str, idempotent: bool, args: Bytes) -> AsyncResult {
        self.begin_invoke_with(operation, idempotent, args, InvocationHooks::default())
            .await
    }

    /// Starts an invocation with sent/completion callbacks attached.
    ///
    /// # Panics
    ///
    /// Panics on a batch-mode proxy.
    pub async fn begin_invoke_with(
        &self,
        operation: &str,
        idempotent: bool,
        args: Bytes,
        hooks: InvocationHooks,
    ) -> AsyncResult {
        assert!(
            !self.reference().mode().is_batch(),
            "begin_invoke on a batch-mode proxy"
        );
        let call = OutgoingAsync::new(self.inner.clone(), operation, idempotent, args);
        if let Some(on_sent) = hooks.on_sent {
            call.set_sent_callback(on_sent);
        }
        if let Some(on_completed) = hooks.on_completed {
            call.set_completion_callback(on_completed);
        }
        call.invoke().await;
        AsyncResult::new(call, self.inner.instance.clone())
    }

    /// Waits for a begun invocation and consumes its outcome.
    ///
    /// # Panics
    ///
    /// Panics when `result` belongs to a different communicator.
    ///
    /// # Errors
    ///
    /// The invocation's terminal [`InvocationError`].
    pub async fn end_invoke(&self, result: AsyncResult) -> Result<Bytes, InvocationError> {
        assert!(
            Arc::ptr_eq(result.instance(), &self.inner.instance),
            "AsyncResult used with a proxy from a different communicator"
        );
        result.wait().await
    }

    async fn enqueue_batch_request(&self, args: Bytes) -> Result<(), InvocationError> {
        let mut handler_retries: u32 = 0;
        loop {
            let handler = self.inner.request_handler();
            match handler.enqueue_batch(args.clone()).await? {
                SendOutcome::Queued | SendOutcome::Sent { .. } => return Ok(()),
                SendOutcome::RetryWithoutFailure => {
                    self.inner.clear_handler(&handler);
                    handler_retries += 1;
                    let limit = self.inner.instance.retry_policy().handler_retry_limit();
                    if handler_retries > limit {
                        return Err(TransportError::Closed.into());
                    }
                }
            }
        }
    }

    /// Transmits this proxy's accumulated batch requests.
    ///
    /// # Errors
    ///
    /// An [`InvocationError`] when the buffer cannot be sent.
    pub async fn flush_batch_requests(&self) -> Result<(), InvocationError> {
        let mut handler_retries: u32 = 0;
        loop {
            let handler = self.inner.request_handler();
            match handler.flush_batch().await? {
                SendOutcome::Queued | SendOutcome::Sent { .. } => return Ok(()),
                SendOutcome::RetryWithoutFailure => {
                    self.inner.clear_handler(&handler);
                    handler_retries += 1;
                    let limit = self.inner.instance.retry_policy().handler_retry_limit();
                    if handler_retries > limit {
                        return Err(TransportError::Closed.into());
                    }
                }
            }
        }
    }

    /// Discards this proxy's accumulated batch requests.
    pub async fn abort_batch_requests(&self) {
        if let Some(handler) = self.inner.current_handler() {
            handler.abort_batch().await;
        }
    }

    pub(crate) fn inner(&self) -> &Arc<ProxyInner> {
        &self.inner
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.reference)
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("reference", &self.inner.reference)
            .finish_non_exhaustive()
    }
}
