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

//! Runtime assembly: the communicator and its shared services.

use crate::connection::ConnectionFactory;
use crate::dispatch::{Dispatcher, TokioDispatcher};
use crate::handler::{BindingRequestHandler, QueueingRequestHandler, RequestHandler, SerialExecutor};
use crate::locator::{LocatorCache, LocatorResolver};
use crate::observer::{InvocationObserver, NoopObserver};
use crate::proxy::{Proxy, ProxyInner};
use crate::reference::{ProxyParseError, Reference, get_connection};
use crate::retry::{RetryPolicy, RetryQueue};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tracing::{debug, warn};

/// Shared services every proxy and invocation of one communicator uses.
pub(crate) struct Instance {
    factory: Arc<dyn ConnectionFactory>,
    locator: Option<Arc<LocatorCache>>,
    retry_policy: RetryPolicy,
    retry_queue: Arc<RetryQueue>,
    dispatcher: Arc<dyn Dispatcher>,
    observer: Arc<dyn InvocationObserver>,
    default_invocation_timeout: Option<Duration>,
    secure_required: bool,
    prefer_secure: bool,
    proxies: Mutex<Vec<Weak<ProxyInner>>>,
}

impl Instance {
    pub(crate) fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    pub(crate) fn retry_queue(&self) -> &Arc<RetryQueue> {
        &self.retry_queue
    }

    pub(crate) fn dispatcher(&self) -> &Arc<dyn Dispatcher> {
        &self.dispatcher
    }

    pub(crate) fn observer(&self) -> &Arc<dyn InvocationObserver> {
        &self.observer
    }

    pub(crate) fn locator(&self) -> Option<&LocatorCache> {
        self.locator.as_deref()
    }

    pub(crate) fn default_invocation_timeout(&self) -> Option<Duration> {
        self.default_invocation_timeout
    }

    pub(crate) fn register_proxy(&self, inner: &Arc<ProxyInner>) {
        let mut proxies = self.proxies.lock().unwrap();
        proxies.retain(|weak| weak.strong_count() > 0);
        proxies.push(Arc::downgrade(inner));
    }

    /// Runs one binding attempt for `handler` in the background.
    pub(crate) fn spawn_binding(
        self: &Arc<Self>,
        reference: Reference,
        handler: Arc<BindingRequestHandler>,
    ) {
        let instance = self.clone();
        tokio::spawn(async move {
            let result = get_connection(
                &reference,
                instance.factory.as_ref(),
                instance.locator(),
                instance.secure_required,
                instance.prefer_secure,
            )
            .await;
            match result {
                Ok((connection, compress)) => handler.set_connection(connection, compress).await,
                Err(error) => handler.set_exception(error.into()),
            }
        });
    }
}

/// Owner of the invocation runtime: connection factory, locator cache,
/// retry machinery, dispatcher and observer.
///
/// Built through [`CommunicatorBuilder`]; cheap to clone.
#[derive(Clone)]
pub struct Communicator {
    instance: Arc<Instance>,
}

impl Communicator {
    /// Starts building a communicator over the given connection factory.
    #[must_use]
    pub fn builder(factory: Arc<dyn ConnectionFactory>) -> CommunicatorBuilder {
        CommunicatorBuilder::new(factory)
    }

    /// Parses a proxy string into a live proxy.
    ///
    /// # Errors
    ///
    /// A [`ProxyParseError`] when the string is malformed.
    pub fn string_to_proxy(&self, s: &str) -> Result<Proxy, ProxyParseError> {
        let reference = Reference::parse(s)?;
        Ok(self.proxy_from_reference(reference))
    }

    /// Wraps an already-built reference in a proxy.
    #[must_use]
    pub fn proxy_from_reference(&self, reference: Reference) -> Proxy {
        Proxy::new(reference, self.instance.clone())
    }

    /// Flushes outstanding batch requests across every live proxy.
    ///
    /// All flushes run through one serial executor, so the transmission
    /// order is a single global order no matter which tasks enqueued the
    /// batches. Per-proxy failures are logged and do not stop the sweep.
    pub async fn flush_batch_requests(&self) {
        let executor = Arc::new(SerialExecutor::new());
        let proxies: Vec<Arc<ProxyInner>> = {
            let proxies = self.instance.proxies.lock().unwrap();
            proxies.iter().filter_map(Weak::upgrade).collect()
        };
        debug!(proxies = proxies.len(), "communicator-wide batch flush");
        for inner in proxies {
            let Some(handler) = inner.current_handler() else {
                continue;
            };
            let queueing = QueueingRequestHandler::new(handler, executor.clone());
            if let Err(error) = queueing.flush_batch().await {
                warn!(proxy = %inner.reference(), %error, "batch flush failed");
            }
        }
    }

    /// Shuts the runtime down: outstanding retries complete as canceled
    /// and nothing new is scheduled.
    pub fn shutdown(&self) {
        self.instance.retry_queue.shutdown();
    }

    pub(crate) fn instance(&self) -> &Arc<Instance> {
        &self.instance
    }
}

/// Builder for [`Communicator`].
pub struct CommunicatorBuilder {
    factory: Arc<dyn ConnectionFactory>,
    locator: Option<Arc<dyn LocatorResolver>>,
    retry_policy: RetryPolicy,
    dispatcher: Arc<dyn Dispatcher>,
    observer: Arc<dyn InvocationObserver>,
    default_invocation_timeout: Option<Duration>,
    secure_required: bool,
    prefer_secure: bool,
}

impl CommunicatorBuilder {
    /// Creates a builder with defaults: no locator, `"0"` retry policy,
    /// tokio dispatcher, no-op observer, no default invocation timeout.
    #[must_use]
    pub fn new(factory: Arc<dyn ConnectionFactory>) -> Self {
        Self {
            factory,
            locator: None,
            retry_policy: RetryPolicy::default(),
            dispatcher: Arc::new(TokioDispatcher),
            observer: Arc::new(NoopObserver),
            default_invocation_timeout: None,
            secure_required: false,
            prefer_secure: false,
        }
    }

    /// Sets the locator resolver indirect references go through.
    #[must_use]
    pub fn with_locator(mut self, resolver: Arc<dyn LocatorResolver>) -> Self {
        self.locator = Some(resolver);
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Sets the callback dispatcher.
    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn Dispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Sets the invocation observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn InvocationObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Sets the invocation timeout applied when a reference carries none.
    #[must_use]
    pub fn with_default_invocation_timeout(mut self, timeout: Duration) -> Self {
        self.default_invocation_timeout = Some(timeout);
        self
    }

    /// Requires secure endpoints process-wide.
    #[must_use]
    pub fn with_secure_required(mut self, secure_required: bool) -> Self {
        self.secure_required = secure_required;
        self
    }

    /// Prefers secure endpoints process-wide.
    #[must_use]
    pub fn with_prefer_secure(mut self, prefer_secure: bool) -> Self {
        self.prefer_secure = prefer_secure;
        self
    }

    /// Assembles the communicator.
    #[must_use]
    pub fn build(self) -> Communicator {
        Communicator {
            instance: Arc::new(Instance {
                factory: self.factory,
                locator: self.locator.map(|resolver| Arc::new(LocatorCache::new(resolver))),
                retry_policy: self.retry_policy,
                retry_queue: RetryQueue::new(),
                dispatcher: self.dispatcher,
                observer: self.observer,
                default_invocation_timeout: self.default_invocation_timeout,
                secure_required: self.secure_required,
                prefer_secure: self.prefer_secure,
                proxies: Mutex::new(Vec::new()),
            }),
        }
    }
}
