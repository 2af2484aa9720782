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

//! The reference value type and its binding variants.

use super::{Identity, InvocationMode};
use crate::connection::Connection;
use crate::endpoint::{Endpoint, EndpointSelection};
use crate::error::BindingError;
use crate::locator::Router;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// How a reference reaches its object: exactly one of three variants.
#[derive(Clone)]
pub enum Binding {
    /// An ordered list of known endpoints.
    Direct {
        /// Candidate endpoints, shared structurally between references.
        endpoints: Arc<[Endpoint]>,
    },
    /// An adapter id resolved on demand through the locator cache.
    Indirect {
        /// The adapter id to resolve.
        adapter_id: String,
        /// How long cached resolutions stay fresh; `None` means forever.
        locator_ttl: Option<Duration>,
    },
    /// A single pre-bound connection; the binding can never change.
    Fixed {
        /// The connection every call on this reference uses.
        connection: Arc<dyn Connection>,
    },
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct { endpoints } => {
                f.debug_struct("Direct").field("endpoints", endpoints).finish()
            }
            Self::Indirect {
                adapter_id,
                locator_ttl,
            } => f
                .debug_struct("Indirect")
                .field("adapter_id", adapter_id)
                .field("locator_ttl", locator_ttl)
                .finish(),
            Self::Fixed { connection } => f
                .debug_struct("Fixed")
                .field("endpoint", connection.endpoint())
                .finish(),
        }
    }
}

/// Immutable identity-plus-binding-policy behind a proxy.
///
/// A reference is freely shared across threads and never embeds mutable
/// connection state. Every `with_*` operation returns a new reference,
/// sharing unchanged parts structurally; mutators that would change the
/// binding of a [`Binding::Fixed`] reference fail instead.
#[derive(Clone)]
pub struct Reference {
    identity: Identity,
    facet: String,
    mode: InvocationMode,
    secure: bool,
    prefer_secure: bool,
    compress: Option<bool>,
    timeout: Option<Duration>,
    connection_id: String,
    selection: EndpointSelection,
    cache_connection: bool,
    invocation_timeout: Option<Duration>,
    retry_transmitted: bool,
    router: Option<Arc<dyn Router>>,
    binding: Binding,
}

impl Reference {
    fn with_binding(identity: Identity, binding: Binding) -> Self {
        Self {
            identity,
            facet: String::new(),
            mode: InvocationMode::default(),
            secure: false,
            prefer_secure: false,
            compress: None,
            timeout: None,
            connection_id: String::new(),
            selection: EndpointSelection::default(),
            cache_connection: true,
            invocation_timeout: None,
            retry_transmitted: false,
            router: None,
            binding,
        }
    }

    /// Creates a direct reference over the given endpoints.
    #[must_use]
    pub fn direct(identity: Identity, endpoints: impl Into<Arc<[Endpoint]>>) -> Self {
        Self::with_binding(
            identity,
            Binding::Direct {
                endpoints: endpoints.into(),
            },
        )
    }

    /// Creates an indirect reference resolved through a locator.
    #[must_use]
    pub fn indirect(identity: Identity, adapter_id: impl Into<String>) -> Self {
        Self::with_binding(
            identity,
            Binding::Indirect {
                adapter_id: adapter_id.into(),
                locator_ttl: None,
            },
        )
    }

    /// Creates a fixed reference bound to one existing connection.
    #[must_use]
    pub fn fixed(identity: Identity, connection: Arc<dyn Connection>) -> Self {
        Self::with_binding(identity, Binding::Fixed { connection })
    }

    /// The identity of the remote object.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The facet addressed on the object; empty for the default facet.
    #[must_use]
    pub fn facet(&self) -> &str {
        &self.facet
    }

    /// The invocation mode.
    #[must_use]
    pub const fn mode(&self) -> InvocationMode {
        self.mode
    }

    /// Whether only secure endpoints may be used.
    #[must_use]
    pub const fn secure(&self) -> bool {
        self.secure
    }

    /// Whether secure endpoints are preferred when not required.
    #[must_use]
    pub const fn prefer_secure(&self) -> bool {
        self.prefer_secure
    }

    /// Per-reference compression override, if any.
    #[must_use]
    pub const fn compress(&self) -> Option<bool> {
        self.compress
    }

    /// Per-reference endpoint timeout override, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Connection-group id applied to every endpoint.
    #[must_use]
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Endpoint-selection policy.
    #[must_use]
    pub const fn selection(&self) -> EndpointSelection {
        self.selection
    }

    /// Whether the bound connection is cached on the proxy.
    #[must_use]
    pub const fn cache_connection(&self) -> bool {
        self.cache_connection
    }

    /// Invocation timeout, if one is configured on the reference.
    #[must_use]
    pub const fn invocation_timeout(&self) -> Option<Duration> {
        self.invocation_timeout
    }

    /// Whether the caller opted into retrying twoway requests whose bytes
    /// were already transmitted.
    #[must_use]
    pub const fn retry_transmitted(&self) -> bool {
        self.retry_transmitted
    }

    /// The router this reference resolves through, if any.
    #[must_use]
    pub fn router(&self) -> Option<&Arc<dyn Router>> {
        self.router.as_ref()
    }

    /// The binding variant.
    #[must_use]
    pub const fn binding(&self) -> &Binding {
        &self.binding
    }

    /// Returns `true` for an indirect (locator-resolved) reference.
    #[must_use]
    pub const fn is_indirect(&self) -> bool {
        matches!(self.binding, Binding::Indirect { .. })
    }

    /// Returns `true` for a fixed reference.
    #[must_use]
    pub const fn is_fixed(&self) -> bool {
        matches!(self.binding, Binding::Fixed { .. })
    }

    /// The adapter id, for indirect references.
    #[must_use]
    pub fn adapter_id(&self) -> Option<&str> {
        match &self.binding {
            Binding::Indirect { adapter_id, .. } => Some(adapter_id),
            _ => None,
        }
    }

    /// The direct endpoint list, for direct references.
    #[must_use]
    pub fn endpoints(&self) -> Option<&[Endpoint]> {
        match &self.binding {
            Binding::Direct { endpoints } => Some(endpoints),
            _ => None,
        }
    }

    fn fail_if_fixed(&self) -> Result<(), BindingError> {
        if self.is_fixed() {
            Err(BindingError::FixedReference)
        } else {
            Ok(())
        }
    }

    /// Returns a copy addressing the given facet.
    #[must_use]
    pub fn with_facet(&self, facet: impl Into<String>) -> Self {
        Self {
            facet: facet.into(),
            ..self.clone()
        }
    }

    /// Returns a copy with the given invocation mode.
    #[must_use]
    pub fn with_mode(&self, mode: InvocationMode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }

    /// Returns a copy with the secure-required flag set.
    #[must_use]
    pub fn with_secure(&self, secure: bool) -> Self {
        Self {
            secure,
            ..self.clone()
        }
    }

    /// Returns a copy with the prefer-secure flag set.
    #[must_use]
    pub fn with_prefer_secure(&self, prefer_secure: bool) -> Self {
        Self {
            prefer_secure,
            ..self.clone()
        }
    }

    /// Returns a copy with a compression override.
    #[must_use]
    pub fn with_compress(&self, compress: Option<bool>) -> Self {
        Self {
            compress,
            ..self.clone()
        }
    }

    /// Returns a copy with an endpoint timeout override.
    #[must_use]
    pub fn with_timeout(&self, timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            ..self.clone()
        }
    }

    /// Returns a copy with the given connection-group id.
    #[must_use]
    pub fn with_connection_id(&self, connection_id: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
            ..self.clone()
        }
    }

    /// Returns a copy with the given endpoint-selection policy.
    #[must_use]
    pub fn with_selection(&self, selection: EndpointSelection) -> Self {
        Self {
            selection,
            ..self.clone()
        }
    }

    /// Returns a copy with connection caching enabled or disabled.
    #[must_use]
    pub fn with_cache_connection(&self, cache_connection: bool) -> Self {
        Self {
            cache_connection,
            ..self.clone()
        }
    }

    /// Returns a copy with the given invocation timeout.
    #[must_use]
    pub fn with_invocation_timeout(&self, invocation_timeout: Option<Duration>) -> Self {
        Self {
            invocation_timeout,
            ..self.clone()
        }
    }

    /// Returns a copy that opts into retrying transmitted twoway requests.
    ///
    /// Only safe when every operation invoked through the reference is
    /// idempotent or the application tolerates re-execution.
    #[must_use]
    pub fn with_retry_transmitted(&self, retry_transmitted: bool) -> Self {
        Self {
            retry_transmitted,
            ..self.clone()
        }
    }

    /// Returns a copy with a different direct endpoint list.
    ///
    /// # Errors
    ///
    /// [`BindingError::FixedReference`] when the reference is fixed.
    pub fn with_endpoints(
        &self,
        endpoints: impl Into<Arc<[Endpoint]>>,
    ) -> Result<Self, BindingError> {
        self.fail_if_fixed()?;
        Ok(Self {
            binding: Binding::Direct {
                endpoints: endpoints.into(),
            },
            ..self.clone()
        })
    }

    /// Returns a copy resolving a different adapter id.
    ///
    /// # Errors
    ///
    /// [`BindingError::FixedReference`] when the reference is fixed.
    pub fn with_adapter_id(&self, adapter_id: impl Into<String>) -> Result<Self, BindingError> {
        self.fail_if_fixed()?;
        let locator_ttl = match &self.binding {
            Binding::Indirect { locator_ttl, .. } => *locator_ttl,
            _ => None,
        };
        Ok(Self {
            binding: Binding::Indirect {
                adapter_id: adapter_id.into(),
                locator_ttl,
            },
            ..self.clone()
        })
    }

    /// Returns a copy with a different locator-cache TTL.
    ///
    /// The TTL only governs locator lookups, so it is stored on indirect
    /// references; on a direct reference there is nothing to resolve and
    /// the copy is returned unchanged.
    ///
    /// # Errors
    ///
    /// [`BindingError::FixedReference`] when the reference is fixed.
    pub fn with_locator_ttl(&self, ttl: Option<Duration>) -> Result<Self, BindingError> {
        self.fail_if_fixed()?;
        match &self.binding {
            Binding::Indirect { adapter_id, .. } => Ok(Self {
                binding: Binding::Indirect {
                    adapter_id: adapter_id.clone(),
                    locator_ttl: ttl,
                },
                ..self.clone()
            }),
            _ => Ok(self.clone()),
        }
    }

    /// Returns a copy resolving through the given router.
    ///
    /// # Errors
    ///
    /// [`BindingError::FixedReference`] when the reference is fixed.
    pub fn with_router(&self, router: Option<Arc<dyn Router>>) -> Result<Self, BindingError> {
        self.fail_if_fixed()?;
        Ok(Self {
            router,
            ..self.clone()
        })
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reference")
            .field("identity", &self.identity)
            .field("facet", &self.facet)
            .field("mode", &self.mode)
            .field("secure", &self.secure)
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identity)?;
        if !self.facet.is_empty() {
            write!(f, " -f {}", self.facet)?;
        }
        write!(f, " {}", self.mode.flag())?;
        if self.secure {
            write!(f, " -s")?;
        }
        match &self.binding {
            Binding::Direct { endpoints } => {
                for endpoint in endpoints.iter() {
                    write!(f, ":{}", endpoint)?;
                }
            }
            Binding::Indirect { adapter_id, .. } => {
                write!(f, " @ {}", adapter_id)?;
            }
            Binding::Fixed { .. } => {
                write!(f, " (fixed)")?;
            }
        }
        Ok(())
    }
}

impl PartialEq for Reference {
    fn eq(&self, other: &Self) -> bool {
        let bindings_equal = match (&self.binding, &other.binding) {
            (Binding::Direct { endpoints: a }, Binding::Direct { endpoints: b }) => a == b,
            (
                Binding::Indirect {
                    adapter_id: a,
                    locator_ttl: ta,
                },
                Binding::Indirect {
                    adapter_id: b,
                    locator_ttl: tb,
                },
            ) => a == b && ta == tb,
            (Binding::Fixed { connection: a }, Binding::Fixed { connection: b }) => {
                Arc::ptr_eq(a, b)
            }
            _ => false,
        };
        bindings_equal
            && self.identity == other.identity
            && self.facet == other.facet
            && self.mode == other.mode
            && self.secure == other.secure
            && self.prefer_secure == other.prefer_secure
            && self.compress == other.compress
            && self.timeout == other.timeout
            && self.connection_id == other.connection_id
            && self.selection == other.selection
            && self.cache_connection == other.cache_connection
            && self.invocation_timeout == other.invocation_timeout
    }
}
