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

//! Resolving a reference to a live connection.

use super::{Binding, Reference};
use crate::connection::{Connection, ConnectionFactory};
use crate::endpoint::{Endpoint, filter_for_security, filter_unusable, order_endpoints};
use crate::error::BindingError;
use crate::locator::{LocatorCache, Router};
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves `reference` to a connection plus the effective compression flag.
///
/// Candidate endpoints come from the router when one is set, otherwise the
/// locator cache for indirect references or the stored list for direct ones;
/// a fixed reference short-circuits to its pre-bound connection after
/// compatibility checks. Candidates are filtered and ordered per the
/// reference's policy; an empty result is the terminal
/// [`BindingError::NoEndpoint`].
///
/// When an indirect reference was served from cache and the connect step
/// fails at the transport level, the cache entry is invalidated and the
/// whole resolution re-runs exactly once before the error surfaces. Fresh
/// lookups, router-obtained endpoints and `NoEndpoint` never get that extra
/// attempt.
pub(crate) async fn get_connection(
    reference: &Reference,
    factory: &dyn ConnectionFactory,
    locator: Option<&LocatorCache>,
    secure_required: bool,
    prefer_secure: bool,
) -> Result<(Arc<dyn Connection>, bool), BindingError> {
    if let Binding::Fixed { connection } = reference.binding() {
        let connection = check_fixed(reference, connection, secure_required)?;
        let compress = reference
            .compress()
            .unwrap_or_else(|| connection.endpoint().compress());
        return Ok((connection, compress));
    }

    let secure = reference.secure() || secure_required;
    let prefer = reference.prefer_secure() || prefer_secure;
    let mut cache_retry_allowed = true;

    loop {
        let (resolved, from_cache) = collect_candidates(reference, locator).await?;
        let mut candidates = apply_overrides(reference, resolved);
        candidates = filter_unusable(candidates, reference.mode().is_datagram());
        candidates = filter_for_security(candidates, secure, prefer);
        order_endpoints(&mut candidates, reference.selection());

        if candidates.is_empty() {
            // Terminal: the same reference would filter down to nothing again.
            return Err(BindingError::NoEndpoint {
                proxy: reference.to_string(),
            });
        }

        match connect(reference, factory, &candidates).await {
            Ok(connection) => {
                let compress = reference
                    .compress()
                    .unwrap_or_else(|| connection.endpoint().compress());
                return Ok((connection, compress));
            }
            Err(error) => {
                let stale_cache = from_cache
                    && cache_retry_allowed
                    && matches!(error, BindingError::ConnectFailed { .. });
                if stale_cache {
                    if let (Some(cache), Some(adapter_id)) = (locator, reference.adapter_id()) {
                        warn!(
                            adapter_id,
                            %error,
                            "cached endpoints are stale, re-resolving once"
                        );
                        cache.invalidate(adapter_id);
                        cache_retry_allowed = false;
                        continue;
                    }
                }
                return Err(error);
            }
        }
    }
}

fn check_fixed(
    reference: &Reference,
    connection: &Arc<dyn Connection>,
    secure_required: bool,
) -> Result<Arc<dyn Connection>, BindingError> {
    let endpoint = connection.endpoint();
    if endpoint.kind().is_datagram() != reference.mode().is_datagram() {
        return Err(BindingError::IncompatibleConnection {
            reason: format!(
                "invocation mode {:?} does not match endpoint {}",
                reference.mode(),
                endpoint
            ),
        });
    }
    if (reference.secure() || secure_required) && !endpoint.secure() {
        return Err(BindingError::IncompatibleConnection {
            reason: format!("secure invocation on non-secure endpoint {}", endpoint),
        });
    }
    if !connection.is_active() {
        return Err(BindingError::IncompatibleConnection {
            reason: "connection is closed".to_string(),
        });
    }
    Ok(connection.clone())
}

/// Candidate endpoints plus whether they came from the locator cache.
async fn collect_candidates(
    reference: &Reference,
    locator: Option<&LocatorCache>,
) -> Result<(Vec<Endpoint>, bool), BindingError> {
    if let Some(router) = reference.router() {
        let endpoints = router.client_endpoints().await?;
        debug!(count = endpoints.len(), "using router client endpoints");
        return Ok((endpoints, false));
    }
    match reference.binding() {
        Binding::Direct { endpoints } => Ok((endpoints.to_vec(), false)),
        Binding::Indirect {
            adapter_id,
            locator_ttl,
        } => {
            let Some(cache) = locator else {
                return Err(BindingError::LocatorLookup {
                    adapter_id: adapter_id.clone(),
                    message: "no locator configured".to_string(),
                });
            };
            cache.get_endpoints(adapter_id, *locator_ttl).await
        }
        Binding::Fixed { .. } => unreachable!("fixed references short-circuit earlier"),
    }
}

fn apply_overrides(reference: &Reference, endpoints: Vec<Endpoint>) -> Vec<Endpoint> {
    endpoints
        .into_iter()
        .map(|mut endpoint| {
            if let Some(timeout) = reference.timeout() {
                endpoint = endpoint.with_timeout(Some(timeout));
            }
            if let Some(compress) = reference.compress() {
                endpoint = endpoint.with_compress(compress);
            }
            if !reference.connection_id().is_empty() {
                endpoint = endpoint.with_connection_id(reference.connection_id());
            }
            endpoint
        })
        .collect()
}

/// Asks the factory for a connection.
///
/// With connection caching the factory sees the whole ordered list at once
/// and may match a pooled connection to any of them. Without caching, each
/// endpoint is tried in order so the per-call binding is deterministic; the
/// last error wins.
async fn connect(
    reference: &Reference,
    factory: &dyn ConnectionFactory,
    candidates: &[Endpoint],
) -> Result<Arc<dyn Connection>, BindingError> {
    if reference.cache_connection() {
        return factory
            .create(candidates, false, reference.selection())
            .await;
    }

    let mut last_error = None;
    for (index, endpoint) in candidates.iter().enumerate() {
        let has_more = index + 1 < candidates.len();
        match factory
            .create(std::slice::from_ref(endpoint), has_more, reference.selection())
            .await
        {
            Ok(connection) => return Ok(connection),
            Err(error) => {
                debug!(%endpoint, %error, "endpoint failed, trying next candidate");
                last_error = Some(error);
            }
        }
    }
    // candidates is never empty here, so an error was recorded.
    Err(last_error.unwrap_or(BindingError::NoEndpoint {
        proxy: reference.to_string(),
    }))
}
