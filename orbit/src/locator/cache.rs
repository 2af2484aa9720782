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

//! TTL cache over a locator resolver.

use crate::endpoint::Endpoint;
use crate::error::BindingError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Resolves an adapter id to its current endpoints.
///
/// This is the remote lookup itself — typically a registry round-trip. The
/// runtime never calls it directly; all lookups go through [`LocatorCache`].
#[async_trait]
pub trait LocatorResolver: Send + Sync {
    /// Looks up the endpoints currently registered for `adapter_id`.
    async fn resolve(&self, adapter_id: &str) -> Result<Vec<Endpoint>, BindingError>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    endpoints: Vec<Endpoint>,
    resolved_at: Instant,
}

/// Shared cache of adapter-id resolutions with per-lookup TTL and explicit
/// invalidation.
///
/// The cache map is guarded by its own lock, held only for map operations —
/// never across the resolver round-trip, so a slow lookup cannot block
/// unrelated calls. Two callers missing the same entry concurrently both
/// resolve; the later write wins, which is harmless for idempotent lookups.
pub struct LocatorCache {
    resolver: std::sync::Arc<dyn LocatorResolver>,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl LocatorCache {
    /// Creates a cache over the given resolver.
    #[must_use]
    pub fn new(resolver: std::sync::Arc<dyn LocatorResolver>) -> Self {
        Self {
            resolver,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns endpoints for `adapter_id` and whether they came from cache.
    ///
    /// A cached entry is served while it is younger than `ttl`; `None`
    /// means entries never expire on their own and are only removed by
    /// [`invalidate`](Self::invalidate). A fresh resolution is stored
    /// before being returned with `was_cached == false`.
    pub async fn get_endpoints(
        &self,
        adapter_id: &str,
        ttl: Option<Duration>,
    ) -> Result<(Vec<Endpoint>, bool), BindingError> {
        {
            let entries = self.entries.lock().unwrap();
            if let Some(entry) = entries.get(adapter_id) {
                let fresh = match ttl {
                    Some(ttl) => entry.resolved_at.elapsed() < ttl,
                    None => true,
                };
                if fresh {
                    trace!(adapter_id, "locator cache hit");
                    return Ok((entry.endpoints.clone(), true));
                }
            }
        }

        debug!(adapter_id, "locator cache miss, resolving");
        let endpoints = self.resolver.resolve(adapter_id).await?;
        let entry = CacheEntry {
            endpoints: endpoints.clone(),
            resolved_at: Instant::now(),
        };
        self.entries
            .lock()
            .unwrap()
            .insert(adapter_id.to_string(), entry);
        Ok((endpoints, false))
    }

    /// Removes any cached resolution for `adapter_id`.
    pub fn invalidate(&self, adapter_id: &str) {
        if self.entries.lock().unwrap().remove(adapter_id).is_some() {
            debug!(adapter_id, "locator cache entry invalidated");
        }
    }
}
