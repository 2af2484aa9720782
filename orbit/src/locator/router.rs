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

//! Router binding contract.

use crate::endpoint::Endpoint;
use crate::error::BindingError;
use async_trait::async_trait;

/// Supplies endpoints for references that are reached through a router.
///
/// When a reference carries a router, the router's client endpoints take
/// priority over any locator resolution. Router endpoints are session
/// state: they are not cached by the locator cache and do not participate
/// in its invalidate-and-retry handling — a stale router is the router
/// implementation's concern.
#[async_trait]
pub trait Router: Send + Sync {
    /// Returns the endpoints client requests must be sent through.
    async fn client_endpoints(&self) -> Result<Vec<Endpoint>, BindingError>;
}
