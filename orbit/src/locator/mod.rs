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

//! Indirect reference resolution: locator cache and router binding.
//!
//! The actual lookup services live elsewhere; this module defines their
//! contracts and the TTL cache the binding path consults. A reference that
//! carries a router resolves through the router with priority over the
//! locator.

mod cache;
mod router;

pub use cache::{LocatorCache, LocatorResolver};
pub use router::Router;
