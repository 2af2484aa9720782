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

//! References: the immutable binding descriptor behind every proxy.
//!
//! A [`Reference`] names a remote object (identity plus facet), fixes the
//! invocation mode and binding policy, and carries exactly one way of
//! reaching the object: a direct endpoint list, an adapter id resolved
//! through a locator, or a single pre-bound connection. References never
//! embed mutable connection state; every mutation returns a new value.

mod binding;
mod factory;
mod identity;
mod mode;
#[allow(clippy::module_inception)]
mod reference;

pub(crate) use binding::get_connection;
pub use factory::ProxyParseError;
pub use identity::{Identity, IdentityParseError};
pub use mode::InvocationMode;
pub use reference::{Binding, Reference};
