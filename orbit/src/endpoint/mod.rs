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

//! Network endpoint descriptions and candidate selection.
//!
//! An [`Endpoint`] is an immutable description of one network destination
//! plus the transport attributes that matter when connecting to it. The
//! binding path filters and orders endpoint candidates here before handing
//! them to the connection factory.

#[allow(clippy::module_inception)]
mod endpoint;
mod parse;
mod selection;

pub use endpoint::{Endpoint, TransportKind};
pub use parse::EndpointParseError;
pub use selection::EndpointSelection;

pub(crate) use selection::{filter_for_security, filter_unusable, order_endpoints};
