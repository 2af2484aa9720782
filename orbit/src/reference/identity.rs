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

//! Object identity.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identity of a remote object: a name plus an optional category.
///
/// Displayed and parsed as `category/name`, or just `name` when the
/// category is empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    /// Object name; never empty.
    pub name: String,
    /// Grouping category; may be empty.
    pub category: String,
}

/// Error produced when parsing an identity string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid identity `{input}`: {reason}")]
pub struct IdentityParseError {
    /// The string that failed to parse.
    pub input: String,
    /// Why it was rejected.
    pub reason: String,
}

impl Identity {
    /// Creates an identity from a name and category.
    #[must_use]
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.category.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}/{}", self.category, self.name)
        }
    }
}

impl FromStr for Identity {
    type Err = IdentityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (category, name) = match s.split_once('/') {
            Some((category, name)) => (category, name),
            None => ("", s),
        };
        if name.is_empty() {
            return Err(IdentityParseError {
                input: s.to_string(),
                reason: "name must not be empty".to_string(),
            });
        }
        if name.contains('/') {
            return Err(IdentityParseError {
                input: s.to_string(),
                reason: "too many `/` separators".to_string(),
            });
        }
        Ok(Self::new(name, category))
    }
}
