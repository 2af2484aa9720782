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

//! Proxy-string parsing.
//!
//! Grammar:
//!
//! ```text
//! identity [-f FACET] [-t|-o|-O|-d|-D] [-s] : endpoint [: endpoint ...]
//! identity [-f FACET] [-t|-o|-O|-d|-D] [-s] @ adapter-id
//! ```

use super::{Identity, IdentityParseError, InvocationMode, Reference};
use crate::endpoint::{Endpoint, EndpointParseError};
use std::str::FromStr;
use thiserror::Error;

/// Error produced when parsing a proxy string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProxyParseError {
    /// The string was empty or all whitespace.
    #[error("empty proxy string")]
    Empty,

    /// The identity portion did not parse.
    #[error(transparent)]
    Identity(#[from] IdentityParseError),

    /// An option flag was not recognized.
    #[error("unknown proxy option `{option}`")]
    UnknownOption {
        /// The offending flag.
        option: String,
    },

    /// An option that takes an argument had none.
    #[error("proxy option `{option}` requires an argument")]
    MissingArgument {
        /// The flag missing its argument.
        option: String,
    },

    /// An endpoint segment did not parse.
    #[error(transparent)]
    Endpoint(#[from] EndpointParseError),

    /// The adapter id after `@` was empty.
    #[error("empty adapter id after `@`")]
    EmptyAdapterId,

    /// Both `@ adapter` and `: endpoint` segments were present.
    #[error("proxy cannot carry both an adapter id and endpoints")]
    AdapterAndEndpoints,

    /// Neither endpoints nor an adapter id were given.
    #[error("proxy string names no endpoints and no adapter id")]
    MissingBinding,
}

impl Reference {
    /// Parses a stringified proxy into a reference.
    ///
    /// # Errors
    ///
    /// A [`ProxyParseError`] describing the first offending token.
    pub fn parse(s: &str) -> Result<Self, ProxyParseError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ProxyParseError::Empty);
        }

        let mut segments = s.split(':');
        let head = segments.next().unwrap_or_default();
        let endpoints = segments
            .map(|segment| segment.trim().parse::<Endpoint>())
            .collect::<Result<Vec<_>, _>>()?;

        let (head, adapter_id) = match head.split_once('@') {
            Some((head, adapter)) => {
                let adapter = adapter.trim();
                if adapter.is_empty() {
                    return Err(ProxyParseError::EmptyAdapterId);
                }
                (head, Some(adapter.to_string()))
            }
            None => (head, None),
        };

        let mut tokens = head.split_whitespace();
        let identity: Identity = tokens.next().ok_or(ProxyParseError::Empty)?.parse()?;

        let mut facet = String::new();
        let mut mode = InvocationMode::Twoway;
        let mut secure = false;
        while let Some(token) = tokens.next() {
            match token {
                "-f" => {
                    facet = tokens
                        .next()
                        .ok_or_else(|| ProxyParseError::MissingArgument {
                            option: token.to_string(),
                        })?
                        .to_string();
                }
                "-t" => mode = InvocationMode::Twoway,
                "-o" => mode = InvocationMode::Oneway,
                "-O" => mode = InvocationMode::BatchOneway,
                "-d" => mode = InvocationMode::Datagram,
                "-D" => mode = InvocationMode::BatchDatagram,
                "-s" => secure = true,
                _ => {
                    return Err(ProxyParseError::UnknownOption {
                        option: token.to_string(),
                    });
                }
            }
        }

        let reference = match (adapter_id, endpoints) {
            (Some(_), endpoints) if !endpoints.is_empty() => {
                return Err(ProxyParseError::AdapterAndEndpoints);
            }
            (Some(adapter_id), _) => Self::indirect(identity, adapter_id),
            (None, endpoints) if endpoints.is_empty() => {
                return Err(ProxyParseError::MissingBinding);
            }
            (None, endpoints) => Self::direct(identity, endpoints),
        };

        Ok(reference.with_facet(facet).with_mode(mode).with_secure(secure))
    }
}

impl FromStr for Reference {
    type Err = ProxyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::TransportKind;

    #[test]
    fn parses_direct_proxy() {
        let reference = Reference::parse("greeter:tcp -h hello.example -p 4061").unwrap();
        assert_eq!(reference.identity(), &Identity::new("greeter", ""));
        assert_eq!(reference.mode(), InvocationMode::Twoway);
        let endpoints = reference.endpoints().unwrap();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].host(), "hello.example");
        assert_eq!(endpoints[0].port(), 4061);
    }

    #[test]
    fn parses_multiple_endpoints() {
        let reference =
            Reference::parse("greeter:tcp -h a -p 1:ssl -h b -p 2 -t 500").unwrap();
        let endpoints = reference.endpoints().unwrap();
        assert_eq!(endpoints.len(), 2);
        assert!(endpoints[1].secure());
        assert_eq!(
            endpoints[1].timeout(),
            Some(std::time::Duration::from_millis(500))
        );
    }

    #[test]
    fn parses_indirect_proxy() {
        let reference = Reference::parse("demo/greeter -o @ GreeterAdapter").unwrap();
        assert_eq!(reference.identity(), &Identity::new("greeter", "demo"));
        assert_eq!(reference.mode(), InvocationMode::Oneway);
        assert_eq!(reference.adapter_id(), Some("GreeterAdapter"));
    }

    #[test]
    fn parses_facet_and_flags() {
        let reference =
            Reference::parse("obj -f status -D -s:udp -h h -p 9").unwrap();
        assert_eq!(reference.facet(), "status");
        assert_eq!(reference.mode(), InvocationMode::BatchDatagram);
        assert!(reference.secure());
        assert_eq!(
            reference.endpoints().unwrap()[0].kind(),
            TransportKind::Datagram
        );
    }

    #[test]
    fn rejects_unknown_option() {
        let error = Reference::parse("obj -q:tcp -h h -p 1").unwrap_err();
        assert!(matches!(error, ProxyParseError::UnknownOption { .. }));
    }

    #[test]
    fn rejects_missing_binding() {
        assert!(matches!(
            Reference::parse("obj -t").unwrap_err(),
            ProxyParseError::MissingBinding
        ));
    }

    #[test]
    fn rejects_adapter_with_endpoints() {
        // `@` binds tighter than `:` so the adapter must stand alone.
        let error = Reference::parse("obj @ Adapter:tcp -h h -p 1").unwrap_err();
        assert!(matches!(error, ProxyParseError::AdapterAndEndpoints));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(
            Reference::parse("   ").unwrap_err(),
            ProxyParseError::Empty
        ));
    }

    #[test]
    fn display_of_direct_proxy_reparses() {
        let reference = Reference::parse("greeter -o:tcp -h a -p 1").unwrap();
        let reparsed = Reference::parse(&reference.to_string()).unwrap();
        assert_eq!(reference, reparsed);
    }
}
