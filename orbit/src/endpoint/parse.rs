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

//! Endpoint string parsing.
//!
//! Grammar: `TRANSPORT [-h HOST] [-p PORT] [-t MS|-t infinite] [-z] [-s]`
//! where `TRANSPORT` is `tcp`, `ssl` or `udp`. `ssl` is the stream
//! transport with the secure flag set.

use super::{Endpoint, TransportKind};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors produced while parsing an endpoint string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointParseError {
    /// The string was empty or contained no transport name.
    #[error("empty endpoint string")]
    Empty,

    /// The transport name is not one this runtime can connect.
    #[error("unknown transport `{transport}`")]
    UnknownTransport {
        /// The transport token that was not recognized.
        transport: String,
    },

    /// An option was given without its required argument.
    #[error("option `{option}` requires an argument")]
    MissingArgument {
        /// The option missing its argument.
        option: String,
    },

    /// An option argument could not be parsed.
    #[error("invalid value `{value}` for option `{option}`")]
    InvalidValue {
        /// The option whose argument was invalid.
        option: String,
        /// The offending argument.
        value: String,
    },

    /// An option was not recognized for this transport.
    #[error("unknown endpoint option `{option}`")]
    UnknownOption {
        /// The unrecognized option token.
        option: String,
    },
}

impl FromStr for Endpoint {
    type Err = EndpointParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_whitespace();
        let transport = tokens.next().ok_or(EndpointParseError::Empty)?;
        let (kind, mut secure) = match transport {
            "tcp" => (TransportKind::Stream, false),
            "ssl" => (TransportKind::Stream, true),
            "udp" => (TransportKind::Datagram, false),
            other => {
                return Err(EndpointParseError::UnknownTransport {
                    transport: other.to_string(),
                });
            }
        };

        let mut host = String::from("localhost");
        let mut port = 0u16;
        let mut timeout = None;
        let mut compress = false;

        while let Some(option) = tokens.next() {
            match option {
                "-h" => {
                    host = tokens
                        .next()
                        .ok_or_else(|| missing(option))?
                        .to_string();
                }
                "-p" => {
                    let value = tokens.next().ok_or_else(|| missing(option))?;
                    port = value
                        .parse()
                        .map_err(|_| invalid(option, value))?;
                }
                "-t" => {
                    let value = tokens.next().ok_or_else(|| missing(option))?;
                    if value == "infinite" {
                        timeout = None;
                    } else {
                        let ms: u64 = value
                            .parse()
                            .map_err(|_| invalid(option, value))?;
                        timeout = Some(Duration::from_millis(ms));
                    }
                }
                "-z" => compress = true,
                "-s" => secure = true,
                other => {
                    return Err(EndpointParseError::UnknownOption {
                        option: other.to_string(),
                    });
                }
            }
        }

        let mut endpoint = Endpoint::new(kind, host, port)
            .with_timeout(timeout)
            .with_compress(compress);
        if secure {
            endpoint = endpoint.with_secure(true);
        }
        Ok(endpoint)
    }
}

fn missing(option: &str) -> EndpointParseError {
    EndpointParseError::MissingArgument {
        option: option.to_string(),
    }
}

fn invalid(option: &str, value: &str) -> EndpointParseError {
    EndpointParseError::InvalidValue {
        option: option.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tcp_with_all_options() {
        let endpoint: Endpoint = "tcp -h server.example.com -p 4061 -t 5000 -z"
            .parse()
            .unwrap();
        assert_eq!(endpoint.kind(), TransportKind::Stream);
        assert_eq!(endpoint.host(), "server.example.com");
        assert_eq!(endpoint.port(), 4061);
        assert_eq!(endpoint.timeout(), Some(Duration::from_millis(5000)));
        assert!(endpoint.compress());
        assert!(!endpoint.secure());
    }

    #[test]
    fn ssl_is_secure_stream() {
        let endpoint: Endpoint = "ssl -h host -p 443".parse().unwrap();
        assert_eq!(endpoint.kind(), TransportKind::Stream);
        assert!(endpoint.secure());
    }

    #[test]
    fn udp_is_datagram() {
        let endpoint: Endpoint = "udp -h host -p 9999".parse().unwrap();
        assert_eq!(endpoint.kind(), TransportKind::Datagram);
    }

    #[test]
    fn infinite_timeout_clears_the_timeout() {
        let endpoint: Endpoint = "tcp -h host -p 1 -t infinite".parse().unwrap();
        assert_eq!(endpoint.timeout(), None);
    }

    #[test]
    fn display_parse_round_trip() {
        let original: Endpoint = "tcp -h host -p 4061 -t 5000 -z".parse().unwrap();
        let reparsed: Endpoint = original.to_string().parse().unwrap();
        assert_eq!(original, reparsed);
    }

    #[test]
    fn rejects_unknown_transport() {
        let err = "carrier-pigeon -h host -p 1".parse::<Endpoint>().unwrap_err();
        assert!(matches!(err, EndpointParseError::UnknownTransport { .. }));
    }

    #[test]
    fn rejects_missing_argument() {
        let err = "tcp -h".parse::<Endpoint>().unwrap_err();
        assert!(matches!(err, EndpointParseError::MissingArgument { .. }));
    }

    #[test]
    fn rejects_bad_port() {
        let err = "tcp -h host -p 99999".parse::<Endpoint>().unwrap_err();
        assert!(matches!(err, EndpointParseError::InvalidValue { .. }));
    }
}
