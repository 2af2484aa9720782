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

//! The endpoint value type.

use std::fmt;
use std::time::Duration;

/// Transport family of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// Reliable byte-stream transport (e.g. TCP, TLS).
    Stream,
    /// Unreliable message transport (e.g. UDP).
    Datagram,
    /// Unknown transport carried opaquely; never connectable from here.
    Opaque,
}

impl TransportKind {
    /// Returns `true` for datagram transports.
    #[must_use]
    pub const fn is_datagram(&self) -> bool {
        matches!(self, Self::Datagram)
    }
}

/// One concrete network destination plus transport-level attributes.
///
/// Endpoints are immutable and comparable; equality over all attributes
/// makes them usable as connection-pool keys. Two endpoints that differ
/// only in attributes that do not affect the liveness of a connection are
/// [`equivalent`](Endpoint::equivalent) and may share a pooled connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    kind: TransportKind,
    host: String,
    port: u16,
    timeout: Option<Duration>,
    compress: bool,
    secure: bool,
    connection_id: String,
}

impl Endpoint {
    /// Creates an endpoint with default attributes: no timeout, no
    /// compression, not secure, empty connection-group id.
    #[must_use]
    pub fn new(kind: TransportKind, host: impl Into<String>, port: u16) -> Self {
        Self {
            kind,
            host: host.into(),
            port,
            timeout: None,
            compress: false,
            secure: false,
            connection_id: String::new(),
        }
    }

    /// Transport family of this endpoint.
    #[must_use]
    pub const fn kind(&self) -> TransportKind {
        self.kind
    }

    /// Destination host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Destination port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Connect/read timeout, if one is set.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Whether payloads on this endpoint are compressed.
    #[must_use]
    pub const fn compress(&self) -> bool {
        self.compress
    }

    /// Whether this endpoint uses a secure transport.
    #[must_use]
    pub const fn secure(&self) -> bool {
        self.secure
    }

    /// Connection-group id; connections are never shared across groups.
    #[must_use]
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Returns a copy with the given timeout.
    #[must_use]
    pub fn with_timeout(&self, timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            ..self.clone()
        }
    }

    /// Returns a copy with the given compression flag.
    #[must_use]
    pub fn with_compress(&self, compress: bool) -> Self {
        Self {
            compress,
            ..self.clone()
        }
    }

    /// Returns a copy with the given security flag.
    #[must_use]
    pub fn with_secure(&self, secure: bool) -> Self {
        Self {
            secure,
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

    /// Returns `true` if both endpoints would accept or produce the same
    /// live connection.
    ///
    /// Timeout and compression are per-call concerns applied after a
    /// connection exists, so they are ignored; transport kind, address,
    /// security and connection-group id are not.
    #[must_use]
    pub fn equivalent(&self, other: &Endpoint) -> bool {
        self.kind == other.kind
            && self.host == other.host
            && self.port == other.port
            && self.secure == other.secure
            && self.connection_id == other.connection_id
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match (self.kind, self.secure) {
            (TransportKind::Stream, false) => "tcp",
            (TransportKind::Stream, true) => "ssl",
            (TransportKind::Datagram, _) => "udp",
            (TransportKind::Opaque, _) => "opaque",
        };
        write!(f, "{} -h {} -p {}", name, self.host, self.port)?;
        if let Some(timeout) = self.timeout {
            write!(f, " -t {}", timeout.as_millis())?;
        }
        if self.compress {
            write!(f, " -z")?;
        }
        if self.kind == TransportKind::Datagram && self.secure {
            write!(f, " -s")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tcp(port: u16) -> Endpoint {
        Endpoint::new(TransportKind::Stream, "host", port)
    }

    #[test]
    fn attribute_overrides_produce_copies() {
        let base = tcp(1000);
        let tuned = base
            .with_timeout(Some(Duration::from_millis(500)))
            .with_compress(true)
            .with_connection_id("group-a");

        assert_eq!(base.timeout(), None);
        assert!(!base.compress());
        assert_eq!(tuned.timeout(), Some(Duration::from_millis(500)));
        assert!(tuned.compress());
        assert_eq!(tuned.connection_id(), "group-a");
    }

    #[test]
    fn equivalence_ignores_per_call_attributes() {
        let a = tcp(1000);
        let b = a
            .with_timeout(Some(Duration::from_secs(1)))
            .with_compress(true);
        assert!(a.equivalent(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn equivalence_respects_connection_group() {
        let a = tcp(1000);
        let b = a.with_connection_id("isolated");
        assert!(!a.equivalent(&b));
    }

    #[test]
    fn equivalence_respects_security() {
        let a = tcp(1000);
        let b = a.with_secure(true);
        assert!(!a.equivalent(&b));
    }

    #[test]
    fn display_round_trips_attributes() {
        let endpoint = tcp(4061)
            .with_timeout(Some(Duration::from_millis(5000)))
            .with_compress(true);
        assert_eq!(endpoint.to_string(), "tcp -h host -p 4061 -t 5000 -z");

        let secure = tcp(4062).with_secure(true);
        assert_eq!(secure.to_string(), "ssl -h host -p 4062");
    }
}
