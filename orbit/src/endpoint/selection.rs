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

//! Candidate endpoint filtering and ordering.

use super::{Endpoint, TransportKind};
use rand::seq::SliceRandom;
use rand::thread_rng;

/// Policy for ordering endpoint candidates before connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EndpointSelection {
    /// Shuffle candidates so load spreads across replicas.
    #[default]
    Random,
    /// Keep candidates in their resolved order; earlier entries are
    /// preferred and later ones are failover targets.
    Ordered,
}

/// Drops endpoints the reference can never use: opaque transports, and
/// endpoints whose datagram-ness disagrees with the invocation mode.
pub(crate) fn filter_unusable(endpoints: Vec<Endpoint>, datagram: bool) -> Vec<Endpoint> {
    endpoints
        .into_iter()
        .filter(|e| e.kind() != TransportKind::Opaque)
        .filter(|e| e.kind().is_datagram() == datagram)
        .collect()
}

/// Applies the security policy.
///
/// When security is required, non-secure endpoints are dropped. Otherwise
/// both kinds survive and are stably partitioned: secure first when
/// `prefer_secure`, non-secure first when not. Ties preserve relative order.
pub(crate) fn filter_for_security(
    mut endpoints: Vec<Endpoint>,
    secure_required: bool,
    prefer_secure: bool,
) -> Vec<Endpoint> {
    if secure_required {
        endpoints.retain(Endpoint::secure);
        return endpoints;
    }
    if prefer_secure {
        endpoints.sort_by_key(|e| !e.secure());
    } else {
        endpoints.sort_by_key(Endpoint::secure);
    }
    endpoints
}

/// Orders the final candidate list according to the selection policy.
pub(crate) fn order_endpoints(endpoints: &mut [Endpoint], selection: EndpointSelection) {
    match selection {
        EndpointSelection::Random => endpoints.shuffle(&mut thread_rng()),
        EndpointSelection::Ordered => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(port: u16) -> Endpoint {
        Endpoint::new(TransportKind::Stream, "host", port)
    }

    fn datagram(port: u16) -> Endpoint {
        Endpoint::new(TransportKind::Datagram, "host", port)
    }

    #[test]
    fn filter_drops_mode_mismatches() {
        let endpoints = vec![stream(1), datagram(2), stream(3)];
        let kept = filter_unusable(endpoints.clone(), false);
        assert_eq!(
            kept.iter().map(Endpoint::port).collect::<Vec<_>>(),
            vec![1, 3]
        );

        let kept = filter_unusable(endpoints, true);
        assert_eq!(
            kept.iter().map(Endpoint::port).collect::<Vec<_>>(),
            vec![2]
        );
    }

    #[test]
    fn filter_drops_opaque() {
        let endpoints = vec![stream(1), Endpoint::new(TransportKind::Opaque, "host", 2)];
        let kept = filter_unusable(endpoints, false);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].port(), 1);
    }

    #[test]
    fn secure_required_drops_plain_endpoints() {
        let endpoints = vec![stream(1), stream(2).with_secure(true), stream(3)];
        let kept = filter_for_security(endpoints, true, false);
        assert_eq!(
            kept.iter().map(Endpoint::port).collect::<Vec<_>>(),
            vec![2]
        );
    }

    #[test]
    fn prefer_secure_is_a_stable_partition() {
        let endpoints = vec![
            stream(1),
            stream(2).with_secure(true),
            stream(3),
            stream(4).with_secure(true),
        ];
        let kept = filter_for_security(endpoints.clone(), false, true);
        assert_eq!(
            kept.iter().map(Endpoint::port).collect::<Vec<_>>(),
            vec![2, 4, 1, 3]
        );

        let kept = filter_for_security(endpoints, false, false);
        assert_eq!(
            kept.iter().map(Endpoint::port).collect::<Vec<_>>(),
            vec![1, 3, 2, 4]
        );
    }

    #[test]
    fn ordered_selection_preserves_order() {
        let mut endpoints = vec![stream(1), stream(2), stream(3)];
        order_endpoints(&mut endpoints, EndpointSelection::Ordered);
        assert_eq!(
            endpoints.iter().map(Endpoint::port).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn random_selection_keeps_the_same_set() {
        let mut endpoints: Vec<_> = (0..16).map(stream).collect();
        order_endpoints(&mut endpoints, EndpointSelection::Random);
        let mut ports: Vec<_> = endpoints.iter().map(Endpoint::port).collect();
        ports.sort_unstable();
        assert_eq!(ports, (0..16).collect::<Vec<_>>());
    }
}
