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

//! Multi-endpoint references: failover across the candidate list.

mod common;

use bytes::Bytes;
use common::MockFactory;
use orbit::{Communicator, Connection, EndpointSelection, Proxy};
use std::sync::Arc;

const TWO_ENDPOINTS: &str = "greeter:tcp -h test-host -p 5001:tcp -h test-host -p 5002";

fn ordered_proxy(factory: Arc<MockFactory>) -> (Communicator, Proxy) {
    let communicator = Communicator::builder(factory).build();
    let proxy = communicator
        .string_to_proxy(TWO_ENDPOINTS)
        .expect("valid proxy string")
        .with_selection(EndpointSelection::Ordered);
    (communicator, proxy)
}

#[tokio::test]
async fn uncached_binding_fails_over_endpoint_by_endpoint() {
    let factory = MockFactory::new();
    factory.make_unreachable(5001);
    let (_communicator, proxy) = ordered_proxy(factory.clone());
    let proxy = proxy.with_cache_connection(false);

    proxy.invoke("op", true, Bytes::new()).await.unwrap();

    // Each endpoint got its own factory call, in reference order.
    assert_eq!(factory.attempts(), vec![vec![5001], vec![5002]]);
    assert_eq!(factory.last_connection().endpoint().port(), 5002);
}

#[tokio::test]
async fn cached_binding_hands_the_factory_the_whole_list() {
    let factory = MockFactory::new();
    factory.make_unreachable(5001);
    let (_communicator, proxy) = ordered_proxy(factory.clone());

    proxy.invoke("op", true, Bytes::new()).await.unwrap();

    assert_eq!(factory.creates(), 1);
    assert_eq!(factory.attempts(), vec![vec![5001, 5002]]);
    assert_eq!(factory.last_connection().endpoint().port(), 5002);
}

#[tokio::test]
async fn all_endpoints_dead_surfaces_the_last_error() {
    let factory = MockFactory::new();
    factory.make_unreachable(5001);
    factory.make_unreachable(5002);
    let communicator = Communicator::builder(factory.clone())
        .with_retry_policy(orbit::RetryPolicy::disabled())
        .build();
    let proxy = communicator
        .string_to_proxy(TWO_ENDPOINTS)
        .unwrap()
        .with_selection(EndpointSelection::Ordered)
        .with_cache_connection(false);

    proxy
        .invoke("op", true, Bytes::new())
        .await
        .expect_err("every endpoint is dead");
    assert_eq!(factory.attempts(), vec![vec![5001], vec![5002]]);
}
