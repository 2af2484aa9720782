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

//! Ordering guarantees of the binding handler.

mod common;

use bytes::Bytes;
use common::MockFactory;
use orbit::{Communicator, InvocationHooks, Proxy};

fn proxy_over(factory: std::sync::Arc<MockFactory>) -> (Communicator, Proxy) {
    let communicator = Communicator::builder(factory).build();
    let proxy = communicator
        .string_to_proxy("greeter:tcp -h test-host -p 4061")
        .expect("valid proxy string");
    (communicator, proxy)
}

#[tokio::test]
async fn queued_requests_drain_in_submission_order() {
    let factory = MockFactory::gated();
    let (_communicator, proxy) = proxy_over(factory.clone());

    // All five calls are submitted while the connection is still being
    // established; each returns as soon as it is queued.
    let mut results = Vec::new();
    for index in 0..5 {
        let operation = format!("op{index}");
        results.push(proxy.begin_invoke(&operation, true, Bytes::new()).await);
    }
    assert!(results.iter().all(|r| !r.is_completed()));

    factory.release_binding();
    for result in results {
        result.wait().await.expect("drained call must succeed");
    }

    let operations = factory.last_connection().operations();
    assert_eq!(operations, vec!["op0", "op1", "op2", "op3", "op4"]);
}

#[tokio::test]
async fn concurrent_callers_share_one_binding() {
    let factory = MockFactory::gated();
    let (_communicator, proxy) = proxy_over(factory.clone());

    let mut handles = Vec::new();
    for index in 0..8 {
        let proxy = proxy.clone();
        handles.push(tokio::spawn(async move {
            proxy
                .invoke(&format!("op{index}"), true, Bytes::new())
                .await
        }));
    }
    // Let every caller reach the queue before the bind completes.
    tokio::task::yield_now().await;
    factory.release_binding();

    for handle in handles {
        handle
            .await
            .expect("task must not panic")
            .expect("call must succeed");
    }
    assert_eq!(factory.creates(), 1);
}

#[tokio::test]
async fn bound_proxy_keeps_its_connection() {
    let factory = MockFactory::new();
    let (_communicator, proxy) = proxy_over(factory.clone());

    proxy.invoke("first", true, Bytes::new()).await.unwrap();
    proxy.invoke("second", true, Bytes::new()).await.unwrap();

    assert_eq!(factory.creates(), 1);
    assert_eq!(
        factory.last_connection().operations(),
        vec!["first", "second"]
    );
}

#[tokio::test]
async fn sent_and_completion_hooks_fire() {
    let factory = MockFactory::new();
    let (_communicator, proxy) = proxy_over(factory.clone());

    let (sent_tx, sent_rx) = tokio::sync::oneshot::channel();
    let (done_tx, done_rx) = tokio::sync::oneshot::channel();
    let hooks = InvocationHooks {
        on_sent: Some(Box::new(move |synchronously| {
            let _ = sent_tx.send(synchronously);
        })),
        on_completed: Some(Box::new(move |outcome| {
            let _ = done_tx.send(outcome.is_ok());
        })),
    };

    let result = proxy
        .begin_invoke_with("ping", true, Bytes::from_static(b"payload"), hooks)
        .await;
    let reply = result.wait().await.expect("call must succeed");
    assert_eq!(reply.as_ref(), b"payload");

    assert!(sent_rx.await.expect("sent hook must run"));
    assert!(done_rx.await.expect("completion hook must run"));
}

#[tokio::test]
async fn oneway_completes_at_sent() {
    let factory = MockFactory::new();
    let (_communicator, proxy) = proxy_over(factory.clone());
    let oneway = proxy.with_mode(orbit::InvocationMode::Oneway);

    let reply = oneway
        .invoke("notify", false, Bytes::from_static(b"event"))
        .await
        .expect("oneway completes when sent");
    assert!(reply.is_empty());
    assert_eq!(factory.last_connection().operations(), vec!["notify"]);
}
