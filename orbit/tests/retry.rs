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

//! Automatic retry: intervals, after-sent rules, and shutdown.

mod common;

use bytes::Bytes;
use common::{MockFactory, RecordingObserver};
use orbit::{Communicator, InvocationError, Proxy, RetryPolicy, TransportError};
use std::sync::Arc;
use std::time::Duration;

fn proxy_with_policy(factory: Arc<MockFactory>, policy: RetryPolicy) -> (Communicator, Proxy) {
    let communicator = Communicator::builder(factory)
        .with_retry_policy(policy)
        .build();
    let proxy = communicator
        .string_to_proxy("greeter:tcp -h test-host -p 4061")
        .expect("valid proxy string");
    (communicator, proxy)
}

#[tokio::test(start_paused = true)]
async fn retry_intervals_are_honored() {
    let factory = MockFactory::new();
    let policy: RetryPolicy = "10 50".parse().unwrap();
    let (_communicator, proxy) = proxy_with_policy(factory.clone(), policy);

    // Bind first so the failures hit an established connection.
    proxy.invoke("warm", true, Bytes::new()).await.unwrap();
    let connection = factory.last_connection();
    connection.fail_next_sends(3);

    proxy.invoke("op", true, Bytes::new()).await.unwrap();

    // warm + 4 attempts of "op"; the last interval repeats once exhausted.
    let times = connection.attempt_times();
    assert_eq!(times.len(), 5);
    assert!(times[2] - times[1] >= Duration::from_millis(10));
    assert!(times[3] - times[2] >= Duration::from_millis(50));
    assert!(times[4] - times[3] >= Duration::from_millis(50));
    assert_eq!(connection.operations(), vec!["warm", "op"]);
}

#[tokio::test]
async fn each_failed_attempt_is_reported() {
    let factory = MockFactory::new();
    let observer = RecordingObserver::new();
    let communicator = Communicator::builder(factory.clone())
        .with_retry_policy("0".parse().unwrap())
        .with_observer(observer.clone())
        .build();
    let proxy = communicator
        .string_to_proxy("greeter:tcp -h test-host -p 4061")
        .unwrap();

    proxy.invoke("warm", true, Bytes::new()).await.unwrap();
    factory.last_connection().fail_next_sends(2);
    proxy.invoke("op", true, Bytes::new()).await.unwrap();

    assert_eq!(
        observer.attempts(),
        vec![("op".to_string(), 1), ("op".to_string(), 2)]
    );
    assert_eq!(observer.outcomes(), vec!["ok:warm", "ok:op"]);
}

#[tokio::test]
async fn transmitted_twoway_is_not_retried() {
    let factory = MockFactory::new();
    let (_communicator, proxy) = proxy_with_policy(factory.clone(), RetryPolicy::default());

    proxy.invoke("warm", true, Bytes::new()).await.unwrap();
    let connection = factory.last_connection();
    connection.fail_next_after_sent(1);

    let error = proxy
        .invoke("op", false, Bytes::new())
        .await
        .expect_err("a transmitted non-idempotent call must not be repeated");
    assert!(matches!(
        error,
        InvocationError::Transport(TransportError::ConnectionLost { .. })
    ));
    // The operation went out exactly once.
    assert_eq!(connection.operations(), vec!["warm", "op"]);
}

#[tokio::test]
async fn transmitted_idempotent_call_is_retried() {
    let factory = MockFactory::new();
    let (_communicator, proxy) = proxy_with_policy(factory.clone(), RetryPolicy::default());

    proxy.invoke("warm", true, Bytes::new()).await.unwrap();
    let connection = factory.last_connection();
    connection.fail_next_after_sent(1);

    proxy.invoke("op", true, Bytes::new()).await.unwrap();
    assert_eq!(connection.operations(), vec!["warm", "op", "op"]);
}

#[tokio::test]
async fn retry_transmitted_opt_in_covers_non_idempotent_calls() {
    let factory = MockFactory::new();
    let (_communicator, base) = proxy_with_policy(factory.clone(), RetryPolicy::default());
    let proxy = base.with_retry_transmitted(true);

    proxy.invoke("warm", true, Bytes::new()).await.unwrap();
    let connection = factory.last_connection();
    connection.fail_next_after_sent(1);

    proxy.invoke("op", false, Bytes::new()).await.unwrap();
    assert_eq!(connection.operations(), vec!["warm", "op", "op"]);
}

#[tokio::test]
async fn disabled_policy_makes_the_first_failure_terminal() {
    let factory = MockFactory::new();
    let (_communicator, proxy) = proxy_with_policy(factory.clone(), "-1".parse().unwrap());

    proxy.invoke("warm", true, Bytes::new()).await.unwrap();
    factory.last_connection().fail_all_sends();

    let error = proxy
        .invoke("op", true, Bytes::new())
        .await
        .expect_err("retry is disabled");
    assert!(matches!(
        error,
        InvocationError::Transport(TransportError::ConnectionLost { .. })
    ));
    assert_eq!(factory.last_connection().operations(), vec!["warm"]);
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_scheduled_retries() {
    let factory = MockFactory::new();
    let policy: RetryPolicy = "10000".parse().unwrap();
    let (communicator, proxy) = proxy_with_policy(factory.clone(), policy);

    proxy.invoke("warm", true, Bytes::new()).await.unwrap();
    factory.last_connection().fail_all_sends();

    // The failed attempt parks in the retry queue for ten seconds...
    let result = proxy.begin_invoke("op", true, Bytes::new()).await;
    assert!(!result.is_completed());

    // ...and shutdown flushes it out as canceled instead of waiting.
    communicator.shutdown();
    let error = result.wait().await.expect_err("retry was canceled");
    assert!(matches!(error, InvocationError::Canceled));
}
