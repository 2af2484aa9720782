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

//! Echo client example demonstrating the invocation runtime end to end.
//!
//! The "transport" here is an in-process echo: every request is answered
//! with its own payload, and the first few sends on a fresh connection can
//! be made to fail so the automatic retry machinery has something to do.
//!
//! # Features Demonstrated
//! - Building a communicator over a custom [`ConnectionFactory`]
//! - Proxy strings and per-proxy configuration (`with_mode`, timeouts)
//! - Twoway, oneway and batch invocations
//! - Automatic retry with configured intervals
//!
//! # Running the Example
//! ```bash
//! cargo run --example echo_client
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use orbit::{
    BindingError, Communicator, Connection, ConnectionFactory, Endpoint, EndpointSelection,
    InvocationMode, OutgoingAsync, RetryPolicy, TransportError,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Echoes every request; the first `flaky_sends` requests fail before
/// anything is transmitted, which is exactly the failure class the retry
/// policy is allowed to repair.
struct EchoConnection {
    endpoint: Endpoint,
    flaky_sends: AtomicUsize,
}

#[async_trait]
impl Connection for EchoConnection {
    async fn send_request(
        &self,
        call: Arc<OutgoingAsync>,
        _compress: bool,
        response_expected: bool,
    ) -> Result<bool, TransportError> {
        let remaining = self.flaky_sends.load(Ordering::SeqCst);
        if remaining > 0 {
            self.flaky_sends.store(remaining - 1, Ordering::SeqCst);
            return Err(TransportError::ConnectionLost {
                reason: "simulated transient failure".to_string(),
                source: None,
            });
        }
        println!("  -> {} ({} bytes)", call.operation(), call.payload().len());
        if response_expected {
            let payload = call.payload().clone();
            call.finished_ok(payload);
        }
        Ok(true)
    }

    async fn send_batch(
        &self,
        payload: Bytes,
        count: usize,
        _compress: bool,
    ) -> Result<(), TransportError> {
        println!("  -> batch of {count} requests ({} bytes)", payload.len());
        Ok(())
    }

    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn timeout(&self) -> Option<Duration> {
        None
    }

    fn is_active(&self) -> bool {
        true
    }
}

/// Hands out one shared connection, the way a pooling factory would.
#[derive(Default)]
struct EchoFactory {
    pooled: std::sync::Mutex<Option<Arc<EchoConnection>>>,
}

#[async_trait]
impl ConnectionFactory for EchoFactory {
    async fn create(
        &self,
        endpoints: &[Endpoint],
        _has_more: bool,
        _selection: EndpointSelection,
    ) -> Result<Arc<dyn Connection>, BindingError> {
        let mut pooled = self.pooled.lock().unwrap();
        if let Some(connection) = pooled.as_ref() {
            return Ok(connection.clone());
        }
        let endpoint = endpoints[0].clone();
        println!("  connected to {endpoint}");
        let connection = Arc::new(EchoConnection {
            endpoint,
            flaky_sends: AtomicUsize::new(2),
        });
        *pooled = Some(connection.clone());
        Ok(connection.clone() as Arc<dyn Connection>)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Echo Client Example ===\n");

    let communicator = Communicator::builder(Arc::new(EchoFactory::default()))
        .with_retry_policy("100 500".parse::<RetryPolicy>()?)
        .build();
    let proxy = communicator.string_to_proxy("echo:tcp -h demo-host -p 4061")?;
    println!("proxy: {proxy}\n");

    println!("=== Twoway (rides out two transient failures) ===");
    let reply = proxy
        .invoke("say_hello", true, Bytes::from_static(b"hello, orbit"))
        .await?;
    println!("  <- {} bytes echoed back\n", reply.len());

    println!("=== Oneway (completes as soon as it is sent) ===");
    let oneway = proxy.with_mode(InvocationMode::Oneway);
    oneway
        .invoke("notify", false, Bytes::from_static(b"fire and forget"))
        .await?;
    println!("  done\n");

    println!("=== Batch (three requests, one message) ===");
    let batch = proxy.with_mode(InvocationMode::BatchOneway);
    for payload in ["one", "two", "three"] {
        batch
            .invoke("log", false, Bytes::copy_from_slice(payload.as_bytes()))
            .await?;
    }
    batch.flush_batch_requests().await?;
    println!("  done\n");

    communicator.shutdown();
    println!("=== Complete ===");
    Ok(())
}
