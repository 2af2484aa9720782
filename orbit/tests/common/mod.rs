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

//! Mock transport, locator and observer implementations shared by the
//! integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use orbit::{
    BindingError, Connection, ConnectionFactory, Endpoint, EndpointSelection, InvocationError,
    InvocationObserver, LocatorResolver, OutgoingAsync, TransportError, TransportKind,
};
use std::collections::{HashSet, VecDeque};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

pub fn tcp(port: u16) -> Endpoint {
    Endpoint::new(TransportKind::Stream, "test-host", port)
}

pub fn lost() -> TransportError {
    TransportError::ConnectionLost {
        reason: "injected failure".to_string(),
        source: None,
    }
}

/// Decrements a failure budget; `usize::MAX` means "always fail".
fn take_failure(counter: &AtomicUsize) -> bool {
    let mut current = counter.load(Ordering::SeqCst);
    loop {
        if current == 0 {
            return false;
        }
        if current == usize::MAX {
            return true;
        }
        match counter.compare_exchange(current, current - 1, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => return true,
            Err(observed) => current = observed,
        }
    }
}

/// In-memory connection that echoes request payloads and records what it
/// was asked to transmit. Failure injection is per-call-count.
pub struct MockConnection {
    endpoint: Endpoint,
    operations: Mutex<Vec<String>>,
    batches: Mutex<Vec<(Bytes, usize)>>,
    attempt_times: Mutex<Vec<tokio::time::Instant>>,
    active: AtomicBool,
    respond: AtomicBool,
    fail_sends: AtomicUsize,
    fail_after_sent: AtomicUsize,
}

impl MockConnection {
    pub fn new(endpoint: Endpoint) -> Arc<Self> {
        Arc::new(Self {
            endpoint,
            operations: Mutex::new(Vec::new()),
            batches: Mutex::new(Vec::new()),
            attempt_times: Mutex::new(Vec::new()),
            active: AtomicBool::new(true),
            respond: AtomicBool::new(true),
            fail_sends: AtomicUsize::new(0),
            fail_after_sent: AtomicUsize::new(0),
        })
    }

    /// Operations successfully handed to this connection, in order.
    pub fn operations(&self) -> Vec<String> {
        self.operations.lock().unwrap().clone()
    }

    /// Batches transmitted through this connection.
    pub fn batches(&self) -> Vec<(Bytes, usize)> {
        self.batches.lock().unwrap().clone()
    }

    /// Time of every send attempt, including failed ones.
    pub fn attempt_times(&self) -> Vec<tokio::time::Instant> {
        self.attempt_times.lock().unwrap().clone()
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    /// Stops answering twoway requests; they stay pending forever.
    pub fn stop_responding(&self) {
        self.respond.store(false, Ordering::SeqCst);
    }

    /// Fails the next `count` sends before anything is transmitted.
    pub fn fail_next_sends(&self, count: usize) {
        self.fail_sends.store(count, Ordering::SeqCst);
    }

    /// Fails every send before anything is transmitted.
    pub fn fail_all_sends(&self) {
        self.fail_sends.store(usize::MAX, Ordering::SeqCst);
    }

    /// For the next `count` requests: confirm the bytes as transmitted,
    /// then fail the connection before a response arrives.
    pub fn fail_next_after_sent(&self, count: usize) {
        self.fail_after_sent.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn send_request(
        &self,
        call: Arc<OutgoingAsync>,
        _compress: bool,
        response_expected: bool,
    ) -> Result<bool, TransportError> {
        self.attempt_times
            .lock()
            .unwrap()
            .push(tokio::time::Instant::now());
        if take_failure(&self.fail_sends) {
            return Err(lost());
        }
        self.operations
            .lock()
            .unwrap()
            .push(call.operation().to_string());
        // Report sent before any response, the way a real transport would.
        call.sent(true);
        if take_failure(&self.fail_after_sent) {
            // Bytes left, then the connection dropped before the reply.
            call.finished_err(lost().into());
            return Ok(false);
        }
        if response_expected && self.respond.load(Ordering::SeqCst) {
            call.finished_ok(call.payload().clone());
        }
        Ok(false)
    }

    async fn send_batch(
        &self,
        payload: Bytes,
        count: usize,
        _compress: bool,
    ) -> Result<(), TransportError> {
        if take_failure(&self.fail_sends) {
            return Err(lost());
        }
        self.batches.lock().unwrap().push((payload, count));
        Ok(())
    }

    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn timeout(&self) -> Option<Duration> {
        None
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Factory producing [`MockConnection`]s, with an optional gate holding
/// binding attempts open and a set of unreachable ports.
pub struct MockFactory {
    connections: Mutex<Vec<Arc<MockConnection>>>,
    attempts: Mutex<Vec<Vec<u16>>>,
    unreachable: Mutex<HashSet<u16>>,
    creates: AtomicUsize,
    gate: Option<Semaphore>,
}

impl MockFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            connections: Mutex::new(Vec::new()),
            attempts: Mutex::new(Vec::new()),
            unreachable: Mutex::new(HashSet::new()),
            creates: AtomicUsize::new(0),
            gate: None,
        })
    }

    /// A factory whose `create` blocks until [`release_binding`] is
    /// called, so tests can pile requests up behind an in-progress bind.
    ///
    /// [`release_binding`]: Self::release_binding
    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            connections: Mutex::new(Vec::new()),
            attempts: Mutex::new(Vec::new()),
            unreachable: Mutex::new(HashSet::new()),
            creates: AtomicUsize::new(0),
            gate: Some(Semaphore::new(0)),
        })
    }

    /// Lets one gated `create` call proceed.
    pub fn release_binding(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn make_unreachable(&self, port: u16) {
        self.unreachable.lock().unwrap().insert(port);
    }

    pub fn make_reachable(&self, port: u16) {
        self.unreachable.lock().unwrap().remove(&port);
    }

    /// Total `create` calls.
    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// The candidate port list of every `create` call, in order.
    pub fn attempts(&self) -> Vec<Vec<u16>> {
        self.attempts.lock().unwrap().clone()
    }

    /// Connections created so far, in creation order.
    pub fn connections(&self) -> Vec<Arc<MockConnection>> {
        self.connections.lock().unwrap().clone()
    }

    /// The most recent connection.
    pub fn last_connection(&self) -> Arc<MockConnection> {
        self.connections
            .lock()
            .unwrap()
            .last()
            .expect("no connection was created")
            .clone()
    }
}

#[async_trait]
impl ConnectionFactory for MockFactory {
    async fn create(
        &self,
        endpoints: &[Endpoint],
        _has_more: bool,
        _selection: EndpointSelection,
    ) -> Result<Arc<dyn Connection>, BindingError> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.attempts
            .lock()
            .unwrap()
            .push(endpoints.iter().map(Endpoint::port).collect());

        let unreachable = self.unreachable.lock().unwrap().clone();
        for endpoint in endpoints {
            if !unreachable.contains(&endpoint.port()) {
                let connection = MockConnection::new(endpoint.clone());
                self.connections.lock().unwrap().push(connection.clone());
                return Ok(connection as Arc<dyn Connection>);
            }
        }
        Err(BindingError::ConnectFailed {
            endpoint: endpoints[0].to_string(),
            source: Arc::new(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            )),
        })
    }
}

/// Locator resolver that replays a scripted sequence of responses, then
/// keeps repeating the last one.
pub struct ScriptedResolver {
    responses: Mutex<VecDeque<Vec<Endpoint>>>,
    last: Mutex<Vec<Endpoint>>,
    calls: AtomicUsize,
}

impl ScriptedResolver {
    pub fn new(responses: Vec<Vec<Endpoint>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            last: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocatorResolver for ScriptedResolver {
    async fn resolve(&self, _adapter_id: &str) -> Result<Vec<Endpoint>, BindingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        match responses.pop_front() {
            Some(endpoints) => {
                *self.last.lock().unwrap() = endpoints.clone();
                Ok(endpoints)
            }
            None => Ok(self.last.lock().unwrap().clone()),
        }
    }
}

/// Observer that records every report it receives.
#[derive(Default)]
pub struct RecordingObserver {
    attempts: Mutex<Vec<(String, u32)>>,
    outcomes: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn attempts(&self) -> Vec<(String, u32)> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn outcomes(&self) -> Vec<String> {
        self.outcomes.lock().unwrap().clone()
    }
}

impl InvocationObserver for RecordingObserver {
    fn attempt_failed(&self, operation: &str, _error: &InvocationError, attempt: u32) {
        self.attempts
            .lock()
            .unwrap()
            .push((operation.to_string(), attempt));
    }

    fn succeeded(&self, operation: &str) {
        self.outcomes
            .lock()
            .unwrap()
            .push(format!("ok:{operation}"));
    }

    fn failed(&self, operation: &str, _error: &InvocationError) {
        self.outcomes
            .lock()
            .unwrap()
            .push(format!("err:{operation}"));
    }
}
