//! Test utilities for the protocol adapter
//!
//! [`FakeRequester`] is a scripted, recording [`Requester`]: tests queue the
//! responses it should hand out and afterwards inspect every request it saw.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use rabbitmon_core::prelude::*;

use crate::transport::{describe, Method, Query, Requester};

/// One request as seen by the fake transport
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: Vec<String>,
    pub body: Option<Value>,
    pub query: Option<Query>,
}

#[derive(Debug)]
enum Scripted {
    Body(Value),
    Empty,
    Status(u16),
}

#[derive(Debug, Default)]
struct FakeState {
    responses: VecDeque<Scripted>,
    calls: Vec<RecordedRequest>,
}

/// Scripted transport. Clones share the same script and call log.
///
/// Responses are handed out in the order they were pushed. A request with
/// nothing left in the script fails with a transport error.
#[derive(Debug, Clone, Default)]
pub struct FakeRequester {
    state: Arc<Mutex<FakeState>>,
}

impl FakeRequester {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the next request with a JSON body
    pub fn push_body(&self, body: Value) {
        self.lock().responses.push_back(Scripted::Body(body));
    }

    /// Answer the next request with a success status and an empty body
    pub fn push_empty(&self) {
        self.lock().responses.push_back(Scripted::Empty);
    }

    /// Fail the next request with an HTTP status (404 maps to `NotFound`)
    pub fn push_status(&self, status: u16) {
        self.lock().responses.push_back(Scripted::Status(status));
    }

    pub fn calls(&self) -> Vec<RecordedRequest> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Number of scripted responses not yet consumed
    pub fn remaining(&self) -> usize {
        self.lock().responses.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Requester for FakeRequester {
    async fn request(
        &self,
        method: Method,
        path: &[&str],
        body: Option<&Value>,
        query: Option<&Query>,
    ) -> Result<Option<Value>> {
        let mut state = self.lock();
        state.calls.push(RecordedRequest {
            method,
            path: path.iter().map(|segment| segment.to_string()).collect(),
            body: body.cloned(),
            query: query.cloned(),
        });

        let operation = describe(method, path);
        match state.responses.pop_front() {
            Some(Scripted::Body(value)) => Ok(Some(value)),
            Some(Scripted::Empty) => Ok(None),
            Some(Scripted::Status(404)) => Err(Error::not_found(operation)),
            Some(Scripted::Status(status)) => {
                Err(Error::transport(operation, format!("HTTP status {status}")))
            }
            None => Err(Error::transport(operation, "no scripted response left")),
        }
    }
}
