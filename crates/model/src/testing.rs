//! Testing utilities for models
//!
//! [`MockClient`] is an in-memory [`HttpClient`]: it records every request
//! and answers from a queue of canned outcomes. Clones share the same queue
//! and history, so a test can keep a handle while the model owns another.

use async_trait::async_trait;
use http::{Method, StatusCode};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;

use crate::error::BoxError;
use crate::transport::{HttpClient, Request, Response};

/// Failure returned by [`MockClient`] for a queued [`MockClient::fail`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct MockTransportError(pub String);

#[derive(Debug)]
enum Outcome {
    Respond(Response),
    Fail(MockTransportError),
}

/// Recording HTTP client with scripted responses.
///
/// When the queue is empty every request is answered with `204 No Content`.
#[derive(Debug, Clone, Default)]
pub struct MockClient {
    outcomes: Arc<Mutex<VecDeque<Outcome>>>,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl MockClient {
    /// A client with an empty queue and no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    pub fn respond(&self, response: Response) -> &Self {
        self.outcomes.lock().push_back(Outcome::Respond(response));
        self
    }

    /// Queues a response with a JSON body.
    pub fn respond_json(&self, status: StatusCode, data: Value) -> &Self {
        self.respond(Response::new(status).with_data(data))
    }

    /// Queues a transport failure.
    pub fn fail(&self, message: impl Into<String>) -> &Self {
        self.outcomes
            .lock()
            .push_back(Outcome::Fail(MockTransportError(message.into())));
        self
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<Request> {
        self.requests.lock().last().cloned()
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// `(method, url)` of every request, for compact assertions.
    pub fn calls(&self) -> Vec<(Method, String)> {
        self.requests
            .lock()
            .iter()
            .map(|request| (request.method.clone(), request.url.clone()))
            .collect()
    }

    /// Forgets recorded requests. Queued outcomes are kept.
    pub fn clear_history(&self) {
        self.requests.lock().clear();
    }
}

#[async_trait]
impl HttpClient for MockClient {
    async fn send(&self, request: Request) -> Result<Response, BoxError> {
        self.requests.lock().push(request);
        let outcome = self.outcomes.lock().pop_front();
        match outcome {
            Some(Outcome::Respond(response)) => Ok(response),
            Some(Outcome::Fail(error)) => Err(Box::new(error)),
            None => Ok(Response::no_content()),
        }
    }
}
