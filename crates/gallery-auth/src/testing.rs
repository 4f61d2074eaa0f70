//! In-memory doubles for the transport and persistence seams.
//!
//! Available to this crate's tests and, via the `test-util` feature, to
//! dependent crates.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use serde_json::Value;

use crate::credentials::{CredentialPersistence, OAuthMaterial};
use crate::error::{Error, Result};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport};

/// Transport answering from per-path queues of canned responses.
///
/// Each request pops the next response queued for its path. When a path's
/// queue is empty the repeating response for that path is used, if any;
/// otherwise the request fails with a transport error.
#[derive(Default)]
pub struct ScriptedTransport {
    queued: Mutex<HashMap<String, VecDeque<Result<ApiResponse>>>>,
    repeating: Mutex<HashMap<String, ApiResponse>>,
    log: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, path: &str, status: u16, body: Value) -> &Self {
        self.queue(path, Ok(ApiResponse::new(status, body)))
    }

    pub fn push_failure(&self, path: &str, message: &str) -> &Self {
        self.queue(path, Err(Error::Transport(message.to_string())))
    }

    pub fn repeat(&self, path: &str, status: u16, body: Value) -> &Self {
        self.repeating
            .lock()
            .unwrap()
            .insert(path.to_string(), ApiResponse::new(status, body));
        self
    }

    fn queue(&self, path: &str, response: Result<ApiResponse>) -> &Self {
        self.queued
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.log.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests_to(path).len()
    }

    fn next_response(&self, path: &str) -> Result<ApiResponse> {
        let queued = self
            .queued
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(VecDeque::pop_front);
        match queued {
            Some(response) => response,
            None => self
                .repeating
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| Error::Transport(format!("no scripted response for {path}"))),
        }
    }
}

impl HttpTransport for ScriptedTransport {
    fn send<'a>(
        &'a self,
        request: ApiRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ApiResponse>> + Send + 'a>> {
        let response = self.next_response(&request.path);
        self.log.lock().unwrap().push(request);
        Box::pin(async move { response })
    }
}

/// Persistence that remembers every write instead of touching disk.
#[derive(Default)]
pub struct RecordingPersistence {
    saved: Mutex<Vec<(String, OAuthMaterial)>>,
}

impl RecordingPersistence {
    pub fn saved(&self) -> Vec<(String, OAuthMaterial)> {
        self.saved.lock().unwrap().clone()
    }
}

impl CredentialPersistence for RecordingPersistence {
    fn persist<'a>(
        &'a self,
        identity: &'a str,
        oauth: &'a OAuthMaterial,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        self.saved
            .lock()
            .unwrap()
            .push((identity.to_string(), oauth.clone()));
        Box::pin(async { Ok(()) })
    }
}
