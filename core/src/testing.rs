//! Test doubles shared by the unit test modules.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{StorageError, TransportError};
use crate::http::{HttpRequest, HttpResponse};
use crate::storage::{MemoryTokenStore, TokenStore};
use crate::transport::Transport;

pub type Scripted = Result<HttpResponse, TransportError>;

/// Replays canned responses in order and records every request it receives.
/// Once the script runs out, each call fails with a connection error.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    responses: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Scripted>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            requests: Arc::default(),
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Connect("script exhausted".to_string())))
    }
}

/// Answers by path suffix after a per-route delay, so concurrent calls can
/// finish in a chosen order. Counts calls that ran to completion.
#[derive(Clone, Default)]
pub struct RoutedTransport {
    routes: Arc<Mutex<HashMap<String, (Duration, VecDeque<Scripted>)>>>,
    completed: Arc<AtomicUsize>,
}

impl RoutedTransport {
    pub fn route(self, path: &str, delay: Duration, response: Scripted) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_insert_with(|| (delay, VecDeque::new()))
            .1
            .push_back(response);
        self
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for RoutedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let (delay, response) = {
            let mut routes = self.routes.lock().unwrap();
            match routes
                .iter_mut()
                .find(|(path, _)| request.path.ends_with(path.as_str()))
            {
                Some((_, (delay, queue))) => (*delay, queue.pop_front()),
                None => (Duration::ZERO, None),
            }
        };
        tokio::time::sleep(delay).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        response.unwrap_or_else(|| Err(TransportError::Connect(format!("no route for {}", request.path))))
    }
}

/// Memory store that counts `remove` calls.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryTokenStore,
    removals: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn removals(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.removals)
    }
}

impl TokenStore for CountingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.removals.fetch_add(1, Ordering::SeqCst);
        self.inner.remove(key)
    }
}

pub fn json(status: u16, body: &str) -> Scripted {
    Ok(HttpResponse {
        status,
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: body.to_string(),
    })
}

pub fn status(status: u16) -> Scripted {
    Ok(HttpResponse {
        status,
        headers: Vec::new(),
        body: String::new(),
    })
}
