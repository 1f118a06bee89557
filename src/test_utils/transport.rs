use crate::download::{FetchResponse, Transport};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// A [`Transport`] answering from a table of canned responses.
///
/// Unknown URLs answer `404 Not Found`. Clones share the table and the request log.
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<MockInner>,
}

#[derive(Default)]
struct MockInner {
    responses: Mutex<HashMap<String, FetchResponse>>,
    requests: Mutex<Vec<String>>,
    gate: Mutex<Option<watch::Receiver<bool>>>,
}

/// Holds every fetch of a [`MockTransport`] until opened.
pub struct Gate {
    open: watch::Sender<bool>,
}

impl Gate {
    pub fn open(&self) {
        self.open.send_replace(true);
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with `bytes`.
    pub fn respond(&self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) -> &Self {
        self.inner.responses.lock().unwrap().insert(url.into(), FetchResponse::ok(bytes));
        self
    }

    /// Answer `url` with a transport failure.
    pub fn fail(&self, url: impl Into<String>, status: impl Into<String>) -> &Self {
        self.inner.responses.lock().unwrap().insert(url.into(), FetchResponse::failed(status));
        self
    }

    /// Make subsequent fetches wait until the returned gate is opened.
    pub fn hold(&self) -> Gate {
        let (open, rx) = watch::channel(false);
        *self.inner.gate.lock().unwrap() = Some(rx);
        Gate {
            open,
        }
    }

    /// Every requested URL, in order.
    pub fn requests(&self) -> Vec<String> {
        self.inner.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.inner.requests.lock().unwrap().iter().filter(|u| u.as_str() == url).count()
    }
}

impl Transport for MockTransport {
    async fn fetch(&self, url: &str) -> FetchResponse {
        self.inner.requests.lock().unwrap().push(url.to_string());

        let gate = self.inner.gate.lock().unwrap().clone();
        if let Some(mut gate) = gate {
            let _ = gate.wait_for(|open| *open).await;
        }

        let response = self.inner.responses.lock().unwrap().get(url).cloned();
        response.unwrap_or_else(|| FetchResponse::failed("404 Not Found"))
    }
}
