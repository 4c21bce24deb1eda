//! Scripted transport for driving the runner without a live service.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use route_bench::error::TransportError;
use route_bench::{HttpResponse, Transport};

type Responder = Box<dyn Fn(usize, &str) -> Result<HttpResponse, TransportError> + Send + Sync>;

/// Answers request `n` (0-based, warmup included) via a closure and records
/// every URL it was asked for.
pub struct ScriptedTransport {
    responder: Responder,
    delay: Option<Duration>,
    urls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(
        responder: impl Fn(usize, &str) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            delay: None,
            urls: Mutex::new(Vec::new()),
        }
    }

    /// Always 200 with an OSRM-style `Ok` body.
    pub fn ok() -> Self {
        Self::new(|_, _| Ok(response(200, r#"{"code":"Ok"}"#)))
    }

    /// Sleep before answering, to give the clock something to measure.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.urls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let n = {
            let mut urls = self.urls.lock().unwrap();
            urls.push(url.to_string());
            urls.len() - 1
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(n, url)
    }
}

pub fn response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        body: body.to_string(),
    }
}
