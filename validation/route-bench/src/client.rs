//! HTTP transport and response classification.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{BenchResult, TransportError};

/// Error codes meaning "no solution for this input". The request was still
/// served and timed, so these are valid samples.
pub const BENIGN_CODES: [&str; 4] = ["NoSegment", "NoMatch", "NoRoute", "NoTrips"];

/// Status and fully-read body of one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// How a response counts towards the measurement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseClass {
    Success,
    /// Non-200 carrying one of [`BENIGN_CODES`].
    EmptyResult(String),
    /// Anything else; aborts the run.
    Fatal,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: Option<String>,
}

impl HttpResponse {
    pub fn classify(&self) -> ResponseClass {
        if self.status == 200 {
            return ResponseClass::Success;
        }
        let code = serde_json::from_str::<ErrorBody>(&self.body)
            .ok()
            .and_then(|b| b.code);
        match code {
            Some(code) if BENIGN_CODES.contains(&code.as_str()) => ResponseClass::EmptyResult(code),
            _ => ResponseClass::Fatal,
        }
    }
}

/// Issues one GET and returns once the whole body has been read.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

/// [`Transport`] backed by a keep-alive `reqwest` client.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Without a timeout a hung request blocks the run; with one, the
    /// timed-out request is a fatal measurement error.
    pub fn new(timeout: Option<Duration>) -> BenchResult<Self> {
        let mut builder = reqwest::Client::builder().pool_max_idle_per_host(1);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_ok_is_success() {
        assert_eq!(response(200, "{\"code\":\"Ok\"}").classify(), ResponseClass::Success);
        assert_eq!(response(200, "not json").classify(), ResponseClass::Success);
    }

    #[test]
    fn test_benign_codes() {
        for code in BENIGN_CODES {
            let body = format!("{{\"code\":\"{code}\",\"message\":\"nothing found\"}}");
            assert_eq!(
                response(400, &body).classify(),
                ResponseClass::EmptyResult(code.to_string())
            );
        }
    }

    #[test]
    fn test_other_failures_are_fatal() {
        assert_eq!(response(500, "{\"code\":\"InternalError\"}").classify(), ResponseClass::Fatal);
        assert_eq!(response(400, "{\"code\":\"InvalidQuery\"}").classify(), ResponseClass::Fatal);
        assert_eq!(response(502, "<html>Bad Gateway</html>").classify(), ResponseClass::Fatal);
        assert_eq!(response(400, "{\"message\":\"no code\"}").classify(), ResponseClass::Fatal);
    }
}
