//! Blocking HTTP transport using reqwest.
//!
//! Queries are `GET {base}?q=..` requests whose bodies are read in
//! `chunk_size` blocks as the caller pulls; nothing is buffered ahead.

use crate::config::ClientConfig;
use crate::core::{ID_FIELD, Query};
use crate::error::{Result, TransportError};
use crate::io::ChunkResult;
use crate::transport::Transport;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::Value;
use std::io::Read;
use uuid::Uuid;

/// Tracing target for HTTP transport operations.
pub const TRACING_TARGET: &str = "rengu_store::transport::http";

/// Transport talking to a Rengu store's HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    config: ClientConfig,
}

impl HttpTransport {
    /// Creates a transport from a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        tracing::debug!(
            target: TRACING_TARGET,
            url = %config.base_url,
            connect_timeout_ms = config.effective_connect_timeout().as_millis(),
            "creating HTTP transport"
        );

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .connect_timeout(config.effective_connect_timeout())
            .timeout(config.timeout)
            .user_agent(config.effective_user_agent())
            .build()
            .map_err(|e| request_error(config.endpoint(), &e))?;

        Ok(Self { http, config })
    }

    /// Gets the transport configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn object_url(&self, id: Uuid) -> String {
        format!("{}/{id}", self.config.endpoint())
    }

    /// Maps a non-success status to [`TransportError::Status`].
    fn check_status(url: &str, response: Response) -> std::result::Result<Response, TransportError> {
        let status = response.status();
        tracing::debug!(target: TRACING_TARGET, url, status = status.as_u16(), "response received");
        if status.is_success() {
            Ok(response)
        } else {
            Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            })
        }
    }
}

fn request_error(url: &str, err: &reqwest::Error) -> TransportError {
    let reason = if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        "connection failed".to_string()
    } else {
        err.to_string()
    };
    TransportError::Request {
        url: url.to_string(),
        reason,
    }
}

impl Transport for HttpTransport {
    type Chunks = HttpChunks;

    fn query(&self, query: &Query) -> std::result::Result<Self::Chunks, TransportError> {
        let url = self.config.endpoint();
        tracing::debug!(target: TRACING_TARGET, url, query = %query, "sending query");

        let response = self
            .http
            .get(url)
            .query(&query.params())
            .send()
            .map_err(|e| request_error(url, &e))?;
        let response = Self::check_status(url, response)?;

        Ok(HttpChunks::new(response, self.config.chunk_size))
    }

    fn save(&self, object: &Value) -> std::result::Result<Uuid, TransportError> {
        let url = self.config.endpoint();
        tracing::debug!(target: TRACING_TARGET, url, "saving object");

        let response = self
            .http
            .post(url)
            .json(object)
            .send()
            .map_err(|e| request_error(url, &e))?;
        let response = Self::check_status(url, response)?;

        let body: Value = response
            .json()
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        let raw = body
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| TransportError::Decode("response has no ID field".to_string()))?;
        Uuid::try_parse(raw).map_err(|e| TransportError::Decode(format!("invalid ID {raw:?}: {e}")))
    }

    fn delete(&self, id: Uuid) -> std::result::Result<bool, TransportError> {
        let url = self.object_url(id);
        tracing::debug!(target: TRACING_TARGET, url = %url, "deleting object");

        let response = self
            .http
            .delete(&url)
            .send()
            .map_err(|e| request_error(&url, &e))?;
        Ok(response.status().is_success())
    }

    fn location(&self) -> String {
        self.config.endpoint().to_string()
    }
}

/// Streaming response body, read `chunk_size` bytes at a time.
///
/// Dropping it releases the connection.
#[derive(Debug)]
pub struct HttpChunks {
    response: Response,
    chunk_size: usize,
    done: bool,
}

impl HttpChunks {
    fn new(response: Response, chunk_size: usize) -> Self {
        Self {
            response,
            chunk_size: chunk_size.max(1),
            done: false,
        }
    }
}

impl Iterator for HttpChunks {
    type Item = ChunkResult;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut chunk = vec![0u8; self.chunk_size];
        loop {
            match self.response.read(&mut chunk) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(n) => {
                    chunk.truncate(n);
                    return Some(Ok(chunk));
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(TransportError::Body(e.to_string())));
                }
            }
        }
    }
}
