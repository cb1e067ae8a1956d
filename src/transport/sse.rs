//! SSE client transport
//!
//! Implements the MCP HTTP+SSE binding from the client side: a long-lived
//! `GET` with `Accept: text/event-stream` carries the server→client stream;
//! the server advertises a POST endpoint for the reverse direction via a
//! distinguished `event: endpoint` frame. No teacher counterpart exists for
//! this — the teacher's SSE code is server-side (Axum) — so this is built
//! directly from the wire-level description using `reqwest` the way any
//! HTTP client would consume an event stream.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::Client;
use tokio::sync::{mpsc, watch, RwLock};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};
use url::Url;

use crate::transport::{MessageStream, Transport, TransportError, TransportState};

/// Configuration for an [`SseTransport`].
#[derive(Debug, Clone)]
pub struct SseConfig {
    /// URL of the long-lived SSE `GET` endpoint.
    pub url: Url,
    /// Deadline for each outbound `POST`.
    pub send_timeout: Duration,
    /// Maximum size of a single outbound or inbound frame.
    pub max_message_size: usize,
    /// Bearer token or cookie header passed through to the server, if any.
    /// This crate does not implement its own auth — it forwards a header
    /// value the caller already obtained.
    pub authorization_header: Option<String>,
}

impl SseConfig {
    /// Build a configuration pointed at `url` with default timeouts.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            send_timeout: Duration::from_secs(30),
            max_message_size: 10 * 1024 * 1024,
            authorization_header: None,
        }
    }
}

/// Incremental line-delimited SSE parser, tracking the current `event:` name
/// across calls since network chunks don't align with line boundaries.
#[derive(Debug, Default)]
struct SseLineParser {
    carry: String,
    current_event: Option<String>,
}

enum SseFrame {
    Endpoint(String),
    Data(String),
}

impl SseLineParser {
    fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.carry.push_str(&String::from_utf8_lossy(chunk));
        let mut frames = Vec::new();

        while let Some(pos) = self.carry.find('\n') {
            let line = self.carry[..pos].trim_end_matches('\r').to_string();
            self.carry.drain(..=pos);

            if line.is_empty() {
                self.current_event = None;
                continue;
            }
            if let Some(rest) = line.strip_prefix("event:") {
                self.current_event = Some(rest.trim().to_string());
                continue;
            }
            if let Some(rest) = line.strip_prefix("data:") {
                let payload = rest.strip_prefix(' ').unwrap_or(rest).to_string();
                match self.current_event.as_deref() {
                    Some("endpoint") => frames.push(SseFrame::Endpoint(payload)),
                    _ => frames.push(SseFrame::Data(payload)),
                }
            }
        }

        frames
    }
}

fn origins_match(base: &Url, candidate: &Url) -> bool {
    base.scheme() == candidate.scheme()
        && base.host_str() == candidate.host_str()
        && base.port_or_known_default() == candidate.port_or_known_default()
}

/// An HTTP client of someone else's SSE-binding MCP server.
pub struct SseTransport {
    config: SseConfig,
    client: Client,
    post_endpoint: Arc<RwLock<Option<Url>>>,
    inbound_rx: Option<mpsc::Receiver<Result<Bytes, TransportError>>>,
    state_tx: watch::Sender<TransportState>,
    state_rx: watch::Receiver<TransportState>,
}

impl SseTransport {
    /// Build a transport for the given configuration, using a freshly
    /// constructed `reqwest::Client`.
    pub fn new(config: SseConfig) -> Self {
        let (state_tx, state_rx) = watch::channel(TransportState::Idle);
        Self {
            config,
            client: Client::new(),
            post_endpoint: Arc::new(RwLock::new(None)),
            inbound_rx: None,
            state_tx,
            state_rx,
        }
    }

    fn set_state(&self, state: TransportState) {
        let _ = self.state_tx.send(state);
    }

    fn request_builder(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.authorization_header {
            Some(value) => builder.header(reqwest::header::AUTHORIZATION, value),
            None => builder,
        }
    }
}

#[async_trait]
impl Transport for SseTransport {
    async fn start(&mut self) -> Result<(), TransportError> {
        if *self.state_rx.borrow() == TransportState::Connected {
            return Ok(());
        }
        self.set_state(TransportState::Connecting);

        let request = self.request_builder(
            self.client
                .get(self.config.url.clone())
                .header(reqwest::header::ACCEPT, "text/event-stream"),
        );

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                self.set_state(TransportState::Disconnected);
                return Err(TransportError::other(format!("SSE GET failed: {err}")));
            }
        };

        if !response.status().is_success() {
            self.set_state(TransportState::Disconnected);
            return Err(TransportError::invalid_state(format!(
                "SSE GET returned status {}",
                response.status()
            )));
        }
        let content_type_ok = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("text/event-stream"));
        if !content_type_ok {
            self.set_state(TransportState::Disconnected);
            return Err(TransportError::invalid_state(
                "SSE response missing text/event-stream content type",
            ));
        }

        *self.post_endpoint.write().await = None;

        let (inbound_tx, inbound_rx) = mpsc::channel(64);
        let state_tx = self.state_tx.clone();
        let base_url = self.config.url.clone();
        let max_message_size = self.config.max_message_size;
        let post_endpoint = self.post_endpoint.clone();

        tokio::spawn(async move {
            let mut body = response.bytes_stream();
            let mut parser = SseLineParser::default();

            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(err) => {
                        warn!("SSE stream error: {err}");
                        let _ = inbound_tx.send(Err(TransportError::other(err.to_string()))).await;
                        break;
                    }
                };

                for frame in parser.push(&chunk) {
                    match frame {
                        SseFrame::Endpoint(raw) => match base_url.join(&raw) {
                            Ok(resolved) => {
                                let absolute = raw.starts_with("http://") || raw.starts_with("https://");
                                if absolute && !origins_match(&base_url, &resolved) {
                                    let _ = inbound_tx
                                        .send(Err(TransportError::invalid_state("origin mismatch")))
                                        .await;
                                    continue;
                                }
                                *post_endpoint.write().await = Some(resolved);
                            }
                            Err(err) => warn!("invalid endpoint URL from server: {err}"),
                        },
                        SseFrame::Data(payload) => {
                            if payload.len() > max_message_size {
                                let _ = inbound_tx
                                    .send(Err(TransportError::message_too_large(payload.len(), max_message_size)))
                                    .await;
                                continue;
                            }
                            if inbound_tx.send(Ok(Bytes::from(payload.into_bytes()))).await.is_err() {
                                return;
                            }
                        }
                    }
                }
            }

            debug!("SSE transport: downchannel closed");
            let _ = state_tx.send(TransportState::Disconnected);
        });

        self.inbound_rx = Some(inbound_rx);
        self.set_state(TransportState::Connected);
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), TransportError> {
        if *self.state_rx.borrow() == TransportState::Idle || *self.state_rx.borrow() == TransportState::Stopped {
            return Ok(());
        }
        self.inbound_rx = None;
        *self.post_endpoint.write().await = None;
        self.set_state(TransportState::Stopped);
        Ok(())
    }

    async fn send(&mut self, message: Bytes, timeout: Option<Duration>) -> Result<(), TransportError> {
        if *self.state_rx.borrow() != TransportState::Connected {
            return Err(TransportError::invalid_state("not connected"));
        }
        if message.len() > self.config.max_message_size {
            return Err(TransportError::message_too_large(message.len(), self.config.max_message_size));
        }

        let endpoint = self
            .post_endpoint
            .read()
            .await
            .clone()
            .ok_or_else(|| TransportError::invalid_state("server endpoint not known yet"))?;

        let request = self.request_builder(
            self.client
                .post(endpoint.clone())
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(message),
        );

        let deadline = timeout.unwrap_or(self.config.send_timeout);
        let response = tokio::time::timeout(deadline, request.send())
            .await
            .map_err(|_| TransportError::timeout(deadline.as_millis() as u64))?
            .map_err(|err| TransportError::other(format!("SSE POST failed: {err}")))?;

        if !response.status().is_success() {
            return Err(TransportError::invalid_state(format!("POST failed to {endpoint}")));
        }
        Ok(())
    }

    fn messages(&mut self) -> MessageStream {
        match self.inbound_rx.take() {
            Some(rx) => Box::pin(ReceiverStream::new(rx)),
            None => Box::pin(tokio_stream::empty()),
        }
    }

    fn state(&self) -> TransportState {
        *self.state_rx.borrow()
    }

    fn state_changes(&self) -> watch::Receiver<TransportState> {
        self.state_rx.clone()
    }

    fn transport_type(&self) -> &'static str {
        "sse"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn parser_tracks_event_name_across_chunks() {
        let mut parser = SseLineParser::default();
        let mut frames = parser.push(b"event: endpoint\ndata: /messages?sessi");
        assert!(frames.is_empty());
        frames = parser.push(b"on=abc\n\n");
        assert_eq!(frames.len(), 1);
        assert!(matches!(&frames[0], SseFrame::Endpoint(path) if path == "/messages?session=abc"));
    }

    #[test]
    fn parser_defaults_untagged_data_to_message() {
        let mut parser = SseLineParser::default();
        let frames = parser.push(b"data: {\"jsonrpc\":\"2.0\"}\n\n");
        assert_eq!(frames.len(), 1);
        assert!(matches!(&frames[0], SseFrame::Data(_)));
    }

    #[test]
    fn origins_match_ignores_path() {
        assert!(origins_match(&url("http://localhost:8080/sse"), &url("http://localhost:8080/messages")));
        assert!(!origins_match(&url("http://localhost:8080/sse"), &url("http://evil.example:8080/messages")));
    }

    #[tokio::test]
    async fn send_before_endpoint_known_is_invalid_state() {
        let mut transport = SseTransport::new(SseConfig::new(url("http://127.0.0.1:1/sse")));
        transport.set_state(TransportState::Connected);
        let result = transport.send(Bytes::from_static(b"{}"), None).await;
        assert!(matches!(result, Err(TransportError::InvalidState(_))));
    }

    #[tokio::test]
    async fn send_before_start_is_invalid_state() {
        let mut transport = SseTransport::new(SseConfig::new(url("http://127.0.0.1:1/sse")));
        let result = transport.send(Bytes::from_static(b"{}"), None).await;
        assert!(matches!(result, Err(TransportError::InvalidState(_))));
    }
}
