//! EMS API client for backend communication.
//!
//! This module provides the HTTP client for the EMS backend insights
//! endpoint, which streams generated text via Server-Sent Events (SSE).

use crate::sse::{SseEvent, SseParseError, SseParser};
use futures_util::stream::{self, Stream};
use futures_util::StreamExt;
use reqwest::Client;
use std::pin::Pin;

/// Default base URL, matching the backend's development address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// A pinned, boxed stream of SSE events from the insights endpoint.
pub type SseEventStream = Pin<Box<dyn Stream<Item = Result<SseEvent, ClientError>> + Send>>;

/// Error type for EMS client operations
#[derive(Debug)]
pub enum ClientError {
    /// HTTP request failed
    Http(reqwest::Error),
    /// SSE parsing failed
    SseParse(SseParseError),
    /// Server returned an error status
    ServerError { status: u16, message: String },
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Http(e) => write!(f, "HTTP error: {}", e),
            ClientError::SseParse(e) => write!(f, "SSE parse error: {}", e),
            ClientError::ServerError { status, message } => {
                write!(f, "Server error ({}): {}", status, message)
            }
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Http(e) => Some(e),
            ClientError::SseParse(e) => Some(e),
            ClientError::ServerError { .. } => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Http(e)
    }
}

impl From<SseParseError> for ClientError {
    fn from(e: SseParseError) -> Self {
        ClientError::SseParse(e)
    }
}

/// Client for the EMS backend insights API.
pub struct InsightsClient {
    /// Base URL for the EMS API
    pub base_url: String,
    /// Reusable HTTP client
    client: Client,
}

impl InsightsClient {
    /// Create a new InsightsClient with the default base URL.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Create a new InsightsClient with a custom base URL.
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            base_url,
            client: Client::new(),
        }
    }

    /// Build the insights stream URL for the given bearer token.
    ///
    /// The SSE transport cannot carry custom headers, so the token rides
    /// the query string instead of the Authorization header used by the
    /// rest of the API.
    pub fn insights_url(&self, token: &str) -> String {
        format!(
            "{}/api/ai/insights?token={}",
            self.base_url,
            urlencoding::encode(token)
        )
    }

    /// Open a streaming connection to `url` and return a stream of SSE events.
    ///
    /// Individual items may be parse errors while the connection itself stays
    /// healthy; callers decide whether a parse error is fatal.
    pub async fn stream(&self, url: &str) -> Result<SseEventStream, ClientError> {
        tracing::debug!(url, "opening insights stream");

        let response = self
            .client
            .get(url)
            .header("Accept", "text/event-stream")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::ServerError { status, message });
        }

        Ok(decode_sse_stream(response.bytes_stream()))
    }

    /// Check if the EMS API is healthy and reachable.
    pub async fn health_check(&self) -> Result<bool, ClientError> {
        let url = format!("{}/api/health", self.base_url);

        let response = self.client.get(&url).send().await?;

        Ok(response.status().is_success())
    }
}

impl Default for InsightsClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a raw response byte stream into typed SSE events.
///
/// Lines are split on `\n` at the byte level; chunk boundaries carry no
/// meaning, so a multi-byte UTF-8 character arriving split across two
/// chunks must wait in the buffer until its line completes.
fn decode_sse_stream<S>(bytes_stream: S) -> SseEventStream
where
    S: Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + Unpin + 'static,
{
    let event_stream = stream::unfold(
        (bytes_stream, SseParser::new(), Vec::<u8>::new()),
        |(mut bytes_stream, mut parser, mut buffer)| async move {
            loop {
                // First, try to process any complete lines in the buffer
                if let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                    let mut raw: Vec<u8> = buffer.drain(..=newline_pos).collect();
                    raw.pop();
                    if raw.last() == Some(&b'\r') {
                        raw.pop();
                    }
                    let line = String::from_utf8_lossy(&raw);

                    match parser.feed_line(&line) {
                        Ok(Some(event)) => {
                            return Some((Ok(event), (bytes_stream, parser, buffer)));
                        }
                        Ok(None) => {
                            // Continue processing buffer
                            continue;
                        }
                        Err(e) => {
                            return Some((
                                Err(ClientError::SseParse(e)),
                                (bytes_stream, parser, buffer),
                            ));
                        }
                    }
                }

                // Need more data from the stream
                match bytes_stream.next().await {
                    Some(Ok(chunk)) => {
                        buffer.extend_from_slice(&chunk);
                        // Loop back to process the buffer
                    }
                    Some(Err(e)) => {
                        return Some((Err(ClientError::Http(e)), (bytes_stream, parser, buffer)));
                    }
                    None => {
                        // Stream ended - process any remaining data in buffer
                        if !buffer.is_empty() {
                            let mut raw = std::mem::take(&mut buffer);
                            if raw.last() == Some(&b'\r') {
                                raw.pop();
                            }
                            let line = String::from_utf8_lossy(&raw).into_owned();
                            match parser.feed_line(&line) {
                                Ok(Some(event)) => {
                                    return Some((Ok(event), (bytes_stream, parser, buffer)));
                                }
                                Ok(None) => {}
                                Err(e) => {
                                    return Some((
                                        Err(ClientError::SseParse(e)),
                                        (bytes_stream, parser, buffer),
                                    ));
                                }
                            }
                        }
                        return None;
                    }
                }
            }
        },
    );

    Box::pin(event_stream)
}
