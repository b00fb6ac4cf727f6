//! Streaming session lifecycle and observable state.
//!
//! A [`StreamSession`] owns exactly one live insights connection at a time.
//! The connection task forwards tagged updates over an mpsc channel; the
//! owner applies them on its event loop, so state is only ever mutated
//! from one place.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::client::{ClientError, InsightsClient};
use crate::sse::SseEvent;

/// Diagnostic recorded when the transport itself fails.
pub const CONNECTION_ERROR: &str = "Connection error";

/// Diagnostic recorded when the server signals an error without a message.
pub const STREAM_ERROR: &str = "Stream error";

/// Lifecycle phase of a streaming session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    /// No connection; nothing requested yet or closed before completion.
    Idle,
    /// Connection requested, no event received yet.
    Connecting,
    /// At least one fragment received.
    Streaming,
    /// Terminal: completed normally.
    Done,
    /// Terminal: failed with a diagnostic.
    Errored,
}

/// A tagged update delivered from the connection task to the session owner.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamUpdate {
    /// One fragment of generated text, in arrival order.
    Fragment(String),
    /// The stream completed normally.
    Done,
    /// The stream failed; carries the diagnostic to surface.
    Failed(String),
}

/// Observable state of a streaming session.
///
/// `content` is append-only for the lifetime of a session; `done`
/// transitions false to true exactly once and resets only on a fresh open.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamState {
    /// Target URL of the current session. `None` means inactive.
    pub url: Option<String>,
    /// Accumulated text, fragments concatenated in arrival order.
    pub content: String,
    /// True once the stream reached a terminal state.
    pub done: bool,
    /// Terminal diagnostic, mutually exclusive with normal completion.
    pub error: Option<String>,
    /// Current lifecycle phase.
    pub phase: StreamPhase,
}

impl StreamState {
    /// State of a session that has never been opened.
    pub fn inactive() -> Self {
        Self {
            url: None,
            content: String::new(),
            done: false,
            error: None,
            phase: StreamPhase::Idle,
        }
    }

    fn fresh(url: String) -> Self {
        Self {
            url: Some(url),
            content: String::new(),
            done: false,
            error: None,
            phase: StreamPhase::Connecting,
        }
    }
}

impl Default for StreamState {
    fn default() -> Self {
        Self::inactive()
    }
}

/// Owns one live streaming connection and the state it produces.
pub struct StreamSession {
    client: Arc<InsightsClient>,
    state: StreamState,
    updates_rx: Option<mpsc::UnboundedReceiver<StreamUpdate>>,
    task: Option<JoinHandle<()>>,
}

impl StreamSession {
    /// Create a session with no connection.
    pub fn new(client: Arc<InsightsClient>) -> Self {
        Self {
            client,
            state: StreamState::inactive(),
            updates_rx: None,
            task: None,
        }
    }

    /// Current observable state.
    pub fn state(&self) -> &StreamState {
        &self.state
    }

    /// Whether a connection task is currently attached.
    pub fn is_open(&self) -> bool {
        self.updates_rx.is_some()
    }

    /// Open a new connection to `url`.
    ///
    /// Any prior connection is closed first, and state is reset to empty
    /// before any data is processed - a stale session's content, completion
    /// flag, and error never leak into the new one.
    pub fn open(&mut self, url: impl Into<String>) {
        self.close();

        let url = url.into();
        self.state = StreamState::fresh(url.clone());

        let (tx, rx) = mpsc::unbounded_channel();
        let client = Arc::clone(&self.client);
        let task = tokio::spawn(async move {
            Self::forward_stream(client, url, tx).await;
        });

        self.updates_rx = Some(rx);
        self.task = Some(task);
    }

    /// Connection task body: open the transport and forward tagged updates
    /// until a terminal event or the receiver goes away.
    async fn forward_stream(
        client: Arc<InsightsClient>,
        url: String,
        tx: mpsc::UnboundedSender<StreamUpdate>,
    ) {
        let mut stream = match client.stream(&url).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(error = %e, "insights connection failed");
                let _ = tx.send(StreamUpdate::Failed(CONNECTION_ERROR.to_string()));
                return;
            }
        };

        while let Some(item) = stream.next().await {
            match item {
                Ok(SseEvent::Fragment { text }) => {
                    if tx.send(StreamUpdate::Fragment(text)).is_err() {
                        // Owner went away; stop reading
                        return;
                    }
                }
                Ok(SseEvent::Done) => {
                    let _ = tx.send(StreamUpdate::Done);
                    return;
                }
                Ok(SseEvent::Error { message }) => {
                    let message = message.unwrap_or_else(|| STREAM_ERROR.to_string());
                    let _ = tx.send(StreamUpdate::Failed(message));
                    return;
                }
                Err(ClientError::SseParse(e)) => {
                    // Malformed payloads are dropped; the stream stays healthy
                    tracing::debug!(error = %e, "dropping malformed SSE payload");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "insights stream failed");
                    let _ = tx.send(StreamUpdate::Failed(CONNECTION_ERROR.to_string()));
                    return;
                }
            }
        }

        // Transport ended without a done or error event
        tracing::warn!("insights stream ended without terminal event");
        let _ = tx.send(StreamUpdate::Failed(CONNECTION_ERROR.to_string()));
    }

    /// Await the next update from the connection task.
    ///
    /// Intended for `tokio::select!` loops: while no connection is attached
    /// this pends instead of returning, so the arm stays quiet. Returns
    /// `None` once the task has finished and all updates were delivered.
    /// Cancel-safe.
    pub async fn next_update(&mut self) -> Option<StreamUpdate> {
        match &mut self.updates_rx {
            Some(rx) => {
                let update = rx.recv().await;
                if update.is_none() {
                    // Channel drained and sender gone; detach it
                    self.updates_rx = None;
                }
                update
            }
            None => std::future::pending().await,
        }
    }

    /// Apply one update to the observable state.
    ///
    /// Updates arriving after a terminal state are ignored.
    pub fn apply(&mut self, update: StreamUpdate) {
        if self.state.done {
            return;
        }

        match update {
            StreamUpdate::Fragment(text) => {
                self.state.content.push_str(&text);
                self.state.phase = StreamPhase::Streaming;
            }
            StreamUpdate::Done => {
                self.state.done = true;
                self.state.phase = StreamPhase::Done;
                self.release();
            }
            StreamUpdate::Failed(message) => {
                self.state.error = Some(message);
                self.state.done = true;
                self.state.phase = StreamPhase::Errored;
                self.release();
            }
        }
    }

    /// Apply every update already queued, without waiting.
    pub fn drain_pending(&mut self) {
        loop {
            let update = match &mut self.updates_rx {
                Some(rx) => rx.try_recv().ok(),
                None => None,
            };
            match update {
                Some(update) => self.apply(update),
                None => break,
            }
        }
    }

    /// Close the connection.
    ///
    /// Idempotent; safe before any event arrives and after natural
    /// termination. Closing pre-terminal returns the session to `Idle`
    /// with no target and no error recorded; terminal state is left
    /// untouched.
    pub fn close(&mut self) {
        self.release();
        if !self.state.done {
            self.state.url = None;
            self.state.phase = StreamPhase::Idle;
        }
    }

    /// Abort the connection task and drop the update channel. Fragments
    /// not yet delivered are discarded with the channel.
    fn release(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.updates_rx = None;
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        // The connection must not outlive its owner
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> StreamSession {
        StreamSession::new(Arc::new(InsightsClient::new()))
    }

    #[test]
    fn test_initial_state_inactive() {
        let session = session();
        let state = session.state();
        assert_eq!(state.url, None);
        assert_eq!(state.content, "");
        assert!(!state.done);
        assert_eq!(state.error, None);
        assert_eq!(state.phase, StreamPhase::Idle);
        assert!(!session.is_open());
    }

    #[test]
    fn test_fragments_concatenate_in_order() {
        let mut session = session();
        session.apply(StreamUpdate::Fragment("Hello".to_string()));
        session.apply(StreamUpdate::Fragment(" world".to_string()));

        assert_eq!(session.state().content, "Hello world");
        assert_eq!(session.state().phase, StreamPhase::Streaming);
        assert!(!session.state().done);
    }

    #[test]
    fn test_done_is_terminal() {
        let mut session = session();
        session.apply(StreamUpdate::Fragment("Hello world".to_string()));
        session.apply(StreamUpdate::Done);

        assert!(session.state().done);
        assert_eq!(session.state().error, None);
        assert_eq!(session.state().phase, StreamPhase::Done);

        // Fragments after a terminal state are ignored
        session.apply(StreamUpdate::Fragment("late".to_string()));
        assert_eq!(session.state().content, "Hello world");
    }

    #[test]
    fn test_done_with_no_fragments() {
        let mut session = session();
        session.apply(StreamUpdate::Done);

        assert_eq!(session.state().content, "");
        assert!(session.state().done);
    }

    #[test]
    fn test_error_is_terminal() {
        let mut session = session();
        session.apply(StreamUpdate::Failed("rate limited".to_string()));

        assert_eq!(session.state().error.as_deref(), Some("rate limited"));
        assert!(session.state().done);
        assert_eq!(session.state().content, "");
        assert_eq!(session.state().phase, StreamPhase::Errored);

        // Neither fragments nor a second terminal event change anything
        session.apply(StreamUpdate::Fragment("late".to_string()));
        session.apply(StreamUpdate::Done);
        assert_eq!(session.state().content, "");
        assert_eq!(session.state().error.as_deref(), Some("rate limited"));
        assert_eq!(session.state().phase, StreamPhase::Errored);
    }

    #[tokio::test]
    async fn test_open_resets_state() {
        let mut session = session();
        session.apply(StreamUpdate::Fragment("stale".to_string()));
        session.apply(StreamUpdate::Failed("old failure".to_string()));

        session.open("http://127.0.0.1:1/api/ai/insights?token=x");

        let state = session.state();
        assert_eq!(
            state.url.as_deref(),
            Some("http://127.0.0.1:1/api/ai/insights?token=x")
        );
        assert_eq!(state.content, "");
        assert!(!state.done);
        assert_eq!(state.error, None);
        assert_eq!(state.phase, StreamPhase::Connecting);
        assert!(session.is_open());
    }

    #[tokio::test]
    async fn test_close_before_any_event() {
        let mut session = session();
        session.open("http://127.0.0.1:1/api/ai/insights?token=x");
        session.close();

        let state = session.state();
        assert_eq!(state.url, None);
        assert_eq!(state.content, "");
        assert!(!state.done);
        assert_eq!(state.error, None);
        assert_eq!(state.phase, StreamPhase::Idle);
        assert!(!session.is_open());

        // No further state mutation occurs post-close
        session.drain_pending();
        assert_eq!(session.state().content, "");
        assert!(!session.state().done);
    }

    #[tokio::test]
    async fn test_close_mid_stream_clears_target_keeps_text() {
        let mut session = session();
        session.open("http://127.0.0.1:1/api/ai/insights?token=x");
        session.apply(StreamUpdate::Fragment("partial".to_string()));

        session.close();

        let state = session.state();
        assert_eq!(state.url, None);
        assert_eq!(state.content, "partial");
        assert!(!state.done);
        assert_eq!(state.error, None);
        assert_eq!(state.phase, StreamPhase::Idle);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mut session = session();
        session.open("http://127.0.0.1:1/api/ai/insights?token=x");
        session.close();
        session.close();
        assert_eq!(session.state().phase, StreamPhase::Idle);

        // Safe on a never-opened session too
        let mut never_opened = StreamSession::new(Arc::new(InsightsClient::new()));
        never_opened.close();
        assert_eq!(never_opened.state().phase, StreamPhase::Idle);
    }

    #[tokio::test]
    async fn test_close_after_terminal_keeps_state() {
        let mut session = session();
        session.apply(StreamUpdate::Fragment("all of it".to_string()));
        session.apply(StreamUpdate::Done);

        session.close();
        assert!(session.state().done);
        assert_eq!(session.state().content, "all of it");
        assert_eq!(session.state().phase, StreamPhase::Done);
    }

    #[tokio::test]
    async fn test_connection_failure_is_generic() {
        let mut session = session();
        // Port 1 refuses connections, so the task reports a transport failure
        session.open("http://127.0.0.1:1/api/ai/insights?token=x");

        let update = session.next_update().await.expect("failure update");
        session.apply(update);

        assert_eq!(session.state().error.as_deref(), Some(CONNECTION_ERROR));
        assert!(session.state().done);
        assert_eq!(session.state().phase, StreamPhase::Errored);
    }

    #[test]
    fn test_drain_pending_on_closed_session() {
        let mut session = session();
        session.drain_pending();
        assert_eq!(session.state().content, "");
    }
}
