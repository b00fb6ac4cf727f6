//! Binds a nullable target URL to a streaming session.
//!
//! The binding owns the session's lifetime relative to target changes and
//! owner teardown: changing the target closes the prior connection before
//! opening the new one, and dropping the binding closes whatever is open.

use std::sync::Arc;

use crate::client::InsightsClient;
use crate::session::{StreamSession, StreamState};

/// Owns a [`StreamSession`] keyed by an optional target URL.
///
/// `None` means no connection exists and the presentation layer shows a
/// pre-activation placeholder; connecting is only attempted once a caller
/// supplies a target, since generation is costly.
pub struct InsightsBinding {
    target: Option<String>,
    session: StreamSession,
}

impl InsightsBinding {
    /// Create a binding with no target.
    pub fn new(client: Arc<InsightsClient>) -> Self {
        Self {
            target: None,
            session: StreamSession::new(client),
        }
    }

    /// The current target URL, if any.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Observable state of the underlying session.
    pub fn state(&self) -> &StreamState {
        self.session.state()
    }

    /// The underlying session, for event-loop integration.
    pub fn session_mut(&mut self) -> &mut StreamSession {
        &mut self.session
    }

    /// Point the binding at a new target.
    ///
    /// A change always closes the prior connection before opening the new
    /// one - overlapping sessions are forbidden. Setting the same target
    /// again is a no-op, so a redraw loop can call this freely. `None`
    /// closes immediately without recording an error; text that already
    /// arrived stays on screen until the next open resets it, so a cancel
    /// never discards a partial result the user was reading.
    pub fn set_target(&mut self, target: Option<String>) {
        if self.target == target {
            return;
        }

        self.session.close();
        self.target = target;

        if let Some(url) = &self.target {
            self.session.open(url.clone());
        }
    }
}

impl Drop for InsightsBinding {
    fn drop(&mut self) {
        self.session.close();
    }
}
