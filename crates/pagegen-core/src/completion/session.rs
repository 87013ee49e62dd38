//! A single streaming completion session
//!
//! The network side runs in its own task and feeds an ordered channel; the
//! `Session` value is the consumer end. Terminal transitions (`Completed`,
//! `Failed`) are applied when the consumer receives the terminal event, so
//! `cancel()` succeeds for as long as the caller has not yet observed an end
//! of the session.

use std::cell::Cell;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::{Stream, StreamExt};
use parking_lot::ReentrantMutex;
use tokio::sync::mpsc;

use super::error::CompletionError;
use super::handler::StreamHandler;
use crate::logging::SharedLogger;
use crate::types::{CancellationToken, StreamEvent};

/// Lifecycle of a session
///
/// `Idle -> Connecting -> Streaming -> {Completed | Cancelled | Failed}`;
/// no transition leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Streaming,
    Completed,
    Cancelled,
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Cancelled | SessionState::Failed)
    }

    fn can_advance_to(self, next: SessionState) -> bool {
        match (self, next) {
            (from, _) if from.is_terminal() => false,
            (_, to) if to.is_terminal() => true,
            (SessionState::Idle, SessionState::Connecting) => true,
            (SessionState::Connecting, SessionState::Streaming) => true,
            _ => false,
        }
    }
}

/// State shared between the consumer, its handles and the network task
pub(crate) struct SessionShared {
    id: String,
    // Reentrant so a handler callback may call cancel() on its own session.
    state: ReentrantMutex<Cell<SessionState>>,
    cancel: CancellationToken,
    logger: SharedLogger,
}

impl SessionShared {
    pub(crate) fn new(id: String, logger: SharedLogger) -> Self {
        Self {
            id,
            state: ReentrantMutex::new(Cell::new(SessionState::Idle)),
            cancel: CancellationToken::new(),
            logger,
        }
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn state(&self) -> SessionState {
        self.state.lock().get()
    }

    /// Move forward to a non-terminal state; false if the move is not allowed
    pub(crate) fn advance(&self, next: SessionState) -> bool {
        let guard = self.state.lock();
        let current = guard.get();
        if !current.can_advance_to(next) {
            return false;
        }
        guard.set(next);
        self.logger
            .debug(&format!("[Session {}] {:?} -> {:?}", self.id, current, next));
        true
    }

    fn cancel(&self) -> bool {
        {
            let guard = self.state.lock();
            if guard.get().is_terminal() {
                return false;
            }
            guard.set(SessionState::Cancelled);
        }
        self.cancel.cancel();
        self.logger.info(&format!("[Session {}] cancelled", self.id));
        true
    }

    /// Apply the transition for a terminal event about to be delivered
    ///
    /// A cancellation that got in first wins; the event is replaced.
    fn settle(&self, event: StreamEvent) -> StreamEvent {
        let target = match &event {
            StreamEvent::Done => SessionState::Completed,
            StreamEvent::Failed(_) => SessionState::Failed,
            _ => SessionState::Cancelled,
        };

        let guard = self.state.lock();
        let current = guard.get();
        if current == SessionState::Cancelled {
            return StreamEvent::Cancelled;
        }
        if current.can_advance_to(target) {
            guard.set(target);
            self.logger
                .debug(&format!("[Session {}] {:?} -> {:?}", self.id, current, target));
        }
        event
    }

    /// Run a delta callback unless the session has been cancelled
    ///
    /// The state lock is held for the duration of the callback, so a
    /// `cancel()` from another thread either completes before the check or
    /// waits until the callback returns.
    fn deliver(&self, callback: impl FnOnce()) -> bool {
        let guard = self.state.lock();
        if guard.get() == SessionState::Cancelled {
            return false;
        }
        callback();
        true
    }
}

/// Cloneable handle for observing or cancelling a session from elsewhere
#[derive(Clone)]
pub struct SessionHandle {
    shared: Arc<SessionShared>,
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        self.shared.id()
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Cancel the session
    ///
    /// Returns `false` when the caller has already observed a terminal event.
    /// After a successful call no further delta or error reaches the consumer;
    /// its next event is `StreamEvent::Cancelled`.
    pub fn cancel(&self) -> bool {
        self.shared.cancel()
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id())
            .field("state", &self.state())
            .finish()
    }
}

/// Ordered, finite, non-restartable stream of [`StreamEvent`]s
///
/// Exactly one terminal event (`Done`, `Failed` or `Cancelled`) is yielded,
/// after which the stream ends. Dropping the session cancels it and closes
/// the underlying connection.
pub struct Session {
    shared: Arc<SessionShared>,
    events: mpsc::Receiver<StreamEvent>,
    finished: bool,
}

impl Session {
    pub(crate) fn new(shared: Arc<SessionShared>, events: mpsc::Receiver<StreamEvent>) -> Self {
        Self {
            shared,
            events,
            finished: false,
        }
    }

    pub fn id(&self) -> &str {
        self.shared.id()
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// See [`SessionHandle::cancel`]
    pub fn cancel(&self) -> bool {
        self.shared.cancel()
    }

    /// Cancel the session if it is still running after `deadline`
    ///
    /// The timer ends as soon as the session finishes or is dropped.
    pub fn cancel_after(&self, deadline: Duration) {
        let handle = self.handle();
        let token = self.shared.cancel_token().clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(deadline) => {
                    if handle.cancel() {
                        handle
                            .shared
                            .logger
                            .info(&format!("[Session {}] deadline of {:?} reached", handle.id(), deadline));
                    }
                }
            }
        });
    }

    /// Consume the session, dispatching every event to `handler`
    ///
    /// Returns the final state.
    pub async fn drive<H: StreamHandler + ?Sized>(mut self, handler: &mut H) -> SessionState {
        while let Some(event) = self.next().await {
            match event {
                StreamEvent::Content(text) => {
                    self.shared.deliver(|| handler.on_content(&text));
                }
                StreamEvent::Reasoning(text) => {
                    self.shared.deliver(|| handler.on_reasoning(&text));
                }
                StreamEvent::Done => handler.on_complete(),
                StreamEvent::Failed(error) => handler.on_error(&error),
                StreamEvent::Cancelled => handler.on_cancelled(),
            }
        }
        self.state()
    }

    fn finish(&mut self, event: StreamEvent) -> StreamEvent {
        self.finished = true;
        self.events.close();
        // Stops the network task if it is still running.
        self.shared.cancel_token().cancel();
        event
    }
}

impl Stream for Session {
    type Item = StreamEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<StreamEvent>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }
        if this.shared.state() == SessionState::Cancelled {
            return Poll::Ready(Some(this.finish(StreamEvent::Cancelled)));
        }

        match this.events.poll_recv(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(event)) if event.is_terminal() => {
                let settled = this.shared.settle(event);
                Poll::Ready(Some(this.finish(settled)))
            }
            Poll::Ready(Some(event)) => {
                if this.shared.state() == SessionState::Cancelled {
                    return Poll::Ready(Some(this.finish(StreamEvent::Cancelled)));
                }
                Poll::Ready(Some(event))
            }
            Poll::Ready(None) => {
                // The task always sends a terminal event unless it was cancelled.
                let settled = this.shared.settle(StreamEvent::Failed(CompletionError::transport(
                    "session task ended without a terminal event",
                )));
                Poll::Ready(Some(this.finish(settled)))
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.finished {
            self.shared.cancel();
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id())
            .field("state", &self.state())
            .field("finished", &self.finished)
            .finish()
    }
}
