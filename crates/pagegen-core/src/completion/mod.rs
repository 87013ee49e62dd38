//! Streaming chat completions
//!
//! [`StreamingCompletionClient::send`] opens a [`Session`]: an ordered stream
//! of [`StreamEvent`](crate::types::StreamEvent)s ending in exactly one
//! terminal event. Sessions can be consumed as a `futures::Stream` or pushed
//! into a [`StreamHandler`] with [`Session::drive`].

mod client;
mod error;
mod frame;
mod handler;
mod probe;
mod session;

pub use client::StreamingCompletionClient;
pub use error::{CompletionError, CompletionResult};
pub use frame::{parse_frame, ChunkFrame, Frame, DONE_SENTINEL};
pub use handler::{CollectingHandler, StreamHandler};
pub use probe::ConnectionTestResult;
pub use session::{Session, SessionHandle, SessionState};
