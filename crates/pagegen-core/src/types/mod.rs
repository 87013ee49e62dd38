//! Core types shared by the completion client, the resolver and the blob client

mod message;
mod config;
mod stream;
mod cancellation;

pub use message::{ChatMessage, MessageRole};
pub use config::EffectiveConfig;
pub use stream::StreamEvent;
pub use cancellation::CancellationToken;
