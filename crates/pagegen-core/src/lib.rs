//! Pagegen Core
//!
//! Client-side machinery for generating pages with an OpenAI-compatible model
//! and publishing them to a blob store. Runtime agnostic apart from requiring
//! a tokio runtime for streaming sessions.
//!
//! ## Pieces
//!
//! - [`ConfigResolver`]: picks the endpoint, credential and model to use. A
//!   complete local configuration wins; otherwise an encrypted fallback is
//!   fetched from the blob store once and cached.
//! - [`StreamingCompletionClient`]: opens cancellable streaming sessions that
//!   separate content from reasoning deltas.
//! - [`BlobStoreClient`]: publishes generated pages under fresh keys and reads
//!   them back.
//!
//! ```rust,ignore
//! use pagegen_core::{ConfigResolver, StreamingCompletionClient, ChatMessage};
//!
//! let client = StreamingCompletionClient::new(resolver, logger);
//! let mut session = client.send(vec![ChatMessage::user("A page about otters")]);
//! let state = session.drive(&mut handler).await;
//!
//! let page = blobs.publish(&handler.content, Some("Otters")).await?;
//! println!("{}", page.url);
//! ```

pub mod types;
pub mod secrets;
pub mod logging;
pub mod config;
pub mod cipher;
pub mod blob;
pub mod resolver;
pub mod completion;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use types::{ChatMessage, MessageRole, EffectiveConfig, StreamEvent, CancellationToken};

pub use secrets::{
    SecretStore, SecretStoreError, SecretStoreResult,
    EnvSecretStore, MemorySecretStore, ChainSecretStore,
};

pub use logging::{Logger, SharedLogger, NoOpLogger, TracingLogger};

pub use config::{LocalConfigSource, FileConfigProvider, MemoryConfigProvider, ClientSettings};

pub use cipher::{encrypt_to_hex, decrypt_from_hex, CipherError};

pub use blob::{BlobStoreClient, BlobError, BlobResult, PublishedPage};

pub use resolver::{ConfigResolver, RemoteConfigSource, Availability};

pub use completion::{
    StreamingCompletionClient, Session, SessionHandle, SessionState,
    StreamHandler, CompletionError, ConnectionTestResult,
};
