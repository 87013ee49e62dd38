//! Client for the blob store service
//!
//! Publishing generates the key client-side and applies the advisory size
//! ceiling; the store itself accepts any size.

mod error;
mod client;
mod size;

pub use error::{BlobError, BlobResult};
pub use client::{BlobStoreClient, PublishedPage};
pub use size::{check_size, format_size, SizeCheck, MAX_CONTENT_SIZE};
