//! Effective configuration resolution
//!
//! A complete local configuration always wins; otherwise the published,
//! encrypted fallback is fetched once, decrypted and cached.

mod remote;
mod config_resolver;

pub use remote::RemoteConfigSource;
pub use config_resolver::{Availability, CachedRemoteConfig, ConfigResolver};
