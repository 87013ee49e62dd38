//! Secret storage abstractions and implementations
//!
//! The remote configuration blob is encrypted with a deployment-time key;
//! the resolver looks that key up through a `SecretStore` so hosts can
//! supply it from the environment, memory, or their own store.

mod traits;
mod env_store;
mod memory_store;
mod chain_store;

pub use traits::{SecretStore, SecretStoreError, SecretStoreResult};
pub use env_store::EnvSecretStore;
pub use memory_store::MemorySecretStore;
pub use chain_store::ChainSecretStore;

/// Logical name of the secret that decrypts the remote configuration blob
pub const CONFIG_KEY_SECRET: &str = "config_key";
