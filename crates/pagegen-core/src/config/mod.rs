//! Local configuration sources and client settings
//!
//! - `FileConfigProvider`: YAML file in the user's config directory
//! - `MemoryConfigProvider`: In-memory for tests and embedding
//! - `ClientSettings`: storage endpoint, sampling temperature, remote key

mod traits;
mod memory;
mod file;
mod settings;

pub use traits::{LocalConfigSource, ConfigError, ConfigResult};
pub use memory::MemoryConfigProvider;
pub use file::FileConfigProvider;
pub use settings::{ClientSettings, DEFAULT_REMOTE_CONFIG_KEY, DEFAULT_STORAGE_URL, DEFAULT_TEMPERATURE};
