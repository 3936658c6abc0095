//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, environment overrides)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is loaded once at startup and never mutated afterwards
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{
    AppConfig, AuthConfig, CatalogConfig, ChainConfig, ChainsConfig, DatasetConfig, Environment,
    LedgerConfig, ListenerConfig, LogFormat, ObservabilityConfig, ProviderConfig,
    SecurityConfig, Settlement, TimeoutConfig, UserConfig, WalletMap,
};
