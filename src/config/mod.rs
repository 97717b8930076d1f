//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → HealthConfig (validated, immutable)
//!     → converted into HealthOptions / PoolCheckConfig / ServerConfig
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - No process-wide defaults: components receive their config at construction

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    GroupConfig, HealthConfig, HeartbeatConfig, LogFormat, ObservabilityConfig, PoolConfig,
    ProbeConfig, ProbeKind, RetryConfig, ServerConfig,
};
pub use validation::{validate_config, ValidationError};
