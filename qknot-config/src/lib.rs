//! Configuration loading for qknot.
//!
//! Settings come from, in order of precedence:
//!
//! 1. per-field `QKNOT_*` environment overrides (optionally seeded from `.env`),
//! 2. a TOML or JSON file named by `QKNOT_CONFIG_PATH`, or inline JSON in
//!    `QKNOT_CONFIG_JSON`, or `qknot.toml` in the working directory,
//! 3. built-in defaults.
//!
//! The loader reports which source produced the file-level settings so the
//! command line can show where a value came from.

pub mod loader;
pub mod models;
pub mod sources;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions};
pub use models::{
    BackendConfig, ConfigSource, QknotConfig, SnapshotConfig,
    default_snapshot_path,
};
pub use validation::{ConfigGuardRailError, ConfigWarning};

pub use qknot_core::{PollConfig, UnknownStatusPolicy};
