//! Configuration file parsing for the native bridge
//!
//! Supports a single TOML file (`nbridge.toml` by default) with the
//! `[channel]`, `[listeners]`, `[event_log]` and `[telemetry]` sections.
//! Sections unknown to the engine (such as the host's `[simulator]`) are
//! ignored here.

pub mod settings;
pub mod types;

pub use settings::{load_settings, parse_settings, CONFIG_FILENAME};
pub use types::*;
