//! # nbridge-core - Core Domain Types
//!
//! Foundation crate for the native bridge. Provides domain types, error
//! handling, event definitions and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, thiserror, tracing, url).
//!
//! ## Public API
//!
//! ### Events (`events`)
//! - [`Event`] - Normalized SMS or package-change event
//! - [`SmsEvent`], [`PackageEvent`] - Event payloads
//! - [`RecordShape`] - Shape of records returned for the event log
//!
//! ### Listener Types (`types`)
//! - [`ListenerKind`] - SMS or package-change observer
//! - [`ListenerState`] - Stopped, Starting or Active
//!
//! ### Telemetry (`snapshot`)
//! - [`DeviceSnapshot`] - Always-complete device info mapping
//!
//! ### Permissions (`permission`)
//! - [`Permission`] - Runtime permissions, serialized by manifest name
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use nbridge_core::prelude::*;
//! ```

pub mod error;
pub mod events;
pub mod logging;
pub mod permission;
pub mod snapshot;
pub mod types;

/// Prelude for common imports used throughout all bridge crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use error::{Error, Result, ResultExt};
pub use events::{
    Event, PackageAction, PackageEvent, RecordShape, SmsEvent, ON_LISTENERS_CHANGED,
    ON_MESSAGE_RECEIVED, ON_PACKAGE_CHANGED,
};
pub use permission::{Permission, LISTENER_PERMISSIONS};
pub use snapshot::{DeviceSnapshot, NO_SIM_CARD, UNKNOWN, UNKNOWN_BATTERY};
pub use types::{ListenerKind, ListenerState, ReceiverHandle};
