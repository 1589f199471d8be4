//! Native Bridge Library
//!
//! Request/response and push-event bridge between native device
//! capabilities and an embedded UI layer. The `nbridge` binary serves the
//! bridge over stdin/stdout against a simulated device.

pub mod host;

pub use nbridge_app as app;
pub use nbridge_channel as channel;
pub use nbridge_core as core;

use std::path::Path;

use nbridge_core::prelude::*;

pub use host::runner::run_host;

/// Install error reporting and logging, then serve in host mode
pub async fn run(config_path: &Path) -> Result<()> {
    color_eyre::install().map_err(|e| Error::platform(e.to_string()))?;

    nbridge_core::logging::init()?;

    info!("Config: {}", config_path.display());
    let result = run_host(config_path).await;

    info!("Native bridge exiting");
    result
}
