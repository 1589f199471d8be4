//! Native Bridge - device bridge host
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::Parser;
use native_bridge::app::CONFIG_FILENAME;
use native_bridge::core::prelude::*;

/// Native Bridge - serve the device bridge channel over stdin/stdout
#[derive(Parser, Debug)]
#[command(name = "nbridge")]
#[command(about = "Serve the device bridge channel over stdin/stdout", long_about = None)]
struct Args {
    /// Path to the config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // An explicit config path must exist; the default one is optional
    let config_path = match args.config {
        Some(path) if !path.exists() => return Err(Error::ConfigNotFound { path }),
        Some(path) => path,
        None => PathBuf::from(CONFIG_FILENAME),
    };

    native_bridge::run(&config_path).await
}
