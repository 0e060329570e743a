//! Config command implementation.
//!
//! Prints the effective configuration, or writes it to a file as a starting
//! point for editing.

use std::io::Write;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;

/// Arguments for the config command.
#[derive(Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Write the configuration here instead of printing it.
    pub write: Option<PathBuf>,
    /// Print as JSON instead of TOML.
    pub json: bool,
}

/// Print or save the effective configuration.
pub fn run_config<W: Write>(args: ConfigArgs, config: &Config, out: &mut W) -> Result<()> {
    if let Some(path) = args.write {
        config.save_to_path(&path)?;
        tracing::info!("wrote configuration to {}", path.display());
        return Ok(());
    }

    if args.json {
        serde_json::to_writer_pretty(&mut *out, config)?;
        writeln!(out)?;
    } else {
        out.write_all(config.to_toml()?.as_bytes())?;
    }
    Ok(())
}
