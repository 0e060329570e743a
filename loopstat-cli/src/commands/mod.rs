//! Command modules for the loopstat CLI.
//!
//! Each subcommand is implemented in its own file.

pub mod config;
pub mod demo;

pub use config::{run_config, ConfigArgs};
pub use demo::{run_demo, DemoArgs, DemoOutcome};
