//! Timesheet tally CLI library.
//!
//! This crate provides the CLI interface for the timesheet tally.

mod alias;
mod cli;
pub mod commands;
mod config;
mod format;
mod input;

pub use cli::{ActivityArgs, Cli, Commands, FlowArgs, InputArgs, ReportArgs, TagsArgs};
pub use config::Config;
