//! # clientgen CLI
//!
//! Binary entry point for the `clientgen` command-line tool. It parses the
//! arguments, runs the selected command and turns errors into a non-zero
//! exit status.
//!
//! The behavior lives in the `clientgen` library crate; the binary is a thin
//! wrapper around it.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
