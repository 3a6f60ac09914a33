//! CLI module for the event registration API

pub mod serve;

use clap::{Parser, Subcommand};

/// Event registration API - teams, registrations and payment verification
#[derive(Parser)]
#[command(name = "event-registration-api")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,
}
