//! Command-line interface.

mod commands;

use clap::{Parser, Subcommand};

/// Novelshelf - web-novel publishing backend
#[derive(Parser)]
#[command(name = "novelshelf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API (default)
    #[command(alias = "web")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Change an account's role
    SetRole {
        username: String,
        /// user, author or admin
        role: String,
    },

    /// Ban or reactivate an account
    SetStatus {
        username: String,
        /// active or banned
        status: String,
    },
}

pub use commands::*;
