//! CLI module - command-line interface for Greenboard
//!
//! This module provides a structured CLI using clap for argument parsing.

pub mod commands;

use clap::{Parser, Subcommand};

/// Greenboard - sustainability board game backend
#[derive(Parser)]
#[command(name = "greenboard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server
    #[command(alias = "-d", alias = "--daemon")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Populate the database with the default task cards
    SeedTasks,

    /// Populate the database with the default chance cards
    SeedChances,

    /// Delete every task card
    WipeTasks,

    /// Delete every chance card
    WipeChances,

    /// Create a staff account for the admin API
    CreateStaff {
        username: String,
        /// Email address for password resets
        #[arg(long, default_value = "")]
        email: String,
        /// Password; prompted for on stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
}
