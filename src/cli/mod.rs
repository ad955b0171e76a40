//! CLI module for Graphex.
//!
//! Subcommands:
//! - `explore`: Run an exploration session against the configured service
//! - `normalize`: Normalize a raw response file into node/link records

mod explore;
mod normalize;

use clap::{Parser, Subcommand};

pub use explore::ExploreCommand;
pub use normalize::NormalizeCommand;

/// Graphex - Interactive Graph Exploration
#[derive(Parser)]
#[command(name = "graphex")]
#[command(about = "Interactive graph exploration over a remote graph-query service")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Explore a graph: seed it with a query, optionally expand a node
    Explore(ExploreCommand),

    /// Normalize a raw response JSON file and print the records
    Normalize(NormalizeCommand),
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match self.command {
            Command::Explore(cmd) => cmd.run().await,
            Command::Normalize(cmd) => cmd.run(),
        }
    }
}
