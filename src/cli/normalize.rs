//! Normalize subcommand - convert a raw response file to records.

use std::path::PathBuf;

use clap::Parser;

use crate::normalize::{GremlinNormalizer, ResponseNormalizer};

/// Normalize a raw response JSON file and print the node/link partition.
#[derive(Parser)]
pub struct NormalizeCommand {
    /// Path to a JSON file holding a raw query response.
    pub input: PathBuf,
}

impl NormalizeCommand {
    /// Run the normalize command.
    pub fn run(self) -> color_eyre::Result<()> {
        let content = std::fs::read_to_string(&self.input)?;
        let raw: serde_json::Value = serde_json::from_str(&content)?;

        let records = GremlinNormalizer::new().normalize(&raw)?;
        println!("{}", serde_json::to_string_pretty(&records)?);
        Ok(())
    }
}
