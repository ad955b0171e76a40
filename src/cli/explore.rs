//! Explore subcommand - run an exploration session headlessly.

use std::sync::Arc;

use clap::Parser;

use crate::commands::ExpandDirection;
use crate::config::Config;
use crate::context::Context;
use crate::surface::HeadlessSurface;

/// Seed the graph with a query and report the resulting state.
#[derive(Parser)]
pub struct ExploreCommand {
    /// Initial query to send to the graph-query service.
    pub query: String,

    /// Node id to expand after the initial merge settles.
    #[arg(long)]
    pub expand: Option<String>,

    /// Direction for --expand: outgoing or incoming.
    #[arg(long, default_value = "outgoing")]
    pub direction: String,

    /// Override the configured gateway endpoint.
    #[arg(long)]
    pub endpoint: Option<String>,
}

impl ExploreCommand {
    /// Run the explore command.
    pub async fn run(self) -> color_eyre::Result<()> {
        let mut config = Config::load()?;
        if let Some(endpoint) = self.endpoint {
            config.gateway.endpoint = endpoint;
        }

        let context = Context::from_config(config)?;
        let surface = Arc::new(HeadlessSurface::new());
        let mut explorer = context.explorer();
        explorer.initialize(surface.clone())?;

        explorer.submit_query(
            &self.query,
            Some(Box::new(|result| match result {
                Ok((_, report)) => tracing::info!(
                    added_nodes = report.added_nodes,
                    added_edges = report.added_edges,
                    dropped_edges = report.dropped_edges.len(),
                    "initial query merged"
                ),
                Err(error) => tracing::error!(%error, "initial query failed"),
            })),
        );
        explorer.run_until_settled().await;

        if let Some(node_id) = &self.expand {
            let direction = match self.direction.as_str() {
                "outgoing" => ExpandDirection::Outgoing,
                "incoming" => ExpandDirection::Incoming,
                other => {
                    return Err(color_eyre::eyre::eyre!(
                        "unknown direction: {other} (expected outgoing or incoming)"
                    ))
                }
            };
            explorer.expand(node_id, direction)?;
            explorer.run_until_settled().await;
        }

        let graph = explorer.graph();
        println!(
            "graph settled: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        let (x, y) = surface.viewport_center();
        println!("viewport center: ({x:.2}, {y:.2})");

        explorer.teardown();
        Ok(())
    }
}
