//! Application context providing the dependency injection root.
//!
//! The controller never reaches into process-wide instances: its gateway,
//! normalizer, and command set are wired here, once, from configuration.

use std::sync::Arc;

use crate::commands::CommandSet;
use crate::config::Config;
use crate::controller::GraphExplorer;
use crate::error::AppError;
use crate::gateway::{HttpGateway, QueryGateway};
use crate::normalize::{GremlinNormalizer, ResponseNormalizer};

/// Root application context holding the controller's collaborators.
#[derive(Clone)]
pub struct Context {
    pub gateway: Arc<dyn QueryGateway>,
    pub normalizer: Arc<dyn ResponseNormalizer>,
    pub commands: CommandSet,
    pub config: Arc<Config>,
}

impl Context {
    /// Wires the default collaborators from configuration: the HTTP
    /// gateway, the gremlin normalizer, and the standard command set.
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let gateway = Arc::new(HttpGateway::new(&config.gateway)?);
        Ok(Self {
            gateway,
            normalizer: Arc::new(GremlinNormalizer::new()),
            commands: CommandSet::standard(),
            config: Arc::new(config),
        })
    }

    /// Builds a controller over this context's collaborators.
    pub fn explorer(&self) -> GraphExplorer {
        GraphExplorer::new(
            self.gateway.clone(),
            self.normalizer.clone(),
            self.commands.clone(),
            self.config.layout.clone(),
        )
    }
}
