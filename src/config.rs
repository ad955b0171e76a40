//! Configuration with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. User config: `~/.config/graphex/config.toml` (XDG) or platform config dir
//! 2. Project config: `.graphex.toml`
//! 3. Environment variables: `GRAPHEX_*`
//!
//! # Intended Usage
//!
//! ```toml
//! [gateway]
//! endpoint = "http://localhost:8182/gremlin"
//!
//! [gateway.headers]
//! x-api-key = "secret"
//!
//! [layout]
//! max_ticks = 500
//! tick_interval_ms = 16
//! stable_speed = 0.05
//! ```

use std::collections::HashMap;
use std::ops::Deref;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub layout: LayoutOptions,
}

/// Query gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Endpoint of the remote graph-query service (required).
    /// Example: `http://localhost:8182/gremlin`
    pub endpoint: String,
    /// Extra request headers sent with every query.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// Options governing one layout run on the rendering surface.
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutOptions {
    /// Upper bound on physics ticks before a run is forced to settle.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: usize,
    /// Delay between physics ticks, in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Peak node speed below which the layout counts as converged.
    #[serde(default = "default_stable_speed")]
    pub stable_speed: f32,
}

fn default_max_ticks() -> usize {
    500
}

fn default_tick_interval_ms() -> u64 {
    16
}

fn default_stable_speed() -> f32 {
    0.05
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            max_ticks: default_max_ticks(),
            tick_interval_ms: default_tick_interval_ms(),
            stable_speed: default_stable_speed(),
        }
    }
}

impl Config {
    /// Load config with layered resolution (user → project → env).
    pub fn load() -> Result<Self, ConfigError> {
        let user_config = Self::user_config_path();

        Figment::new()
            // Layer 1: User config (lowest priority)
            .merge(Toml::file(user_config))
            // Layer 2: Project config
            .merge(Toml::file(".graphex.toml"))
            // Layer 3: Environment variables (highest priority)
            .merge(Env::prefixed("GRAPHEX_").split("_"))
            .extract()
            .map_err(ConfigError::from)
    }

    /// User config path: ~/.config/graphex/config.toml (XDG) or platform config dir.
    fn user_config_path() -> std::path::PathBuf {
        // Prefer XDG config location (~/.config) on all platforms
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("graphex").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        // Fall back to platform-specific config dir
        dirs::config_dir()
            .map(|p| p.join("graphex").join("config.toml"))
            .unwrap_or_default()
    }
}
