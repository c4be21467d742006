//! Brand Graph
//!
//! Marketing-intelligence graph service:
//! - Neo4j pattern queries over brands, ads, topics and platforms
//! - Row aggregation into a weighted `{nodes, links}` payload
//! - Dashboard filters (brand, topic, sentiment, connection strength)
//! - HTTP API with a TTL response cache

pub mod api;
pub mod graph;
pub mod neo4j;
pub mod service;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use graph::{GraphMode, Sizing};
use service::{GraphService, GraphServiceConfig};

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: ServerYamlConfig,
    pub neo4j: Neo4jYamlConfig,
    pub graph: GraphYamlConfig,
    pub cache: CacheYamlConfig,
    pub query: QueryYamlConfig,
}

/// Server configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerYamlConfig {
    pub port: u16,
}

impl Default for ServerYamlConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

/// Neo4j configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Neo4jYamlConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

impl Default for Neo4jYamlConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".into(),
            user: "neo4j".into(),
            password: "neo4j".into(),
        }
    }
}

/// Graph shaping section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphYamlConfig {
    /// enriched | ranked | generic
    pub mode: GraphMode,
    pub top_n: usize,
    pub base_radius: u32,
    pub scale_factor: f64,
    pub brand_radius: u32,
}

impl Default for GraphYamlConfig {
    fn default() -> Self {
        let sizing = Sizing::default();
        Self {
            mode: GraphMode::default(),
            top_n: graph::AggregateOptions::DEFAULT_TOP_N,
            base_radius: sizing.base_radius,
            scale_factor: sizing.scale_factor,
            brand_radius: sizing.brand_radius,
        }
    }
}

/// Response cache section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheYamlConfig {
    /// Entry lifetime; 0 disables the cache
    pub ttl_secs: u64,
    pub max_entries: u64,
}

impl Default for CacheYamlConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 60,
            max_entries: 100,
        }
    }
}

/// Query execution section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryYamlConfig {
    pub timeout_ms: u64,
}

impl Default for QueryYamlConfig {
    fn default() -> Self {
        Self { timeout_ms: 10_000 }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    pub server_port: u16,
    pub graph_mode: GraphMode,
    pub graph_top_n: usize,
    pub sizing: Sizing,
    pub query_timeout_ms: u64,
    pub cache_ttl_secs: u64,
    pub cache_max_entries: u64,
}

/// Parse an env var, keeping `fallback` when unset or unparsable.
fn env_parse<T: std::str::FromStr>(var: &str, fallback: T) -> T {
    match std::env::var(var) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring invalid {}={}", var, raw);
                fallback
            }
        },
        Err(_) => fallback,
    }
}

impl Config {
    /// Load configuration from environment variables only (backward compat).
    /// Equivalent to from_yaml_and_env(None).
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD. If the file doesn't
    /// exist, falls back to pure env var / defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        let config = Self {
            neo4j_uri: std::env::var("NEO4J_URI").unwrap_or(yaml.neo4j.uri),
            neo4j_user: std::env::var("NEO4J_USER").unwrap_or(yaml.neo4j.user),
            neo4j_password: std::env::var("NEO4J_PASSWORD").unwrap_or(yaml.neo4j.password),
            server_port: env_parse("SERVER_PORT", yaml.server.port),
            graph_mode: env_parse("GRAPH_MODE", yaml.graph.mode),
            graph_top_n: env_parse("GRAPH_TOP_N", yaml.graph.top_n),
            sizing: Sizing {
                base_radius: yaml.graph.base_radius,
                scale_factor: yaml.graph.scale_factor,
                brand_radius: yaml.graph.brand_radius,
            },
            query_timeout_ms: env_parse("QUERY_TIMEOUT_MS", yaml.query.timeout_ms),
            cache_ttl_secs: env_parse("CACHE_TTL_SECS", yaml.cache.ttl_secs),
            cache_max_entries: env_parse("CACHE_MAX_ENTRIES", yaml.cache.max_entries),
        };

        if config.query_timeout_ms == 0 {
            anyhow::bail!("query timeout must be greater than zero");
        }
        Ok(config)
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }

    /// Settings for the graph service
    pub fn service_config(&self) -> GraphServiceConfig {
        GraphServiceConfig {
            default_mode: self.graph_mode,
            default_top_n: self.graph_top_n,
            sizing: self.sizing,
            query_timeout: Duration::from_millis(self.query_timeout_ms),
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            cache_max_entries: self.cache_max_entries,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub graph: Arc<GraphService>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Connect to Neo4j and build the graph service
    pub async fn new(config: Config) -> Result<Self> {
        let neo4j = Arc::new(
            neo4j::client::Neo4jClient::new(
                &config.neo4j_uri,
                &config.neo4j_user,
                &config.neo4j_password,
            )
            .await?,
        );

        Ok(Self::with_store(neo4j, config))
    }

    /// Build state around an existing graph store
    pub fn with_store(store: Arc<dyn neo4j::GraphStore>, config: Config) -> Self {
        let graph = Arc::new(GraphService::new(store, config.service_config()));
        Self {
            graph,
            config: Arc::new(config),
        }
    }
}

/// Start the HTTP server and block until it stops
pub async fn start_server(config: Config) -> Result<()> {
    let port = config.server_port;
    let state = AppState::new(config).await?;
    tracing::info!("Connected to Neo4j");

    let app = api::create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server running on port {}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
