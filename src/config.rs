/// Configuration management using figment
///
/// Loads configuration with this precedence (highest wins):
/// 1. Defaults (hardcoded)
/// 2. TOML file: casetwin.toml (in working directory)
/// 3. Environment variables: prefixed CASETWIN_, nested keys split on __
///    (e.g., CASETWIN_QDRANT__URL=http://localhost:6333)

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::errors::CasetwinError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Optional file path for log output (in addition to stderr)
    #[serde(default)]
    pub log_file: Option<String>,

    #[serde(default)]
    pub qdrant: QdrantConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

/// Connection settings for the Qdrant vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QdrantConfig {
    /// Base URL of the Qdrant instance (e.g., http://localhost:6333)
    #[serde(default = "default_qdrant_url")]
    pub url: String,

    /// Optional API key sent as the `api-key` header
    #[serde(default)]
    pub api_key: Option<String>,

    /// Collection holding the indexed case embeddings
    #[serde(default = "default_collection")]
    pub collection: String,
}

/// Ranking parameters for the retrieval-and-fusion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of matches returned to the caller when no limit is given
    #[serde(default = "default_display_limit")]
    pub default_limit: usize,

    /// Candidate pool width when a clinical profile triggers re-ranking.
    /// Wider than the display limit so the fusion step has headroom.
    #[serde(default = "default_rerank_pool")]
    pub rerank_pool: usize,

    /// Fusion weight on the normalized visual score
    #[serde(default = "default_visual_weight")]
    pub visual_weight: f64,

    /// Fusion weight on the clinical-context score
    #[serde(default = "default_context_weight")]
    pub context_weight: f64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_qdrant_url() -> String {
    "http://localhost:6333".to_string()
}

fn default_collection() -> String {
    "chest_xrays".to_string()
}

fn default_display_limit() -> usize {
    5
}

fn default_rerank_pool() -> usize {
    30
}

fn default_visual_weight() -> f64 {
    0.7
}

fn default_context_weight() -> f64 {
    0.3
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: default_log_level(),
            log_file: None,
            qdrant: QdrantConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Default for QdrantConfig {
    fn default() -> Self {
        QdrantConfig {
            url: default_qdrant_url(),
            api_key: None,
            collection: default_collection(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            default_limit: default_display_limit(),
            rerank_pool: default_rerank_pool(),
            visual_weight: default_visual_weight(),
            context_weight: default_context_weight(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, TOML file, and environment variables
    ///
    /// Environment variables override TOML file values.
    /// Example: CASETWIN_QDRANT__COLLECTION=chest_xrays overrides
    /// qdrant.collection in casetwin.toml
    pub fn load() -> Result<Config, CasetwinError> {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file("casetwin.toml"))
            .merge(Env::prefixed("CASETWIN_").split("__"))
            .extract()
            .map_err(|e| CasetwinError::Config(format!("Failed to load config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_file, None);
        assert_eq!(config.qdrant.url, "http://localhost:6333");
        assert_eq!(config.qdrant.collection, "chest_xrays");
        assert_eq!(config.search.default_limit, 5);
        assert_eq!(config.search.rerank_pool, 30);
    }

    #[test]
    fn test_fusion_weights_sum_to_one() {
        let config = SearchConfig::default();
        assert!((config.visual_weight + config.context_weight - 1.0).abs() < 1e-12);
    }
}
