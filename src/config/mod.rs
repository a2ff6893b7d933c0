use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings for every subsystem, each section optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Wiki endpoints and HTTP client settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    #[serde(default = "default_pokedex_base_url")]
    pub pokedex_base_url: String,

    #[serde(default = "default_pokedex_listing_path")]
    pub pokedex_listing_path: String,

    #[serde(default = "default_prefix_url")]
    pub prefix_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Cache file configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    #[serde(default = "default_pokedex_file")]
    pub pokedex_file: String,

    #[serde(default = "default_prefixes_file")]
    pub prefixes_file: String,
}

/// Bulk setup configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Upper bound on detail pages fetched at the same time.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_pokedex_base_url() -> String {
    "http://bulbapedia.bulbagarden.net".to_string()
}
fn default_pokedex_listing_path() -> String {
    "/wiki/List_of_Pok%C3%A9mon_by_National_Pok%C3%A9dex_number".to_string()
}
fn default_prefix_url() -> String {
    "http://terraria.gamepedia.com/Prefix_IDs".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows; U; Windows NT 10.0; rv:10.0) Gecko/20100101 Firefox/52.0".to_string()
}
fn default_cache_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_pokedex_file() -> String {
    "pokedex.json".to_string()
}
fn default_prefixes_file() -> String {
    "terrariaPrefixes.json".to_string()
}
fn default_concurrency() -> usize {
    100
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            pokedex_base_url: default_pokedex_base_url(),
            pokedex_listing_path: default_pokedex_listing_path(),
            prefix_url: default_prefix_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            pokedex_file: default_pokedex_file(),
            prefixes_file: default_prefixes_file(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// `.env`, then `config/default.toml`, `config/local.toml`, then `WIKIDEX__*` variables.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("WIKIDEX").separator("__"))
            .build()?;

        cfg.try_deserialize().context("Invalid configuration")
    }
}

impl ScraperConfig {
    /// Absolute URL of the national Pokédex listing page.
    pub fn pokedex_listing_url(&self) -> String {
        format!(
            "{}{}",
            self.pokedex_base_url.trim_end_matches('/'),
            self.pokedex_listing_path
        )
    }
}

impl StorageConfig {
    pub fn pokedex_path(&self) -> PathBuf {
        self.cache_dir.join(&self.pokedex_file)
    }

    pub fn prefixes_path(&self) -> PathBuf {
        self.cache_dir.join(&self.prefixes_file)
    }
}
