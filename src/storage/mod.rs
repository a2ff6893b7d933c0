use crate::config::StorageConfig;
use crate::models::{Catalog, PrefixTable};
use crate::scraper::cleaner::display_name;
use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// ── Cache store ───────────────────────────────────────────────────────────────

/// JSON cache files for the scraped catalogs.
///
/// Files are written with sorted keys and two-space indentation so they
/// diff cleanly between runs.
#[derive(Debug, Clone)]
pub struct CacheStore {
    pokedex_path: PathBuf,
    prefixes_path: PathBuf,
}

impl CacheStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            pokedex_path: config.pokedex_path(),
            prefixes_path: config.prefixes_path(),
        }
    }

    // ── Pokédex ───────────────────────────────────────────────────────────────

    /// Load the Pokédex catalog, restoring display names of cached records.
    pub fn load_catalog(&self) -> Result<Option<Catalog>> {
        let Some(mut catalog) = read_json::<Catalog>(&self.pokedex_path)? else {
            return Ok(None);
        };
        for (key, entry) in catalog.iter_mut() {
            if let Some(record) = entry.record.as_mut() {
                record.display_name = display_name(key);
            }
        }
        Ok(Some(catalog))
    }

    pub fn save_catalog(&self, catalog: &Catalog) -> Result<()> {
        write_json(&self.pokedex_path, catalog)?;
        info!("Wrote {} Pokédex entries to {:?}", catalog.len(), self.pokedex_path);
        Ok(())
    }

    // ── Prefixes ──────────────────────────────────────────────────────────────

    pub fn load_prefixes(&self) -> Result<Option<PrefixTable>> {
        read_json(&self.prefixes_path)
    }

    pub fn save_prefixes(&self, table: &PrefixTable) -> Result<()> {
        write_json(&self.prefixes_path, table)?;
        info!("Wrote {} prefixes to {:?}", table.len(), self.prefixes_path);
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        debug!("No cache file at {:?}", path);
        return Ok(None);
    }
    let data = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let value = serde_json::from_slice(&data)
        .with_context(|| format!("Failed to parse cache file {:?}", path))?;
    Ok(Some(value))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Could not create dir {:?}", parent))?;
    }
    let text = serde_json::to_string_pretty(value).context("Failed to serialize cache")?;
    std::fs::write(path, text).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}
