//! Interactive lookups against lazily built catalogs.
//!
//! Each service owns its catalog. The first lookup loads it from the cache
//! file, or builds it from the live listing when no cache exists.

use crate::config::{AppConfig, ScraperConfig};
use crate::models::{Catalog, PrefixIds, PrefixTable, Record};
use crate::pipeline::{fetch_catalog, fetch_prefix_table};
use crate::scraper::cleaner::{normalize_prefix, normalize_query};
use crate::scraper::{PageSource, scrape_record};
use crate::storage::CacheStore;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Normalized query → catalog key for names users commonly type.
pub const ALIASES: &[(&str, &str)] = &[
    ("derpkip", "mudkip"),
    ("farfetchd", "farfetch'd"),
    ("flabebe", "flabébé"),
    ("type_null", "type:_null"),
    ("nidoran_f", "nidoran_(f)"),
    ("nidoran_m", "nidoran_(m)"),
];

/// Queries that match several species, with the prompt to show instead.
pub const AMBIGUOUS: &[(&str, &str)] = &[(
    "nidoran",
    "Please specify either Nidoran (F) or Nidoran (M).",
)];

#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Found { key: String, url: String, record: Record },
    Miss,
    Ambiguous(String),
}

/// Where a normalized query lands in the catalog.
#[derive(Debug, PartialEq, Eq)]
enum Resolution<'a> {
    Key(&'a str),
    Ambiguous(&'static str),
    Miss,
}

fn resolve<'a>(catalog: &'a Catalog, query: &'a str) -> Resolution<'a> {
    if let Some((key, _)) = catalog.get_key_value(query) {
        return Resolution::Key(key);
    }
    if let Some(&(_, target)) = ALIASES.iter().find(|(alias, _)| *alias == query) {
        if let Some((key, _)) = catalog.get_key_value(target) {
            return Resolution::Key(key);
        }
    }
    if let Some(&(_, prompt)) = AMBIGUOUS.iter().find(|(name, _)| *name == query) {
        return Resolution::Ambiguous(prompt);
    }
    Resolution::Miss
}

// ── Pokédex ───────────────────────────────────────────────────────────────────

pub struct Pokedex<S> {
    source: Arc<S>,
    config: ScraperConfig,
    store: CacheStore,
    catalog: OnceCell<Catalog>,
}

impl<S: PageSource> Pokedex<S> {
    pub fn new(source: Arc<S>, config: &AppConfig) -> Self {
        Self {
            source,
            config: config.scraper.clone(),
            store: CacheStore::new(&config.storage),
            catalog: OnceCell::new(),
        }
    }

    /// Resolve user tokens to a record, scraping the page when the cache
    /// holds only its URL.
    pub async fn lookup<T: AsRef<str>>(&self, tokens: &[T]) -> Result<LookupOutcome> {
        let query = normalize_query(tokens);
        let catalog = self.catalog().await?;

        let key = match resolve(catalog, &query) {
            Resolution::Key(key) => key,
            Resolution::Ambiguous(prompt) => return Ok(LookupOutcome::Ambiguous(prompt.to_string())),
            Resolution::Miss => {
                debug!("No Pokédex entry for {:?}", query);
                return Ok(LookupOutcome::Miss);
            }
        };

        let entry = &catalog[key];
        let record = match &entry.record {
            Some(record) => {
                debug!("{}: served from cache", key);
                record.clone()
            }
            None => {
                let body = self
                    .source
                    .fetch(&entry.url)
                    .await
                    .with_context(|| format!("fetch({})", entry.url))?;
                scrape_record(&body, key)?
            }
        };

        Ok(LookupOutcome::Found {
            key: key.to_string(),
            url: entry.url.clone(),
            record,
        })
    }

    async fn catalog(&self) -> Result<&Catalog> {
        self.catalog.get_or_try_init(|| self.load_or_build()).await
    }

    async fn load_or_build(&self) -> Result<Catalog> {
        match self.store.load_catalog() {
            Ok(Some(catalog)) => {
                info!("Loaded {} Pokédex entries from cache", catalog.len());
                return Ok(catalog);
            }
            Ok(None) => {}
            Err(e) => warn!("Ignoring unreadable Pokédex cache: {:#}", e),
        }

        let (catalog, _) = fetch_catalog(self.source.as_ref(), &self.config)
            .await
            .context("Pokédex listing fetch failed")?;
        if let Err(e) = self.store.save_catalog(&catalog) {
            warn!("Could not cache Pokédex index: {:#}", e);
        }
        Ok(catalog)
    }
}

// ── Terraria prefixes ─────────────────────────────────────────────────────────

pub struct PrefixBook<S> {
    source: Arc<S>,
    config: ScraperConfig,
    store: CacheStore,
    table: OnceCell<PrefixTable>,
}

impl<S: PageSource> PrefixBook<S> {
    pub fn new(source: Arc<S>, config: &AppConfig) -> Self {
        Self {
            source,
            config: config.scraper.clone(),
            store: CacheStore::new(&config.storage),
            table: OnceCell::new(),
        }
    }

    /// Exact match on the trimmed, lowercased name.
    pub async fn lookup(&self, name: &str) -> Result<Option<(String, PrefixIds)>> {
        let prefix = normalize_prefix(name);
        let table = self.table().await?;
        Ok(table.get(&prefix).map(|ids| (prefix, ids.clone())))
    }

    async fn table(&self) -> Result<&PrefixTable> {
        self.table.get_or_try_init(|| self.load_or_build()).await
    }

    async fn load_or_build(&self) -> Result<PrefixTable> {
        match self.store.load_prefixes() {
            Ok(Some(table)) => {
                info!("Loaded {} prefixes from cache", table.len());
                return Ok(table);
            }
            Ok(None) => {}
            Err(e) => warn!("Ignoring unreadable prefix cache: {:#}", e),
        }

        let table = fetch_prefix_table(self.source.as_ref(), &self.config)
            .await
            .context("Prefix page fetch failed")?;
        if let Err(e) = self.store.save_prefixes(&table) {
            warn!("Could not cache prefix table: {:#}", e);
        }
        Ok(table)
    }
}
