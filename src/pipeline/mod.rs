//! Bulk setup: builds the catalogs once and writes them to the cache.
//!
//! ## Steps
//!
//! `setup_pokedex()`:
//!   1. Fetch the National Pokédex listing → `key → detail URL` catalog
//!   2. Fetch every detail page concurrently (bounded by a semaphore) and
//!      assemble its record; failed pages are logged and counted
//!   3. Write the catalog, records included, to `pokedex.json`
//!
//! `setup_prefixes()` fetches the Terraria prefix page and writes
//! `terrariaPrefixes.json`.

use crate::config::{AppConfig, ScraperConfig};
use crate::models::{Catalog, PrefixTable, Record};
use crate::scraper::{ListingStats, PageSource, scrape_index, scrape_prefixes, scrape_record};
use crate::storage::CacheStore;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use url::Url;

pub struct Pipeline<S> {
    source: Arc<S>,
    config: AppConfig,
    store: CacheStore,
}

impl<S: PageSource + 'static> Pipeline<S> {
    pub fn new(source: Arc<S>, config: AppConfig) -> Self {
        let store = CacheStore::new(&config.storage);
        Self { source, config, store }
    }

    pub async fn setup_pokedex(&self) -> Result<PipelineStats> {
        // ── 1. Listing → index ────────────────────────────────────────────────
        info!("=== Step 1: Building Pokédex index ===");
        let (mut catalog, listing) = fetch_catalog(self.source.as_ref(), &self.config.scraper)
            .await
            .context("Pokédex listing fetch failed")?;

        // ── 2. Scrape every detail page ───────────────────────────────────────
        let concurrency = self.config.pipeline.concurrency.max(1);
        info!(
            "=== Step 2: Scraping {} detail pages ({} at a time) ===",
            catalog.len(),
            concurrency
        );

        let sem = Arc::new(Semaphore::new(concurrency));
        let mut handles = Vec::with_capacity(catalog.len());

        for (key, entry) in &catalog {
            let task_key = key.clone();
            let url = entry.url.clone();
            let source = Arc::clone(&self.source);
            let sem = Arc::clone(&sem);

            let handle = tokio::spawn(async move {
                let _permit = sem.acquire().await?;

                let body = source
                    .fetch(&url)
                    .await
                    .with_context(|| format!("fetch({})", url))?;
                let record = scrape_record(&body, &task_key)?;

                Ok::<Record, anyhow::Error>(record)
            });

            handles.push((key.clone(), handle));
        }

        let mut scraped = 0usize;
        let mut errors = 0usize;

        for (key, handle) in handles {
            match handle.await {
                Ok(Ok(record)) => {
                    if let Some(entry) = catalog.get_mut(&key) {
                        entry.record = Some(record);
                        scraped += 1;
                    }
                }
                Ok(Err(e)) => {
                    warn!("{}: {:#}", key, e);
                    errors += 1;
                }
                Err(e) => {
                    error!("Task panic for {}: {}", key, e);
                    errors += 1;
                }
            }
        }

        // ── 3. Persist ────────────────────────────────────────────────────────
        self.store
            .save_catalog(&catalog)
            .context("Failed to write Pokédex cache")?;

        let stats = PipelineStats {
            entries: catalog.len(),
            scraped,
            errors,
            tables_skipped: listing.tables_skipped,
        };
        info!(
            "=== Done: {} entries | {} scraped | {} errors | {} listing tables skipped ===",
            stats.entries, stats.scraped, stats.errors, stats.tables_skipped
        );

        Ok(stats)
    }

    pub async fn setup_prefixes(&self) -> Result<usize> {
        info!("=== Building Terraria prefix table ===");
        let table = fetch_prefix_table(self.source.as_ref(), &self.config.scraper)
            .await
            .context("Prefix page fetch failed")?;

        self.store
            .save_prefixes(&table)
            .context("Failed to write prefix cache")?;
        Ok(table.len())
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub entries: usize,
    pub scraped: usize,
    pub errors: usize,
    pub tables_skipped: usize,
}

// ── Catalog fetchers ──────────────────────────────────────────────────────────

/// Fetch the listing page and build the index (no detail pages).
pub async fn fetch_catalog<S: PageSource + ?Sized>(
    source: &S,
    config: &ScraperConfig,
) -> Result<(Catalog, ListingStats)> {
    let base = Url::parse(&config.pokedex_base_url).context("Invalid Pokédex base URL")?;
    let url = config.pokedex_listing_url();
    let body = source
        .fetch(&url)
        .await
        .with_context(|| format!("fetch({})", url))?;
    Ok(scrape_index(&body, &base)?)
}

pub async fn fetch_prefix_table<S: PageSource + ?Sized>(
    source: &S,
    config: &ScraperConfig,
) -> Result<PrefixTable> {
    let body = source
        .fetch(&config.prefix_url)
        .await
        .with_context(|| format!("fetch({})", config.prefix_url))?;
    Ok(scrape_prefixes(&body)?)
}
