pub mod cleaner;
pub mod dom;
pub mod error;
pub mod http_client;
pub mod parsers;
pub mod pokedex;
pub mod prefixes;

use async_trait::async_trait;
use url::Url;

use crate::models::{Catalog, PrefixTable, Record};

pub use self::error::ScrapeResult;
pub use self::http_client::HttpClient;
pub use self::pokedex::ListingStats;

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable page fetcher.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> ScrapeResult<Vec<u8>>;
}

// ── Page → data ───────────────────────────────────────────────────────────────
// The parsed tree is not `Send`, so it lives and dies inside these calls.

pub fn scrape_record(body: &[u8], key: &str) -> ScrapeResult<Record> {
    let doc = dom::parse_document(body)?;
    parsers::assemble(&doc, key)
}

pub fn scrape_index(body: &[u8], base_url: &Url) -> ScrapeResult<(Catalog, ListingStats)> {
    let doc = dom::parse_document(body)?;
    pokedex::build_index(&doc, base_url)
}

pub fn scrape_prefixes(body: &[u8]) -> ScrapeResult<PrefixTable> {
    let doc = dom::parse_document(body)?;
    prefixes::parse_prefix_table(&doc)
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory page sources for tests.

    use super::PageSource;
    use super::error::{ScrapeError, ScrapeResult};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Serves fixed pages by URL and records every request.
    #[derive(Default)]
    pub struct StaticPages {
        pages: HashMap<String, String>,
        pub requests: Mutex<Vec<String>>,
    }

    impl StaticPages {
        pub fn with(mut self, url: &str, body: impl Into<String>) -> Self {
            self.pages.insert(url.to_string(), body.into());
            self
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PageSource for StaticPages {
        async fn fetch(&self, url: &str) -> ScrapeResult<Vec<u8>> {
            self.requests.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .map(|body| body.clone().into_bytes())
                .ok_or_else(|| ScrapeError::Parse(format!("no fixture for {url}")))
        }
    }

    /// Wraps another source and tracks the peak number of concurrent fetches.
    pub struct CountingSource<S> {
        inner: S,
        in_flight: AtomicUsize,
        pub peak: AtomicUsize,
        delay: Duration,
    }

    impl<S> CountingSource<S> {
        pub fn new(inner: S, delay: Duration) -> Self {
            Self {
                inner,
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                delay,
            }
        }

        pub fn peak(&self) -> usize {
            self.peak.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl<S: PageSource> PageSource for CountingSource<S> {
        async fn fetch(&self, url: &str) -> ScrapeResult<Vec<u8>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            let result = self.inner.fetch(url).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }
}
