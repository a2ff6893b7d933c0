//! National Pokédex listing page → lookup index.

use scraper::Html;
use tracing::{debug, info, warn};
use url::Url;

use crate::models::{Catalog, CatalogEntry};

use super::cleaner::normalize_key;
use super::dom::{first_text, selector};
use super::error::ScrapeResult;

/// Region names that head the per-generation tables.
pub const REGIONS: &[&str] = &["Kanto", "Johto", "Hoenn", "Sinnoh", "Unova", "Kalos", "Alola"];

/// Document index of a species table whose heading names no region.
pub const POSITIONAL_TABLE: usize = 7;

/// Encoded marker present in every species href.
const DETAIL_MARKER: &str = "Pok%C3%A9mon";
/// Lowercased marker of links back to list pages.
const LIST_MARKER: &str = "list";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ListingStats {
    pub tables_read: usize,
    pub tables_skipped: usize,
    pub entries: usize,
}

/// Collect `key → detail URL` from the listing page.
///
/// Tables that are neither headed by a region nor the positional exception
/// are skipped; the count is reported rather than treated as an error.
pub fn build_index(doc: &Html, base_url: &Url) -> ScrapeResult<(Catalog, ListingStats)> {
    let table_sel = selector("table")?;
    let th_sel = selector("th")?;
    let row_sel = selector("tr")?;
    let link_sel = selector("a[href]")?;

    let mut catalog = Catalog::new();
    let mut stats = ListingStats::default();

    for (i, table) in doc.select(&table_sel).enumerate() {
        let heading = first_text(table, &th_sel).unwrap_or_default();
        if i != POSITIONAL_TABLE && !names_region(&heading) {
            debug!("Skipping listing table {} ({:?})", i, heading);
            stats.tables_skipped += 1;
            continue;
        }
        stats.tables_read += 1;

        for row in table.select(&row_sel) {
            for link in row.select(&link_sel) {
                let Some(href) = link.value().attr("href") else { continue };
                if !is_detail_href(href) {
                    continue;
                }

                let url = match base_url.join(&href.replace("%27", "'")) {
                    Ok(url) => url,
                    Err(e) => {
                        warn!("Bad href {:?}: {}", href, e);
                        continue;
                    }
                };
                catalog
                    .entry(normalize_key(href))
                    .or_insert_with(|| CatalogEntry::new(url.to_string()));
            }
        }
    }

    stats.entries = catalog.len();
    info!(
        "Listing: {} entries from {} tables ({} skipped)",
        stats.entries, stats.tables_read, stats.tables_skipped
    );
    Ok((catalog, stats))
}

pub fn is_detail_href(href: &str) -> bool {
    href.contains(DETAIL_MARKER) && !href.to_lowercase().contains(LIST_MARKER)
}

fn names_region(heading: &str) -> bool {
    heading
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| REGIONS.contains(&word))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const BASE: &str = "http://bulbapedia.bulbagarden.net";

    fn species_row(dex: &str, href: &str, name: &str) -> String {
        format!(
            r#"<tr><td>{dex}</td><td><a href="{href}" title="{name}">{name}</a></td>
               <td><a href="/wiki/Grass_(type)" title="Grass (type)">Grass</a></td></tr>"#
        )
    }

    /// Listing with a navigation table, Kanto, filler tables and the
    /// positional table at index 7.
    pub(crate) fn listing_page() -> String {
        let mut page = String::from(
            r#"<html><body><table><tr><th>Contents</th></tr>
               <tr><td><a href="/wiki/List_of_Pok%C3%A9mon_by_name">by name</a></td></tr></table>"#,
        );
        page.push_str(&format!(
            r#"<table><tr><th colspan="3"><a href="/wiki/Kanto" title="Kanto">Kanto</a></th></tr>{}{}{}{}</table>"#,
            species_row("#001", "/wiki/Bulbasaur_(Pok%C3%A9mon)", "Bulbasaur"),
            species_row("#029", "/wiki/Nidoran%E2%99%80_(Pok%C3%A9mon)", "Nidoran♀"),
            species_row("#032", "/wiki/Nidoran%E2%99%82_(Pok%C3%A9mon)", "Nidoran♂"),
            species_row("#083", "/wiki/Farfetch%27d_(Pok%C3%A9mon)", "Farfetch'd"),
        ));
        page.push_str(&format!(
            r#"<table><tr><th>Hoenn</th></tr>{}</table>"#,
            species_row("#258", "/wiki/Mudkip_(Pok%C3%A9mon)", "Mudkip"),
        ));
        for filler in 3..7 {
            page.push_str(&format!(
                r#"<table><tr><th>Legend {filler}</th></tr>{}</table>"#,
                species_row("#999", "/wiki/Missingno._(Pok%C3%A9mon)", "MissingNo.")
            ));
        }
        page.push_str(&format!(
            r#"<table><tr><th>Generation VII</th></tr>{}{}</table></body></html>"#,
            species_row("#772", "/wiki/Type:_Null_(Pok%C3%A9mon)", "Type: Null"),
            species_row("#669", "/wiki/Flab%C3%A9b%C3%A9_(Pok%C3%A9mon)", "Flabébé"),
        ));
        page
    }

    #[test]
    fn test_build_index_selects_region_and_positional_tables() {
        let doc = Html::parse_document(&listing_page());
        let (catalog, stats) = build_index(&doc, &Url::parse(BASE).unwrap()).unwrap();

        let keys: Vec<&str> = catalog.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["bulbasaur", "farfetch'd", "flabébé", "mudkip", "nidoran_(f)", "nidoran_(m)", "type:_null"]
        );
        assert_eq!(stats.tables_read, 3);
        assert_eq!(stats.tables_skipped, 5);
        assert_eq!(stats.entries, 7);
        assert_eq!(
            catalog["farfetch'd"].url,
            "http://bulbapedia.bulbagarden.net/wiki/Farfetch'd_(Pok%C3%A9mon)"
        );
        assert!(catalog.values().all(|e| e.record.is_none()));
    }

    #[test]
    fn test_detail_href_filter() {
        assert!(is_detail_href("/wiki/Bulbasaur_(Pok%C3%A9mon)"));
        assert!(!is_detail_href("/wiki/List_of_Pok%C3%A9mon_by_name"));
        assert!(!is_detail_href("/wiki/Grass_(type)"));
    }
}
