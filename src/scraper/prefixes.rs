//! Terraria "Prefix IDs" page → prefix table.

use scraper::{ElementRef, Html};
use tracing::info;

use crate::models::{PrefixIds, PrefixTable};

use super::cleaner::normalize_prefix;
use super::dom::{selector, text_of};
use super::error::ScrapeResult;

/// Exact class list of the ID tables.
const TABLE_CLASSES: &[&str] = &["sortable", "terraria"];

pub fn parse_prefix_table(doc: &Html) -> ScrapeResult<PrefixTable> {
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("td")?;

    let mut table = PrefixTable::new();

    for body in doc.select(&table_sel).filter(|t| is_id_table(*t)) {
        for row in body.select(&row_sel) {
            let cols: Vec<String> = row.select(&cell_sel).map(text_of).collect();
            // Header rows carry `th` only
            let [prefix, id] = cols.as_slice() else { continue };
            let (prefix, id) = (normalize_prefix(prefix), normalize_prefix(id));
            if prefix.is_empty() || id.is_empty() {
                continue;
            }

            match table.get_mut(&prefix) {
                Some(ids) => ids.push(id),
                None => {
                    table.insert(prefix, PrefixIds::One(id));
                }
            }
        }
    }

    info!("Prefix table: {} prefixes", table.len());
    Ok(table)
}

fn is_id_table(table: ElementRef<'_>) -> bool {
    let mut classes: Vec<&str> = table.value().classes().collect();
    classes.sort_unstable();
    classes == TABLE_CLASSES
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn prefix_page() -> String {
        r#"<html><body>
        <table class="wikitable"><tr><td>Nope</td><td>0</td></tr></table>
        <table class="terraria sortable">
          <tr><th>Prefix</th><th>ID</th></tr>
          <tr><td> Large </td><td>1</td></tr>
          <tr><td>Legendary</td><td>81</td></tr>
          <tr><td>Quick</td><td>35</td></tr>
          <tr><td>Quick</td><td>75</td></tr>
          <tr><td>Broken</td><td>39</td><td>extra</td></tr>
        </table>
        <table class="terraria sortable"><tr><td>Godly</td><td>59</td></tr></table>
        </body></html>"#
            .to_string()
    }

    #[test]
    fn test_parse_prefix_table() {
        let doc = Html::parse_document(&prefix_page());
        let table = parse_prefix_table(&doc).unwrap();

        assert_eq!(table.len(), 4);
        assert_eq!(table["large"], PrefixIds::One("1".into()));
        assert_eq!(table["quick"], PrefixIds::Many(vec!["35".into(), "75".into()]));
        assert_eq!(table["godly"].joined(), "59");
        assert!(!table.contains_key("nope"));
        assert!(!table.contains_key("broken"));
    }
}
