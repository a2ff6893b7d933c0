//! Field extractors for a Bulbapedia species page and the record assembler.
//!
//! Every extractor anchors on the page's single info box (or, for stats, on
//! the left-aligned stat tables) and returns either its value or an
//! `Extraction` error naming the field. `assemble` is all-or-nothing.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use tracing::{debug, error};

use crate::models::{Record, StatLine, StatTable, VariantGroups};

use super::cleaner::display_name;
use super::dom::{
    closest, elements_in_order, find_next, find_nth_next, first_text, previous_element,
    selector, text_of,
};
use super::error::{ScrapeError, ScrapeResult};

// ── Page layout constants ─────────────────────────────────────────────────────

const INFOBOX_SELECTOR: &str = r#"table[style*="float:right"]"#;
const IMAGE_SELECTOR: &str = "a.image img";
const CATEGORY_EXPLAIN_SELECTOR: &str = "span.explain";
const SMALL_TEXT_SELECTOR: &str = "small";
const STAT_TABLE_SELECTOR: &str = r#"table[align="left"]"#;

const CATEGORY_SUFFIX: &str = " Pokémon";
const DEX_LINK_TITLE: &str = "List of Pokémon by National Pokédex number";
const TYPE_TITLE_SUFFIX: &str = "(type)";
const UNKNOWN_TYPE_TITLE: &str = "Unknown (type)";
const ABILITY_LINK_TITLE: &str = "Ability";

/// Text of the first `span` in a stat table.
const STAT_TABLE_SENTINEL: &str = "Stat";
/// Heading above the species' own stat table.
const GENERIC_STAT_HEADING: &str = "Base stats";
/// Stat rows per table before the total.
const STAT_ROWS: usize = 6;
/// `td` hops from one stat cell to the next.
const CELL_STRIDE: usize = 2;
/// `th` hops from a stat cell to its base value.
const BASE_VALUE_OFFSET: usize = 2;
const TOTAL_STAT: &str = "Total";

static CATEGORY_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new("Pok.mon category").unwrap());

// ── Assembler ─────────────────────────────────────────────────────────────────

/// Build a full record from a detail page, or fail on the first missing field.
pub fn assemble(doc: &Html, key: &str) -> ScrapeResult<Record> {
    let name = display_name(key);
    assemble_named(doc, &name).inspect_err(|e| error!("{}: {}", name, e))
}

fn assemble_named(doc: &Html, name: &str) -> ScrapeResult<Record> {
    let infobox = extract_infobox(doc, name)?;
    let image_url = extract_image(infobox, name)?;
    let category = extract_category(infobox, name)?;
    let external_id = extract_dex_number(infobox, name)?;
    let type_groups = extract_types(infobox, name)?;
    let ability_groups = extract_abilities(infobox, name)?;
    let stat_table = extract_base_stats(doc, name)?;

    debug!(
        "{}: {} type group(s), {} ability group(s), {} stat table(s)",
        name,
        type_groups.len(),
        ability_groups.len(),
        stat_table.len()
    );

    Ok(Record {
        display_name: name.to_string(),
        category,
        external_id,
        image_url: Some(image_url),
        type_groups,
        ability_groups,
        stat_table,
    })
}

// ── Extractors ────────────────────────────────────────────────────────────────

/// The page must carry exactly one info box.
pub fn extract_infobox<'a>(doc: &'a Html, name: &str) -> ScrapeResult<ElementRef<'a>> {
    let sel = selector(INFOBOX_SELECTOR)?;
    let mut boxes = doc.select(&sel);
    match (boxes.next(), boxes.next()) {
        (Some(infobox), None) => Ok(infobox),
        _ => Err(ScrapeError::extraction("infobox", name)),
    }
}

pub fn extract_image(infobox: ElementRef<'_>, name: &str) -> ScrapeResult<String> {
    let sel = selector(IMAGE_SELECTOR)?;
    infobox
        .select(&sel)
        .next()
        .and_then(|img| img.value().attr("src"))
        .filter(|src| !src.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ScrapeError::extraction("image", name))
}

pub fn extract_category(infobox: ElementRef<'_>, name: &str) -> ScrapeResult<String> {
    let link = links_where(infobox, |title| CATEGORY_TITLE.is_match(title))?
        .into_iter()
        .next()
        .ok_or_else(|| ScrapeError::extraction("category", name))?;

    let mut text = text_of(link);
    if text.is_empty() {
        // Category text sits in a hover tooltip on some pages
        let explain = selector(CATEGORY_EXPLAIN_SELECTOR)?;
        text = first_text(link, &explain).unwrap_or_default();
    }
    if text.is_empty() {
        return Err(ScrapeError::extraction("category", name));
    }
    if !text.ends_with(CATEGORY_SUFFIX) {
        text.push_str(CATEGORY_SUFFIX);
    }
    Ok(text)
}

pub fn extract_dex_number(infobox: ElementRef<'_>, name: &str) -> ScrapeResult<String> {
    links_where(infobox, |title| title.contains(DEX_LINK_TITLE))?
        .into_iter()
        .map(text_of)
        .next()
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ScrapeError::extraction("national dex number", name))
}

/// Types grouped by the sub-table they appear in (one per form).
pub fn extract_types(infobox: ElementRef<'_>, name: &str) -> ScrapeResult<VariantGroups> {
    let links = links_where(infobox, is_type_title)?;
    if links.is_empty() {
        return Err(ScrapeError::extraction("types", name));
    }

    // (sub-table, its type links) in document order
    let mut tables: Vec<(Option<ElementRef<'_>>, Vec<ElementRef<'_>>)> = Vec::new();
    for link in links {
        let table = closest(link, "table");
        match tables.iter_mut().find(|(t, _)| t.map(|t| t.id()) == table.map(|t| t.id())) {
            Some((_, members)) => members.push(link),
            None => tables.push((table, vec![link])),
        }
    }

    let small = selector(SMALL_TEXT_SELECTOR)?;
    let single = tables.len() == 1;
    let mut groups = VariantGroups::new();

    for (table, members) in tables {
        let label = if single {
            None
        } else {
            table
                .and_then(|t| closest(t, "td"))
                .and_then(|cell| first_text(cell, &small))
        };
        let values = groups.entry(label.unwrap_or_else(|| name.to_string())).or_default();
        for link in members {
            push_unique(values, text_of(link));
        }
    }

    groups.retain(|_, values| !values.is_empty());
    if groups.is_empty() {
        return Err(ScrapeError::extraction("types", name));
    }
    Ok(groups)
}

/// Abilities grouped by their sub-label ("Hidden Ability", a form name, ...).
pub fn extract_abilities(infobox: ElementRef<'_>, name: &str) -> ScrapeResult<VariantGroups> {
    let anchor = links_where(infobox, |title| title == ABILITY_LINK_TITLE)?
        .into_iter()
        .next()
        .ok_or_else(|| ScrapeError::extraction("abilities", name))?;

    let anchor_cell =
        closest(anchor, "td").ok_or_else(|| ScrapeError::extraction("abilities", name))?;
    let row = anchor_cell
        .parent()
        .and_then(ElementRef::wrap)
        .ok_or_else(|| ScrapeError::extraction("abilities", name))?;

    let td = selector("td")?;
    let link = selector("a")?;
    let small = selector(SMALL_TEXT_SELECTOR)?;
    let mut groups = VariantGroups::new();

    for cell in row.select(&td) {
        if cell.id() == anchor_cell.id() || is_hidden(cell) {
            continue;
        }
        let Some(ability) = first_text(cell, &link) else {
            continue;
        };
        let label = first_text(cell, &small).unwrap_or_else(|| name.to_string());
        push_unique(groups.entry(label).or_default(), ability);
    }

    if groups.is_empty() {
        return Err(ScrapeError::extraction("abilities", name));
    }
    Ok(groups)
}

/// Every stat table on the page, keyed by the heading right above it.
pub fn extract_base_stats(doc: &Html, name: &str) -> ScrapeResult<StatTable> {
    let tables = selector(STAT_TABLE_SELECTOR)?;
    let span = selector("span")?;
    let link = selector("a")?;
    let mut stats = StatTable::new();

    for table in doc.select(&tables) {
        let is_stat_table = table
            .select(&span)
            .next()
            .is_some_and(|s| text_of(s) == STAT_TABLE_SENTINEL);
        if !is_stat_table {
            continue;
        }

        let heading = previous_element(doc, table).map(text_of).unwrap_or_default();
        let label = if heading.is_empty() || heading == GENERIC_STAT_HEADING {
            name.to_string()
        } else {
            heading
        };

        let lines = read_stat_rows(table, &link).ok_or_else(|| ScrapeError::extraction("base stats", name))?;
        stats.insert(label, lines);
    }

    if stats.is_empty() {
        return Err(ScrapeError::extraction("base stats", name));
    }
    Ok(stats)
}

/// Walk one stat table with the fixed cell stride.
fn read_stat_rows(table: ElementRef<'_>, link: &Selector) -> Option<BTreeMap<String, StatLine>> {
    let order = elements_in_order(table);
    let mut lines = BTreeMap::new();
    let mut cell = find_next(&order, 0, "td")?;

    for _ in 0..STAT_ROWS {
        let stat = order[cell].select(link).next().map(text_of)?;
        let base = base_value(&order, cell)?;
        let lv50 = find_next(&order, cell, "small")?;
        let lv100 = find_next(&order, lv50, "small")?;
        lines.insert(
            stat,
            StatLine::new(&base, &text_of(order[lv50]), &text_of(order[lv100])),
        );
        cell = find_nth_next(&order, cell, "td", CELL_STRIDE)?;
    }

    lines.insert(TOTAL_STAT.to_string(), StatLine::total(&base_value(&order, cell)?));
    Some(lines)
}

fn base_value(order: &[ElementRef<'_>], cell: usize) -> Option<String> {
    let th = find_nth_next(order, cell, "th", BASE_VALUE_OFFSET)?;
    Some(text_of(order[th])).filter(|v| !v.is_empty())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn links_where<'a>(
    root: ElementRef<'a>,
    title_matches: impl Fn(&str) -> bool,
) -> ScrapeResult<Vec<ElementRef<'a>>> {
    let sel = selector("a[title]")?;
    Ok(root
        .select(&sel)
        .filter(|a| a.value().attr("title").is_some_and(&title_matches))
        .collect())
}

fn is_type_title(title: &str) -> bool {
    title.ends_with(TYPE_TITLE_SUFFIX) && !title.ends_with(UNKNOWN_TYPE_TITLE)
}

fn is_hidden(cell: ElementRef<'_>) -> bool {
    cell.value().attr("style").is_some_and(|style| {
        style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase()
            .contains("display:none")
    })
}

fn push_unique(values: &mut Vec<String>, value: String) {
    if !value.is_empty() && !values.contains(&value) {
        values.push(value);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
