//! Chat-style command surface: lookups in, formatted replies out.

use crate::config::AppConfig;
use crate::lookup::{LookupOutcome, Pokedex, PrefixBook};
use crate::models::{Record, StatLine, VariantGroups};
use crate::scraper::PageSource;
use crate::scraper::cleaner::{normalize_query, pretty_gender};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

const POKEMON_USAGE: &str = "Please specify a valid Pokemon to look up.";
const PREFIX_USAGE: &str = "Please specify a Terraria prefix to look up.";
const CARD_FOOTER: &str = "Source: https://bulbapedia.bulbagarden.net/";
const MORE_STATS: &str = "Check Bulbapedia for more stats.";

/// Stat tables shown on one card.
const MAX_STAT_GROUPS: usize = 3;
const STAT_ORDER: [&str; 6] = ["HP", "Attack", "Defense", "Sp.Atk", "Sp.Def", "Speed"];
const TOTAL_STAT: &str = "Total";
const CODE_FENCE: &str = "```";

// ── Replies ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Card(Card),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub title: String,
    pub description: String,
    pub url: String,
    pub fields: Vec<CardField>,
    pub thumbnail: Option<String>,
    pub footer: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardField {
    pub name: String,
    pub value: String,
}

#[cfg(test)]
impl Card {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.value.as_str())
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Text(text) => write!(f, "{text}"),
            Reply::Card(card) => {
                writeln!(f, "{}", card.title)?;
                writeln!(f, "{}", card.url)?;
                writeln!(f, "{}", card.description)?;
                for field in &card.fields {
                    writeln!(f, "\n{}\n{}", field.name, field.value)?;
                }
                if let Some(thumbnail) = &card.thumbnail {
                    writeln!(f, "\nImage: {thumbnail}")?;
                }
                write!(f, "\n{}", card.footer)
            }
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

pub struct Commands<S> {
    pokedex: Pokedex<S>,
    prefixes: PrefixBook<S>,
}

impl<S: PageSource> Commands<S> {
    pub fn new(source: Arc<S>, config: &AppConfig) -> Self {
        Self {
            pokedex: Pokedex::new(Arc::clone(&source), config),
            prefixes: PrefixBook::new(source, config),
        }
    }

    pub async fn pokemon<T: AsRef<str>>(&self, tokens: &[T]) -> Reply {
        if normalize_query(tokens).is_empty() {
            return Reply::Text(fenced(POKEMON_USAGE));
        }
        let search = join_tokens(tokens);

        match self.pokedex.lookup(tokens).await {
            Ok(LookupOutcome::Found { key, url, record }) => {
                debug!("{:?} resolved to {}", search, key);
                Reply::Card(pokemon_card(&record, &url))
            }
            Ok(LookupOutcome::Ambiguous(prompt)) => Reply::Text(fenced(&prompt)),
            Ok(LookupOutcome::Miss) => Reply::Text(fenced(&format!(
                "Invalid Pokemon '{}' specified. {}",
                search, POKEMON_USAGE
            ))),
            Err(e) => {
                error!("Lookup of {:?} failed: {:#}", search, e);
                Reply::Text(something_went_wrong(&search))
            }
        }
    }

    pub async fn prefix<T: AsRef<str>>(&self, tokens: &[T]) -> Reply {
        let search = join_tokens(tokens);
        if search.trim().is_empty() {
            return Reply::Text(PREFIX_USAGE.to_string());
        }

        match self.prefixes.lookup(&search).await {
            Ok(Some((prefix, ids))) => Reply::Text(fenced(&format!("{}: {}", prefix, ids.joined()))),
            Ok(None) => Reply::Text(fenced(&format!(
                "Invalid prefix '{}' specified. Please specify a valid prefix to look up",
                search
            ))),
            Err(e) => {
                error!("Prefix lookup of {:?} failed: {:#}", search, e);
                Reply::Text(something_went_wrong(&search))
            }
        }
    }
}

// ── Formatting ────────────────────────────────────────────────────────────────

pub fn pokemon_card(record: &Record, url: &str) -> Card {
    Card {
        title: pretty_gender(&record.display_name),
        description: format!("{}: {}", record.external_id, record.category),
        url: url.to_string(),
        fields: vec![
            CardField { name: "Types".into(), value: groups_value(&record.type_groups) },
            CardField { name: "Abilities".into(), value: groups_value(&record.ability_groups) },
            CardField { name: "Base Stats".into(), value: stats_value(record) },
        ],
        thumbnail: record.image_url.as_ref().map(|img| format!("https:{img}")),
        footer: CARD_FOOTER.to_string(),
    }
}

/// One group: "Grass, Poison". Several: one sorted "label: a, b" line each.
fn groups_value(groups: &VariantGroups) -> String {
    if groups.len() == 1 {
        return groups.values().next().map(|v| v.join(", ")).unwrap_or_default();
    }
    groups
        .iter()
        .map(|(label, values)| format!("{}: {}", pretty_gender(label), values.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

fn stats_value(record: &Record) -> String {
    let mut lines = vec![
        format!("{CODE_FENCE}{:^15}{:^24}", "Stat", "Range"),
        format!("{:15}{:^12}{:^12}", "", "At Lv. 50", "At Lv. 100"),
    ];

    for (label, stats) in record.stat_table.iter().take(MAX_STAT_GROUPS) {
        lines.push(pretty_gender(label));
        for stat in STAT_ORDER {
            if let Some(line) = stats.get(stat) {
                lines.push(stat_row(stat, line));
            }
        }
        if let Some(total) = stats.get(TOTAL_STAT) {
            lines.push(format!("{:<9}{}", format!("{TOTAL_STAT}:"), total.base));
        }
    }

    if record.stat_table.len() > MAX_STAT_GROUPS {
        lines.push(MORE_STATS.to_string());
    }
    lines.push(CODE_FENCE.to_string());
    lines.join("\n")
}

fn stat_row(stat: &str, line: &StatLine) -> String {
    format!(
        "{:<9}{:<6}{:^12}{:^12}",
        format!("{stat}:"),
        line.base,
        line.at_level_50,
        line.at_level_100
    )
}

fn fenced(text: &str) -> String {
    format!("{CODE_FENCE}{text}{CODE_FENCE}")
}

fn join_tokens<T: AsRef<str>>(tokens: &[T]) -> String {
    tokens.iter().map(|t| t.as_ref()).collect::<Vec<&str>>().join(" ")
}

fn something_went_wrong(search: &str) -> String {
    format!("Something went wrong while looking up '{search}'.")
}
