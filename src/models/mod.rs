use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Separator used for multi-valued fields in the JSON cache.
pub const VALUE_DELIMITER: char = ';';

/// Variant label → ordered values, e.g. `"Mega Charizard X" → ["Fire", "Dragon"]`.
pub type VariantGroups = BTreeMap<String, Vec<String>>;

/// Variant label → stat name → line.
pub type StatTable = BTreeMap<String, BTreeMap<String, StatLine>>;

// ── Record ────────────────────────────────────────────────────────────────────

/// Normalized data scraped from one Pokémon detail page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Record {
    #[serde(skip)]
    pub display_name: String,
    pub category: String,
    #[serde(rename = "natDexNo")]
    pub external_id: String,
    #[serde(rename = "img", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(rename = "types", with = "joined_groups")]
    pub type_groups: VariantGroups,
    #[serde(rename = "abilities", with = "joined_groups")]
    pub ability_groups: VariantGroups,
    #[serde(rename = "baseStats")]
    pub stat_table: StatTable,
}

// ── Stat line ─────────────────────────────────────────────────────────────────

/// One row of a base-stat table. The `Total` row only carries `base`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatLine {
    pub base: String,
    pub at_level_50: String,
    pub at_level_100: String,
}

impl StatLine {
    pub fn new(base: &str, at_level_50: &str, at_level_100: &str) -> Self {
        Self {
            base: base.to_string(),
            at_level_50: at_level_50.to_string(),
            at_level_100: at_level_100.to_string(),
        }
    }

    pub fn total(base: &str) -> Self {
        Self::new(base, "", "")
    }
}

impl Serialize for StatLine {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.at_level_50.is_empty() && self.at_level_100.is_empty() {
            serializer.serialize_str(&self.base)
        } else {
            serializer.serialize_str(&format!(
                "{}{d}{}{d}{}",
                self.base,
                self.at_level_50,
                self.at_level_100,
                d = VALUE_DELIMITER
            ))
        }
    }
}

impl<'de> Deserialize<'de> for StatLine {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let mut parts = raw.split(VALUE_DELIMITER);
        Ok(Self {
            base: parts.next().unwrap_or_default().to_string(),
            at_level_50: parts.next().unwrap_or_default().to_string(),
            at_level_100: parts.next().unwrap_or_default().to_string(),
        })
    }
}

/// `VariantGroups` as `{ label: "a;b" }`.
mod joined_groups {
    use super::{VALUE_DELIMITER, VariantGroups};
    use serde::{Deserialize, Deserializer, Serializer, ser::SerializeMap};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(groups: &VariantGroups, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(groups.len()))?;
        for (label, values) in groups {
            map.serialize_entry(label, &values.join(&VALUE_DELIMITER.to_string()))?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<VariantGroups, D::Error> {
        let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .map(|(label, joined)| {
                let values = joined
                    .split(VALUE_DELIMITER)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
                    .collect();
                (label, values)
            })
            .collect())
    }
}

// ── Catalog ───────────────────────────────────────────────────────────────────

/// One Pokédex index entry, optionally with its pre-scraped record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub url: String,
    #[serde(flatten)]
    pub record: Option<Record>,
}

impl CatalogEntry {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            record: None,
        }
    }
}

/// Lookup key → entry. Sorted so the cache file is stable.
pub type Catalog = BTreeMap<String, CatalogEntry>;

// ── Terraria prefixes ─────────────────────────────────────────────────────────

/// IDs of one Terraria prefix; a few prefix names map to several IDs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PrefixIds {
    One(String),
    Many(Vec<String>),
}

impl PrefixIds {
    pub fn push(&mut self, id: String) {
        match self {
            PrefixIds::One(first) => *self = PrefixIds::Many(vec![std::mem::take(first), id]),
            PrefixIds::Many(ids) => ids.push(id),
        }
    }

    pub fn joined(&self) -> String {
        match self {
            PrefixIds::One(id) => id.clone(),
            PrefixIds::Many(ids) => ids.join(", "),
        }
    }
}

pub type PrefixTable = BTreeMap<String, PrefixIds>;

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        let mut stats = BTreeMap::new();
        stats.insert("HP".to_string(), StatLine::new("45", "105 - 152", "200 - 294"));
        stats.insert("Total".to_string(), StatLine::total("318"));

        Record {
            display_name: "Bulbasaur".into(),
            category: "Seed Pokémon".into(),
            external_id: "#001".into(),
            image_url: Some("//img/bulbasaur.png".into()),
            type_groups: [("Bulbasaur".to_string(), vec!["Grass".into(), "Poison".into()])].into(),
            ability_groups: [
                ("Bulbasaur".to_string(), vec!["Overgrow".into()]),
                ("Hidden Ability".to_string(), vec!["Chlorophyll".into()]),
            ]
            .into(),
            stat_table: [("Bulbasaur".to_string(), stats)].into(),
        }
    }

    #[test]
    fn test_record_json_shape() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["natDexNo"], "#001");
        assert_eq!(value["img"], "//img/bulbasaur.png");
        assert_eq!(value["types"]["Bulbasaur"], "Grass;Poison");
        assert_eq!(value["baseStats"]["Bulbasaur"]["HP"], "45;105 - 152;200 - 294");
        assert_eq!(value["baseStats"]["Bulbasaur"]["Total"], "318");
        assert!(value.get("display_name").is_none());
    }

    #[test]
    fn test_catalog_entry_flattens_record() {
        let entry = CatalogEntry {
            url: "http://x/wiki/Bulbasaur".into(),
            record: Some(sample()),
        };
        let text = serde_json::to_string(&entry).unwrap();
        let back: CatalogEntry = serde_json::from_str(&text).unwrap();
        let record = back.record.unwrap();
        assert_eq!(record.type_groups["Bulbasaur"], vec!["Grass", "Poison"]);
        assert_eq!(record.stat_table["Bulbasaur"]["Total"], StatLine::total("318"));

        let bare: CatalogEntry = serde_json::from_str(r#"{"url": "http://x"}"#).unwrap();
        assert!(bare.record.is_none());
    }

    #[test]
    fn test_prefix_ids_accumulate() {
        let mut ids = PrefixIds::One("12".into());
        ids.push("83".into());
        ids.push("84".into());
        assert_eq!(ids.joined(), "12, 83, 84");
        assert_eq!(serde_json::to_string(&PrefixIds::One("5".into())).unwrap(), r#""5""#);
    }
}
