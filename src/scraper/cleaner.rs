//! Text normalization for lookup keys and display names.

use std::borrow::Cow;

/// Path segment that precedes every article name.
const WIKI_PATH: &str = "/wiki/";

/// Disambiguation suffix on species articles, after decoding and lowercasing.
const SPECIES_SUFFIX: &str = "_(pokémon)";

/// Decorative prefix users type in front of a species name.
const QUERY_PREFIX: &str = "mega_";

/// Replacement applied to a key only when it starts with `prefix`.
pub struct KeySubstitution {
    pub prefix: &'static str,
    pub from: &'static str,
    pub to: &'static str,
}

/// Names whose punctuation does not survive as a typeable key.
pub const KEY_SUBSTITUTIONS: &[KeySubstitution] = &[
    KeySubstitution { prefix: "nidoran", from: "\u{2640}", to: "_(f)" },
    KeySubstitution { prefix: "nidoran", from: "\u{2642}", to: "_(m)" },
];

// ── Keys ──────────────────────────────────────────────────────────────────────

/// Turn a detail-page href into a lookup key.
/// "/wiki/Nidoran%E2%99%80_(Pok%C3%A9mon)" → "nidoran_(f)"
pub fn normalize_key(href: &str) -> String {
    let path = href.rsplit_once(WIKI_PATH).map(|(_, rest)| rest).unwrap_or(href);
    let decoded = urlencoding::decode(path).unwrap_or(Cow::Borrowed(path));
    let lower = decoded.to_lowercase();
    let mut key = lower.strip_suffix(SPECIES_SUFFIX).unwrap_or(&lower).to_string();

    for sub in KEY_SUBSTITUTIONS {
        if key.starts_with(sub.prefix) {
            key = key.replace(sub.from, sub.to);
        }
    }
    key
}

/// Turn user-typed tokens into a lookup key.
/// ["Mega", "Charizard"] → "charizard" | ["Mr.", "Mime"] → "mr._mime"
pub fn normalize_query<S: AsRef<str>>(tokens: &[S]) -> String {
    let joined = tokens
        .iter()
        .map(|t| t.as_ref())
        .collect::<Vec<&str>>()
        .join(" ")
        .to_lowercase();

    let key = joined
        .split(|c: char| c.is_whitespace() || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    match key.strip_prefix(QUERY_PREFIX) {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => key,
    }
}

pub fn normalize_prefix(s: &str) -> String {
    s.trim().to_lowercase()
}

// ── Display ───────────────────────────────────────────────────────────────────

/// "nidoran_(f)" → "Nidoran (f)"
pub fn display_name(key: &str) -> String {
    key.split('_').map(capitalize).collect::<Vec<_>>().join(" ")
}

/// "Nidoran (f)" → "Nidoran ♀"
pub fn pretty_gender(s: &str) -> String {
    s.replace("(m)", "\u{2642}").replace("(f)", "\u{2640}")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
