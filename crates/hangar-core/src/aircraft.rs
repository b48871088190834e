//! Aircraft alias table and category lookup.
//!
//! Raw mentions ("a-320neo", "Airbus 320", "737-800") resolve to one canonical
//! code. Anything outside the table resolves to nothing; the pipeline then
//! reports `aircraft_type = None` with category `Unknown` rather than guessing.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::AircraftCategory;
use crate::models::AircraftCategory::{Business, Narrowbody, Regional, Turboprop, Widebody};

/// One canonical aircraft type and the raw spellings that refer to it.
#[derive(Debug)]
pub struct AircraftType {
    pub code: &'static str,
    pub category: AircraftCategory,
    aliases: &'static [&'static str],
}

const fn entry(
    code: &'static str,
    category: AircraftCategory,
    aliases: &'static [&'static str],
) -> AircraftType {
    AircraftType {
        code,
        category,
        aliases,
    }
}

const FLEET: &[AircraftType] = &[
    // Airbus
    entry("A318", Narrowbody, &["a318", "airbus a318", "airbus 318"]),
    entry("A319", Narrowbody, &["a319", "a319neo", "airbus a319", "airbus 319"]),
    entry("A320neo", Narrowbody, &["a320neo", "a320 neo", "airbus a320neo"]),
    entry("A320", Narrowbody, &["a320", "a320ceo", "airbus a320", "airbus 320"]),
    entry("A320 Family", Narrowbody, &["a320 family", "a320 series", "a32f"]),
    entry("A321XLR", Narrowbody, &["a321xlr", "a321 xlr"]),
    entry("A321neo", Narrowbody, &["a321neo", "a321 neo", "a321lr"]),
    entry("A321", Narrowbody, &["a321", "airbus a321", "airbus 321"]),
    entry("A330", Widebody, &["a330", "a330neo", "airbus a330", "airbus 330"]),
    entry("A340", Widebody, &["a340", "airbus a340", "airbus 340"]),
    entry("A350", Widebody, &["a350", "a350 xwb", "airbus a350", "airbus 350"]),
    entry("A380", Widebody, &["a380", "airbus a380", "airbus 380"]),
    // Boeing
    entry(
        "B737MAX",
        Narrowbody,
        &["b737 max", "737 max", "boeing 737 max", "b38m", "737 8200"],
    ),
    entry(
        "B737NG",
        Narrowbody,
        &[
            "b737ng",
            "737ng",
            "737 ng",
            "737 800",
            "b737 800",
            "boeing 737 800",
            "737 700",
            "b737 700",
            "boeing 737 700",
            "737 900",
        ],
    ),
    entry("B737 Classic", Narrowbody, &["737 classic", "b737 classic", "737 300", "737 400"]),
    entry("B737", Narrowbody, &["b737", "737", "boeing 737"]),
    entry("B747", Widebody, &["b747", "747", "boeing 747", "jumbo"]),
    entry("B757", Narrowbody, &["b757", "757", "boeing 757"]),
    entry("B767", Widebody, &["b767", "767", "boeing 767"]),
    entry("B777", Widebody, &["b777", "777", "boeing 777", "777x", "triple seven"]),
    entry("B787", Widebody, &["b787", "787", "boeing 787", "dreamliner"]),
    // Embraer
    entry("E190-E2", Regional, &["e190 e2", "embraer 190 e2"]),
    entry("E195-E2", Regional, &["e195 e2", "embraer 195 e2"]),
    entry("E2", Regional, &["e2", "e jet e2", "embraer e2"]),
    entry("E170", Regional, &["e170", "erj 170", "embraer 170"]),
    entry("E175", Regional, &["e175", "erj 175", "embraer 175"]),
    entry("E190", Regional, &["e190", "erj 190", "embraer 190"]),
    entry("E195", Regional, &["e195", "erj 195", "embraer 195"]),
    entry("ERJ145", Regional, &["erj145", "erj 145", "embraer 145"]),
    // Regional jets and turboprops
    entry("CRJ900", Regional, &["crj900", "crj 900", "crj 1000"]),
    entry("CRJ700", Regional, &["crj700", "crj 700"]),
    entry("CRJ200", Regional, &["crj200", "crj 200"]),
    entry("CRJ", Regional, &["crj", "canadair"]),
    entry("ATR 72", Turboprop, &["atr72", "atr 72", "atr 72 600"]),
    entry("ATR 42", Turboprop, &["atr42", "atr 42"]),
    entry("ATR", Turboprop, &["atr"]),
    entry("Dash 8 Q400", Turboprop, &["q400", "dash 8 q400", "dhc 8 400", "dash 8 400"]),
    entry("Dash 8", Turboprop, &["dash 8", "dash8", "dhc 8", "q300", "q200"]),
    entry("Saab 340", Turboprop, &["saab 340", "saab340", "saab 2000"]),
    entry("PC-12", Turboprop, &["pc12", "pc 12", "pilatus pc12"]),
    // Business aviation
    entry("PC-24", Business, &["pc24", "pc 24", "pilatus pc24"]),
    entry("Citation", Business, &["citation", "cessna citation"]),
    entry("Learjet", Business, &["learjet", "lear jet"]),
    entry("Gulfstream G650", Business, &["g650", "gulfstream g650", "g650er"]),
    entry("Gulfstream G550", Business, &["g550", "gulfstream g550"]),
    entry("Gulfstream", Business, &["gulfstream"]),
    entry("Global 7500", Business, &["global 7500", "bombardier global 7500"]),
    entry("Global", Business, &["global express", "bombardier global", "global 6000", "global 5000"]),
    entry("Challenger 350", Business, &["challenger 350", "cl350"]),
    entry("Challenger", Business, &["bombardier challenger", "challenger 605", "challenger 650"]),
    entry("Falcon 7X", Business, &["falcon 7x", "dassault falcon 7x"]),
    entry("Falcon 900", Business, &["falcon 900", "dassault falcon 900"]),
    entry("Falcon", Business, &["dassault falcon", "falcon 2000", "falcon 8x"]),
    entry("Phenom 300", Business, &["phenom 300", "embraer phenom 300"]),
    entry("Phenom", Business, &["phenom", "phenom 100"]),
    entry("TBM 940", Business, &["tbm 940", "tbm940"]),
    entry("TBM 900", Business, &["tbm 900", "tbm900"]),
    entry("TBM", Business, &["tbm", "daher tbm"]),
];

/// Lowercase and keep only ASCII alphanumerics: "A-320 NEO" → "a320neo".
fn compact(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

static BY_COMPACT: LazyLock<HashMap<String, &'static AircraftType>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    for aircraft in FLEET {
        map.entry(compact(aircraft.code)).or_insert(aircraft);
        for alias in aircraft.aliases {
            map.entry(compact(alias)).or_insert(aircraft);
        }
    }
    map
});

/// Alias spelled with optional separators at word and letter/digit breaks.
fn alias_pattern(alias: &str) -> String {
    let mut segments: Vec<String> = Vec::new();
    for word in alias.split_whitespace() {
        let mut current = String::new();
        let mut last_digit: Option<bool> = None;
        for c in word.chars() {
            let is_digit = c.is_ascii_digit();
            if last_digit.is_some_and(|d| d != is_digit) {
                segments.push(regex::escape(&current));
                current.clear();
            }
            current.push(c);
            last_digit = Some(is_digit);
        }
        if !current.is_empty() {
            segments.push(regex::escape(&current));
        }
    }
    segments.join(r"[\s\-]*")
}

/// Aliases too ambiguous for free text ("777", "737 800", "e2"): phone
/// numbers, visa classes and flight numbers collide with them. They still
/// resolve when they are the whole token.
fn is_bare(alias: &str) -> bool {
    let key = compact(alias);
    key.len() <= 2 || key.chars().all(|c| c.is_ascii_digit())
}

static MENTION: LazyLock<Regex> = LazyLock::new(|| {
    let mut aliases: Vec<&str> = FLEET
        .iter()
        .flat_map(|a| a.aliases.iter().copied())
        .filter(|a| !is_bare(a))
        .collect();
    // Longest first so "a320neo" wins over "a320" at the same position.
    aliases.sort_by_key(|a| std::cmp::Reverse(compact(a).len()));
    let alternatives = aliases
        .iter()
        .map(|a| alias_pattern(a))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternatives})\b")).unwrap()
});

/// Normalize a single aircraft token to its canonical code.
///
/// Canonical codes map to themselves. A token that is not an exact alias is
/// scanned for the first known mention ("Boeing 737-800 NG" → "B737NG").
pub fn normalize_aircraft(token: &str) -> Option<&'static str> {
    lookup(token).map(|a| a.code)
}

/// First known aircraft mentioned in free text.
pub fn find_aircraft(text: &str) -> Option<&'static str> {
    scan(text).map(|a| a.code)
}

/// Category of a canonical code, `Unknown` when the code is not in the table.
pub fn category_for(code: &str) -> AircraftCategory {
    BY_COMPACT
        .get(&compact(code))
        .map(|a| a.category)
        .unwrap_or(AircraftCategory::Unknown)
}

fn lookup(token: &str) -> Option<&'static AircraftType> {
    let key = compact(token);
    if key.is_empty() {
        return None;
    }
    BY_COMPACT.get(&key).copied().or_else(|| scan(token))
}

fn scan(text: &str) -> Option<&'static AircraftType> {
    let found = MENTION.find(text)?;
    BY_COMPACT.get(&compact(found.as_str())).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neo_spellings_converge() {
        let a = normalize_aircraft("a320neo");
        assert_eq!(a, Some("A320neo"));
        assert_eq!(normalize_aircraft("A320 NEO"), a);
        assert_eq!(normalize_aircraft("a-320neo"), a);
    }

    #[test]
    fn test_aliases_resolve() {
        assert_eq!(normalize_aircraft("a-320"), Some("A320"));
        assert_eq!(normalize_aircraft("Airbus 320"), Some("A320"));
        assert_eq!(normalize_aircraft("Dreamliner"), Some("B787"));
        assert_eq!(normalize_aircraft("Boeing 737-800"), Some("B737NG"));
        assert_eq!(normalize_aircraft("Q400"), Some("Dash 8 Q400"));
        assert_eq!(normalize_aircraft("E190-E2"), Some("E190-E2"));
    }

    #[test]
    fn test_canonical_codes_are_fixed_points() {
        for aircraft in FLEET {
            assert_eq!(
                normalize_aircraft(aircraft.code),
                Some(aircraft.code),
                "{}",
                aircraft.code
            );
        }
    }

    #[test]
    fn test_unknown_aircraft_is_not_guessed() {
        assert_eq!(normalize_aircraft("Concorde"), None);
        assert_eq!(normalize_aircraft(""), None);
        assert_eq!(category_for("Concorde"), AircraftCategory::Unknown);
    }

    #[test]
    fn test_categories() {
        assert_eq!(category_for("A320"), AircraftCategory::Narrowbody);
        assert_eq!(category_for("B777"), AircraftCategory::Widebody);
        assert_eq!(category_for("E175"), AircraftCategory::Regional);
        assert_eq!(category_for("ATR 72"), AircraftCategory::Turboprop);
        assert_eq!(category_for("PC-12"), AircraftCategory::Turboprop);
        assert_eq!(category_for("Gulfstream G650"), AircraftCategory::Business);
    }

    #[test]
    fn test_find_in_free_text() {
        assert_eq!(
            find_aircraft("Direct Entry Captain - A350-900 based in Doha"),
            Some("A350")
        );
        assert_eq!(find_aircraft("First Officer B737 MAX"), Some("B737MAX"));
        assert_eq!(find_aircraft("ATR 72-600 Captain"), Some("ATR 72"));
        assert_eq!(find_aircraft("Global airline seeks pilots"), None);
        assert_eq!(find_aircraft("Join our team"), None);
    }

    #[test]
    fn test_bare_numbers_need_a_maker_prefix_in_free_text() {
        assert_eq!(find_aircraft("Applicants must hold an E2 visa"), None);
        assert_eq!(find_aircraft("Call us on 777 737 800"), None);
        assert_eq!(find_aircraft("Fly the Boeing 777 from Dubai"), Some("B777"));
        assert_eq!(find_aircraft("Captain B737-800"), Some("B737NG"));
        assert_eq!(find_aircraft("Embraer E2 First Officer"), Some("E2"));
    }

    #[test]
    fn test_bare_tokens_still_normalize() {
        assert_eq!(normalize_aircraft("777"), Some("B777"));
        assert_eq!(normalize_aircraft("737-800"), Some("B737NG"));
        assert_eq!(normalize_aircraft("E2"), Some("E2"));
    }
}
