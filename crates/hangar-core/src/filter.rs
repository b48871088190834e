//! Candidate filter: cheap keyword screen applied before normalization.
//!
//! Deny terms win over allow terms. Terms of three characters or fewer
//! ("tri", "atr", "cpl") must match a whole word; longer terms match at a word
//! start so plurals and inflections ("pilots", "engineering") still count.

use std::sync::LazyLock;

use regex::Regex;

/// Role, aircraft and license vocabulary that signals a flying position.
pub const ALLOW_TERMS: &[&str] = &[
    "pilot",
    "captain",
    "first officer",
    "f/o",
    "fo",
    "co-pilot",
    "copilot",
    "second officer",
    "cruise pilot",
    "relief pilot",
    "training captain",
    "line captain",
    "senior first officer",
    "direct entry",
    "cadet",
    "type rating",
    "type rated",
    "flight crew",
    "cockpit crew",
    "flight deck",
    "cockpit",
    "aviator",
    "a320",
    "a330",
    "a350",
    "a380",
    "b737",
    "b747",
    "b777",
    "b787",
    "boeing",
    "airbus",
    "embraer",
    "bombardier",
    "atr",
    "crj",
    "erj",
    "atpl",
    "cpl",
    "mpl",
    "ab initio",
    "ab-initio",
    "trainee pilot",
    "check pilot",
    "tri",
    "tre",
];

/// Non-flying roles: ground staff, cabin crew, engineering, administration.
pub const DENY_TERMS: &[&str] = &[
    "drone",
    "simulator instructor",
    "ground",
    "dispatcher",
    "coordinator",
    "manager",
    "admin",
    "cabin",
    "flight attendant",
    "steward",
    "engineer",
    "mechanic",
    "technician",
    "analyst",
    "developer",
    "customer service",
    "check-in",
];

static ALLOW: LazyLock<Regex> = LazyLock::new(|| term_regex(ALLOW_TERMS));
static DENY: LazyLock<Regex> = LazyLock::new(|| term_regex(DENY_TERMS));

fn term_regex(terms: &[&str]) -> Regex {
    let alternatives = terms
        .iter()
        .map(|term| {
            let escaped = regex::escape(term);
            if term.len() <= 3 {
                format!(r"\b{escaped}\b")
            } else {
                format!(r"\b{escaped}")
            }
        })
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i)(?:{alternatives})")).unwrap()
}

/// URL paths separate words with hyphens, underscores, plus signs or `%20`.
fn url_words(url: &str) -> String {
    url.replace("%20", " ").replace(['-', '_', '+'], " ")
}

/// Whether a posting looks like a pilot job worth normalizing.
pub fn is_candidate(title: &str, url: &str) -> bool {
    let url = url_words(url);
    if DENY.is_match(title) || DENY.is_match(&url) {
        return false;
    }
    ALLOW.is_match(title) || ALLOW.is_match(&url)
}

/// Whether a title or URL carries a deny term.
pub fn is_denied(title: &str, url: &str) -> bool {
    DENY.is_match(title) || DENY.is_match(&url_words(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_pilot_titles() {
        assert!(is_candidate("A320 Captain - Dubai", ""));
        assert!(is_candidate("Direct Entry First Officer B777", ""));
        assert!(is_candidate("Cadet Pilot Programme 2025", ""));
        assert!(is_candidate("Pilots wanted", ""));
        assert!(is_candidate("TRI/TRE ATR 72", ""));
    }

    #[test]
    fn test_accepts_on_url_alone() {
        assert!(is_candidate(
            "View vacancy",
            "https://careers.example-air.com/jobs/senior-first-officer-1234"
        ));
    }

    #[test]
    fn test_deny_beats_allow() {
        assert!(!is_candidate("Pilot Training Manager", ""));
        assert!(!is_candidate("Cabin Crew - Airbus A350", ""));
        assert!(!is_candidate("Aircraft Maintenance Engineer B737", ""));
        assert!(!is_candidate("Captain", "https://a.example/jobs/ground-ops/captain"));
        assert!(!is_candidate("Drone Pilot", ""));
        assert!(!is_candidate("Simulator Instructor A320", ""));
    }

    #[test]
    fn test_rejects_unrelated_pages() {
        assert!(!is_candidate("Privacy Policy", "https://a.example/privacy"));
        assert!(!is_candidate("Our history", "https://a.example/about"));
    }

    #[test]
    fn test_short_terms_need_whole_words() {
        // "tri" and "tre" must not fire inside "industrial" or "street".
        assert!(!is_candidate("Industrial Street Festival", ""));
        assert!(!is_candidate("Atrium tour", ""));
        assert!(is_candidate("F/O wanted", ""));
    }

    #[test]
    fn test_background_is_not_ground_staff() {
        assert!(is_candidate("Captain (background check required)", ""));
        assert!(is_denied("Ground Handling Agent", ""));
    }
}
