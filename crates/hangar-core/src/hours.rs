//! Flight-hour requirement extraction.
//!
//! Each field has an ordered cascade of patterns, explicit requirement
//! phrasing first and bare "N hours" last. The first pattern that yields an
//! acceptable value wins; later patterns are never consulted. A value is
//! acceptable when it falls inside the field's plausible range, is not
//! qualified as "preferred" or "desired" within its own clause, and is not a
//! rate ("900 hours per year").
//!
//! Text is prepared before matching. Non-breaking spaces and line breaks
//! collapse to plain spaces, thousands separators are dropped ("1,500",
//! "1.500" and "1 500" become "1500"), and numeric ranges collapse to their
//! lower bound.

use std::sync::LazyLock;

use regex::Regex;

use crate::util::{collapse_whitespace, matchable_text};

/// Accepted total-time range.
pub const TOTAL_HOURS_RANGE: (u32, u32) = (100, 25_000);
/// Accepted pilot-in-command range.
pub const PIC_HOURS_RANGE: (u32, u32) = (50, 20_000);
/// Accepted time-on-type range.
pub const TYPE_HOURS_RANGE: (u32, u32) = (50, 10_000);

static THOUSANDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})[,. ](\d{3})\b").unwrap());
static RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{3,5})\s*\+?\s*(?:-|–|—|to)\s*\d{3,5}\b").unwrap());
static SOFT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:preferred|preferably|desired|desirable)\b").unwrap());
static CLAUSE_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[,;.()]|\b(?:and|but|however|whereas|while|although|though)\b").unwrap()
});

struct Cascade {
    patterns: Vec<Regex>,
    range: (u32, u32),
    /// Rejects a match when the text right after it names another field.
    foreign_tail: Option<Regex>,
}

impl Cascade {
    fn new(patterns: &[&str], range: (u32, u32), foreign_tail: Option<&str>) -> Self {
        Self {
            patterns: patterns.iter().map(|p| Regex::new(p).unwrap()).collect(),
            range,
            foreign_tail: foreign_tail.map(|p| Regex::new(p).unwrap()),
        }
    }

    fn extract(&self, text: &str) -> Option<u32> {
        let prepared = prepare(text);
        self.patterns.iter().find_map(|pattern| {
            pattern.captures_iter(&prepared).find_map(|caps| {
                let whole = caps.get(0)?;
                let value: u32 = caps.get(1)?.as_str().parse().ok()?;
                if value < self.range.0 || value > self.range.1 {
                    return None;
                }
                if is_soft(&prepared, whole.start(), whole.end()) {
                    return None;
                }
                if let Some(tail) = &self.foreign_tail
                    && tail.is_match(&prepared[whole.end()..])
                {
                    return None;
                }
                Some(value)
            })
        })
    }
}

/// Rejects a total-time match that belongs to another field or is a rate.
const TOTAL_FOREIGN_TAIL: &str = r"^\s*(?:of\s*)?(?:pic\b|p\.i\.c|in\s*command|as\s*pic|command|on\s*type|type\b|sic\b|block\b|per\s*(?:year|annum|month|week|day)\b|an?\s*(?:year|month|week|day)\b|annually|yearly|monthly|weekly|daily)";

static TOTAL: LazyLock<Cascade> = LazyLock::new(|| {
    Cascade::new(
        &[
            r"total\s*(?:time|hours?|flight)[\s:]*(\d{3,5})\b",
            r"minimum\s*(?:of\s*)?(\d{3,5})\s*(?:hours?|hrs?)",
            r"\b(\d{3,5})\s*(?:hours?|hrs?)\s*(?:minimum|required)",
            r"\b(\d{3,5})\s*\+?\s*(?:hours?|hrs?)?\s*(?:total|tt\b|total\s*time|total\s*flight)",
            r"\b(\d{3,5})\+?\s*(?:hrs?\b|hours?\b)",
        ],
        TOTAL_HOURS_RANGE,
        Some(TOTAL_FOREIGN_TAIL),
    )
});

static PIC: LazyLock<Cascade> = LazyLock::new(|| {
    Cascade::new(
        &[
            r"\b(\d{3,5})\+?\s*(?:hrs?|hours?)?\s*(?:of\s*)?(?:pic\b|command|p\.i\.c)",
            r"(?:pic\b|command|p\.i\.c\.?)[\s:]*(\d{3,5})\b",
            r"\b(\d{3,5})\s*(?:hours?|hrs?)\s*(?:in\s*command|as\s*pic)",
        ],
        PIC_HOURS_RANGE,
        None,
    )
});

static TYPE: LazyLock<Cascade> = LazyLock::new(|| {
    Cascade::new(
        &[
            r"\b(\d{3,5})\+?\s*(?:hours?|hrs?)\s*(?:on\s*type|type\b)",
            r"(?:on\s*type|type\s*hours?)[\s:]*(\d{3,5})\b",
        ],
        TYPE_HOURS_RANGE,
        None,
    )
});

fn prepare(text: &str) -> String {
    let flat = collapse_whitespace(&matchable_text(text));
    let joined = THOUSANDS.replace_all(&flat, "${1}${2}");
    RANGE.replace_all(&joined, "${1}").into_owned()
}

/// A match is soft when "preferred"/"desired" sits in its own clause. Clauses
/// end at punctuation and at conjunctions, so "3000 hours desired but
/// minimum 1500 hours" keeps the 1500.
fn is_soft(text: &str, start: usize, end: usize) -> bool {
    let before = CLAUSE_BREAK.split(&text[..start]).last().unwrap_or_default();
    let after = CLAUSE_BREAK.split(&text[end..]).next().unwrap_or_default();
    SOFT.is_match(before) || SOFT.is_match(after)
}

/// Minimum required total flight time.
pub fn extract_total_hours(text: &str) -> Option<u32> {
    TOTAL.extract(text)
}

/// Minimum required pilot-in-command time.
pub fn extract_pic_hours(text: &str) -> Option<u32> {
    PIC.extract(text)
}

/// Minimum required time on type.
pub fn extract_type_hours(text: &str) -> Option<u32> {
    TYPE.extract(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_ignores_time_on_type() {
        let text = "Minimum 1500 hours total time, 500 hours on type";
        assert_eq!(extract_total_hours(text), Some(1500));
        assert_eq!(extract_type_hours(text), Some(500));
    }

    #[test]
    fn test_range_resolves_to_lower_bound() {
        assert_eq!(extract_total_hours("1,500 – 3,000 hours"), Some(1500));
        assert_eq!(extract_total_hours("Between 2000 to 4000 hrs"), Some(2000));
        assert_eq!(extract_total_hours("1.500-3.000 hours total"), Some(1500));
    }

    #[test]
    fn test_preferred_values_are_skipped() {
        assert_eq!(
            extract_total_hours("Preferred 5000 hours, minimum 2000 hours"),
            Some(2000)
        );
        assert_eq!(
            extract_total_hours("4000 hours desired; 2500 hours required"),
            Some(2500)
        );
        assert_eq!(extract_total_hours("Preferred: 3000 hours"), None);
    }

    #[test]
    fn test_split_across_line_break_and_nbsp() {
        assert_eq!(extract_total_hours("Minimum 1500\r\nhours total time"), Some(1500));
        assert_eq!(extract_total_hours("Min 3000\u{00A0}hours"), Some(3000));
    }

    #[test]
    fn test_implausible_values_rejected() {
        assert_eq!(extract_total_hours("Crew support 24 hours a day"), None);
        assert_eq!(extract_total_hours("Over 50000 hours flown by our fleet"), None);
        assert_eq!(extract_total_hours("No hour requirement"), None);
    }

    #[test]
    fn test_total_time_prefix_form() {
        assert_eq!(extract_total_hours("Total time: 4000"), Some(4000));
        assert_eq!(extract_total_hours("3000 TT"), Some(3000));
    }

    #[test]
    fn test_pic_not_taken_as_total() {
        let text = "1000 hours PIC, 3000 hours total";
        assert_eq!(extract_total_hours(text), Some(3000));
        assert_eq!(extract_pic_hours(text), Some(1000));
    }

    #[test]
    fn test_pic_forms() {
        assert_eq!(extract_pic_hours("PIC: 500"), Some(500));
        assert_eq!(extract_pic_hours("1,000 hours in command"), Some(1000));
        assert_eq!(extract_pic_hours("1500 hrs P.I.C. on jet"), Some(1500));
        assert_eq!(extract_pic_hours("Minimum 3000 hours total"), None);
    }

    #[test]
    fn test_roster_rates_are_not_requirements() {
        let text = "Enjoy a roster of max 400 hours per year. 5000 hours total time required.";
        assert_eq!(extract_total_hours(text), Some(5000));
        assert_eq!(extract_total_hours("Up to 900 hours annually"), None);
        assert_eq!(extract_total_hours("around 750 block hours a year"), None);
    }

    #[test]
    fn test_explicit_requirement_beats_earlier_bare_mention() {
        let text = "Our pilots fly 800 hours on average. Minimum 2500 hours";
        assert_eq!(extract_total_hours(text), Some(2500));
    }

    #[test]
    fn test_digits_are_anchored_at_word_start() {
        assert_eq!(extract_total_hours("Reference 123456 hours"), None);
        assert_eq!(extract_total_hours("Minimum 1 500 hours"), Some(1500));
    }

    #[test]
    fn test_soft_qualifier_stays_in_its_clause() {
        assert_eq!(
            extract_total_hours("3000 hours desired but minimum 1500 hours"),
            Some(1500)
        );
        assert_eq!(
            extract_total_hours("2000 hours total and preferably 500 on type"),
            Some(2000)
        );
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let text = "Minimum 1500 hours total time";
        assert_eq!(extract_total_hours(text), extract_total_hours(text));
    }
}
