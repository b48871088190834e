//! Keyword taxonomies for the rule-based backend.
//!
//! Every classifier here is an ordered list; the first matching entry wins.
//! Inputs are expected to be prepared with [`crate::util::matchable_text`]
//! unless noted otherwise.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{ContractType, PositionType};
use crate::util::collapse_whitespace;

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
}

fn any_match(patterns: &[Regex], text: &str) -> bool {
    patterns.iter().any(|p| p.is_match(text))
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

static POSITIONS: LazyLock<Vec<(PositionType, Vec<Regex>)>> = LazyLock::new(|| {
    vec![
        (
            PositionType::Captain,
            compile(&[
                r"\bcaptain\b",
                r"\bcommander\b",
                r"\bpic\b",
                r"\bp\.i\.c\b",
                r"\bleft[\s-]*seat\b",
            ]),
        ),
        (
            PositionType::FirstOfficer,
            compile(&[
                r"\bfirst[\s-]*officer\b",
                r"\bf/?o\b",
                r"\bco[\s-]?pilot\b",
                r"\bsecond[\s-]*in[\s-]*command\b",
                r"\bsic\b",
                r"\bright[\s-]*seat\b",
            ]),
        ),
        (
            PositionType::SecondOfficer,
            compile(&[
                r"\bsecond[\s-]*officer\b",
                r"\bs/o\b",
                r"\bcruise[\s-]*(?:relief[\s-]*)?pilot\b",
                r"\brelief[\s-]*pilot\b",
            ]),
        ),
        (
            PositionType::Cadet,
            compile(&[
                r"\bcadet",
                r"\bab[\s-]*initio\b",
                r"\btrainee\b",
                r"\bmentored[\s-]*program",
                r"\bpathway\b",
            ]),
        ),
        (
            PositionType::Instructor,
            compile(&[
                r"\binstructor\b",
                r"\btri\b",
                r"\btre\b",
                r"\bsfi\b",
                r"\bcheck[\s-]*(?:pilot|airman)\b",
            ]),
        ),
    ]
});

static GENERIC_PILOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bpilots?\b|\bflight[\s-]*crew\b|\baviator").unwrap());

/// Rank taxonomy: captain > first officer > second officer > cadet > instructor.
///
/// Without a rank term, a generic pilot keyword means first officer and
/// anything else is `Other`.
pub fn position_type(title: &str) -> PositionType {
    POSITIONS
        .iter()
        .find(|(_, patterns)| any_match(patterns, title))
        .map(|(position, _)| *position)
        .unwrap_or_else(|| {
            if GENERIC_PILOT.is_match(title) {
                PositionType::FirstOfficer
            } else {
                PositionType::Other
            }
        })
}

// ---------------------------------------------------------------------------
// License
// ---------------------------------------------------------------------------

static LICENSES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("Frozen ATPL", r"\bfrozen[\s-]*atpl\b"),
        ("ATPL", r"\batpl\b|\bairline[\s-]*transport[\s-]*pilot"),
        ("MPL", r"\bmpl\b|\bmulti[\s-]*crew[\s-]*pilot[\s-]*licen[cs]e"),
        ("CPL", r"\bcpl\b|\bcommercial[\s-]*pilot[\s-]*licen[cs]e"),
        ("PPL", r"\bppl\b"),
    ]
    .into_iter()
    .map(|(label, p)| (label, Regex::new(p).unwrap()))
    .collect()
});

static AUTHORITIES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("EASA", r"\beasa\b"),
        ("UK CAA", r"\buk[\s-]*caa\b|\bcaa[\s-]*uk\b"),
        ("FAA", r"\bfaa\b"),
        ("ICAO", r"\bicao\b"),
        ("CASA", r"\bcasa\b"),
        ("TCCA", r"\btcca\b|\btransport[\s-]*canada\b"),
        ("GCAA", r"\bgcaa\b"),
        ("CAAS", r"\bcaas\b"),
    ]
    .into_iter()
    .map(|(label, p)| (label, Regex::new(p).unwrap()))
    .collect()
});

/// License requirement such as "EASA ATPL"; "ATPL/CPL" when nothing is stated.
pub fn license_required(text: &str) -> String {
    let license = LICENSES
        .iter()
        .find(|(_, p)| p.is_match(text))
        .map(|(label, _)| *label);
    let authority = AUTHORITIES
        .iter()
        .find(|(_, p)| p.is_match(text))
        .map(|(label, _)| *label);

    match (authority, license) {
        (Some(authority), Some(license)) => format!("{authority} {license}"),
        (None, Some(license)) => license.to_string(),
        (Some(authority), None) => format!("{authority} ATPL/CPL"),
        (None, None) => "ATPL/CPL".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Type rating, visa, commuting
// ---------------------------------------------------------------------------

static TYPE_RATING_REQUIRED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"type[\s-]*rat(?:ed|ing)\s*(?:is\s*)?(?:required|mandatory|essential)",
        r"must\s*(?:have|hold|be)[^.;]{0,60}type[\s-]*rat",
        r"current\s*(?:and\s*valid\s*)?type[\s-]*rat",
        r"valid\s*type[\s-]*rating\s*(?:on|for)",
        r"\btype[\s-]*rated\s*(?:captain|first\s*officer|pilot|candidates?)\s*only",
    ])
});

static TYPE_RATING_PROVIDED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"type[\s-]*rat(?:ed|ing)[^.;]{0,40}(?:will\s*be\s*)?(?:provided|funded|sponsored|paid)",
        r"(?:we\s*)?(?:will\s*)?(?:provide|fund|sponsor)[^.;]{0,40}type[\s-]*rat",
        r"type[\s-]*rating\s*training\s*(?:will\s*be\s*)?provided",
        r"non[\s-]*type[\s-]*rated[^.;]{0,40}(?:welcome|accepted|considered)",
    ])
});

static VISA: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"visa\s*(?:sponsorship|sponsored|support)",
        r"sponsor(?:ed|ship)?\s*(?:for\s*)?(?:your\s*)?visa",
        r"work\s*permit\s*(?:will\s*be\s*)?(?:provided|sponsored|support)",
        r"relocation\s*(?:assistance|support|package)",
        r"will\s*sponsor",
        r"sponsorship\s*(?:is\s*)?available",
        r"international\s*(?:candidates?|applicants?)\s*(?:are\s*)?(?:welcome|considered|accepted)",
        r"no\s*(?:visa|work\s*permit)\s*restrictions",
    ])
});

static NO_VISA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:no|not|unable\s*to|cannot|can't|will\s*not)\s*(?:offer\s*|provide\s*)?(?:visa\s*)?sponsor",
    )
    .unwrap()
});

static COMMUTING: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"home[\s-]*bas(?:ed|ing)",
        r"commut(?:ing|er)\s*(?:contract|roster|pattern)",
        r"roster[\s:]*\d+[\s/]+\d+",
    ])
});

pub fn type_rating_required(text: &str) -> bool {
    any_match(&TYPE_RATING_REQUIRED, text)
}

pub fn type_rating_provided(text: &str) -> bool {
    any_match(&TYPE_RATING_PROVIDED, text)
}

/// Explicit refusals ("we do not sponsor visas") override positive signals.
pub fn visa_sponsorship(text: &str) -> bool {
    !NO_VISA.is_match(text) && any_match(&VISA, text)
}

pub fn commuting_contract(text: &str) -> bool {
    any_match(&COMMUTING, text)
}

// ---------------------------------------------------------------------------
// Contract and entry level
// ---------------------------------------------------------------------------

static CONTRACTS: LazyLock<Vec<(ContractType, Vec<Regex>)>> = LazyLock::new(|| {
    vec![
        (
            ContractType::Permanent,
            compile(&[r"\bpermanent\b", r"\bfull[\s-]*time\b", r"\bdirect[\s-]*hire\b"]),
        ),
        (
            ContractType::Contract,
            compile(&[r"\bcontract\b", r"\bfixed[\s-]*term\b", r"\btemporary\b"]),
        ),
        (
            ContractType::Seasonal,
            compile(&[r"\bseasonal\b", r"\bsummer\b", r"\bwinter\b"]),
        ),
        (
            ContractType::Freelance,
            compile(&[r"\bfreelance\b", r"\bpart[\s-]*time\b"]),
        ),
    ]
});

/// Contract priority: permanent > contract > seasonal > freelance, default permanent.
pub fn contract_type(text: &str) -> ContractType {
    CONTRACTS
        .iter()
        .find(|(_, patterns)| any_match(patterns, text))
        .map(|(contract, _)| *contract)
        .unwrap_or(ContractType::Permanent)
}

static ENTRY_LEVEL: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"\bcadets?\b",
        r"\bab[\s-]*initio\b",
        r"\btrainee\b",
        r"no\s*(?:prior\s*)?(?:flying\s*)?experience\s*(?:is\s*)?(?:required|needed|necessary)",
        r"\bzero[\s-]*(?:hours?|time|experience)\b",
        r"\blow[\s-]*hours?\b",
    ])
});

/// High-confidence entry-level keywords only. Type-rating wording is not a signal.
pub fn entry_level_keywords(text: &str) -> bool {
    any_match(&ENTRY_LEVEL, text)
}

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

static REGIONS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    let table: &[(&str, &[&str])] = &[
        (
            "middle_east",
            &[
                "uae", "dubai", "abu dhabi", "sharjah", "qatar", "doha", "saudi", "riyadh",
                "jeddah", "bahrain", "oman", "muscat", "kuwait", "jordan", "amman", "israel",
            ],
        ),
        (
            "europe",
            &[
                "uk", "united kingdom", "england", "london", "ireland", "dublin", "germany",
                "frankfurt", "munich", "france", "paris", "spain", "madrid", "barcelona", "italy",
                "rome", "milan", "netherlands", "amsterdam", "switzerland", "zurich", "geneva",
                "austria", "vienna", "belgium", "brussels", "portugal", "lisbon", "poland",
                "warsaw", "norway", "oslo", "sweden", "stockholm", "denmark", "copenhagen",
                "finland", "helsinki", "iceland", "turkey", "istanbul", "greece", "athens",
                "malta", "luxembourg", "europe",
            ],
        ),
        (
            "asia",
            &[
                "singapore", "hong kong", "china", "beijing", "shanghai", "japan", "tokyo",
                "korea", "seoul", "taiwan", "taipei", "thailand", "bangkok", "vietnam", "hanoi",
                "malaysia", "kuala lumpur", "indonesia", "jakarta", "philippines", "manila",
                "india", "delhi", "mumbai", "asia",
            ],
        ),
        (
            "oceania",
            &[
                "australia", "sydney", "melbourne", "brisbane", "perth", "new zealand",
                "auckland", "fiji",
            ],
        ),
        (
            "south_america",
            &[
                "brazil", "sao paulo", "são paulo", "argentina", "buenos aires", "chile",
                "santiago", "colombia", "bogota", "peru", "lima",
            ],
        ),
        (
            "north_america",
            &[
                "usa", "united states", "america", "new york", "chicago", "dallas", "atlanta",
                "miami", "los angeles", "seattle", "canada", "toronto", "vancouver", "montreal",
                "calgary", "mexico",
            ],
        ),
        (
            "africa",
            &[
                "south africa", "johannesburg", "cape town", "kenya", "nairobi", "ethiopia",
                "addis ababa", "nigeria", "lagos", "egypt", "cairo", "morocco", "casablanca",
                "rwanda", "africa",
            ],
        ),
    ];
    table
        .iter()
        .map(|(region, keywords)| {
            let alternatives = keywords
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            (*region, Regex::new(&format!(r"\b(?:{alternatives})\b")).unwrap())
        })
        .collect()
});

/// Region from location text, else the target's hint, else `global`.
pub fn infer_region(location: &str, hint: Option<&str>) -> String {
    let location = location.to_lowercase();
    REGIONS
        .iter()
        .find(|(_, pattern)| pattern.is_match(&location))
        .map(|(region, _)| (*region).to_string())
        .or_else(|| {
            hint.map(str::trim)
                .filter(|h| !h.is_empty())
                .map(|h| h.to_lowercase().replace([' ', '-'], "_"))
        })
        .unwrap_or_else(|| "global".to_string())
}

// ---------------------------------------------------------------------------
// Title and location cleanup
// ---------------------------------------------------------------------------

static TITLE_REWRITES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)\bf/o\b", "First Officer"),
        (r"(?i)\b(?:capt|cpt)\b\.?", "Captain"),
        (r"(?i)\bco[\s-]?pilot\b", "First Officer"),
        (r"\bSFO\b", "Senior First Officer"),
        (r"\bNTR\b", "Non-Type Rated"),
        (r"\bTR\b", "Type Rated"),
        (r"\bDE\b", "Direct Entry"),
    ]
    .into_iter()
    .map(|(p, replacement)| (Regex::new(p).unwrap(), replacement))
    .collect()
});

/// Expand rank abbreviations and tidy whitespace. Case-sensitive for the
/// all-caps abbreviations so ordinary words ("de", "tr") survive.
pub fn clean_title(title: &str) -> String {
    let mut cleaned = collapse_whitespace(title);
    for (pattern, replacement) in TITLE_REWRITES.iter() {
        cleaned = pattern.replace_all(&cleaned, *replacement).into_owned();
    }
    cleaned
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '|' | '–' | ':'))
        .to_string()
}

static LOCATION_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:based\s+(?:in|at|out\s+of)|location|base)\b\s*:?\s*").unwrap()
});

pub const DEFAULT_LOCATION: &str = "Multiple Locations";

/// Strip "Based in"/"Location:" prefixes; empty input becomes [`DEFAULT_LOCATION`].
pub fn clean_location(location: &str) -> String {
    let collapsed = collapse_whitespace(location);
    let stripped = LOCATION_PREFIX.replace(&collapsed, "");
    let trimmed = stripped.trim_matches(|c: char| c.is_whitespace() || c == ',');
    if trimmed.is_empty() {
        DEFAULT_LOCATION.to_string()
    } else {
        trimmed.to_string()
    }
}

// ---------------------------------------------------------------------------
// Junk title sweep
// ---------------------------------------------------------------------------

static JUNK_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:faq|faqs|login|log\s*in|sign\s*in|sign\s*up|register|game|games|mobile\s*app|policy|privacy|cookies?|terms\s*(?:of\s*use|and\s*conditions))\b",
    )
    .unwrap()
});

/// Final safety net over the resulting title.
pub fn is_junk_title(title: &str) -> bool {
    JUNK_TITLE.is_match(title)
}
