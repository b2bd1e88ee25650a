//! Free-text query span extraction.
//!
//! Chat queries like `"Who owns 905 at Seven Palm?"` carry a unit token and
//! a location span tangled into a sentence. This module pulls them apart so
//! the resolver can look each span up on its own. Trailing sentence
//! punctuation is stripped from the whole query and from every extracted
//! span; it must never leak into alias lookups.

use std::sync::OnceLock;

use regex::Regex;

use crate::text::strip_trailing_punctuation;

/// Unit and location spans extracted from one free-text query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    /// Unit identifier, e.g. `"905"` or `"PH-02"`.
    pub unit: Option<String>,

    /// Primary location span, e.g. `"Seven Palm"`.
    pub location: Option<String>,

    /// Secondary span after a second connector, e.g. the community in
    /// `"905 at Seven Palm in Palm Jumeirah"`.
    pub secondary: Option<String>,
}

fn patterns() -> &'static Vec<Regex> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)\bunit\s+(?P<unit>[A-Za-z0-9\-]+)\s+(?:at|in)\s+(?P<location>.+)",
            r"(?i)\b(?P<unit>[A-Za-z]{0,3}-?[0-9][A-Za-z0-9\-]*)\s+(?:at|in)\s+(?P<location>.+)",
            r"(?i)\bunit\s+(?P<unit>[A-Za-z0-9\-]+)",
            r"(?i)\bapt\s+(?P<unit>[A-Za-z0-9\-]+)",
            r"(?i)\bapartment\s+(?P<unit>[A-Za-z0-9\-]+)",
            r"(?i)\bvilla\s+(?P<unit>[A-Za-z0-9\-]+)",
            r"(?i)^(?P<unit>[A-Za-z]{0,3}-?[0-9][A-Za-z0-9\-]*)\s+(?P<location>[A-Za-z].+)$",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("query pattern must compile"))
        .collect()
    })
}

/// Extracts unit/location spans from a free-text property query.
///
/// Patterns are tried in priority order; the first hit wins. A location
/// span containing a second connector (`in`, `at`, `@`) is split into the
/// primary and secondary spans.
#[must_use]
pub fn parse_property_query(query: &str) -> ParsedQuery {
    let mut result = ParsedQuery::default();
    let cleaned = strip_trailing_punctuation(query);
    if cleaned.is_empty() {
        return result;
    }

    for pattern in patterns() {
        let Some(captures) = pattern.captures(cleaned) else {
            continue;
        };

        if let Some(unit) = captures.name("unit") {
            result.unit = Some(unit.as_str().trim().to_string());
        }

        if let Some(location) = captures.name("location") {
            let connector =
                connector_splitter();
            let mut spans = connector
                .split(location.as_str())
                .map(|s| strip_trailing_punctuation(s).to_string())
                .filter(|s| !s.is_empty());
            result.location = spans.next();
            result.secondary = spans.next();
        }
        break;
    }

    result
}

fn connector_splitter() -> &'static Regex {
    static CONNECTOR: OnceLock<Regex> = OnceLock::new();
    CONNECTOR.get_or_init(|| {
        Regex::new(r"(?i)\s+(?:in|at|@)\s+|,\s*").expect("connector pattern must compile")
    })
}
