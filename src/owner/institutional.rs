//! Institutional owner detection.
//!
//! Developers, banks, lenders, and government bodies show up on thousands
//! of transaction sides under near-identical names. Fuzzy person-style
//! merging would happily glue "EMAAR PROPERTIES" to "EMAAR PROPERTIES 2"
//! and every bank to every other bank, so institutional names are routed
//! to exact-name buckets and never enter similarity linkage.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of an institutional owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstitutionalCategory {
    /// Property developer or general real-estate company.
    Developer,

    /// Bank or finance house.
    Bank,

    /// Leasing or fund vehicle.
    Lender,

    /// Government body.
    Government,

    /// Corporate entity recognized only by its legal form.
    Corporate,
}

impl fmt::Display for InstitutionalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Developer => write!(f, "developer"),
            Self::Bank => write!(f, "bank"),
            Self::Lender => write!(f, "lender"),
            Self::Government => write!(f, "government"),
            Self::Corporate => write!(f, "corporate"),
        }
    }
}

const BANK_KEYWORDS: &[&str] = &["BANK", "FINANCE", "CREDIT", "CAPITAL", "ISLAMIC", "MORTGAGE"];

const LENDER_KEYWORDS: &[&str] = &["LEASING", "FUND", "FUNDING", "LENDER"];

const DEVELOPER_KEYWORDS: &[&str] = &[
    "DEVELOPER",
    "PROPERTIES",
    "PROPERTY",
    "HOLDING",
    "ESTATE",
    "INVEST",
    "PROJECT",
    "CONTRACTING",
    "COMMUNITIES",
    "HOMES",
];

const GOVERNMENT_KEYWORDS: &[&str] = &[
    "GOVERNMENT",
    "MUNICIPALITY",
    "MINISTRY",
    "AUTHORITY",
    "DEPARTMENT",
];

/// Legal-form tokens that mark a corporate entity even without a sector
/// keyword. Checked against whole tokens, not substrings, so "CALLC" in a
/// person's name cannot trigger.
const CORPORATE_TOKENS: &[&str] = &["LLC", "PJSC", "PSC", "FZE", "FZCO", "LTD", "LIMITED"];

/// Classifies an owner name, returning `None` for individuals.
///
/// Runs on the raw (uppercased) name, before legal suffixes are stripped:
/// the suffix is itself a signal.
#[must_use]
pub fn classify(raw_name: &str) -> Option<InstitutionalCategory> {
    let upper = raw_name.to_uppercase().replace('.', "");

    let contains_any = |keywords: &[&str]| keywords.iter().any(|k| upper.contains(k));

    if contains_any(GOVERNMENT_KEYWORDS) {
        return Some(InstitutionalCategory::Government);
    }
    if contains_any(BANK_KEYWORDS) {
        return Some(InstitutionalCategory::Bank);
    }
    if contains_any(LENDER_KEYWORDS) {
        return Some(InstitutionalCategory::Lender);
    }
    if contains_any(DEVELOPER_KEYWORDS) {
        return Some(InstitutionalCategory::Developer);
    }

    let has_corporate_token = upper
        .split(|c: char| !c.is_alphanumeric())
        .any(|t| CORPORATE_TOKENS.contains(&t));
    if has_corporate_token {
        return Some(InstitutionalCategory::Corporate);
    }

    None
}
