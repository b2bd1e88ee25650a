//! Text normalization and string similarity.
//!
//! Every free-text comparison in the engine goes through [`normalize_text`]
//! first, so "Séven  Palm!" and "seven palm" land on the same key. The
//! similarity score combines token-set overlap with a normalized edit
//! distance; both inputs must already be normalized.

use std::collections::HashSet;

use strsim::normalized_levenshtein;

/// Trailing sentence punctuation that chat input routinely carries.
///
/// Stripped from whole queries and extracted sub-spans before any alias
/// lookup; "Seven Palm?" must hit the same key as "Seven Palm".
pub const SENTENCE_PUNCTUATION: &[char] = &['?', '!', '.', ',', ';', ':'];

/// Strips trailing sentence punctuation and surrounding whitespace.
#[must_use]
pub fn strip_trailing_punctuation(text: &str) -> &str {
    text.trim().trim_end_matches(SENTENCE_PUNCTUATION).trim_end()
}

/// Normalizes free text for matching: case-fold, fold Latin diacritics to
/// ASCII, drop punctuation, collapse whitespace.
///
/// Idempotent: `normalize_text(normalize_text(x)) == normalize_text(x)`.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for ch in text.chars() {
        match fold_diacritic(ch) {
            Some(folded) => {
                for ch in folded.chars() {
                    push_normalized(&mut out, ch, &mut pending_space);
                }
            }
            None => {
                for ch in ch.to_lowercase() {
                    push_normalized(&mut out, ch, &mut pending_space);
                }
            }
        }
    }
    out
}

fn push_normalized(out: &mut String, ch: char, pending_space: &mut bool) {
    if ch.is_alphanumeric() {
        if *pending_space && !out.is_empty() {
            out.push(' ');
        }
        *pending_space = false;
        out.push(ch);
    } else {
        *pending_space = true;
    }
}

/// Splits normalized text into whitespace tokens.
#[must_use]
pub fn tokenize(normalized: &str) -> Vec<&str> {
    normalized.split_whitespace().collect()
}

/// Similarity between two normalized strings in `[0.0, 1.0]`.
///
/// The greater of token-set Jaccard overlap and a normalized Levenshtein
/// ratio. Token overlap rewards reordered multi-word names ("palm seven"
/// vs "seven palm"); the edit ratio catches misspellings ("mohamed" vs
/// "mohammed") that break exact token equality. Taking the stronger signal
/// keeps each tolerant failure mode from dragging the other down.
#[must_use]
pub fn similarity(a: &str, b: &str) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    let overlap = token_overlap(a, b);
    #[allow(clippy::cast_possible_truncation)]
    let edit = normalized_levenshtein(a, b) as f32;
    overlap.max(edit)
}

/// Jaccard overlap between the token sets of two normalized strings.
#[must_use]
pub fn token_overlap(a: &str, b: &str) -> f32 {
    let set_a: HashSet<&str> = a.split_whitespace().collect();
    let set_b: HashSet<&str> = b.split_whitespace().collect();
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }
    let shared = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    #[allow(clippy::cast_precision_loss)]
    {
        shared as f32 / union as f32
    }
}

/// Folds common Latin diacritics to their ASCII base; `None` passes the
/// character through to plain lowercasing.
fn fold_diacritic(ch: char) -> Option<&'static str> {
    Some(match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "a",
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => "i",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => "o",
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => "u",
        'ý' | 'ÿ' | 'Ý' => "y",
        'ñ' | 'Ñ' => "n",
        'ç' | 'Ç' => "c",
        'ß' => "ss",
        'æ' | 'Æ' => "ae",
        'ø' | 'Ø' => "o",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_trailing_punctuation() {
        assert_eq!(strip_trailing_punctuation("Seven Palm?"), "Seven Palm");
        assert_eq!(strip_trailing_punctuation("Seven Palm?! "), "Seven Palm");
        assert_eq!(strip_trailing_punctuation("  Marina.,;:"), "Marina");
        assert_eq!(strip_trailing_punctuation("no punctuation"), "no punctuation");
    }

    #[test]
    fn test_normalize_text_basic() {
        assert_eq!(normalize_text("Seven Palm"), "seven palm");
        assert_eq!(normalize_text("  SEVEN   PALM  "), "seven palm");
        assert_eq!(normalize_text("Seven-Palm!"), "seven palm");
    }

    #[test]
    fn test_normalize_text_diacritics() {
        assert_eq!(normalize_text("Séven Pàlm"), "seven palm");
        assert_eq!(normalize_text("Müller"), "muller");
    }

    #[test]
    fn test_normalize_text_idempotent() {
        let once = normalize_text("The Address, Downtown!");
        assert_eq!(normalize_text(&once), once);
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("seven palm"), vec!["seven", "palm"]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_similarity_identical() {
        assert_eq!(similarity("seven palm", "seven palm"), 1.0);
    }

    #[test]
    fn test_similarity_empty() {
        assert_eq!(similarity("", "seven palm"), 0.0);
        assert_eq!(similarity("seven palm", ""), 0.0);
    }

    #[test]
    fn test_similarity_misspelling_clears_threshold() {
        // Single-token misspellings lean on the edit ratio.
        let score = similarity("mohammed ahmed", "mohamed ahmed");
        assert!(score > 0.85, "score was {score}");
    }

    #[test]
    fn test_similarity_reordered_tokens() {
        assert_eq!(similarity("palm seven", "seven palm"), 1.0);
    }

    #[test]
    fn test_similarity_shared_forename_stays_below_merge_range() {
        // Different people sharing a forename must not read as the same
        // name.
        let score = similarity("mohammed ahmed", "mohammed khan");
        assert!(score < 0.85, "score was {score}");
    }

    #[test]
    fn test_similarity_unrelated_is_low() {
        let score = similarity("seven palm", "burj khalifa");
        assert!(score < 0.5, "score was {score}");
    }

    #[test]
    fn test_token_overlap() {
        assert_eq!(token_overlap("seven palm", "palm seven"), 1.0);
        assert_eq!(token_overlap("seven palm", "seven hotel"), 1.0 / 3.0);
        assert_eq!(token_overlap("seven palm", "burj khalifa"), 0.0);
    }
}
