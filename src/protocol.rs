//! The disambiguation protocol.
//!
//! A thin, stateless state machine between resolver output and a
//! conversational clarification step. Each call runs
//! `Start → CandidatesGenerated → {Resolved | AwaitingClarification |
//! Failed}` and returns the terminal state; nothing is retained between
//! calls. A follow-up answer is handled by re-invoking the protocol with
//! the narrowed text the caller chose — session memory belongs to the chat
//! layer, not this engine.

use serde::{Deserialize, Serialize};

use crate::confidence::Confidence;
use crate::location::resolver::LocationResolver;
use crate::location::types::{CanonicalLocation, ResolutionResult};

/// One clarification option presented to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarificationOption {
    /// The candidate location.
    pub location: CanonicalLocation,

    /// Properties matching the queried unit under this candidate.
    pub matched_unit_count: usize,

    /// A ready-to-send disambiguating phrase, e.g. `"905 at Seven Palm"`.
    pub example_phrase: String,
}

/// Terminal state of one protocol run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisambiguationOutcome {
    /// Exactly one candidate cleared threshold; if a unit was given, the
    /// store confirmed at least one real match.
    Resolved {
        /// The resolved location.
        location: CanonicalLocation,
        /// Certainty of the resolution.
        confidence: Confidence,
    },

    /// Two or more candidates tied; the caller should ask the user to pick
    /// using one of the example phrases.
    AwaitingClarification {
        /// Every plausible candidate.
        options: Vec<ClarificationOption>,
        /// A suggested clarification question.
        prompt: String,
    },

    /// No candidate and no store fallback.
    Failed {
        /// A suggested rephrase prompt.
        prompt: String,
    },
}

/// Runs one resolution through the protocol.
///
/// Transitions:
/// - `CandidatesGenerated → Resolved` — one candidate cleared and (with a
///   unit) the store confirms ≥ 1 match. A store outage during
///   confirmation degrades to `Resolved`; outage is not evidence against
///   the match.
/// - `CandidatesGenerated → AwaitingClarification` — candidates tied
///   within epsilon, or a bare unit exists in several buildings.
/// - `CandidatesGenerated → Failed` — nothing cleared, or the store has no
///   record of the unit at the single resolved location.
#[must_use]
pub fn disambiguate(
    resolver: &LocationResolver,
    free_text: &str,
    unit: Option<&str>,
) -> DisambiguationOutcome {
    match resolver.resolve_location(free_text, unit) {
        ResolutionResult::Resolved {
            location,
            confidence,
        } => {
            if let Some(unit) = unit {
                match resolver.unit_match_count(&location, unit) {
                    Ok(0) => {
                        return DisambiguationOutcome::Failed {
                            prompt: format!(
                                "No record of unit {unit} at {location}. \
                                 Try a different unit or location."
                            ),
                        };
                    }
                    Ok(_) | Err(_) => {}
                }
            }
            DisambiguationOutcome::Resolved {
                location,
                confidence,
            }
        }

        ResolutionResult::Ambiguous { candidates } => {
            let options: Vec<ClarificationOption> = candidates
                .into_iter()
                .map(|c| ClarificationOption {
                    location: c.location,
                    matched_unit_count: c.matched_unit_count,
                    example_phrase: c.example_phrase,
                })
                .collect();
            let phrases: Vec<&str> = options
                .iter()
                .map(|o| o.example_phrase.as_str())
                .collect();
            let prompt = format!(
                "Several locations match. Which did you mean? For example: {}.",
                phrases.join(" / ")
            );
            DisambiguationOutcome::AwaitingClarification { options, prompt }
        }

        ResolutionResult::Unresolved => DisambiguationOutcome::Failed {
            prompt: "I couldn't match that to a known community or building. \
                     Could you rephrase with a more specific name?"
                .to_string(),
        },
    }
}
