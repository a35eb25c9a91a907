// Moderation domain models - votes, decisions and the content fields we touch.
//
// These are pure domain types with no storage dependencies.
// Weights and thresholds are fixed-point decimals with two fractional digits;
// storage adapters keep them as integer hundredths so sums stay exact.

use super::moderation_error::ModerationError;
use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of fractional digits carried by weights and thresholds.
pub const DECIMAL_PLACES: i64 = 2;

/// Largest absolute vote weight, in hundredths (999.99).
pub const MAX_WEIGHT_CENTS: i64 = 99_999;

/// Largest removal threshold, in hundredths (9999.99).
pub const MAX_THRESHOLD_CENTS: i64 = 999_999;

/// What a voter is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    /// Hide the content. Recorded, but never counts toward removal.
    Hide,
    /// Remove the content. The only kind the threshold looks at.
    Remove,
}

impl VoteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteKind::Hide => "hide",
            VoteKind::Remove => "remove",
        }
    }
}

impl fmt::Display for VoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteKind {
    type Err = ModerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hide" => Ok(VoteKind::Hide),
            "remove" => Ok(VoteKind::Remove),
            other => Err(ModerationError::InvalidVote(format!(
                "unknown vote kind '{}', expected 'hide' or 'remove'",
                other
            ))),
        }
    }
}

/// One voter's live opinion on one content item.
///
/// There is at most one of these per (content_id, voter_id); re-voting
/// updates the row in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub content_id: u64,
    pub voter_id: u64,
    pub kind: VoteKind,
    pub weight: BigDecimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated vote write handed to the ledger store.
#[derive(Debug, Clone)]
pub struct VoteWrite {
    pub content_id: u64,
    pub voter_id: u64,
    pub kind: VoteKind,
    pub weight: BigDecimal,
    pub at: DateTime<Utc>,
}

/// Immutable record of the moment a content item crossed the removal threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationDecision {
    pub content_id: u64,
    /// Counted weight observed by the evaluation that wrote this decision.
    pub total_weight: BigDecimal,
    /// Threshold in force for that evaluation.
    pub threshold: BigDecimal,
    pub archived: bool,
    pub decided_at: DateTime<Utc>,
}

/// The slice of an external content item the engine may read and flip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: u64,
    pub archived: bool,
    pub archived_at: Option<DateTime<Utc>>,
}

/// Result of the recorder's atomic check-and-insert.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "decision", rename_all = "snake_case")]
pub enum DecisionOutcome {
    /// A decision already existed; it was left untouched.
    AlreadyRecorded(ModerationDecision),
    /// This call wrote the decision and archived the content.
    NewlyRecorded(ModerationDecision),
}

impl DecisionOutcome {
    pub fn decision(&self) -> &ModerationDecision {
        match self {
            DecisionOutcome::AlreadyRecorded(d) | DecisionOutcome::NewlyRecorded(d) => d,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, DecisionOutcome::NewlyRecorded(_))
    }
}

/// Per-item moderation state. `Archived` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationState {
    UnderReview,
    Archived,
}

/// What a single evaluation saw and did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub content_id: u64,
    pub counted_weight: BigDecimal,
    pub threshold: BigDecimal,
    pub state: ModerationState,
    /// Present only when this evaluation crossed the threshold.
    pub decision: Option<DecisionOutcome>,
}

impl Evaluation {
    pub fn newly_archived(&self) -> bool {
        self.decision.as_ref().is_some_and(DecisionOutcome::is_new)
    }
}

/// A committed vote together with the evaluation that followed it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoteReceipt {
    pub vote: Vote,
    pub evaluation: Evaluation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepFailure {
    pub content_id: u64,
    pub reason: String,
}

/// Summary of one retry sweep over contested content.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepReport {
    pub evaluated: usize,
    pub newly_archived: Vec<u64>,
    pub failures: Vec<SweepFailure>,
}

// ============================================================================
// DECIMAL HELPERS
// ============================================================================

/// Convert a decimal to integer hundredths.
///
/// Returns `None` when the value carries more than two fractional digits
/// or does not fit in an `i64`.
pub fn to_cents(value: &BigDecimal) -> Option<i64> {
    let (digits, exponent) = value.normalized().as_bigint_and_exponent();
    if exponent > DECIMAL_PLACES {
        return None;
    }
    let digits = digits.to_i64()?;
    let factor = 10i64.checked_pow(u32::try_from(DECIMAL_PLACES - exponent).ok()?)?;
    digits.checked_mul(factor)
}

/// Build a two-place decimal from integer hundredths.
pub fn from_cents(cents: i64) -> BigDecimal {
    BigDecimal::new(cents.into(), DECIMAL_PLACES)
}

/// `0.00`
pub fn zero_weight() -> BigDecimal {
    BigDecimal::zero().with_scale(DECIMAL_PLACES)
}

/// Current time at the precision the stores persist (microseconds).
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
