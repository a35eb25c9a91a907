// Vote ledger - one live vote per (content, voter).
//
// The ledger validates a vote, checks both referenced entities exist, then
// hands the write to the store as a single upsert. It does not evaluate
// archival; callers do that explicitly after a successful write.

use super::moderation_error::ModerationError;
use super::moderation_models::{
    from_cents, now, to_cents, Vote, VoteKind, VoteWrite, MAX_WEIGHT_CENTS,
};
use super::moderation_ports::{ContentDirectory, VoteStore, VoterDirectory};
use bigdecimal::BigDecimal;
use std::sync::Arc;

/// Weight used when a caller does not pick one (1.00).
pub const DEFAULT_WEIGHT_CENTS: i64 = 100;

pub fn default_weight() -> BigDecimal {
    from_cents(DEFAULT_WEIGHT_CENTS)
}

/// Check a weight fits the ledger's fixed-point column and rescale it to two places.
///
/// Zero and negative weights are valid votes; they just never count.
pub fn validate_weight(weight: &BigDecimal) -> Result<BigDecimal, ModerationError> {
    let cents = to_cents(weight).ok_or_else(|| {
        ModerationError::InvalidVote(format!(
            "weight {} must have at most two decimal places",
            weight
        ))
    })?;

    if cents.abs() > MAX_WEIGHT_CENTS {
        return Err(ModerationError::InvalidVote(format!(
            "weight {} is outside the allowed range of ±{}",
            weight,
            from_cents(MAX_WEIGHT_CENTS)
        )));
    }

    Ok(from_cents(cents))
}

pub struct VoteLedger {
    store: Arc<dyn VoteStore>,
    voters: Arc<dyn VoterDirectory>,
    content: Arc<dyn ContentDirectory>,
}

impl VoteLedger {
    pub fn new(
        store: Arc<dyn VoteStore>,
        voters: Arc<dyn VoterDirectory>,
        content: Arc<dyn ContentDirectory>,
    ) -> Self {
        Self {
            store,
            voters,
            content,
        }
    }

    /// Record `voter_id`'s vote on `content_id`, replacing any earlier one.
    ///
    /// Re-voting always reactivates the vote.
    pub async fn cast_vote(
        &self,
        content_id: u64,
        voter_id: u64,
        kind: VoteKind,
        weight: &BigDecimal,
    ) -> Result<Vote, ModerationError> {
        let weight = validate_weight(weight)?;
        self.ensure_references(content_id, voter_id).await?;

        let vote = self
            .store
            .upsert_vote(VoteWrite {
                content_id,
                voter_id,
                kind,
                weight,
                at: now(),
            })
            .await?;

        tracing::debug!(
            content_id,
            voter_id,
            kind = %vote.kind,
            weight = %vote.weight,
            revote = vote.created_at != vote.updated_at,
            "Vote recorded"
        );
        Ok(vote)
    }

    /// Deactivate a voter's vote. The row stays; it just stops counting.
    pub async fn withdraw_vote(
        &self,
        content_id: u64,
        voter_id: u64,
    ) -> Result<Vote, ModerationError> {
        self.ensure_references(content_id, voter_id).await?;

        let vote = self
            .store
            .deactivate_vote(content_id, voter_id, now())
            .await?
            .ok_or(ModerationError::VoteNotFound {
                content_id,
                voter_id,
            })?;

        tracing::debug!(content_id, voter_id, "Vote withdrawn");
        Ok(vote)
    }

    pub async fn get_vote(
        &self,
        content_id: u64,
        voter_id: u64,
    ) -> Result<Option<Vote>, ModerationError> {
        self.store.get_vote(content_id, voter_id).await
    }

    pub async fn votes_for(&self, content_id: u64) -> Result<Vec<Vote>, ModerationError> {
        self.store.votes_for_content(content_id).await
    }

    pub async fn contested_content(&self) -> Result<Vec<u64>, ModerationError> {
        self.store.contested_content().await
    }

    async fn ensure_references(
        &self,
        content_id: u64,
        voter_id: u64,
    ) -> Result<(), ModerationError> {
        if self.content.get_content(content_id).await?.is_none() {
            return Err(ModerationError::UnknownContent(content_id));
        }
        if !self.voters.voter_exists(voter_id).await? {
            return Err(ModerationError::UnknownVoter(voter_id));
        }
        Ok(())
    }
}
