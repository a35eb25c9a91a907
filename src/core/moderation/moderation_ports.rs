// Storage traits (ports) for the moderation engine.
//
// The engine owns votes and decisions; content items and voter identities
// belong to other parts of the system and are reached through the two
// directory traits below. Implementations live in infra/.

use super::moderation_error::ModerationError;
use super::moderation_models::{
    ContentItem, DecisionOutcome, ModerationDecision, Vote, VoteWrite,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Persistence for the vote ledger.
#[async_trait]
pub trait VoteStore: Send + Sync {
    /// Insert the vote for (content_id, voter_id) or update it in place.
    ///
    /// Must be a single atomic write keyed by the pair so that two racing
    /// first votes from the same voter leave exactly one row. The stored row
    /// is always active afterwards and keeps its original `created_at`.
    async fn upsert_vote(&self, vote: VoteWrite) -> Result<Vote, ModerationError>;

    /// Mark an existing vote inactive. `None` if the voter never voted.
    async fn deactivate_vote(
        &self,
        content_id: u64,
        voter_id: u64,
        at: DateTime<Utc>,
    ) -> Result<Option<Vote>, ModerationError>;

    async fn get_vote(
        &self,
        content_id: u64,
        voter_id: u64,
    ) -> Result<Option<Vote>, ModerationError>;

    /// All votes on a content item, newest first.
    async fn votes_for_content(&self, content_id: u64) -> Result<Vec<Vote>, ModerationError>;

    /// Content items that hold at least one REMOVE vote, ascending by id.
    async fn contested_content(&self) -> Result<Vec<u64>, ModerationError>;
}

/// Persistence for moderation decisions.
#[async_trait]
pub trait DecisionStore: Send + Sync {
    /// Insert `decision` unless one already exists for its content id, and
    /// archive the content item at `decided_at` in the same atomic unit.
    ///
    /// Either both writes land or neither does. The existing row is returned
    /// untouched in the `AlreadyRecorded` case and content is left alone.
    async fn record_and_archive(
        &self,
        decision: &ModerationDecision,
    ) -> Result<DecisionOutcome, ModerationError>;

    async fn get_decision(
        &self,
        content_id: u64,
    ) -> Result<Option<ModerationDecision>, ModerationError>;

    /// Decisions newest first, optionally only those that archived content.
    async fn list_decisions(
        &self,
        archived_only: bool,
    ) -> Result<Vec<ModerationDecision>, ModerationError>;
}

/// Read access to content items plus the one write the engine is granted.
#[async_trait]
pub trait ContentDirectory: Send + Sync {
    async fn get_content(&self, content_id: u64) -> Result<Option<ContentItem>, ModerationError>;

    /// Flag the item archived.
    ///
    /// Idempotent: `archived_at` only ever moves forward, so a repeated call
    /// with an earlier timestamp leaves the stored one in place.
    async fn set_archived(
        &self,
        content_id: u64,
        at: DateTime<Utc>,
    ) -> Result<ContentItem, ModerationError>;
}

/// Identity lookups.
#[async_trait]
pub trait VoterDirectory: Send + Sync {
    async fn voter_exists(&self, voter_id: u64) -> Result<bool, ModerationError>;
}
