// In-memory implementation of every moderation port.
//
// DashMap's entry API gives us the same atomicity the SQLite store gets from
// its unique keys and transactions: the (content, voter) upsert happens
// under one shard lock, and the decision insert runs while the content
// entry is held so the archive flag lands with it.

use crate::core::moderation::{
    ContentDirectory, ContentItem, DecisionOutcome, DecisionStore, ModerationDecision,
    ModerationError, Vote, VoteKind, VoteStore, VoteWrite, VoterDirectory,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};

/// A composite key for looking up a vote.
#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
struct VoteKey {
    content_id: u64,
    voter_id: u64,
}

pub struct InMemoryModerationStore {
    votes: DashMap<VoteKey, Vote>,
    decisions: DashMap<u64, ModerationDecision>,
    content: DashMap<u64, ContentItem>,
    voters: DashSet<u64>,
}

impl InMemoryModerationStore {
    pub fn new() -> Self {
        Self {
            votes: DashMap::new(),
            decisions: DashMap::new(),
            content: DashMap::new(),
            voters: DashSet::new(),
        }
    }

    /// Make a content item known. Existing items are left alone.
    pub fn register_content(&self, content_id: u64) {
        self.content.entry(content_id).or_insert(ContentItem {
            id: content_id,
            archived: false,
            archived_at: None,
        });
    }

    pub fn register_voter(&self, voter_id: u64) {
        self.voters.insert(voter_id);
    }

    /// Delete a content item along with its votes and decision.
    pub fn remove_content(&self, content_id: u64) {
        self.content.remove(&content_id);
        self.votes.retain(|key, _| key.content_id != content_id);
        self.decisions.remove(&content_id);
    }

    /// Delete a voter along with every vote they cast.
    pub fn remove_voter(&self, voter_id: u64) {
        self.voters.remove(&voter_id);
        self.votes.retain(|key, _| key.voter_id != voter_id);
    }
}

#[cfg(test)]
impl InMemoryModerationStore {
    /// Store a decision without touching its content item, as if the
    /// archive write had been lost.
    pub(crate) fn seed_orphan_decision(&self, decision: ModerationDecision) {
        self.decisions.insert(decision.content_id, decision);
    }
}

impl Default for InMemoryModerationStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Only ever move the timestamp forward.
fn mark_archived(item: &mut ContentItem, at: DateTime<Utc>) {
    item.archived = true;
    if item.archived_at.map_or(true, |existing| existing < at) {
        item.archived_at = Some(at);
    }
}

#[async_trait]
impl VoteStore for InMemoryModerationStore {
    async fn upsert_vote(&self, vote: VoteWrite) -> Result<Vote, ModerationError> {
        let key = VoteKey {
            content_id: vote.content_id,
            voter_id: vote.voter_id,
        };

        let stored = self
            .votes
            .entry(key)
            .and_modify(|existing| {
                existing.kind = vote.kind;
                existing.weight = vote.weight.clone();
                existing.active = true;
                existing.updated_at = vote.at;
            })
            .or_insert_with(|| Vote {
                content_id: vote.content_id,
                voter_id: vote.voter_id,
                kind: vote.kind,
                weight: vote.weight.clone(),
                active: true,
                created_at: vote.at,
                updated_at: vote.at,
            });

        Ok(stored.value().clone())
    }

    async fn deactivate_vote(
        &self,
        content_id: u64,
        voter_id: u64,
        at: DateTime<Utc>,
    ) -> Result<Option<Vote>, ModerationError> {
        let key = VoteKey {
            content_id,
            voter_id,
        };

        Ok(self.votes.get_mut(&key).map(|mut vote| {
            vote.active = false;
            vote.updated_at = at;
            vote.clone()
        }))
    }

    async fn get_vote(
        &self,
        content_id: u64,
        voter_id: u64,
    ) -> Result<Option<Vote>, ModerationError> {
        let key = VoteKey {
            content_id,
            voter_id,
        };
        Ok(self.votes.get(&key).map(|vote| vote.clone()))
    }

    async fn votes_for_content(&self, content_id: u64) -> Result<Vec<Vote>, ModerationError> {
        let mut votes: Vec<Vote> = self
            .votes
            .iter()
            .filter(|entry| entry.key().content_id == content_id)
            .map(|entry| entry.value().clone())
            .collect();

        // Newest first
        votes.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(a.voter_id.cmp(&b.voter_id))
        });
        Ok(votes)
    }

    async fn contested_content(&self) -> Result<Vec<u64>, ModerationError> {
        let mut ids: Vec<u64> = self
            .votes
            .iter()
            .filter(|entry| entry.value().kind == VoteKind::Remove)
            .map(|entry| entry.key().content_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }
}

#[async_trait]
impl DecisionStore for InMemoryModerationStore {
    async fn record_and_archive(
        &self,
        decision: &ModerationDecision,
    ) -> Result<DecisionOutcome, ModerationError> {
        // Holding the content entry while touching the decision map keeps the
        // two writes together. Nothing locks them in the opposite order.
        let mut item = self
            .content
            .get_mut(&decision.content_id)
            .ok_or(ModerationError::UnknownContent(decision.content_id))?;

        match self.decisions.entry(decision.content_id) {
            Entry::Occupied(existing) => {
                Ok(DecisionOutcome::AlreadyRecorded(existing.get().clone()))
            }
            Entry::Vacant(slot) => {
                slot.insert(decision.clone());
                mark_archived(&mut item, decision.decided_at);
                Ok(DecisionOutcome::NewlyRecorded(decision.clone()))
            }
        }
    }

    async fn get_decision(
        &self,
        content_id: u64,
    ) -> Result<Option<ModerationDecision>, ModerationError> {
        Ok(self.decisions.get(&content_id).map(|d| d.clone()))
    }

    async fn list_decisions(
        &self,
        archived_only: bool,
    ) -> Result<Vec<ModerationDecision>, ModerationError> {
        let mut decisions: Vec<ModerationDecision> = self
            .decisions
            .iter()
            .filter(|entry| !archived_only || entry.value().archived)
            .map(|entry| entry.value().clone())
            .collect();

        decisions.sort_by(|a, b| {
            b.decided_at
                .cmp(&a.decided_at)
                .then(a.content_id.cmp(&b.content_id))
        });
        Ok(decisions)
    }
}

#[async_trait]
impl ContentDirectory for InMemoryModerationStore {
    async fn get_content(&self, content_id: u64) -> Result<Option<ContentItem>, ModerationError> {
        Ok(self.content.get(&content_id).map(|item| item.clone()))
    }

    async fn set_archived(
        &self,
        content_id: u64,
        at: DateTime<Utc>,
    ) -> Result<ContentItem, ModerationError> {
        let mut item = self
            .content
            .get_mut(&content_id)
            .ok_or(ModerationError::UnknownContent(content_id))?;

        mark_archived(&mut item, at);
        Ok(item.clone())
    }
}

#[async_trait]
impl VoterDirectory for InMemoryModerationStore {
    async fn voter_exists(&self, voter_id: u64) -> Result<bool, ModerationError> {
        Ok(self.voters.contains(&voter_id))
    }
}
