// Weight aggregator - how much removal pressure a content item is under.

use super::moderation_error::ModerationError;
use super::moderation_models::{zero_weight, Vote, VoteKind};
use super::moderation_ports::VoteStore;
use bigdecimal::{BigDecimal, Zero};
use std::sync::Arc;

/// Only active REMOVE votes with a positive weight count.
///
/// Zero and negative weights are skipped outright rather than subtracted.
pub fn counts_toward_removal(vote: &Vote) -> bool {
    vote.kind == VoteKind::Remove && vote.active && vote.weight > BigDecimal::zero()
}

/// Exact decimal sum of the counted votes, `0.00` when none qualify.
pub fn sum_counted<'a>(votes: impl IntoIterator<Item = &'a Vote>) -> BigDecimal {
    votes
        .into_iter()
        .filter(|v| counts_toward_removal(v))
        .fold(zero_weight(), |total, v| total + &v.weight)
}

pub struct WeightAggregator {
    store: Arc<dyn VoteStore>,
}

impl WeightAggregator {
    pub fn new(store: Arc<dyn VoteStore>) -> Self {
        Self { store }
    }

    pub async fn counted_weight(&self, content_id: u64) -> Result<BigDecimal, ModerationError> {
        let votes = self.store.votes_for_content(content_id).await?;
        Ok(sum_counted(&votes))
    }
}
