// Archival decision recorder - writes at most one decision per content item.
//
// The store writes the decision and the archive flag as one unit, and its
// conditional insert is the only thing that decides who wins a race. Every
// path that sees a decision also checks the content flag, so a flag lost
// outside that unit is put back on the next evaluation.

use super::moderation_error::ModerationError;
use super::moderation_models::{now, DecisionOutcome, ModerationDecision};
use super::moderation_ports::{ContentDirectory, DecisionStore};
use bigdecimal::BigDecimal;
use std::sync::Arc;

pub struct ArchivalRecorder {
    decisions: Arc<dyn DecisionStore>,
    content: Arc<dyn ContentDirectory>,
}

impl ArchivalRecorder {
    pub fn new(decisions: Arc<dyn DecisionStore>, content: Arc<dyn ContentDirectory>) -> Self {
        Self { decisions, content }
    }

    /// Record the crossing of `threshold` unless a decision already exists.
    ///
    /// Requires `total_weight >= threshold`. On success the content item is
    /// archived with the decision's timestamp.
    pub async fn record_if_crossed(
        &self,
        content_id: u64,
        total_weight: &BigDecimal,
        threshold: &BigDecimal,
    ) -> Result<DecisionOutcome, ModerationError> {
        if total_weight < threshold {
            return Err(ModerationError::EvaluationFailure {
                content_id,
                reason: format!(
                    "total weight {} is below threshold {}",
                    total_weight, threshold
                ),
            });
        }

        let candidate = ModerationDecision {
            content_id,
            total_weight: total_weight.clone(),
            threshold: threshold.clone(),
            archived: true,
            decided_at: now(),
        };

        let outcome = self.decisions.record_and_archive(&candidate).await?;
        if let DecisionOutcome::NewlyRecorded(decision) = &outcome {
            tracing::info!(
                content_id,
                total_weight = %decision.total_weight,
                threshold = %decision.threshold,
                "Content archived by community vote"
            );
        }
        self.ensure_archived(outcome.decision()).await?;

        Ok(outcome)
    }

    /// Re-apply the archive flag if the content item lost it.
    ///
    /// A recorded decision always means archived content; this is the
    /// repair path for items where that stopped being true.
    pub async fn ensure_archived(
        &self,
        decision: &ModerationDecision,
    ) -> Result<(), ModerationError> {
        let content_id = decision.content_id;
        match self.content.get_content(content_id).await? {
            Some(item) if item.archived => Ok(()),
            Some(_) => {
                tracing::warn!(
                    content_id,
                    decided_at = %decision.decided_at,
                    "Decision exists but content is not archived; re-applying archive flag"
                );
                self.content
                    .set_archived(content_id, decision.decided_at)
                    .await?;
                Ok(())
            }
            None => Err(ModerationError::UnknownContent(content_id)),
        }
    }

    pub async fn decision_for(
        &self,
        content_id: u64,
    ) -> Result<Option<ModerationDecision>, ModerationError> {
        self.decisions.get_decision(content_id).await
    }

    pub async fn list_decisions(
        &self,
        archived_only: bool,
    ) -> Result<Vec<ModerationDecision>, ModerationError> {
        self.decisions.list_decisions(archived_only).await
    }
}
