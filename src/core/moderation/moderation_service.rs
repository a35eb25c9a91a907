// Moderation service - the evaluation orchestrator and the engine's public face.
//
// This service handles:
// - Vote submission (ledger write, then an explicit evaluation)
// - Threshold evaluation (counted weight vs. the policy's current value)
// - Read-only inspection (counted weight, decisions, votes)
// - Retry sweeps over contested content
//
// A vote that was written stays written even if the evaluation after it
// fails; the failure is returned to the caller and a later sweep retries.

use super::decision_recorder::ArchivalRecorder;
use super::moderation_error::ModerationError;
use super::moderation_models::{
    Evaluation, ModerationDecision, ModerationState, SweepFailure, SweepReport, Vote, VoteKind,
    VoteReceipt,
};
use super::moderation_ports::{ContentDirectory, DecisionStore, VoteStore, VoterDirectory};
use super::threshold_policy::ThresholdPolicy;
use super::vote_ledger::VoteLedger;
use super::weight_aggregator::WeightAggregator;
use bigdecimal::BigDecimal;
use std::sync::Arc;

pub struct ModerationService {
    ledger: VoteLedger,
    aggregator: WeightAggregator,
    policy: Arc<dyn ThresholdPolicy>,
    recorder: ArchivalRecorder,
    content: Arc<dyn ContentDirectory>,
}

impl ModerationService {
    pub fn new(
        ledger: VoteLedger,
        aggregator: WeightAggregator,
        policy: Arc<dyn ThresholdPolicy>,
        recorder: ArchivalRecorder,
        content: Arc<dyn ContentDirectory>,
    ) -> Self {
        Self {
            ledger,
            aggregator,
            policy,
            recorder,
            content,
        }
    }

    /// Wire every component against one store that implements all the ports.
    pub fn with_store<S>(store: Arc<S>, policy: Arc<dyn ThresholdPolicy>) -> Self
    where
        S: VoteStore + DecisionStore + ContentDirectory + VoterDirectory + 'static,
    {
        Self::new(
            VoteLedger::new(store.clone(), store.clone(), store.clone()),
            WeightAggregator::new(store.clone()),
            policy,
            ArchivalRecorder::new(store.clone(), store.clone()),
            store,
        )
    }

    /// Write a vote without evaluating. Callers must follow up with `evaluate`.
    pub async fn cast_vote(
        &self,
        content_id: u64,
        voter_id: u64,
        kind: VoteKind,
        weight: &BigDecimal,
    ) -> Result<Vote, ModerationError> {
        self.ledger
            .cast_vote(content_id, voter_id, kind, weight)
            .await
    }

    /// Cast a vote and evaluate the content it targets.
    ///
    /// Validation errors leave nothing behind. An `EvaluationFailure` means
    /// the vote is committed but archival is still pending.
    pub async fn submit_vote(
        &self,
        content_id: u64,
        voter_id: u64,
        kind: VoteKind,
        weight: &BigDecimal,
    ) -> Result<VoteReceipt, ModerationError> {
        let vote = self.cast_vote(content_id, voter_id, kind, weight).await?;
        let evaluation = self.evaluate_after_write(content_id).await?;
        Ok(VoteReceipt { vote, evaluation })
    }

    /// Deactivate a vote and evaluate again. Never un-archives.
    pub async fn withdraw_vote(
        &self,
        content_id: u64,
        voter_id: u64,
    ) -> Result<VoteReceipt, ModerationError> {
        let vote = self.ledger.withdraw_vote(content_id, voter_id).await?;
        let evaluation = self.evaluate_after_write(content_id).await?;
        Ok(VoteReceipt { vote, evaluation })
    }

    /// Decide whether `content_id` crosses the removal threshold.
    ///
    /// Safe to call any number of times, concurrently or not: at most one
    /// decision is ever recorded per item.
    pub async fn evaluate(&self, content_id: u64) -> Result<Evaluation, ModerationError> {
        if self.content.get_content(content_id).await?.is_none() {
            return Err(ModerationError::UnknownContent(content_id));
        }

        let counted_weight = self.aggregator.counted_weight(content_id).await?;
        let threshold = self.policy.current_threshold();

        if counted_weight >= threshold {
            let outcome = self
                .recorder
                .record_if_crossed(content_id, &counted_weight, &threshold)
                .await
                .map_err(|e| evaluation_failure(content_id, e))?;

            return Ok(Evaluation {
                content_id,
                counted_weight,
                threshold,
                state: ModerationState::Archived,
                decision: Some(outcome),
            });
        }

        // Below threshold: no new decision, but an existing one still has
        // to be reflected on the content item.
        let state = match self.recorder.decision_for(content_id).await? {
            Some(decision) => {
                self.recorder
                    .ensure_archived(&decision)
                    .await
                    .map_err(|e| evaluation_failure(content_id, e))?;
                ModerationState::Archived
            }
            None => ModerationState::UnderReview,
        };
        tracing::debug!(
            content_id,
            counted_weight = %counted_weight,
            threshold = %threshold,
            ?state,
            "Content below removal threshold"
        );

        Ok(Evaluation {
            content_id,
            counted_weight,
            threshold,
            state,
            decision: None,
        })
    }

    async fn evaluate_after_write(&self, content_id: u64) -> Result<Evaluation, ModerationError> {
        self.evaluate(content_id).await.map_err(|e| {
            tracing::error!(content_id, "Vote recorded but evaluation failed: {}", e);
            evaluation_failure(content_id, e)
        })
    }

    /// Re-evaluate every item that holds a REMOVE vote.
    ///
    /// Picks up evaluations that failed after their vote was written.
    /// One item failing does not stop the rest.
    pub async fn sweep(&self) -> Result<SweepReport, ModerationError> {
        let contested = self.ledger.contested_content().await?;
        let mut report = SweepReport::default();

        for content_id in contested {
            report.evaluated += 1;
            match self.evaluate(content_id).await {
                Ok(evaluation) if evaluation.newly_archived() => {
                    report.newly_archived.push(content_id);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(content_id, "Sweep evaluation failed: {}", e);
                    report.failures.push(SweepFailure {
                        content_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            evaluated = report.evaluated,
            newly_archived = report.newly_archived.len(),
            failures = report.failures.len(),
            "Moderation sweep finished"
        );
        Ok(report)
    }

    pub async fn counted_weight(&self, content_id: u64) -> Result<BigDecimal, ModerationError> {
        self.aggregator.counted_weight(content_id).await
    }

    pub fn current_threshold(&self) -> BigDecimal {
        self.policy.current_threshold()
    }

    pub async fn decision_for(
        &self,
        content_id: u64,
    ) -> Result<Option<ModerationDecision>, ModerationError> {
        self.recorder.decision_for(content_id).await
    }

    pub async fn list_decisions(
        &self,
        archived_only: bool,
    ) -> Result<Vec<ModerationDecision>, ModerationError> {
        self.recorder.list_decisions(archived_only).await
    }

    pub async fn votes_for(&self, content_id: u64) -> Result<Vec<Vote>, ModerationError> {
        self.ledger.votes_for(content_id).await
    }

    /// One voter's vote on one item, withdrawn or not.
    pub async fn vote_of(
        &self,
        content_id: u64,
        voter_id: u64,
    ) -> Result<Option<Vote>, ModerationError> {
        self.ledger.get_vote(content_id, voter_id).await
    }
}

fn evaluation_failure(content_id: u64, error: ModerationError) -> ModerationError {
    match error {
        ModerationError::EvaluationFailure { .. } => error,
        other => ModerationError::EvaluationFailure {
            content_id,
            reason: other.to_string(),
        },
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::moderation_models::{now, ContentItem, DecisionOutcome};
    use crate::core::moderation::threshold_policy::{FixedThreshold, SharedThreshold};
    use crate::infra::moderation::InMemoryModerationStore;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::str::FromStr;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    /// Content item 1 and voters 1..=voters registered.
    fn seeded_store(voters: u64) -> Arc<InMemoryModerationStore> {
        let store = Arc::new(InMemoryModerationStore::new());
        store.register_content(1);
        for voter in 1..=voters {
            store.register_voter(voter);
        }
        store
    }

    fn service(store: &Arc<InMemoryModerationStore>) -> ModerationService {
        ModerationService::with_store(store.clone(), Arc::new(FixedThreshold::default()))
    }

    async fn is_archived(store: &InMemoryModerationStore, content_id: u64) -> bool {
        store
            .get_content(content_id)
            .await
            .unwrap()
            .map(|item| item.archived)
            .unwrap_or(false)
    }

    #[tokio::test]
    async fn test_fifth_vote_crosses_default_threshold() {
        let store = seeded_store(5);
        let service = service(&store);

        for voter in 1..=4 {
            service
                .cast_vote(1, voter, VoteKind::Remove, &dec("1.0"))
                .await
                .unwrap();
        }
        assert_eq!(service.counted_weight(1).await.unwrap(), dec("4.0"));
        let evaluation = service.evaluate(1).await.unwrap();
        assert_eq!(evaluation.state, ModerationState::UnderReview);
        assert!(!is_archived(&store, 1).await);
        assert!(service.decision_for(1).await.unwrap().is_none());

        service
            .cast_vote(1, 5, VoteKind::Remove, &dec("1.0"))
            .await
            .unwrap();
        assert_eq!(service.counted_weight(1).await.unwrap(), dec("5.0"));
        let evaluation = service.evaluate(1).await.unwrap();
        assert_eq!(evaluation.state, ModerationState::Archived);
        assert!(evaluation.newly_archived());
        assert!(is_archived(&store, 1).await);

        let decision = service.decision_for(1).await.unwrap().unwrap();
        assert_eq!(decision.total_weight, dec("5.0"));
        assert_eq!(decision.threshold, dec("5.0"));
        assert!(decision.archived);
    }

    #[tokio::test]
    async fn test_fractional_weights_cross_exactly() {
        let store = seeded_store(3);
        let service = service(&store);

        for (voter, weight) in [(1, "1.23"), (2, "1.77"), (3, "2.00")] {
            service
                .submit_vote(1, voter, VoteKind::Remove, &dec(weight))
                .await
                .unwrap();
        }

        let weight = service.counted_weight(1).await.unwrap();
        assert_eq!(weight, dec("5.00"));
        assert_eq!(weight.to_string(), "5.00");
        assert!(is_archived(&store, 1).await);
    }

    #[tokio::test]
    async fn test_negative_vote_is_excluded_not_subtracted() {
        let store = seeded_store(6);
        let service = service(&store);

        service
            .submit_vote(1, 6, VoteKind::Remove, &dec("-2.0"))
            .await
            .unwrap();
        for voter in 1..=5 {
            service
                .submit_vote(1, voter, VoteKind::Remove, &dec("1.0"))
                .await
                .unwrap();
        }

        assert_eq!(service.counted_weight(1).await.unwrap(), dec("5.0"));
        assert!(is_archived(&store, 1).await);
    }

    #[tokio::test]
    async fn test_hide_and_inactive_votes_never_archive() {
        let store = seeded_store(12);
        let service = service(&store);

        for voter in 1..=10 {
            service
                .submit_vote(1, voter, VoteKind::Hide, &dec("5.0"))
                .await
                .unwrap();
        }
        for voter in 11..=12 {
            service
                .submit_vote(1, voter, VoteKind::Remove, &dec("3.0"))
                .await
                .unwrap();
            // Withdrawing right away keeps the running total below 5.0
            service.withdraw_vote(1, voter).await.unwrap();
        }

        assert_eq!(service.counted_weight(1).await.unwrap(), dec("0"));
        assert!(!is_archived(&store, 1).await);
        assert!(service.decision_for(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_repeated_evaluation_records_one_decision() {
        let store = seeded_store(5);
        let service = service(&store);

        for voter in 1..=5 {
            service
                .cast_vote(1, voter, VoteKind::Remove, &dec("1.0"))
                .await
                .unwrap();
        }

        let first = service.evaluate(1).await.unwrap();
        let archived_at = store.get_content(1).await.unwrap().unwrap().archived_at;
        for _ in 0..5 {
            let again = service.evaluate(1).await.unwrap();
            assert!(!again.newly_archived());
            assert_eq!(
                again.decision.as_ref().map(DecisionOutcome::decision),
                first.decision.as_ref().map(DecisionOutcome::decision)
            );
        }

        assert_eq!(service.list_decisions(false).await.unwrap().len(), 1);
        assert_eq!(
            store.get_content(1).await.unwrap().unwrap().archived_at,
            archived_at
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_evaluations_record_one_decision() {
        let store = seeded_store(5);
        let service = Arc::new(service(&store));

        for voter in 1..=5 {
            service
                .cast_vote(1, voter, VoteKind::Remove, &dec("1.0"))
                .await
                .unwrap();
        }

        let mut handles = Vec::new();
        for _ in 0..32 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move { service.evaluate(1).await }));
        }

        let mut newly = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().newly_archived() {
                newly += 1;
            }
        }

        assert_eq!(newly, 1);
        assert_eq!(service.list_decisions(false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_revote_replaces_previous_weight() {
        let store = seeded_store(2);
        let service = service(&store);

        service
            .submit_vote(1, 1, VoteKind::Remove, &dec("4.0"))
            .await
            .unwrap();
        service
            .submit_vote(1, 1, VoteKind::Remove, &dec("0.5"))
            .await
            .unwrap();
        service
            .submit_vote(1, 2, VoteKind::Remove, &dec("1.0"))
            .await
            .unwrap();

        assert_eq!(service.votes_for(1).await.unwrap().len(), 2);
        assert_eq!(service.counted_weight(1).await.unwrap(), dec("1.5"));
        assert!(!is_archived(&store, 1).await);

        // Switching kind to HIDE drops the vote out of the count
        service
            .submit_vote(1, 2, VoteKind::Hide, &dec("1.0"))
            .await
            .unwrap();
        assert_eq!(service.counted_weight(1).await.unwrap(), dec("0.5"));
    }

    #[tokio::test]
    async fn test_reconfigured_threshold_is_recorded() {
        let store = seeded_store(3);
        let policy = Arc::new(SharedThreshold::new(dec("5.0")).unwrap());
        let service = ModerationService::with_store(store.clone(), policy.clone());

        policy.set(dec("3.0")).unwrap();

        for voter in 1..=2 {
            let receipt = service
                .submit_vote(1, voter, VoteKind::Remove, &dec("1.0"))
                .await
                .unwrap();
            assert_eq!(receipt.evaluation.state, ModerationState::UnderReview);
        }
        assert!(!is_archived(&store, 1).await);

        let receipt = service
            .submit_vote(1, 3, VoteKind::Remove, &dec("1.0"))
            .await
            .unwrap();
        assert!(receipt.evaluation.newly_archived());

        let decision = service.decision_for(1).await.unwrap().unwrap();
        assert_eq!(decision.threshold, dec("3.0"));
        assert_eq!(decision.total_weight, dec("3.0"));
    }

    #[tokio::test]
    async fn test_withdrawal_after_decision_does_not_unarchive() {
        let store = seeded_store(5);
        let service = service(&store);

        for voter in 1..=5 {
            service
                .submit_vote(1, voter, VoteKind::Remove, &dec("1.0"))
                .await
                .unwrap();
        }
        assert!(is_archived(&store, 1).await);

        let receipt = service.withdraw_vote(1, 5).await.unwrap();
        assert!(!receipt.vote.active);
        assert_eq!(service.vote_of(1, 5).await.unwrap(), Some(receipt.vote.clone()));
        assert!(service.vote_of(1, 6).await.unwrap().is_none());
        assert_eq!(receipt.evaluation.counted_weight, dec("4.0"));
        assert_eq!(receipt.evaluation.state, ModerationState::Archived);
        assert!(receipt.evaluation.decision.is_none());

        assert!(is_archived(&store, 1).await);
        assert_eq!(service.list_decisions(true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_archival_keeps_vote_history() {
        let store = seeded_store(5);
        let service = service(&store);

        for voter in 1..=5 {
            service
                .submit_vote(1, voter, VoteKind::Remove, &dec("1.0"))
                .await
                .unwrap();
        }

        let votes = service.votes_for(1).await.unwrap();
        assert_eq!(votes.len(), 5);
        assert!(votes.iter().all(|v| v.active));
    }

    #[tokio::test]
    async fn test_items_are_evaluated_independently() {
        let store = seeded_store(5);
        store.register_content(2);
        let service = service(&store);

        for voter in 1..=5 {
            service
                .submit_vote(1, voter, VoteKind::Remove, &dec("1.0"))
                .await
                .unwrap();
        }
        service
            .submit_vote(2, 1, VoteKind::Remove, &dec("1.0"))
            .await
            .unwrap();

        assert!(is_archived(&store, 1).await);
        assert!(!is_archived(&store, 2).await);
        assert_eq!(
            service.evaluate(2).await.unwrap().state,
            ModerationState::UnderReview
        );
    }

    #[tokio::test]
    async fn test_evaluate_unknown_content() {
        let store = seeded_store(0);
        let service = service(&store);

        let err = service.evaluate(42).await.unwrap_err();
        assert!(matches!(err, ModerationError::UnknownContent(42)));
    }

    // ------------------------------------------------------------------------
    // Failure injection
    // ------------------------------------------------------------------------

    /// Delegates to the in-memory store but can refuse decision writes.
    struct FlakyDecisionStore {
        inner: Arc<InMemoryModerationStore>,
        failing: AtomicBool,
    }

    #[async_trait]
    impl DecisionStore for FlakyDecisionStore {
        async fn record_and_archive(
            &self,
            decision: &ModerationDecision,
        ) -> Result<DecisionOutcome, ModerationError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(ModerationError::StorageError("disk full".to_string()));
            }
            self.inner.record_and_archive(decision).await
        }

        async fn get_decision(
            &self,
            content_id: u64,
        ) -> Result<Option<ModerationDecision>, ModerationError> {
            self.inner.get_decision(content_id).await
        }

        async fn list_decisions(
            &self,
            archived_only: bool,
        ) -> Result<Vec<ModerationDecision>, ModerationError> {
            self.inner.list_decisions(archived_only).await
        }
    }

    /// Delegates to the in-memory store but can refuse archive writes.
    struct LossyContentDirectory {
        inner: Arc<InMemoryModerationStore>,
        failing: AtomicBool,
    }

    #[async_trait]
    impl ContentDirectory for LossyContentDirectory {
        async fn get_content(
            &self,
            content_id: u64,
        ) -> Result<Option<ContentItem>, ModerationError> {
            self.inner.get_content(content_id).await
        }

        async fn set_archived(
            &self,
            content_id: u64,
            at: DateTime<Utc>,
        ) -> Result<ContentItem, ModerationError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(ModerationError::StorageError("connection reset".to_string()));
            }
            self.inner.set_archived(content_id, at).await
        }
    }

    /// A decision row for item 1 whose archive flag never reached the content.
    fn orphan_decision(store: &InMemoryModerationStore) -> ModerationDecision {
        let decision = ModerationDecision {
            content_id: 1,
            total_weight: dec("5.00"),
            threshold: dec("5.00"),
            archived: true,
            decided_at: now(),
        };
        store.seed_orphan_decision(decision.clone());
        decision
    }

    #[tokio::test]
    async fn test_failed_decision_write_keeps_vote_and_sweep_retries() {
        let store = seeded_store(5);
        let decisions = Arc::new(FlakyDecisionStore {
            inner: store.clone(),
            failing: AtomicBool::new(true),
        });
        let service = ModerationService::new(
            VoteLedger::new(store.clone(), store.clone(), store.clone()),
            WeightAggregator::new(store.clone()),
            Arc::new(FixedThreshold::default()),
            ArchivalRecorder::new(decisions.clone(), store.clone()),
            store.clone(),
        );

        for voter in 1..=4 {
            service
                .submit_vote(1, voter, VoteKind::Remove, &dec("1.0"))
                .await
                .unwrap();
        }
        let err = service
            .submit_vote(1, 5, VoteKind::Remove, &dec("1.0"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ModerationError::EvaluationFailure { content_id: 1, .. }
        ));

        // The vote survived the failed evaluation, and nothing half-written remains
        assert_eq!(service.votes_for(1).await.unwrap().len(), 5);
        assert_eq!(service.counted_weight(1).await.unwrap(), dec("5.0"));
        assert!(service.decision_for(1).await.unwrap().is_none());
        assert!(!is_archived(&store, 1).await);

        let report = service.sweep().await.unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(report.newly_archived.is_empty());

        decisions.failing.store(false, Ordering::SeqCst);
        let report = service.sweep().await.unwrap();
        assert_eq!(report.evaluated, 1);
        assert_eq!(report.newly_archived, vec![1]);
        assert!(report.failures.is_empty());
        assert!(is_archived(&store, 1).await);
    }

    #[tokio::test]
    async fn test_lost_archive_flag_is_repaired_above_threshold() {
        let store = seeded_store(5);
        let service = service(&store);

        for voter in 1..=5 {
            service
                .cast_vote(1, voter, VoteKind::Remove, &dec("1.0"))
                .await
                .unwrap();
        }
        let decision = orphan_decision(&store);
        assert!(!is_archived(&store, 1).await);

        let evaluation = service.evaluate(1).await.unwrap();
        assert!(!evaluation.newly_archived());
        let item = store.get_content(1).await.unwrap().unwrap();
        assert!(item.archived);
        assert_eq!(item.archived_at, Some(decision.decided_at));
        assert_eq!(service.list_decisions(false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_lost_archive_flag_is_repaired_after_withdrawal() {
        let store = seeded_store(5);
        let service = service(&store);

        for voter in 1..=5 {
            service
                .cast_vote(1, voter, VoteKind::Remove, &dec("1.0"))
                .await
                .unwrap();
        }
        let decision = orphan_decision(&store);

        // The weight drops below the threshold before anyone re-evaluates
        let receipt = service.withdraw_vote(1, 5).await.unwrap();
        assert_eq!(receipt.evaluation.counted_weight, dec("4.00"));
        assert_eq!(receipt.evaluation.state, ModerationState::Archived);

        let item = store.get_content(1).await.unwrap().unwrap();
        assert!(item.archived);
        assert_eq!(item.archived_at, Some(decision.decided_at));
    }

    #[tokio::test]
    async fn test_sweep_reports_and_retries_failed_repairs() {
        let store = seeded_store(4);
        let content = Arc::new(LossyContentDirectory {
            inner: store.clone(),
            failing: AtomicBool::new(true),
        });
        let service = ModerationService::new(
            VoteLedger::new(store.clone(), store.clone(), content.clone()),
            WeightAggregator::new(store.clone()),
            Arc::new(FixedThreshold::default()),
            ArchivalRecorder::new(store.clone(), content.clone()),
            content.clone(),
        );

        for voter in 1..=4 {
            service
                .cast_vote(1, voter, VoteKind::Remove, &dec("1.0"))
                .await
                .unwrap();
        }
        orphan_decision(&store);

        // Below threshold with a decision on file: the repair must not be skipped
        let err = service.evaluate(1).await.unwrap_err();
        assert!(matches!(
            err,
            ModerationError::EvaluationFailure { content_id: 1, .. }
        ));

        let report = service.sweep().await.unwrap();
        assert_eq!(report.evaluated, 1);
        assert_eq!(report.failures.len(), 1);
        assert!(!is_archived(&store, 1).await);

        content.failing.store(false, Ordering::SeqCst);
        let report = service.sweep().await.unwrap();
        assert!(report.failures.is_empty());
        assert!(report.newly_archived.is_empty());
        assert!(is_archived(&store, 1).await);
    }

    #[tokio::test]
    async fn test_rejected_vote_is_not_evaluated() {
        let store = seeded_store(1);
        let service = service(&store);

        let err = service
            .submit_vote(1, 1, VoteKind::Remove, &dec("0.333"))
            .await
            .unwrap_err();
        assert!(err.is_rejection());
        assert!(service.votes_for(1).await.unwrap().is_empty());
    }
}
