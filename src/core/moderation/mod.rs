// Core moderation module - community voting and archival.
//
// Leaves first: ledger, aggregator and threshold policy feed the recorder,
// and the service composes all of them.

pub mod decision_recorder;
pub mod moderation_error;
pub mod moderation_models;
pub mod moderation_ports;
pub mod moderation_service;
pub mod threshold_policy;
pub mod vote_ledger;
pub mod weight_aggregator;

pub use decision_recorder::ArchivalRecorder;
pub use moderation_error::ModerationError;
pub use moderation_models::*;
pub use moderation_ports::{ContentDirectory, DecisionStore, VoteStore, VoterDirectory};
pub use moderation_service::ModerationService;
pub use threshold_policy::{
    EnvThreshold, FixedThreshold, SharedThreshold, ThresholdPolicy, THRESHOLD_ENV_VAR,
};
pub use vote_ledger::{default_weight, VoteLedger};
pub use weight_aggregator::WeightAggregator;
