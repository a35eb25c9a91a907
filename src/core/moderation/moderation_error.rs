use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModerationError {
    /// Malformed kind or weight. Rejected before anything is written.
    #[error("Invalid vote: {0}")]
    InvalidVote(String),

    /// A second row for the same (content, voter) reached the store.
    #[error("Voter {voter_id} already has a vote on content {content_id}")]
    DuplicateVoteConflict { content_id: u64, voter_id: u64 },

    #[error("Unknown voter: {0}")]
    UnknownVoter(u64),

    #[error("Unknown content: {0}")]
    UnknownContent(u64),

    #[error("Voter {voter_id} has no vote on content {content_id}")]
    VoteNotFound { content_id: u64, voter_id: u64 },

    /// The decision could not be written. Any vote that triggered the
    /// evaluation is already committed and stays committed.
    #[error("Archival evaluation failed for content {content_id}: {reason}")]
    EvaluationFailure { content_id: u64, reason: String },

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ModerationError {
    /// Validation and referential errors leave no trace in the store.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ModerationError::InvalidVote(_)
                | ModerationError::UnknownVoter(_)
                | ModerationError::UnknownContent(_)
                | ModerationError::VoteNotFound { .. }
        )
    }
}
