use crate::core::moderation::VoteKind;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "community-moderation")]
#[command(version, about = "Weighted community voting that archives content past a threshold")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Make a content item known to the engine
    RegisterContent {
        /// Content item ID
        content_id: u64,
    },

    /// Make a voter known to the engine
    RegisterVoter {
        /// Voter ID
        voter_id: u64,
    },

    /// Delete a content item together with its votes and decision
    RemoveContent {
        /// Content item ID
        content_id: u64,
    },

    /// Delete a voter together with every vote they cast
    RemoveVoter {
        /// Voter ID
        voter_id: u64,
    },

    /// Cast or replace a vote, then evaluate the content
    Vote {
        /// Content item ID
        content_id: u64,

        /// Voter ID
        voter_id: u64,

        /// Vote kind (hide, remove)
        kind: VoteKind,

        /// Decimal weight with at most two places, between -999.99 and 999.99 [default: 1.00]
        #[arg(long, short = 'w', allow_hyphen_values = true)]
        weight: Option<String>,
    },

    /// Show one voter's vote on a content item
    ShowVote {
        /// Content item ID
        content_id: u64,

        /// Voter ID
        voter_id: u64,
    },

    /// Withdraw a vote, then evaluate the content
    Withdraw {
        /// Content item ID
        content_id: u64,

        /// Voter ID
        voter_id: u64,
    },

    /// Evaluate a content item against the current threshold
    Evaluate {
        /// Content item ID
        content_id: u64,
    },

    /// Show the counted removal weight of a content item
    Weight {
        /// Content item ID
        content_id: u64,
    },

    /// Show the current removal threshold
    Threshold,

    /// Show the moderation decision for a content item
    Decision {
        /// Content item ID
        content_id: u64,
    },

    /// List moderation decisions, newest first
    Decisions {
        /// Only list decisions that archived their content
        #[arg(long)]
        archived_only: bool,
    },

    /// List every vote on a content item, newest first
    Votes {
        /// Content item ID
        content_id: u64,
    },

    /// Re-evaluate all content holding remove votes
    Sweep {
        /// Keep sweeping on an interval until interrupted
        #[arg(long)]
        watch: bool,
    },
}
