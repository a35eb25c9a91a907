use super::commands::Commands;
use crate::core::moderation::{default_weight, ModerationError, ModerationService};
use crate::infra::moderation::SqliteModerationStore;
use bigdecimal::BigDecimal;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Everything a command needs. The store doubles as the content and voter
/// registry, which the service itself never writes to.
pub struct CliContext {
    pub store: Arc<SqliteModerationStore>,
    pub service: ModerationService,
    pub sweep_interval: Duration,
}

/// Exit status for a failed command: 2 for rejected input, 1 for everything else.
pub fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<ModerationError>() {
        Some(e) if e.is_rejection() => 2,
        _ => 1,
    }
}

fn parse_weight(raw: &str) -> Result<BigDecimal, ModerationError> {
    BigDecimal::from_str(raw.trim()).map_err(|e| {
        ModerationError::InvalidVote(format!("weight '{}' is not a decimal: {}", raw, e))
    })
}

/// Run a one-shot command and return its JSON result.
///
/// `sweep --watch` is long-running and goes through `watch_sweeps` instead.
pub async fn run_command(ctx: &CliContext, command: Commands) -> anyhow::Result<Value> {
    let output = match command {
        Commands::RegisterContent { content_id } => {
            ctx.store.register_content(content_id).await?;
            json!({ "content_id": content_id, "registered": true })
        }
        Commands::RegisterVoter { voter_id } => {
            ctx.store.register_voter(voter_id).await?;
            json!({ "voter_id": voter_id, "registered": true })
        }
        Commands::RemoveContent { content_id } => {
            let removed = ctx.store.remove_content(content_id).await?;
            json!({ "content_id": content_id, "removed": removed })
        }
        Commands::RemoveVoter { voter_id } => {
            let removed = ctx.store.remove_voter(voter_id).await?;
            json!({ "voter_id": voter_id, "removed": removed })
        }
        Commands::Vote {
            content_id,
            voter_id,
            kind,
            weight,
        } => {
            let weight = match weight {
                Some(raw) => parse_weight(&raw)?,
                None => default_weight(),
            };
            let receipt = ctx
                .service
                .submit_vote(content_id, voter_id, kind, &weight)
                .await?;
            serde_json::to_value(receipt)?
        }
        Commands::Withdraw {
            content_id,
            voter_id,
        } => {
            let receipt = ctx.service.withdraw_vote(content_id, voter_id).await?;
            serde_json::to_value(receipt)?
        }
        Commands::ShowVote {
            content_id,
            voter_id,
        } => serde_json::to_value(ctx.service.vote_of(content_id, voter_id).await?)?,
        Commands::Evaluate { content_id } => {
            serde_json::to_value(ctx.service.evaluate(content_id).await?)?
        }
        Commands::Weight { content_id } => {
            let weight = ctx.service.counted_weight(content_id).await?;
            json!({ "content_id": content_id, "counted_weight": weight.to_string() })
        }
        Commands::Threshold => {
            json!({ "threshold": ctx.service.current_threshold().to_string() })
        }
        Commands::Decision { content_id } => {
            serde_json::to_value(ctx.service.decision_for(content_id).await?)?
        }
        Commands::Decisions { archived_only } => {
            serde_json::to_value(ctx.service.list_decisions(archived_only).await?)?
        }
        Commands::Votes { content_id } => {
            serde_json::to_value(ctx.service.votes_for(content_id).await?)?
        }
        Commands::Sweep { .. } => serde_json::to_value(ctx.service.sweep().await?)?,
    };

    Ok(output)
}

/// Sweep every `sweep_interval` until Ctrl+C, printing one JSON report per line.
pub async fn watch_sweeps(ctx: &CliContext) -> anyhow::Result<()> {
    tracing::info!(
        interval_secs = ctx.sweep_interval.as_secs(),
        "Starting moderation sweep loop"
    );

    loop {
        match ctx.service.sweep().await {
            Ok(report) => println!("{}", serde_json::to_string(&report)?),
            // A broken sweep is retried on the next tick
            Err(e) => tracing::error!("Moderation sweep failed: {}", e),
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down sweep loop");
                return Ok(());
            }
            _ = tokio::time::sleep(ctx.sweep_interval) => {}
        }
    }
}
