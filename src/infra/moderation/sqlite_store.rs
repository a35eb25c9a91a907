// SQLite-backed moderation store.
//
// Tables:
// - content_items: the archived flag/timestamp of externally owned content
// - voters: known voter identities
// - votes: one row per (content_id, voter_id), weights in hundredths
// - moderation_decisions: at most one row per content item
//
// The vote upsert is a single statement guarded by its unique key
// (ON CONFLICT DO UPDATE). The decision insert (ON CONFLICT DO NOTHING)
// and the content archive flag share one transaction. No application-level
// locking is involved.

use crate::core::moderation::{
    from_cents, to_cents, ContentDirectory, ContentItem, DecisionOutcome, DecisionStore,
    ModerationDecision, ModerationError, Vote, VoteStore, VoteWrite, VoterDirectory,
};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

const VOTE_COLUMNS: &str =
    "content_id, voter_id, kind, weight_cents, active, created_at, updated_at";
const DECISION_COLUMNS: &str =
    "content_id, total_weight_cents, threshold_cents, archived, decided_at";

// archived_at only moves forward
const ARCHIVE_CONTENT_SQL: &str = r#"
    UPDATE content_items
    SET archived = 1,
        archived_at = CASE
            WHEN archived_at IS NULL OR archived_at < ?1 THEN ?1
            ELSE archived_at
        END
    WHERE id = ?2
    RETURNING id, archived, archived_at
"#;

pub struct SqliteModerationStore {
    pool: Pool<Sqlite>,
}

impl SqliteModerationStore {
    /// Open (creating if needed) the database at `database_url` and run migrations.
    ///
    /// Accepts a plain path, a `sqlite:` URL, or `:memory:`.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let (options, max_connections) = if database_url.contains(":memory:") {
            // Every connection to :memory: is a separate database
            (SqliteConnectOptions::from_str("sqlite::memory:")?, 1)
        } else {
            let path_str = database_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            (
                SqliteConnectOptions::new()
                    .filename(path_str)
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal),
                5,
            )
        };

        let options = options
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
        if max_connections == 1 {
            // Closing the only connection would drop the in-memory database
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }
        let pool = pool_options.connect_with(options).await?;

        let store = Self::from_pool(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> Result<(), ModerationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS content_items (
                id INTEGER PRIMARY KEY,
                archived BOOLEAN NOT NULL DEFAULT 0,
                archived_at TEXT
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS voters (
                id INTEGER PRIMARY KEY
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS votes (
                content_id INTEGER NOT NULL REFERENCES content_items(id) ON DELETE CASCADE,
                voter_id INTEGER NOT NULL REFERENCES voters(id) ON DELETE CASCADE,
                kind TEXT NOT NULL CHECK (kind IN ('hide', 'remove')),
                weight_cents INTEGER NOT NULL,
                active BOOLEAN NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (content_id, voter_id)
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_votes_voter
                ON votes(voter_id);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS moderation_decisions (
                content_id INTEGER PRIMARY KEY REFERENCES content_items(id) ON DELETE CASCADE,
                total_weight_cents INTEGER NOT NULL,
                threshold_cents INTEGER NOT NULL,
                archived BOOLEAN NOT NULL DEFAULT 0,
                decided_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    /// Make a content item known. Existing items are left alone.
    pub async fn register_content(&self, content_id: u64) -> Result<(), ModerationError> {
        sqlx::query("INSERT INTO content_items (id) VALUES (?) ON CONFLICT(id) DO NOTHING")
            .bind(content_id as i64)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    pub async fn register_voter(&self, voter_id: u64) -> Result<(), ModerationError> {
        sqlx::query("INSERT INTO voters (id) VALUES (?) ON CONFLICT(id) DO NOTHING")
            .bind(voter_id as i64)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    /// Delete a content item. Its votes and decision go with it.
    pub async fn remove_content(&self, content_id: u64) -> Result<bool, ModerationError> {
        let result = sqlx::query("DELETE FROM content_items WHERE id = ?")
            .bind(content_id as i64)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a voter. Their votes go with them.
    pub async fn remove_voter(&self, voter_id: u64) -> Result<bool, ModerationError> {
        let result = sqlx::query("DELETE FROM voters WHERE id = ?")
            .bind(voter_id as i64)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(result.rows_affected() > 0)
    }
}

fn storage_error(e: sqlx::Error) -> ModerationError {
    ModerationError::StorageError(e.to_string())
}

/// Fixed-width RFC 3339 so that text comparison in SQL orders correctly.
fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ModerationError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ModerationError::StorageError(format!("bad timestamp '{}': {}", raw, e)))
}

fn cents(value: &BigDecimal, what: &str) -> Result<i64, ModerationError> {
    to_cents(value).ok_or_else(|| {
        ModerationError::StorageError(format!(
            "{} {} does not fit a two-place decimal column",
            what, value
        ))
    })
}

fn vote_from_row(row: &SqliteRow) -> Result<Vote, ModerationError> {
    let kind: String = row.try_get("kind").map_err(storage_error)?;
    let created_at: String = row.try_get("created_at").map_err(storage_error)?;
    let updated_at: String = row.try_get("updated_at").map_err(storage_error)?;

    Ok(Vote {
        content_id: row.try_get::<i64, _>("content_id").map_err(storage_error)? as u64,
        voter_id: row.try_get::<i64, _>("voter_id").map_err(storage_error)? as u64,
        kind: kind
            .parse()
            .map_err(|_| ModerationError::StorageError(format!("bad vote kind '{}'", kind)))?,
        weight: from_cents(row.try_get("weight_cents").map_err(storage_error)?),
        active: row.try_get("active").map_err(storage_error)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn decision_from_row(row: &SqliteRow) -> Result<ModerationDecision, ModerationError> {
    let decided_at: String = row.try_get("decided_at").map_err(storage_error)?;

    Ok(ModerationDecision {
        content_id: row.try_get::<i64, _>("content_id").map_err(storage_error)? as u64,
        total_weight: from_cents(row.try_get("total_weight_cents").map_err(storage_error)?),
        threshold: from_cents(row.try_get("threshold_cents").map_err(storage_error)?),
        archived: row.try_get("archived").map_err(storage_error)?,
        decided_at: parse_timestamp(&decided_at)?,
    })
}

fn content_from_row(row: &SqliteRow) -> Result<ContentItem, ModerationError> {
    let archived_at: Option<String> = row.try_get("archived_at").map_err(storage_error)?;

    Ok(ContentItem {
        id: row.try_get::<i64, _>("id").map_err(storage_error)? as u64,
        archived: row.try_get("archived").map_err(storage_error)?,
        archived_at: archived_at.as_deref().map(parse_timestamp).transpose()?,
    })
}

#[async_trait]
impl VoteStore for SqliteModerationStore {
    async fn upsert_vote(&self, vote: VoteWrite) -> Result<Vote, ModerationError> {
        let weight_cents = cents(&vote.weight, "weight")?;
        let at = timestamp(&vote.at);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO votes
                (content_id, voter_id, kind, weight_cents, active, created_at, updated_at)
            VALUES (?, ?, ?, ?, 1, ?, ?)
            ON CONFLICT(content_id, voter_id) DO UPDATE SET
                kind = excluded.kind,
                weight_cents = excluded.weight_cents,
                active = 1,
                updated_at = excluded.updated_at
            RETURNING {VOTE_COLUMNS}
            "#
        ))
        .bind(vote.content_id as i64)
        .bind(vote.voter_id as i64)
        .bind(vote.kind.as_str())
        .bind(weight_cents)
        .bind(&at)
        .bind(&at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ModerationError::DuplicateVoteConflict {
                    content_id: vote.content_id,
                    voter_id: vote.voter_id,
                }
            }
            other => storage_error(other),
        })?;

        vote_from_row(&row)
    }

    async fn deactivate_vote(
        &self,
        content_id: u64,
        voter_id: u64,
        at: DateTime<Utc>,
    ) -> Result<Option<Vote>, ModerationError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE votes SET active = 0, updated_at = ?
            WHERE content_id = ? AND voter_id = ?
            RETURNING {VOTE_COLUMNS}
            "#
        ))
        .bind(timestamp(&at))
        .bind(content_id as i64)
        .bind(voter_id as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        row.as_ref().map(vote_from_row).transpose()
    }

    async fn get_vote(
        &self,
        content_id: u64,
        voter_id: u64,
    ) -> Result<Option<Vote>, ModerationError> {
        let row = sqlx::query(&format!(
            "SELECT {VOTE_COLUMNS} FROM votes WHERE content_id = ? AND voter_id = ?"
        ))
        .bind(content_id as i64)
        .bind(voter_id as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        row.as_ref().map(vote_from_row).transpose()
    }

    async fn votes_for_content(&self, content_id: u64) -> Result<Vec<Vote>, ModerationError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {VOTE_COLUMNS}
            FROM votes
            WHERE content_id = ?
            ORDER BY created_at DESC, voter_id ASC
            "#
        ))
        .bind(content_id as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.iter().map(vote_from_row).collect()
    }

    async fn contested_content(&self) -> Result<Vec<u64>, ModerationError> {
        let rows = sqlx::query(
            "SELECT DISTINCT content_id FROM votes WHERE kind = 'remove' ORDER BY content_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.iter()
            .map(|row| {
                row.try_get::<i64, _>("content_id")
                    .map(|id| id as u64)
                    .map_err(storage_error)
            })
            .collect()
    }
}

#[async_trait]
impl DecisionStore for SqliteModerationStore {
    async fn record_and_archive(
        &self,
        decision: &ModerationDecision,
    ) -> Result<DecisionOutcome, ModerationError> {
        let content_id = decision.content_id;
        let decided_at = timestamp(&decision.decided_at);

        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        // Writing first makes the transaction take the write lock up front,
        // so racing recorders queue on the busy timeout instead of failing.
        let inserted = sqlx::query(
            r#"
            INSERT INTO moderation_decisions
                (content_id, total_weight_cents, threshold_cents, archived, decided_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(content_id) DO NOTHING
            "#,
        )
        .bind(content_id as i64)
        .bind(cents(&decision.total_weight, "total weight")?)
        .bind(cents(&decision.threshold, "threshold")?)
        .bind(decision.archived)
        .bind(&decided_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                ModerationError::UnknownContent(content_id)
            }
            other => storage_error(other),
        })?;

        let outcome = if inserted.rows_affected() > 0 {
            let archived = sqlx::query(ARCHIVE_CONTENT_SQL)
                .bind(&decided_at)
                .bind(content_id as i64)
                .fetch_optional(&mut *tx)
                .await
                .map_err(storage_error)?;
            if archived.is_none() {
                // Dropping the transaction rolls the decision back
                return Err(ModerationError::UnknownContent(content_id));
            }
            DecisionOutcome::NewlyRecorded(decision.clone())
        } else {
            // Lost the race (or a decision was already there): report the winner's row.
            let row = sqlx::query(&format!(
                "SELECT {DECISION_COLUMNS} FROM moderation_decisions WHERE content_id = ?"
            ))
            .bind(content_id as i64)
            .fetch_one(&mut *tx)
            .await
            .map_err(storage_error)?;
            DecisionOutcome::AlreadyRecorded(decision_from_row(&row)?)
        };

        tx.commit().await.map_err(storage_error)?;
        Ok(outcome)
    }

    async fn get_decision(
        &self,
        content_id: u64,
    ) -> Result<Option<ModerationDecision>, ModerationError> {
        let row = sqlx::query(&format!(
            "SELECT {DECISION_COLUMNS} FROM moderation_decisions WHERE content_id = ?"
        ))
        .bind(content_id as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        row.as_ref().map(decision_from_row).transpose()
    }

    async fn list_decisions(
        &self,
        archived_only: bool,
    ) -> Result<Vec<ModerationDecision>, ModerationError> {
        let filter = if archived_only {
            "WHERE archived = 1"
        } else {
            ""
        };

        let rows = sqlx::query(&format!(
            r#"
            SELECT {DECISION_COLUMNS}
            FROM moderation_decisions
            {filter}
            ORDER BY decided_at DESC, content_id ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.iter().map(decision_from_row).collect()
    }
}

#[async_trait]
impl ContentDirectory for SqliteModerationStore {
    async fn get_content(&self, content_id: u64) -> Result<Option<ContentItem>, ModerationError> {
        let row = sqlx::query("SELECT id, archived, archived_at FROM content_items WHERE id = ?")
            .bind(content_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        row.as_ref().map(content_from_row).transpose()
    }

    async fn set_archived(
        &self,
        content_id: u64,
        at: DateTime<Utc>,
    ) -> Result<ContentItem, ModerationError> {
        let row = sqlx::query(ARCHIVE_CONTENT_SQL)
            .bind(timestamp(&at))
            .bind(content_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        match row {
            Some(row) => content_from_row(&row),
            None => Err(ModerationError::UnknownContent(content_id)),
        }
    }
}

#[async_trait]
impl VoterDirectory for SqliteModerationStore {
    async fn voter_exists(&self, voter_id: u64) -> Result<bool, ModerationError> {
        let row = sqlx::query("SELECT 1 FROM voters WHERE id = ?")
            .bind(voter_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(row.is_some())
    }
}
