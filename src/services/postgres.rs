use crate::models::{canonical_pair, ChatMessage, Match, SwipeDirection};
use crate::services::store::{EngineStore, StoreError};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use uuid::Uuid;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Tls(_) => StoreError::Unavailable(err.to_string()),
            other => StoreError::Failed(other.to_string()),
        }
    }
}

/// PostgreSQL engine store
///
/// Holds the interest ledger, match registry and chat log. The
/// `(org_a, org_b)` primary key on `matches` carries the canonical-pair
/// uniqueness invariant; `confirm_match` inserts with `ON CONFLICT DO
/// NOTHING` and then reads the surviving row, so a race loser observes the
/// winner's match instead of an error.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new store from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Failed(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Create a new store from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(url, max_connections.unwrap_or(10), min_connections.unwrap_or(1)).await
    }

    fn match_from_row(row: &sqlx::postgres::PgRow) -> Match {
        Match {
            id: row.get("id"),
            org_a: row.get("org_a"),
            org_b: row.get("org_b"),
            created_at: row.get("created_at"),
        }
    }

    fn message_from_row(row: &sqlx::postgres::PgRow) -> ChatMessage {
        ChatMessage {
            id: row.get("id"),
            match_id: row.get("match_id"),
            sender_id: row.get("sender_id"),
            receiver_id: row.get("receiver_id"),
            message_text: row.get("message_text"),
            is_automated: row.get("is_automated"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl EngineStore for PostgresStore {
    async fn record_interest(
        &self,
        actor_id: &str,
        target_id: &str,
        direction: SwipeDirection,
    ) -> Result<bool, StoreError> {
        let query = r#"
            INSERT INTO interest_records (actor_id, target_id, direction, created_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (actor_id, target_id) DO NOTHING
        "#;

        let result = sqlx::query(query)
            .bind(actor_id)
            .bind(target_id)
            .bind(direction.as_str())
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            "Recorded interest: {} -> {} ({})",
            actor_id,
            target_id,
            direction.as_str()
        );

        Ok(result.rows_affected() > 0)
    }

    async fn interest_exists(&self, actor_id: &str, target_id: &str) -> Result<bool, StoreError> {
        let row = sqlx::query(
            "SELECT 1 AS one FROM interest_records WHERE actor_id = $1 AND target_id = $2",
        )
        .bind(actor_id)
        .bind(target_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    async fn like_exists(&self, actor_id: &str, target_id: &str) -> Result<bool, StoreError> {
        let row = sqlx::query(
            "SELECT 1 AS one FROM interest_records \
             WHERE actor_id = $1 AND target_id = $2 AND direction = 'like'",
        )
        .bind(actor_id)
        .bind(target_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    async fn acted_targets(&self, actor_id: &str) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query("SELECT target_id FROM interest_records WHERE actor_id = $1")
            .bind(actor_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|row| row.get("target_id")).collect())
    }

    async fn clear_interests(&self, actor_id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM interest_records WHERE actor_id = $1")
            .bind(actor_id)
            .execute(&self.pool)
            .await?;

        tracing::info!(
            "Cleared {} interest records for {}",
            result.rows_affected(),
            actor_id
        );

        Ok(result.rows_affected())
    }

    async fn confirm_match(&self, a: &str, b: &str) -> Result<Match, StoreError> {
        let (org_a, org_b) = canonical_pair(a, b);

        sqlx::query(
            r#"
            INSERT INTO matches (id, org_a, org_b, created_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (org_a, org_b) DO NOTHING
        "#,
        )
        .bind(Uuid::new_v4())
        .bind(&org_a)
        .bind(&org_b)
        .execute(&self.pool)
        .await?;

        // Fetch the surviving row whether we inserted it or lost the race
        let row = sqlx::query(
            "SELECT id, org_a, org_b, created_at FROM matches WHERE org_a = $1 AND org_b = $2",
        )
        .bind(&org_a)
        .bind(&org_b)
        .fetch_one(&self.pool)
        .await?;

        Ok(Self::match_from_row(&row))
    }

    async fn get_match(&self, match_id: Uuid) -> Result<Option<Match>, StoreError> {
        let row = sqlx::query("SELECT id, org_a, org_b, created_at FROM matches WHERE id = $1")
            .bind(match_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(Self::match_from_row))
    }

    async fn find_match_by_pair(&self, a: &str, b: &str) -> Result<Option<Match>, StoreError> {
        let (org_a, org_b) = canonical_pair(a, b);

        let row = sqlx::query(
            "SELECT id, org_a, org_b, created_at FROM matches WHERE org_a = $1 AND org_b = $2",
        )
        .bind(org_a)
        .bind(org_b)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::match_from_row))
    }

    async fn list_matches(&self, org_id: &str) -> Result<Vec<Match>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, org_a, org_b, created_at FROM matches \
             WHERE org_a = $1 OR org_b = $1 ORDER BY created_at, id",
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::match_from_row).collect())
    }

    async fn delete_matches_involving(&self, org_id: &str) -> Result<Vec<Match>, StoreError> {
        let rows = sqlx::query(
            "DELETE FROM matches WHERE org_a = $1 OR org_b = $1 \
             RETURNING id, org_a, org_b, created_at",
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::match_from_row).collect())
    }

    async fn append_message(
        &self,
        match_id: Uuid,
        sender_id: &str,
        receiver_id: &str,
        message_text: &str,
        is_automated: bool,
    ) -> Result<ChatMessage, StoreError> {
        // clock_timestamp() advances within a transaction, so back-to-back
        // appends keep distinct timestamps; ties still break on the serial id.
        let row = sqlx::query(
            r#"
            INSERT INTO chat_messages (match_id, sender_id, receiver_id, message_text, is_automated, created_at)
            VALUES ($1, $2, $3, $4, $5, clock_timestamp())
            RETURNING id, match_id, sender_id, receiver_id, message_text, is_automated, created_at
        "#,
        )
        .bind(match_id)
        .bind(sender_id)
        .bind(receiver_id)
        .bind(message_text)
        .bind(is_automated)
        .fetch_one(&self.pool)
        .await?;

        Ok(Self::message_from_row(&row))
    }

    async fn history(&self, match_id: Uuid) -> Result<Vec<ChatMessage>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, match_id, sender_id, receiver_id, message_text, is_automated, created_at \
             FROM chat_messages WHERE match_id = $1 ORDER BY created_at, id",
        )
        .bind(match_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::message_from_row).collect())
    }

    async fn delete_messages_for(&self, match_ids: &[Uuid]) -> Result<u64, StoreError> {
        if match_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM chat_messages WHERE match_id = ANY($1)")
            .bind(match_ids)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
