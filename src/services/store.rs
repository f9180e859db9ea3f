use crate::models::{ChatMessage, Match, SwipeDirection};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when interacting with an engine store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Unavailable(String),

    #[error("store operation failed: {0}")]
    Failed(String),
}

impl StoreError {
    /// Transient errors left no state behind and are safe to retry
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Storage seam for the three engine relations: interest records, matches
/// and chat messages.
///
/// Implementations must provide an atomic insert-or-fetch-existing
/// `confirm_match` keyed by the canonicalized unordered pair, so that
/// concurrent creation attempts for the same pair resolve to exactly one
/// persisted row with every caller observing it.
#[async_trait]
pub trait EngineStore: Send + Sync {
    /// Record a directional interest. Returns `false` if a record for the
    /// ordered pair already existed (idempotent no-op).
    async fn record_interest(
        &self,
        actor_id: &str,
        target_id: &str,
        direction: SwipeDirection,
    ) -> Result<bool, StoreError>;

    /// Whether any interest record exists for the ordered pair
    async fn interest_exists(&self, actor_id: &str, target_id: &str) -> Result<bool, StoreError>;

    /// Whether a `like` record exists for the ordered pair
    async fn like_exists(&self, actor_id: &str, target_id: &str) -> Result<bool, StoreError>;

    /// All targets the actor has acted on, in any direction
    async fn acted_targets(&self, actor_id: &str) -> Result<Vec<String>, StoreError>;

    /// Delete every interest record where `actor_id` is the actor
    async fn clear_interests(&self, actor_id: &str) -> Result<u64, StoreError>;

    /// Insert-or-fetch the match for the unordered pair `{a, b}`
    async fn confirm_match(&self, a: &str, b: &str) -> Result<Match, StoreError>;

    async fn get_match(&self, match_id: Uuid) -> Result<Option<Match>, StoreError>;

    /// The existing match for the unordered pair, if any
    async fn find_match_by_pair(&self, a: &str, b: &str) -> Result<Option<Match>, StoreError>;

    async fn list_matches(&self, org_id: &str) -> Result<Vec<Match>, StoreError>;

    /// Delete all matches involving `org_id`, returning the deleted rows so
    /// the caller can cascade.
    async fn delete_matches_involving(&self, org_id: &str) -> Result<Vec<Match>, StoreError>;

    /// Append a message to a match's log, assigning its id and a
    /// monotonically ordered position.
    async fn append_message(
        &self,
        match_id: Uuid,
        sender_id: &str,
        receiver_id: &str,
        message_text: &str,
        is_automated: bool,
    ) -> Result<ChatMessage, StoreError>;

    /// Full replay of a match's log ordered by `(created_at, id)`
    async fn history(&self, match_id: Uuid) -> Result<Vec<ChatMessage>, StoreError>;

    /// Delete the logs of the given matches (reset cascade)
    async fn delete_messages_for(&self, match_ids: &[Uuid]) -> Result<u64, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}
