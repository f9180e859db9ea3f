use crate::core::intro::{compose_intro_draft, compose_opening_sequence};
use crate::core::selector::{select_candidates, ExclusionSet};
use crate::models::{ChatMessage, Match, OrgProfile, SwipeDirection, SwipeOutcome};
use crate::services::profile_store::{ProfileStore, ProfileStoreError};
use crate::services::store::{EngineStore, StoreError};
use crate::services::ConversationHub;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Errors surfaced by the engine to its callers
#[derive(Debug, Error)]
pub enum EngineError {
    /// Underlying store unreachable; no engine state changed, safe to retry
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Precondition violation from a stale client view; non-retryable
    #[error("invalid candidate: {0}")]
    InvalidCandidate(String),

    /// Write attempted but failed or outcome unknown; the whole operation is
    /// idempotent, so a caller-driven retry is safe
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// Referenced match does not exist or the caller is not a participant
    #[error("invalid match: {0}")]
    InvalidMatch(String),
}

fn read_failure(err: StoreError) -> EngineError {
    EngineError::StoreUnavailable(err.to_string())
}

fn write_failure(err: StoreError) -> EngineError {
    match err {
        StoreError::Unavailable(msg) => EngineError::StoreUnavailable(msg),
        StoreError::Failed(msg) => EngineError::WriteFailed(msg),
    }
}

fn profile_failure(err: ProfileStoreError) -> EngineError {
    EngineError::StoreUnavailable(err.to_string())
}

/// Policy knobs for the engine
#[derive(Debug, Clone)]
pub struct EnginePolicy {
    /// Record passes durably instead of leaving them session-scoped
    pub persist_passes: bool,
    /// Display name used by the automated opening sequence
    pub assistant_name: String,
    /// Buffer size of each match's live channel
    pub channel_capacity: usize,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            persist_passes: false,
            assistant_name: "AI assistant".to_string(),
            channel_capacity: 256,
        }
    }
}

/// A candidate batch plus the size of the unfiltered pool
#[derive(Debug)]
pub struct CandidateBatch {
    pub candidates: Vec<OrgProfile>,
    pub total_pool: usize,
}

/// Match & conversation engine
///
/// Orchestrates candidate selection, swipe processing with exactly-once
/// mutual-match creation, and per-match ordered chat with live fan-out.
/// Identity arrives explicitly on every call; callers own retry decisions.
pub struct MatchEngine {
    profiles: Arc<dyn ProfileStore>,
    store: Arc<dyn EngineStore>,
    hub: ConversationHub,
    policy: EnginePolicy,
}

impl MatchEngine {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        store: Arc<dyn EngineStore>,
        policy: EnginePolicy,
    ) -> Self {
        let hub = ConversationHub::new(policy.channel_capacity);
        Self {
            profiles,
            store,
            hub,
            policy,
        }
    }

    pub fn store(&self) -> &Arc<dyn EngineStore> {
        &self.store
    }

    /// Next ordered candidate batch for `caller_id`.
    ///
    /// Excludes self, acted-on targets, matched partners and the session's
    /// ephemeral passes. Recomputed from current ledger state on every call.
    pub async fn next_candidates(
        &self,
        caller_id: &str,
        session_excludes: &[String],
        limit: usize,
    ) -> Result<CandidateBatch, EngineError> {
        let acted = self
            .store
            .acted_targets(caller_id)
            .await
            .map_err(read_failure)?;
        let partners: Vec<String> = self
            .store
            .list_matches(caller_id)
            .await
            .map_err(read_failure)?
            .iter()
            .filter_map(|m| m.partner_of(caller_id))
            .map(str::to_string)
            .collect();

        let exclusion = ExclusionSet::new(caller_id)
            .with_acted(acted)
            .with_matched(partners)
            .with_session(session_excludes.iter().cloned());

        let pool = self
            .profiles
            .list_profiles(&exclusion.to_ids())
            .await
            .map_err(profile_failure)?;
        let total_pool = pool.len();

        let candidates = select_candidates(pool, &exclusion, limit);

        tracing::debug!(
            "Selected {} candidates for {} (pool {})",
            candidates.len(),
            caller_id,
            total_pool
        );

        Ok(CandidateBatch {
            candidates,
            total_pool,
        })
    }

    /// Process one directional swipe.
    ///
    /// `like` is idempotent end to end: the ledger write, the reciprocity
    /// check and the registry commit all converge on the same outcome when
    /// retried, so two concurrent reciprocal swipes both report the single
    /// persisted match.
    pub async fn swipe(
        &self,
        caller_id: &str,
        target_id: &str,
        direction: SwipeDirection,
    ) -> Result<SwipeOutcome, EngineError> {
        if caller_id == target_id {
            return Err(EngineError::InvalidCandidate(
                "cannot swipe on your own profile".to_string(),
            ));
        }

        let target_profile = match self.profiles.get_profile(target_id).await {
            Ok(profile) => profile,
            Err(ProfileStoreError::NotFound(_)) => {
                return Err(EngineError::InvalidCandidate(format!(
                    "unknown target {}",
                    target_id
                )))
            }
            Err(err) => return Err(profile_failure(err)),
        };

        let already_acted = self
            .store
            .interest_exists(caller_id, target_id)
            .await
            .map_err(read_failure)?;

        match direction {
            SwipeDirection::Pass => {
                if already_acted
                    || self
                        .store
                        .find_match_by_pair(caller_id, target_id)
                        .await
                        .map_err(read_failure)?
                        .is_some()
                {
                    return Err(EngineError::InvalidCandidate(format!(
                        "{} already acted on {}",
                        caller_id, target_id
                    )));
                }

                if self.policy.persist_passes {
                    self.store
                        .record_interest(caller_id, target_id, SwipeDirection::Pass)
                        .await
                        .map_err(write_failure)?;
                }

                tracing::debug!("Pass: {} -> {}", caller_id, target_id);
                Ok(SwipeOutcome::acted_only())
            }
            SwipeDirection::Like => {
                // A durable pass contradicting this like means the client's
                // view is stale; a prior like is an idempotent repeat.
                if already_acted
                    && !self
                        .store
                        .like_exists(caller_id, target_id)
                        .await
                        .map_err(read_failure)?
                {
                    return Err(EngineError::InvalidCandidate(format!(
                        "{} already passed on {}",
                        caller_id, target_id
                    )));
                }

                self.store
                    .record_interest(caller_id, target_id, SwipeDirection::Like)
                    .await
                    .map_err(write_failure)?;

                let reciprocated = self
                    .store
                    .like_exists(target_id, caller_id)
                    .await
                    .map_err(read_failure)?;
                if !reciprocated {
                    tracing::debug!("Like: {} -> {}", caller_id, target_id);
                    return Ok(SwipeOutcome::acted_only());
                }

                // Both directions exist; commit exactly one match for the
                // pair, whichever racer gets there first.
                let record = self
                    .store
                    .confirm_match(caller_id, target_id)
                    .await
                    .map_err(write_failure)?;

                tracing::info!(
                    "Mutual match {}: {} <-> {}",
                    record.id,
                    record.org_a,
                    record.org_b
                );

                let intro_draft = match self.profiles.get_profile(caller_id).await {
                    Ok(caller_profile) => {
                        Some(compose_intro_draft(&caller_profile, &target_profile))
                    }
                    Err(err) => {
                        tracing::warn!("Skipping intro draft for {}: {}", caller_id, err);
                        None
                    }
                };

                Ok(SwipeOutcome::matched(record, intro_draft))
            }
        }
    }

    pub async fn list_matches(&self, org_id: &str) -> Result<Vec<Match>, EngineError> {
        self.store.list_matches(org_id).await.map_err(read_failure)
    }

    async fn member_match(&self, match_id: Uuid, org_id: &str) -> Result<Match, EngineError> {
        let record = self
            .store
            .get_match(match_id)
            .await
            .map_err(read_failure)?
            .ok_or_else(|| EngineError::InvalidMatch(format!("match {} does not exist", match_id)))?;

        if !record.involves(org_id) {
            return Err(EngineError::InvalidMatch(format!(
                "{} is not a participant of match {}",
                org_id, match_id
            )));
        }

        Ok(record)
    }

    /// Full ordered replay of a match's conversation
    pub async fn history(
        &self,
        match_id: Uuid,
        caller_id: &str,
    ) -> Result<Vec<ChatMessage>, EngineError> {
        self.member_match(match_id, caller_id).await?;
        self.store.history(match_id).await.map_err(read_failure)
    }

    /// Append a message and fan it out to current subscribers
    pub async fn send(
        &self,
        match_id: Uuid,
        sender_id: &str,
        message_text: &str,
        is_automated: bool,
    ) -> Result<ChatMessage, EngineError> {
        let record = self.member_match(match_id, sender_id).await?;
        let receiver_id = record
            .partner_of(sender_id)
            .ok_or_else(|| EngineError::InvalidMatch(format!("match {} is malformed", match_id)))?
            .to_string();

        let message = self
            .store
            .append_message(match_id, sender_id, &receiver_id, message_text, is_automated)
            .await
            .map_err(write_failure)?;

        self.hub.publish(message.clone());
        Ok(message)
    }

    /// Live subscription to a match's channel; delivers only messages
    /// committed after this call. Cancel by dropping the receiver.
    pub async fn subscribe(
        &self,
        match_id: Uuid,
        caller_id: &str,
    ) -> Result<broadcast::Receiver<ChatMessage>, EngineError> {
        self.member_match(match_id, caller_id).await?;
        Ok(self.hub.subscribe(match_id))
    }

    /// Send the automated greeting sequence on behalf of one participant
    pub async fn send_opening_sequence(
        &self,
        match_id: Uuid,
        on_behalf_of: &str,
    ) -> Result<Vec<ChatMessage>, EngineError> {
        let record = self.member_match(match_id, on_behalf_of).await?;
        let partner_id = record
            .partner_of(on_behalf_of)
            .ok_or_else(|| EngineError::InvalidMatch(format!("match {} is malformed", match_id)))?
            .to_string();

        let mine = self
            .profiles
            .get_profile(on_behalf_of)
            .await
            .map_err(profile_failure)?;
        let theirs = self
            .profiles
            .get_profile(&partner_id)
            .await
            .map_err(profile_failure)?;

        let mut sent = Vec::with_capacity(2);
        for text in compose_opening_sequence(&mine, &theirs, &self.policy.assistant_name) {
            sent.push(self.send(match_id, on_behalf_of, &text, true).await?);
        }

        tracing::info!(
            "Opening sequence sent on match {} for {}",
            match_id,
            on_behalf_of
        );

        Ok(sent)
    }

    /// Destroy all of `org_id`'s interest records, its matches and their
    /// conversations. Live subscribers of the destroyed channels observe
    /// end-of-stream. Returns `(interests_deleted, matches_deleted)`.
    pub async fn reset_interactions(&self, org_id: &str) -> Result<(u64, u64), EngineError> {
        let interests_deleted = self
            .store
            .clear_interests(org_id)
            .await
            .map_err(write_failure)?;

        let removed = self
            .store
            .delete_matches_involving(org_id)
            .await
            .map_err(write_failure)?;
        let match_ids: Vec<Uuid> = removed.iter().map(|m| m.id).collect();

        self.store
            .delete_messages_for(&match_ids)
            .await
            .map_err(write_failure)?;
        for id in &match_ids {
            self.hub.close(*id);
        }

        tracing::info!(
            "Reset {}: {} interests, {} matches deleted",
            org_id,
            interests_deleted,
            match_ids.len()
        );

        Ok((interests_deleted, match_ids.len() as u64))
    }

    pub async fn health_check(&self) -> bool {
        self.store.health_check().await.unwrap_or(false)
    }
}
