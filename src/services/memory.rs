use crate::models::{canonical_pair, ChatMessage, InterestRecord, Match, SwipeDirection};
use crate::services::store::{EngineStore, StoreError};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

/// In-memory engine store for tests and embedded use.
///
/// One mutex guards all three relations; holding it across the
/// check-then-insert in `confirm_match` is the serialization point that
/// keeps concurrent reciprocal swipes down to a single match row.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    interests: HashMap<(String, String), InterestRecord>,
    matches: HashMap<(String, String), Match>,
    messages: HashMap<Uuid, Vec<ChatMessage>>,
    next_message_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EngineStore for MemoryStore {
    async fn record_interest(
        &self,
        actor_id: &str,
        target_id: &str,
        direction: SwipeDirection,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        let key = (actor_id.to_string(), target_id.to_string());
        if inner.interests.contains_key(&key) {
            return Ok(false);
        }
        inner.interests.insert(
            key,
            InterestRecord {
                actor_id: actor_id.to_string(),
                target_id: target_id.to_string(),
                direction,
                created_at: Utc::now(),
            },
        );
        Ok(true)
    }

    async fn interest_exists(&self, actor_id: &str, target_id: &str) -> Result<bool, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .interests
            .contains_key(&(actor_id.to_string(), target_id.to_string())))
    }

    async fn like_exists(&self, actor_id: &str, target_id: &str) -> Result<bool, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .interests
            .get(&(actor_id.to_string(), target_id.to_string()))
            .map(|r| r.direction == SwipeDirection::Like)
            .unwrap_or(false))
    }

    async fn acted_targets(&self, actor_id: &str) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .interests
            .values()
            .filter(|r| r.actor_id == actor_id)
            .map(|r| r.target_id.clone())
            .collect())
    }

    async fn clear_interests(&self, actor_id: &str) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;
        let before = inner.interests.len();
        inner.interests.retain(|(actor, _), _| actor != actor_id);
        Ok((before - inner.interests.len()) as u64)
    }

    async fn confirm_match(&self, a: &str, b: &str) -> Result<Match, StoreError> {
        let mut inner = self.inner.lock().await;
        let key = canonical_pair(a, b);
        if let Some(existing) = inner.matches.get(&key) {
            return Ok(existing.clone());
        }
        let record = Match {
            id: Uuid::new_v4(),
            org_a: key.0.clone(),
            org_b: key.1.clone(),
            created_at: Utc::now(),
        };
        inner.matches.insert(key, record.clone());
        Ok(record)
    }

    async fn get_match(&self, match_id: Uuid) -> Result<Option<Match>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.matches.values().find(|m| m.id == match_id).cloned())
    }

    async fn find_match_by_pair(&self, a: &str, b: &str) -> Result<Option<Match>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.matches.get(&canonical_pair(a, b)).cloned())
    }

    async fn list_matches(&self, org_id: &str) -> Result<Vec<Match>, StoreError> {
        let inner = self.inner.lock().await;
        let mut matches: Vec<Match> = inner
            .matches
            .values()
            .filter(|m| m.involves(org_id))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(matches)
    }

    async fn delete_matches_involving(&self, org_id: &str) -> Result<Vec<Match>, StoreError> {
        let mut inner = self.inner.lock().await;
        let removed: Vec<Match> = inner
            .matches
            .values()
            .filter(|m| m.involves(org_id))
            .cloned()
            .collect();
        inner.matches.retain(|_, m| !m.involves(org_id));
        Ok(removed)
    }

    async fn append_message(
        &self,
        match_id: Uuid,
        sender_id: &str,
        receiver_id: &str,
        message_text: &str,
        is_automated: bool,
    ) -> Result<ChatMessage, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.next_message_id += 1;
        let id = inner.next_message_id;

        let log = inner.messages.entry(match_id).or_default();
        // Strictly increasing created_at within a match, even when appends
        // land inside the same clock tick.
        let now = Utc::now();
        let created_at = match log.last() {
            Some(last) if last.created_at >= now => last.created_at + Duration::microseconds(1),
            _ => now,
        };

        let message = ChatMessage {
            id,
            match_id,
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            message_text: message_text.to_string(),
            is_automated,
            created_at,
        };
        log.push(message.clone());
        Ok(message)
    }

    async fn history(&self, match_id: Uuid) -> Result<Vec<ChatMessage>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.messages.get(&match_id).cloned().unwrap_or_default())
    }

    async fn delete_messages_for(&self, match_ids: &[Uuid]) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;
        let mut deleted = 0u64;
        for id in match_ids {
            if let Some(log) = inner.messages.remove(id) {
                deleted += log.len() as u64;
            }
        }
        Ok(deleted)
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}
