// Integration tests for the B2B Connect engine
//
// Exercises the full engine over the in-memory stores: candidate exclusion,
// swipe processing with the reciprocal-match race, conversation ordering and
// live delivery, and the reset cascade.

use b2b_connect_engine::core::{EngineError, EnginePolicy, MatchEngine};
use b2b_connect_engine::models::{OrgProfile, SwipeDirection};
use b2b_connect_engine::services::{EngineStore, MemoryProfileStore, MemoryStore};
use chrono::{TimeZone, Utc};
use std::sync::Arc;

fn create_profile(id: &str, created_minute: u32) -> OrgProfile {
    OrgProfile {
        id: id.to_string(),
        company_name: format!("Org {}", id),
        industry: "Technology".to_string(),
        location: Some("Berlin".to_string()),
        company_size: Some("11-50 employees".to_string()),
        description: Some("A test organization".to_string()),
        looking_for: vec!["Partnership".to_string(), "Clients".to_string()],
        logo_url: None,
        email: Some(format!("hello@{}.example", id)),
        created_at: Some(Utc.with_ymd_and_hms(2025, 3, 1, 9, created_minute, 0).unwrap()),
    }
}

async fn build_engine(
    org_ids: &[&str],
    policy: EnginePolicy,
) -> (Arc<MatchEngine>, Arc<MemoryStore>) {
    let profiles = Arc::new(MemoryProfileStore::new());
    for (i, id) in org_ids.iter().enumerate() {
        profiles.insert(create_profile(id, i as u32)).await;
    }

    let store = Arc::new(MemoryStore::new());
    let engine = Arc::new(MatchEngine::new(profiles, store.clone(), policy));
    (engine, store)
}

async fn default_engine(org_ids: &[&str]) -> (Arc<MatchEngine>, Arc<MemoryStore>) {
    build_engine(org_ids, EnginePolicy::default()).await
}

fn candidate_ids(batch: &b2b_connect_engine::core::CandidateBatch) -> Vec<String> {
    batch.candidates.iter().map(|p| p.id.clone()).collect()
}

#[tokio::test]
async fn test_scenario_a_like_without_reciprocity() {
    let (engine, _) = default_engine(&["org-1", "org-2", "org-3"]).await;

    let outcome = engine
        .swipe("org-1", "org-2", SwipeDirection::Like)
        .await
        .unwrap();

    assert!(outcome.acted);
    assert!(!outcome.matched);
    assert!(outcome.match_record.is_none());

    let batch = engine.next_candidates("org-1", &[], 10).await.unwrap();
    assert!(!candidate_ids(&batch).contains(&"org-2".to_string()));
    assert!(candidate_ids(&batch).contains(&"org-3".to_string()));
}

#[tokio::test]
async fn test_scenario_b_reciprocal_like_creates_match() {
    let (engine, _) = default_engine(&["org-1", "org-2"]).await;

    engine
        .swipe("org-2", "org-1", SwipeDirection::Like)
        .await
        .unwrap();
    let outcome = engine
        .swipe("org-1", "org-2", SwipeDirection::Like)
        .await
        .unwrap();

    assert!(outcome.matched);
    let record = outcome.match_record.expect("match expected");
    assert!(record.involves("org-1") && record.involves("org-2"));

    // The acting side gets an editable intro draft built from both profiles
    let draft = outcome.intro_draft.expect("intro draft expected");
    assert!(draft.contains("Org org-1"));
    assert!(draft.contains("Org org-2"));

    // Exactly one match row, visible identically from both sides
    let from_one = engine.list_matches("org-1").await.unwrap();
    let from_two = engine.list_matches("org-2").await.unwrap();
    assert_eq!(from_one.len(), 1);
    assert_eq!(from_two.len(), 1);
    assert_eq!(from_one[0].id, from_two[0].id);
}

#[tokio::test]
async fn test_scenario_c_concurrent_reciprocal_race() {
    let (engine, store) = default_engine(&["org-1", "org-2"]).await;

    // Both directions already written, as when two swipes land together and
    // each sees the other's record; both processes now detect reciprocity.
    store
        .record_interest("org-1", "org-2", SwipeDirection::Like)
        .await
        .unwrap();
    store
        .record_interest("org-2", "org-1", SwipeDirection::Like)
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        engine.swipe("org-1", "org-2", SwipeDirection::Like),
        engine.swipe("org-2", "org-1", SwipeDirection::Like),
    );

    let a = a.unwrap();
    let b = b.unwrap();
    assert!(a.matched && b.matched);

    let match_a = a.match_record.unwrap();
    let match_b = b.match_record.unwrap();
    assert_eq!(match_a.id, match_b.id);

    assert_eq!(engine.list_matches("org-1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_concurrent_fresh_swipes_create_one_match() {
    let (engine, _) = default_engine(&["org-1", "org-2"]).await;

    let (a, b) = tokio::join!(
        engine.swipe("org-1", "org-2", SwipeDirection::Like),
        engine.swipe("org-2", "org-1", SwipeDirection::Like),
    );

    assert!(a.is_ok() && b.is_ok());
    // Whichever interleaving occurred, at most one match row exists and at
    // least one side observed it.
    let matches = engine.list_matches("org-1").await.unwrap();
    assert_eq!(matches.len(), 1);
    assert!(a.unwrap().matched || b.unwrap().matched);
}

#[tokio::test]
async fn test_idempotent_like() {
    let (engine, store) = default_engine(&["org-1", "org-2"]).await;

    let first = engine
        .swipe("org-1", "org-2", SwipeDirection::Like)
        .await
        .unwrap();
    let second = engine
        .swipe("org-1", "org-2", SwipeDirection::Like)
        .await
        .unwrap();

    assert_eq!(first.matched, second.matched);
    assert_eq!(store.acted_targets("org-1").await.unwrap().len(), 1);

    // Repeating a like after reciprocity converges on the same single match
    engine
        .swipe("org-2", "org-1", SwipeDirection::Like)
        .await
        .unwrap();
    let third = engine
        .swipe("org-1", "org-2", SwipeDirection::Like)
        .await
        .unwrap();
    assert!(third.matched);
    assert_eq!(engine.list_matches("org-1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_candidate_preconditions() {
    let (engine, _) = default_engine(&["org-1", "org-2"]).await;

    let self_swipe = engine.swipe("org-1", "org-1", SwipeDirection::Like).await;
    assert!(matches!(self_swipe, Err(EngineError::InvalidCandidate(_))));

    let unknown = engine.swipe("org-1", "org-404", SwipeDirection::Like).await;
    assert!(matches!(unknown, Err(EngineError::InvalidCandidate(_))));

    // A pass on an already-liked target is a stale client view
    engine
        .swipe("org-1", "org-2", SwipeDirection::Like)
        .await
        .unwrap();
    let stale_pass = engine.swipe("org-1", "org-2", SwipeDirection::Pass).await;
    assert!(matches!(stale_pass, Err(EngineError::InvalidCandidate(_))));
}

#[tokio::test]
async fn test_pass_is_session_scoped_by_default() {
    let (engine, store) = default_engine(&["org-1", "org-2", "org-3"]).await;

    let outcome = engine
        .swipe("org-1", "org-2", SwipeDirection::Pass)
        .await
        .unwrap();
    assert!(outcome.acted && !outcome.matched);

    // No durable record; the exclusion only holds within the session list
    assert!(store.acted_targets("org-1").await.unwrap().is_empty());

    let without_session = engine.next_candidates("org-1", &[], 10).await.unwrap();
    assert!(candidate_ids(&without_session).contains(&"org-2".to_string()));

    let with_session = engine
        .next_candidates("org-1", &["org-2".to_string()], 10)
        .await
        .unwrap();
    assert!(!candidate_ids(&with_session).contains(&"org-2".to_string()));
}

#[tokio::test]
async fn test_persisted_pass_policy() {
    let policy = EnginePolicy {
        persist_passes: true,
        ..EnginePolicy::default()
    };
    let (engine, store) = build_engine(&["org-1", "org-2"], policy).await;

    engine
        .swipe("org-1", "org-2", SwipeDirection::Pass)
        .await
        .unwrap();

    assert_eq!(store.acted_targets("org-1").await.unwrap(), vec!["org-2"]);

    let batch = engine.next_candidates("org-1", &[], 10).await.unwrap();
    assert!(candidate_ids(&batch).is_empty());

    // A later like against the durable pass flags the stale view
    let stale_like = engine.swipe("org-1", "org-2", SwipeDirection::Like).await;
    assert!(matches!(stale_like, Err(EngineError::InvalidCandidate(_))));
}

#[tokio::test]
async fn test_exclusion_invariant_holds() {
    let (engine, _) = default_engine(&["org-1", "org-2", "org-3", "org-4", "org-5"]).await;

    engine
        .swipe("org-1", "org-2", SwipeDirection::Like)
        .await
        .unwrap();
    engine
        .swipe("org-3", "org-1", SwipeDirection::Like)
        .await
        .unwrap();
    engine
        .swipe("org-1", "org-3", SwipeDirection::Like)
        .await
        .unwrap(); // matches org-3

    let batch = engine.next_candidates("org-1", &[], 10).await.unwrap();
    let ids = candidate_ids(&batch);

    assert!(!ids.contains(&"org-1".to_string()));
    assert!(!ids.contains(&"org-2".to_string()));
    assert!(!ids.contains(&"org-3".to_string()));
    assert_eq!(ids, vec!["org-4".to_string(), "org-5".to_string()]);
}

async fn create_match(engine: &MatchEngine, a: &str, b: &str) -> b2b_connect_engine::models::Match {
    engine.swipe(a, b, SwipeDirection::Like).await.unwrap();
    engine
        .swipe(b, a, SwipeDirection::Like)
        .await
        .unwrap()
        .match_record
        .unwrap()
}

#[tokio::test]
async fn test_scenario_d_history_then_subscribe() {
    let (engine, _) = default_engine(&["org-1", "org-2"]).await;
    let record = create_match(&engine, "org-1", "org-2").await;

    engine
        .send(record.id, "org-1", "first", false)
        .await
        .unwrap();
    engine
        .send(record.id, "org-1", "second", false)
        .await
        .unwrap();

    // Participant 2 reads history, then subscribes
    let history = engine.history(record.id, "org-2").await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].created_at < history[1].created_at);

    let mut rx = engine.subscribe(record.id, "org-2").await.unwrap();

    let third = engine
        .send(record.id, "org-1", "third", false)
        .await
        .unwrap();

    // Exactly one live message, strictly after everything already read
    let delivered = rx.recv().await.unwrap();
    assert_eq!(delivered.id, third.id);
    assert_eq!(delivered.message_text, "third");
    assert!(delivered.created_at > history[1].created_at);
    assert!(delivered.id > history[1].id);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_send_validates_membership() {
    let (engine, _) = default_engine(&["org-1", "org-2", "org-3"]).await;
    let record = create_match(&engine, "org-1", "org-2").await;

    let outsider = engine.send(record.id, "org-3", "let me in", false).await;
    assert!(matches!(outsider, Err(EngineError::InvalidMatch(_))));

    let missing = engine
        .send(uuid::Uuid::new_v4(), "org-1", "hello?", false)
        .await;
    assert!(matches!(missing, Err(EngineError::InvalidMatch(_))));

    let history_outsider = engine.history(record.id, "org-3").await;
    assert!(matches!(history_outsider, Err(EngineError::InvalidMatch(_))));
}

#[tokio::test]
async fn test_message_receiver_is_partner() {
    let (engine, _) = default_engine(&["org-1", "org-2"]).await;
    let record = create_match(&engine, "org-1", "org-2").await;

    let message = engine
        .send(record.id, "org-2", "hello from two", false)
        .await
        .unwrap();

    assert_eq!(message.sender_id, "org-2");
    assert_eq!(message.receiver_id, "org-1");
    assert!(!message.is_automated);
}

#[tokio::test]
async fn test_opening_sequence_orders_and_delivers() {
    let (engine, _) = default_engine(&["org-1", "org-2"]).await;
    let record = create_match(&engine, "org-1", "org-2").await;

    let mut rx = engine.subscribe(record.id, "org-2").await.unwrap();

    let sent = engine
        .send_opening_sequence(record.id, "org-1")
        .await
        .unwrap();

    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|m| m.is_automated));
    assert!(sent.iter().all(|m| m.sender_id == "org-1"));
    assert!(sent[0].created_at < sent[1].created_at);
    assert!(sent[0].message_text.contains("Hello Org org-2 team!"));

    // Live delivery preserves commit order
    assert_eq!(rx.recv().await.unwrap().id, sent[0].id);
    assert_eq!(rx.recv().await.unwrap().id, sent[1].id);

    let history = engine.history(record.id, "org-1").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, sent[0].id);
}

#[tokio::test]
async fn test_reset_completeness() {
    let (engine, _) = default_engine(&["org-1", "org-2", "org-3", "org-4"]).await;

    engine
        .swipe("org-1", "org-4", SwipeDirection::Like)
        .await
        .unwrap();
    let record = create_match(&engine, "org-1", "org-2").await;
    engine
        .send(record.id, "org-1", "soon to vanish", false)
        .await
        .unwrap();

    let mut rx = engine.subscribe(record.id, "org-2").await.unwrap();

    let (interests, matches) = engine.reset_interactions("org-1").await.unwrap();
    assert_eq!(interests, 2);
    assert_eq!(matches, 1);

    // Full pool returns, minus self
    let batch = engine.next_candidates("org-1", &[], 10).await.unwrap();
    assert_eq!(
        candidate_ids(&batch),
        vec![
            "org-2".to_string(),
            "org-3".to_string(),
            "org-4".to_string()
        ]
    );

    assert!(engine.list_matches("org-1").await.unwrap().is_empty());
    assert!(engine.list_matches("org-2").await.unwrap().is_empty());

    // The cascade destroyed the conversation and closed its live channel
    let history = engine.history(record.id, "org-2").await;
    assert!(matches!(history, Err(EngineError::InvalidMatch(_))));
    assert!(matches!(
        rx.recv().await,
        Err(tokio::sync::broadcast::error::RecvError::Closed)
    ));

    // The other party's own records toward third parties are untouched
    engine
        .swipe("org-2", "org-3", SwipeDirection::Like)
        .await
        .unwrap();
    let batch_two = engine.next_candidates("org-2", &[], 10).await.unwrap();
    assert!(!candidate_ids(&batch_two).contains(&"org-3".to_string()));
}

#[tokio::test]
async fn test_reset_allows_rematching() {
    let (engine, _) = default_engine(&["org-1", "org-2"]).await;
    create_match(&engine, "org-1", "org-2").await;

    engine.reset_interactions("org-1").await.unwrap();

    // org-2's like toward org-1 was org-2's own record and was not deleted;
    // org-1 re-liking org-2 immediately re-confirms a fresh match.
    let outcome = engine
        .swipe("org-1", "org-2", SwipeDirection::Like)
        .await
        .unwrap();
    assert!(outcome.matched);
}
