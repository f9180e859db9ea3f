//! B2B Connect Engine - match & conversation core for the B2B Connect platform
//!
//! This library implements candidate selection, swipe processing with
//! exactly-once mutual-match creation, and ordered per-match conversations
//! with live fan-out. Profiles, identity and transport remain external
//! collaborators behind the service seams.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{EngineError, EnginePolicy, MatchEngine};
pub use crate::models::{
    canonical_pair, ChatMessage, InterestRecord, Match, OrgProfile, SwipeDirection, SwipeOutcome,
};
pub use crate::services::{ConversationHub, MemoryProfileStore, MemoryStore, ProfileStore};
