use crate::models::domain::{ChatMessage, Match, OrgProfile};
use serde::{Deserialize, Serialize};

/// Response for the candidates endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidatesResponse {
    pub candidates: Vec<OrgProfile>,
    #[serde(rename = "totalPool")]
    pub total_pool: usize,
}

/// Response for the match listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchesResponse {
    pub matches: Vec<Match>,
}

/// Response for the chat history endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub messages: Vec<ChatMessage>,
}

/// Response for the reset endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    #[serde(rename = "interestsDeleted")]
    pub interests_deleted: u64,
    #[serde(rename = "matchesDeleted")]
    pub matches_deleted: u64,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
