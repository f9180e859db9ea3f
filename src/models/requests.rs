use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request for the next batch of candidates
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NextCandidatesRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[serde(default = "default_limit")]
    pub limit: u16,
    /// Profiles passed on in this browsing session; not durably excluded
    /// unless pass persistence is enabled.
    #[serde(default)]
    #[serde(alias = "exclude_ids", rename = "excludeIds")]
    pub exclude_ids: Vec<String>,
}

fn default_limit() -> u16 {
    20
}

/// Request to process a swipe
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SwipeRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "target_id", rename = "targetId")]
    pub target_id: String,
    /// "like" or "pass"
    pub direction: String,
}

/// Request to send a chat message
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "sender_id", rename = "senderId")]
    pub sender_id: String,
    #[validate(length(min = 1, max = 4000))]
    #[serde(alias = "message_text", rename = "messageText")]
    pub message_text: String,
}

/// Request to send the automated opening sequence on behalf of one party
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OpeningSequenceRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
}

/// Request to reset a user's interactions
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResetRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
}
