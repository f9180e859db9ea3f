use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Organization profile as stored by the external profile store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgProfile {
    pub id: String,
    #[serde(rename = "companyName")]
    pub company_name: String,
    pub industry: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(rename = "companySize", default)]
    pub company_size: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "lookingFor", default)]
    pub looking_for: Vec<String>,
    #[serde(rename = "logoUrl", default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl OrgProfile {
    /// Comma-joined looking-for tags with a fallback used by intro templates
    pub fn looking_for_text(&self, fallback: &str) -> String {
        if self.looking_for.is_empty() {
            fallback.to_string()
        } else {
            self.looking_for.join(", ")
        }
    }
}

/// Direction of a swipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    Like,
    Pass,
}

impl SwipeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwipeDirection::Like => "like",
            SwipeDirection::Pass => "pass",
        }
    }
}

/// Directional interest record written by the swipe processor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestRecord {
    #[serde(rename = "actorId")]
    pub actor_id: String,
    #[serde(rename = "targetId")]
    pub target_id: String,
    pub direction: SwipeDirection,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Confirmed bidirectional match
///
/// `org_a` and `org_b` are always stored in canonical (lexicographic) order
/// so the unordered pair has exactly one representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: Uuid,
    #[serde(rename = "orgA")]
    pub org_a: String,
    #[serde(rename = "orgB")]
    pub org_b: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Match {
    pub fn involves(&self, org_id: &str) -> bool {
        self.org_a == org_id || self.org_b == org_id
    }

    /// The matched partner of `org_id`, if `org_id` participates at all
    pub fn partner_of(&self, org_id: &str) -> Option<&str> {
        if self.org_a == org_id {
            Some(&self.org_b)
        } else if self.org_b == org_id {
            Some(&self.org_a)
        } else {
            None
        }
    }
}

/// Canonical unordered-pair key for the match registry
pub fn canonical_pair(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Chat message in a match's conversation channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    #[serde(rename = "matchId")]
    pub match_id: Uuid,
    #[serde(rename = "senderId")]
    pub sender_id: String,
    #[serde(rename = "receiverId")]
    pub receiver_id: String,
    #[serde(rename = "messageText")]
    pub message_text: String,
    #[serde(rename = "isAutomated")]
    pub is_automated: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Outcome of one swipe operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeOutcome {
    pub acted: bool,
    pub matched: bool,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_record: Option<Match>,
    /// Editable introduction draft offered to the acting user on a fresh
    /// match; nothing is persisted until the user sends it themselves.
    #[serde(rename = "introDraft", skip_serializing_if = "Option::is_none")]
    pub intro_draft: Option<String>,
}

impl SwipeOutcome {
    pub fn acted_only() -> Self {
        Self {
            acted: true,
            matched: false,
            match_record: None,
            intro_draft: None,
        }
    }

    pub fn matched(match_record: Match, intro_draft: Option<String>) -> Self {
        Self {
            acted: true,
            matched: true,
            match_record: Some(match_record),
            intro_draft,
        }
    }
}
