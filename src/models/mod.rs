// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    canonical_pair, ChatMessage, InterestRecord, Match, OrgProfile, SwipeDirection, SwipeOutcome,
};
pub use requests::{
    NextCandidatesRequest, OpeningSequenceRequest, ResetRequest, SendMessageRequest, SwipeRequest,
};
pub use responses::{
    CandidatesResponse, ErrorResponse, HealthResponse, HistoryResponse, MatchesResponse,
    ResetResponse,
};
