// Core engine exports
pub mod engine;
pub mod intro;
pub mod selector;

pub use engine::{CandidateBatch, EngineError, EnginePolicy, MatchEngine};
pub use intro::{compose_intro_draft, compose_opening_sequence};
pub use selector::{select_candidates, ExclusionSet};
