use crate::models::OrgProfile;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Exclusion set for one caller: self, every target already acted on,
/// every matched partner, and the session's ephemeral passes.
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    caller_id: String,
    excluded: HashSet<String>,
}

impl ExclusionSet {
    pub fn new(caller_id: &str) -> Self {
        Self {
            caller_id: caller_id.to_string(),
            excluded: HashSet::new(),
        }
    }

    pub fn with_acted<I: IntoIterator<Item = String>>(mut self, acted: I) -> Self {
        self.excluded.extend(acted);
        self
    }

    pub fn with_matched<I: IntoIterator<Item = String>>(mut self, partners: I) -> Self {
        self.excluded.extend(partners);
        self
    }

    pub fn with_session<I: IntoIterator<Item = String>>(mut self, session: I) -> Self {
        self.excluded.extend(session);
        self
    }

    pub fn excludes(&self, org_id: &str) -> bool {
        org_id == self.caller_id || self.excluded.contains(org_id)
    }

    /// Flattened id list for server-side pre-filtering by the profile store
    pub fn to_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.excluded.iter().cloned().collect();
        ids.push(self.caller_id.clone());
        ids
    }
}

fn sort_key(profile: &OrgProfile) -> (DateTime<Utc>, &str) {
    (
        profile.created_at.unwrap_or(DateTime::<Utc>::MIN_UTC),
        profile.id.as_str(),
    )
}

/// Select the next candidate batch for a caller.
///
/// Filters the fetched pool through the exclusion set and returns up to
/// `limit` profiles in `(created_at, id)` order, so the sequence is
/// deterministic and stable across calls until the underlying data changes.
pub fn select_candidates(
    pool: Vec<OrgProfile>,
    exclusion: &ExclusionSet,
    limit: usize,
) -> Vec<OrgProfile> {
    let mut candidates: Vec<OrgProfile> = pool
        .into_iter()
        .filter(|profile| !exclusion.excludes(&profile.id))
        .collect();

    candidates.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
    candidates.truncate(limit);
    candidates
}
