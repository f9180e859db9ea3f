use crate::models::OrgProfile;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors that can occur when interacting with the profile store
#[derive(Debug, Error)]
pub enum ProfileStoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: invalid API key")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// External profile store collaborator
///
/// Organization records are owned by this store; the engine only reads them
/// and forwards field updates through `update_profile`.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, org_id: &str) -> Result<OrgProfile, ProfileStoreError>;

    /// All profiles except the given ids. Implementations may pre-filter
    /// server-side; callers re-filter regardless.
    async fn list_profiles(&self, excluding: &[String]) -> Result<Vec<OrgProfile>, ProfileStoreError>;

    async fn update_profile(
        &self,
        org_id: &str,
        fields: Value,
    ) -> Result<OrgProfile, ProfileStoreError>;
}

/// HTTP client for a document-API profile backend
pub struct HttpProfileStore {
    base_url: String,
    api_key: String,
    client: Client,
    cache: moka::future::Cache<String, OrgProfile>,
}

impl HttpProfileStore {
    pub fn new(base_url: String, api_key: String, cache_size: u64, cache_ttl_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        let cache = moka::future::CacheBuilder::new(cache_size)
            .time_to_live(Duration::from_secs(cache_ttl_secs))
            .build();

        Self {
            base_url,
            api_key,
            client,
            cache,
        }
    }

    fn profiles_url(&self) -> String {
        format!("{}/profiles", self.base_url.trim_end_matches('/'))
    }

    fn check_status(status: reqwest::StatusCode, context: &str) -> Result<(), ProfileStoreError> {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProfileStoreError::Unauthorized);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProfileStoreError::NotFound(context.to_string()));
        }
        if !status.is_success() {
            return Err(ProfileStoreError::ApiError(format!(
                "{}: {}",
                context, status
            )));
        }
        Ok(())
    }

    fn parse_documents(json: &Value) -> Result<Vec<OrgProfile>, ProfileStoreError> {
        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .ok_or_else(|| ProfileStoreError::InvalidResponse("Missing documents array".into()))?;

        Ok(documents
            .iter()
            .filter_map(|doc| {
                let data = doc.get("data").unwrap_or(doc);
                serde_json::from_value(data.clone()).ok()
            })
            .collect())
    }
}

#[async_trait]
impl ProfileStore for HttpProfileStore {
    async fn get_profile(&self, org_id: &str) -> Result<OrgProfile, ProfileStoreError> {
        if let Some(profile) = self.cache.get(org_id).await {
            tracing::trace!("Profile cache hit: {}", org_id);
            return Ok(profile);
        }

        let url = format!(
            "{}/{}",
            self.profiles_url(),
            urlencoding::encode(org_id)
        );

        tracing::debug!("Fetching profile for org: {}", org_id);

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        Self::check_status(response.status(), &format!("profile {}", org_id))?;

        let json: Value = response.json().await?;
        let data = json.get("data").unwrap_or(&json);

        let profile: OrgProfile = serde_json::from_value(data.clone()).map_err(|e| {
            ProfileStoreError::InvalidResponse(format!("Failed to parse profile: {}", e))
        })?;

        self.cache.insert(org_id.to_string(), profile.clone()).await;

        Ok(profile)
    }

    async fn list_profiles(&self, excluding: &[String]) -> Result<Vec<OrgProfile>, ProfileStoreError> {
        let mut url = self.profiles_url();
        if !excluding.is_empty() {
            let filter = serde_json::to_string(excluding)
                .map_err(|e| ProfileStoreError::InvalidResponse(e.to_string()))?;
            url = format!("{}?excludeIds={}", url, urlencoding::encode(&filter));
        }

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        Self::check_status(response.status(), "profile listing")?;

        let json: Value = response.json().await?;
        let profiles = Self::parse_documents(&json)?;

        // Backend pre-filtering is advisory only
        let profiles: Vec<OrgProfile> = profiles
            .into_iter()
            .filter(|p| !excluding.contains(&p.id))
            .collect();

        tracing::debug!("Listed {} candidate profiles", profiles.len());

        Ok(profiles)
    }

    async fn update_profile(
        &self,
        org_id: &str,
        fields: Value,
    ) -> Result<OrgProfile, ProfileStoreError> {
        let url = format!(
            "{}/{}",
            self.profiles_url(),
            urlencoding::encode(org_id)
        );

        let response = self
            .client
            .patch(&url)
            .header("X-Api-Key", &self.api_key)
            .json(&fields)
            .send()
            .await?;

        Self::check_status(response.status(), &format!("profile update {}", org_id))?;

        let json: Value = response.json().await?;
        let data = json.get("data").unwrap_or(&json);

        let profile: OrgProfile = serde_json::from_value(data.clone()).map_err(|e| {
            ProfileStoreError::InvalidResponse(format!("Failed to parse profile: {}", e))
        })?;

        self.cache.invalidate(org_id).await;

        Ok(profile)
    }
}

/// In-memory profile store for tests and embedded use
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<String, OrgProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, profile: OrgProfile) {
        self.profiles
            .write()
            .await
            .insert(profile.id.clone(), profile);
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get_profile(&self, org_id: &str) -> Result<OrgProfile, ProfileStoreError> {
        self.profiles
            .read()
            .await
            .get(org_id)
            .cloned()
            .ok_or_else(|| ProfileStoreError::NotFound(format!("profile {}", org_id)))
    }

    async fn list_profiles(&self, excluding: &[String]) -> Result<Vec<OrgProfile>, ProfileStoreError> {
        Ok(self
            .profiles
            .read()
            .await
            .values()
            .filter(|p| !excluding.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn update_profile(
        &self,
        org_id: &str,
        fields: Value,
    ) -> Result<OrgProfile, ProfileStoreError> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .get_mut(org_id)
            .ok_or_else(|| ProfileStoreError::NotFound(format!("profile {}", org_id)))?;

        let mut json = serde_json::to_value(&*profile)
            .map_err(|e| ProfileStoreError::InvalidResponse(e.to_string()))?;
        if let (Some(obj), Some(patch)) = (json.as_object_mut(), fields.as_object()) {
            for (key, value) in patch {
                obj.insert(key.clone(), value.clone());
            }
        }

        *profile = serde_json::from_value(json)
            .map_err(|e| ProfileStoreError::InvalidResponse(e.to_string()))?;
        Ok(profile.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn profile(id: &str) -> OrgProfile {
        OrgProfile {
            id: id.to_string(),
            company_name: format!("Org {}", id),
            industry: "Technology".to_string(),
            location: None,
            company_size: None,
            description: None,
            looking_for: vec![],
            logo_url: None,
            email: None,
            created_at: Some(Utc::now()),
        }
    }

    #[tokio::test]
    async fn test_memory_store_excludes() {
        let store = MemoryProfileStore::new();
        store.insert(profile("a")).await;
        store.insert(profile("b")).await;
        store.insert(profile("c")).await;

        let listed = store
            .list_profiles(&["b".to_string()])
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|p| p.id != "b"));
    }

    #[tokio::test]
    async fn test_memory_store_update_merges_fields() {
        let store = MemoryProfileStore::new();
        store.insert(profile("a")).await;

        let updated = store
            .update_profile("a", serde_json::json!({ "industry": "Finance" }))
            .await
            .unwrap();
        assert_eq!(updated.industry, "Finance");
        assert_eq!(updated.company_name, "Org a");
    }

    #[tokio::test]
    async fn test_http_store_get_profile() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/profiles/acme")
            .match_header("X-Api-Key", "test-key")
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "data": {
                        "id": "acme",
                        "companyName": "Acme Corp",
                        "industry": "Manufacturing",
                        "lookingFor": ["Suppliers"]
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let store = HttpProfileStore::new(server.url(), "test-key".to_string(), 10, 60);
        let profile = store.get_profile("acme").await.unwrap();

        assert_eq!(profile.company_name, "Acme Corp");
        assert_eq!(profile.looking_for, vec!["Suppliers".to_string()]);
        mock.assert_async().await;

        // Second read is served from cache without another HTTP call
        let cached = store.get_profile("acme").await.unwrap();
        assert_eq!(cached.id, "acme");
    }

    #[tokio::test]
    async fn test_http_store_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/profiles/ghost")
            .with_status(404)
            .create_async()
            .await;

        let store = HttpProfileStore::new(server.url(), "test-key".to_string(), 10, 60);
        let err = store.get_profile("ghost").await.unwrap_err();
        assert!(matches!(err, ProfileStoreError::NotFound(_)));
    }
}
