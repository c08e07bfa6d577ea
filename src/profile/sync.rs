use super::{UserProfile, decode_profile, save_payload};
use crate::api::ApiClient;
use crate::error::ApiError;
use arc_swap::ArcSwapOption;
use std::sync::Arc;

const PROFILE_PATH: &str = "/user/profile";

/// Keeps the client-side copy of the profile in sync with the backend.
///
/// Refresh failures are non-fatal: the UI shows the stale (or empty) profile
/// instead of crashing, so `refresh` logs and returns `None` rather than
/// propagating the error.
pub struct ProfileSync {
    api: Arc<ApiClient>,
    current: ArcSwapOption<UserProfile>,
}

impl ProfileSync {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            current: ArcSwapOption::const_empty(),
        }
    }

    /// Last successfully decoded profile, if any.
    pub fn current(&self) -> Option<Arc<UserProfile>> {
        self.current.load_full()
    }

    pub fn clear(&self) {
        self.current.store(None);
    }

    /// Fetch, decode and cache the profile. On any failure the previous
    /// cached value is kept.
    pub async fn refresh(&self) -> Option<Arc<UserProfile>> {
        let raw: serde_json::Value = match self.api.get_json(PROFILE_PATH).await {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!("profile refresh failed: {error}");
                return None;
            }
        };

        match decode_profile(&raw) {
            Ok(profile) => {
                let profile = Arc::new(profile);
                self.current.store(Some(Arc::clone(&profile)));
                Some(profile)
            }
            Err(error) => {
                tracing::warn!("profile payload rejected: {error}");
                None
            }
        }
    }

    /// Post the full normalized payload (not a diff), then re-fetch so the
    /// cache reflects server-side defaults and validation.
    pub async fn save(&self, profile: &UserProfile) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .api
            .post_json(PROFILE_PATH, &save_payload(profile))
            .await?;
        self.refresh().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::NotifyChannel;
    use crate::store::TokenStore;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sync_for(server: &MockServer) -> (ProfileSync, tempfile::TempDir) {
        let dir = tempfile::TempDir::new().unwrap();
        let tokens = Arc::new(TokenStore::new(dir.path()));
        let api = Arc::new(ApiClient::with_base_url(server.uri(), tokens));
        (ProfileSync::new(api), dir)
    }

    #[tokio::test]
    async fn refresh_decodes_and_caches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "nickname": "ivan",
                "monthly_salary": 80000,
                "notify_channel": "tg",
            })))
            .mount(&server)
            .await;
        let (sync, _dir) = sync_for(&server);

        let profile = sync.refresh().await.unwrap();
        assert_eq!(profile.nickname, "ivan");
        assert_eq!(profile.notify_channel, NotifyChannel::Tg);
        assert_eq!(sync.current().unwrap().nickname, "ivan");
    }

    #[tokio::test]
    async fn refresh_failure_returns_none_and_keeps_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/profile"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"nickname": "ivan"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        let (sync, _dir) = sync_for(&server);
        sync.refresh().await.unwrap();

        server.reset().await;
        Mock::given(method("GET"))
            .and(path("/user/profile"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert!(sync.refresh().await.is_none());
        // Stale profile stays visible.
        assert_eq!(sync.current().unwrap().nickname, "ivan");
    }

    #[tokio::test]
    async fn save_posts_full_payload_then_refreshes() {
        let server = MockServer::start().await;
        let profile = UserProfile {
            nickname: "ivan".to_string(),
            ..UserProfile::default()
        };

        Mock::given(method("POST"))
            .and(path("/user/profile"))
            .and(body_json(save_payload(&profile)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"nickname": "ivan"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/user/profile"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"nickname": "ivan-server"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        let (sync, _dir) = sync_for(&server);

        sync.save(&profile).await.unwrap();
        // Cache reflects the reconciling refresh, not the local copy.
        assert_eq!(sync.current().unwrap().nickname, "ivan-server");
    }

    #[tokio::test]
    async fn save_surfaces_backend_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/user/profile"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "message": "blacklist too long",
                "code": "VALIDATION",
            })))
            .mount(&server)
            .await;
        let (sync, _dir) = sync_for(&server);

        let error = sync.save(&UserProfile::default()).await.unwrap_err();
        assert_eq!(error.code, "VALIDATION");
    }
}
