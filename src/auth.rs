use crate::api::ApiClient;
use crate::error::{ApiError, Result};
use crate::store::TokenStore;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub nickname: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub nickname: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user: AuthUser,
}

/// `POST /auth/login`. On success the bearer token is persisted, replacing
/// any previous credential — at most one is active per client instance.
pub async fn login(
    api: &ApiClient,
    tokens: &TokenStore,
    request: &LoginRequest,
) -> Result<AuthSession> {
    exchange(api, tokens, "/auth/login", request).await
}

/// `POST /auth/register`, then the same token persistence as login.
pub async fn register(
    api: &ApiClient,
    tokens: &TokenStore,
    request: &RegisterRequest,
) -> Result<AuthSession> {
    exchange(api, tokens, "/auth/register", request).await
}

async fn exchange<B: Serialize>(
    api: &ApiClient,
    tokens: &TokenStore,
    path: &str,
    body: &B,
) -> Result<AuthSession> {
    let raw: Value = api.post_json(path, body).await?;

    let token = raw
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError {
            message: "backend returned no access token".to_string(),
            code: "BAD_RESPONSE".to_string(),
            status: None,
        })?
        .to_string();
    tokens.set(Some(&token))?;

    Ok(AuthSession {
        token,
        user: normalize_user(raw.get("user")),
    })
}

fn normalize_user(raw: Option<&Value>) -> AuthUser {
    let Some(raw) = raw else {
        return AuthUser::default();
    };
    let field = |key: &str| {
        raw.get(key)
            .map(|value| match value {
                Value::String(text) => text.clone(),
                Value::Number(number) => number.to_string(),
                _ => String::new(),
            })
            .unwrap_or_default()
    };
    AuthUser {
        id: field("id"),
        nickname: field("nickname"),
        email: field("email"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> LoginRequest {
        LoginRequest {
            email: "ivan@example.com".to_string(),
            password: "hunter2".to_string(),
        }
    }

    #[tokio::test]
    async fn login_persists_token_and_returns_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(
                json!({"email": "ivan@example.com", "password": "hunter2"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok-1",
                "user": {"id": 7, "nickname": "ivan", "email": "ivan@example.com"},
            })))
            .mount(&server)
            .await;

        let dir = tempfile::TempDir::new().unwrap();
        let tokens = Arc::new(TokenStore::new(dir.path()));
        let api = ApiClient::with_base_url(server.uri(), Arc::clone(&tokens));

        let session = login(&api, &tokens, &request()).await.unwrap();
        assert_eq!(session.token, "tok-1");
        assert_eq!(session.user.nickname, "ivan");
        // Numeric ids are normalized to strings.
        assert_eq!(session.user.id, "7");
        assert_eq!(tokens.get().as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn rejected_login_surfaces_api_error_and_keeps_no_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(
                json!({"message": "wrong password", "code": "UNAUTHORIZED"}),
            ))
            .mount(&server)
            .await;

        let dir = tempfile::TempDir::new().unwrap();
        let tokens = Arc::new(TokenStore::new(dir.path()));
        let api = ApiClient::with_base_url(server.uri(), Arc::clone(&tokens));

        let error = login(&api, &tokens, &request()).await.unwrap_err();
        assert!(error.to_string().contains("wrong password"));
        assert_eq!(tokens.get(), None);
    }

    #[tokio::test]
    async fn missing_access_token_is_a_bad_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user": {}})))
            .mount(&server)
            .await;

        let dir = tempfile::TempDir::new().unwrap();
        let tokens = Arc::new(TokenStore::new(dir.path()));
        let api = ApiClient::with_base_url(server.uri(), Arc::clone(&tokens));

        let result = register(
            &api,
            &tokens,
            &RegisterRequest {
                nickname: "ivan".to_string(),
                email: "ivan@example.com".to_string(),
                password: "hunter2".to_string(),
            },
        )
        .await;
        assert!(result.is_err());
        assert_eq!(tokens.get(), None);
    }
}
