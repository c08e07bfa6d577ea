use crate::api::ApiClient;
use crate::auth::{self, AuthSession, LoginRequest, RegisterRequest};
use crate::chat::ChatSessionManager;
use crate::config::Config;
use crate::error::Result;
use crate::profile::ProfileSync;
use crate::store::{ActiveChatStore, TokenStore};
use std::sync::Arc;

/// Explicit application state: everything that used to be ambient in earlier
/// client revisions (token, profile cache, active chat id) lives here, built
/// once on startup and torn down by [`App::logout`].
pub struct App {
    pub config: Config,
    pub tokens: Arc<TokenStore>,
    pub api: Arc<ApiClient>,
    pub profile: ProfileSync,
    pub chats: Arc<ActiveChatStore>,
}

impl App {
    pub fn init(config: Config) -> Self {
        let tokens = Arc::new(TokenStore::new(&config.state_dir));
        let api = Arc::new(ApiClient::new(&config, Arc::clone(&tokens)));
        let profile = ProfileSync::new(Arc::clone(&api));
        let chats = Arc::new(ActiveChatStore::new(&config.state_dir));
        Self {
            config,
            tokens,
            api,
            profile,
            chats,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_authenticated()
    }

    /// A fresh session manager bound to this app's API client and chat-id
    /// store.
    pub fn chat_manager(&self) -> ChatSessionManager {
        ChatSessionManager::new(Arc::clone(&self.api), Arc::clone(&self.chats))
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<AuthSession> {
        let session = auth::login(&self.api, &self.tokens, request).await?;
        self.profile.refresh().await;
        Ok(session)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthSession> {
        let session = auth::register(&self.api, &self.tokens, request).await?;
        self.profile.refresh().await;
        Ok(session)
    }

    /// Teardown: clears the credential (memory + durable), the persisted
    /// active chat id and the cached profile. Subsequent protected calls run
    /// unauthenticated until the next login.
    pub fn logout(&self) -> Result<()> {
        self.tokens.set(None)?;
        self.chats.clear()?;
        self.profile.clear();
        Ok(())
    }
}
