use crate::error::ConfigError;
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Environment override for the backend base URL. Takes precedence over the
/// persisted config value.
pub const ENV_API_URL: &str = "COOLCART_API_URL";

fn default_api_base_url() -> String {
    "http://localhost:8000/v1".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_connect_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory for durable key/value state (access token, active chat id).
    #[serde(skip)]
    pub state_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            config_path: PathBuf::new(),
            state_dir: PathBuf::new(),
        }
    }
}

impl Config {
    /// Load `~/.coolcart/config.toml`, creating the dot-dir and a default
    /// config on first run.
    pub fn load_or_init() -> Result<Self, ConfigError> {
        let home = UserDirs::new()
            .map(|dirs| dirs.home_dir().to_path_buf())
            .ok_or_else(|| ConfigError::Load("could not find home directory".to_string()))?;
        Self::load_or_init_at(&home.join(".coolcart"))
    }

    /// Same as [`Config::load_or_init`] rooted at an explicit directory.
    pub fn load_or_init_at(root: &Path) -> Result<Self, ConfigError> {
        let config_path = root.join("config.toml");
        let state_dir = root.join("state");

        if !state_dir.exists() {
            fs::create_dir_all(&state_dir)?;
        }

        let mut config = if config_path.exists() {
            let contents = fs::read_to_string(&config_path)?;
            toml::from_str::<Config>(&contents)
                .map_err(|error| ConfigError::Load(error.to_string()))?
        } else {
            Config::default()
        };
        config.config_path = config_path;
        config.state_dir = state_dir;

        // Persist defaults on first run before the env override so a
        // one-off COOLCART_API_URL never ends up baked into the file.
        if !config.config_path.exists() {
            config.save()?;
        }
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(ENV_API_URL)
            && !url.trim().is_empty()
        {
            self.api_base_url = url.trim().to_string();
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.api_base_url).map_err(|error| ConfigError::BaseUrl {
            url: self.api_base_url.clone(),
            reason: error.to_string(),
        })?;
        Ok(())
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let toml_str = toml::to_string_pretty(self)
            .map_err(|error| ConfigError::Load(error.to_string()))?;
        fs::write(&self.config_path, toml_str)?;
        Ok(())
    }

    /// Base URL with any trailing slash removed, ready for path joining.
    pub fn base_url(&self) -> String {
        self.api_base_url.trim_end_matches('/').to_string()
    }
}
