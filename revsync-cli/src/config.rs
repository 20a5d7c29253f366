//! Configuration management for the revsync CLI.

use anyhow::{Context, Result};
use revsync::{ChatClient, Session, UserId};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// CLI configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Session credentials.
    pub auth: Option<AuthConfig>,
    /// Endpoint overrides.
    #[serde(default)]
    pub api: ApiConfig,
}

/// Session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Session token.
    pub token: String,
    /// Own user ID, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Service endpoints. Unset fields use the library defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files_url: Option<String>,
}

/// Get the configuration file path.
pub fn config_path() -> Result<PathBuf> {
    let exe_path = env::current_exe().context("Could not determine executable path")?;
    let exe_dir = exe_path
        .parent()
        .context("Could not determine executable directory")?;

    Ok(exe_dir.join("revsync.toml"))
}

/// Load configuration from file.
pub fn load_config() -> Result<Config> {
    let path = config_path()?;

    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path).context("Failed to read config file")?;

    toml::from_str(&content).context("Failed to parse config file")
}

/// Save configuration to file.
pub fn save_config(config: &Config) -> Result<()> {
    let path = config_path()?;
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(&path, content).context("Failed to write config file")?;

    Ok(())
}

fn apply_endpoints(
    mut builder: revsync::ChatClientBuilder,
    api: &ApiConfig,
) -> revsync::ChatClientBuilder {
    if let Some(url) = &api.base_url {
        builder = builder.base_url(url);
    }
    if let Some(url) = &api.files_url {
        builder = builder.files_url(url);
    }
    builder
}

/// Build a client that requires a session.
///
/// `REVSYNC_TOKEN` takes precedence over the stored token.
pub fn build_authed_client() -> Result<ChatClient> {
    let config = load_config()?;

    let session = match env::var("REVSYNC_TOKEN") {
        Ok(token) if !token.is_empty() => Session::new(token),
        _ => {
            let auth = config
                .auth
                .as_ref()
                .context("Authentication required. Run 'revsync auth login' first.")?;
            let mut session = Session::new(&auth.token);
            if let Some(uid) = &auth.user_id {
                session = session.with_user(UserId::new(uid.as_str()));
            }
            session
        }
    };

    apply_endpoints(ChatClient::builder().with_session(session), &config.api)
        .build()
        .context("Failed to build chat client")
}
