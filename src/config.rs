// shipctl - CLI for private-location ships and team agents
// Copyright (C) 2024 shipctl contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use crate::router::Defaults;
use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_WORKSPACE_URL: &str = "https://a.blazemeter.com/api/v4/";
pub const DEFAULT_TEAM_URL: &str = "https://api.runscope.com/";

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key_id: Option<String>,
    pub api_key_secret: Option<String>,
    pub token: Option<String>,
    pub default_workspace: Option<u64>,
    pub default_team: Option<String>,
    pub workspace_url: Option<String>,
    pub team_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Local,
    User,
}

#[derive(Debug, Error)]
#[allow(clippy::enum_variant_names)]
pub enum ConfigError {
    #[error("could not locate a writable config directory for the current user")]
    MissingConfigDir,
    #[error(
        "API key id and secret are required; set them with `shipctl --api-key-id <id> --api-key-secret <secret> configure`"
    )]
    MissingApiKeyPair,
    #[error("personal access token is required; set it with `shipctl configure --token <token>`")]
    MissingToken,
}

/// Per-invocation values that beat anything read from config files.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub api_key_id: Option<String>,
    pub api_key_secret: Option<String>,
    pub token: Option<String>,
    pub workspace_url: Option<String>,
    pub team_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyPair {
    pub id: String,
    pub secret: String,
}

/// Merged configuration for one invocation. Credentials are only checked when
/// a route actually asks for them.
#[derive(Debug)]
pub struct Settings {
    merged: Config,
}

impl Settings {
    pub fn api_key_pair(&self) -> Result<ApiKeyPair, ConfigError> {
        let id = non_blank(self.merged.api_key_id.as_deref());
        let secret = non_blank(self.merged.api_key_secret.as_deref());
        match (id, secret) {
            (Some(id), Some(secret)) => Ok(ApiKeyPair { id, secret }),
            _ => Err(ConfigError::MissingApiKeyPair),
        }
    }

    pub fn bearer_token(&self) -> Result<String, ConfigError> {
        non_blank(self.merged.token.as_deref()).ok_or(ConfigError::MissingToken)
    }

    pub fn workspace_url(&self) -> &str {
        self.merged
            .workspace_url
            .as_deref()
            .unwrap_or(DEFAULT_WORKSPACE_URL)
    }

    pub fn team_url(&self) -> &str {
        self.merged.team_url.as_deref().unwrap_or(DEFAULT_TEAM_URL)
    }

    pub fn defaults(&self) -> Defaults {
        Defaults {
            workspace_id: self.merged.default_workspace,
            team_id: non_blank(self.merged.default_team.as_deref()),
        }
    }
}

pub fn config_path(scope: Scope, cwd: &Path) -> Result<PathBuf> {
    match scope {
        Scope::Local => Ok(cwd.join(".shipctl.yaml")),
        Scope::User => {
            if let Ok(custom) = env::var("SHIPCTL_CONFIG_DIR") {
                return Ok(PathBuf::from(custom).join("config.yaml"));
            }
            let base = config_dir().ok_or(ConfigError::MissingConfigDir)?;
            Ok(base.join("shipctl").join("config.yaml"))
        }
    }
}

pub fn load(cwd: &Path) -> Result<Config> {
    let user = read_if_exists(&config_path(Scope::User, cwd)?)?.unwrap_or_default();
    let local = read_if_exists(&config_path(Scope::Local, cwd)?)?.unwrap_or_default();
    Ok(merge(user, local))
}

pub fn load_scope(scope: Scope, cwd: &Path) -> Result<Config> {
    Ok(read_if_exists(&config_path(scope, cwd)?)?.unwrap_or_default())
}

pub fn save(scope: Scope, config: &Config, cwd: &Path) -> Result<PathBuf> {
    let path = config_path(scope, cwd)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    let serialized = serde_yaml::to_string(config).context("serializing config")?;
    fs::write(&path, serialized).with_context(|| format!("writing {:?}", path))?;
    Ok(path)
}

pub fn resolve(cwd: &Path, overrides: Overrides) -> Result<Settings> {
    let mut merged = load(cwd)?;

    if let Some(id) = overrides.api_key_id {
        merged.api_key_id = Some(id);
    }
    if let Some(secret) = overrides.api_key_secret {
        merged.api_key_secret = Some(secret);
    }
    if let Some(token) = overrides.token {
        merged.token = Some(token);
    }
    if let Some(url) = overrides.workspace_url {
        merged.workspace_url = Some(url);
    }
    if let Some(url) = overrides.team_url {
        merged.team_url = Some(url);
    }

    Ok(Settings { merged })
}

/// Copy of `config` with every secret replaced by a mask.
pub fn masked(config: &Config) -> Config {
    let mask = |value: &Option<String>| value.as_ref().map(|_| "*****".to_string());
    Config {
        api_key_id: config.api_key_id.clone(),
        api_key_secret: mask(&config.api_key_secret),
        token: mask(&config.token),
        ..config.clone()
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn read_if_exists(path: &Path) -> Result<Option<Config>> {
    if !path.exists() {
        return Ok(None);
    }

    debug!("loading config from {:?}", path);
    let contents = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    let config = serde_yaml::from_str(&contents).with_context(|| format!("parsing {:?}", path))?;
    Ok(Some(config))
}

fn merge(user: Config, local: Config) -> Config {
    Config {
        api_key_id: local.api_key_id.or(user.api_key_id),
        api_key_secret: local.api_key_secret.or(user.api_key_secret),
        token: local.token.or(user.token),
        default_workspace: local.default_workspace.or(user.default_workspace),
        default_team: local.default_team.or(user.default_team),
        workspace_url: local.workspace_url.or(user.workspace_url),
        team_url: local.team_url.or(user.team_url),
    }
}
