//! CLI configuration.
//!
//! Settings are read from `~/.config/meetsync/config.toml` unless `--config`
//! points elsewhere:
//!
//! ```toml
//! credentials_path = "/home/me/.local/share/meetsync/credentials.json"
//! cache_ttl_secs = 300
//!
//! [google]
//! client_id = "env::GOOGLE_CLIENT_ID"
//! client_secret = "env::GOOGLE_CLIENT_SECRET"
//! calendar_id = "primary"
//!
//! [microsoft]
//! client_id = "env::MS_CLIENT_ID"
//! client_secret = "pass::meetsync/microsoft"
//! tenant = "common"
//! timestamp_policy = "lenient"
//! ```
//!
//! `client_id` and `client_secret` accept the references described in
//! [`crate::secret`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use meetsync_providers::{
    GoogleConfig, MicrosoftConfig, OAuthCredentials, ProvidersConfig, TimestampPolicy,
};
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Location of the credential file. Defaults to the user data directory.
    pub credentials_path: Option<PathBuf>,

    /// Lifetime of an aggregated event snapshot. Zero disables the cache.
    pub cache_ttl_secs: u64,

    pub google: Option<GoogleSettings>,

    pub microsoft: Option<MicrosoftSettings>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoogleSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub calendar_id: Option<String>,
    /// Overrides the Calendar API base URL.
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub timestamp_policy: TimestampPolicy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MicrosoftSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Azure AD tenant; `common` when unset.
    pub tenant: Option<String>,
    /// Overrides the Graph base URL.
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub timestamp_policy: TimestampPolicy,
}

impl CliConfig {
    /// Loads the default file, falling back to an empty configuration when
    /// it does not exist.
    pub fn load() -> CliResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content)
            .map_err(|e| CliError::Config(format!("failed to parse {}: {e}", path.display())))
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("meetsync")
            .join("config.toml")
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.credentials_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("meetsync")
                .join("credentials.json")
        })
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_secs > 0).then(|| Duration::from_secs(self.cache_ttl_secs))
    }

    /// Builds the registry configuration, resolving secret references.
    pub fn providers(&self) -> CliResult<ProvidersConfig> {
        let mut providers = ProvidersConfig::default();
        if let Some(google) = &self.google {
            providers = providers.with_google(google.to_provider_config()?);
        }
        if let Some(microsoft) = &self.microsoft {
            providers = providers.with_microsoft(microsoft.to_provider_config()?);
        }
        Ok(providers)
    }
}

fn resolve_credentials(
    section: &str,
    client_id: Option<&str>,
    client_secret: Option<&str>,
) -> CliResult<OAuthCredentials> {
    let resolve = |field: &str, raw: Option<&str>| -> CliResult<String> {
        let raw = raw
            .ok_or_else(|| CliError::Config(format!("{field} is missing from [{section}]")))?;
        crate::secret::resolve(raw)
            .map_err(|e| CliError::Config(format!("[{section}] {field}: {e}")))
    };

    let credentials = OAuthCredentials::new(
        resolve("client_id", client_id)?,
        resolve("client_secret", client_secret)?,
    );
    credentials
        .validate()
        .map_err(|e| CliError::Config(format!("[{section}] {e}")))?;
    Ok(credentials)
}

impl GoogleSettings {
    pub fn to_provider_config(&self) -> CliResult<GoogleConfig> {
        let credentials = resolve_credentials(
            "google",
            self.client_id.as_deref(),
            self.client_secret.as_deref(),
        )?;
        let mut config =
            GoogleConfig::new(credentials).with_timestamp_policy(self.timestamp_policy);
        if let Some(calendar_id) = &self.calendar_id {
            config = config.with_calendar_id(calendar_id);
        }
        if let Some(url) = &self.api_base_url {
            config = config.with_api_base_url(url);
        }
        Ok(config)
    }
}

impl MicrosoftSettings {
    pub fn to_provider_config(&self) -> CliResult<MicrosoftConfig> {
        let credentials = resolve_credentials(
            "microsoft",
            self.client_id.as_deref(),
            self.client_secret.as_deref(),
        )?;
        let mut config =
            MicrosoftConfig::new(credentials).with_timestamp_policy(self.timestamp_policy);
        if let Some(tenant) = &self.tenant {
            config = config.with_tenant(tenant);
        }
        if let Some(url) = &self.api_base_url {
            config = config.with_api_base_url(url);
        }
        Ok(config)
    }
}
