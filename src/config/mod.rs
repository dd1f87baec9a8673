/*!
Profile configuration: named connection profiles loaded from a TOML file.

File shape:

```toml
default_profile = "cloud"
default_format = "json"        # json | toon (optional, defaults to json)

[profiles.cloud]
host = "https://example.atlassian.net"
email = "me@example.com"
api_token = "..."
```

Resolution order for the file path:
  1. --config PATH
  2. CONFLUENCE_CONFIG env var
  3. $HOME/.config/confluence-cli/config.toml

The loaded `ProfileConfig` is validated once and treated as immutable for
the lifetime of a session; the shell's `reload` builtin re-reads it.
Load/validation failures are fatal at session start (there is no session
to continue without a usable profile).
*/

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::cmd::envelope::OutputFormat;

pub const CONFIG_ENV_VAR: &str = "CONFLUENCE_CONFIG";

/// Errors raised while locating, parsing or validating the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0} (create one or pass --config)")]
    NotFound(String),
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed config file: {0}")]
    Parse(String),
    #[error("no profiles defined (add a [profiles.NAME] section)")]
    NoProfiles,
    #[error("profile '{profile}' is missing a value for '{field}'")]
    MissingField {
        profile: String,
        field: &'static str,
    },
    #[error("profile '{profile}' has an invalid host '{host}' (must start with http:// or https://)")]
    InvalidHost { profile: String, host: String },
    #[error("profile '{profile}' has an invalid email '{email}'")]
    InvalidEmail { profile: String, email: String },
    #[error("default_profile '{0}' is not defined under [profiles]")]
    UnknownDefaultProfile(String),
    #[error("cannot determine a config path (no --config, no {CONFIG_ENV_VAR}, no HOME)")]
    NoPath,
}

/// Credentials for one named connection profile.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileCredentials {
    pub host: String,
    pub email: String,
    pub api_token: String,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    default_profile: String,
    #[serde(default)]
    default_format: Option<String>,
    #[serde(default)]
    profiles: HashMap<String, ProfileCredentials>,
}

/// Validated, immutable set of connection profiles plus session defaults.
#[derive(Debug, Clone)]
pub struct ProfileConfig {
    profiles: HashMap<String, ProfileCredentials>,
    pub default_profile: String,
    pub default_format: OutputFormat,
}

impl ProfileConfig {
    /// Resolve the config file path from flag / env / home fallback.
    pub fn resolve_path(flag: Option<&Path>) -> Result<PathBuf, ConfigError> {
        if let Some(p) = flag {
            return Ok(p.to_path_buf());
        }
        if let Ok(env_p) = std::env::var(CONFIG_ENV_VAR) {
            if !env_p.trim().is_empty() {
                return Ok(PathBuf::from(env_p));
            }
        }
        match std::env::var_os("HOME") {
            Some(home) => Ok(PathBuf::from(home)
                .join(".config")
                .join("confluence-cli")
                .join("config.toml")),
            None => Err(ConfigError::NoPath),
        }
    }

    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse and validate from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if raw.profiles.is_empty() {
            return Err(ConfigError::NoProfiles);
        }

        for (name, creds) in &raw.profiles {
            validate_profile(name, creds)?;
        }

        if !raw.profiles.contains_key(&raw.default_profile) {
            return Err(ConfigError::UnknownDefaultProfile(raw.default_profile));
        }

        let default_format = match raw.default_format.as_deref() {
            None => OutputFormat::Json,
            Some(s) => OutputFormat::from_str_ci(s)
                .ok_or_else(|| ConfigError::Parse(format!("unknown default_format '{s}'")))?,
        };

        Ok(Self {
            profiles: raw.profiles,
            default_profile: raw.default_profile,
            default_format,
        })
    }

    /// Credentials for a profile name, if defined.
    pub fn credentials(&self, name: &str) -> Option<&ProfileCredentials> {
        self.profiles.get(name)
    }

    pub fn profile_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn validate_profile(name: &str, creds: &ProfileCredentials) -> Result<(), ConfigError> {
    let field = |field| ConfigError::MissingField {
        profile: name.to_string(),
        field,
    };
    if creds.host.trim().is_empty() {
        return Err(field("host"));
    }
    if creds.email.trim().is_empty() {
        return Err(field("email"));
    }
    if creds.api_token.trim().is_empty() {
        return Err(field("api_token"));
    }

    let scheme_ok = Url::parse(&creds.host)
        .map(|u| u.scheme() == "http" || u.scheme() == "https")
        .unwrap_or(false);
    if !scheme_ok {
        return Err(ConfigError::InvalidHost {
            profile: name.to_string(),
            host: creds.host.clone(),
        });
    }

    if !looks_like_email(&creds.email) {
        return Err(ConfigError::InvalidEmail {
            profile: name.to_string(),
            email: creds.email.clone(),
        });
    }

    Ok(())
}

/// Basic local@domain shape check; anything stricter belongs to the server.
fn looks_like_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}
