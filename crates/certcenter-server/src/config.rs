//! Server configuration, read from `CERTCENTER_*` environment variables.

use std::path::{Path, PathBuf};

use certcenter_auth::config::AuthConfig;
use certcenter_pki::config::CaConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse principals file {}: {source}", path.display())]
    Principals {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub ca: CaConfig,
    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,
    pub token_lifetime_secs: u64,
    pub pepper: Option<String>,
    /// JSON array of principals exported from the user store.
    pub principals_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ca: CaConfig::default(),
            private_key_path: PathBuf::from("keys/caapp.private.key.pem"),
            public_key_path: PathBuf::from("keys/caapp.public.key.pem"),
            token_lifetime_secs: AuthConfig::default().token_lifetime_secs,
            pepper: None,
            principals_path: PathBuf::from("principals.json"),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset or empty keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(v) = get("CERTCENTER_UTILS_DIR") {
            config.ca.utils_dir = PathBuf::from(v);
        }
        if let Some(v) = get("CERTCENTER_LOCK_PATH") {
            config.ca.lock_path = PathBuf::from(v);
        }
        if let Some(v) = get("CERTCENTER_SHELL") {
            config.ca.shell = v;
        }
        if let Some(v) = get("CERTCENTER_OPENSSL") {
            config.ca.openssl = v;
        }
        if let Some(v) = get("CERTCENTER_PRIVATE_KEY") {
            config.private_key_path = PathBuf::from(v);
        }
        if let Some(v) = get("CERTCENTER_PUBLIC_KEY") {
            config.public_key_path = PathBuf::from(v);
        }
        if let Some(v) = get("CERTCENTER_PRINCIPALS") {
            config.principals_path = PathBuf::from(v);
        }
        if let Some(v) = get("CERTCENTER_TOKEN_LIFETIME_SECS") {
            config.token_lifetime_secs = match v.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "CERTCENTER_TOKEN_LIFETIME_SECS",
                        value: v,
                    });
                }
            };
        }
        config.pepper = get("CERTCENTER_PEPPER");

        Ok(config)
    }

    /// Read the signing keys and assemble the auth configuration.
    pub fn auth_config(&self) -> Result<AuthConfig, ConfigError> {
        Ok(AuthConfig {
            jwt_private_key_pem: read(&self.private_key_path)?,
            jwt_public_key_pem: read(&self.public_key_path)?,
            token_lifetime_secs: self.token_lifetime_secs,
            pepper: self.pepper.clone(),
        })
    }
}

pub(crate) fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.ca.utils_dir, PathBuf::from("utils"));
        assert_eq!(config.ca.lock_path, PathBuf::from("locks/lock"));
        assert_eq!(config.token_lifetime_secs, 300);
        assert!(config.pepper.is_none());
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("CERTCENTER_UTILS_DIR", "/opt/ca/utils"),
            ("CERTCENTER_LOCK_PATH", "/run/certcenter/lock"),
            ("CERTCENTER_TOKEN_LIFETIME_SECS", "600"),
            ("CERTCENTER_PEPPER", ""),
        ]))
        .unwrap();
        assert_eq!(config.ca.utils_dir, PathBuf::from("/opt/ca/utils"));
        assert_eq!(config.ca.lock_path, PathBuf::from("/run/certcenter/lock"));
        assert_eq!(config.token_lifetime_secs, 600);
        assert!(config.pepper.is_none());
    }

    #[test]
    fn rejects_bad_token_lifetime() {
        for value in ["0", "five", "-1"] {
            let err = ServerConfig::from_lookup(lookup(&[("CERTCENTER_TOKEN_LIFETIME_SECS", value)]))
                .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { .. }));
        }
    }

    #[test]
    fn missing_key_file_is_reported_with_its_path() {
        let config = ServerConfig {
            private_key_path: PathBuf::from("/nonexistent/caapp.private.key.pem"),
            ..ServerConfig::default()
        };
        let err = config.auth_config().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/caapp.private.key.pem"));
    }
}
