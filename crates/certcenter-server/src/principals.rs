//! Read-only principal store backed by a JSON export of the user table.

use std::collections::HashMap;
use std::path::Path;

use certcenter_core::error::CertCenterResult;
use certcenter_core::models::principal::Principal;
use certcenter_core::repository::PrincipalRepository;

use crate::config::{self, ConfigError};

#[derive(Debug, Default)]
pub struct FilePrincipals {
    by_login: HashMap<String, Principal>,
}

impl FilePrincipals {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = config::read(path)?;
        Self::parse(&text).map_err(|source| ConfigError::Principals {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        let principals: Vec<Principal> = serde_json::from_str(json)?;
        Ok(Self {
            by_login: principals
                .into_iter()
                .map(|p| (p.login.clone(), p))
                .collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.by_login.len()
    }
}

impl PrincipalRepository for FilePrincipals {
    async fn get_by_login(&self, login: &str) -> CertCenterResult<Option<Principal>> {
        Ok(self.by_login.get(login).cloned())
    }
}
