use std::env;
use std::path::PathBuf;
use async_trait::async_trait;
use log::info;
use rv_core::credentials::{Credential, CredentialProvider};
use rv_core::error::CredentialError;

/// Variables checked for an API key, in order
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Picks the API key up from the environment. "Selecting" a key means
/// re-reading the `.env` file after the user has edited it.
pub struct EnvCredentialProvider {
    env_file: PathBuf,
}

impl EnvCredentialProvider {
    pub fn new(env_file: impl Into<PathBuf>) -> Self {
        Self {
            env_file: env_file.into(),
        }
    }
}

impl Default for EnvCredentialProvider {
    fn default() -> Self {
        Self::new(".env")
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentialProvider {
    async fn has_credential(&self) -> bool {
        self.credential().is_some()
    }

    async fn select_credential(&self) -> Result<(), CredentialError> {
        info!("Re-reading API key from {}", self.env_file.display());

        dotenvy::from_path_override(&self.env_file)
            .map_err(|e| CredentialError::Selection(format!("{}: {}", self.env_file.display(), e)))?;

        if self.credential().is_none() {
            return Err(CredentialError::Selection(format!(
                "no {} found in {}",
                API_KEY_VARS.join(" or "),
                self.env_file.display()
            )));
        }

        Ok(())
    }

    fn credential(&self) -> Option<Credential> {
        first_key(|name| env::var(name).ok())
    }
}

fn first_key(lookup: impl Fn(&str) -> Option<String>) -> Option<Credential> {
    API_KEY_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
        .map(Credential::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_key_preferred() {
        let key = first_key(|name| match name {
            "GEMINI_API_KEY" => Some("gemini".into()),
            "API_KEY" => Some("generic".into()),
            _ => None,
        });
        assert_eq!(key, Some(Credential::new("gemini")));
    }

    #[test]
    fn test_blank_key_skipped() {
        let key = first_key(|name| match name {
            "GEMINI_API_KEY" => Some("  ".into()),
            "API_KEY" => Some("generic".into()),
            _ => None,
        });
        assert_eq!(key, Some(Credential::new("generic")));
    }

    #[test]
    fn test_no_key() {
        assert_eq!(first_key(|_| None), None);
    }

    #[tokio::test]
    async fn test_select_fails_without_env_file() {
        let provider = EnvCredentialProvider::new("/no/such/dir/.env");
        let result = provider.select_credential().await;
        assert!(matches!(result, Err(CredentialError::Selection(_))));
    }
}
