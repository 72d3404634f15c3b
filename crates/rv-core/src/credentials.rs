use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use async_trait::async_trait;
use tracing::{info, warn};
use crate::error::CredentialError;

/// API key attached to every call against the generation service
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

// Keys never end up in logs
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Whatever lets the user pick an API key (a key picker dialog, a `.env`
/// file, a secrets manager).
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn has_credential(&self) -> bool;

    /// Interactive: ask the user to choose a key
    async fn select_credential(&self) -> Result<(), CredentialError>;

    fn credential(&self) -> Option<Credential>;
}

/// Owner of the process-wide "a credential is selected" flag.
///
/// The flag is set once by [`CredentialGate::probe`] and afterwards changes
/// only through [`CredentialGate::select`] (user action) and
/// [`CredentialGate::invalidate`] (the service rejected the key).
pub struct CredentialGate {
    provider: Option<Arc<dyn CredentialProvider>>,
    fallback: Option<Credential>,
    present: AtomicBool,
}

impl CredentialGate {
    /// Run the start-up capability probe. Without a provider the credential
    /// is assumed present so a missing picker never blocks generation.
    pub async fn probe(provider: Option<Arc<dyn CredentialProvider>>, fallback: Option<Credential>) -> Self {
        let present = match &provider {
            Some(p) => p.has_credential().await,
            None => true,
        };

        info!(present, has_provider = provider.is_some(), "credential probe finished");

        Self {
            provider,
            fallback,
            present: AtomicBool::new(present),
        }
    }

    pub fn is_present(&self) -> bool {
        self.present.load(Ordering::SeqCst)
    }

    /// Key to attach to requests right now
    pub fn credential(&self) -> Option<Credential> {
        self.provider
            .as_ref()
            .and_then(|p| p.credential())
            .or_else(|| self.fallback.clone())
    }

    /// User asked to pick a key. Selection is assumed to have succeeded once
    /// the provider returns, since re-probing right away can race the picker.
    pub async fn select(&self) -> Result<(), CredentialError> {
        if let Some(provider) = &self.provider {
            provider.select_credential().await?;
        }
        self.present.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// The service rejected the current key
    pub fn invalidate(&self) {
        if self.present.swap(false, Ordering::SeqCst) {
            warn!("credential rejected by service, re-selection required");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    pub(crate) struct StaticProvider {
        pub key: Mutex<Option<String>>,
        pub selections: Mutex<u32>,
    }

    impl StaticProvider {
        pub fn new(key: Option<&str>) -> Self {
            Self {
                key: Mutex::new(key.map(str::to_string)),
                selections: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl CredentialProvider for StaticProvider {
        async fn has_credential(&self) -> bool {
            self.key.lock().unwrap().is_some()
        }

        async fn select_credential(&self) -> Result<(), CredentialError> {
            *self.selections.lock().unwrap() += 1;
            *self.key.lock().unwrap() = Some("picked-key".into());
            Ok(())
        }

        fn credential(&self) -> Option<Credential> {
            self.key.lock().unwrap().clone().map(Credential::new)
        }
    }

    #[tokio::test]
    async fn test_missing_provider_is_permissive() {
        let gate = CredentialGate::probe(None, Some(Credential::new("env-key"))).await;
        assert!(gate.is_present());
        assert_eq!(gate.credential(), Some(Credential::new("env-key")));
    }

    #[tokio::test]
    async fn test_probe_reads_provider() {
        let provider = Arc::new(StaticProvider::new(None));
        let gate = CredentialGate::probe(Some(provider.clone()), None).await;
        assert!(!gate.is_present());
        assert!(gate.credential().is_none());

        gate.select().await.unwrap();
        assert!(gate.is_present());
        assert_eq!(*provider.selections.lock().unwrap(), 1);
        assert_eq!(gate.credential(), Some(Credential::new("picked-key")));
    }

    #[tokio::test]
    async fn test_invalidate_clears_flag() {
        let gate = CredentialGate::probe(Some(Arc::new(StaticProvider::new(Some("k")))), None).await;
        assert!(gate.is_present());
        gate.invalidate();
        assert!(!gate.is_present());
        gate.invalidate();
        assert!(!gate.is_present());
    }

    #[test]
    fn test_debug_hides_key() {
        assert_eq!(format!("{:?}", Credential::new("secret")), "Credential(***)");
    }
}
