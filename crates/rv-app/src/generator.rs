use std::path::{Path, PathBuf};
use std::sync::Arc;
use chrono::Utc;
use log::{info, warn};
use rv_core::credentials::{Credential, CredentialGate, CredentialProvider};
use rv_core::orchestrator::Orchestrator;
use rv_core::request::{GenerationRequest, SourceImage};
use rv_core::resources::{ResourceHandle, Slot};
use rv_core::state::OrchestrationState;
use crate::config::AppConfig;
use crate::credentials::EnvCredentialProvider;
use crate::error::AppError;
use crate::generator::backend::GenBackend;
use crate::ui;

pub mod backend;

/// Wires the Veo backend, the credential gate and the orchestrator together
/// for one session.
pub struct Generator {
    orchestrator: Orchestrator,
}

impl Generator {
    pub async fn new(config: &AppConfig, api_key: Option<String>) -> anyhow::Result<Self> {
        let backend = GenBackend::new(config)?;

        // An explicit key wins over whatever the environment holds
        let provider: Option<Arc<dyn CredentialProvider>> = match api_key {
            Some(_) => None,
            None => Some(Arc::new(EnvCredentialProvider::default())),
        };
        let credentials = CredentialGate::probe(provider, api_key.map(Credential::new)).await;

        let orchestrator = Orchestrator::new(Arc::new(backend), Arc::new(credentials), config.orchestrator());

        Ok(Self { orchestrator })
    }

    pub async fn show_preview(&self, source: &SourceImage) -> anyhow::Result<ResourceHandle> {
        let handle = self.orchestrator.load_preview(source).await?;
        info!(
            "Preview {} from {} ({}, {})",
            handle.id,
            source.describe(),
            handle.mime_type,
            ui::format_bytes(handle.len)
        );
        Ok(handle)
    }

    /// Generate a video, asking for a key once if the current one is missing
    /// or rejected.
    pub async fn run(&self, request: GenerationRequest) -> anyhow::Result<OrchestrationState> {
        let progress = ui::spawn_progress(self.orchestrator.subscribe(), request.aspect_ratio);

        let mut state = self.orchestrator.generate(request.clone()).await?;

        let needs_key = matches!(state, OrchestrationState::AwaitingApiKey)
            || state.error_kind().is_some_and(|kind| kind.requires_credential());
        if needs_key {
            match self.orchestrator.select_credential().await {
                Ok(()) => state = self.orchestrator.generate(request).await?,
                Err(e) => warn!("Could not select an API key: {}", e),
            }
        }

        progress.finish().await;
        Ok(state)
    }

    /// Write the generated video to `path`
    pub async fn save_result(&self, path: &Path) -> anyhow::Result<()> {
        let resource = self
            .orchestrator
            .resource(Slot::Result)
            .ok_or_else(|| AppError::BackendError("No generated video to save".into()))?;

        tokio::fs::write(path, resource.data())
            .await
            .map_err(|e| AppError::Output {
                path: path.display().to_string(),
                source: e,
            })?;

        info!("Saved {} to {}", resource.handle().id, path.display());
        Ok(())
    }

    pub fn shutdown(&self) {
        self.orchestrator.reset();
        self.orchestrator.clear_preview();
    }
}

pub fn default_output_path() -> PathBuf {
    PathBuf::from(format!("reverie-{}.mp4", Utc::now().format("%Y%m%d-%H%M%S")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        let path = default_output_path();
        let name = path.to_string_lossy();
        assert!(name.starts_with("reverie-"));
        assert!(name.ends_with(".mp4"));
    }
}
