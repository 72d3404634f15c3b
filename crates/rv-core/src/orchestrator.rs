// crates/rv-core/src/orchestrator.rs

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, Notify};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use crate::client::{ClientError, ErrorClass, GenerationClient, SubmitPayload};
use crate::credentials::{Credential, CredentialGate};
use crate::encoder::{self, RawImage};
use crate::error::{EncodingError, ErrorKind};
use crate::job::GenerationJob;
use crate::request::{GenerationRequest, SourceImage};
use crate::resources::{ManagedResource, ResourceHandle, ResourceManager, Slot};
use crate::state::OrchestrationState;

/// Mime type of the generated clip
pub const VIDEO_MIME: &str = "video/mp4";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub poll_interval: Duration,
    /// Give up polling after this long. `None` polls until the job finishes.
    pub max_poll_duration: Option<Duration>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_duration: None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("A video is already being generated")]
    Busy,
}

/// A flow whose sequence number is no longer current. Its results are dropped.
#[derive(Debug)]
struct Superseded;

type Step<T> = Result<T, Superseded>;

struct Shared {
    state: OrchestrationState,
    /// Bumped by every new flow, cancel and reset
    sequence: u64,
    resources: ResourceManager,
}

/// Drives one image-to-video generation at a time:
/// submit, poll until done, download, hand out a resource handle.
pub struct Orchestrator {
    client: Arc<dyn GenerationClient>,
    credentials: Arc<CredentialGate>,
    config: OrchestratorConfig,
    shared: Mutex<Shared>,
    state_tx: watch::Sender<OrchestrationState>,
    wake: Notify,
}

impl Orchestrator {
    pub fn new(client: Arc<dyn GenerationClient>, credentials: Arc<CredentialGate>, config: OrchestratorConfig) -> Self {
        let initial = if credentials.is_present() {
            OrchestrationState::Idle
        } else {
            OrchestrationState::AwaitingApiKey
        };
        let (state_tx, _) = watch::channel(initial.clone());

        Self {
            client,
            credentials,
            config,
            shared: Mutex::new(Shared {
                state: initial,
                sequence: 0,
                resources: ResourceManager::new(),
            }),
            state_tx,
            wake: Notify::new(),
        }
    }

    pub fn credentials(&self) -> &CredentialGate {
        &self.credentials
    }

    pub fn state(&self) -> OrchestrationState {
        self.lock().state.clone()
    }

    /// Receives every state transition
    pub fn subscribe(&self) -> watch::Receiver<OrchestrationState> {
        self.state_tx.subscribe()
    }

    pub fn resource(&self, slot: Slot) -> Option<ManagedResource> {
        self.lock().resources.get(slot).cloned()
    }

    pub fn live_resources(&self) -> usize {
        self.lock().resources.live_count()
    }

    /// Run a full generation for `request` and return the state it ended in.
    ///
    /// Rejected with [`OrchestratorError::Busy`] while another flow is in
    /// flight; call [`Orchestrator::cancel`] first to supersede it.
    pub async fn generate(&self, request: GenerationRequest) -> Result<OrchestrationState, OrchestratorError> {
        let Some((seq, credential)) = self.begin(&request)? else {
            return Ok(self.state());
        };

        info!(seq, aspect_ratio = request.aspect_ratio.id(), "starting generation");

        if self.drive(seq, &request, &credential).await.is_err() {
            debug!(seq, "generation superseded, dropping its results");
        }

        Ok(self.state())
    }

    /// Checks preconditions and enters `Submitting`. `None` means the flow
    /// ended before any network call.
    fn begin(&self, request: &GenerationRequest) -> Result<Option<(u64, Credential)>, OrchestratorError> {
        let mut shared = self.lock();

        if shared.state.is_busy() {
            warn!(state = shared.state.label(), "rejecting generate while a job is in flight");
            return Err(OrchestratorError::Busy);
        }

        let credential = match self.credentials.credential() {
            Some(credential) if self.credentials.is_present() => credential,
            _ => {
                self.publish(&mut shared, OrchestrationState::AwaitingApiKey);
                return Ok(None);
            }
        };

        if let Err(e) = request.validate() {
            let message = match e {
                crate::error::Error::Validation(msg) => msg,
                other => other.to_string(),
            };
            // A Failed screen never shows the previous video
            shared.resources.release(Slot::Result);
            self.publish(&mut shared, OrchestrationState::failed(ErrorKind::Validation, message));
            return Ok(None);
        }

        shared.sequence += 1;
        shared.resources.release(Slot::Result);
        self.publish(&mut shared, OrchestrationState::Submitting);

        Ok(Some((shared.sequence, credential)))
    }

    async fn drive(&self, seq: u64, request: &GenerationRequest, credential: &Credential) -> Step<()> {
        let Some(source) = request.source_image.as_ref() else {
            return self.fail(seq, ErrorKind::Validation, "Please upload an image");
        };

        let image = match encoder::encode(source).await {
            Ok(image) => image,
            Err(e) => return self.fail(seq, ErrorKind::Encoding, format!("Could not read the image: {e}")),
        };
        self.ensure_current(seq)?;

        let payload = SubmitPayload::new(image, request.prompt.trim(), request.aspect_ratio);
        let mut job = match self.client.submit(&payload, credential).await {
            Ok(job) => job,
            Err(e) => return self.fail_remote(seq, ErrorKind::Submission, e),
        };

        info!(seq, job = %job.name, "job submitted");
        self.transition(seq, OrchestrationState::Polling(job.clone()))?;

        let started = Instant::now();
        while !job.done {
            self.wait_poll_interval(seq).await?;

            if let Some(max) = self.config.max_poll_duration {
                if started.elapsed() >= max {
                    return self.fail(
                        seq,
                        ErrorKind::Timeout,
                        format!("Video generation did not finish within {}s", max.as_secs()),
                    );
                }
            }

            job = match self.client.poll(&job, credential).await {
                Ok(job) => job,
                Err(e) => return self.fail_remote(seq, ErrorKind::Poll, e),
            };
            debug!(seq, job = %job.name, done = job.done, "polled job");

            if !job.done {
                self.transition(seq, OrchestrationState::Polling(job.clone()))?;
            }
        }

        let Some(uri) = job.result_uri.clone() else {
            return self.fail(
                seq,
                ErrorKind::MissingResult,
                "Video generation completed, but no video was returned",
            );
        };

        self.transition(seq, OrchestrationState::Fetching(job.clone()))?;

        let bytes = match self.client.fetch_asset(&uri, credential).await {
            Ok(bytes) => bytes,
            Err(e) => return self.fail_remote(seq, ErrorKind::AssetFetch, e),
        };

        self.complete(seq, &job, bytes)
    }

    /// Sleeps one poll interval unless the flow is cancelled in the meantime.
    async fn wait_poll_interval(&self, seq: u64) -> Step<()> {
        // Registered before the check so a cancel in between still wakes us
        let cancelled = self.wake.notified();
        self.ensure_current(seq)?;

        tokio::select! {
            _ = tokio::time::sleep(self.config.poll_interval) => {}
            _ = cancelled => {}
        }

        self.ensure_current(seq)
    }

    fn complete(&self, seq: u64, job: &GenerationJob, bytes: Vec<u8>) -> Step<()> {
        let mut shared = self.lock();
        if shared.sequence != seq {
            return Err(Superseded);
        }

        let handle = shared.resources.register(Slot::Result, bytes, VIDEO_MIME);
        info!(seq, job = %job.name, id = %handle.id, bytes = handle.len, "video ready");
        self.publish(&mut shared, OrchestrationState::Ready(handle));
        Ok(())
    }

    fn fail(&self, seq: u64, kind: ErrorKind, message: impl Into<String>) -> Step<()> {
        let message = message.into();
        warn!(seq, kind = %kind, error = %message, "generation failed");
        self.transition(seq, OrchestrationState::failed(kind, message))
    }

    /// Maps a remote failure onto the error taxonomy. Auth failures also
    /// invalidate the credential so the user is asked for a new key.
    fn fail_remote(&self, seq: u64, kind: ErrorKind, err: ClientError) -> Step<()> {
        if err.is_auth_error() {
            self.fail(
                seq,
                ErrorKind::Auth,
                "The API key was rejected or its project was not found. Please select a valid API key.",
            )?;
            self.credentials.invalidate();
            return Ok(());
        }

        let context = match (kind, &err) {
            // The service reported the generation itself as failed
            (ErrorKind::Poll, ClientError::Remote { .. }) => "Video generation failed",
            (ErrorKind::Poll, _) => "Lost track of the video generation",
            (ErrorKind::AssetFetch, _) => "Failed to download video",
            _ => "Video generation failed",
        };
        self.fail(seq, kind, format!("{context}: {}", err.user_message()))
    }

    fn transition(&self, seq: u64, state: OrchestrationState) -> Step<()> {
        let mut shared = self.lock();
        if shared.sequence != seq {
            return Err(Superseded);
        }
        self.publish(&mut shared, state);
        Ok(())
    }

    fn ensure_current(&self, seq: u64) -> Step<()> {
        if self.lock().sequence == seq {
            Ok(())
        } else {
            Err(Superseded)
        }
    }

    fn publish(&self, shared: &mut Shared, state: OrchestrationState) {
        debug!(from = shared.state.label(), to = state.label(), "state transition");
        shared.state = state.clone();
        self.state_tx.send_replace(state);
    }

    /// Abandon the in-flight flow, if any. Its late responses are ignored.
    /// Returns whether a flow was running.
    pub fn cancel(&self) -> bool {
        let was_busy = {
            let mut shared = self.lock();
            shared.sequence += 1;
            let was_busy = shared.state.is_busy();
            if was_busy {
                self.publish(&mut shared, OrchestrationState::Idle);
            }
            was_busy
        };

        if was_busy {
            info!("generation cancelled");
        }
        self.wake.notify_waiters();
        was_busy
    }

    /// Back to a blank slate: cancels any flow and releases the generated video.
    pub fn reset(&self) {
        {
            let mut shared = self.lock();
            shared.sequence += 1;
            shared.resources.release(Slot::Result);
            let next = if self.credentials.is_present() {
                OrchestrationState::Idle
            } else {
                OrchestrationState::AwaitingApiKey
            };
            self.publish(&mut shared, next);
        }
        self.wake.notify_waiters();
    }

    /// Ask the user for a key, then leave the key screen.
    pub async fn select_credential(&self) -> Result<(), crate::error::CredentialError> {
        self.credentials.select().await?;

        let mut shared = self.lock();
        if matches!(shared.state, OrchestrationState::AwaitingApiKey) {
            self.publish(&mut shared, OrchestrationState::Idle);
        }
        Ok(())
    }

    /// Show the user's chosen image. Replaces any earlier preview.
    pub async fn load_preview(&self, source: &SourceImage) -> Result<ResourceHandle, EncodingError> {
        let RawImage { data, mime_type } = encoder::read_source(source).await?;
        Ok(self.lock().resources.register(Slot::Preview, data, mime_type))
    }

    pub fn clear_preview(&self) -> bool {
        self.lock().resources.release(Slot::Preview)
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        // State stays consistent across a panicking observer, so keep going
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
