use log::{error, info, warn};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use rv_core::loading::{self, MESSAGE_INTERVAL};
use rv_core::state::OrchestrationState;
use rv_core::{AspectRatio, Resolution};

/// One human-readable line per state
pub fn status_line(state: &OrchestrationState, aspect_ratio: AspectRatio) -> String {
    match state {
        OrchestrationState::Idle => "Ready to generate".to_string(),
        OrchestrationState::AwaitingApiKey => {
            "An API key is required. Set GEMINI_API_KEY in .env (see https://ai.google.dev/gemini-api/docs/billing)".to_string()
        }
        OrchestrationState::Submitting => "Submitting your image...".to_string(),
        OrchestrationState::Polling(job) => {
            format!("Generating video ({}s elapsed)", job.elapsed().num_seconds())
        }
        OrchestrationState::Fetching(_) => "Downloading video...".to_string(),
        OrchestrationState::Ready(handle) => format!(
            "Video ready: {} ({}, {})",
            handle.id,
            format_bytes(handle.len),
            framing(aspect_ratio)
        ),
        OrchestrationState::Failed(err) => format!("Error: {}", err.message),
    }
}

/// Frame the player should reserve for the clip
pub fn framing(aspect_ratio: AspectRatio) -> String {
    let (w, h) = aspect_ratio.frame_size(Resolution::default());
    format!("{}x{} {}", w, h, aspect_ratio.name())
}

pub fn format_bytes(len: usize) -> String {
    const MIB: f64 = 1024.0 * 1024.0;
    if len as f64 >= MIB {
        format!("{:.1} MiB", len as f64 / MIB)
    } else {
        format!("{:.1} KiB", len as f64 / 1024.0)
    }
}

/// Background reporter started by [`spawn_progress`]
pub struct Progress {
    stop: oneshot::Sender<()>,
    task: JoinHandle<Option<String>>,
}

impl Progress {
    /// Stop reporting once the latest state has been rendered. Returns the
    /// last line written.
    pub async fn finish(self) -> Option<String> {
        let _ = self.stop.send(());
        self.task.await.ok().flatten()
    }
}

fn report(state: &OrchestrationState, aspect_ratio: AspectRatio) -> String {
    let line = status_line(state, aspect_ratio);
    match state {
        OrchestrationState::Failed(_) => error!("{}", line),
        OrchestrationState::AwaitingApiKey => warn!("{}", line),
        _ => info!("{}", line),
    }
    line
}

/// Logs every transition, and while a job is in flight rotates through the
/// loading messages.
pub fn spawn_progress(mut rx: watch::Receiver<OrchestrationState>, aspect_ratio: AspectRatio) -> Progress {
    let (stop, mut stopped) = oneshot::channel();

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(MESSAGE_INTERVAL);
        let mut tick = 0u64;
        let mut last = None;

        loop {
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = rx.borrow_and_update().clone();
                    last = Some(report(&state, aspect_ratio));
                }
                _ = &mut stopped => {
                    // Render a transition published just before the stop
                    if rx.has_changed().unwrap_or(false) {
                        let state = rx.borrow_and_update().clone();
                        last = Some(report(&state, aspect_ratio));
                    }
                    break;
                }
                _ = ticker.tick() => {
                    if rx.borrow().is_busy() {
                        info!("{}", loading::message_at(tick));
                        tick += 1;
                    }
                }
            }
        }

        last
    });

    Progress { stop, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rv_core::error::ErrorKind;
    use rv_core::job::GenerationJob;
    use rv_core::resources::{ResourceManager, Slot};

    #[test]
    fn test_failed_line_shows_message() {
        let state = OrchestrationState::failed(ErrorKind::AssetFetch, "Failed to download video: Forbidden");
        assert_eq!(
            status_line(&state, AspectRatio::Landscape),
            "Error: Failed to download video: Forbidden"
        );
    }

    #[test]
    fn test_polling_line() {
        let state = OrchestrationState::Polling(GenerationJob::pending("operations/1"));
        assert_eq!(status_line(&state, AspectRatio::Landscape), "Generating video (0s elapsed)");
    }

    #[test]
    fn test_framing() {
        assert_eq!(framing(AspectRatio::Portrait), "720x1280 Portrait (9:16)");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MiB");
        assert_eq!(format_bytes(512), "0.5 KiB");
    }

    #[tokio::test]
    async fn test_finish_reports_final_transition() {
        let (tx, rx) = watch::channel(OrchestrationState::Idle);
        let progress = spawn_progress(rx, AspectRatio::Landscape);

        let handle = ResourceManager::new().register(Slot::Result, vec![0u8; 2048], "video/mp4");
        tx.send_replace(OrchestrationState::Ready(handle));

        let line = progress.finish().await.unwrap();
        assert!(line.starts_with("Video ready: blob:reverie/"));
        assert!(line.ends_with("(2.0 KiB, 1280x720 Landscape (16:9))"));
    }
}
