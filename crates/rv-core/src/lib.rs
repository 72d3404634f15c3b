pub mod client;
pub mod credentials;
pub mod encoder;
pub mod error;
pub mod job;
pub mod loading;
pub mod orchestrator;
pub mod request;
pub mod resources;
pub mod state;
mod video_types;

pub use video_types::{AspectRatio, Resolution, VIDEOS_PER_JOB};
