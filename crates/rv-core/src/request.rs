use std::path::PathBuf;
use crate::error::{Error, Result};
use crate::video_types::AspectRatio;

/// The still image the user wants animated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceImage {
    Bytes {
        data: Vec<u8>,
        mime_type: Option<String>,
    },
    File {
        path: PathBuf,
        mime_type: Option<String>,
    },
    /// `data:<mime>;base64,<payload>` as produced by a browser file reader
    DataUri(String),
}

impl SourceImage {
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self::Bytes { data, mime_type: None }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::File {
            path: path.into(),
            mime_type: None,
        }
    }

    pub fn with_mime_type(self, mime: impl Into<String>) -> Self {
        let mime = Some(mime.into());
        match self {
            Self::Bytes { data, .. } => Self::Bytes { data, mime_type: mime },
            Self::File { path, .. } => Self::File { path, mime_type: mime },
            // The header already names the type
            uri @ Self::DataUri(_) => uri,
        }
    }

    /// True when there is nothing to upload. A file is only checked for a
    /// non-empty path here; an unreadable file fails later during encoding.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Bytes { data, .. } => data.is_empty(),
            Self::File { path, .. } => path.as_os_str().is_empty(),
            Self::DataUri(uri) => match uri.split_once(',') {
                Some((_, payload)) => payload.trim().is_empty(),
                None => uri.trim().is_empty(),
            },
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Bytes { data, .. } => format!("{} bytes in memory", data.len()),
            Self::File { path, .. } => path.display().to_string(),
            Self::DataUri(uri) => format!("data URI ({} chars)", uri.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub source_image: Option<SourceImage>,
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
}

impl GenerationRequest {
    pub fn new(source_image: SourceImage, prompt: impl Into<String>, aspect_ratio: AspectRatio) -> Self {
        Self {
            source_image: Some(source_image),
            prompt: prompt.into(),
            aspect_ratio,
        }
    }

    /// Submission precondition: an image and a prompt must both be present
    pub fn validate(&self) -> Result<()> {
        match &self.source_image {
            None => return Err(Error::Validation("Please upload an image".into())),
            Some(image) if image.is_empty() => {
                return Err(Error::Validation("The uploaded image is empty".into()));
            }
            Some(_) => {}
        }

        if self.prompt.trim().is_empty() {
            return Err(Error::Validation("Please describe the motion you want".into()));
        }

        Ok(())
    }
}
