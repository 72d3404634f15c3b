use std::str::FromStr;
use crate::error::Error;

/// Output framing of the generated video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AspectRatio {
    #[default]
    Landscape,
    Portrait,
}

impl AspectRatio {
    /// Name for display in UI
    pub fn name(&self) -> &str {
        match self {
            Self::Landscape => "Landscape (16:9)",
            Self::Portrait => "Portrait (9:16)",
        }
    }

    /// Ratio string for API communication
    pub fn id(&self) -> &str {
        match self {
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
        }
    }

    /// Frame size the generated clip is delivered at for the given tier
    pub fn frame_size(&self, resolution: Resolution) -> (u32, u32) {
        let (long, short) = resolution.dimensions();
        match self {
            Self::Landscape => (long, short),
            Self::Portrait => (short, long),
        }
    }

    pub fn all() -> [AspectRatio; 2] {
        [Self::Landscape, Self::Portrait]
    }
}

impl FromStr for AspectRatio {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|ratio| ratio.id() == s.trim())
            .ok_or_else(|| Error::UnknownAspectRatio(s.to_string()))
    }
}

/// Resolution tier requested from the generation service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Resolution {
    #[default]
    Hd720,
}

impl Resolution {
    pub fn id(&self) -> &str {
        match self {
            Self::Hd720 => "720p",
        }
    }

    /// (long edge, short edge) in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Hd720 => (1280, 720),
        }
    }
}

/// Number of clips requested per job. Multi-output jobs are not supported.
pub const VIDEOS_PER_JOB: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio_ids() {
        assert_eq!(AspectRatio::Landscape.id(), "16:9");
        assert_eq!(AspectRatio::Portrait.id(), "9:16");
    }

    #[test]
    fn test_aspect_ratio_parse() {
        assert_eq!("9:16".parse::<AspectRatio>().unwrap(), AspectRatio::Portrait);
        assert_eq!(" 16:9 ".parse::<AspectRatio>().unwrap(), AspectRatio::Landscape);
        assert!("4:3".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn test_frame_size_follows_orientation() {
        assert_eq!(AspectRatio::Landscape.frame_size(Resolution::Hd720), (1280, 720));
        assert_eq!(AspectRatio::Portrait.frame_size(Resolution::Hd720), (720, 1280));
    }

    #[test]
    fn test_default_is_landscape() {
        assert_eq!(AspectRatio::default(), AspectRatio::Landscape);
    }
}
