//! Assembled audio value object

use std::fmt;
use std::str::FromStr;

use crate::domain::error::InvalidMimeTypeError;

/// Content types a recording can be declared as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AudioMimeType {
    #[default]
    Mpeg,
    Wav,
    Ogg,
    Webm,
    Mp4,
    Flac,
}

impl AudioMimeType {
    pub const ALL: [AudioMimeType; 6] = [
        Self::Mpeg,
        Self::Wav,
        Self::Ogg,
        Self::Webm,
        Self::Mp4,
        Self::Flac,
    ];

    /// Get the MIME type string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mpeg => "audio/mpeg",
            Self::Wav => "audio/wav",
            Self::Ogg => "audio/ogg",
            Self::Webm => "audio/webm",
            Self::Mp4 => "audio/mp4",
            Self::Flac => "audio/flac",
        }
    }
}

impl fmt::Display for AudioMimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AudioMimeType {
    type Err = InvalidMimeTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "audio/mpeg" | "audio/mp3" => Ok(Self::Mpeg),
            "audio/wav" | "audio/x-wav" | "audio/wave" => Ok(Self::Wav),
            "audio/ogg" => Ok(Self::Ogg),
            "audio/webm" => Ok(Self::Webm),
            "audio/mp4" => Ok(Self::Mp4),
            "audio/flac" => Ok(Self::Flac),
            _ => Err(InvalidMimeTypeError {
                input: s.to_string(),
            }),
        }
    }
}

/// A complete recording: the concatenated capture bytes and the content type
/// they are declared as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioData {
    data: Vec<u8>,
    mime_type: AudioMimeType,
}

impl AudioData {
    pub fn new(data: Vec<u8>, mime_type: AudioMimeType) -> Self {
        Self { data, mime_type }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn mime_type(&self) -> AudioMimeType {
        self.mime_type
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get human-readable size
    pub fn human_readable_size(&self) -> String {
        let bytes = self.size_bytes();
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mime_type_is_mpeg() {
        assert_eq!(AudioMimeType::default(), AudioMimeType::Mpeg);
        assert_eq!(AudioMimeType::default().as_str(), "audio/mpeg");
    }

    #[test]
    fn mime_type_parses_every_canonical_name() {
        for mime in AudioMimeType::ALL {
            assert_eq!(mime.as_str().parse::<AudioMimeType>().unwrap(), mime);
        }
    }

    #[test]
    fn mime_type_parses_aliases() {
        assert_eq!("audio/mp3".parse::<AudioMimeType>().unwrap(), AudioMimeType::Mpeg);
        assert_eq!(" AUDIO/X-WAV ".parse::<AudioMimeType>().unwrap(), AudioMimeType::Wav);
    }

    #[test]
    fn mime_type_rejects_unknown() {
        let err = "video/mp4".parse::<AudioMimeType>().unwrap_err();
        assert!(err.to_string().contains("video/mp4"));
    }

    #[test]
    fn human_readable_sizes() {
        assert_eq!(AudioData::new(vec![0u8; 500], AudioMimeType::Mpeg).human_readable_size(), "500 B");
        assert_eq!(AudioData::new(vec![0u8; 2048], AudioMimeType::Mpeg).human_readable_size(), "2.0 KB");
        assert_eq!(
            AudioData::new(vec![0u8; 2 * 1024 * 1024], AudioMimeType::Mpeg).human_readable_size(),
            "2.0 MB"
        );
    }

    #[test]
    fn empty_recording() {
        let audio = AudioData::new(Vec::new(), AudioMimeType::Mpeg);
        assert!(audio.is_empty());
        assert_eq!(audio.size_bytes(), 0);
    }
}
