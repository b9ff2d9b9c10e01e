//! Target formats a user can pick from the menus.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Group a target format belongs to; drives routing and how the result is sent back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatFamily {
    Video,
    Audio,
    Image,
    Document,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    // Video containers
    Mp4,
    Avi,
    Mov,
    Mkv,
    Webm,
    Wmv,

    // Documents
    Pdf,
    Docx,
    Txt,
    Rtf,

    // Images
    Jpg,
    Png,
    Webp,
    Bmp,
    Ico,
    Gif,

    // Audio
    Mp3,
    Wav,
    Aac,
    Ogg,
    Flac,
}

impl TargetFormat {
    pub fn parse(s: &str) -> Result<Self, ConvertError> {
        match s.trim().to_lowercase().as_str() {
            "mp4" => Ok(TargetFormat::Mp4),
            "avi" => Ok(TargetFormat::Avi),
            "mov" => Ok(TargetFormat::Mov),
            "mkv" => Ok(TargetFormat::Mkv),
            "webm" => Ok(TargetFormat::Webm),
            "wmv" => Ok(TargetFormat::Wmv),
            "pdf" => Ok(TargetFormat::Pdf),
            "docx" => Ok(TargetFormat::Docx),
            "txt" => Ok(TargetFormat::Txt),
            "rtf" => Ok(TargetFormat::Rtf),
            "jpg" | "jpeg" => Ok(TargetFormat::Jpg),
            "png" => Ok(TargetFormat::Png),
            "webp" => Ok(TargetFormat::Webp),
            "bmp" => Ok(TargetFormat::Bmp),
            "ico" => Ok(TargetFormat::Ico),
            "gif" => Ok(TargetFormat::Gif),
            "mp3" => Ok(TargetFormat::Mp3),
            "wav" => Ok(TargetFormat::Wav),
            "aac" => Ok(TargetFormat::Aac),
            "ogg" => Ok(TargetFormat::Ogg),
            "flac" => Ok(TargetFormat::Flac),
            other => Err(ConvertError::InvalidFormat(other.to_string())),
        }
    }

    /// Extension without the dot, also used as the token suffix in callback data.
    pub fn extension(self) -> &'static str {
        match self {
            TargetFormat::Mp4 => "mp4",
            TargetFormat::Avi => "avi",
            TargetFormat::Mov => "mov",
            TargetFormat::Mkv => "mkv",
            TargetFormat::Webm => "webm",
            TargetFormat::Wmv => "wmv",
            TargetFormat::Pdf => "pdf",
            TargetFormat::Docx => "docx",
            TargetFormat::Txt => "txt",
            TargetFormat::Rtf => "rtf",
            TargetFormat::Jpg => "jpg",
            TargetFormat::Png => "png",
            TargetFormat::Webp => "webp",
            TargetFormat::Bmp => "bmp",
            TargetFormat::Ico => "ico",
            TargetFormat::Gif => "gif",
            TargetFormat::Mp3 => "mp3",
            TargetFormat::Wav => "wav",
            TargetFormat::Aac => "aac",
            TargetFormat::Ogg => "ogg",
            TargetFormat::Flac => "flac",
        }
    }

    pub fn family(self) -> FormatFamily {
        match self {
            TargetFormat::Mp4
            | TargetFormat::Avi
            | TargetFormat::Mov
            | TargetFormat::Mkv
            | TargetFormat::Webm
            | TargetFormat::Wmv => FormatFamily::Video,
            TargetFormat::Pdf | TargetFormat::Docx | TargetFormat::Txt | TargetFormat::Rtf => {
                FormatFamily::Document
            }
            TargetFormat::Jpg
            | TargetFormat::Png
            | TargetFormat::Webp
            | TargetFormat::Bmp
            | TargetFormat::Ico
            | TargetFormat::Gif => FormatFamily::Image,
            TargetFormat::Mp3
            | TargetFormat::Wav
            | TargetFormat::Aac
            | TargetFormat::Ogg
            | TargetFormat::Flac => FormatFamily::Audio,
        }
    }
}

impl FromStr for TargetFormat {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetFormat::parse(s)
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
