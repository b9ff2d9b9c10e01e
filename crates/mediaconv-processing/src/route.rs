//! Conversion routing table.
//!
//! A (source kind, input extension, requested operation) triple maps to
//! exactly one [`Route`]; anything not in the table is unsupported.

use mediaconv_core::kind::dotted_extension;
use mediaconv_core::{ConvertError, FileKind, FormatFamily, OutputPrefix, TargetFormat};
use std::fmt;
use std::path::Path;

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Convert(TargetFormat),
    /// Re-encode a video to roughly `target_mb` megabytes.
    Compress { target_mb: u32 },
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Convert(target) => write!(f, "{}", target),
            Operation::Compress { target_mb } => write!(f, "compress to {}MB", target_mb),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    VideoTranscode(TargetFormat),
    ExtractAudio(TargetFormat),
    CompressVideo { target_mb: u32 },
    PdfToDocx,
    PdfToText,
    DocxToPdf,
    TextToPdf,
    ImageToImage(TargetFormat),
    ImageToPdf,
}

const CONVERTIBLE_IMAGE_EXTENSIONS: &[&str] =
    &[".jpg", ".jpeg", ".png", ".bmp", ".gif", ".tiff", ".webp"];

impl Route {
    /// Resolve the route for an input file.
    pub fn for_input(
        input: &Path,
        source: FileKind,
        operation: Operation,
    ) -> Result<Self, ConvertError> {
        Self::resolve(source, &dotted_extension(input), operation)
    }

    /// `ext` is the lowercase input extension with its dot (`".pdf"`).
    pub fn resolve(
        source: FileKind,
        ext: &str,
        operation: Operation,
    ) -> Result<Self, ConvertError> {
        let unsupported = |to: String| ConvertError::unsupported(describe(source, ext), to);
        let target = match operation {
            Operation::Compress { target_mb } => {
                return match source {
                    FileKind::Video if target_mb > 0 => Ok(Route::CompressVideo { target_mb }),
                    _ => Err(unsupported(operation.to_string())),
                };
            }
            Operation::Convert(target) => target,
        };

        let convertible_image = CONVERTIBLE_IMAGE_EXTENSIONS.contains(&ext);
        let route = match (source, target.family(), ext, target) {
            (FileKind::Video, FormatFamily::Video, _, t) => Some(Route::VideoTranscode(t)),
            (FileKind::Video, FormatFamily::Audio, _, t) => Some(Route::ExtractAudio(t)),
            (FileKind::Document, _, ".pdf", TargetFormat::Docx) => Some(Route::PdfToDocx),
            (FileKind::Document, _, ".pdf", TargetFormat::Txt) => Some(Route::PdfToText),
            (FileKind::Document, _, ".doc" | ".docx", TargetFormat::Pdf) => {
                Some(Route::DocxToPdf)
            }
            (FileKind::Document, _, ".txt", TargetFormat::Pdf) => Some(Route::TextToPdf),
            (FileKind::Image, _, _, TargetFormat::Pdf) if convertible_image => {
                Some(Route::ImageToPdf)
            }
            (FileKind::Image, FormatFamily::Image, _, t) if convertible_image => {
                Some(Route::ImageToImage(t))
            }
            _ => None,
        };

        route.ok_or_else(|| unsupported(target.to_string()))
    }

    pub fn target(&self) -> Option<TargetFormat> {
        match self {
            Route::VideoTranscode(t) | Route::ExtractAudio(t) | Route::ImageToImage(t) => Some(*t),
            Route::CompressVideo { .. } => None,
            Route::PdfToDocx => Some(TargetFormat::Docx),
            Route::PdfToText => Some(TargetFormat::Txt),
            Route::DocxToPdf | Route::TextToPdf | Route::ImageToPdf => Some(TargetFormat::Pdf),
        }
    }

    pub fn output_prefix(&self) -> OutputPrefix {
        match self {
            Route::ExtractAudio(_) => OutputPrefix::Audio,
            Route::CompressVideo { .. } => OutputPrefix::Compressed,
            _ => OutputPrefix::Converted,
        }
    }

    /// Extension (without dot) of the file this route writes for `input`.
    pub fn output_extension(&self, input: &Path) -> String {
        match self.target() {
            Some(t) => t.extension().to_string(),
            None => dotted_extension(input).trim_start_matches('.').to_string(),
        }
    }
}

fn describe(source: FileKind, ext: &str) -> String {
    if ext.is_empty() {
        source.to_string()
    } else {
        ext.to_string()
    }
}
