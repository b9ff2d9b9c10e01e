//! Callback token parsing.
//!
//! Tokens are the `callback_data` strings attached to inline buttons. Each
//! maps to a menu to show, a conversion to run, or a placeholder for a tool
//! that does not exist yet.

use mediaconv_core::{FileKind, FormatFamily, TargetFormat};
use mediaconv_processing::Operation;

use crate::menu::Menu;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Show(Menu),
    Convert(ConversionChoice),
    /// A menu entry with no operation behind it; carries its display name.
    NotAvailable(&'static str),
}

/// A conversion picked from a menu, with the kind of file it expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionChoice {
    pub kind: FileKind,
    pub operation: Operation,
}

impl CallbackAction {
    /// `None` for tokens this bot never issues.
    pub fn parse(data: &str) -> Option<Self> {
        if let Some(menu) = Menu::from_token(data) {
            return Some(CallbackAction::Show(menu));
        }

        let fixed = match data {
            "doc_pdf_docx" => Some(convert(FileKind::Document, TargetFormat::Docx)),
            "doc_pdf_txt" => Some(convert(FileKind::Document, TargetFormat::Txt)),
            "doc_docx_pdf" => Some(convert(FileKind::Document, TargetFormat::Pdf)),
            "doc_img_pdf" => Some(convert(FileKind::Image, TargetFormat::Pdf)),
            "video_merge_menu" => Some(CallbackAction::NotAvailable("Merge Videos")),
            "video_split_menu" => Some(CallbackAction::NotAvailable("Split Video")),
            "doc_compress_pdf" => Some(CallbackAction::NotAvailable("Compress PDF")),
            "img_resize_menu" => Some(CallbackAction::NotAvailable("Resize Image")),
            "img_compress_menu" => Some(CallbackAction::NotAvailable("Compress Image")),
            "img_rotate_menu" => Some(CallbackAction::NotAvailable("Rotate Image")),
            _ => None,
        };
        if fixed.is_some() {
            return fixed;
        }

        let (prefix, value) = data.split_once('_')?;
        match prefix {
            "vformat" => format_in(value, FileKind::Video, |t| {
                t.family() == FormatFamily::Video
            }),
            "aformat" => format_in(value, FileKind::Video, |t| {
                t.family() == FormatFamily::Audio
            }),
            "dformat" => format_in(value, FileKind::Document, |t| {
                t.family() == FormatFamily::Document
            }),
            "iformat" => format_in(value, FileKind::Image, |t| {
                t.family() == FormatFamily::Image || t == TargetFormat::Pdf
            }),
            "vcompress" => {
                let target_mb: u32 = value.parse().ok().filter(|mb| *mb > 0)?;
                Some(CallbackAction::Convert(ConversionChoice {
                    kind: FileKind::Video,
                    operation: Operation::Compress { target_mb },
                }))
            }
            _ => None,
        }
    }
}

fn convert(kind: FileKind, target: TargetFormat) -> CallbackAction {
    CallbackAction::Convert(ConversionChoice {
        kind,
        operation: Operation::Convert(target),
    })
}

fn format_in(
    value: &str,
    kind: FileKind,
    accepts: impl Fn(TargetFormat) -> bool,
) -> Option<CallbackAction> {
    let target = TargetFormat::parse(value).ok()?;
    accepts(target).then(|| convert(kind, target))
}

impl ConversionChoice {
    /// `video`, `document` or `image`
    pub fn noun(&self) -> &'static str {
        match self.kind {
            FileKind::Video | FileKind::Audio => "video",
            FileKind::Image => "image",
            FileKind::Document | FileKind::Unknown => "document",
        }
    }

    pub fn missing_file_text(&self) -> String {
        let article = if self.kind == FileKind::Image { "an" } else { "a" };
        format!("❌ Please send {} {} file first!", article, self.noun())
    }

    pub fn starting_text(&self) -> String {
        format!("🔄 Starting {} conversion...", self.noun())
    }

    pub fn progress_text(&self, percent: u8, status: &str) -> String {
        format!("🔄 Converting {}... {}%\n{}", self.noun(), percent, status)
    }

    pub fn caption(&self) -> String {
        match self.operation {
            Operation::Convert(target) => format!(
                "✅ {} converted to {}!",
                capitalize(self.noun()),
                target.extension().to_uppercase()
            ),
            Operation::Compress { target_mb } => format!("✅ Video compressed to {}MB!", target_mb),
        }
    }

    /// Name the delivered file carries in the chat.
    pub fn file_name(&self, extension: &str) -> String {
        match self.operation {
            Operation::Convert(_) => format!("converted.{}", extension),
            Operation::Compress { .. } => format!("compressed.{}", extension),
        }
    }

    /// Image results are shown inline, except PDFs.
    pub fn send_as_photo(&self) -> bool {
        self.kind == FileKind::Image
            && matches!(self.operation, Operation::Convert(t) if t.family() == FormatFamily::Image)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
