//! Inline menus, described independently of the chat transport.

use mediaconv_core::FileKind;

pub const WELCOME_TEXT: &str = "🎬 <b>Welcome to Advanced File Converter Bot!</b>

I can help you convert and process:
• 🎥 Videos (Convert, Compress, Extract audio)
• 📄 Documents (PDF, DOCX, TXT conversions)
• 🖼️ Images (Convert, Image to PDF)
• 🔊 Audio (Extract from video)

Simply send me a file to get started!";

/// One inline button: label and callback token.
pub type Button = (&'static str, &'static str);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Menu {
    Main,
    VideoTools,
    DocumentTools,
    ImageTools,
    AudioTools,
    VideoFormats,
    DocumentFormats,
    ImageFormats,
    AudioFormats,
    CompressSizes,
}

impl Menu {
    /// Menu shown after an upload of `kind`
    pub fn for_kind(kind: FileKind) -> Self {
        match kind {
            FileKind::Video => Menu::VideoTools,
            FileKind::Document => Menu::DocumentTools,
            FileKind::Image => Menu::ImageTools,
            FileKind::Audio | FileKind::Unknown => Menu::Main,
        }
    }

    /// Menu opened by a navigation token
    pub fn from_token(token: &str) -> Option<Self> {
        let menu = match token {
            "main_menu" => Menu::Main,
            "video_tools" => Menu::VideoTools,
            "document_tools" => Menu::DocumentTools,
            "image_tools" => Menu::ImageTools,
            "audio_tools" => Menu::AudioTools,
            "video_convert_menu" => Menu::VideoFormats,
            "doc_convert_menu" => Menu::DocumentFormats,
            "img_convert_menu" => Menu::ImageFormats,
            "video_audio_menu" => Menu::AudioFormats,
            "video_compress_menu" => Menu::CompressSizes,
            _ => return None,
        };
        Some(menu)
    }

    pub fn title(self) -> &'static str {
        match self {
            Menu::Main => "Choose an option:",
            Menu::VideoTools => "🎥 Video Tools - Choose an action:",
            Menu::DocumentTools => "📄 Document Tools - Choose an action:",
            Menu::ImageTools => "🖼️ Image Tools - Choose an action:",
            Menu::AudioTools => "🔊 Audio Tools - Choose an action:",
            Menu::VideoFormats => "Select output video format:",
            Menu::DocumentFormats => "Select output document format:",
            Menu::ImageFormats => "Select output image format:",
            Menu::AudioFormats => "Select output audio format:",
            Menu::CompressSizes => "Select target video size:",
        }
    }

    pub fn rows(self) -> Vec<Vec<Button>> {
        match self {
            Menu::Main => vec![
                vec![
                    ("🎥 Video Tools", "video_tools"),
                    ("📄 Document Tools", "document_tools"),
                ],
                vec![
                    ("🖼️ Image Tools", "image_tools"),
                    ("🔊 Audio Tools", "audio_tools"),
                ],
            ],
            Menu::VideoTools => vec![
                vec![
                    ("🎞️ Convert Video", "video_convert_menu"),
                    ("🔀 Merge Videos", "video_merge_menu"),
                ],
                vec![
                    ("✂️ Split Video", "video_split_menu"),
                    ("📊 Compress Video", "video_compress_menu"),
                ],
                vec![("🔊 Extract Audio", "video_audio_menu")],
                vec![("🔙 Back", "main_menu")],
            ],
            Menu::DocumentTools => vec![
                vec![
                    ("📄 PDF to DOCX", "doc_pdf_docx"),
                    ("📝 PDF to TXT", "doc_pdf_txt"),
                ],
                vec![
                    ("📋 DOCX to PDF", "doc_docx_pdf"),
                    ("🖼️ Image to PDF", "doc_img_pdf"),
                ],
                vec![
                    ("🔄 Convert Format", "doc_convert_menu"),
                    ("📊 Compress PDF", "doc_compress_pdf"),
                ],
                vec![("🔙 Back", "main_menu")],
            ],
            Menu::ImageTools => vec![
                vec![
                    ("🖼️ Convert Format", "img_convert_menu"),
                    ("📐 Resize Image", "img_resize_menu"),
                ],
                vec![
                    ("🎨 Compress Image", "img_compress_menu"),
                    ("🔄 Rotate Image", "img_rotate_menu"),
                ],
                vec![("🔙 Back", "main_menu")],
            ],
            Menu::AudioTools => vec![
                vec![("🔊 Extract Audio from Video", "video_audio_menu")],
                vec![("🔙 Back", "main_menu")],
            ],
            Menu::VideoFormats => vec![
                vec![("MP4", "vformat_mp4"), ("AVI", "vformat_avi")],
                vec![("MOV", "vformat_mov"), ("MKV", "vformat_mkv")],
                vec![("WEBM", "vformat_webm"), ("WMV", "vformat_wmv")],
                vec![("🔙 Back", "video_tools")],
            ],
            Menu::DocumentFormats => vec![
                vec![("PDF", "dformat_pdf"), ("DOCX", "dformat_docx")],
                vec![("TXT", "dformat_txt"), ("RTF", "dformat_rtf")],
                vec![("🔙 Back", "document_tools")],
            ],
            Menu::ImageFormats => vec![
                vec![("JPG", "iformat_jpg"), ("PNG", "iformat_png")],
                vec![("WEBP", "iformat_webp"), ("BMP", "iformat_bmp")],
                vec![("PDF", "iformat_pdf"), ("ICO", "iformat_ico")],
                vec![("🔙 Back", "image_tools")],
            ],
            Menu::AudioFormats => vec![
                vec![("MP3", "aformat_mp3"), ("WAV", "aformat_wav")],
                vec![("AAC", "aformat_aac"), ("OGG", "aformat_ogg")],
                vec![("FLAC", "aformat_flac")],
                vec![("🔙 Back", "video_tools")],
            ],
            Menu::CompressSizes => vec![
                vec![("10 MB", "vcompress_10"), ("25 MB", "vcompress_25")],
                vec![("50 MB", "vcompress_50"), ("100 MB", "vcompress_100")],
                vec![("🔙 Back", "video_tools")],
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::CallbackAction;

    const ALL: [Menu; 10] = [
        Menu::Main,
        Menu::VideoTools,
        Menu::DocumentTools,
        Menu::ImageTools,
        Menu::AudioTools,
        Menu::VideoFormats,
        Menu::DocumentFormats,
        Menu::ImageFormats,
        Menu::AudioFormats,
        Menu::CompressSizes,
    ];

    #[test]
    fn test_every_button_token_is_understood() {
        for menu in ALL {
            for (label, token) in menu.rows().into_iter().flatten() {
                assert!(
                    CallbackAction::parse(token).is_some(),
                    "{:?} button {:?} has unknown token {:?}",
                    menu,
                    label,
                    token
                );
            }
        }
    }

    #[test]
    fn test_menu_for_kind() {
        assert_eq!(Menu::for_kind(FileKind::Video), Menu::VideoTools);
        assert_eq!(Menu::for_kind(FileKind::Document), Menu::DocumentTools);
        assert_eq!(Menu::for_kind(FileKind::Image), Menu::ImageTools);
        assert_eq!(Menu::for_kind(FileKind::Unknown), Menu::Main);
    }

    #[test]
    fn test_callback_data_fits_telegram_limit() {
        for menu in ALL {
            for (_, token) in menu.rows().into_iter().flatten() {
                assert!(token.len() <= 64);
            }
        }
    }
}
