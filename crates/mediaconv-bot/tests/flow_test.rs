//! Upload and conversion flow through `BotService`, without Telegram.

use image::{ImageFormat, Rgb, RgbImage};
use mediaconv_bot::{BotService, CallbackAction, ConversionChoice, Menu, ServiceError, Upload};
use mediaconv_core::{Config, FileKind};
use mediaconv_processing::NoopProgress;
use std::path::PathBuf;
use tempfile::TempDir;

const USER: u64 = 42;
const OTHER_USER: u64 = 43;

struct TestContext {
    dir: TempDir,
    service: BotService,
}

impl TestContext {
    fn new() -> Self {
        Self::with_config(|_| {})
    }

    fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = Config {
            temp_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        adjust(&mut config);
        let service = BotService::new(config).unwrap();
        Self { dir, service }
    }

    fn files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(self.dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        files.sort();
        files
    }

    async fn upload(&self, upload: &Upload, bytes: &[u8]) -> PathBuf {
        self.upload_as(USER, upload, bytes).await
    }

    /// Simulate the transport: write the "downloaded" bytes and hand them over.
    async fn upload_as(&self, user_id: u64, upload: &Upload, bytes: &[u8]) -> PathBuf {
        self.service.check_upload(upload).unwrap();
        let path = self.service.input_path(user_id, upload);
        tokio::fs::write(&path, bytes).await.unwrap();
        self.service
            .accept_upload(user_id, path.clone(), upload)
            .await;
        path
    }
}

fn choice(data: &str) -> ConversionChoice {
    match CallbackAction::parse(data) {
        Some(CallbackAction::Convert(choice)) => choice,
        other => panic!("{} is not a conversion: {:?}", data, other),
    }
}

fn png_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    RgbImage::from_pixel(40, 20, Rgb([200, 10, 10]))
        .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

#[tokio::test]
async fn test_convert_without_upload() {
    let ctx = TestContext::new();

    let err = ctx
        .service
        .convert(USER, choice("dformat_pdf"), &NoopProgress)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NoCurrentFile(_)));
    assert_eq!(err.user_message(), "❌ Please send a document file first!");
    assert!(ctx.files().is_empty());

    let err = ctx
        .service
        .convert(USER, choice("iformat_png"), &NoopProgress)
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "❌ Please send an image file first!");
}

#[tokio::test]
async fn test_upload_reply_offers_kind_menu() {
    let ctx = TestContext::new();
    let upload = Upload::document("f1", 11, Some("notes.txt"));
    let path = ctx.service.input_path(USER, &upload);
    tokio::fs::write(&path, "hello world").await.unwrap();

    let reply = ctx.service.accept_upload(USER, path.clone(), &upload).await;

    assert_eq!(reply.menu, Menu::DocumentTools);
    let text = &reply.text;
    assert!(text.starts_with("✅ DOCUMENT received!\n"));
    assert!(text.contains("📁 Size: 0.00 MB\n"));
    assert!(text.ends_with("What would you like to do?"));

    let session = ctx.service.current_file(USER).await.unwrap();
    assert_eq!(session.path, path);
    assert_eq!(session.kind, FileKind::Document);
    assert_eq!(session.original_name, "notes.txt");
}

#[tokio::test]
async fn test_second_upload_replaces_first() {
    let ctx = TestContext::new();
    let first = ctx
        .upload(&Upload::document("f1", 5, Some("one.txt")), b"first")
        .await;
    let second = ctx
        .upload(&Upload::document("f2", 6, Some("two.txt")), b"second")
        .await;

    assert!(!first.exists());
    assert_eq!(ctx.service.current_file(USER).await.unwrap().path, second);

    let delivery = ctx
        .service
        .convert(USER, choice("dformat_pdf"), &NoopProgress)
        .await
        .unwrap();

    assert_eq!(delivery.path, ctx.dir.path().join("converted_42_f2.pdf"));
    assert_eq!(delivery.file_name, "converted.pdf");
    assert_eq!(delivery.caption, "✅ Document converted to PDF!");
    assert!(!delivery.as_photo);
    assert!(delivery.path.exists());
}

#[tokio::test]
async fn test_discard_removes_output_only() {
    let ctx = TestContext::new();
    let input = ctx
        .upload(&Upload::document("f1", 5, Some("one.txt")), b"hello")
        .await;

    let delivery = ctx
        .service
        .convert(USER, choice("dformat_pdf"), &NoopProgress)
        .await
        .unwrap();
    ctx.service.discard(&delivery).await;

    assert!(!delivery.path.exists());
    assert_eq!(ctx.files(), vec![input]);

    // Discarding twice is harmless.
    ctx.service.discard(&delivery).await;
}

#[tokio::test]
async fn test_photo_to_pdf_and_png() {
    let ctx = TestContext::new();
    ctx.upload(&Upload::photo("p1", 100), &png_bytes()).await;

    let pdf = ctx
        .service
        .convert(USER, choice("iformat_pdf"), &NoopProgress)
        .await
        .unwrap();
    assert_eq!(pdf.file_name, "converted.pdf");
    assert_eq!(pdf.caption, "✅ Image converted to PDF!");
    assert!(!pdf.as_photo);
    assert!(std::fs::read(&pdf.path).unwrap().starts_with(b"%PDF"));

    let png = ctx
        .service
        .convert(USER, choice("iformat_png"), &NoopProgress)
        .await
        .unwrap();
    assert_eq!(png.file_name, "converted.png");
    assert!(png.as_photo);
    assert_eq!(image::image_dimensions(&png.path).unwrap(), (40, 20));
}

#[tokio::test]
async fn test_session_survives_failed_conversion() {
    let ctx = TestContext::new();
    let input = ctx
        .upload(&Upload::photo("p1", 100), b"definitely not a jpeg")
        .await;

    let err = ctx
        .service
        .convert(USER, choice("iformat_png"), &NoopProgress)
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "❌ Error during image conversion!");
    assert_eq!(ctx.files(), vec![input.clone()]);
    assert_eq!(ctx.service.current_file(USER).await.unwrap().path, input);
}

#[tokio::test]
async fn test_users_are_isolated() {
    let ctx = TestContext::new();
    ctx.upload(&Upload::document("f1", 5, Some("one.txt")), b"hello")
        .await;

    assert!(ctx.service.current_file(OTHER_USER).await.is_none());
    let err = ctx
        .service
        .convert(OTHER_USER, choice("dformat_pdf"), &NoopProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NoCurrentFile(_)));
}

#[tokio::test]
async fn test_users_sharing_a_chat_keep_their_own_files() {
    let ctx = TestContext::new();
    // The same file forwarded by two members of one group.
    let upload = Upload::document("f1", 5, Some("one.txt"));
    let mine = ctx.upload_as(USER, &upload, b"mine").await;
    let theirs = ctx.upload_as(OTHER_USER, &upload, b"theirs").await;

    assert_ne!(mine, theirs);
    assert_eq!(std::fs::read(&mine).unwrap(), b"mine");
    assert_eq!(std::fs::read(&theirs).unwrap(), b"theirs");
    assert_eq!(ctx.service.current_file(USER).await.unwrap().path, mine);
    let session = ctx.service.current_file(OTHER_USER).await.unwrap();
    assert_eq!(session.path, theirs);

    let delivery = ctx
        .service
        .convert(USER, choice("dformat_pdf"), &NoopProgress)
        .await
        .unwrap();
    assert_eq!(delivery.path, ctx.dir.path().join("converted_42_f1.pdf"));

    let delivery = ctx
        .service
        .convert(OTHER_USER, choice("dformat_pdf"), &NoopProgress)
        .await
        .unwrap();
    assert_eq!(delivery.path, ctx.dir.path().join("converted_43_f1.pdf"));
}

#[test]
fn test_oversized_upload_refused() {
    let ctx = TestContext::with_config(|config| config.max_file_size_bytes = 1024 * 1024);

    let err = ctx
        .service
        .check_upload(&Upload::video("v1", 2 * 1024 * 1024, None))
        .unwrap_err();

    assert_eq!(
        err.user_message(),
        "❌ File is too large! Maximum size is 1 MB."
    );
    assert!(ctx
        .service
        .check_upload(&Upload::video("v2", 1024 * 1024, None))
        .is_ok());
}
