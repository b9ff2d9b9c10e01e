//! Upload and conversion flow, independent of the chat transport.
//!
//! The Telegram adapter downloads files and renders replies; everything else
//! (size limits, sessions, probing, running conversions through the gate,
//! output cleanup) happens here.

use anyhow::Context;
use mediaconv_core::kind::dotted_extension;
use mediaconv_core::{Config, ConvertError, ErrorMetadata, FileKind, LogLevel, TempPaths};
use mediaconv_processing::{
    ConversionGate, ConversionRequest, Dispatcher, FileInfo, MetadataProbe, ProgressSink,
};
use std::path::{Path, PathBuf};

use crate::callback::ConversionChoice;
use crate::menu::Menu;
use crate::session::{Session, SessionStore};

pub const DOWNLOAD_FAILED_TEXT: &str = "❌ Error processing file!";

/// A file the user sent, as reported by the transport.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_id: String,
    pub size: u64,
    /// Lowercase, with its dot; empty if unknown
    pub extension: String,
    pub kind: FileKind,
    pub original_name: String,
}

impl Upload {
    /// Videos are always stored as `.mp4`.
    pub fn video(file_id: impl Into<String>, size: u64, file_name: Option<&str>) -> Self {
        Self {
            file_id: file_id.into(),
            size,
            extension: ".mp4".to_string(),
            kind: FileKind::Video,
            original_name: file_name.unwrap_or("video.mp4").to_string(),
        }
    }

    /// Photos arrive re-encoded as JPEG.
    pub fn photo(file_id: impl Into<String>, size: u64) -> Self {
        Self {
            file_id: file_id.into(),
            size,
            extension: ".jpg".to_string(),
            kind: FileKind::Image,
            original_name: "photo.jpg".to_string(),
        }
    }

    /// Generic files are classified by their name.
    pub fn document(file_id: impl Into<String>, size: u64, file_name: Option<&str>) -> Self {
        let name = file_name.unwrap_or("file");
        Self {
            file_id: file_id.into(),
            size,
            extension: dotted_extension(Path::new(name)),
            kind: FileKind::from_filename(name),
            original_name: name.to_string(),
        }
    }
}

/// Text and menu to show after an upload.
#[derive(Debug, Clone)]
pub struct UploadReply {
    pub text: String,
    pub menu: Menu,
}

/// A finished conversion waiting to be sent.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub path: PathBuf,
    pub file_name: String,
    pub caption: String,
    pub as_photo: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("no current file for {} conversion", .0.noun())]
    NoCurrentFile(ConversionChoice),

    #[error("upload of {size} bytes exceeds {limit_mb} MB")]
    TooLarge { size: u64, limit_mb: u64 },

    #[error("{noun} conversion failed: {source}")]
    Convert {
        noun: &'static str,
        #[source]
        source: ConvertError,
    },
}

impl ServiceError {
    /// Text shown in the chat.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::NoCurrentFile(choice) => choice.missing_file_text(),
            ServiceError::TooLarge { limit_mb, .. } => {
                format!("❌ File is too large! Maximum size is {} MB.", limit_mb)
            }
            ServiceError::Convert { noun, source } => source.user_message(noun),
        }
    }
}

pub struct BotService {
    config: Config,
    dispatcher: Dispatcher,
    probe: MetadataProbe,
    gate: ConversionGate,
    sessions: SessionStore,
}

impl BotService {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let temp_dir = config.temp_dir.display();
        let paths = TempPaths::new(&config.temp_dir)
            .with_context(|| format!("Failed to create temp directory {}", temp_dir))?;

        Ok(Self {
            dispatcher: Dispatcher::from_config(&config, paths),
            probe: MetadataProbe::new(config.ffprobe_path.clone()),
            gate: ConversionGate::from_config(&config),
            sessions: SessionStore::new(),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn temp_dir(&self) -> &Path {
        self.dispatcher.paths().dir()
    }

    /// Refuse uploads over the size limit before downloading anything.
    pub fn check_upload(&self, upload: &Upload) -> Result<(), ServiceError> {
        if upload.size > self.config.max_file_size_bytes {
            return Err(ServiceError::TooLarge {
                size: upload.size,
                limit_mb: self.config.max_file_size_bytes / 1024 / 1024,
            });
        }
        Ok(())
    }

    /// Where the transport should download `upload` to.
    pub fn input_path(&self, user_id: u64, upload: &Upload) -> PathBuf {
        self.dispatcher
            .paths()
            .input_path(user_id, &upload.file_id, &upload.extension)
    }

    /// Record a downloaded upload as the user's current file and describe it.
    #[tracing::instrument(skip(self, upload), fields(kind = %upload.kind, size = upload.size))]
    pub async fn accept_upload(
        &self,
        user_id: u64,
        path: PathBuf,
        upload: &Upload,
    ) -> UploadReply {
        self.sessions
            .replace(
                user_id,
                Session {
                    path: path.clone(),
                    kind: upload.kind,
                    original_name: upload.original_name.clone(),
                },
            )
            .await;

        let info = match self.probe.probe(&path).await {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "Probe failed");
                None
            }
        };

        UploadReply {
            text: upload_text(upload.kind, upload.size, info.as_ref()),
            menu: Menu::for_kind(upload.kind),
        }
    }

    pub async fn current_file(&self, user_id: u64) -> Option<Session> {
        self.sessions.get(user_id).await
    }

    /// Convert the user's current file as `choice` asks.
    ///
    /// Touches the filesystem only when a current file exists.
    #[tracing::instrument(skip(self, progress), fields(operation = %choice.operation))]
    pub async fn convert(
        &self,
        user_id: u64,
        choice: ConversionChoice,
        progress: &dyn ProgressSink,
    ) -> Result<Delivery, ServiceError> {
        let session = self
            .sessions
            .get(user_id)
            .await
            .ok_or(ServiceError::NoCurrentFile(choice))?;

        let request = ConversionRequest {
            input: session.path.clone(),
            source: session.kind,
            operation: choice.operation,
        };

        let output = self
            .gate
            .run(self.dispatcher.convert(request, progress))
            .await
            .map_err(|source| {
                log_failure(&source, &session);
                ServiceError::Convert {
                    noun: choice.noun(),
                    source,
                }
            })?;

        let extension = dotted_extension(&output.path);
        Ok(Delivery {
            file_name: choice.file_name(extension.trim_start_matches('.')),
            caption: choice.caption(),
            as_photo: choice.send_as_photo(),
            path: output.path,
        })
    }

    /// Delete a delivered (or undeliverable) output file.
    pub async fn discard(&self, delivery: &Delivery) {
        if let Err(e) = tokio::fs::remove_file(&delivery.path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    error = %e,
                    path = %delivery.path.display(),
                    "Failed to remove output"
                );
            }
        }
    }
}

fn log_failure(error: &ConvertError, session: &Session) {
    let code = error.error_code();
    let input = session.path.display();
    let name = &session.original_name;
    match error.log_level() {
        LogLevel::Debug => tracing::debug!(
            error = %error,
            code,
            %input,
            original_name = %name,
            "Conversion refused"
        ),
        LogLevel::Warn => tracing::warn!(
            error = %error,
            code,
            %input,
            original_name = %name,
            "Conversion not run"
        ),
        LogLevel::Error => tracing::error!(
            error = %error,
            code,
            %input,
            original_name = %name,
            "Conversion failed"
        ),
    }
}

/// Reply to an upload: kind, size and whatever the probe found.
fn upload_text(kind: FileKind, size: u64, info: Option<&FileInfo>) -> String {
    let size_mb = info
        .map(FileInfo::size_mb)
        .unwrap_or(size as f64 / 1024.0 / 1024.0);

    let mut text = format!(
        "✅ {} received!\n📁 Size: {:.2} MB\n",
        kind.as_str().to_uppercase(),
        size_mb
    );
    if let Some(info) = info {
        if let Some(duration) = info.duration_secs {
            text.push_str(&format!("⏱️ Duration: {:.2}s\n", duration));
        }
        if let Some(resolution) = &info.resolution {
            text.push_str(&format!("📊 Resolution: {}\n", resolution));
        }
        if let Some(pages) = info.pages {
            text.push_str(&format!("📄 Pages: {}\n", pages));
        }
    }
    text.push_str("\nWhat would you like to do?");
    text
}
