//! Configuration module
//!
//! Settings are read from the environment (and a `.env` file when present).
//! Missing values fall back to defaults; only malformed limits are rejected by
//! [`Config::validate`].

use std::env;
use std::path::PathBuf;
use std::time::Duration;

const MAX_FILE_SIZE_MB: u64 = 500;
const MAX_QUEUE_SIZE: usize = 5;
const MAX_CONCURRENT_PROCESSES: usize = 2;
const PROCESS_TIMEOUT_SECS: u64 = 1800;

/// Video encoding quality preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoQuality {
    #[default]
    High,
    Medium,
    Low,
}

impl VideoQuality {
    pub fn parse(s: &str) -> Result<Self, anyhow::Error> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(VideoQuality::High),
            "medium" => Ok(VideoQuality::Medium),
            "low" => Ok(VideoQuality::Low),
            _ => Err(anyhow::anyhow!("Invalid video quality: {}", s)),
        }
    }

    /// x264 constant rate factor
    pub fn crf(self) -> &'static str {
        match self {
            VideoQuality::High => "23",
            VideoQuality::Medium => "28",
            VideoQuality::Low => "32",
        }
    }

    /// x264 encoder preset
    pub fn preset(self) -> &'static str {
        match self {
            VideoQuality::High => "medium",
            VideoQuality::Medium => "fast",
            VideoQuality::Low => "veryfast",
        }
    }

    /// Bitrate used by the plain re-encode fallback
    pub fn fallback_bitrate(self) -> &'static str {
        match self {
            VideoQuality::High => "1000k",
            VideoQuality::Medium | VideoQuality::Low => "500k",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub bot_token: Option<String>,
    pub temp_dir: PathBuf,
    pub max_file_size_bytes: u64,
    pub max_queue_size: usize,
    pub max_concurrent_processes: usize,
    pub process_timeout: Duration,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub video_quality: VideoQuality,
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot_token: None,
            temp_dir: env::temp_dir().join("mediaconv"),
            max_file_size_bytes: MAX_FILE_SIZE_MB * 1024 * 1024,
            max_queue_size: MAX_QUEUE_SIZE,
            max_concurrent_processes: MAX_CONCURRENT_PROCESSES,
            process_timeout: Duration::from_secs(PROCESS_TIMEOUT_SECS),
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            video_quality: VideoQuality::High,
            environment: "development".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build a config from `var`, which returns the value of a setting if set.
    ///
    /// A missing `BOT_TOKEN` is not an error here; only the bot needs one.
    pub fn from_vars<F>(var: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or(defaults.environment);

        let max_file_size_mb = var("MAX_FILE_SIZE_MB")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(MAX_FILE_SIZE_MB);

        let process_timeout_secs = var("PROCESS_TIMEOUT_SECS")
            .or_else(|| var("PROCESS_TIMEOUT"))
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(PROCESS_TIMEOUT_SECS);

        let video_quality = match var("VIDEO_QUALITY") {
            Some(q) => VideoQuality::parse(&q)?,
            None => VideoQuality::default(),
        };

        let config = Config {
            bot_token: var("BOT_TOKEN").filter(|t| !t.trim().is_empty()),
            temp_dir: var("TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.temp_dir),
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            max_queue_size: var("MAX_QUEUE_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_QUEUE_SIZE),
            max_concurrent_processes: var("MAX_CONCURRENT_PROCESSES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_CONCURRENT_PROCESSES),
            process_timeout: Duration::from_secs(process_timeout_secs),
            ffmpeg_path: var("FFMPEG_PATH").unwrap_or(defaults.ffmpeg_path),
            ffprobe_path: var("FFPROBE_PATH").unwrap_or(defaults.ffprobe_path),
            video_quality,
            environment,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_concurrent_processes == 0 {
            return Err(anyhow::anyhow!(
                "MAX_CONCURRENT_PROCESSES must be at least 1"
            ));
        }
        if self.process_timeout.is_zero() {
            return Err(anyhow::anyhow!(
                "PROCESS_TIMEOUT_SECS must be greater than 0"
            ));
        }
        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }
        validate_tool_path("FFMPEG_PATH", &self.ffmpeg_path)?;
        validate_tool_path("FFPROBE_PATH", &self.ffprobe_path)?;
        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}

/// Tool paths are passed straight to `Command::new`; reject anything that
/// looks like a shell fragment.
fn validate_tool_path(name: &str, path: &str) -> Result<(), anyhow::Error> {
    if path.is_empty() {
        return Err(anyhow::anyhow!("{} must not be empty", name));
    }
    if !path.chars().all(is_safe_path_char) {
        return Err(anyhow::anyhow!(
            "{} contains unsafe characters: {}",
            name,
            path
        ));
    }
    Ok(())
}

fn is_safe_path_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '/' | '-' | '_' | '.' | '\\' | ':')
}
