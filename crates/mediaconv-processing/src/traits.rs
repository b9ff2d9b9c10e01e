//! Core traits for media conversion
//!
//! This module defines the interface every converter implements, the
//! progress heartbeat they report through and the slot their output is
//! published into.

use async_trait::async_trait;
use mediaconv_core::{ConvertError, TargetFormat};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tempfile::NamedTempFile;

use crate::route::Route;

/// Receives coarse progress updates while a conversion runs.
///
/// Percentages are fixed milestones, not measurements. Implementations must
/// not fail: transport errors are theirs to swallow.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report(&self, percent: u8, status: &str);
}

/// Progress sink that discards every update.
pub struct NoopProgress;

#[async_trait]
impl ProgressSink for NoopProgress {
    async fn report(&self, _percent: u8, _status: &str) {}
}

/// A fully resolved unit of work handed to a converter.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub route: Route,
    pub slot: OutputSlot,
}

impl ConversionJob {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, route: Route) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            route,
            slot: OutputSlot::default(),
        }
    }

    /// Target format for routes that produce one (everything except compression).
    pub fn target(&self) -> Option<TargetFormat> {
        self.route.target()
    }
}

/// Gatekeeper for a job's output file.
///
/// Blocking work cannot be cancelled, so it writes to a staged file and
/// publishes it only while the slot is live. Once the slot is abandoned,
/// nothing more reaches the output path.
#[derive(Debug, Clone, Default)]
pub struct OutputSlot {
    abandoned: Arc<Mutex<bool>>,
}

impl OutputSlot {
    /// Stage a file next to `output`. It is deleted unless published.
    pub fn stage(&self, output: &Path) -> Result<NamedTempFile, ConvertError> {
        let dir = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let suffix = output
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let staged = tempfile::Builder::new()
            .prefix(".partial_")
            .suffix(&suffix)
            .tempfile_in(dir)?;
        Ok(staged)
    }

    /// Move `staged` to `output`, unless the slot was abandoned meanwhile.
    pub fn publish(&self, staged: NamedTempFile, output: &Path) -> Result<(), ConvertError> {
        let abandoned = self.lock();
        if *abandoned {
            return Err(ConvertError::Abandoned);
        }
        staged
            .persist(output)
            .map_err(|e| ConvertError::Io(e.error))?;
        Ok(())
    }

    /// Refuse further publishing and remove whatever already sits at `output`.
    pub fn abandon(&self, output: &Path) {
        let mut abandoned = self.lock();
        *abandoned = true;
        if let Err(e) = std::fs::remove_file(output) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    error = %e,
                    output = %output.display(),
                    "Failed to remove partial output"
                );
            }
        }
    }

    pub fn is_abandoned(&self) -> bool {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.abandoned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Write through a staged file and publish it to `output`.
pub(crate) fn write_output<F>(
    slot: &OutputSlot,
    output: &Path,
    write: F,
) -> Result<(), ConvertError>
where
    F: FnOnce(&Path) -> Result<(), ConvertError>,
{
    let staged = slot.stage(output)?;
    write(staged.path())?;
    slot.publish(staged, output)
}

/// How the output file came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionOutcome {
    /// The output was produced by the converter.
    Converted,
    /// The converting library is not compiled in; the input was copied as-is.
    CopiedFallback,
}

/// Media converter trait - runs the routes it supports
#[async_trait]
pub trait MediaConverter: Send + Sync {
    /// Run `job`, writing to `job.output`.
    async fn convert(
        &self,
        job: &ConversionJob,
        progress: &dyn ProgressSink,
    ) -> Result<ConversionOutcome, ConvertError>;

    /// Whether this converter handles `route`
    fn supports(&self, route: &Route) -> bool;
}

/// Copy `job.input` to `job.output` unchanged.
#[cfg(any(test, not(feature = "document")))]
pub(crate) async fn copy_fallback(job: &ConversionJob) -> Result<ConversionOutcome, ConvertError> {
    tracing::warn!(
        input = %job.input.display(),
        output = %job.output.display(),
        route = ?job.route,
        "Converter library unavailable, copying input unchanged"
    );
    let input = job.input.clone();
    let output = job.output.clone();
    let slot = job.slot.clone();
    blocking(move || {
        write_output(&slot, &output, |staged| {
            std::fs::copy(&input, staged)?;
            Ok(())
        })
    })
    .await?;
    Ok(ConversionOutcome::CopiedFallback)
}

/// Run blocking library work off the async runtime.
///
/// Under a [`ConversionGate`](crate::gate::ConversionGate) the closure holds
/// the gate's slot until it returns, even if the awaiting future is dropped.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ConvertError>
where
    F: FnOnce() -> Result<T, ConvertError> + Send + 'static,
    T: Send + 'static,
{
    let permit = crate::gate::current_permit();
    tokio::task::spawn_blocking(move || {
        let _permit = permit;
        f()
    })
    .await
    .map_err(|e| ConvertError::Io(std::io::Error::other(e.to_string())))?
}
