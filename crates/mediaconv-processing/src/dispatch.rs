//! Conversion dispatch - routes a request to the converter that handles it

use mediaconv_core::{Config, ConvertError, FileKind, TempPaths};
use std::path::PathBuf;
use std::sync::Arc;

use crate::document::DocumentConverter;
use crate::image::ImageConverter;
use crate::route::{Operation, Route};
use crate::traits::{ConversionJob, ConversionOutcome, MediaConverter, ProgressSink};
use crate::video::VideoConverter;

#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub input: PathBuf,
    pub source: FileKind,
    pub operation: Operation,
}

#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub path: PathBuf,
    pub route: Route,
    pub outcome: ConversionOutcome,
}

pub struct Dispatcher {
    paths: TempPaths,
    converters: Vec<Arc<dyn MediaConverter>>,
}

impl Dispatcher {
    pub fn new(paths: TempPaths, converters: Vec<Arc<dyn MediaConverter>>) -> Self {
        Self { paths, converters }
    }

    /// Dispatcher with the video, document and image converters.
    pub fn from_config(config: &Config, paths: TempPaths) -> Self {
        let converters: Vec<Arc<dyn MediaConverter>> = vec![
            Arc::new(VideoConverter::new(
                config.ffmpeg_path.clone(),
                config.ffprobe_path.clone(),
                config.video_quality,
            )),
            Arc::new(DocumentConverter::new()),
            Arc::new(ImageConverter::new()),
        ];
        Self::new(paths, converters)
    }

    pub fn paths(&self) -> &TempPaths {
        &self.paths
    }

    /// Run the one conversion routine `request` maps to.
    ///
    /// On failure any partial output is removed before the error is returned.
    /// The same holds when the returned future is dropped mid-conversion.
    #[tracing::instrument(skip(self, progress), fields(
        input = %request.input.display(),
        source = %request.source,
        operation = %request.operation
    ))]
    pub async fn convert(
        &self,
        request: ConversionRequest,
        progress: &dyn ProgressSink,
    ) -> Result<ConversionOutput, ConvertError> {
        if !tokio::fs::try_exists(&request.input).await.unwrap_or(false) {
            return Err(ConvertError::MissingInput(request.input));
        }

        let route = Route::for_input(&request.input, request.source, request.operation)?;
        let output = self.paths.output_path(
            route.output_prefix(),
            &request.input,
            &route.output_extension(&request.input),
        );

        let converter = self
            .converters
            .iter()
            .find(|c| c.supports(&route))
            .ok_or_else(|| {
                ConvertError::unsupported(request.source.to_string(), request.operation.to_string())
            })?;

        let job = ConversionJob::new(request.input, output, route);

        let start = std::time::Instant::now();
        let guard = PartialOutput::new(&job);
        let result = converter.convert(&job, progress).await;
        match result {
            Ok(outcome) => {
                guard.keep();
                tracing::info!(
                    duration_ms = start.elapsed().as_millis(),
                    output = %job.output.display(),
                    route = ?route,
                    outcome = ?outcome,
                    "Conversion finished"
                );
                Ok(ConversionOutput {
                    path: job.output,
                    route,
                    outcome,
                })
            }
            Err(e) => {
                drop(guard);
                tracing::error!(
                    error = %e,
                    duration_ms = start.elapsed().as_millis(),
                    route = ?route,
                    "Conversion failed"
                );
                Err(e)
            }
        }
    }
}

/// Abandons the job's output slot when dropped, unless
/// [`PartialOutput::keep`] was called. That removes the output and stops
/// blocking work still running after a timeout from publishing it later.
struct PartialOutput<'a> {
    job: &'a ConversionJob,
    armed: bool,
}

impl<'a> PartialOutput<'a> {
    fn new(job: &'a ConversionJob) -> Self {
        Self { job, armed: true }
    }

    fn keep(mut self) {
        self.armed = false;
    }
}

impl Drop for PartialOutput<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.job.slot.abandon(&self.job.output);
        }
    }
}
