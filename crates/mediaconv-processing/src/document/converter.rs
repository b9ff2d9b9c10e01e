//! Document converter - PDF, DOCX and plain text
//!
//! Reading PDFs and DOCX files needs the `document` feature. Without it every
//! document route copies its input unchanged and reports
//! [`ConversionOutcome::CopiedFallback`].

use async_trait::async_trait;
use mediaconv_core::ConvertError;

use crate::route::Route;
use crate::traits::{ConversionJob, ConversionOutcome, MediaConverter, ProgressSink};

#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentConverter;

impl DocumentConverter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MediaConverter for DocumentConverter {
    #[tracing::instrument(skip(self, progress), fields(route = ?job.route))]
    async fn convert(
        &self,
        job: &ConversionJob,
        progress: &dyn ProgressSink,
    ) -> Result<ConversionOutcome, ConvertError> {
        if !self.supports(&job.route) {
            return Err(ConvertError::unsupported(
                job.input.display().to_string(),
                format!("{:?}", job.route),
            ));
        }

        progress.report(20, "Converting document...").await;
        let start = std::time::Instant::now();
        let outcome = run(job).await?;
        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            outcome = ?outcome,
            "Document conversion completed"
        );
        progress.report(100, "Conversion completed!").await;

        Ok(outcome)
    }

    fn supports(&self, route: &Route) -> bool {
        matches!(
            route,
            Route::PdfToDocx | Route::PdfToText | Route::DocxToPdf | Route::TextToPdf
        )
    }
}

#[cfg(feature = "document")]
async fn run(job: &ConversionJob) -> Result<ConversionOutcome, ConvertError> {
    let input = job.input.clone();
    let output = job.output.clone();
    let route = job.route;
    let slot = job.slot.clone();

    crate::traits::blocking(move || {
        crate::traits::write_output(&slot, &output, |staged| match route {
            Route::PdfToDocx => {
                let text = library::pdf_text(&input)?;
                library::write_docx(text.lines(), staged)
            }
            Route::PdfToText => {
                let text = library::pdf_text(&input)?;
                Ok(std::fs::write(staged, text)?)
            }
            Route::DocxToPdf => {
                let paragraphs = library::docx_paragraphs(&input)?;
                super::pdf::write_text_pdf(&paragraphs, staged)
            }
            Route::TextToPdf => {
                let bytes = std::fs::read(&input)?;
                let text = String::from_utf8_lossy(&bytes);
                let lines: Vec<&str> = text.lines().collect();
                super::pdf::write_text_pdf(&lines, staged)
            }
            other => Err(ConvertError::unsupported(
                input.display().to_string(),
                format!("{:?}", other),
            )),
        })?;
        Ok(ConversionOutcome::Converted)
    })
    .await
}

#[cfg(not(feature = "document"))]
async fn run(job: &ConversionJob) -> Result<ConversionOutcome, ConvertError> {
    crate::traits::copy_fallback(job).await
}

#[cfg(feature = "document")]
mod library {
    use docx_rs::{DocumentChild, Docx, Paragraph, ParagraphChild, Run, RunChild};
    use mediaconv_core::ConvertError;
    use std::path::Path;

    /// Text of every page, pages separated by newlines.
    pub(super) fn pdf_text(path: &Path) -> Result<String, ConvertError> {
        pdf_extract::extract_text(path).map_err(|e| ConvertError::Document(e.to_string()))
    }

    /// One paragraph per line.
    pub(super) fn write_docx<'a>(
        lines: impl Iterator<Item = &'a str>,
        path: &Path,
    ) -> Result<(), ConvertError> {
        let docx = lines.fold(Docx::new(), |docx, line| {
            docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line)))
        });
        let file = std::fs::File::create(path)?;
        docx.build()
            .pack(file)
            .map_err(|e| ConvertError::Document(e.to_string()))?;
        Ok(())
    }

    /// Plain text of each top-level paragraph. Tables, images and styling
    /// are dropped.
    pub(super) fn docx_paragraphs(path: &Path) -> Result<Vec<String>, ConvertError> {
        let bytes = std::fs::read(path)?;
        let doc = docx_rs::read_docx(&bytes).map_err(|e| ConvertError::Document(e.to_string()))?;

        let paragraphs = doc
            .document
            .children
            .iter()
            .filter_map(|child| match child {
                DocumentChild::Paragraph(para) => Some(paragraph_text(&para.children)),
                _ => None,
            })
            .collect();
        Ok(paragraphs)
    }

    fn paragraph_text(children: &[ParagraphChild]) -> String {
        let mut out = String::new();
        for child in children {
            match child {
                ParagraphChild::Run(run) => push_run(run, &mut out),
                ParagraphChild::Hyperlink(link) => {
                    for inner in &link.children {
                        if let ParagraphChild::Run(run) = inner {
                            push_run(run, &mut out);
                        }
                    }
                }
                _ => {}
            }
        }
        out
    }

    fn push_run(run: &Run, out: &mut String) {
        for run_child in &run.children {
            if let RunChild::Text(text) = run_child {
                out.push_str(&text.text);
            }
        }
    }
}
