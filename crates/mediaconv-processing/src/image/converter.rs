//! Image converter - format conversion and image to PDF

use async_trait::async_trait;
use image::{DynamicImage, GenericImageView, ImageFormat};
use mediaconv_core::{ConvertError, TargetFormat};
use std::io::Cursor;
use std::path::Path;

use crate::document::pdf;
use crate::route::Route;
use crate::traits::{
    blocking, write_output, ConversionJob, ConversionOutcome, MediaConverter, ProgressSink,
};

/// Largest side the ICO format allows
const ICO_MAX_SIDE: u32 = 256;

#[derive(Debug, Default, Clone, Copy)]
pub struct ImageConverter;

impl ImageConverter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MediaConverter for ImageConverter {
    #[tracing::instrument(skip(self, progress), fields(route = ?job.route))]
    async fn convert(
        &self,
        job: &ConversionJob,
        progress: &dyn ProgressSink,
    ) -> Result<ConversionOutcome, ConvertError> {
        let route = job.route;
        if !self.supports(&route) {
            return Err(ConvertError::unsupported(
                job.input.display().to_string(),
                format!("{:?}", route),
            ));
        }

        progress.report(20, "Converting image...").await;
        let start = std::time::Instant::now();

        let input = job.input.clone();
        let output = job.output.clone();
        let slot = job.slot.clone();
        blocking(move || {
            let img = decode(&input)?;
            write_output(&slot, &output, |staged| match route {
                Route::ImageToPdf => image_to_pdf(img, staged),
                Route::ImageToImage(target) => write_image(img, target, staged),
                other => Err(ConvertError::unsupported(
                    input.display().to_string(),
                    format!("{:?}", other),
                )),
            })
        })
        .await?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            "Image conversion completed"
        );
        progress.report(100, "Conversion completed!").await;
        Ok(ConversionOutcome::Converted)
    }

    fn supports(&self, route: &Route) -> bool {
        matches!(route, Route::ImageToImage(_) | Route::ImageToPdf)
    }
}

fn decode(path: &Path) -> Result<DynamicImage, ConvertError> {
    image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(image_error)
}

/// Encode `img` as `target`. Formats without alpha get an RGB buffer.
fn write_image(img: DynamicImage, target: TargetFormat, path: &Path) -> Result<(), ConvertError> {
    let (format, img) = match target {
        TargetFormat::Jpg => (ImageFormat::Jpeg, DynamicImage::ImageRgb8(img.to_rgb8())),
        TargetFormat::Bmp => (ImageFormat::Bmp, DynamicImage::ImageRgb8(img.to_rgb8())),
        TargetFormat::Png => (ImageFormat::Png, DynamicImage::ImageRgba8(img.to_rgba8())),
        TargetFormat::Webp => (ImageFormat::WebP, DynamicImage::ImageRgba8(img.to_rgba8())),
        TargetFormat::Gif => (ImageFormat::Gif, DynamicImage::ImageRgba8(img.to_rgba8())),
        TargetFormat::Ico => {
            let img = if img.width() > ICO_MAX_SIDE || img.height() > ICO_MAX_SIDE {
                img.thumbnail(ICO_MAX_SIDE, ICO_MAX_SIDE)
            } else {
                img
            };
            (ImageFormat::Ico, DynamicImage::ImageRgba8(img.to_rgba8()))
        }
        other => return Err(ConvertError::unsupported("image", other.to_string())),
    };

    img.save_with_format(path, format).map_err(image_error)
}

fn image_to_pdf(img: DynamicImage, path: &Path) -> Result<(), ConvertError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let (width, height) = rgb.dimensions();

    let mut jpeg = Vec::with_capacity((width * height) as usize / 4);
    rgb.write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
        .map_err(image_error)?;

    pdf::write_image_pdf(jpeg, width, height, path)
}

fn image_error(e: image::ImageError) -> ConvertError {
    match e {
        image::ImageError::IoError(io) => ConvertError::Io(io),
        other => ConvertError::Image(other.to_string()),
    }
}
