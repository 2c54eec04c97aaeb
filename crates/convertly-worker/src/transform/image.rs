//! Image-family transformations: convert, compress, resize.
//!
//! Thin wrappers around the `image` crate. Quality handling differs
//! per format: JPEG takes the quality directly, PNG maps it to a
//! compression level, WebP is re-encoded losslessly.

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use tracing::info;

use convertly_core::error::{AppError, ErrorKind};
use convertly_core::result::AppResult;
use convertly_core::traits::ObjectStore;
use convertly_entity::{ImagePayload, Job, JobOutput, JobPayload};

use super::{output_key, Transformer};

/// Transformer for the image family.
#[derive(Debug)]
pub struct ImageTransformer {
    store: Arc<dyn ObjectStore>,
}

impl ImageTransformer {
    /// Create an image transformer over the given object store.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    async fn load(&self, key: &str) -> AppResult<(DynamicImage, ImageFormat)> {
        let data = self.store.download(key).await?;
        let format = image::guess_format(&data).map_err(|e| {
            AppError::with_source(
                ErrorKind::Transformation,
                format!("could not detect image format of '{key}'"),
                e,
            )
        })?;
        let img = image::load_from_memory_with_format(&data, format).map_err(|e| {
            AppError::with_source(
                ErrorKind::Transformation,
                format!("failed to decode image '{key}'"),
                e,
            )
        })?;
        Ok((img, format))
    }

    async fn finish(
        &self,
        job: &Job,
        img: &DynamicImage,
        encoded: Vec<u8>,
        ext: &str,
    ) -> AppResult<JobOutput> {
        let out_key = output_key(job.id, job.task.as_str(), ext);
        let size = encoded.len() as u64;
        self.store.upload(&out_key, encoded.into()).await?;

        info!(
            job_id = %job.id,
            key = %out_key,
            width = img.width(),
            height = img.height(),
            size,
            "Image transformation finished"
        );
        Ok(JobOutput::image(out_key, size, img.width(), img.height()))
    }

    async fn convert(&self, job: &Job, key: &str, target_format: &str) -> AppResult<JobOutput> {
        let (img, _) = self.load(key).await?;
        let (format, ext) = parse_target_format(target_format)?;
        let encoded = encode(&img, format)?;
        self.finish(job, &img, encoded, ext).await
    }

    async fn compress(&self, job: &Job, key: &str, quality: u8) -> AppResult<JobOutput> {
        let (img, format) = self.load(key).await?;
        let encoded = match format {
            ImageFormat::Jpeg => encode_jpeg(&img, quality)?,
            ImageFormat::Png => encode_png(&img, quality)?,
            // The webp encoder is lossless; re-encode as-is.
            _ => encode(&img, format)?,
        };
        let ext = extension_for(format);
        self.finish(job, &img, encoded, ext).await
    }

    async fn resize(&self, job: &Job, key: &str, scale_percent: u32) -> AppResult<JobOutput> {
        let (img, format) = self.load(key).await?;

        let width = scaled(img.width(), scale_percent);
        let height = scaled(img.height(), scale_percent);
        let resized = img.resize_exact(width, height, FilterType::Lanczos3);

        let encoded = encode(&resized, format)?;
        let ext = extension_for(format);
        self.finish(job, &resized, encoded, ext).await
    }
}

#[async_trait]
impl Transformer for ImageTransformer {
    async fn apply(&self, job: &Job) -> AppResult<JobOutput> {
        let JobPayload::Image(payload) = job.typed_payload()? else {
            return Err(AppError::internal(format!(
                "job {} routed to the image pool with family {}",
                job.id, job.family
            )));
        };

        match payload {
            ImagePayload::Convert { key, target_format } => {
                self.convert(job, &key, &target_format).await
            }
            ImagePayload::Compress { key, quality } => self.compress(job, &key, quality).await,
            ImagePayload::Resize { key, scale_percent } => {
                self.resize(job, &key, scale_percent).await
            }
        }
    }
}

/// New dimension after scaling by a percentage, rounded to nearest.
fn scaled(dimension: u32, scale_percent: u32) -> u32 {
    let scaled = (f64::from(dimension) * f64::from(scale_percent) / 100.0).round() as u32;
    scaled.max(1)
}

fn parse_target_format(target_format: &str) -> AppResult<(ImageFormat, &'static str)> {
    match target_format {
        "png" => Ok((ImageFormat::Png, "png")),
        "jpeg" | "jpg" => Ok((ImageFormat::Jpeg, "jpg")),
        "webp" => Ok((ImageFormat::WebP, "webp")),
        other => Err(AppError::validation(format!(
            "unsupported target format '{other}', expected png, jpeg, or webp"
        ))),
    }
}

fn extension_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "png",
        ImageFormat::Jpeg => "jpg",
        ImageFormat::WebP => "webp",
        _ => "bin",
    }
}

fn encode(img: &DynamicImage, format: ImageFormat) -> AppResult<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    // JPEG has no alpha channel; flatten before encoding.
    let result = match format {
        ImageFormat::Jpeg => img.to_rgb8().write_to(&mut buffer, format),
        _ => img.write_to(&mut buffer, format),
    };
    result.map_err(|e| {
        AppError::with_source(ErrorKind::Transformation, "failed to encode image", e)
    })?;
    Ok(buffer.into_inner())
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> AppResult<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    img.to_rgb8().write_with_encoder(encoder).map_err(|e| {
        AppError::with_source(ErrorKind::Transformation, "failed to encode JPEG", e)
    })?;
    Ok(buffer.into_inner())
}

fn encode_png(img: &DynamicImage, quality: u8) -> AppResult<Vec<u8>> {
    // PNG is lossless; quality maps to how hard the encoder works.
    let compression = if quality < 50 {
        CompressionType::Best
    } else {
        CompressionType::Default
    };
    let mut buffer = Cursor::new(Vec::new());
    let encoder = PngEncoder::new_with_quality(&mut buffer, compression, PngFilterType::Adaptive);
    img.write_with_encoder(encoder).map_err(|e| {
        AppError::with_source(ErrorKind::Transformation, "failed to encode PNG", e)
    })?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use convertly_storage::MemoryObjectStore;
    use image::RgbImage;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([120, 40, 200]),
        ));
        encode(&img, ImageFormat::Png).expect("encode png")
    }

    fn job_for(payload: JobPayload) -> Job {
        Job::from_payload(&payload).expect("build job")
    }

    #[tokio::test]
    async fn test_resize_half_of_1920x1080_is_960x540() {
        let store = Arc::new(MemoryObjectStore::new());
        store.insert("in.png", png_bytes(1920, 1080));

        let job = job_for(JobPayload::Image(ImagePayload::Resize {
            key: "in.png".into(),
            scale_percent: 50,
        }));
        let output = ImageTransformer::new(store.clone()).apply(&job).await.unwrap();

        assert_eq!(output.width, Some(960));
        assert_eq!(output.height, Some(540));
        assert_ne!(output.key, "in.png");

        let resized = store.download(&output.key).await.unwrap();
        let img = image::load_from_memory(&resized).unwrap();
        assert_eq!((img.width(), img.height()), (960, 540));
    }

    #[tokio::test]
    async fn test_resize_rounds_to_nearest_pixel() {
        assert_eq!(scaled(3, 50), 2); // 1.5 rounds up
        assert_eq!(scaled(1920, 50), 960);
        assert_eq!(scaled(100, 33), 33);
        assert_eq!(scaled(1, 25), 1); // never collapses to zero
    }

    #[tokio::test]
    async fn test_convert_png_to_jpeg() {
        let store = Arc::new(MemoryObjectStore::new());
        store.insert("in.png", png_bytes(32, 16));

        let job = job_for(JobPayload::Image(ImagePayload::Convert {
            key: "in.png".into(),
            target_format: "jpeg".into(),
        }));
        let output = ImageTransformer::new(store.clone()).apply(&job).await.unwrap();

        assert!(output.key.ends_with(".jpg"));
        let converted = store.download(&output.key).await.unwrap();
        assert_eq!(
            image::guess_format(&converted).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[tokio::test]
    async fn test_compress_preserves_dimensions() {
        let store = Arc::new(MemoryObjectStore::new());
        store.insert("in.png", png_bytes(64, 48));

        let job = job_for(JobPayload::Image(ImagePayload::Compress {
            key: "in.png".into(),
            quality: 30,
        }));
        let output = ImageTransformer::new(store.clone()).apply(&job).await.unwrap();

        assert_eq!(output.width, Some(64));
        assert_eq!(output.height, Some(48));
    }

    #[tokio::test]
    async fn test_corrupt_input_is_transformation_error() {
        let store = Arc::new(MemoryObjectStore::new());
        store.insert("in.png", b"definitely not an image".to_vec());

        let job = job_for(JobPayload::Image(ImagePayload::Convert {
            key: "in.png".into(),
            target_format: "png".into(),
        }));
        let err = ImageTransformer::new(store).apply(&job).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Transformation);
    }
}
