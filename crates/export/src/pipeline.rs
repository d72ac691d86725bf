//! The four-stage export pipeline and the delivered file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use creative_compliance::{ImageOptimizer, OptimizeOptions};
use creative_core::config::ExportConfig;
use creative_core::{CreativeResult, ImagePayload};
use creative_dco::PreviewCard;
use image::RgbaImage;
use serde::Serialize;
use tracing::{info, warn};

use crate::capture::PreviewCapture;
use crate::encode::{encode_jpeg, DEFAULT_JPEG_QUALITY};

/// Which stage produced the delivered bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadSource {
    Optimized,
    Encoded,
    RawCapture,
}

impl PayloadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Optimized => "optimized",
            Self::Encoded => "encoded",
            Self::RawCapture => "raw_capture",
        }
    }
}

/// A downloadable export.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub file_name: String,
    pub payload: ImagePayload,
    pub source: PayloadSource,
    pub width: u32,
    pub height: u32,
}

impl ExportedFile {
    /// `ad-preview-<epoch-millis>.jpg`
    pub fn file_name_at(epoch_millis: i64) -> String {
        format!("ad-preview-{epoch_millis}.jpg")
    }

    /// Write the file into `dir` (created if missing) and return its path.
    pub async fn write_to(&self, dir: impl AsRef<Path>) -> CreativeResult<PathBuf> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&self.file_name);
        tokio::fs::write(&path, &self.payload.bytes).await?;
        info!(path = %path.display(), bytes = self.payload.len(), "export written");
        Ok(path)
    }
}

/// Capture → encode → optimize (best-effort) → deliver.
pub struct ExportPipeline {
    capture: Arc<dyn PreviewCapture>,
    optimizer: Option<Arc<dyn ImageOptimizer>>,
    options: OptimizeOptions,
    jpeg_quality: u8,
}

impl ExportPipeline {
    pub fn new(
        config: &ExportConfig,
        capture: Arc<dyn PreviewCapture>,
        optimizer: Option<Arc<dyn ImageOptimizer>>,
    ) -> Self {
        Self {
            capture,
            optimizer,
            options: OptimizeOptions {
                output_format: config.output_format.clone(),
                max_kb: config.max_kb,
            },
            jpeg_quality: config.jpeg_quality,
        }
    }

    /// Run every stage for one card. Only a capture failure (or every
    /// encode attempt failing) aborts; optimization errors fall back to the
    /// locally encoded payload.
    pub async fn run(&self, card: &PreviewCard) -> CreativeResult<ExportedFile> {
        let raw = self.capture.capture(card).await?;

        let encoded = match encode_jpeg(&raw, self.jpeg_quality) {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!(error = %e, "preview encode failed, will re-encode raw capture");
                None
            }
        };

        let optimized = match &encoded {
            Some(payload) => self.optimize(payload).await,
            None => None,
        };

        let (payload, source) = deliver(optimized, encoded, &raw)?;
        metrics::counter!("export.files", "source" => source.as_str()).increment(1);

        let file = ExportedFile {
            file_name: ExportedFile::file_name_at(Utc::now().timestamp_millis()),
            payload,
            source,
            width: raw.width(),
            height: raw.height(),
        };
        info!(
            file = %file.file_name,
            source = source.as_str(),
            bytes = file.payload.len(),
            "preview exported"
        );
        Ok(file)
    }

    /// Stage 3. Every failure is logged and swallowed.
    async fn optimize(&self, payload: &ImagePayload) -> Option<ImagePayload> {
        let optimizer = self.optimizer.as_ref()?;
        match optimizer.optimize(payload, &self.options).await {
            Ok(optimized) => {
                if optimized.size_kb() > self.options.max_kb as u64 {
                    warn!(
                        size_kb = optimized.size_kb(),
                        max_kb = self.options.max_kb,
                        "optimized image still exceeds budget"
                    );
                }
                Some(optimized)
            }
            Err(e) => {
                metrics::counter!("export.optimize_fallbacks", "kind" => e.kind()).increment(1);
                warn!(error = %e, "image optimization failed, using original image");
                None
            }
        }
    }
}

/// Stage 4 payload choice: optimized (JPEG only), else encoded, else a
/// default-quality re-encode of the raw capture.
pub fn deliver(
    optimized: Option<ImagePayload>,
    encoded: Option<ImagePayload>,
    raw: &RgbaImage,
) -> CreativeResult<(ImagePayload, PayloadSource)> {
    match optimized.filter(|p| !p.is_empty()) {
        Some(payload) if payload.mime == ImagePayload::JPEG => {
            return Ok((payload, PayloadSource::Optimized));
        }
        Some(payload) => {
            warn!(mime = %payload.mime, "optimized image is not JPEG, using original image");
        }
        None => {}
    }
    if let Some(payload) = encoded.filter(|p| !p.is_empty()) {
        return Ok((payload, PayloadSource::Encoded));
    }
    let payload = encode_jpeg(raw, DEFAULT_JPEG_QUALITY)?;
    Ok((payload, PayloadSource::RawCapture))
}
