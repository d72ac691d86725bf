use creative_core::{CreativeError, CreativeResult, ImagePayload};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};

/// Quality the JPEG encoder uses when none is requested.
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Encode a capture as JPEG at its natural size. Alpha is flattened since
/// JPEG has no transparency.
pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> CreativeResult<ImagePayload> {
    if image.width() == 0 || image.height() == 0 {
        return Err(CreativeError::Encode("cannot encode an empty image".into()));
    }

    let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100))
        .encode_image(&rgb)
        .map_err(|e| CreativeError::Encode(e.to_string()))?;

    Ok(ImagePayload::jpeg(bytes))
}
