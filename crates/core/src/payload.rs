use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{CreativeError, CreativeResult};

/// An encoded image ready for transport or delivery.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    pub const JPEG: &'static str = "image/jpeg";

    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self {
            mime: Self::JPEG.to_string(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Size rounded up to whole kilobytes (1 KB = 1024 bytes).
    pub fn size_kb(&self) -> u64 {
        (self.bytes.len() as u64).div_ceil(1024)
    }

    /// `data:<mime>;base64,<payload>`
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }

    /// Parse a base64 data URI. A bare base64 string without the `data:`
    /// prefix is accepted and assumed to be JPEG.
    pub fn from_data_url(data_url: &str) -> CreativeResult<Self> {
        let data_url = data_url.trim();
        let (mime, encoded) = match data_url.strip_prefix("data:") {
            Some(rest) => {
                let (header, encoded) = rest
                    .split_once(',')
                    .ok_or_else(|| CreativeError::Decode("data URI has no payload".into()))?;
                let mime = header
                    .strip_suffix(";base64")
                    .ok_or_else(|| CreativeError::Decode("data URI is not base64".into()))?;
                let mime = if mime.is_empty() { Self::JPEG } else { mime };
                (mime.to_string(), encoded)
            }
            None => (Self::JPEG.to_string(), data_url),
        };

        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| CreativeError::Decode(format!("invalid base64 image data: {e}")))?;
        if bytes.is_empty() {
            return Err(CreativeError::Decode("empty image payload".into()));
        }
        Ok(Self { mime, bytes })
    }
}

impl std::fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePayload")
            .field("mime", &self.mime)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}
