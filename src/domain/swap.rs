use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::{Error, Result};

/// Processing mode requested by the client. `merge` delegates the full
/// face-swap to the external service, `align` composites the two half faces
/// locally.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SwapMode {
    #[default]
    Merge,
    Align,
}

impl SwapMode {
    pub fn parse(value: Option<&str>) -> Result<Self> {
        match value {
            Some(raw) => SwapMode::from_str(raw).map_err(|_| Error::InvalidMode(raw.to_string())),
            None => Ok(SwapMode::default()),
        }
    }
}

/// One input image slot: either uploaded bytes (with the original filename
/// when the client sent one) or a remote URL. Consumed once during
/// resolution, never persisted.
#[derive(Debug, Clone, Default)]
pub struct ImageReference {
    pub bytes: Option<Bytes>,
    pub filename: Option<String>,
    pub url: Option<String>,
}

impl ImageReference {
    pub fn from_url(url: String) -> Self {
        Self { url: Some(url), ..Default::default() }
    }

    pub fn from_bytes(bytes: Bytes, filename: Option<String>) -> Self {
        Self { bytes: Some(bytes), filename, ..Default::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_none() && self.url.is_none()
    }
}

/// Parsed `/api/face-swap` request, same shape whether it arrived as
/// multipart or JSON.
#[derive(Debug, Clone, Default)]
pub struct SwapRequest {
    pub target: ImageReference,
    pub swap: ImageReference,
    pub mode: SwapMode,
}

/// JSON body variant of the face-swap request.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SwapPayload {
    pub target_url: Option<String>,
    pub swap_url: Option<String>,
    pub mode: Option<String>,
}

impl TryFrom<SwapPayload> for SwapRequest {
    type Error = Error;

    fn try_from(payload: SwapPayload) -> Result<Self> {
        let mode = SwapMode::parse(payload.mode.as_deref())?;
        Ok(SwapRequest {
            target: ImageReference { url: payload.target_url, ..Default::default() },
            swap: ImageReference { url: payload.swap_url, ..Default::default() },
            mode,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parsing() {
        assert_eq!(SwapMode::parse(None).unwrap(), SwapMode::Merge);
        assert_eq!(SwapMode::parse(Some("merge")).unwrap(), SwapMode::Merge);
        assert_eq!(SwapMode::parse(Some("align")).unwrap(), SwapMode::Align);
        assert!(matches!(SwapMode::parse(Some("blend")), Err(Error::InvalidMode(_))));
    }

    #[test]
    fn reference_emptyness() {
        assert!(ImageReference::default().is_empty());
        assert!(!ImageReference::from_url("https://example.com/a.jpg".to_string()).is_empty());
        assert!(!ImageReference::from_bytes(Bytes::from_static(b"xx"), None).is_empty());
    }

    #[test]
    fn payload_conversion() {
        let payload = SwapPayload {
            target_url: Some("https://example.com/t.jpg".to_string()),
            swap_url: Some("https://example.com/s.jpg".to_string()),
            mode: Some("align".to_string()),
        };
        let request = SwapRequest::try_from(payload).unwrap();
        assert_eq!(request.mode, SwapMode::Align);
        assert_eq!(request.target.url.as_deref(), Some("https://example.com/t.jpg"));
        assert!(request.swap.bytes.is_none());
    }
}
