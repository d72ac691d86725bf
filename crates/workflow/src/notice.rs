//! User-visible notices raised by workflow operations.

use chrono::{DateTime, Utc};
use creative_core::CreativeError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
            raised_at: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            raised_at: Utc::now(),
        }
    }
}

pub(crate) const ANALYZE_FIRST: &str = "Please analyze an ad first!";

/// The operations that can raise a failure notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    Analyze,
    Remediate,
    GenerateVariants,
    SwitchView,
    Export,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Analyze => "analyze",
            Self::Remediate => "remediate",
            Self::GenerateVariants => "generate_variants",
            Self::SwitchView => "switch_view",
            Self::Export => "export",
        }
    }

    /// Message shown to the user when this operation fails with `err`.
    pub fn failure_message(&self, err: &CreativeError) -> String {
        if let CreativeError::Precondition(reason) = err {
            return if reason.contains("in progress") {
                format!("Please wait: {reason}.")
            } else {
                ANALYZE_FIRST.to_string()
            };
        }

        match self {
            Self::Analyze => match err {
                CreativeError::Service { status_code, .. } => {
                    format!("Analyze failed: {status_code}")
                }
                CreativeError::Decode(_) => {
                    "Analyze returned invalid response from server.".to_string()
                }
                CreativeError::Shape(_) => "Analyze returned unexpected data".to_string(),
                _ => "Failed to analyze creative. Is the backend running? Check console for details."
                    .to_string(),
            },
            Self::Remediate => "Failed to apply fixes. See console for details.".to_string(),
            Self::GenerateVariants | Self::SwitchView => ANALYZE_FIRST.to_string(),
            Self::Export => "Failed to download image. Please try again.".to_string(),
        }
    }
}
