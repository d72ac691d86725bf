use thiserror::Error;

pub type CreativeResult<T> = Result<T, CreativeError>;

#[derive(Error, Debug)]
pub enum CreativeError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Service error: status {status_code}")]
    Service { status_code: u16, body: String },

    #[error("Response decode error: {0}")]
    Decode(String),

    #[error("Unexpected response shape: {0}")]
    Shape(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Image encode error: {0}")]
    Encode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl CreativeError {
    /// Short machine-readable label, used as a metrics/log dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Service { .. } => "service",
            Self::Decode(_) => "decode",
            Self::Shape(_) => "shape",
            Self::Capture(_) => "capture",
            Self::Precondition(_) => "precondition",
            Self::Encode(_) => "encode",
            Self::Config(_) => "config",
            Self::Serialization(_) => "serialization",
            Self::Io(_) => "io",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<config::ConfigError> for CreativeError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
