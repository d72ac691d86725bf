use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `CREATIVE_STUDIO__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

// ─── Analysis Service ───────────────────────────────────────────────────
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}
fn default_timeout_ms() -> u64 {
    15_000
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

// ─── Image Export ───────────────────────────────────────────────────────
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_max_kb")]
    pub max_kb: u32,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    #[serde(default = "default_output_format")]
    pub output_format: String,
    /// Width in pixels of the rasterized preview card.
    #[serde(default = "default_preview_width")]
    pub preview_width: u32,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_max_kb() -> u32 { 500 }
fn default_jpeg_quality() -> u8 { 95 }
fn default_output_format() -> String { "jpeg".to_string() }
fn default_preview_width() -> u32 { 540 }
fn default_output_dir() -> String { ".".to_string() }

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            max_kb: default_max_kb(),
            jpeg_quality: default_jpeg_quality(),
            output_format: default_output_format(),
            preview_width: default_preview_width(),
            output_dir: default_output_dir(),
        }
    }
}

// ─── Workflow ───────────────────────────────────────────────────────────
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    /// When false, remediation leaves the prediction from the last analyze
    /// call in place even though the score changed.
    #[serde(default = "default_recompute_on_remediation")]
    pub recompute_prediction_on_remediation: bool,
}

fn default_recompute_on_remediation() -> bool { true }

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            recompute_prediction_on_remediation: default_recompute_on_remediation(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            export: ExportConfig::default(),
            workflow: WorkflowConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("CREATIVE_STUDIO")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
