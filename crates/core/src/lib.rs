pub mod config;
pub mod error;
pub mod payload;
pub mod types;

pub use config::AppConfig;
pub use error::{CreativeError, CreativeResult};
pub use payload::ImagePayload;
pub use types::{
    AnalysisResult, AnalysisStatus, Category, ColorTheme, Creative, Issue, Layout,
    PerformancePrediction, PerformanceZone, RetailerVariant, VariantSet,
};
