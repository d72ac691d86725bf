//! Dynamic creative derivation: retailer variant fan-out, preview cards and
//! the placeholder performance projection.

pub mod estimator;
pub mod preview;
pub mod retailer;

pub use estimator::PerformanceEstimator;
pub use preview::PreviewCard;
pub use retailer::{generate_variants, RetailerPalette};
