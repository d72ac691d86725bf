//! Client adapter for the compliance analysis, remediation and image
//! optimization services.

pub mod client;
pub mod service;
pub mod wire;

pub use client::HttpComplianceClient;
pub use service::{ComplianceService, ImageOptimizer};
pub use wire::{AnalysisUpdate, FixedCreative, OptimizeOptions, Remediation};
