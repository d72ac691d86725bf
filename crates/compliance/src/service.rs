//! Service seams the workflow talks to. The HTTP client implements both;
//! tests substitute in-memory fakes.

use async_trait::async_trait;
use creative_core::{AnalysisResult, Creative, CreativeResult, ImagePayload};

use crate::wire::{OptimizeOptions, Remediation};

/// Compliance analysis and remediation.
#[async_trait]
pub trait ComplianceService: Send + Sync {
    /// Analyze the full creative and return a fresh verdict.
    async fn analyze(&self, creative: &Creative) -> CreativeResult<AnalysisResult>;

    /// Ask the service to correct the creative. The caller merges the
    /// response; nothing is applied here.
    async fn remediate(&self, creative: &Creative) -> CreativeResult<Remediation>;
}

/// Re-encodes an image under a size budget.
#[async_trait]
pub trait ImageOptimizer: Send + Sync {
    async fn optimize(
        &self,
        image: &ImagePayload,
        options: &OptimizeOptions,
    ) -> CreativeResult<ImagePayload>;
}
