//! The workflow orchestrator.
//!
//! One `Workflow` drives a single creative through analysis, remediation,
//! variant fan-out and export. State lives behind one lock and is only
//! ever replaced between awaits, so readers never see a half-applied
//! response.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use creative_compliance::ComplianceService;
use creative_core::config::WorkflowConfig;
use creative_core::{
    AnalysisResult, Category, Creative, CreativeError, CreativeResult, Layout,
    PerformancePrediction, VariantSet,
};
use creative_dco::{generate_variants, PerformanceEstimator, PreviewCard, RetailerPalette};
use creative_export::{ExportPipeline, ExportedFile};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info};

use crate::notice::{Notice, Operation};
use crate::state::{Phase, ResultView, WorkflowSnapshot};

/// What a successful `remediate` call changed.
#[derive(Debug, Clone, PartialEq)]
pub struct RemediationOutcome {
    /// Creative fields the server actually rewrote.
    pub changed_fields: Vec<&'static str>,
    /// The acknowledgement shown to the user.
    pub summary: String,
    /// False when the server returned no fixed creative.
    pub applied: bool,
}

/// Releases an in-flight flag when dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool, what: &str) -> CreativeResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| CreativeError::Precondition(format!("{what} already in progress")))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Workflow {
    state: RwLock<WorkflowSnapshot>,
    notices: Mutex<Vec<Notice>>,
    compliance: Arc<dyn ComplianceService>,
    export: ExportPipeline,
    estimator: Mutex<PerformanceEstimator>,
    retailers: Vec<String>,
    config: WorkflowConfig,
    analyzing: AtomicBool,
    remediating: AtomicBool,
    exporting: AtomicBool,
}

impl Workflow {
    pub fn new(
        config: WorkflowConfig,
        compliance: Arc<dyn ComplianceService>,
        export: ExportPipeline,
    ) -> Self {
        Self {
            state: RwLock::new(WorkflowSnapshot::default()),
            notices: Mutex::new(Vec::new()),
            compliance,
            export,
            estimator: Mutex::new(PerformanceEstimator::new()),
            retailers: RetailerPalette::retailers()
                .into_iter()
                .map(str::to_string)
                .collect(),
            config,
            analyzing: AtomicBool::new(false),
            remediating: AtomicBool::new(false),
            exporting: AtomicBool::new(false),
        }
    }

    pub fn with_estimator(mut self, estimator: PerformanceEstimator) -> Self {
        self.estimator = Mutex::new(estimator);
        self
    }

    /// Retailers `generate_variants` fans out to, in order.
    pub fn with_retailers<I, S>(mut self, retailers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.retailers = retailers.into_iter().map(Into::into).collect();
        self
    }

    /// Start from an existing creative instead of an empty one.
    pub fn with_creative(self, creative: Creative) -> Self {
        *self.state.write() = WorkflowSnapshot::new(creative);
        self
    }

    // ── Reads ──────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> WorkflowSnapshot {
        self.state.read().clone()
    }

    pub fn creative(&self) -> Creative {
        self.state.read().creative.clone()
    }

    pub fn phase(&self) -> Phase {
        self.state.read().phase()
    }

    pub fn analysis(&self) -> Option<AnalysisResult> {
        self.state.read().analysis.clone()
    }

    pub fn prediction(&self) -> Option<PerformancePrediction> {
        self.state.read().prediction
    }

    pub fn variants(&self) -> Option<VariantSet> {
        self.state.read().variants.clone()
    }

    pub fn view(&self) -> ResultView {
        self.state.read().view
    }

    pub fn preview(&self) -> Option<PreviewCard> {
        self.state.read().preview()
    }

    pub fn retailer_style_preview(&self) -> Option<PreviewCard> {
        self.state.read().retailer_style_preview()
    }

    /// Drain the notices raised since the last call.
    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock())
    }

    // ── Editing ────────────────────────────────────────────────────────

    pub fn set_headline(&self, headline: impl Into<String>) {
        self.edit(|c| c.set_headline(headline));
    }

    pub fn set_subhead(&self, subhead: impl Into<String>) {
        self.edit(|c| c.set_subhead(subhead));
    }

    pub fn set_cta(&self, cta: impl Into<String>) {
        self.edit(|c| c.set_cta(cta));
    }

    pub fn set_image_url(&self, image_url: impl Into<String>) {
        self.edit(|c| c.set_image_url(image_url));
    }

    pub fn set_category(&self, category: Category) {
        self.edit(|c| c.set_category(category));
    }

    pub fn set_layout(&self, layout: Layout) {
        self.edit(|c| c.set_layout(layout));
    }

    fn edit(&self, apply: impl FnOnce(&mut Creative)) {
        let mut state = self.state.write();
        apply(&mut state.creative);
        state.revision += 1;
        state.prediction = None;
    }

    // ── Operations ─────────────────────────────────────────────────────

    /// Submit the current creative for compliance analysis. The result
    /// replaces any previous one; the prediction is refreshed only if the
    /// creative was not edited while the request was in flight.
    pub async fn analyze(&self) -> CreativeResult<AnalysisResult> {
        let _guard = match InFlight::acquire(&self.analyzing, "analysis") {
            Ok(guard) => guard,
            Err(e) => return self.fail(Operation::Analyze, e),
        };

        let (creative, revision) = {
            let state = self.state.read();
            (state.creative.clone(), state.revision)
        };
        debug!(revision, headline = %creative.headline, "analyzing creative");

        let result = match self.compliance.analyze(&creative).await {
            Ok(result) => result,
            Err(e) => return self.fail(Operation::Analyze, e),
        };
        let prediction = self.estimator.lock().estimate(result.score);

        let current = {
            let mut state = self.state.write();
            state.analysis = Some(result.clone());
            state.analyzed_revision = Some(revision);
            let current = state.revision == revision;
            state.prediction = current.then_some(prediction);
            current
        };

        info!(
            status = result.status.as_str(),
            score = ?result.score,
            issues = result.issues.len(),
            current,
            "creative analyzed"
        );
        Ok(result)
    }

    /// Ask the service to fix the creative and merge its answer.
    pub async fn remediate(&self) -> CreativeResult<RemediationOutcome> {
        if self.phase() == Phase::Empty {
            return self.fail(
                Operation::Remediate,
                CreativeError::Precondition("analyze the creative first".to_string()),
            );
        }
        let _guard = match InFlight::acquire(&self.remediating, "remediation") {
            Ok(guard) => guard,
            Err(e) => return self.fail(Operation::Remediate, e),
        };

        let (creative, revision) = {
            let state = self.state.read();
            (state.creative.clone(), state.revision)
        };

        let remediation = match self.compliance.remediate(&creative).await {
            Ok(remediation) => remediation,
            Err(e) => return self.fail(Operation::Remediate, e),
        };

        let Some(fixed) = remediation.fixed_creative.as_ref() else {
            self.notify(Notice::info("No fixes returned from server."));
            info!("remediation returned no fixed creative");
            return Ok(RemediationOutcome {
                changed_fields: Vec::new(),
                summary: String::new(),
                applied: false,
            });
        };

        let summary = remediation.summary();
        let recompute = self.config.recompute_prediction_on_remediation;

        let changed_fields = {
            let mut guard = self.state.write();
            let state = &mut *guard;
            let in_sync = state.revision == revision;
            let changed = fixed.apply_to(&mut state.creative);
            if !changed.is_empty() {
                state.revision += 1;
            }

            match (&remediation.analysis_after, state.analysis.as_mut()) {
                (Some(update), Some(analysis)) => {
                    update.apply_to(analysis);
                    if in_sync {
                        state.analyzed_revision = Some(state.revision);
                        if recompute {
                            let score = analysis.score;
                            state.prediction = Some(self.estimator.lock().estimate(score));
                        }
                    } else {
                        // Edited while the fix was pending; the new score
                        // describes a creative that no longer exists.
                        state.prediction = None;
                    }
                }
                _ => {
                    if !changed.is_empty() {
                        state.prediction = None;
                    }
                }
            }
            changed
        };

        self.notify(Notice::info(format!("Fixes applied: {summary}")));
        info!(
            changed = ?changed_fields,
            fixes = remediation.applied_fixes.len(),
            "remediation applied"
        );
        Ok(RemediationOutcome {
            changed_fields,
            summary,
            applied: true,
        })
    }

    /// Fan the current creative out to every configured retailer.
    pub fn generate_variants(&self) -> CreativeResult<VariantSet> {
        let retailers: Vec<&str> = self.retailers.iter().map(String::as_str).collect();
        let outcome = {
            let mut state = self.state.write();
            generate_variants(&state.creative, &retailers, state.analysis.as_ref()).map(|set| {
                state.variants = Some(set.clone());
                set
            })
        };
        outcome.or_else(|e| self.fail(Operation::GenerateVariants, e))
    }

    pub fn set_view(&self, view: ResultView) -> CreativeResult<()> {
        {
            let mut state = self.state.write();
            if state.phase() == Phase::Analyzed {
                state.view = view;
                return Ok(());
            }
        }
        self.fail(
            Operation::SwitchView,
            CreativeError::Precondition("analyze the creative first".to_string()),
        )
    }

    /// Choose the retailer the Retailer Style preview is themed for.
    pub fn select_retailer(&self, retailer: impl Into<String>) {
        let retailer = retailer.into();
        if RetailerPalette::lookup(&retailer).is_none() {
            debug!(%retailer, "unknown retailer, house theme will be used");
        }
        self.state.write().selected_retailer = retailer;
    }

    /// Render the compliance preview and run it through the export
    /// pipeline.
    pub async fn export_preview(&self) -> CreativeResult<ExportedFile> {
        let card = match self.preview() {
            Some(card) => card,
            None => {
                return self.fail(
                    Operation::Export,
                    CreativeError::Precondition("analyze the creative first".to_string()),
                )
            }
        };
        let _guard = match InFlight::acquire(&self.exporting, "export") {
            Ok(guard) => guard,
            Err(e) => return self.fail(Operation::Export, e),
        };

        match self.export.run(&card).await {
            Ok(file) => Ok(file),
            Err(e) => self.fail(Operation::Export, e),
        }
    }

    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }

    /// Failure path shared by every operation: nothing in the state is
    /// touched, one notice is raised and the raw error is logged.
    fn fail<T>(&self, op: Operation, err: CreativeError) -> CreativeResult<T> {
        error!(operation = op.name(), kind = err.kind(), error = %err, "workflow operation failed");
        self.notify(Notice::error(op.failure_message(&err)));
        Err(err)
    }
}
