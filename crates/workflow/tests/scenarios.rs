//! End-to-end workflow behaviour against an in-memory compliance service.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use creative_compliance::{ComplianceService, Remediation};
use creative_core::config::{ExportConfig, WorkflowConfig};
use creative_core::{
    AnalysisResult, AnalysisStatus, Category, Creative, CreativeError, CreativeResult, Layout,
    PerformanceZone,
};
use creative_dco::PerformanceEstimator;
use creative_export::{CardRasterizer, ExportPipeline, PayloadSource};
use creative_workflow::{NoticeLevel, Phase, ResultView, Workflow};
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::Notify;

#[derive(Default)]
struct ScriptedService {
    analyses: Mutex<VecDeque<CreativeResult<AnalysisResult>>>,
    remediations: Mutex<VecDeque<CreativeResult<Remediation>>>,
    seen: Mutex<Vec<Creative>>,
    analyze_calls: AtomicUsize,
    remediate_calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
    fix_gate: Option<Arc<Notify>>,
}

impl ScriptedService {
    fn new() -> Self {
        Self::default()
    }

    fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    fn fix_gated(gate: Arc<Notify>) -> Self {
        Self {
            fix_gate: Some(gate),
            ..Self::default()
        }
    }

    fn analysis(self, body: serde_json::Value) -> Self {
        let result = serde_json::from_value(body).map_err(CreativeError::from);
        self.analyses.lock().push_back(result);
        self
    }

    fn analysis_error(self, err: CreativeError) -> Self {
        self.analyses.lock().push_back(Err(err));
        self
    }

    fn remediation(self, body: serde_json::Value) -> Self {
        let result = serde_json::from_value(body).map_err(CreativeError::from);
        self.remediations.lock().push_back(result);
        self
    }
}

#[async_trait]
impl ComplianceService for ScriptedService {
    async fn analyze(&self, creative: &Creative) -> CreativeResult<AnalysisResult> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(creative.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.analyses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(CreativeError::Transport("no scripted analysis".into())))
    }

    async fn remediate(&self, creative: &Creative) -> CreativeResult<Remediation> {
        self.remediate_calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(creative.clone());
        if let Some(gate) = &self.fix_gate {
            gate.notified().await;
        }
        self.remediations
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(CreativeError::Transport("no scripted remediation".into())))
    }
}

fn alcohol_creative() -> Creative {
    Creative {
        headline: "50% Off".to_string(),
        subhead: "Premium lager".to_string(),
        cta: "Shop Now".to_string(),
        image_url: "https://cdn.example.com/lager.jpg".to_string(),
        category: Category::Alcohol,
        layout: Layout::InstagramSquare,
    }
}

fn rejected() -> serde_json::Value {
    json!({
        "status": "Rejected",
        "score": 40,
        "issues": [{"message": "Missing responsible-drinking disclaimer"}]
    })
}

fn workflow(service: Arc<ScriptedService>, config: WorkflowConfig) -> Workflow {
    let export = ExportPipeline::new(
        &ExportConfig::default(),
        Arc::new(CardRasterizer::new(540)),
        None,
    );
    Workflow::new(config, service, export)
        .with_estimator(PerformanceEstimator::seeded(7))
        .with_creative(alcohol_creative())
}

#[tokio::test]
async fn test_rejected_alcohol_creative_shows_disclaimer() {
    let service = Arc::new(ScriptedService::new().analysis(rejected()));
    let wf = workflow(service.clone(), WorkflowConfig::default());
    assert_eq!(wf.phase(), Phase::Empty);

    let result = wf.analyze().await.unwrap();
    assert_eq!(result.status, AnalysisStatus::Rejected);

    let snapshot = wf.snapshot();
    assert_eq!(snapshot.phase(), Phase::Analyzed);
    let analysis = snapshot.analysis.as_ref().unwrap();
    assert_eq!(analysis.score_label(), "40/100");
    assert_eq!(analysis.issues.len(), 1);
    assert_eq!(
        analysis.issues[0].message,
        "Missing responsible-drinking disclaimer"
    );
    assert!(snapshot.prediction.is_some());
    assert!(snapshot.is_analysis_current());

    let preview = snapshot.preview().unwrap();
    assert_eq!(
        preview.disclaimer.as_deref(),
        Some("Please drink responsibly. Visit drinkaware.co.uk")
    );
    assert_eq!(service.seen.lock()[0], alcohol_creative());
    assert!(wf.take_notices().is_empty());
}

#[tokio::test]
async fn test_remediation_merges_fixed_fields_and_analysis() {
    let service = Arc::new(
        ScriptedService::new().analysis(rejected()).remediation(json!({
            "fixed_creative": {"headline": "50% Off Today"},
            "applied_fixes": ["Shortened headline"],
            "analysis_after": {"status": "Approved", "score": 95, "issues": []}
        })),
    );
    let wf = workflow(service, WorkflowConfig::default());
    wf.analyze().await.unwrap();

    let outcome = wf.remediate().await.unwrap();
    assert!(outcome.applied);
    assert_eq!(outcome.changed_fields, vec!["headline"]);

    let snapshot = wf.snapshot();
    assert_eq!(
        snapshot.creative,
        Creative {
            headline: "50% Off Today".to_string(),
            ..alcohol_creative()
        }
    );
    let analysis = snapshot.analysis.as_ref().unwrap();
    assert_eq!(analysis.status, AnalysisStatus::Approved);
    assert_eq!(analysis.score, Some(95));
    assert!(analysis.issues.is_empty());
    assert_eq!(snapshot.phase(), Phase::Analyzed);
    assert!(snapshot.is_analysis_current());

    let prediction = snapshot.prediction.unwrap();
    assert!(prediction.quality >= 85.0);
    assert_eq!(prediction.zone, PerformanceZone::Green);

    let notices = wf.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Info);
    assert_eq!(notices[0].message, "Fixes applied: Shortened headline");
}

#[tokio::test]
async fn test_variants_for_two_retailers() {
    let service = Arc::new(ScriptedService::new().analysis(rejected()));
    let wf = workflow(service, WorkflowConfig::default()).with_retailers(["Tesco", "Walmart"]);
    wf.set_headline("Buy Now");
    wf.analyze().await.unwrap();

    let set = wf.generate_variants().unwrap();
    assert_eq!(set.retailers().collect::<Vec<_>>(), vec!["Tesco", "Walmart"]);

    let tesco = set.get("Tesco").unwrap();
    assert_eq!(tesco.styled_headline, "Buy Now - Tesco");
    assert_eq!(tesco.color_theme.primary, "#0071CE");
    let walmart = set.get("Walmart").unwrap();
    assert_eq!(walmart.styled_headline, "Buy Now - Walmart");
    assert_eq!(walmart.color_theme.primary, "#FFC220");

    // Variants are snapshots; later edits do not touch them.
    wf.set_headline("Buy Later");
    assert_eq!(
        wf.variants().unwrap().get("Tesco").unwrap().styled_headline,
        "Buy Now - Tesco"
    );
}

#[tokio::test]
async fn test_operations_before_analysis_are_rejected() {
    let service = Arc::new(ScriptedService::new());
    let wf = workflow(service.clone(), WorkflowConfig::default());

    let err = wf.remediate().await.unwrap_err();
    assert!(matches!(err, CreativeError::Precondition(_)));
    assert_eq!(service.remediate_calls.load(Ordering::SeqCst), 0);

    assert!(wf.generate_variants().is_err());
    assert!(wf.set_view(ResultView::Performance).is_err());
    assert!(wf.export_preview().await.is_err());
    assert_eq!(wf.view(), ResultView::Compliance);

    let notices = wf.take_notices();
    assert_eq!(notices.len(), 4);
    assert!(notices
        .iter()
        .all(|n| n.level == NoticeLevel::Error && n.message == "Please analyze an ad first!"));
    assert_eq!(wf.phase(), Phase::Empty);
}

#[tokio::test]
async fn test_failed_analysis_leaves_state_untouched() {
    let service = Arc::new(
        ScriptedService::new()
            .analysis(rejected())
            .analysis_error(CreativeError::Service {
                status_code: 500,
                body: "boom".into(),
            }),
    );
    let wf = workflow(service, WorkflowConfig::default());
    wf.analyze().await.unwrap();
    wf.set_view(ResultView::MultiRetailer).unwrap();
    let before = wf.snapshot();
    wf.take_notices();

    let err = wf.analyze().await.unwrap_err();
    assert!(matches!(err, CreativeError::Service { status_code: 500, .. }));

    let after = wf.snapshot();
    assert_eq!(after.analysis, before.analysis);
    assert_eq!(after.prediction, before.prediction);
    assert_eq!(after.view, ResultView::MultiRetailer);

    let notices = wf.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, "Analyze failed: 500");
}

#[tokio::test]
async fn test_edits_clear_prediction() {
    let service = Arc::new(ScriptedService::new().analysis(rejected()));
    let wf = workflow(service, WorkflowConfig::default());
    wf.analyze().await.unwrap();
    assert!(wf.prediction().is_some());

    wf.set_category(Category::Default);
    let snapshot = wf.snapshot();
    assert!(snapshot.prediction.is_none());
    assert!(snapshot.analysis.is_some());
    assert!(!snapshot.is_analysis_current());
    assert_eq!(snapshot.preview().unwrap().disclaimer, None);
}

#[tokio::test]
async fn test_edit_during_analysis_suppresses_prediction() {
    let gate = Arc::new(Notify::new());
    let service = Arc::new(ScriptedService::gated(gate.clone()).analysis(rejected()));
    let wf = Arc::new(workflow(service.clone(), WorkflowConfig::default()));

    let pending = tokio::spawn({
        let wf = wf.clone();
        async move { wf.analyze().await }
    });
    while service.analyze_calls.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    wf.set_headline("Edited mid-flight");
    gate.notify_one();
    pending.await.unwrap().unwrap();

    let snapshot = wf.snapshot();
    assert!(snapshot.analysis.is_some());
    assert!(snapshot.prediction.is_none());
    assert!(!snapshot.is_analysis_current());
    assert_eq!(snapshot.creative.headline, "Edited mid-flight");
}

#[tokio::test]
async fn test_edit_during_remediation_suppresses_prediction() {
    let gate = Arc::new(Notify::new());
    let service = Arc::new(
        ScriptedService::fix_gated(gate.clone())
            .analysis(rejected())
            .remediation(json!({
                "fixed_creative": {"headline": "50% Off Today"},
                "applied_fixes": ["Shortened headline"],
                "analysis_after": {"status": "Approved", "score": 95, "issues": []}
            })),
    );
    let wf = Arc::new(workflow(service.clone(), WorkflowConfig::default()));
    wf.analyze().await.unwrap();
    assert!(wf.prediction().is_some());

    let pending = tokio::spawn({
        let wf = wf.clone();
        async move { wf.remediate().await }
    });
    while service.remediate_calls.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    wf.set_subhead("Edited mid-flight");
    gate.notify_one();
    pending.await.unwrap().unwrap();

    let snapshot = wf.snapshot();
    assert_eq!(snapshot.creative.headline, "50% Off Today");
    assert_eq!(snapshot.creative.subhead, "Edited mid-flight");
    assert_eq!(snapshot.analysis.as_ref().unwrap().score, Some(95));
    assert!(!snapshot.is_analysis_current());
    assert!(snapshot.prediction.is_none());
}

#[tokio::test]
async fn test_duplicate_analysis_is_rejected_while_pending() {
    let gate = Arc::new(Notify::new());
    let service = Arc::new(ScriptedService::gated(gate.clone()).analysis(rejected()));
    let wf = Arc::new(workflow(service.clone(), WorkflowConfig::default()));

    let pending = tokio::spawn({
        let wf = wf.clone();
        async move { wf.analyze().await }
    });
    while service.analyze_calls.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    let err = wf.analyze().await.unwrap_err();
    match err {
        CreativeError::Precondition(reason) => assert!(reason.contains("already in progress")),
        other => panic!("expected precondition, got {other:?}"),
    }
    assert_eq!(service.analyze_calls.load(Ordering::SeqCst), 1);

    gate.notify_one();
    pending.await.unwrap().unwrap();
    assert_eq!(wf.phase(), Phase::Analyzed);
    assert_eq!(
        wf.take_notices()[0].message,
        "Please wait: analysis already in progress."
    );
}

#[tokio::test]
async fn test_remediation_without_fixed_creative_changes_nothing() {
    let service = Arc::new(
        ScriptedService::new()
            .analysis(rejected())
            .remediation(json!({"applied_fixes": [], "analysis_after": {"score": 99}})),
    );
    let wf = workflow(service, WorkflowConfig::default());
    wf.analyze().await.unwrap();
    let before = wf.snapshot();

    let outcome = wf.remediate().await.unwrap();
    assert!(!outcome.applied);

    let after = wf.snapshot();
    assert_eq!(after.creative, before.creative);
    assert_eq!(after.analysis, before.analysis);
    assert_eq!(after.revision, before.revision);
    assert_eq!(wf.take_notices()[0].message, "No fixes returned from server.");
}

#[tokio::test]
async fn test_prediction_can_be_kept_across_remediation() {
    let service = Arc::new(
        ScriptedService::new().analysis(rejected()).remediation(json!({
            "fixed_creative": {"subhead": "Premium lager, drink responsibly"},
            "applied_fixes": [],
            "analysis_after": {"status": "Approved", "score": 95, "issues": []}
        })),
    );
    let config = WorkflowConfig {
        recompute_prediction_on_remediation: false,
    };
    let wf = workflow(service, config);
    wf.analyze().await.unwrap();
    let before = wf.prediction().unwrap();

    wf.remediate().await.unwrap();
    assert_eq!(wf.prediction(), Some(before));
    assert_eq!(wf.analysis().unwrap().score, Some(95));
    assert_eq!(wf.take_notices()[0].message, "Fixes applied: Applied fixes");
}

#[tokio::test]
async fn test_failed_remediation_keeps_creative() {
    let service = Arc::new(ScriptedService::new().analysis(rejected()));
    let wf = workflow(service, WorkflowConfig::default());
    wf.analyze().await.unwrap();
    let before = wf.snapshot();

    assert!(wf.remediate().await.is_err());
    assert_eq!(wf.snapshot().creative, before.creative);
    assert_eq!(
        wf.take_notices()[0].message,
        "Failed to apply fixes. See console for details."
    );
}

#[tokio::test]
async fn test_views_and_retailer_style_preview() {
    let service = Arc::new(ScriptedService::new().analysis(rejected()));
    let wf = workflow(service, WorkflowConfig::default());
    assert!(wf.retailer_style_preview().is_none());
    wf.analyze().await.unwrap();

    for view in ResultView::ALL {
        wf.set_view(view).unwrap();
        assert_eq!(wf.view(), view);
    }

    let house = wf.retailer_style_preview().unwrap();
    assert_eq!(house.theme.unwrap().primary, "#667eea");

    wf.select_retailer("Amazon Fresh");
    let card = wf.retailer_style_preview().unwrap();
    assert_eq!(card.theme.as_ref().unwrap().primary, "#FF9900");
    assert_eq!(
        card.style_note().as_deref(),
        Some("This ad has been styled to match Amazon Fresh's brand guidelines")
    );
}

#[tokio::test]
async fn test_export_after_analysis_delivers_jpeg() {
    let service = Arc::new(ScriptedService::new().analysis(rejected()));
    let wf = workflow(service, WorkflowConfig::default());
    wf.analyze().await.unwrap();

    let file = wf.export_preview().await.unwrap();
    assert_eq!(file.source, PayloadSource::Encoded);
    assert_eq!(&file.payload.bytes[..2], &[0xFF, 0xD8]);
    assert_eq!((file.width, file.height), (540, 540));
    assert!(file.file_name.starts_with("ad-preview-"));
    assert!(wf.take_notices().is_empty());
}
