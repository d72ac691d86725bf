use std::fmt;
use std::str::FromStr;

use creative_core::{AnalysisResult, Creative, PerformancePrediction, VariantSet};
use creative_dco::{PreviewCard, RetailerPalette};
use serde::Serialize;

/// Coarse workflow state. Remediation and variant generation never change
/// it; only the first successful analysis does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Empty,
    Analyzed,
}

/// Which result panel is showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultView {
    #[default]
    Compliance,
    RetailerStyle,
    Performance,
    MultiRetailer,
}

impl ResultView {
    pub const ALL: [ResultView; 4] = [
        ResultView::Compliance,
        ResultView::RetailerStyle,
        ResultView::Performance,
        ResultView::MultiRetailer,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Compliance => "Compliance",
            Self::RetailerStyle => "Retailer Style",
            Self::Performance => "Performance",
            Self::MultiRetailer => "Multi-Retailer",
        }
    }
}

impl fmt::Display for ResultView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for ResultView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "compliance" | "simulator" => Ok(Self::Compliance),
            "retailerstyle" | "transfer" => Ok(Self::RetailerStyle),
            "performance" => Ok(Self::Performance),
            "multiretailer" => Ok(Self::MultiRetailer),
            _ => Err(format!("unknown view '{s}'")),
        }
    }
}

/// Everything the workflow owns, published as one unit.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSnapshot {
    pub creative: Creative,
    /// Bumped on every change to the creative.
    pub revision: u64,
    pub analysis: Option<AnalysisResult>,
    /// Creative revision the current analysis describes.
    pub analyzed_revision: Option<u64>,
    pub prediction: Option<PerformancePrediction>,
    pub variants: Option<VariantSet>,
    pub view: ResultView,
    pub selected_retailer: String,
}

impl WorkflowSnapshot {
    pub fn new(creative: Creative) -> Self {
        Self {
            creative,
            revision: 0,
            analysis: None,
            analyzed_revision: None,
            prediction: None,
            variants: None,
            view: ResultView::default(),
            selected_retailer: RetailerPalette::DEFAULT_RETAILER.to_string(),
        }
    }

    pub fn phase(&self) -> Phase {
        if self.analysis.is_some() {
            Phase::Analyzed
        } else {
            Phase::Empty
        }
    }

    /// True when the analysis was produced for the creative as it is now.
    pub fn is_analysis_current(&self) -> bool {
        self.analysis.is_some() && self.analyzed_revision == Some(self.revision)
    }

    /// The compliance preview. Only renderable once analyzed.
    pub fn preview(&self) -> Option<PreviewCard> {
        self.analysis
            .as_ref()
            .map(|_| PreviewCard::from_creative(&self.creative))
    }

    /// The preview styled for the selected retailer.
    pub fn retailer_style_preview(&self) -> Option<PreviewCard> {
        self.analysis
            .as_ref()
            .map(|_| PreviewCard::for_retailer(&self.creative, &self.selected_retailer))
    }
}

impl Default for WorkflowSnapshot {
    fn default() -> Self {
        Self::new(Creative::default())
    }
}
