use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ─── Creative ───────────────────────────────────────────────────────────

/// Product category of a creative. Drives the compliance footer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[default]
    #[serde(alias = "default")]
    Default,
    #[serde(alias = "alcohol")]
    Alcohol,
    #[serde(rename = "LEP", alias = "lep")]
    Lep,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Default, Category::Alcohol, Category::Lep];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Alcohol => "Alcohol",
            Self::Lep => "LEP",
        }
    }

    /// Footer text the preview must carry for this category.
    pub fn disclaimer(&self) -> Option<&'static str> {
        match self {
            Self::Default => None,
            Self::Alcohol => Some("Please drink responsibly. Visit drinkaware.co.uk"),
            Self::Lep => Some("This product complies with applicable regulations."),
        }
    }
}

/// Placement layout of a creative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layout {
    #[default]
    #[serde(rename = "Instagram Square")]
    InstagramSquare,
    #[serde(rename = "Instagram Story")]
    InstagramStory,
    #[serde(rename = "Facebook Feed")]
    FacebookFeed,
}

impl Layout {
    pub const ALL: [Layout; 3] = [
        Layout::InstagramSquare,
        Layout::InstagramStory,
        Layout::FacebookFeed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InstagramSquare => "Instagram Square",
            Self::InstagramStory => "Instagram Story",
            Self::FacebookFeed => "Facebook Feed",
        }
    }

    /// Canonical placement size in pixels as `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::InstagramSquare => (1080, 1080),
            Self::InstagramStory => (1080, 1920),
            Self::FacebookFeed => (1200, 628),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalizes "Instagram Square", "instagram-square" and "instagram_square"
/// to the same key.
fn normalize_label(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize_label(s);
        Self::ALL
            .into_iter()
            .find(|c| normalize_label(c.as_str()) == key)
            .ok_or_else(|| format!("unknown category '{s}' (expected Default, Alcohol or LEP)"))
    }
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize_label(s);
        Self::ALL
            .into_iter()
            .find(|l| normalize_label(l.as_str()) == key)
            .ok_or_else(|| {
                format!(
                    "unknown layout '{s}' (expected Instagram Square, Instagram Story or Facebook Feed)"
                )
            })
    }
}

/// The user-authored ad draft. Serializes to the `/analyze` and `/fix`
/// request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creative {
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub subhead: String,
    #[serde(default)]
    pub cta: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub layout: Layout,
}

impl Creative {
    pub fn set_headline(&mut self, headline: impl Into<String>) {
        self.headline = headline.into();
    }

    pub fn set_subhead(&mut self, subhead: impl Into<String>) {
        self.subhead = subhead.into();
    }

    pub fn set_cta(&mut self, cta: impl Into<String>) {
        self.cta = cta.into();
    }

    pub fn set_image_url(&mut self, image_url: impl Into<String>) {
        self.image_url = image_url.into();
    }

    pub fn set_category(&mut self, category: Category) {
        self.category = category;
    }

    pub fn set_layout(&mut self, layout: Layout) {
        self.layout = layout;
    }

    pub fn has_image(&self) -> bool {
        !self.image_url.trim().is_empty()
    }
}

// ─── Analysis ───────────────────────────────────────────────────────────

/// Compliance verdict returned by the analysis service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum AnalysisStatus {
    Approved,
    Rejected,
    #[default]
    Unknown,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything other than "approved"/"rejected" (any case), including null,
/// decodes to `Unknown`.
impl<'de> Deserialize<'de> for AnalysisStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        let status = match value.as_ref().and_then(Value::as_str) {
            Some(s) if s.eq_ignore_ascii_case("approved") => Self::Approved,
            Some(s) if s.eq_ignore_ascii_case("rejected") => Self::Rejected,
            _ => Self::Unknown,
        };
        Ok(status)
    }
}

/// A single compliance finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawIssue")]
pub struct Issue {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
}

impl Issue {
    pub const UNKNOWN_MESSAGE: &'static str = "Unknown issue";

    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            rule: None,
            severity: None,
        }
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }
}

/// Wire form of an issue. The service may omit `message`, and older
/// deployments send bare strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawIssue {
    Text(String),
    Object {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        rule: Option<String>,
        #[serde(default)]
        severity: Option<String>,
    },
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl From<RawIssue> for Issue {
    fn from(raw: RawIssue) -> Self {
        match raw {
            RawIssue::Text(message) => Issue {
                message: non_empty(Some(message))
                    .unwrap_or_else(|| Issue::UNKNOWN_MESSAGE.to_string()),
                rule: None,
                severity: None,
            },
            RawIssue::Object {
                message,
                rule,
                severity,
            } => {
                let rule = non_empty(rule);
                let message = non_empty(message)
                    .or_else(|| rule.clone())
                    .unwrap_or_else(|| Issue::UNKNOWN_MESSAGE.to_string());
                Issue {
                    message,
                    rule,
                    severity: non_empty(severity),
                }
            }
        }
    }
}

/// Accepts integral or fractional scores; fractional values are rounded.
pub fn lenient_score<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    }))
}

/// The compliance verdict for a creative. Fields the service sends beyond
/// status/score/issues are kept in `extra` for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub status: AnalysisStatus,
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: Option<i64>,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalysisResult {
    pub fn new(status: AnalysisStatus, score: i64, issues: Vec<Issue>) -> Self {
        Self {
            status,
            score: Some(score),
            issues,
            extra: Map::new(),
        }
    }

    /// Score as shown to the user, e.g. `"40/100"`.
    pub fn score_label(&self) -> String {
        match self.score {
            Some(score) => format!("{score}/100"),
            None => "-/100".to_string(),
        }
    }
}

// ─── Performance ────────────────────────────────────────────────────────

/// Coarse quality bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceZone {
    Green,
    Yellow,
    Red,
}

impl PerformanceZone {
    /// `>= 75` is green, `>= 50` yellow, anything lower red.
    pub fn from_quality(quality: f64) -> Self {
        if quality >= 75.0 {
            Self::Green
        } else if quality >= 50.0 {
            Self::Yellow
        } else {
            Self::Red
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Green => "High performance expected",
            Self::Yellow => "Moderate performance expected",
            Self::Red => "Low performance expected",
        }
    }
}

/// Synthetic CTR/quality projection derived from an analysis score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformancePrediction {
    /// Predicted click-through rate in percent, two decimals.
    pub ctr: f64,
    /// Quality in `[0, 100]`.
    pub quality: f64,
    pub zone: PerformanceZone,
}

// ─── Retailer Variants ──────────────────────────────────────────────────

/// Brand colours of a retailer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorTheme {
    pub primary: String,
    pub secondary: String,
}

impl ColorTheme {
    pub fn new(primary: &str, secondary: &str) -> Self {
        Self {
            primary: primary.to_string(),
            secondary: secondary.to_string(),
        }
    }
}

/// A per-retailer styled snapshot of a creative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetailerVariant {
    pub retailer_name: String,
    pub styled_headline: String,
    pub subhead: String,
    pub cta: String,
    pub image_url: String,
    pub color_theme: ColorTheme,
}

/// Variants generated together from one creative snapshot, in retailer
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSet {
    pub variants: Vec<RetailerVariant>,
}

impl VariantSet {
    pub fn get(&self, retailer: &str) -> Option<&RetailerVariant> {
        self.variants.iter().find(|v| v.retailer_name == retailer)
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn retailers(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|v| v.retailer_name.as_str())
    }
}
