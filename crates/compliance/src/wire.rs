//! Request/response bodies of the `/fix` and `/optimize` endpoints, plus the
//! merge rules for applying a remediation.

use creative_core::types::lenient_score;
use creative_core::{AnalysisResult, AnalysisStatus, Creative, ImagePayload, Issue};
use serde::{Deserialize, Serialize};

// ─── Remediation ────────────────────────────────────────────────────────

/// Corrected fields returned by `/fix`. Missing or empty fields mean
/// "keep what the creative already has".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedCreative {
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub subhead: Option<String>,
    #[serde(default)]
    pub cta: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

fn overwrite(target: &mut String, value: &Option<String>) -> bool {
    match value.as_deref() {
        Some(v) if !v.is_empty() && v != target.as_str() => {
            *target = v.to_string();
            true
        }
        _ => false,
    }
}

impl FixedCreative {
    /// Overwrite every present, non-empty field. Returns the names of the
    /// fields whose value actually changed.
    pub fn apply_to(&self, creative: &mut Creative) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if overwrite(&mut creative.headline, &self.headline) {
            changed.push("headline");
        }
        if overwrite(&mut creative.subhead, &self.subhead) {
            changed.push("subhead");
        }
        if overwrite(&mut creative.cta, &self.cta) {
            changed.push("cta");
        }
        if overwrite(&mut creative.image_url, &self.image_url) {
            changed.push("image_url");
        }
        changed
    }
}

/// Re-analysis carried in a `/fix` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisUpdate {
    #[serde(default)]
    pub status: Option<AnalysisStatus>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: Option<i64>,
    #[serde(default)]
    pub issues: Option<Vec<Issue>>,
}

impl AnalysisUpdate {
    /// Replace status, score and issues in place. Anything the update omits
    /// keeps its previous value, and passthrough fields are untouched.
    pub fn apply_to(&self, result: &mut AnalysisResult) {
        if let Some(status) = self.status {
            result.status = status;
        }
        if self.score.is_some() {
            result.score = self.score;
        }
        if let Some(issues) = &self.issues {
            result.issues = issues.clone();
        }
    }
}

/// Decoded `/fix` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Remediation {
    #[serde(default)]
    pub fixed_creative: Option<FixedCreative>,
    #[serde(default)]
    pub applied_fixes: Vec<String>,
    #[serde(default)]
    pub analysis_after: Option<AnalysisUpdate>,
    #[serde(default)]
    pub original_issues: Vec<Issue>,
}

impl Remediation {
    pub const GENERIC_ACK: &'static str = "Applied fixes";

    /// Human summary of the fixes; never empty.
    pub fn summary(&self) -> String {
        let fixes: Vec<&str> = self
            .applied_fixes
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .collect();
        if fixes.is_empty() {
            Self::GENERIC_ACK.to_string()
        } else {
            fixes.join("; ")
        }
    }
}

// ─── Optimization ───────────────────────────────────────────────────────

/// Target format and size budget for `/optimize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizeOptions {
    pub output_format: String,
    pub max_kb: u32,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            output_format: "jpeg".to_string(),
            max_kb: 500,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct OptimizeRequest<'a> {
    pub image_data: String,
    pub output_format: &'a str,
    pub max_kb: u32,
}

impl<'a> OptimizeRequest<'a> {
    pub fn new(image: &ImagePayload, options: &'a OptimizeOptions) -> Self {
        Self {
            image_data: image.to_data_url(),
            output_format: &options.output_format,
            max_kb: options.max_kb,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OptimizeResponse {
    #[serde(default)]
    pub data_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub quality: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use creative_core::{Category, Layout};
    use serde_json::json;

    fn scenario_creative() -> Creative {
        Creative {
            headline: "50% Off".to_string(),
            subhead: "Premium lager".to_string(),
            cta: "Shop Now".to_string(),
            image_url: "https://cdn.example.com/lager.jpg".to_string(),
            category: Category::Alcohol,
            layout: Layout::InstagramSquare,
        }
    }

    #[test]
    fn test_fixed_creative_overwrites_only_present_fields() {
        let mut creative = scenario_creative();
        let fixed: FixedCreative = serde_json::from_value(json!({
            "headline": "50% Off Today",
            "subhead": "",
            "cta": null,
        }))
        .unwrap();

        let changed = fixed.apply_to(&mut creative);
        assert_eq!(changed, vec!["headline"]);
        assert_eq!(creative.headline, "50% Off Today");
        assert_eq!(creative.subhead, "Premium lager");
        assert_eq!(creative.cta, "Shop Now");
        assert_eq!(creative.image_url, "https://cdn.example.com/lager.jpg");
        assert_eq!(creative.category, Category::Alcohol);
    }

    #[test]
    fn test_echoed_creative_is_noop() {
        let mut creative = scenario_creative();
        let before = creative.clone();
        let fixed = FixedCreative {
            headline: Some(creative.headline.clone()),
            subhead: Some(creative.subhead.clone()),
            cta: Some(creative.cta.clone()),
            image_url: Some(creative.image_url.clone()),
        };
        assert!(fixed.apply_to(&mut creative).is_empty());
        assert_eq!(creative, before);
    }

    #[test]
    fn test_analysis_update_preserves_extra_and_omitted_fields() {
        let mut result: AnalysisResult = serde_json::from_value(json!({
            "status": "Rejected",
            "score": 40,
            "issues": [{"message": "Missing responsible-drinking disclaimer"}],
            "creative": {"disclaimer": "Please drink responsibly. Visit drinkaware.co.uk"},
        }))
        .unwrap();

        let update: AnalysisUpdate =
            serde_json::from_value(json!({"status": "Approved", "issues": []})).unwrap();
        update.apply_to(&mut result);

        assert_eq!(result.status, AnalysisStatus::Approved);
        assert_eq!(result.score, Some(40));
        assert!(result.issues.is_empty());
        assert!(result.extra.contains_key("creative"));
    }

    #[test]
    fn test_summary_falls_back_to_generic_ack() {
        let mut remediation = Remediation::default();
        assert_eq!(remediation.summary(), "Applied fixes");

        remediation.applied_fixes = vec!["  ".to_string()];
        assert_eq!(remediation.summary(), "Applied fixes");

        remediation.applied_fixes = vec![
            "Shortened headline".to_string(),
            "Set CTA to 'Shop Now'".to_string(),
        ];
        assert_eq!(remediation.summary(), "Shortened headline; Set CTA to 'Shop Now'");
    }

    #[test]
    fn test_remediation_decodes_full_response() {
        let remediation: Remediation = serde_json::from_value(json!({
            "original_issues": [{"rule": "Headline Length", "message": "Headline exceeds 30 characters", "severity": "Warning"}],
            "applied_fixes": ["Truncated headline to 30 chars"],
            "fixed_creative": {"headline": "Short", "disclaimer": "", "layout": "Instagram Square"},
            "analysis_after": {"status": "Approved", "score": 90, "issues": []},
        }))
        .unwrap();

        assert_eq!(remediation.original_issues.len(), 1);
        assert_eq!(remediation.fixed_creative.unwrap().headline.as_deref(), Some("Short"));
        let after = remediation.analysis_after.unwrap();
        assert_eq!(after.score, Some(90));
        assert_eq!(after.status, Some(AnalysisStatus::Approved));
    }

    #[test]
    fn test_optimize_request_body() {
        let payload = ImagePayload::jpeg(vec![0xff, 0xd8, 0xff]);
        let options = OptimizeOptions::default();
        let body = serde_json::to_value(OptimizeRequest::new(&payload, &options)).unwrap();
        assert_eq!(
            body,
            json!({"image_data": "data:image/jpeg;base64,/9j/", "output_format": "jpeg", "max_kb": 500})
        );
    }
}
