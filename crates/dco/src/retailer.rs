//! Static retailer palette and multi-retailer variant generation.

use creative_core::{
    AnalysisResult, ColorTheme, Creative, CreativeError, CreativeResult, RetailerVariant,
    VariantSet,
};
use tracing::info;

/// Brand palette of the supported retailers, in display order.
pub struct RetailerPalette;

const PALETTE: [(&str, &str, &str); 5] = [
    ("Tesco", "#0071CE", "#00A3E0"),
    ("Walmart", "#FFC220", "#0071CE"),
    ("Amazon Fresh", "#FF9900", "#146EB4"),
    ("Sainsbury's", "#F47E20", "#003DA5"),
    ("Asda", "#0066CC", "#00A6D8"),
];

impl RetailerPalette {
    /// Name of the unstyled ("house") theme.
    pub const DEFAULT_RETAILER: &'static str = "Default";

    /// Retailers in palette order.
    pub fn retailers() -> Vec<&'static str> {
        PALETTE.iter().map(|(name, _, _)| *name).collect()
    }

    /// Theme of a known retailer.
    pub fn lookup(retailer: &str) -> Option<ColorTheme> {
        PALETTE
            .iter()
            .find(|(name, _, _)| *name == retailer)
            .map(|(_, primary, secondary)| ColorTheme::new(primary, secondary))
    }

    /// House theme used when a retailer has no palette entry.
    pub fn fallback() -> ColorTheme {
        ColorTheme::new("#667eea", "#764ba2")
    }

    pub fn theme_for(retailer: &str) -> ColorTheme {
        Self::lookup(retailer).unwrap_or_else(Self::fallback)
    }
}

/// Suffix rule for retailer headlines. A real style-transfer step would
/// replace this.
pub fn styled_headline(headline: &str, retailer: &str) -> String {
    format!("{headline} - {retailer}")
}

/// Build one variant per retailer from a single creative snapshot.
///
/// Fails with `Precondition` when the creative has not been analyzed yet.
/// Pure: the creative is only read, and no network call is made.
pub fn generate_variants(
    creative: &Creative,
    retailers: &[&str],
    analysis: Option<&AnalysisResult>,
) -> CreativeResult<VariantSet> {
    if analysis.is_none() {
        return Err(CreativeError::Precondition(
            "analyze the creative first".to_string(),
        ));
    }

    let variants = retailers
        .iter()
        .map(|retailer| RetailerVariant {
            retailer_name: retailer.to_string(),
            styled_headline: styled_headline(&creative.headline, retailer),
            subhead: creative.subhead.clone(),
            cta: creative.cta.clone(),
            image_url: creative.image_url.clone(),
            color_theme: RetailerPalette::theme_for(retailer),
        })
        .collect::<Vec<_>>();

    info!(count = variants.len(), "generated retailer variants");
    Ok(VariantSet { variants })
}
