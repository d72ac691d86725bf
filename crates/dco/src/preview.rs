//! Display model of the ad preview card.

use creative_core::{ColorTheme, Creative, Layout};
use serde::{Deserialize, Serialize};

use crate::retailer::RetailerPalette;

/// What the preview card shows, derived from a creative. Capture and the
/// retailer-style view both render from this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewCard {
    pub headline: String,
    pub subhead: String,
    pub cta: String,
    pub image_url: Option<String>,
    /// Compliance footer required by the category.
    pub disclaimer: Option<String>,
    pub layout: Layout,
    /// Retailer styling; `None` renders the neutral compliance preview.
    pub theme: Option<ColorTheme>,
    pub retailer: Option<String>,
}

impl PreviewCard {
    pub fn from_creative(creative: &Creative) -> Self {
        Self {
            headline: creative.headline.clone(),
            subhead: creative.subhead.clone(),
            cta: creative.cta.clone(),
            image_url: creative.has_image().then(|| creative.image_url.clone()),
            disclaimer: creative.category.disclaimer().map(str::to_string),
            layout: creative.layout,
            theme: None,
            retailer: None,
        }
    }

    /// Preview styled with a retailer's palette. Unknown retailers (including
    /// "Default") get the house theme.
    pub fn for_retailer(creative: &Creative, retailer: &str) -> Self {
        Self {
            theme: Some(RetailerPalette::theme_for(retailer)),
            retailer: Some(retailer.to_string()),
            ..Self::from_creative(creative)
        }
    }

    /// Caption shown under a retailer-styled preview.
    pub fn style_note(&self) -> Option<String> {
        self.retailer
            .as_ref()
            .map(|r| format!("This ad has been styled to match {r}'s brand guidelines"))
    }
}
