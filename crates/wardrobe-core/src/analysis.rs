//! Photo analysis: encodes the image, asks the vision model for attributes and
//! normalizes what comes back.

use std::path::Path;
use std::sync::Arc;

use base64::Engine;
use tracing::{debug, warn};
use wardrobe_provider::{ClothingAnalysis, ImageAnalyzer};
use wardrobe_schema::Season;

use crate::error::{AnalysisError, ValidationError};

/// Attributes proposed for a new item, ready for the user to edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestedAttributes {
    pub name: String,
    pub kind: String,
    pub color: String,
    pub season: Season,
}

pub struct AnalysisClient {
    analyzer: Arc<dyn ImageAnalyzer>,
}

impl AnalysisClient {
    pub fn new(analyzer: Arc<dyn ImageAnalyzer>) -> Self {
        Self { analyzer }
    }

    pub async fn analyze(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> Result<SuggestedAttributes, AnalysisError> {
        if image.is_empty() {
            return Err(ValidationError::EmptyImage.into());
        }
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        debug!(bytes = image.len(), mime_type, "analyzing clothing image");

        match self.analyzer.analyze(&encoded, mime_type).await {
            Ok(raw) => Ok(normalize(raw)),
            Err(e) => {
                warn!(error = %e, "image analysis failed");
                Err(AnalysisError::Failed(e))
            }
        }
    }
}

fn normalize(raw: ClothingAnalysis) -> SuggestedAttributes {
    let season = raw.season.parse().unwrap_or_else(|_| {
        warn!(season = %raw.season, "analysis returned unknown season, using All");
        Season::All
    });
    SuggestedAttributes {
        name: raw.name,
        kind: raw.kind,
        color: raw.color,
        season,
    }
}

/// `data:<mime>;base64,<payload>` reference stored with each item.
pub fn image_data_url(image: &[u8], mime_type: &str) -> String {
    format!(
        "data:{};base64,{}",
        mime_type,
        base64::engine::general_purpose::STANDARD.encode(image)
    )
}

pub fn mime_for_path(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
