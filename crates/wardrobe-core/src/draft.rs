use wardrobe_schema::{NewClothingItem, Season};

use crate::analysis::{image_data_url, SuggestedAttributes};

/// Editable form state for an item between analysis and save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    pub storage_location_id: String,
    pub image_data_url: String,
    pub name: String,
    pub kind: String,
    pub color: String,
    pub season: Season,
    tags_input: String,
}

impl ItemDraft {
    pub fn from_analysis(
        storage_location_id: impl Into<String>,
        image: &[u8],
        mime_type: &str,
        suggestion: SuggestedAttributes,
    ) -> Self {
        Self {
            storage_location_id: storage_location_id.into(),
            image_data_url: image_data_url(image, mime_type),
            name: suggestion.name,
            kind: suggestion.kind,
            color: suggestion.color,
            season: suggestion.season,
            tags_input: String::new(),
        }
    }

    /// Raw comma-separated tag text as typed.
    pub fn tags_input(&self) -> &str {
        &self.tags_input
    }

    pub fn set_tags_input(&mut self, input: impl Into<String>) {
        self.tags_input = input.into();
    }

    pub fn tags(&self) -> Vec<String> {
        parse_tags(&self.tags_input)
    }

    pub fn into_new_item(self) -> NewClothingItem {
        let custom_tags = self.tags();
        NewClothingItem {
            storage_location_id: self.storage_location_id,
            image_data_url: self.image_data_url,
            name: self.name,
            kind: self.kind,
            color: self.color,
            season: self.season,
            custom_tags,
        }
    }
}

/// Split on commas, trim, drop empties. Order and duplicates are kept.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
