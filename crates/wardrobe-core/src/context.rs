//! Wardrobe snapshot sent with every chat request.

use std::fmt::Write;

use wardrobe_schema::{ClothingItem, StorageLocation};

/// Plain-text listing of every location and item at the time of capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WardrobeContext {
    text: String,
}

impl WardrobeContext {
    pub fn capture(locations: &[StorageLocation], clothes: &[ClothingItem]) -> Self {
        let mut text = String::from("LOCATIONS:\n");
        for loc in locations {
            let _ = writeln!(text, "- {} (ID: {})", loc.name, loc.id);
        }
        text.push_str("\nCLOTHING ITEMS:\n");
        for item in clothes {
            let _ = writeln!(
                text,
                "- Name: {}, Type: {}, Color: {}, Season: {}, Location ID: {}",
                item.name, item.kind, item.color, item.season, item.storage_location_id
            );
        }
        Self { text }
    }

    pub fn as_text(&self) -> &str {
        &self.text
    }

    pub fn system_instruction(&self) -> String {
        format!(
            "You are a helpful wardrobe assistant chatbot. The user's current wardrobe contains \
             the following items and locations:\n\n{}\n\nAnswer the user's questions based on \
             this information. Be friendly and concise. For complex questions about outfit \
             combinations or fashion advice, take your time to think.",
            self.text
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wardrobe_schema::Season;

    #[test]
    fn lists_locations_then_items() {
        let locations = vec![StorageLocation {
            id: "loc-1".into(),
            name: "Main Closet".into(),
        }];
        let clothes = vec![ClothingItem {
            id: "item-1".into(),
            storage_location_id: "loc-1".into(),
            image_data_url: "data:image/png;base64,AAAA".into(),
            name: "Blue Shirt".into(),
            kind: "Shirt".into(),
            color: "Blue".into(),
            season: Season::Summer,
            custom_tags: vec!["work".into()],
        }];

        let context = WardrobeContext::capture(&locations, &clothes);
        assert_eq!(
            context.as_text(),
            "LOCATIONS:\n- Main Closet (ID: loc-1)\n\nCLOTHING ITEMS:\n\
             - Name: Blue Shirt, Type: Shirt, Color: Blue, Season: Summer, Location ID: loc-1\n"
        );
    }

    #[test]
    fn empty_wardrobe_still_has_headings() {
        let context = WardrobeContext::capture(&[], &[]);
        assert_eq!(context.as_text(), "LOCATIONS:\n\nCLOTHING ITEMS:\n");
    }

    #[test]
    fn system_instruction_embeds_context() {
        let context = WardrobeContext::capture(&[], &[]);
        let instruction = context.system_instruction();
        assert!(instruction.starts_with("You are a helpful wardrobe assistant chatbot."));
        assert!(instruction.contains("LOCATIONS:\n\nCLOTHING ITEMS:\n"));
        assert!(instruction.ends_with("take your time to think."));
    }
}
