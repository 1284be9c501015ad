use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Persisted key holding the ordered array of storage locations.
pub const LOCATIONS_KEY: &str = "locations";
/// Persisted key holding the ordered array of clothing items.
pub const CLOTHES_KEY: &str = "clothes";

/// A named bucket (closet, suitcase, drawer) grouping clothing items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageLocation {
    pub id: String,
    pub name: String,
}

/// A single cataloged garment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClothingItem {
    pub id: String,
    pub storage_location_id: String,
    /// Self-contained `data:<mime>;base64,<payload>` reference
    pub image_data_url: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub color: String,
    pub season: Season,
    #[serde(default)]
    pub custom_tags: Vec<String>,
}

/// A clothing item that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClothingItem {
    pub storage_location_id: String,
    pub image_data_url: String,
    pub name: String,
    pub kind: String,
    pub color: String,
    pub season: Season,
    pub custom_tags: Vec<String>,
}

impl NewClothingItem {
    pub fn with_id(self, id: impl Into<String>) -> ClothingItem {
        ClothingItem {
            id: id.into(),
            storage_location_id: self.storage_location_id,
            image_data_url: self.image_data_url,
            name: self.name,
            kind: self.kind,
            color: self.color,
            season: self.season,
            custom_tags: self
                .custom_tags
                .into_iter()
                .filter(|tag| !tag.is_empty())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
    /// Season-agnostic
    All,
}

impl Season {
    pub const ALL_VALUES: [Season; 5] = [
        Season::Spring,
        Season::Summer,
        Season::Autumn,
        Season::Winter,
        Season::All,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
            Season::Winter => "Winter",
            Season::All => "All",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSeason(pub String);

impl fmt::Display for UnknownSeason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown season: {}", self.0)
    }
}

impl std::error::Error for UnknownSeason {}

impl FromStr for Season {
    type Err = UnknownSeason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Season::ALL_VALUES
            .into_iter()
            .find(|season| season.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownSeason(s.to_string()))
    }
}

/// Season filter used by search. `AllSeasons` is the sentinel that matches
/// every item, including items whose season is [`Season::All`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeasonFilter {
    #[default]
    AllSeasons,
    Only(Season),
}

impl SeasonFilter {
    pub const ALL_SEASONS_LABEL: &'static str = "All Seasons";

    /// Options in the order the season picker lists them.
    pub fn options() -> Vec<SeasonFilter> {
        std::iter::once(SeasonFilter::AllSeasons)
            .chain(Season::ALL_VALUES.into_iter().map(SeasonFilter::Only))
            .collect()
    }

    pub fn matches(&self, season: Season) -> bool {
        match self {
            SeasonFilter::AllSeasons => true,
            SeasonFilter::Only(wanted) => *wanted == season,
        }
    }
}

impl fmt::Display for SeasonFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeasonFilter::AllSeasons => f.write_str(Self::ALL_SEASONS_LABEL),
            SeasonFilter::Only(season) => season.fmt(f),
        }
    }
}

impl FromStr for SeasonFilter {
    type Err = UnknownSeason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case(Self::ALL_SEASONS_LABEL) {
            return Ok(SeasonFilter::AllSeasons);
        }
        s.parse().map(SeasonFilter::Only)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Screen {
    #[default]
    Home,
    Location,
    Search,
    Video,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clothing_item_uses_camel_case_field_names() {
        let item = ClothingItem {
            id: "item-1".into(),
            storage_location_id: "loc-1".into(),
            image_data_url: "data:image/png;base64,AAAA".into(),
            name: "Blue Shirt".into(),
            kind: "Shirt".into(),
            color: "Blue".into(),
            season: Season::Summer,
            custom_tags: vec!["casual".into()],
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["storageLocationId"], "loc-1");
        assert_eq!(value["imageDataUrl"], "data:image/png;base64,AAAA");
        assert_eq!(value["type"], "Shirt");
        assert_eq!(value["season"], "Summer");
        assert_eq!(value["customTags"][0], "casual");
    }

    #[test]
    fn clothing_item_without_tags_deserializes() {
        let raw = serde_json::json!({
            "id": "item-2",
            "storageLocationId": "loc-1",
            "imageDataUrl": "data:image/jpeg;base64,BBBB",
            "name": "Wool Coat",
            "type": "Coat",
            "color": "Grey",
            "season": "Winter"
        });
        let item: ClothingItem = serde_json::from_value(raw).unwrap();
        assert!(item.custom_tags.is_empty());
        assert_eq!(item.season, Season::Winter);
    }

    #[test]
    fn new_item_drops_empty_tags() {
        let item = NewClothingItem {
            storage_location_id: "loc-1".into(),
            image_data_url: String::new(),
            name: "Scarf".into(),
            kind: "Scarf".into(),
            color: "Red".into(),
            season: Season::Autumn,
            custom_tags: vec!["".into(), "gift".into(), "gift".into()],
        }
        .with_id("item-9");
        assert_eq!(item.custom_tags, vec!["gift", "gift"]);
    }

    #[test]
    fn season_parses_case_insensitively() {
        assert_eq!("winter".parse::<Season>().unwrap(), Season::Winter);
        assert_eq!(" All ".parse::<Season>().unwrap(), Season::All);
        assert!("Monsoon".parse::<Season>().is_err());
    }

    #[test]
    fn season_filter_sentinel_matches_everything() {
        let filter: SeasonFilter = "All Seasons".parse().unwrap();
        assert_eq!(filter, SeasonFilter::AllSeasons);
        assert!(Season::ALL_VALUES.iter().all(|s| filter.matches(*s)));

        let winter: SeasonFilter = "Winter".parse().unwrap();
        assert!(winter.matches(Season::Winter));
        assert!(!winter.matches(Season::All));
        assert_eq!(SeasonFilter::options().len(), 6);
        assert_eq!(SeasonFilter::options()[0].to_string(), "All Seasons");
    }

    #[test]
    fn aspect_ratio_serializes_as_ratio_string() {
        assert_eq!(
            serde_json::to_string(&AspectRatio::Portrait).unwrap(),
            "\"9:16\""
        );
        assert_eq!(AspectRatio::default().as_str(), "16:9");
    }

    #[test]
    fn screen_serializes_like_route_names() {
        assert_eq!(serde_json::to_string(&Screen::Home).unwrap(), "\"HOME\"");
        assert_eq!(Screen::default(), Screen::Home);
    }
}
