//! In-memory wardrobe collections kept in step with the persisted store.
//!
//! Mutations apply to memory first, then write through. A failed write is
//! reported to the caller and leaves the store marked behind; the next
//! successful write (or [`WardrobeState::flush`]) rewrites both collections.

use tracing::{debug, error, info};
use wardrobe_schema::{
    ClothingItem, NewClothingItem, SeasonFilter, StorageLocation, CLOTHES_KEY, LOCATIONS_KEY,
};
use wardrobe_store::CollectionStore;

use crate::confirm::{Confirm, ConfirmPrompt};
use crate::error::{ValidationError, WardrobeError};
use crate::ids;

pub const UNKNOWN_LOCATION: &str = "Unknown Location";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The confirmation was not given; nothing changed.
    Declined,
    Deleted { items_removed: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dirty {
    Locations,
    Clothes,
    Both,
}

pub struct WardrobeState {
    store: CollectionStore,
    locations: Vec<StorageLocation>,
    clothes: Vec<ClothingItem>,
    store_behind: bool,
}

impl WardrobeState {
    /// Load both collections. Missing records start empty.
    pub async fn load(store: CollectionStore) -> Result<Self, WardrobeError> {
        let locations: Vec<StorageLocation> = store.load(LOCATIONS_KEY).await?;
        let clothes: Vec<ClothingItem> = store.load(CLOTHES_KEY).await?;
        info!(
            locations = locations.len(),
            clothes = clothes.len(),
            "wardrobe loaded"
        );
        Ok(Self {
            store,
            locations,
            clothes,
            store_behind: false,
        })
    }

    pub fn locations(&self) -> &[StorageLocation] {
        &self.locations
    }

    pub fn clothes(&self) -> &[ClothingItem] {
        &self.clothes
    }

    pub fn location(&self, id: &str) -> Option<&StorageLocation> {
        self.locations.iter().find(|l| l.id == id)
    }

    pub fn location_name(&self, id: &str) -> &str {
        self.location(id)
            .map(|l| l.name.as_str())
            .unwrap_or(UNKNOWN_LOCATION)
    }

    /// True when an earlier write failed and memory is ahead of the store.
    pub fn has_unsaved_changes(&self) -> bool {
        self.store_behind
    }

    pub async fn add_location(&mut self, name: &str) -> Result<StorageLocation, WardrobeError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyLocationName.into());
        }
        let location = StorageLocation {
            id: ids::location_id(),
            name: name.to_string(),
        };
        self.locations.push(location.clone());
        info!(location_id = %location.id, name = %location.name, "location added");
        self.persist(Dirty::Locations).await?;
        Ok(location)
    }

    /// Remove a location and every item stored in it, after confirmation.
    pub async fn delete_location(
        &mut self,
        id: &str,
        confirm: &dyn Confirm,
    ) -> Result<DeleteOutcome, WardrobeError> {
        let location = self
            .location(id)
            .cloned()
            .ok_or_else(|| WardrobeError::LocationNotFound(id.to_string()))?;

        let prompt = ConfirmPrompt::DeleteLocation {
            id: location.id.clone(),
            name: location.name.clone(),
        };
        if !confirm.confirm(&prompt).await {
            debug!(location_id = %id, "location delete declined");
            return Ok(DeleteOutcome::Declined);
        }

        self.locations.retain(|l| l.id != id);
        let before = self.clothes.len();
        self.clothes.retain(|item| item.storage_location_id != id);
        let items_removed = before - self.clothes.len();
        info!(location_id = %id, items_removed, "location deleted");

        self.persist(Dirty::Both).await?;
        Ok(DeleteOutcome::Deleted { items_removed })
    }

    pub async fn add_clothing_item(
        &mut self,
        item: NewClothingItem,
    ) -> Result<ClothingItem, WardrobeError> {
        if self.location(&item.storage_location_id).is_none() {
            return Err(WardrobeError::LocationNotFound(item.storage_location_id));
        }
        let item = item.with_id(ids::item_id());
        self.clothes.push(item.clone());
        info!(
            item_id = %item.id,
            location_id = %item.storage_location_id,
            "clothing item added"
        );
        self.persist(Dirty::Clothes).await?;
        Ok(item)
    }

    pub async fn delete_clothing_item(
        &mut self,
        id: &str,
        confirm: &dyn Confirm,
    ) -> Result<DeleteOutcome, WardrobeError> {
        let Some(item) = self.clothes.iter().find(|item| item.id == id) else {
            return Err(WardrobeError::ItemNotFound(id.to_string()));
        };
        let prompt = ConfirmPrompt::DeleteItem {
            id: item.id.clone(),
            name: item.name.clone(),
        };
        if !confirm.confirm(&prompt).await {
            debug!(item_id = %id, "item delete declined");
            return Ok(DeleteOutcome::Declined);
        }

        self.clothes.retain(|item| item.id != id);
        info!(item_id = %id, "clothing item deleted");
        self.persist(Dirty::Clothes).await?;
        Ok(DeleteOutcome::Deleted { items_removed: 1 })
    }

    /// Items stored in `location_id`, in collection order.
    pub fn query_by_location(&self, location_id: &str) -> Vec<&ClothingItem> {
        self.clothes
            .iter()
            .filter(|item| item.storage_location_id == location_id)
            .collect()
    }

    /// Case-insensitive substring search over name, type, color and tags,
    /// narrowed by season. The term is matched as typed, whitespace included;
    /// an empty term matches every item.
    pub fn search(&self, term: &str, filter: SeasonFilter) -> Vec<&ClothingItem> {
        let term = term.to_lowercase();
        self.clothes
            .iter()
            .filter(|item| filter.matches(item.season) && matches_term(item, &term))
            .collect()
    }

    /// Rewrite both collections if an earlier write failed.
    pub async fn flush(&mut self) -> Result<(), WardrobeError> {
        if !self.store_behind {
            return Ok(());
        }
        self.persist(Dirty::Both).await
    }

    async fn persist(&mut self, dirty: Dirty) -> Result<(), WardrobeError> {
        let dirty = if self.store_behind { Dirty::Both } else { dirty };
        let result = match dirty {
            Dirty::Locations => self.store.save(LOCATIONS_KEY, &self.locations).await,
            Dirty::Clothes => self.store.save(CLOTHES_KEY, &self.clothes).await,
            // Clothes first: if only the first record lands, stored items
            // still all point at stored locations.
            Dirty::Both => {
                self.store
                    .save_pair(
                        (CLOTHES_KEY, self.clothes.as_slice()),
                        (LOCATIONS_KEY, self.locations.as_slice()),
                    )
                    .await
            }
        };

        match result {
            Ok(()) => {
                self.store_behind = false;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "failed to persist wardrobe");
                self.store_behind = true;
                Err(e.into())
            }
        }
    }
}

fn matches_term(item: &ClothingItem, term: &str) -> bool {
    [&item.name, &item.kind, &item.color]
        .into_iter()
        .chain(item.custom_tags.iter())
        .any(|field| field.to_lowercase().contains(term))
}
