/// Fjall-based asset catalog
///
/// Holds everything the operator curates by hand and the generator reads:
///
/// - Collections and the assets they own (cascade delete)
/// - Daily publication slots
/// - Key/value settings (platform credentials, base URL)
/// - The email campaign sent log
///
/// Asset `lastUsed` stamps are written either one at a time (operator edit)
/// or as a single batch when a schedule is confirmed.
///
/// ## Usage
///
/// ```rust,ignore
/// use storydesk::catalog::CatalogStore;
///
/// let store = CatalogStore::open("data/catalog")?;
/// let collections = store.list_enabled_collections_with_assets()?;
/// let slots = store.list_slots()?;
/// ```

pub mod error;
pub mod models;
pub mod partitions;
pub mod store;

pub use error::{CatalogError, Result};
pub use models::{
    Asset, Collection, CollectionUpdate, CollectionWithAssets, NewAsset, NewCollection,
    NewSentLogEntry, NewSlot, Priority, SentLogEntry, Slot, parse_slot_time,
};
pub use store::CatalogStore;
