use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{CatalogError, Result};
use super::models::{
    Asset, Collection, CollectionUpdate, CollectionWithAssets, NewAsset, NewCollection,
    NewSentLogEntry, NewSlot, SentLogEntry, Slot, is_valid_slot_time,
};
use super::partitions::{
    decode_log_key, encode_asset_key, encode_collection_key, encode_log_key, encode_meta_key,
    encode_setting_key, encode_slot_key,
};

const META_NEXT_LOG_SEQ: &str = "next_log_seq";

/// Fjall-backed store for collections, assets, slots, settings and the sent log
///
/// Reads go straight to fjall. Read-modify-write operations serialize on an
/// in-process write lock so two requests cannot interleave their updates.
#[derive(Clone)]
pub struct CatalogStore {
    keyspace: Keyspace,
    collections: PartitionHandle,
    assets: PartitionHandle,
    slots: PartitionHandle,
    settings: PartitionHandle,
    sent_log: PartitionHandle,
    metadata: PartitionHandle,
    next_log_seq: Arc<AtomicU64>,
    write_lock: Arc<Mutex<()>>,
}

impl CatalogStore {
    /// Open or create a catalog at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening catalog store at: {}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let keyspace = Config::new(path).open()?;

        let collections = keyspace.open_partition("collections", PartitionCreateOptions::default())?;
        let assets = keyspace.open_partition("assets", PartitionCreateOptions::default())?;
        let slots = keyspace.open_partition("slots", PartitionCreateOptions::default())?;
        let settings = keyspace.open_partition("settings", PartitionCreateOptions::default())?;
        let sent_log = keyspace.open_partition("sent_log", PartitionCreateOptions::default())?;
        let metadata = keyspace.open_partition("metadata", PartitionCreateOptions::default())?;

        let next_log_seq = metadata
            .get(encode_meta_key(META_NEXT_LOG_SEQ))?
            .map(|bytes| u64::from_be_bytes(bytes.as_ref().try_into().unwrap_or([0u8; 8])))
            .unwrap_or(0);

        info!("Catalog store opened");
        Ok(Self {
            keyspace,
            collections,
            assets,
            slots,
            settings,
            sent_log,
            metadata,
            next_log_seq: Arc::new(AtomicU64::new(next_log_seq)),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // The guarded data is `()`, so a poisoned lock carries no broken state
        self.write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ── Collections ──────────────────────────────────────────────────

    pub fn create_collection(&self, input: NewCollection, now_ms: i64) -> Result<Collection> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(CatalogError::invalid("name", "must not be empty"));
        }

        let _guard = self.lock();
        let id = input.id.unwrap_or_else(|| Uuid::now_v7().to_string());
        let key = encode_collection_key(&id);
        if self.collections.contains_key(&key)? {
            return Err(CatalogError::AlreadyExists {
                kind: "collection",
                id,
            });
        }

        let collection = Collection {
            id,
            name,
            link: input.link,
            priority: input.priority,
            enabled: input.enabled,
            created_at: now_ms,
        };
        put_json(&self.collections, key, &collection)?;
        debug!(collection_id = %collection.id, "Created collection");
        Ok(collection)
    }

    pub fn get_collection(&self, id: &str) -> Result<Option<Collection>> {
        get_json(&self.collections, encode_collection_key(id))
    }

    pub fn update_collection(&self, id: &str, update: CollectionUpdate) -> Result<Collection> {
        let _guard = self.lock();
        let mut collection = self
            .get_collection(id)?
            .ok_or_else(|| CatalogError::not_found("collection", id))?;

        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(CatalogError::invalid("name", "must not be empty"));
            }
            collection.name = name;
        }
        if let Some(link) = update.link {
            collection.link = link;
        }
        if let Some(priority) = update.priority {
            collection.priority = priority;
        }
        if let Some(enabled) = update.enabled {
            collection.enabled = enabled;
        }

        put_json(&self.collections, encode_collection_key(id), &collection)?;
        debug!(collection_id = id, "Updated collection");
        Ok(collection)
    }

    /// Delete a collection and every asset it owns in one batch
    ///
    /// Returns the removed assets so the caller can clean up their images.
    pub fn delete_collection(&self, id: &str) -> Result<Vec<Asset>> {
        let _guard = self.lock();
        if self.get_collection(id)?.is_none() {
            return Err(CatalogError::not_found("collection", id));
        }

        let owned: Vec<Asset> = self
            .all_assets()?
            .into_iter()
            .filter(|asset| asset.collection_id == id)
            .collect();

        let mut batch = self.keyspace.batch();
        batch.remove(&self.collections, encode_collection_key(id));
        for asset in &owned {
            batch.remove(&self.assets, encode_asset_key(&asset.id));
        }
        batch.commit()?;

        info!(collection_id = id, assets = owned.len(), "Deleted collection");
        Ok(owned)
    }

    /// All collections ordered by creation time, each with its assets ordered by id
    pub fn list_collections(&self) -> Result<Vec<CollectionWithAssets>> {
        let mut collections: Vec<Collection> = scan_json(&self.collections)?;
        collections.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        let mut by_collection: HashMap<String, Vec<Asset>> = HashMap::new();
        for asset in self.all_assets()? {
            by_collection
                .entry(asset.collection_id.clone())
                .or_default()
                .push(asset);
        }

        Ok(collections
            .into_iter()
            .map(|collection| {
                let mut assets = by_collection.remove(&collection.id).unwrap_or_default();
                assets.sort_by(|a, b| a.id.cmp(&b.id));
                CollectionWithAssets { collection, assets }
            })
            .collect())
    }

    /// Generator input: only enabled collections
    pub fn list_enabled_collections_with_assets(&self) -> Result<Vec<CollectionWithAssets>> {
        Ok(self
            .list_collections()?
            .into_iter()
            .filter(|entry| entry.collection.enabled)
            .collect())
    }

    // ── Assets ───────────────────────────────────────────────────────

    /// Add an asset to a collection; an already-known id is returned untouched
    pub fn add_asset(&self, collection_id: &str, input: NewAsset) -> Result<Asset> {
        if input.image_url.trim().is_empty() {
            return Err(CatalogError::invalid("imageUrl", "must not be empty"));
        }

        let _guard = self.lock();
        if self.get_collection(collection_id)?.is_none() {
            return Err(CatalogError::not_found("collection", collection_id));
        }

        let id = input.id.unwrap_or_else(|| Uuid::now_v7().to_string());
        if let Some(existing) = self.get_asset(&id)? {
            debug!(asset_id = %id, "Asset already exists, leaving untouched");
            return Ok(existing);
        }

        let asset = Asset {
            id,
            collection_id: collection_id.to_string(),
            image_url: input.image_url,
            description: input.description,
            last_used: None,
        };
        put_json(&self.assets, encode_asset_key(&asset.id), &asset)?;
        debug!(asset_id = %asset.id, collection_id, "Added asset");
        Ok(asset)
    }

    pub fn get_asset(&self, id: &str) -> Result<Option<Asset>> {
        get_json(&self.assets, encode_asset_key(id))
    }

    /// Edit description and/or overwrite `last_used` (`Some(None)` clears it)
    pub fn update_asset(
        &self,
        id: &str,
        description: Option<String>,
        last_used: Option<Option<i64>>,
    ) -> Result<Asset> {
        let _guard = self.lock();
        let mut asset = self
            .get_asset(id)?
            .ok_or_else(|| CatalogError::not_found("asset", id))?;

        if let Some(description) = description {
            asset.description = description;
        }
        if let Some(last_used) = last_used {
            asset.last_used = last_used;
        }

        put_json(&self.assets, encode_asset_key(id), &asset)?;
        Ok(asset)
    }

    pub fn delete_asset(&self, id: &str) -> Result<Asset> {
        let _guard = self.lock();
        let asset = self
            .get_asset(id)?
            .ok_or_else(|| CatalogError::not_found("asset", id))?;
        self.assets.remove(encode_asset_key(id))?;
        debug!(asset_id = id, "Deleted asset");
        Ok(asset)
    }

    /// Load the given assets, let `apply` mutate them, and write every changed
    /// asset back in a single atomic batch
    ///
    /// Unknown ids are simply absent from the map handed to `apply`.
    pub fn batch_update_assets<F, R>(&self, ids: &[String], apply: F) -> Result<R>
    where
        F: FnOnce(&mut HashMap<String, Asset>) -> R,
    {
        let _guard = self.lock();

        let mut loaded = HashMap::with_capacity(ids.len());
        for id in ids {
            if loaded.contains_key(id) {
                continue;
            }
            if let Some(asset) = self.get_asset(id)? {
                loaded.insert(id.clone(), asset);
            }
        }

        let original = loaded.clone();
        let outcome = apply(&mut loaded);

        let mut batch = self.keyspace.batch();
        let mut changed = 0usize;
        for (id, asset) in &loaded {
            if original.get(id) != Some(asset) {
                batch.insert(&self.assets, encode_asset_key(id), serde_json::to_vec(asset)?);
                changed += 1;
            }
        }
        if changed > 0 {
            batch.commit()?;
        }

        debug!(requested = ids.len(), changed, "Batch asset update committed");
        Ok(outcome)
    }

    fn all_assets(&self) -> Result<Vec<Asset>> {
        scan_json(&self.assets)
    }

    // ── Slots ────────────────────────────────────────────────────────

    pub fn create_slot(&self, input: NewSlot) -> Result<Slot> {
        if !is_valid_slot_time(&input.time) {
            return Err(CatalogError::invalid(
                "time",
                format!("'{}' is not a zero-padded HH:MM time", input.time),
            ));
        }

        let _guard = self.lock();
        let id = input.id.unwrap_or_else(|| Uuid::now_v7().to_string());
        let key = encode_slot_key(&id);
        if self.slots.contains_key(&key)? {
            return Err(CatalogError::AlreadyExists { kind: "slot", id });
        }

        let slot = Slot {
            id,
            time: input.time,
            is_prime: input.is_prime,
            sort_order: input.sort_order,
        };
        put_json(&self.slots, key, &slot)?;
        debug!(slot_id = %slot.id, time = %slot.time, "Created slot");
        Ok(slot)
    }

    pub fn delete_slot(&self, id: &str) -> Result<()> {
        let _guard = self.lock();
        let key = encode_slot_key(id);
        if !self.slots.contains_key(&key)? {
            return Err(CatalogError::not_found("slot", id));
        }
        self.slots.remove(key)?;
        Ok(())
    }

    /// Slots ordered by `sort_order`, then time
    pub fn list_slots(&self) -> Result<Vec<Slot>> {
        let mut slots: Vec<Slot> = scan_json(&self.slots)?;
        slots.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.time.cmp(&b.time))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(slots)
    }

    // ── Settings ─────────────────────────────────────────────────────

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .settings
            .get(encode_setting_key(key))?
            .map(|value| String::from_utf8_lossy(&value).into_owned()))
    }

    pub fn put_setting(&self, key: &str, value: &str) -> Result<()> {
        if key.trim().is_empty() {
            return Err(CatalogError::invalid("key", "must not be empty"));
        }
        self.settings.insert(encode_setting_key(key), value.as_bytes())?;
        debug!(key, "Stored setting");
        Ok(())
    }

    /// Non-empty values for the requested keys
    pub fn get_settings(&self, keys: &[&str]) -> Result<HashMap<String, String>> {
        let mut values = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(value) = self.get_setting(key)? {
                if !value.is_empty() {
                    values.insert((*key).to_string(), value);
                }
            }
        }
        Ok(values)
    }

    // ── Sent log ─────────────────────────────────────────────────────

    pub fn add_sent_log(&self, input: NewSentLogEntry, now_ms: i64) -> Result<SentLogEntry> {
        if input.sent_date.trim().is_empty() {
            return Err(CatalogError::invalid("sentDate", "must not be empty"));
        }

        let _guard = self.lock();
        let seq = self.next_log_seq.fetch_add(1, Ordering::SeqCst);
        let entry = SentLogEntry {
            id: seq,
            product_id: input.product_id,
            product_name: input.product_name,
            sent_date: input.sent_date,
            subject: input.subject,
            body: input.body,
            created_at: now_ms,
        };

        let mut batch = self.keyspace.batch();
        batch.insert(&self.sent_log, encode_log_key(seq), serde_json::to_vec(&entry)?);
        batch.insert(
            &self.metadata,
            encode_meta_key(META_NEXT_LOG_SEQ),
            (seq + 1).to_be_bytes(),
        );
        batch.commit()?;

        Ok(entry)
    }

    /// Newest campaign day first
    pub fn list_sent_log(&self) -> Result<Vec<SentLogEntry>> {
        let mut entries: Vec<SentLogEntry> = scan_json(&self.sent_log)?;
        entries.sort_by(|a, b| b.sent_date.cmp(&a.sent_date).then_with(|| b.id.cmp(&a.id)));
        Ok(entries)
    }

    pub fn delete_sent_log(&self, id: u64) -> Result<()> {
        let key = encode_log_key(id);
        if !self.sent_log.contains_key(&key)? {
            return Err(CatalogError::not_found("sent log entry", id.to_string()));
        }
        self.sent_log.remove(key)?;
        Ok(())
    }

    // ── Maintenance ──────────────────────────────────────────────────

    /// Persist all pending writes to disk
    pub fn persist(&self) -> Result<()> {
        self.keyspace.persist(fjall::PersistMode::SyncAll)?;
        Ok(())
    }

    /// Health check - verify the keyspace is readable
    pub fn health_check(&self) -> Result<()> {
        let _ = self.metadata.get(encode_meta_key(META_NEXT_LOG_SEQ))?;
        Ok(())
    }

    /// Highest sent-log id handed out so far, if any (debugging aid)
    pub fn last_sent_log_id(&self) -> Result<Option<u64>> {
        Ok(self
            .sent_log
            .last_key_value()?
            .and_then(|(key, _)| decode_log_key(&key)))
    }
}

fn put_json<T: Serialize>(partition: &PartitionHandle, key: Vec<u8>, value: &T) -> Result<()> {
    partition.insert(key, serde_json::to_vec(value)?)?;
    Ok(())
}

fn get_json<T: DeserializeOwned>(partition: &PartitionHandle, key: Vec<u8>) -> Result<Option<T>> {
    match partition.get(key)? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

fn scan_json<T: DeserializeOwned>(partition: &PartitionHandle) -> Result<Vec<T>> {
    let mut values = Vec::new();
    for item in partition.iter() {
        let (_, value) = item?;
        values.push(serde_json::from_slice(&value)?);
    }
    Ok(values)
}
