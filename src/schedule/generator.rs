//! Greedy daily slot assignment with cooldown and priority scoring.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use chrono::{FixedOffset, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::calendar::{day_noon_ms, days_inclusive, is_off_cooldown};
use super::cta;
use crate::catalog::{Asset, CollectionWithAssets, Priority, Slot};

/// One proposed (slot, asset) assignment; nothing is persisted until confirmed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledItem {
    pub slot_id: String,
    pub slot_time: String,
    pub is_prime: bool,
    pub asset: Asset,
    pub collection_name: String,
    pub collection_link: String,
    pub cta: String,
    pub cta_commercial: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub date: NaiveDate,
    pub items: Vec<ScheduledItem>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Base score by collection priority
fn base_score(priority: Priority) -> u32 {
    match priority {
        Priority::High => 10,
        Priority::Medium => 5,
        Priority::Low => 1,
    }
}

fn prime_bonus(priority: Priority) -> u32 {
    match priority {
        Priority::High => 500,
        Priority::Medium => 50,
        Priority::Low => 0,
    }
}

pub fn score(priority: Priority, is_prime: bool) -> u32 {
    let bonus = if is_prime { prime_bonus(priority) } else { 0 };
    base_score(priority) + bonus
}

pub fn shortfall_warning(date: NaiveDate) -> String {
    format!(
        "Could not fill every slot for {}; add more assets.",
        date.format("%Y-%m-%d")
    )
}

/// An eligible asset together with its owning collection
struct Candidate<'a> {
    asset: &'a Asset,
    collection: &'a CollectionWithAssets,
}

/// Assign at most one asset per slot per day over `start..=end`
///
/// Disabled collections are ignored. Each day sees the usage simulated by the
/// days before it in the same call. Returns an empty list when `start > end`.
pub fn generate<R: Rng + ?Sized>(
    collections: &[CollectionWithAssets],
    slots: &[Slot],
    start: NaiveDate,
    end: NaiveDate,
    offset: FixedOffset,
    rng: &mut R,
) -> Vec<GenerationResult> {
    let mut simulated: HashMap<&str, i64> = collections
        .iter()
        .flat_map(|entry| entry.assets.iter())
        .filter_map(|asset| asset.last_used.map(|last_used| (asset.id.as_str(), last_used)))
        .collect();

    let mut ordered_slots: Vec<&Slot> = slots.iter().collect();
    ordered_slots.sort_by(|a, b| b.is_prime.cmp(&a.is_prime).then_with(|| a.time.cmp(&b.time)));

    let mut results = Vec::new();
    for date in days_inclusive(start, end) {
        let noon = day_noon_ms(date, offset);
        let items = generate_day(collections, &ordered_slots, noon, &simulated, rng);

        let mut warnings = Vec::new();
        if items.len() < slots.len() {
            warnings.push(shortfall_warning(date));
        }

        for item in &items {
            if let Some(asset_id) = asset_id_in(collections, &item.asset.id) {
                simulated.insert(asset_id, noon);
            }
        }

        results.push(GenerationResult {
            date,
            items,
            warnings,
        });
    }

    results
}

/// Borrow the id from the catalog input so the simulation map can key on `&str`
fn asset_id_in<'a>(collections: &'a [CollectionWithAssets], id: &str) -> Option<&'a str> {
    collections
        .iter()
        .flat_map(|entry| entry.assets.iter())
        .find(|asset| asset.id == id)
        .map(|asset| asset.id.as_str())
}

fn generate_day<R: Rng + ?Sized>(
    collections: &[CollectionWithAssets],
    ordered_slots: &[&Slot],
    noon: i64,
    simulated: &HashMap<&str, i64>,
    rng: &mut R,
) -> Vec<ScheduledItem> {
    let mut available: Vec<Candidate<'_>> = collections
        .iter()
        .filter(|entry| entry.collection.enabled)
        .flat_map(|entry| {
            entry.assets.iter().map(move |asset| Candidate {
                asset,
                collection: entry,
            })
        })
        .filter(|candidate| {
            let last_used = simulated
                .get(candidate.asset.id.as_str())
                .copied()
                .or(candidate.asset.last_used);
            is_off_cooldown(last_used, noon)
        })
        .collect();

    let mut used_collections: HashSet<&str> = HashSet::new();
    let mut items = Vec::with_capacity(ordered_slots.len());

    for slot in ordered_slots {
        let mut scored: Vec<(usize, u32, f64)> = available
            .iter()
            .enumerate()
            .filter(|(_, candidate)| {
                !used_collections.contains(candidate.collection.collection.id.as_str())
            })
            .map(|(index, candidate)| {
                let priority = candidate.collection.collection.priority;
                (index, score(priority, slot.is_prime), rng.r#gen::<f64>())
            })
            .collect();

        if scored.is_empty() {
            continue;
        }

        scored.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| b.2.partial_cmp(&a.2).unwrap_or(Ordering::Equal))
        });
        let selected = available.remove(scored[0].0);
        let collection = &selected.collection.collection;

        let urgent = slot.is_prime || collection.priority == Priority::High;
        items.push(ScheduledItem {
            slot_id: slot.id.clone(),
            slot_time: slot.time.clone(),
            is_prime: slot.is_prime,
            asset: selected.asset.clone(),
            collection_name: collection.name.clone(),
            collection_link: collection.link.clone(),
            cta: cta::short_cta(urgent, rng),
            cta_commercial: cta::commercial_cta(rng),
            generated_caption: None,
        });

        used_collections.insert(collection.id.as_str());
    }

    items.sort_by(|a, b| a.slot_time.cmp(&b.slot_time));
    items
}
