//! Schedule confirmation: durable `lastUsed` stamps and optional enqueue.

use std::collections::HashMap;

use chrono::{FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::ScheduleError;
use super::calendar::{COOLDOWN_MS, day_noon_ms, slot_time_ms};
use super::generator::{GenerationResult, ScheduledItem};
use crate::catalog::{Asset, CatalogStore};
use crate::queue::{NewQueueItem, PublishQueue};

/// Which text becomes the story caption when confirmed items are enqueued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionSource {
    Cta,
    #[default]
    Commercial,
    Generated,
    None,
}

impl CaptionSource {
    pub fn caption_for(self, item: &ScheduledItem) -> Option<String> {
        let caption = match self {
            CaptionSource::Cta => Some(item.cta.clone()),
            CaptionSource::Commercial => Some(item.cta_commercial.clone()),
            CaptionSource::Generated => item.generated_caption.clone(),
            CaptionSource::None => None,
        };
        caption.filter(|text| !text.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfirmOptions {
    pub enqueue: bool,
    pub caption_source: CaptionSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StampedAsset {
    pub asset_id: String,
    pub date: NaiveDate,
    pub slot_id: String,
    pub last_used: i64,
}

/// Persisted `lastUsed` is too close to the assigned day; another run got there first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageConflict {
    pub asset_id: String,
    pub date: NaiveDate,
    pub slot_id: String,
    pub persisted_last_used: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingAsset {
    pub asset_id: String,
    pub date: NaiveDate,
    pub slot_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationReport {
    pub stamped: Vec<StampedAsset>,
    pub conflicts: Vec<UsageConflict>,
    pub missing: Vec<MissingAsset>,
    pub enqueued: Vec<u64>,
}

impl ConfirmationReport {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty() && self.missing.is_empty()
    }
}

/// Decide every stamp against the loaded assets, mutating them in place
///
/// Days are walked in ascending order so later days see the stamps of
/// earlier ones. Returns the report and the accepted items with their date.
pub fn plan_stamps<'a>(
    days: &'a [GenerationResult],
    assets: &mut HashMap<String, Asset>,
    offset: FixedOffset,
) -> (ConfirmationReport, Vec<(NaiveDate, &'a ScheduledItem)>) {
    let mut ordered: Vec<&GenerationResult> = days.iter().collect();
    ordered.sort_by_key(|day| day.date);

    let mut report = ConfirmationReport::default();
    let mut accepted = Vec::new();

    for day in ordered {
        let noon = day_noon_ms(day.date, offset);
        for item in &day.items {
            let asset_id = item.asset.id.clone();
            let Some(asset) = assets.get_mut(&asset_id) else {
                report.missing.push(MissingAsset {
                    asset_id,
                    date: day.date,
                    slot_id: item.slot_id.clone(),
                });
                continue;
            };

            let stamp = match asset.last_used {
                None => noon,
                Some(persisted) if persisted == noon => noon,
                Some(persisted) if (noon - persisted).abs() <= COOLDOWN_MS => {
                    report.conflicts.push(UsageConflict {
                        asset_id,
                        date: day.date,
                        slot_id: item.slot_id.clone(),
                        persisted_last_used: persisted,
                    });
                    continue;
                }
                Some(persisted) => persisted.max(noon),
            };

            asset.last_used = Some(stamp);
            report.stamped.push(StampedAsset {
                asset_id,
                date: day.date,
                slot_id: item.slot_id.clone(),
                last_used: stamp,
            });
            accepted.push((day.date, item));
        }
    }

    (report, accepted)
}

/// Stamp every asset of a confirmed multi-day schedule in one batch and
/// optionally enqueue the accepted items
pub fn confirm(
    catalog: &CatalogStore,
    queue: &PublishQueue,
    days: &[GenerationResult],
    options: &ConfirmOptions,
    offset: FixedOffset,
    now_ms: i64,
) -> Result<ConfirmationReport, ScheduleError> {
    // Nothing is written when any item could not be enqueued
    if options.enqueue {
        for day in days {
            if let Some(item) = day
                .items
                .iter()
                .find(|item| slot_time_ms(day.date, &item.slot_time, offset).is_none())
            {
                return Err(ScheduleError::InvalidSlotTime(item.slot_time.clone()));
            }
        }
    }

    let ids: Vec<String> = days
        .iter()
        .flat_map(|day| day.items.iter().map(|item| item.asset.id.clone()))
        .collect();

    let (mut report, accepted) =
        catalog.batch_update_assets(&ids, |assets| plan_stamps(days, assets, offset))?;

    if options.enqueue {
        for (date, item) in accepted {
            let scheduled_at = slot_time_ms(date, &item.slot_time, offset)
                .ok_or_else(|| ScheduleError::InvalidSlotTime(item.slot_time.clone()))?;
            let queued = queue.enqueue(
                NewQueueItem {
                    image_url: item.asset.image_url.clone(),
                    link_url: item.collection_link.clone(),
                    link_sticker_x: None,
                    link_sticker_y: None,
                    caption: options.caption_source.caption_for(item),
                    scheduled_at,
                },
                now_ms,
            )?;
            report.enqueued.push(queued.id);
        }
    }

    if !report.is_clean() {
        warn!(
            conflicts = report.conflicts.len(),
            missing = report.missing.len(),
            "Schedule confirmed with skipped items"
        );
    }
    info!(
        stamped = report.stamped.len(),
        enqueued = report.enqueued.len(),
        "Schedule confirmed"
    );

    Ok(report)
}
