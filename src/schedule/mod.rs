//! Daily schedule generation and confirmation
//!
//! The generator is a pure function over catalog snapshots: it never writes.
//! Confirmation is the only path that feeds usage back into the catalog.
//!
//! ```rust,ignore
//! use rand::thread_rng;
//! use storydesk::schedule::{generate_from_catalog, RangeRequest};
//!
//! let request = RangeRequest::parse("2026-03-01", "2026-03-07", 62)?;
//! let days = generate_from_catalog(&catalog, &request, offset, &mut thread_rng())?;
//! ```

pub mod calendar;
pub mod confirm;
pub mod cta;
pub mod generator;

pub use confirm::{
    CaptionSource, ConfirmOptions, ConfirmationReport, MissingAsset, StampedAsset, UsageConflict,
    confirm,
};
pub use generator::{GenerationResult, ScheduledItem, generate};

use chrono::{FixedOffset, NaiveDate};
use rand::Rng;
use thiserror::Error;

use crate::catalog::{CatalogError, CatalogStore};
use crate::queue::QueueError;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Date range covers {days} days, at most {limit} are allowed")]
    RangeTooLong { days: i64, limit: u32 },

    #[error("Invalid slot time '{0}'")]
    InvalidSlotTime(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// A validated inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeRequest {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl RangeRequest {
    /// Parse both ends and enforce the range cap
    ///
    /// A reversed range is accepted here; the generator turns it into an
    /// empty result.
    pub fn parse(start: &str, end: &str, max_days: u32) -> Result<Self, ScheduleError> {
        let start = calendar::parse_date(start)?;
        let end = calendar::parse_date(end)?;

        let days = calendar::range_len_days(start, end);
        if days > i64::from(max_days) {
            return Err(ScheduleError::RangeTooLong {
                days,
                limit: max_days,
            });
        }

        Ok(Self { start, end })
    }
}

/// Read the enabled collections and slots, then generate
pub fn generate_from_catalog<R: Rng + ?Sized>(
    catalog: &CatalogStore,
    range: &RangeRequest,
    offset: FixedOffset,
    rng: &mut R,
) -> Result<Vec<GenerationResult>, ScheduleError> {
    let collections = catalog.list_enabled_collections_with_assets()?;
    let slots = catalog.list_slots()?;

    let results = generate(&collections, &slots, range.start, range.end, offset, rng);
    tracing::debug!(
        days = results.len(),
        collections = collections.len(),
        slots = slots.len(),
        "Generated schedule"
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_request_limits() {
        let ok = RangeRequest::parse("2026-03-01", "2026-03-31", 62).unwrap();
        assert_eq!(calendar::range_len_days(ok.start, ok.end), 31);

        assert!(matches!(
            RangeRequest::parse("2026-01-01", "2026-12-31", 62),
            Err(ScheduleError::RangeTooLong { days: 365, limit: 62 })
        ));

        assert!(matches!(
            RangeRequest::parse("yesterday", "2026-03-01", 62),
            Err(ScheduleError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_reversed_range_is_accepted() {
        let reversed = RangeRequest::parse("2026-03-05", "2026-03-01", 62).unwrap();
        assert!(reversed.start > reversed.end);
    }
}
