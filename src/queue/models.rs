use serde::{Deserialize, Serialize};
use std::fmt;

/// Default link sticker position: bottom-center
pub const DEFAULT_STICKER_X: f64 = 0.5;
pub const DEFAULT_STICKER_Y: f64 = 0.85;

/// Lifecycle of a queue item
///
/// ```text
/// pending -> processing -> published
///                       -> failed
/// pending -> cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Pending,
    Processing,
    Published,
    Failed,
    Cancelled,
}

impl QueueStatus {
    pub fn can_transition_to(self, next: QueueStatus) -> bool {
        use QueueStatus::*;
        matches!(
            (self, next),
            (Pending, Processing) | (Pending, Cancelled) | (Processing, Published) | (Processing, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            QueueStatus::Published | QueueStatus::Failed | QueueStatus::Cancelled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QueueStatus::Pending => "pending",
            QueueStatus::Processing => "processing",
            QueueStatus::Published => "published",
            QueueStatus::Failed => "failed",
            QueueStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub id: u64,
    pub image_url: String,
    pub link_url: String,
    pub link_sticker_x: f64,
    pub link_sticker_y: f64,
    pub caption: Option<String>,
    /// Epoch ms; the worker picks the item up once this has passed
    pub scheduled_at: i64,
    pub status: QueueStatus,
    pub platform_post_id: Option<String>,
    pub error: Option<String>,
    pub created_at: i64,
    pub processing_started_at: Option<i64>,
}

/// Input for `PublishQueue::enqueue`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQueueItem {
    pub image_url: String,
    pub link_url: String,
    pub link_sticker_x: Option<f64>,
    pub link_sticker_y: Option<f64>,
    pub caption: Option<String>,
    pub scheduled_at: i64,
}

impl NewQueueItem {
    pub fn sticker_position(&self) -> (f64, f64) {
        (
            self.link_sticker_x.unwrap_or(DEFAULT_STICKER_X),
            self.link_sticker_y.unwrap_or(DEFAULT_STICKER_Y),
        )
    }
}

pub(crate) fn is_unit_interval(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use QueueStatus::*;

    const ALL: [QueueStatus; 5] = [Pending, Processing, Published, Failed, Cancelled];

    #[test]
    fn test_legal_transitions() {
        let legal: Vec<(QueueStatus, QueueStatus)> = ALL
            .iter()
            .flat_map(|from| ALL.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| from.can_transition_to(*to))
            .collect();

        assert_eq!(
            legal,
            vec![
                (Pending, Processing),
                (Pending, Cancelled),
                (Processing, Published),
                (Processing, Failed),
            ]
        );
    }

    #[test]
    fn test_terminal_states_have_no_exit() {
        for from in ALL.iter().filter(|s| s.is_terminal()) {
            assert!(ALL.iter().all(|to| !from.can_transition_to(*to)));
        }
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(serde_json::to_string(&Cancelled).unwrap(), r#""cancelled""#);
        let parsed: QueueStatus = serde_json::from_str(r#""processing""#).unwrap();
        assert_eq!(parsed, Processing);
    }

    #[test]
    fn test_sticker_defaults() {
        let item: NewQueueItem = serde_json::from_str(
            r#"{"imageUrl": "/uploads/a.jpg", "linkUrl": "https://shop.example.com", "scheduledAt": 0}"#,
        )
        .unwrap();
        assert_eq!(item.sticker_position(), (0.5, 0.85));
        assert!(item.caption.is_none());
    }
}
