pub mod models;
pub mod store;

pub use models::{DEFAULT_STICKER_X, DEFAULT_STICKER_Y, NewQueueItem, QueueItem, QueueStatus};
pub use store::{PublishQueue, QueueError};
