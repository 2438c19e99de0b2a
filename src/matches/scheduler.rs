//! Deferred deletion of closed match rooms

use crate::metrics::MetricsCollector;
use crate::platform::Platform;
use crate::types::RoomId;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{info, warn};

/// Handle to a pending room deletion
#[derive(Debug)]
pub struct ScheduledDeletion {
    room_id: RoomId,
    delay: Duration,
    handle: JoinHandle<bool>,
}

impl ScheduledDeletion {
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Stop the deletion if it has not run yet
    pub fn cancel(&self) {
        if !self.handle.is_finished() {
            info!("Cancelled scheduled deletion of room '{}'", self.room_id);
        }
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the deletion; true if the room was deleted
    pub async fn wait(self) -> bool {
        self.handle.await.unwrap_or(false)
    }
}

/// Delete a room after `delay`. Failures are logged and counted, never retried.
pub fn schedule_deletion(
    platform: Arc<dyn Platform>,
    metrics_collector: Arc<MetricsCollector>,
    room_id: &str,
    delay: Duration,
) -> ScheduledDeletion {
    let task_room_id = room_id.to_string();

    let handle = tokio::spawn(async move {
        tokio::time::sleep(delay).await;

        match platform.delete_room(&task_room_id).await {
            Ok(()) => {
                info!("Deleted closed match room '{}'", task_room_id);
                metrics_collector.record_room_deletion(true);
                true
            }
            Err(e) => {
                warn!("Failed to delete closed match room '{}': {}", task_room_id, e);
                metrics_collector.record_room_deletion(false);
                metrics_collector.record_external_failure("delete_room");
                false
            }
        }
    });

    ScheduledDeletion {
        room_id: room_id.to_string(),
        delay,
        handle,
    }
}
