//! services/client/src/poller.rs
//!
//! Background refresh of the notification badge and panel.
//!
//! Each tick fetches the unread count and, while the panel is open, the full
//! list, then hands the result to `NotificationState::apply_snapshot`. The
//! state lock is never held across a request, so a snapshot always reflects
//! the server at request time and is applied whenever it arrives.

use educonnect_core::notifications::{NotificationSnapshot, NotificationState};
use educonnect_core::ports::NotificationSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ClientError;

/// Shared notification state plus the source it is refreshed from.
#[derive(Clone)]
pub struct NotificationPoller {
    source: Arc<dyn NotificationSource>,
    state: Arc<Mutex<NotificationState>>,
}

impl NotificationPoller {
    pub fn new(source: Arc<dyn NotificationSource>, state: Arc<Mutex<NotificationState>>) -> Self {
        Self { source, state }
    }

    /// Starts polling `source` every `interval` until the handle is stopped or dropped.
    pub fn spawn(
        source: Arc<dyn NotificationSource>,
        state: Arc<Mutex<NotificationState>>,
        interval: Duration,
    ) -> PollerHandle {
        Self::new(source, state).start(interval)
    }

    pub fn start(&self, interval: Duration) -> PollerHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let poller = self.clone();

        info!(interval_secs = interval.as_secs(), "notification polling started");
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(error) = poller.poll_once().await {
                            warn!(error = %error, "notification poll failed");
                        }
                    }
                }
            }
            info!("notification polling stopped");
        });

        PollerHandle {
            cancel,
            task: Some(task),
            poller: self.clone(),
        }
    }

    pub fn state(&self) -> Arc<Mutex<NotificationState>> {
        Arc::clone(&self.state)
    }

    /// Runs one refresh cycle. Nothing is applied if any request fails.
    pub async fn poll_once(&self) -> Result<(), ClientError> {
        let panel_open = self.state.lock().await.panel_open();

        let unread_count = self.source.unread_count().await?;
        let items = if panel_open {
            Some(self.source.list().await?)
        } else {
            None
        };

        debug!(unread_count, listed = items.as_ref().map(Vec::len), "notification snapshot");
        self.state
            .lock()
            .await
            .apply_snapshot(NotificationSnapshot { unread_count, items });
        Ok(())
    }

    /// Opens the panel and loads the list immediately instead of waiting a tick.
    pub async fn open_panel(&self) -> Result<(), ClientError> {
        self.state.lock().await.set_panel_open(true);
        self.poll_once().await
    }

    pub async fn close_panel(&self) {
        self.state.lock().await.set_panel_open(false);
    }

    pub async fn mark_read(&self, notification_id: Uuid) -> Result<(), ClientError> {
        self.source.mark_read(notification_id).await?;
        self.state.lock().await.mark_read(notification_id);
        Ok(())
    }

    pub async fn mark_all_read(&self) -> Result<(), ClientError> {
        self.source.mark_all_read().await?;
        self.state.lock().await.mark_all_read();
        Ok(())
    }

    pub async fn delete(&self, notification_id: Uuid) -> Result<(), ClientError> {
        self.source.delete(notification_id).await?;
        self.state.lock().await.remove(notification_id);
        Ok(())
    }
}

/// Owns the polling task. Dropping it cancels polling without waiting.
pub struct PollerHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    poller: NotificationPoller,
}

impl PollerHandle {
    pub fn poller(&self) -> &NotificationPoller {
        &self.poller
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Cancels polling and waits for an in-flight cycle to finish.
    pub async fn stop(mut self) -> Result<(), ClientError> {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.await.map_err(|error| {
                ClientError::Internal(format!("notification poller join failed: {error}"))
            })?;
        }
        Ok(())
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
