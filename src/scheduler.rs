//! Delayed private message delivery
//!
//! Each `/delay` spawns one independent timer task. The task carries a copy
//! of everything it needs (`DelayedTask`) and resolves the recipient only
//! when the delay has elapsed, so the sender may disconnect in between.
//! Tasks cannot be cancelled and do not survive a restart.

use std::time::Duration;

use tokio::runtime::Handle;
use tracing::info;

use crate::error::AppError;
use crate::registry::ClientRegistry;
use crate::server::deliver_private;

/// Snapshot of a delayed private message, taken at schedule time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelayedTask {
    pub delay_secs: u64,
    pub sender_name: String,
    pub recipient_name: String,
    pub text: String,
}

/// Spawns fire-and-forget delayed deliveries against a registry
#[derive(Debug, Clone)]
pub struct DelayScheduler {
    registry: ClientRegistry,
}

impl DelayScheduler {
    pub fn new(registry: ClientRegistry) -> Self {
        Self { registry }
    }

    /// Start the delivery timer and return immediately.
    ///
    /// Fails only when no runtime is available to run the timer.
    pub fn schedule(&self, task: DelayedTask) -> Result<(), AppError> {
        let handle = Handle::try_current().map_err(|e| AppError::Schedule(e.to_string()))?;
        let registry = self.registry.clone();

        handle.spawn(async move {
            tokio::time::sleep(Duration::from_secs(task.delay_secs)).await;
            info!(
                "Executing delayed PM from {} to {} after {} seconds",
                task.sender_name, task.recipient_name, task.delay_secs
            );
            deliver_private(
                &registry,
                None,
                &task.sender_name,
                &task.recipient_name,
                task.text,
            )
            .await;
        });

        Ok(())
    }
}
