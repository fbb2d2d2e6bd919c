//! Shared state handed to every handler.

use crate::services::storage_service::FileStorage;
use chrono::{DateTime, Utc};
use std::{sync::Arc, time::Instant};

/// Application state shared across handlers.
///
/// Cloning is cheap: the storage engine only holds its base path and the
/// instance identity sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub storage: FileStorage,
    pub instance: Arc<InstanceInfo>,
}

/// Identity of this running node, reported by the informational endpoints.
#[derive(Debug)]
pub struct InstanceInfo {
    pub instance_id: String,
    pub started_at: DateTime<Utc>,
    started: Instant,
}

impl InstanceInfo {
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    /// Time since startup rendered as e.g. `1h2m3s`.
    pub fn uptime(&self) -> String {
        format_uptime(self.started.elapsed().as_secs())
    }
}

impl AppState {
    pub fn new(storage: FileStorage, instance_id: impl Into<String>) -> Self {
        Self {
            storage,
            instance: Arc::new(InstanceInfo::new(instance_id)),
        }
    }
}

fn format_uptime(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    match (hours, minutes) {
        (0, 0) => format!("{}s", seconds),
        (0, _) => format!("{}m{}s", minutes, seconds),
        _ => format!("{}h{}m{}s", hours, minutes, seconds),
    }
}
