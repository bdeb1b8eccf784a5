//! Typed access to the records kept in the [`StateStore`].
//!
//! Layout:
//!
//! | path | record | writer |
//! |------|--------|--------|
//! | `scheduler/schedules/{id}` | [`WeeklySchedule`](stovepanel_domain::schedule::WeeklySchedule) | user |
//! | `scheduler/active_schedule_id` | schedule id string | user |
//! | `scheduler/mode` | [`SchedulerMode`](stovepanel_domain::scheduler_mode::SchedulerMode) | user, lazy expiry |
//! | `pid/config` | [`PidConfig`](stovepanel_domain::pid::PidConfig) | user |
//! | `pid/state/{room}` | [`PidState`](stovepanel_domain::pid::PidState) | power cycle |
//! | `coordination/config` | [`SyncConfig`](stovepanel_domain::coordination::SyncConfig) | user |
//! | `coordination/state` | [`CoordinationState`](stovepanel_domain::coordination::CoordinationState) | coordination cycle |

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use stovepanel_domain::error::PanelError;
use stovepanel_domain::id::{RoomId, ScheduleId};

use crate::ports::StateStore;

pub const SCHEDULES: &str = "scheduler/schedules";
pub const ACTIVE_SCHEDULE_ID: &str = "scheduler/active_schedule_id";
pub const SCHEDULER_MODE: &str = "scheduler/mode";
pub const PID_CONFIG: &str = "pid/config";
pub const SYNC_CONFIG: &str = "coordination/config";
pub const COORDINATION_STATE: &str = "coordination/state";

#[must_use]
pub fn schedule_path(id: &ScheduleId) -> String {
    format!("{SCHEDULES}/{id}")
}

#[must_use]
pub fn pid_state_path(room: &RoomId) -> String {
    format!("pid/state/{room}")
}

/// Read and decode the record at `path`.
///
/// # Errors
///
/// Returns [`PanelError::Storage`] when the store fails or the stored
/// document does not decode as `T`.
pub async fn load<T, S>(store: &S, path: &str) -> Result<Option<T>, PanelError>
where
    T: DeserializeOwned,
    S: StateStore,
{
    match store.get(path).await? {
        Some(value) => decode(value).map(Some),
        None => Ok(None),
    }
}

/// Like [`load`], falling back to `T::default()` for a missing record.
///
/// # Errors
///
/// See [`load`].
pub async fn load_or_default<T, S>(store: &S, path: &str) -> Result<T, PanelError>
where
    T: DeserializeOwned + Default,
    S: StateStore,
{
    Ok(load(store, path).await?.unwrap_or_default())
}

/// Encode `record` and overwrite the document at `path`.
///
/// # Errors
///
/// Returns [`PanelError::Storage`] on encoding or store failure.
pub async fn save<T, S>(store: &S, path: &str, record: &T) -> Result<(), PanelError>
where
    T: Serialize + Sync,
    S: StateStore,
{
    let value = serde_json::to_value(record).map_err(PanelError::storage)?;
    store.set(path, value).await
}

/// Decode every record stored directly under `parent`.
///
/// # Errors
///
/// See [`load`].
pub async fn load_children<T, S>(store: &S, parent: &str) -> Result<Vec<T>, PanelError>
where
    T: DeserializeOwned,
    S: StateStore,
{
    store
        .children(parent)
        .await?
        .into_iter()
        .map(|(_, value)| decode(value))
        .collect()
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, PanelError> {
    serde_json::from_value(value).map_err(PanelError::storage)
}
