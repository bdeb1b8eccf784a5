//! In-memory port fakes shared by the service and cycle tests.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use stovepanel_domain::appliance::{ApplianceStatus, FanLevel, PowerLevel};
use stovepanel_domain::coordination::CoordinationEvent;
use stovepanel_domain::error::{PanelError, UpstreamError};
use stovepanel_domain::id::RoomId;
use stovepanel_domain::time::Timestamp;
use stovepanel_domain::zone::{ZoneMode, ZoneSetpointCommand, ZoneState};

use crate::ports::state_store::merge_patch;
use crate::ports::{
    ApplianceController, ApplianceStatusSource, Clock, CoordinationEventReader,
    CoordinationEventSink, StateStore, ZoneGateway,
};

#[derive(Debug)]
struct StorageDown;

impl std::fmt::Display for StorageDown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("storage down")
    }
}

impl std::error::Error for StorageDown {}

#[derive(Clone, Default)]
pub struct MemoryStore {
    docs: Arc<Mutex<BTreeMap<String, Value>>>,
    failing: Arc<Mutex<bool>>,
    writes: Arc<Mutex<Vec<String>>>,
}

impl MemoryStore {
    pub fn snapshot(&self, path: &str) -> Option<Value> {
        self.docs.lock().unwrap().get(path).cloned()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    /// Paths written so far, in order.
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), PanelError> {
        if *self.failing.lock().unwrap() {
            Err(PanelError::storage(StorageDown))
        } else {
            Ok(())
        }
    }

    fn record_write(&self, path: &str) {
        self.writes.lock().unwrap().push(path.to_string());
    }
}

impl StateStore for MemoryStore {
    fn get(&self, path: &str) -> impl Future<Output = Result<Option<Value>, PanelError>> + Send {
        let result = self.check().map(|()| self.snapshot(path));
        async { result }
    }

    fn set(&self, path: &str, value: Value) -> impl Future<Output = Result<(), PanelError>> + Send {
        let result = self.check().map(|()| {
            self.record_write(path);
            self.docs.lock().unwrap().insert(path.to_string(), value);
        });
        async { result }
    }

    fn update(&self, path: &str, patch: Value) -> impl Future<Output = Result<(), PanelError>> + Send {
        let result = self.check().map(|()| {
            self.record_write(path);
            let mut docs = self.docs.lock().unwrap();
            let doc = docs.entry(path.to_string()).or_insert(Value::Null);
            merge_patch(doc, &patch);
        });
        async { result }
    }

    fn remove(&self, path: &str) -> impl Future<Output = Result<(), PanelError>> + Send {
        let result = self.check().map(|()| {
            self.record_write(path);
            self.docs.lock().unwrap().remove(path);
        });
        async { result }
    }

    fn children(
        &self,
        parent: &str,
    ) -> impl Future<Output = Result<Vec<(String, Value)>, PanelError>> + Send {
        let prefix = format!("{parent}/");
        let result = self.check().map(|()| {
            self.docs
                .lock()
                .unwrap()
                .iter()
                .filter_map(|(path, value)| {
                    let key = path.strip_prefix(&prefix)?;
                    (!key.contains('/')).then(|| (key.to_string(), value.clone()))
                })
                .collect()
        });
        async { result }
    }
}

#[derive(Default)]
struct StoveInner {
    status: Option<ApplianceStatus>,
    failing: bool,
    calls: Vec<String>,
}

/// Scripted stove recording every command.
#[derive(Clone, Default)]
pub struct FakeStove {
    inner: Arc<Mutex<StoveInner>>,
}

impl FakeStove {
    pub fn with_status(status: ApplianceStatus) -> Self {
        let stove = Self::default();
        stove.set_status(status);
        stove
    }

    pub fn heating(power: u8) -> Self {
        Self::with_status(ApplianceStatus::new(6, "WORK").with_levels(power, 2))
    }

    pub fn off() -> Self {
        Self::with_status(ApplianceStatus::new(0, "OFF"))
    }

    pub fn set_status(&self, status: ApplianceStatus) {
        self.inner.lock().unwrap().status = Some(status);
    }

    pub fn set_failing(&self, failing: bool) {
        self.inner.lock().unwrap().failing = failing;
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    fn command(&self, call: String) -> Result<(), PanelError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.failing {
            return Err(UpstreamError::appliance("unreachable").into());
        }
        inner.calls.push(call);
        Ok(())
    }
}

impl ApplianceStatusSource for FakeStove {
    fn status(&self) -> impl Future<Output = Result<ApplianceStatus, PanelError>> + Send {
        let inner = self.inner.lock().unwrap();
        let result = if inner.failing {
            Err(UpstreamError::appliance("unreachable").into())
        } else {
            inner
                .status
                .clone()
                .ok_or_else(|| UpstreamError::appliance("no status").into())
        };
        async { result }
    }
}

impl ApplianceController for FakeStove {
    fn ignite(&self) -> impl Future<Output = Result<(), PanelError>> + Send {
        let result = self.command("ignite".to_string());
        async { result }
    }

    fn shutdown(&self) -> impl Future<Output = Result<(), PanelError>> + Send {
        let result = self.command("shutdown".to_string());
        async { result }
    }

    fn set_power(&self, level: PowerLevel) -> impl Future<Output = Result<(), PanelError>> + Send {
        let result = self.command(format!("power:{level}"));
        async { result }
    }

    fn set_fan(&self, level: FanLevel) -> impl Future<Output = Result<(), PanelError>> + Send {
        let result = self.command(format!("fan:{}", level.get()));
        async { result }
    }
}

#[derive(Default)]
struct ZonesInner {
    zones: Vec<ZoneState>,
    commands: Vec<ZoneSetpointCommand>,
    rejected: BTreeSet<RoomId>,
    failing: bool,
}

/// Thermostats that apply accepted commands to their own state.
#[derive(Clone, Default)]
pub struct FakeZones {
    inner: Arc<Mutex<ZonesInner>>,
}

impl FakeZones {
    pub fn with_rooms(rooms: &[(&str, f64, f64)]) -> Self {
        let zones = Self::default();
        zones.inner.lock().unwrap().zones = rooms
            .iter()
            .map(|(id, measured, setpoint)| ZoneState {
                room_id: room(id),
                name: (*id).to_string(),
                measured: Some(*measured),
                setpoint: Some(*setpoint),
                mode: ZoneMode::Home,
            })
            .collect();
        zones
    }

    pub fn commands(&self) -> Vec<ZoneSetpointCommand> {
        self.inner.lock().unwrap().commands.clone()
    }

    pub fn zone(&self, id: &str) -> ZoneState {
        let id = room(id);
        self.inner
            .lock()
            .unwrap()
            .zones
            .iter()
            .find(|zone| zone.room_id == id)
            .cloned()
            .unwrap()
    }

    /// Simulate someone turning the thermostat by hand.
    pub fn set_by_hand(&self, id: &str, setpoint: f64) {
        let id = room(id);
        let mut inner = self.inner.lock().unwrap();
        if let Some(zone) = inner.zones.iter_mut().find(|zone| zone.room_id == id) {
            zone.mode = ZoneMode::Manual;
            zone.setpoint = Some(setpoint);
        }
    }

    pub fn reject(&self, id: &str) {
        self.inner.lock().unwrap().rejected.insert(room(id));
    }

    pub fn set_failing(&self, failing: bool) {
        self.inner.lock().unwrap().failing = failing;
    }
}

impl ZoneGateway for FakeZones {
    fn zone_states(&self) -> impl Future<Output = Result<Vec<ZoneState>, PanelError>> + Send {
        let inner = self.inner.lock().unwrap();
        let result = if inner.failing {
            Err(UpstreamError::zone_gateway("unreachable").into())
        } else {
            Ok(inner.zones.clone())
        };
        async { result }
    }

    fn set_zone_setpoint(
        &self,
        command: ZoneSetpointCommand,
    ) -> impl Future<Output = Result<bool, PanelError>> + Send {
        let mut inner = self.inner.lock().unwrap();
        let result = if inner.failing {
            Err(UpstreamError::zone_gateway("unreachable").into())
        } else if inner.rejected.contains(&command.room_id) {
            Ok(false)
        } else {
            if let Some(zone) = inner.zones.iter_mut().find(|zone| zone.room_id == command.room_id) {
                zone.mode = command.mode;
                if command.temperature.is_some() {
                    zone.setpoint = command.temperature;
                }
            }
            inner.commands.push(command);
            Ok(true)
        };
        async { result }
    }
}

#[derive(Clone, Default)]
pub struct MemoryEventLog {
    events: Arc<Mutex<Vec<CoordinationEvent>>>,
    failing: Arc<Mutex<bool>>,
}

impl MemoryEventLog {
    pub fn events(&self) -> Vec<CoordinationEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }
}

impl CoordinationEventSink for MemoryEventLog {
    fn append(&self, event: CoordinationEvent) -> impl Future<Output = Result<(), PanelError>> + Send {
        let result = if *self.failing.lock().unwrap() {
            Err(PanelError::storage(StorageDown))
        } else {
            self.events.lock().unwrap().push(event);
            Ok(())
        };
        async { result }
    }
}

impl CoordinationEventReader for MemoryEventLog {
    fn recent(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<CoordinationEvent>, PanelError>> + Send {
        let events: Vec<_> = self.events.lock().unwrap().iter().rev().take(limit).cloned().collect();
        async { Ok(events) }
    }
}

/// Manually driven clock. Local time equals UTC.
#[derive(Clone)]
pub struct FixedClock {
    now: Arc<Mutex<Timestamp>>,
}

impl FixedClock {
    pub fn at(now: Timestamp) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    /// Monday 2025-01-06 at the given UTC time.
    pub fn monday_at(hour: u32, minute: u32) -> Self {
        Self::at(Utc.with_ymd_and_hms(2025, 1, 6, hour, minute, 0).unwrap())
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap()
    }

    fn local_now(&self) -> NaiveDateTime {
        self.now().naive_utc()
    }
}

pub fn room(id: &str) -> RoomId {
    RoomId::parse(id).unwrap()
}
