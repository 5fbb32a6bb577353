use std::fmt;
use std::time::Duration;

use bevy::prelude::Resource;
use bevy::time::{Timer, TimerMode};
use thiserror::Error;
use tracing::info;

use crate::components::PlayerId;
use crate::registry::ToggleRegistry;

pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_millis(5_000);

/// The three upkeep services.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Refuel,
    VehicleRepair,
    ItemUpkeep,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ServiceKind::Refuel => "auto-refuel",
            ServiceKind::VehicleRepair => "auto-vehicle-repair",
            ServiceKind::ItemUpkeep => "item-upkeep",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceStatus {
    Stopped,
    Running,
}

/// Lifecycle and cadence for one monitor.
///
/// A runner starts Stopped. `start` arms the check timer so the first due
/// scan happens on the next update; subsequent scans wait out the configured
/// interval. A stop request is observed between updates, so a scan already
/// underway finishes its pass.
#[derive(Debug, Clone)]
pub struct ServiceRunner {
    kind: ServiceKind,
    status: ServiceStatus,
    timer: Timer,
}

impl ServiceRunner {
    pub fn new(kind: ServiceKind) -> Self {
        Self {
            kind,
            status: ServiceStatus::Stopped,
            timer: Timer::new(DEFAULT_CHECK_INTERVAL, TimerMode::Repeating),
        }
    }

    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    pub fn is_running(&self) -> bool {
        self.status == ServiceStatus::Running
    }

    /// Transition to Running. No-op while already running.
    pub fn start(&mut self) -> bool {
        if self.status == ServiceStatus::Running {
            return false;
        }
        self.status = ServiceStatus::Running;
        let interval = self.timer.duration();
        self.timer.set_elapsed(interval);
        info!(target: "ashfall::upkeep", service = %self.kind, "service.started");
        true
    }

    /// Transition to Stopped. No-op while already stopped.
    pub fn stop(&mut self) -> bool {
        if self.status == ServiceStatus::Stopped {
            return false;
        }
        self.status = ServiceStatus::Stopped;
        self.timer.reset();
        info!(target: "ashfall::upkeep", service = %self.kind, "service.stopped");
        true
    }

    /// Advance the check timer and report whether a scan is due.
    pub fn should_scan(&mut self, delta: Duration, interval: Duration) -> bool {
        if self.status != ServiceStatus::Running {
            return false;
        }
        if self.timer.duration() != interval {
            self.timer.set_duration(interval);
        }
        self.timer.tick(delta);
        self.timer.just_finished()
    }
}

/// Monitor state for the auto-refuel service.
#[derive(Resource, Debug, Clone)]
pub struct RefuelMonitor(pub ServiceRunner);

impl Default for RefuelMonitor {
    fn default() -> Self {
        Self(ServiceRunner::new(ServiceKind::Refuel))
    }
}

/// Monitor state for the auto-vehicle-repair service.
#[derive(Resource, Debug, Clone)]
pub struct VehicleRepairMonitor(pub ServiceRunner);

impl Default for VehicleRepairMonitor {
    fn default() -> Self {
        Self(ServiceRunner::new(ServiceKind::VehicleRepair))
    }
}

/// Monitor state for the item-upkeep service.
#[derive(Resource, Debug, Clone)]
pub struct ItemUpkeepMonitor(pub ServiceRunner);

impl Default for ItemUpkeepMonitor {
    fn default() -> Self {
        Self(ServiceRunner::new(ServiceKind::ItemUpkeep))
    }
}

/// Queried a service kind that was never wired into the directory.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0} service is not available")]
pub struct ServiceUnavailable(pub ServiceKind);

/// A synchronous correction request could not be carried out.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ForceError {
    #[error("player {0} is not known to the server")]
    UnknownPlayer(PlayerId),
    #[error("player {0} is not in a vehicle")]
    NotInVehicle(PlayerId),
}

/// Toggle capability for one service kind, handed to the command layer.
#[derive(Debug, Clone)]
pub struct UpkeepHandle {
    kind: ServiceKind,
    registry: ToggleRegistry,
}

impl UpkeepHandle {
    pub fn new(kind: ServiceKind, registry: ToggleRegistry) -> Self {
        Self { kind, registry }
    }

    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    pub fn registry(&self) -> &ToggleRegistry {
        &self.registry
    }
}

/// Explicit wiring point between the services and external command handlers.
///
/// Built once at bootstrap and passed to consumers by value; holds at most
/// one handle per service kind and carries no lifecycle logic.
#[derive(Debug, Clone, Default)]
pub struct ServiceDirectory {
    refuel: Option<UpkeepHandle>,
    vehicle_repair: Option<UpkeepHandle>,
    item_upkeep: Option<UpkeepHandle>,
}

impl ServiceDirectory {
    pub fn bind(&mut self, handle: UpkeepHandle) {
        let slot = self.slot_mut(handle.kind());
        *slot = Some(handle);
    }

    pub fn get(&self, kind: ServiceKind) -> Result<&UpkeepHandle, ServiceUnavailable> {
        self.slot(kind).as_ref().ok_or(ServiceUnavailable(kind))
    }

    pub fn is_bound(&self, kind: ServiceKind) -> bool {
        self.slot(kind).is_some()
    }

    fn slot(&self, kind: ServiceKind) -> &Option<UpkeepHandle> {
        match kind {
            ServiceKind::Refuel => &self.refuel,
            ServiceKind::VehicleRepair => &self.vehicle_repair,
            ServiceKind::ItemUpkeep => &self.item_upkeep,
        }
    }

    fn slot_mut(&mut self, kind: ServiceKind) -> &mut Option<UpkeepHandle> {
        match kind {
            ServiceKind::Refuel => &mut self.refuel,
            ServiceKind::VehicleRepair => &mut self.vehicle_repair,
            ServiceKind::ItemUpkeep => &mut self.item_upkeep,
        }
    }
}
