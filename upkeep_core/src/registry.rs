use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bevy::prelude::Resource;

use crate::components::PlayerId;

/// Concurrency-safe per-player opt-in map.
///
/// Clones share the same underlying map, so the command bridge can toggle
/// players from its own thread while the monitor systems read during a scan;
/// the lock orders a completed toggle before the next scan's read. An absent
/// entry reads as disabled; entries are never removed — the scan skips
/// players without a live connection, so stale entries are inert.
#[derive(Debug, Clone, Default)]
pub struct ToggleRegistry {
    entries: Arc<Mutex<HashMap<PlayerId, bool>>>,
}

impl ToggleRegistry {
    pub fn enable(&self, player: PlayerId) {
        self.lock().insert(player, true);
    }

    pub fn disable(&self, player: PlayerId) {
        self.lock().insert(player, false);
    }

    pub fn is_enabled(&self, player: PlayerId) -> bool {
        self.lock().get(&player).copied().unwrap_or(false)
    }

    pub fn enabled_count(&self) -> usize {
        self.lock().values().filter(|enabled| **enabled).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PlayerId, bool>> {
        self.entries.lock().expect("upkeep registry mutex poisoned")
    }
}

/// Opt-in registry for the auto-refuel service.
#[derive(Resource, Debug, Clone, Default)]
pub struct RefuelRegistry(pub ToggleRegistry);

/// Opt-in registry for the auto-vehicle-repair service.
#[derive(Resource, Debug, Clone, Default)]
pub struct VehicleRepairRegistry(pub ToggleRegistry);

/// Opt-in registry for the item-upkeep service.
#[derive(Resource, Debug, Clone, Default)]
pub struct ItemUpkeepRegistry(pub ToggleRegistry);
