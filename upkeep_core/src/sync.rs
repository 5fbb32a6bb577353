use bevy::prelude::*;
use serde::Serialize;

use crate::components::PlayerId;
use crate::telemetry::UpkeepTelemetry;

/// A vehicle's fuel was corrected; observers must see the new value.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct VehicleFuelUpdate {
    pub vehicle: Entity,
    pub fuel: u16,
}

/// A vehicle's health was corrected.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct VehicleHealthUpdate {
    pub vehicle: Entity,
    pub health: u16,
}

/// An inventory slot's quality was corrected.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct ItemQualityUpdate {
    pub player: PlayerId,
    pub slot: usize,
    pub quality: u8,
}

/// An inventory slot's display amount was corrected.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct ItemAmountUpdate {
    pub player: PlayerId,
    pub slot: usize,
    pub amount: u8,
}

/// An inventory slot's state buffer was rewritten.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct ItemStateUpdate {
    pub player: PlayerId,
    pub slot: usize,
    pub state: Vec<u8>,
}

/// Wire form of a push, broadcast to observers as one JSON line.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PushRecord {
    VehicleFuel { vehicle: u64, fuel: u16 },
    VehicleHealth { vehicle: u64, health: u16 },
    ItemQuality { player: u64, slot: usize, quality: u8 },
    ItemAmount { player: u64, slot: usize, amount: u8 },
    ItemState { player: u64, slot: usize, state: Vec<u8> },
}

/// Pending push records awaiting broadcast by the host loop.
#[derive(Resource, Debug, Clone, Default)]
pub struct SyncOutbox {
    records: Vec<PushRecord>,
}

impl SyncOutbox {
    pub fn push(&mut self, record: PushRecord) {
        self.records.push(record);
    }

    pub fn drain(&mut self) -> Vec<PushRecord> {
        std::mem::take(&mut self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Drain the frame's push events into the outbox and the telemetry counters.
pub fn collect_push_records(
    mut outbox: ResMut<SyncOutbox>,
    mut telemetry: ResMut<UpkeepTelemetry>,
    mut fuel_updates: EventReader<VehicleFuelUpdate>,
    mut health_updates: EventReader<VehicleHealthUpdate>,
    mut quality_updates: EventReader<ItemQualityUpdate>,
    mut amount_updates: EventReader<ItemAmountUpdate>,
    mut state_updates: EventReader<ItemStateUpdate>,
) {
    for update in fuel_updates.read() {
        telemetry.fuel_pushes += 1;
        outbox.push(PushRecord::VehicleFuel {
            vehicle: update.vehicle.to_bits(),
            fuel: update.fuel,
        });
    }
    for update in health_updates.read() {
        telemetry.health_pushes += 1;
        outbox.push(PushRecord::VehicleHealth {
            vehicle: update.vehicle.to_bits(),
            health: update.health,
        });
    }
    for update in quality_updates.read() {
        telemetry.quality_pushes += 1;
        outbox.push(PushRecord::ItemQuality {
            player: update.player.0,
            slot: update.slot,
            quality: update.quality,
        });
    }
    for update in amount_updates.read() {
        telemetry.amount_pushes += 1;
        outbox.push(PushRecord::ItemAmount {
            player: update.player.0,
            slot: update.slot,
            amount: update.amount,
        });
    }
    for update in state_updates.read() {
        telemetry.state_pushes += 1;
        outbox.push(PushRecord::ItemState {
            player: update.player.0,
            slot: update.slot,
            state: update.state.clone(),
        });
    }
}
