use std::fmt;

use bevy::prelude::*;

use crate::assets::{ItemAssetId, VehicleAssetId};

/// Stable 64-bit identifier assigned to a player by the platform layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A player known to the server.
#[derive(Component, Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
}

/// Marker for players with a live connection. Upkeep scans only see
/// connected players; registry entries for absent players simply go unread.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Connected;

/// Links a player to the vehicle entity they currently occupy.
#[derive(Component, Debug, Clone, Copy)]
pub struct InVehicle {
    pub vehicle: Entity,
}

/// Mutable vehicle state. Capacity and maximum health live on the
/// [`VehicleAsset`](crate::assets::VehicleAsset) referenced by `asset`.
#[derive(Component, Debug, Clone)]
pub struct Vehicle {
    pub asset: VehicleAssetId,
    pub fuel: u16,
    pub health: u16,
    pub exploded: bool,
}

/// One occupied inventory slot.
///
/// `amount` is the client-visible display amount. `state` is the opaque
/// per-item byte buffer; for weapons it is exactly 18 bytes (magazine ammo
/// byte at offset 0, attached-barrel id at offsets 6..8, barrel wear at
/// offset 16). Buffers of any other length are not interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSlot {
    pub item: ItemAssetId,
    pub amount: u8,
    pub quality: u8,
    pub state: Vec<u8>,
}

impl ItemSlot {
    pub fn new(item: ItemAssetId, amount: u8, quality: u8, state: Vec<u8>) -> Self {
        Self {
            item,
            amount,
            quality,
            state,
        }
    }
}

/// A player's carried items.
#[derive(Component, Debug, Clone, Default)]
pub struct Inventory {
    pub slots: Vec<ItemSlot>,
}

impl Inventory {
    pub fn with_slots(slots: Vec<ItemSlot>) -> Self {
        Self { slots }
    }
}
