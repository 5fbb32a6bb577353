use bevy::prelude::*;
use bitflags::bitflags;
use tracing::debug;

use crate::{
    assets::{classify, AssetCatalog, ItemAsset, ItemClass},
    components::{Connected, Inventory, ItemSlot, Player, PlayerId},
    config::{ItemUpkeepSection, UpkeepConfigHandle},
    registry::ItemUpkeepRegistry,
    service::{ForceError, ItemUpkeepMonitor},
    sync::{ItemAmountUpdate, ItemQualityUpdate, ItemStateUpdate},
};

/// Weapon state buffers are interpreted only at exactly this length.
pub const WEAPON_STATE_LEN: usize = 18;
/// Loaded-magazine ammo count.
pub const MAGAZINE_AMMO_OFFSET: usize = 0;
/// Attached-barrel item id, little-endian u16.
pub const BARREL_ID_OFFSET: usize = 6;
/// Attached-barrel wear byte.
pub const BARREL_WEAR_OFFSET: usize = 16;

/// Whether a correction honors the scheduled thresholds or restores
/// unconditionally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CorrectionMode {
    Scheduled,
    Forced,
}

bitflags! {
    /// Which fixes a corrector applied to one slot. `STATE` and `AMOUNT`
    /// double as the push updates the caller must emit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SlotCorrections: u8 {
        const QUALITY = 1 << 0;
        const BARREL = 1 << 1;
        const AMOUNT = 1 << 2;
        const STATE = 1 << 3;
        const GUN_AMMO = 1 << 4;
    }
}

/// Counts reported back by a forced restock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestockReport {
    pub quality_fixes: u32,
    pub barrel_fixes: u32,
    pub ammo_refills: u32,
    pub magazine_refills: u32,
    pub gun_refills: u32,
}

impl RestockReport {
    pub fn total(&self) -> u32 {
        self.quality_fixes
            + self.barrel_fixes
            + self.ammo_refills
            + self.magazine_refills
            + self.gun_refills
    }
}

/// A gun with a barrel attachment whose wear byte can be serviced. Requires
/// the asset to accept barrels, an 18-byte state buffer, and a nonzero
/// barrel id in the buffer.
pub fn has_durable_barrel(slot: &ItemSlot, asset: &ItemAsset) -> bool {
    if classify(asset) != ItemClass::Gun || !asset.has_barrel {
        return false;
    }
    if slot.state.len() != WEAPON_STATE_LEN {
        return false;
    }
    let barrel_id = u16::from_le_bytes([
        slot.state[BARREL_ID_OFFSET],
        slot.state[BARREL_ID_OFFSET + 1],
    ]);
    barrel_id != 0
}

/// Loaded-magazine size estimate for a gun. The platform does not expose the
/// real capacity, so this is a configured guess keyed on whether the weapon
/// mounts a barrel.
pub fn estimated_magazine_capacity(asset: &ItemAsset, config: &ItemUpkeepSection) -> u8 {
    if asset.has_barrel {
        config.barrel_magazine_capacity()
    } else {
        config.default_magazine_capacity()
    }
}

/// Scheduled needs-correction check for one slot.
pub fn slot_needs_upkeep(slot: &ItemSlot, asset: &ItemAsset, config: &ItemUpkeepSection) -> bool {
    if slot.quality < config.quality_threshold() {
        return true;
    }
    match classify(asset) {
        ItemClass::Ammo => slot.amount < asset.amount,
        ItemClass::Magazine => {
            // The raw state byte is known to go stale; the display amount is
            // the trustworthy ammo count for magazines.
            !slot.state.is_empty()
                && u32::from(slot.amount)
                    < u32::from(asset.amount) * u32::from(config.ammo_threshold()) / 100
        }
        ItemClass::Gun => {
            if has_durable_barrel(slot, asset) && slot.state[BARREL_WEAR_OFFSET] < 100 {
                return true;
            }
            if slot.state.len() != WEAPON_STATE_LEN {
                return false;
            }
            let capacity = estimated_magazine_capacity(asset, config);
            u32::from(slot.state[MAGAZINE_AMMO_OFFSET])
                < u32::from(capacity) * u32::from(config.gun_ammo_threshold()) / 100
        }
        ItemClass::Other => false,
    }
}

/// Apply every due fix to one slot and report what changed.
///
/// Scheduled corrections only touch values their threshold flags; forced
/// corrections restore anything below maximum and will synthesize a fresh
/// state buffer for a magazine that lost its own.
pub fn restock_slot(
    slot: &mut ItemSlot,
    asset: &ItemAsset,
    config: &ItemUpkeepSection,
    mode: CorrectionMode,
) -> SlotCorrections {
    let mut applied = SlotCorrections::empty();

    let quality_gate = match mode {
        CorrectionMode::Scheduled => config.quality_threshold(),
        CorrectionMode::Forced => 100,
    };
    if slot.quality < quality_gate {
        slot.quality = 100;
        applied |= SlotCorrections::QUALITY;
    }

    if has_durable_barrel(slot, asset) && slot.state[BARREL_WEAR_OFFSET] < 100 {
        slot.state[BARREL_WEAR_OFFSET] = 100;
        applied |= SlotCorrections::BARREL | SlotCorrections::STATE;
    }

    match classify(asset) {
        ItemClass::Ammo => {
            if slot.amount < asset.amount {
                slot.amount = asset.amount;
                applied |= SlotCorrections::AMOUNT;
            }
        }
        ItemClass::Magazine => {
            if slot.state.is_empty() {
                if mode == CorrectionMode::Forced && asset.amount > 0 {
                    let mut state = vec![0u8; WEAPON_STATE_LEN];
                    state[MAGAZINE_AMMO_OFFSET] = asset.amount;
                    slot.state = state;
                    slot.amount = asset.amount;
                    applied |= SlotCorrections::STATE | SlotCorrections::AMOUNT;
                }
            } else {
                let gate = match mode {
                    CorrectionMode::Scheduled => {
                        (u32::from(asset.amount) * u32::from(config.ammo_threshold()) / 100) as u8
                    }
                    CorrectionMode::Forced => asset.amount,
                };
                if slot.amount < gate {
                    // Both the raw byte and the display amount move together;
                    // updating one without the other desynchronizes clients.
                    slot.state[MAGAZINE_AMMO_OFFSET] = asset.amount;
                    slot.amount = asset.amount;
                    applied |= SlotCorrections::STATE | SlotCorrections::AMOUNT;
                }
            }
        }
        ItemClass::Gun => {
            if slot.state.len() == WEAPON_STATE_LEN {
                let capacity = estimated_magazine_capacity(asset, config);
                let gate = match mode {
                    CorrectionMode::Scheduled => {
                        (u32::from(capacity) * u32::from(config.gun_ammo_threshold()) / 100) as u8
                    }
                    CorrectionMode::Forced => capacity,
                };
                if slot.state[MAGAZINE_AMMO_OFFSET] < gate {
                    slot.state[MAGAZINE_AMMO_OFFSET] = capacity;
                    applied |= SlotCorrections::GUN_AMMO | SlotCorrections::STATE;
                }
            }
        }
        ItemClass::Other => {}
    }

    applied
}

/// Periodic item-upkeep scan over connected players' inventories.
#[allow(clippy::too_many_arguments)]
pub fn monitor_item_upkeep(
    time: Res<Time>,
    config: Res<UpkeepConfigHandle>,
    mut monitor: ResMut<ItemUpkeepMonitor>,
    registry: Res<ItemUpkeepRegistry>,
    catalog: Res<AssetCatalog>,
    mut players: Query<(&Player, &mut Inventory), With<Connected>>,
    mut quality_updates: EventWriter<ItemQualityUpdate>,
    mut amount_updates: EventWriter<ItemAmountUpdate>,
    mut state_updates: EventWriter<ItemStateUpdate>,
) {
    let cfg = config.get();
    let section = cfg.item_upkeep();
    if !monitor.0.should_scan(time.delta(), section.check_interval()) {
        return;
    }

    for (player, mut inventory) in players.iter_mut() {
        if !registry.0.is_enabled(player.id) {
            continue;
        }
        let mut corrected = 0usize;
        for (index, slot) in inventory.slots.iter_mut().enumerate() {
            let Some(asset) = catalog.item(slot.item) else {
                continue;
            };
            if !slot_needs_upkeep(slot, asset, section) {
                continue;
            }
            let applied = restock_slot(slot, asset, section, CorrectionMode::Scheduled);
            if applied.is_empty() {
                continue;
            }
            corrected += 1;
            if applied.contains(SlotCorrections::QUALITY) {
                quality_updates.send(ItemQualityUpdate {
                    player: player.id,
                    slot: index,
                    quality: slot.quality,
                });
            }
            if applied.contains(SlotCorrections::AMOUNT) {
                amount_updates.send(ItemAmountUpdate {
                    player: player.id,
                    slot: index,
                    amount: slot.amount,
                });
            }
            if applied.contains(SlotCorrections::STATE) {
                state_updates.send(ItemStateUpdate {
                    player: player.id,
                    slot: index,
                    state: slot.state.clone(),
                });
            }
        }
        if corrected > 0 {
            debug!(
                target: "ashfall::upkeep",
                player = %player.id,
                slots = corrected,
                "item_upkeep.applied"
            );
        }
    }
}

/// Synchronous full restock of `player`'s inventory, ignoring thresholds and
/// the opt-in flag.
pub fn force_restock(world: &mut World, player: PlayerId) -> Result<RestockReport, ForceError> {
    let cfg = world.resource::<UpkeepConfigHandle>().get();
    let section = cfg.item_upkeep();

    let mut report = RestockReport::default();
    let mut quality_events: Vec<ItemQualityUpdate> = Vec::new();
    let mut amount_events: Vec<ItemAmountUpdate> = Vec::new();
    let mut state_events: Vec<ItemStateUpdate> = Vec::new();
    let mut found = false;

    world.resource_scope(|world, catalog: Mut<AssetCatalog>| {
        let mut players = world.query::<(&Player, &mut Inventory)>();
        for (candidate, mut inventory) in players.iter_mut(world) {
            if candidate.id != player {
                continue;
            }
            found = true;
            for (index, slot) in inventory.slots.iter_mut().enumerate() {
                let Some(asset) = catalog.item(slot.item) else {
                    continue;
                };
                let applied = restock_slot(slot, asset, section, CorrectionMode::Forced);
                if applied.is_empty() {
                    continue;
                }
                tally(&mut report, asset, applied);
                if applied.contains(SlotCorrections::QUALITY) {
                    quality_events.push(ItemQualityUpdate {
                        player,
                        slot: index,
                        quality: slot.quality,
                    });
                }
                if applied.contains(SlotCorrections::AMOUNT) {
                    amount_events.push(ItemAmountUpdate {
                        player,
                        slot: index,
                        amount: slot.amount,
                    });
                }
                if applied.contains(SlotCorrections::STATE) {
                    state_events.push(ItemStateUpdate {
                        player,
                        slot: index,
                        state: slot.state.clone(),
                    });
                }
            }
            break;
        }
    });

    if !found {
        return Err(ForceError::UnknownPlayer(player));
    }

    for event in quality_events {
        world.send_event(event);
    }
    for event in amount_events {
        world.send_event(event);
    }
    for event in state_events {
        world.send_event(event);
    }
    Ok(report)
}

fn tally(report: &mut RestockReport, asset: &ItemAsset, applied: SlotCorrections) {
    if applied.contains(SlotCorrections::QUALITY) {
        report.quality_fixes += 1;
    }
    if applied.contains(SlotCorrections::BARREL) {
        report.barrel_fixes += 1;
    }
    if applied.contains(SlotCorrections::GUN_AMMO) {
        report.gun_refills += 1;
    }
    if applied.contains(SlotCorrections::AMOUNT) {
        match classify(asset) {
            ItemClass::Magazine => report.magazine_refills += 1,
            _ => report.ammo_refills += 1,
        }
    }
}
