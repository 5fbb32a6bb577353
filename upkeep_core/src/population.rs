use bevy::prelude::*;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use tracing::info;

use crate::{
    assets::{classify, AssetCatalog, ItemAsset, ItemClass},
    components::{Connected, InVehicle, Inventory, ItemSlot, Player, PlayerId, Vehicle},
    item_upkeep::{BARREL_ID_OFFSET, BARREL_WEAR_OFFSET, MAGAZINE_AMMO_OFFSET, WEAPON_STATE_LEN},
};

pub const DEMO_POPULATION: u64 = 4;
pub const DEMO_SEED: u64 = 0xA5_11FA_11;

const BASE_PLAYER_ID: u64 = 76_561_198_000_000_001;
const DEMO_BARREL_ID: u16 = 77;

/// Spawn a deterministic population of connected players with partly worn
/// vehicles and inventories, so the server has something to reconcile.
pub fn spawn_demo_population(mut commands: Commands, catalog: Res<AssetCatalog>) {
    let mut rng = SmallRng::seed_from_u64(DEMO_SEED);
    let vehicle_ids = catalog.vehicle_ids();
    let item_ids = catalog.item_ids();

    for index in 0..DEMO_POPULATION {
        let id = PlayerId(BASE_PLAYER_ID + index);

        let slot_count = rng.gen_range(3..=6);
        let mut slots = Vec::with_capacity(slot_count);
        for _ in 0..slot_count {
            let item_id = item_ids[rng.gen_range(0..item_ids.len())];
            if let Some(asset) = catalog.item(item_id) {
                slots.push(rolled_slot(asset, &mut rng));
            }
        }

        let riding = (index as usize) < vehicle_ids.len() && index + 1 < DEMO_POPULATION;
        let vehicle = if riding {
            let asset_id = vehicle_ids[index as usize];
            catalog.vehicle(asset_id).map(|asset| {
                let fuel = if asset.fuel > 0 {
                    rng.gen_range(0..=asset.fuel)
                } else {
                    0
                };
                let health = rng.gen_range(asset.health / 4..=asset.health);
                commands
                    .spawn(Vehicle {
                        asset: asset_id,
                        fuel,
                        health,
                        exploded: false,
                    })
                    .id()
            })
        } else {
            None
        };

        let mut entity = commands.spawn((
            Player { id },
            Connected,
            Inventory::with_slots(slots),
        ));
        if let Some(vehicle) = vehicle {
            entity.insert(InVehicle { vehicle });
        }

        info!(
            target: "ashfall::analytics",
            event = "player_spawn",
            player = %id,
            slots = slot_count,
            riding,
        );
    }
}

fn rolled_slot(asset: &ItemAsset, rng: &mut SmallRng) -> ItemSlot {
    match classify(asset) {
        ItemClass::Gun => {
            let mut state = vec![0u8; WEAPON_STATE_LEN];
            state[MAGAZINE_AMMO_OFFSET] = rng.gen_range(0..=25);
            if asset.has_barrel {
                state[BARREL_ID_OFFSET..BARREL_ID_OFFSET + 2]
                    .copy_from_slice(&DEMO_BARREL_ID.to_le_bytes());
                state[BARREL_WEAR_OFFSET] = rng.gen_range(20..=100);
            }
            ItemSlot::new(asset.id, 1, rng.gen_range(40..=100), state)
        }
        ItemClass::Magazine => {
            let held = rng.gen_range(0..=asset.amount);
            let mut state = vec![0u8; WEAPON_STATE_LEN];
            state[MAGAZINE_AMMO_OFFSET] = held;
            ItemSlot::new(asset.id, held, rng.gen_range(60..=100), state)
        }
        ItemClass::Ammo => {
            let held = rng.gen_range(0..=asset.amount);
            ItemSlot::new(asset.id, held, 100, Vec::new())
        }
        ItemClass::Other => ItemSlot::new(asset.id, 1, rng.gen_range(30..=100), Vec::new()),
    }
}
