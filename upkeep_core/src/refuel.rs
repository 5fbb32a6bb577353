use bevy::prelude::*;
use tracing::{debug, warn};

use crate::{
    assets::{AssetCatalog, VehicleAsset},
    components::{Connected, InVehicle, Player, PlayerId, Vehicle},
    config::UpkeepConfigHandle,
    registry::RefuelRegistry,
    service::{ForceError, RefuelMonitor},
    sync::VehicleFuelUpdate,
};

/// True when the occupied vehicle burns fuel, is not a wreck, and its fuel
/// level sits at or below the threshold percentage of capacity.
pub fn vehicle_needs_fuel(vehicle: &Vehicle, asset: &VehicleAsset, threshold: u8) -> bool {
    if !asset.uses_fuel || vehicle.exploded {
        return false;
    }
    u32::from(vehicle.fuel) * 100 <= u32::from(threshold) * u32::from(asset.fuel)
}

/// Restore fuel to capacity. Reports whether a correction was applied;
/// wrecks, fuel-less vehicles, and full tanks are left untouched.
pub fn refuel_vehicle(vehicle: &mut Vehicle, asset: &VehicleAsset) -> bool {
    if !asset.uses_fuel || vehicle.exploded || vehicle.fuel >= asset.fuel {
        return false;
    }
    vehicle.fuel = asset.fuel;
    true
}

/// Periodic auto-refuel scan over connected players.
#[allow(clippy::too_many_arguments)]
pub fn monitor_auto_refuel(
    time: Res<Time>,
    config: Res<UpkeepConfigHandle>,
    mut monitor: ResMut<RefuelMonitor>,
    registry: Res<RefuelRegistry>,
    catalog: Res<AssetCatalog>,
    riders: Query<(&Player, &InVehicle), With<Connected>>,
    mut vehicles: Query<&mut Vehicle>,
    mut updates: EventWriter<VehicleFuelUpdate>,
) {
    let cfg = config.get();
    let section = cfg.refuel();
    if !monitor.0.should_scan(time.delta(), section.check_interval()) {
        return;
    }

    for (player, riding) in riders.iter() {
        if !registry.0.is_enabled(player.id) {
            continue;
        }
        let mut vehicle = match vehicles.get_mut(riding.vehicle) {
            Ok(vehicle) => vehicle,
            Err(_) => {
                warn!(
                    target: "ashfall::upkeep",
                    player = %player.id,
                    "refuel.scan_skipped=vehicle_missing"
                );
                continue;
            }
        };
        let Some(asset) = catalog.vehicle(vehicle.asset) else {
            continue;
        };
        if !vehicle_needs_fuel(&vehicle, asset, section.threshold()) {
            continue;
        }
        if refuel_vehicle(&mut vehicle, asset) {
            updates.send(VehicleFuelUpdate {
                vehicle: riding.vehicle,
                fuel: vehicle.fuel,
            });
            debug!(
                target: "ashfall::upkeep",
                player = %player.id,
                vehicle = %asset.name,
                "refuel.applied"
            );
        }
    }
}

/// Synchronous refuel of the vehicle `player` occupies, ignoring thresholds
/// and the opt-in flag. Returns whether a correction was applied.
pub fn force_refuel(world: &mut World, player: PlayerId) -> Result<bool, ForceError> {
    let vehicle_entity = occupied_vehicle(world, player)?;

    let applied = world.resource_scope(|world, catalog: Mut<AssetCatalog>| {
        let Some(mut vehicle) = world.get_mut::<Vehicle>(vehicle_entity) else {
            return Err(ForceError::NotInVehicle(player));
        };
        let Some(asset) = catalog.vehicle(vehicle.asset) else {
            return Ok(false);
        };
        Ok(refuel_vehicle(&mut vehicle, asset))
    })?;

    if applied {
        let fuel = world
            .get::<Vehicle>(vehicle_entity)
            .map(|vehicle| vehicle.fuel)
            .unwrap_or_default();
        world.send_event(VehicleFuelUpdate {
            vehicle: vehicle_entity,
            fuel,
        });
    }
    Ok(applied)
}

pub(crate) fn occupied_vehicle(
    world: &mut World,
    player: PlayerId,
) -> Result<Entity, ForceError> {
    let mut players = world.query::<(&Player, Option<&InVehicle>)>();
    for (candidate, riding) in players.iter(world) {
        if candidate.id == player {
            return riding
                .map(|riding| riding.vehicle)
                .ok_or(ForceError::NotInVehicle(player));
        }
    }
    Err(ForceError::UnknownPlayer(player))
}
