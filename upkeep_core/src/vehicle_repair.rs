use bevy::prelude::*;
use tracing::{debug, warn};

use crate::{
    assets::{AssetCatalog, VehicleAsset},
    components::{Connected, InVehicle, Player, PlayerId, Vehicle},
    config::UpkeepConfigHandle,
    refuel::occupied_vehicle,
    registry::VehicleRepairRegistry,
    service::{ForceError, VehicleRepairMonitor},
    sync::VehicleHealthUpdate,
};

/// True when the occupied vehicle is not a wreck and its health sits at or
/// below the threshold percentage of its maximum.
pub fn vehicle_needs_repair(vehicle: &Vehicle, asset: &VehicleAsset, threshold: u8) -> bool {
    if vehicle.exploded {
        return false;
    }
    u32::from(vehicle.health) * 100 <= u32::from(threshold) * u32::from(asset.health)
}

/// Restore health to maximum. Reports whether a correction was applied;
/// wrecks and undamaged vehicles are left untouched.
pub fn repair_vehicle(vehicle: &mut Vehicle, asset: &VehicleAsset) -> bool {
    if vehicle.exploded || vehicle.health >= asset.health {
        return false;
    }
    vehicle.health = asset.health;
    true
}

/// Periodic auto-repair scan over connected players.
#[allow(clippy::too_many_arguments)]
pub fn monitor_auto_repair(
    time: Res<Time>,
    config: Res<UpkeepConfigHandle>,
    mut monitor: ResMut<VehicleRepairMonitor>,
    registry: Res<VehicleRepairRegistry>,
    catalog: Res<AssetCatalog>,
    riders: Query<(&Player, &InVehicle), With<Connected>>,
    mut vehicles: Query<&mut Vehicle>,
    mut updates: EventWriter<VehicleHealthUpdate>,
) {
    let cfg = config.get();
    let section = cfg.vehicle_repair();
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
                    "vehicle_repair.scan_skipped=vehicle_missing"
                );
                continue;
            }
        };
        let Some(asset) = catalog.vehicle(vehicle.asset) else {
            continue;
        };
        if !vehicle_needs_repair(&vehicle, asset, section.threshold()) {
            continue;
        }
        if repair_vehicle(&mut vehicle, asset) {
            updates.send(VehicleHealthUpdate {
                vehicle: riding.vehicle,
                health: vehicle.health,
            });
            debug!(
                target: "ashfall::upkeep",
                player = %player.id,
                vehicle = %asset.name,
                "vehicle_repair.applied"
            );
        }
    }
}

/// Synchronous repair of the vehicle `player` occupies, ignoring thresholds
/// and the opt-in flag. Returns whether a correction was applied.
pub fn force_repair_vehicle(world: &mut World, player: PlayerId) -> Result<bool, ForceError> {
    let vehicle_entity = occupied_vehicle(world, player)?;

    let applied = world.resource_scope(|world, catalog: Mut<AssetCatalog>| {
        let Some(mut vehicle) = world.get_mut::<Vehicle>(vehicle_entity) else {
            return Err(ForceError::NotInVehicle(player));
        };
        let Some(asset) = catalog.vehicle(vehicle.asset) else {
            return Ok(false);
        };
        Ok(repair_vehicle(&mut vehicle, asset))
    })?;

    if applied {
        let health = world
            .get::<Vehicle>(vehicle_entity)
            .map(|vehicle| vehicle.health)
            .unwrap_or_default();
        world.send_event(VehicleHealthUpdate {
            vehicle: vehicle_entity,
            health,
        });
    }
    Ok(applied)
}
