use bevy::prelude::*;

use upkeep_core::assets::{ItemAssetId, VehicleAssetId};
use upkeep_core::sync::{
    ItemAmountUpdate, ItemQualityUpdate, ItemStateUpdate, PushRecord, SyncOutbox,
    VehicleFuelUpdate, VehicleHealthUpdate,
};
use upkeep_core::{
    build_headless_app, Connected, InVehicle, Inventory, ItemSlot, ItemUpkeepMonitor,
    ItemUpkeepRegistry, Player, PlayerId, RefuelMonitor, RefuelRegistry, Vehicle,
    VehicleRepairMonitor, VehicleRepairRegistry,
};

const BUGGY: VehicleAssetId = VehicleAssetId(201);
const MAGAZINE: ItemAssetId = ItemAssetId(110);
const HATCHET: ItemAssetId = ItemAssetId(131);

fn spawn_rider(app: &mut App, id: u64, fuel: u16, health: u16, exploded: bool) -> (Entity, Entity) {
    let vehicle = app
        .world
        .spawn(Vehicle {
            asset: BUGGY,
            fuel,
            health,
            exploded,
        })
        .id();
    let player = app
        .world
        .spawn((Player { id: PlayerId(id) }, Connected, InVehicle { vehicle }))
        .id();
    (player, vehicle)
}

fn drain_events<T: Event + Clone>(app: &App) -> Vec<T> {
    let events = app.world.resource::<Events<T>>();
    let mut reader = events.get_reader();
    reader.read(events).cloned().collect()
}

fn drain_outbox(app: &mut App) -> Vec<PushRecord> {
    app.world.resource_mut::<SyncOutbox>().drain()
}

fn rearm_refuel(app: &mut App) {
    let mut monitor = app.world.resource_mut::<RefuelMonitor>();
    monitor.0.stop();
    monitor.0.start();
}

fn rearm_item_upkeep(app: &mut App) {
    let mut monitor = app.world.resource_mut::<ItemUpkeepMonitor>();
    monitor.0.stop();
    monitor.0.start();
}

#[test]
fn auto_refuel_corrects_low_tank_and_pushes_once() {
    let mut app = build_headless_app();
    let (_, vehicle) = spawn_rider(&mut app, 1, 40, 400, false);
    app.world
        .resource::<RefuelRegistry>()
        .0
        .enable(PlayerId(1));
    app.world.resource_mut::<RefuelMonitor>().0.start();

    app.update();

    assert_eq!(app.world.get::<Vehicle>(vehicle).unwrap().fuel, 100);
    let pushes = drain_events::<VehicleFuelUpdate>(&app);
    assert_eq!(pushes.len(), 1);
    assert_eq!(pushes[0].fuel, 100);
    assert_eq!(pushes[0].vehicle, vehicle);
}

#[test]
fn disabled_player_is_left_alone() {
    let mut app = build_headless_app();
    let (_, vehicle) = spawn_rider(&mut app, 2, 10, 400, false);
    app.world.resource_mut::<RefuelMonitor>().0.start();

    app.update();

    assert_eq!(app.world.get::<Vehicle>(vehicle).unwrap().fuel, 10);
    assert!(drain_events::<VehicleFuelUpdate>(&app).is_empty());
}

#[test]
fn wrecked_vehicle_is_never_touched() {
    let mut app = build_headless_app();
    let (_, vehicle) = spawn_rider(&mut app, 3, 5, 20, true);
    app.world
        .resource::<RefuelRegistry>()
        .0
        .enable(PlayerId(3));
    app.world
        .resource::<VehicleRepairRegistry>()
        .0
        .enable(PlayerId(3));
    app.world.resource_mut::<RefuelMonitor>().0.start();
    app.world.resource_mut::<VehicleRepairMonitor>().0.start();

    app.update();

    let wreck = app.world.get::<Vehicle>(vehicle).unwrap();
    assert_eq!(wreck.fuel, 5);
    assert_eq!(wreck.health, 20);
    assert!(drain_events::<VehicleFuelUpdate>(&app).is_empty());
    assert!(drain_events::<VehicleHealthUpdate>(&app).is_empty());
}

#[test]
fn auto_repair_restores_health_and_pushes_once() {
    let mut app = build_headless_app();
    let (_, vehicle) = spawn_rider(&mut app, 4, 100, 120, false);
    app.world
        .resource::<VehicleRepairRegistry>()
        .0
        .enable(PlayerId(4));
    app.world.resource_mut::<VehicleRepairMonitor>().0.start();

    app.update();

    assert_eq!(app.world.get::<Vehicle>(vehicle).unwrap().health, 400);
    let pushes = drain_events::<VehicleHealthUpdate>(&app);
    assert_eq!(pushes.len(), 1);
    assert_eq!(pushes[0].health, 400);
}

#[test]
fn stopped_service_does_not_scan() {
    let mut app = build_headless_app();
    let (_, vehicle) = spawn_rider(&mut app, 5, 10, 400, false);
    app.world
        .resource::<RefuelRegistry>()
        .0
        .enable(PlayerId(5));

    app.update();

    assert_eq!(app.world.get::<Vehicle>(vehicle).unwrap().fuel, 10);
    assert!(drain_events::<VehicleFuelUpdate>(&app).is_empty());
}

#[test]
fn stop_takes_effect_before_the_next_scan() {
    let mut app = build_headless_app();
    let (_, vehicle) = spawn_rider(&mut app, 6, 40, 400, false);
    app.world
        .resource::<RefuelRegistry>()
        .0
        .enable(PlayerId(6));
    app.world.resource_mut::<RefuelMonitor>().0.start();

    app.update();
    assert_eq!(app.world.get::<Vehicle>(vehicle).unwrap().fuel, 100);

    app.world.resource_mut::<RefuelMonitor>().0.stop();
    app.world.get_mut::<Vehicle>(vehicle).unwrap().fuel = 10;

    app.update();
    assert_eq!(app.world.get::<Vehicle>(vehicle).unwrap().fuel, 10);
}

#[test]
fn registry_survives_stop_and_restart() {
    let mut app = build_headless_app();
    let (_, vehicle) = spawn_rider(&mut app, 7, 100, 400, false);
    app.world
        .resource::<RefuelRegistry>()
        .0
        .enable(PlayerId(7));
    app.world.resource_mut::<RefuelMonitor>().0.start();
    app.update();

    app.world.resource_mut::<RefuelMonitor>().0.stop();
    app.world.get_mut::<Vehicle>(vehicle).unwrap().fuel = 15;
    app.world.resource_mut::<RefuelMonitor>().0.start();

    app.update();
    assert_eq!(app.world.get::<Vehicle>(vehicle).unwrap().fuel, 100);
}

#[test]
fn item_upkeep_corrects_enabled_player_slots() {
    let mut app = build_headless_app();
    let mut magazine_state = vec![0u8; 18];
    magazine_state[0] = 75;
    app.world.spawn((
        Player { id: PlayerId(8) },
        Connected,
        Inventory::with_slots(vec![
            ItemSlot::new(MAGAZINE, 10, 100, magazine_state),
            ItemSlot::new(HATCHET, 1, 60, Vec::new()),
        ]),
    ));
    app.world
        .resource::<ItemUpkeepRegistry>()
        .0
        .enable(PlayerId(8));
    app.world.resource_mut::<ItemUpkeepMonitor>().0.start();

    app.update();

    let amounts = drain_events::<ItemAmountUpdate>(&app);
    let states = drain_events::<ItemStateUpdate>(&app);
    let qualities = drain_events::<ItemQualityUpdate>(&app);
    assert_eq!(amounts.len(), 1);
    assert_eq!(amounts[0].amount, 30);
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].state[0], 30);
    assert_eq!(qualities.len(), 1);
    assert_eq!(qualities[0].quality, 100);
    assert_eq!(qualities[0].slot, 1);
}

#[test]
fn second_pass_makes_no_further_corrections() {
    let mut app = build_headless_app();
    spawn_rider(&mut app, 9, 40, 400, false);
    app.world.spawn((
        Player { id: PlayerId(13) },
        Connected,
        Inventory::with_slots(vec![ItemSlot::new(HATCHET, 1, 50, Vec::new())]),
    ));
    app.world
        .resource::<RefuelRegistry>()
        .0
        .enable(PlayerId(9));
    app.world
        .resource::<ItemUpkeepRegistry>()
        .0
        .enable(PlayerId(13));
    app.world.resource_mut::<RefuelMonitor>().0.start();
    app.world.resource_mut::<ItemUpkeepMonitor>().0.start();

    app.update();
    let first = drain_outbox(&mut app);
    assert!(!first.is_empty());

    rearm_refuel(&mut app);
    rearm_item_upkeep(&mut app);
    app.update();
    let second = drain_outbox(&mut app);
    assert!(second.is_empty(), "second pass pushed {second:?}");
}

#[test]
fn unknown_vehicle_asset_is_skipped() {
    let mut app = build_headless_app();
    let vehicle = app
        .world
        .spawn(Vehicle {
            asset: VehicleAssetId(999),
            fuel: 1,
            health: 1,
            exploded: false,
        })
        .id();
    app.world
        .spawn((Player { id: PlayerId(10) }, Connected, InVehicle { vehicle }));
    app.world
        .resource::<RefuelRegistry>()
        .0
        .enable(PlayerId(10));
    app.world.resource_mut::<RefuelMonitor>().0.start();

    app.update();

    assert_eq!(app.world.get::<Vehicle>(vehicle).unwrap().fuel, 1);
    assert!(drain_events::<VehicleFuelUpdate>(&app).is_empty());
}

#[test]
fn missing_vehicle_entity_is_isolated_to_one_player() {
    let mut app = build_headless_app();
    let ghost = app.world.spawn_empty().id();
    app.world.despawn(ghost);
    app.world.spawn((
        Player { id: PlayerId(11) },
        Connected,
        InVehicle { vehicle: ghost },
    ));
    let (_, vehicle) = spawn_rider(&mut app, 12, 40, 400, false);
    let registry = app.world.resource::<RefuelRegistry>().0.clone();
    registry.enable(PlayerId(11));
    registry.enable(PlayerId(12));
    app.world.resource_mut::<RefuelMonitor>().0.start();

    app.update();

    assert_eq!(app.world.get::<Vehicle>(vehicle).unwrap().fuel, 100);
    assert_eq!(drain_events::<VehicleFuelUpdate>(&app).len(), 1);
}
