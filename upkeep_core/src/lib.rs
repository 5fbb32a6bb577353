//! Core upkeep crate for the Ashfall headless server prototype.
//!
//! Provides the per-player maintenance services (auto-refuel,
//! auto-vehicle-repair, item upkeep) that reconcile mutable world state back
//! to asset maxima whenever the schedule built by [`build_headless_app`]
//! runs. Every correction emits a push event so observers stay in sync.

pub mod assets;
mod components;
pub mod config;
pub mod item_upkeep;
pub mod network;
pub mod population;
pub mod refuel;
mod registry;
mod service;
pub mod sync;
pub mod telemetry;
pub mod vehicle_repair;

use bevy::prelude::*;

pub use components::{Connected, InVehicle, Inventory, ItemSlot, Player, PlayerId, Vehicle};
pub use registry::{ItemUpkeepRegistry, RefuelRegistry, ToggleRegistry, VehicleRepairRegistry};
pub use service::{
    ForceError, ItemUpkeepMonitor, RefuelMonitor, ServiceDirectory, ServiceKind, ServiceRunner,
    ServiceStatus, ServiceUnavailable, UpkeepHandle, VehicleRepairMonitor, DEFAULT_CHECK_INTERVAL,
};
pub use telemetry::{UpkeepTelemetry, WorldTick};

/// Construct a Bevy [`App`] configured with the Ashfall upkeep pipeline.
///
/// Monitors are inserted Stopped; call [`start_all_services`] (or start them
/// individually) before driving the schedule. The world itself starts empty —
/// the server binary seeds a demo population, tests spawn their own fixtures.
pub fn build_headless_app() -> App {
    let mut app = App::new();

    let (config, metadata) = config::load_upkeep_config_from_env();

    app.insert_resource(config::UpkeepConfigHandle::new(config))
        .insert_resource(metadata)
        .insert_resource(assets::AssetCatalog::builtin())
        .insert_resource(WorldTick::default())
        .insert_resource(UpkeepTelemetry::default())
        .insert_resource(sync::SyncOutbox::default())
        .insert_resource(RefuelRegistry::default())
        .insert_resource(VehicleRepairRegistry::default())
        .insert_resource(ItemUpkeepRegistry::default())
        .insert_resource(RefuelMonitor::default())
        .insert_resource(VehicleRepairMonitor::default())
        .insert_resource(ItemUpkeepMonitor::default())
        .add_plugins(MinimalPlugins)
        .add_event::<sync::VehicleFuelUpdate>()
        .add_event::<sync::VehicleHealthUpdate>()
        .add_event::<sync::ItemQualityUpdate>()
        .add_event::<sync::ItemAmountUpdate>()
        .add_event::<sync::ItemStateUpdate>()
        .add_systems(
            Update,
            (
                refuel::monitor_auto_refuel,
                vehicle_repair::monitor_auto_repair,
                item_upkeep::monitor_item_upkeep,
                telemetry::advance_tick,
                sync::collect_push_records,
            )
                .chain(),
        );

    app
}

/// Bind one toggle handle per service kind, sharing the app's registries.
/// The returned directory is the command layer's only route to the services.
pub fn wire_service_directory(world: &World) -> ServiceDirectory {
    let mut directory = ServiceDirectory::default();
    directory.bind(UpkeepHandle::new(
        ServiceKind::Refuel,
        world.resource::<RefuelRegistry>().0.clone(),
    ));
    directory.bind(UpkeepHandle::new(
        ServiceKind::VehicleRepair,
        world.resource::<VehicleRepairRegistry>().0.clone(),
    ));
    directory.bind(UpkeepHandle::new(
        ServiceKind::ItemUpkeep,
        world.resource::<ItemUpkeepRegistry>().0.clone(),
    ));
    directory
}

/// Start all three monitors. Registries keep their state, so restarting a
/// stopped service resumes with the same opt-in population.
pub fn start_all_services(world: &mut World) {
    world.resource_mut::<RefuelMonitor>().0.start();
    world.resource_mut::<VehicleRepairMonitor>().0.start();
    world.resource_mut::<ItemUpkeepMonitor>().0.start();
}

/// Stop all three monitors after their current pass.
pub fn stop_all_services(world: &mut World) {
    world.resource_mut::<RefuelMonitor>().0.stop();
    world.resource_mut::<VehicleRepairMonitor>().0.stop();
    world.resource_mut::<ItemUpkeepMonitor>().0.stop();
}
