mod common;

use std::time::Duration;

use upkeep_core::build_headless_app;
use upkeep_core::config::{UpkeepConfigHandle, UpkeepConfigMetadata};

#[test]
fn app_initializes() {
    common::ensure_test_config();
    let mut app = build_headless_app();
    // run a single update tick to ensure the schedule executes without panic
    app.update();
}

#[test]
fn fixture_config_overrides_the_builtin() {
    common::ensure_test_config();
    let app = build_headless_app();

    let handle = app.world.resource::<UpkeepConfigHandle>();
    assert_eq!(
        handle.config().refuel().check_interval(),
        Duration::from_millis(100)
    );
    assert_eq!(handle.config().vehicle_repair().threshold(), 90);

    let metadata = app.world.resource::<UpkeepConfigMetadata>();
    assert!(metadata.path().is_some());
}
