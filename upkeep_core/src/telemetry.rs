use bevy::prelude::*;

/// Total update ticks processed by the headless app.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldTick(pub u64);

pub fn advance_tick(mut tick: ResMut<WorldTick>) {
    tick.0 = tick.0.wrapping_add(1);
}

/// Running totals of push updates emitted by the upkeep services.
#[derive(Resource, Default, Debug, Clone)]
pub struct UpkeepTelemetry {
    pub fuel_pushes: u64,
    pub health_pushes: u64,
    pub quality_pushes: u64,
    pub amount_pushes: u64,
    pub state_pushes: u64,
}

impl UpkeepTelemetry {
    pub fn total(&self) -> u64 {
        self.fuel_pushes
            + self.health_pushes
            + self.quality_pushes
            + self.amount_pushes
            + self.state_pushes
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
