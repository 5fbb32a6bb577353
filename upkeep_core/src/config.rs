use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use bevy::prelude::Resource;
use serde::Deserialize;
use thiserror::Error;

pub const BUILTIN_UPKEEP_CONFIG: &str = include_str!("data/upkeep_config.json");

/// Environment variable naming an override config file.
pub const UPKEEP_CONFIG_ENV: &str = "UPKEEP_CONFIG_PATH";

/// Tunables for the three upkeep services. Sections deserialize with
/// per-field defaults so partial override files stay valid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpkeepConfig {
    refuel: RefuelSection,
    vehicle_repair: VehicleRepairSection,
    item_upkeep: ItemUpkeepSection,
}

impl UpkeepConfig {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            serde_json::from_str(BUILTIN_UPKEEP_CONFIG)
                .expect("builtin upkeep config should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, UpkeepConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|source| UpkeepConfigError::ReadFailed {
                path: path.to_path_buf(),
                source,
            })?;
        let config = UpkeepConfig::from_json_str(&contents)?;
        Ok(config)
    }

    pub fn refuel(&self) -> &RefuelSection {
        &self.refuel
    }

    pub fn vehicle_repair(&self) -> &VehicleRepairSection {
        &self.vehicle_repair
    }

    pub fn item_upkeep(&self) -> &ItemUpkeepSection {
        &self.item_upkeep
    }
}

#[derive(Debug, Error)]
pub enum UpkeepConfigError {
    #[error("failed to parse upkeep config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read upkeep config from {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RefuelSection {
    threshold: u8,
    check_interval_ms: u64,
}

impl RefuelSection {
    /// Percentage (0-100) at or below which a tank is topped up.
    pub fn threshold(&self) -> u8 {
        self.threshold.min(100)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms.max(1))
    }
}

impl Default for RefuelSection {
    fn default() -> Self {
        Self {
            threshold: 80,
            check_interval_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VehicleRepairSection {
    threshold: u8,
    check_interval_ms: u64,
}

impl VehicleRepairSection {
    /// Percentage (0-100) at or below which a hull is repaired.
    pub fn threshold(&self) -> u8 {
        self.threshold.min(100)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms.max(1))
    }
}

impl Default for VehicleRepairSection {
    fn default() -> Self {
        Self {
            threshold: 90,
            check_interval_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ItemUpkeepSection {
    quality_threshold: u8,
    ammo_threshold: u8,
    gun_ammo_threshold: u8,
    default_magazine_capacity: u8,
    barrel_magazine_capacity: u8,
    check_interval_ms: u64,
}

impl ItemUpkeepSection {
    pub fn quality_threshold(&self) -> u8 {
        self.quality_threshold.min(100)
    }

    pub fn ammo_threshold(&self) -> u8 {
        self.ammo_threshold.min(100)
    }

    pub fn gun_ammo_threshold(&self) -> u8 {
        self.gun_ammo_threshold.min(100)
    }

    pub fn default_magazine_capacity(&self) -> u8 {
        self.default_magazine_capacity
    }

    pub fn barrel_magazine_capacity(&self) -> u8 {
        self.barrel_magazine_capacity
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms.max(1))
    }
}

impl Default for ItemUpkeepSection {
    fn default() -> Self {
        Self {
            quality_threshold: 90,
            ammo_threshold: 80,
            gun_ammo_threshold: 80,
            default_magazine_capacity: 30,
            barrel_magazine_capacity: 50,
            check_interval_ms: 5_000,
        }
    }
}

#[derive(Resource, Debug, Clone)]
pub struct UpkeepConfigHandle(pub Arc<UpkeepConfig>);

impl UpkeepConfigHandle {
    pub fn new(config: Arc<UpkeepConfig>) -> Self {
        Self(config)
    }

    pub fn get(&self) -> Arc<UpkeepConfig> {
        Arc::clone(&self.0)
    }

    pub fn config(&self) -> &UpkeepConfig {
        &self.0
    }

    pub fn replace(&mut self, config: Arc<UpkeepConfig>) {
        self.0 = config;
    }
}

#[derive(Resource, Debug, Clone)]
pub struct UpkeepConfigMetadata {
    path: Option<PathBuf>,
}

impl UpkeepConfigMetadata {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

/// Load the upkeep config from `UPKEEP_CONFIG_PATH` if set, otherwise from
/// the crate's builtin file, falling back to the compiled-in defaults when
/// no candidate parses.
pub fn load_upkeep_config_from_env() -> (Arc<UpkeepConfig>, UpkeepConfigMetadata) {
    let override_path = env::var(UPKEEP_CONFIG_ENV).ok().map(PathBuf::from);
    let default_path =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src/data/upkeep_config.json");

    let candidates: Vec<PathBuf> = match override_path {
        Some(ref path) => vec![path.clone()],
        None => vec![default_path.clone()],
    };

    for path in candidates {
        match UpkeepConfig::from_file(&path) {
            Ok(config) => {
                tracing::info!(
                    target: "ashfall::config",
                    path = %path.display(),
                    "upkeep_config.loaded=file"
                );
                return (Arc::new(config), UpkeepConfigMetadata::new(Some(path)));
            }
            Err(err) => {
                tracing::warn!(
                    target: "ashfall::config",
                    path = %path.display(),
                    error = %err,
                    "upkeep_config.load_failed"
                );
            }
        }
    }

    let config = UpkeepConfig::builtin();
    tracing::info!(
        target: "ashfall::config",
        "upkeep_config.loaded=builtin"
    );
    (config, UpkeepConfigMetadata::new(None))
}
