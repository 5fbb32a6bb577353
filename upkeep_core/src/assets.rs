use std::collections::HashMap;
use std::fmt;

use bevy::prelude::Resource;
use serde::Deserialize;

pub const BUILTIN_ASSET_CATALOG: &str = include_str!("data/asset_catalog.json");

/// Name fragments that mark an item as ammunition when its category alone
/// does not. Lowercase; matched as substrings of the lowercased asset name.
pub const AMMO_NAME_KEYWORDS: [&str; 9] = [
    "ammo", "magazine", "clip", "bullet", "shell", "arrow", "bolt", "dart", "pellet",
];

/// Identifier for a static item definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ItemAssetId(pub u16);

impl fmt::Display for ItemAssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a static vehicle definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct VehicleAssetId(pub u16);

impl fmt::Display for VehicleAssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse item category carried by the asset definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    Gun,
    Magazine,
    Supply,
    Medical,
    Melee,
    Other,
}

/// Static item definition. `amount` is the maximum the slot can hold:
/// rounds for ammunition and magazines, zero for items with no capacity.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemAsset {
    pub id: ItemAssetId,
    pub name: String,
    pub category: ItemCategory,
    #[serde(default)]
    pub amount: u8,
    #[serde(default)]
    pub has_barrel: bool,
}

/// Static vehicle definition.
#[derive(Debug, Clone, Deserialize)]
pub struct VehicleAsset {
    pub id: VehicleAssetId,
    pub name: String,
    pub fuel: u16,
    pub health: u16,
    pub uses_fuel: bool,
}

/// Upkeep-relevant classification of an item definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemClass {
    Ammo,
    Magazine,
    Gun,
    Other,
}

/// Classify an item definition for the upkeep predicates and correctors.
///
/// Guns are never ammunition. A magazine is anything of the magazine
/// category, or a supply item with positive capacity. Remaining supply items
/// and anything whose name carries an ammunition keyword count as loose
/// ammunition. The name heuristic is approximate by nature; keeping it in one
/// place keeps the approximation testable.
pub fn classify(asset: &ItemAsset) -> ItemClass {
    match asset.category {
        ItemCategory::Gun => ItemClass::Gun,
        ItemCategory::Magazine => ItemClass::Magazine,
        ItemCategory::Supply if asset.amount > 0 => ItemClass::Magazine,
        ItemCategory::Supply => ItemClass::Ammo,
        _ if matches_ammo_keywords(&asset.name) => ItemClass::Ammo,
        _ => ItemClass::Other,
    }
}

pub fn matches_ammo_keywords(name: &str) -> bool {
    let lowered = name.to_lowercase();
    AMMO_NAME_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogFile {
    items: Vec<ItemAsset>,
    vehicles: Vec<VehicleAsset>,
}

/// Read-only index of item and vehicle definitions.
#[derive(Resource, Debug, Clone, Default)]
pub struct AssetCatalog {
    items: HashMap<ItemAssetId, ItemAsset>,
    vehicles: HashMap<VehicleAssetId, VehicleAsset>,
}

impl AssetCatalog {
    pub fn builtin() -> Self {
        let file: CatalogFile = serde_json::from_str(BUILTIN_ASSET_CATALOG)
            .expect("builtin asset catalog should parse");
        Self::from_definitions(file.items, file.vehicles)
    }

    pub fn from_definitions(items: Vec<ItemAsset>, vehicles: Vec<VehicleAsset>) -> Self {
        Self {
            items: items.into_iter().map(|item| (item.id, item)).collect(),
            vehicles: vehicles
                .into_iter()
                .map(|vehicle| (vehicle.id, vehicle))
                .collect(),
        }
    }

    /// Look up an item definition. `None` marks the slot as not evaluable.
    pub fn item(&self, id: ItemAssetId) -> Option<&ItemAsset> {
        self.items.get(&id)
    }

    /// Look up a vehicle definition. `None` marks the vehicle as not evaluable.
    pub fn vehicle(&self, id: VehicleAssetId) -> Option<&VehicleAsset> {
        self.vehicles.get(&id)
    }

    pub fn item_ids(&self) -> Vec<ItemAssetId> {
        let mut ids: Vec<_> = self.items.keys().copied().collect();
        ids.sort_by_key(|id| id.0);
        ids
    }

    pub fn vehicle_ids(&self) -> Vec<VehicleAssetId> {
        let mut ids: Vec<_> = self.vehicles.keys().copied().collect();
        ids.sort_by_key(|id| id.0);
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str, category: ItemCategory, amount: u8) -> ItemAsset {
        ItemAsset {
            id: ItemAssetId(1),
            name: name.to_string(),
            category,
            amount,
            has_barrel: false,
        }
    }

    #[test]
    fn guns_are_never_ammunition() {
        let gun = asset("Nightraider", ItemCategory::Gun, 0);
        assert_eq!(classify(&gun), ItemClass::Gun);
    }

    #[test]
    fn magazine_category_classifies_as_magazine() {
        let magazine = asset("Military Magazine", ItemCategory::Magazine, 30);
        assert_eq!(classify(&magazine), ItemClass::Magazine);
    }

    #[test]
    fn supply_with_capacity_classifies_as_magazine() {
        let drum = asset("Box of Rounds", ItemCategory::Supply, 40);
        assert_eq!(classify(&drum), ItemClass::Magazine);
    }

    #[test]
    fn supply_without_capacity_classifies_as_ammunition() {
        let scrap = asset("Loose Supply", ItemCategory::Supply, 0);
        assert_eq!(classify(&scrap), ItemClass::Ammo);
    }

    #[test]
    fn every_name_keyword_classifies_as_ammunition() {
        for keyword in AMMO_NAME_KEYWORDS {
            let name = format!("Ranger {keyword}");
            let item = asset(&name, ItemCategory::Other, 12);
            assert_eq!(classify(&item), ItemClass::Ammo, "keyword {keyword}");
        }
    }

    #[test]
    fn keyword_matching_ignores_case() {
        let item = asset("CROSSBOW BOLT", ItemCategory::Other, 10);
        assert_eq!(classify(&item), ItemClass::Ammo);
    }

    #[test]
    fn plain_items_classify_as_other() {
        let bandage = asset("Field Dressing", ItemCategory::Medical, 1);
        assert_eq!(classify(&bandage), ItemClass::Other);
    }

    #[test]
    fn builtin_catalog_parses_and_resolves() {
        let catalog = AssetCatalog::builtin();
        assert!(!catalog.item_ids().is_empty());
        assert!(!catalog.vehicle_ids().is_empty());
        for id in catalog.item_ids() {
            assert!(catalog.item(id).is_some());
        }
    }
}
