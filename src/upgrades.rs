//! Upgrade catalogue
//!
//! Passive upgrades soften the tank's complications. A run carries the
//! purchased level of each; effects scale linearly up to the max level.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sim::complications::ComplicationKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UpgradeId {
    /// Less capacitor drain per popped unit
    CapacitorEfficiency,
    /// Lower lights trigger chance
    CircuitStabilizer,
    /// Faster heat dissipation while idle
    HeatSink,
}

/// Purchased level per upgrade; missing entries are level 0
pub type UpgradeLevels = BTreeMap<UpgradeId, u32>;

/// Static description of one upgrade
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpgradeInfo {
    pub id: UpgradeId,
    pub name: &'static str,
    pub unlock_rank: u32,
    pub max_level: u32,
    pub effect_per_level: f32,
    pub complication: ComplicationKind,
}

impl UpgradeId {
    pub const ALL: [Self; 3] = [Self::CapacitorEfficiency, Self::CircuitStabilizer, Self::HeatSink];

    pub fn info(self) -> UpgradeInfo {
        let (name, unlock_rank, effect_per_level, complication) = match self {
            Self::CapacitorEfficiency => ("CAPACITOR EFFICIENCY", 1, 0.05, ComplicationKind::Laser),
            Self::CircuitStabilizer => ("CIRCUIT STABILIZER", 2, 0.06, ComplicationKind::Lights),
            Self::HeatSink => ("HEAT SINK UPGRADE", 3, 0.10, ComplicationKind::Controls),
        };
        UpgradeInfo {
            id: self,
            name,
            unlock_rank,
            max_level: 5,
            effect_per_level,
            complication,
        }
    }

    /// Total effect at `level`, clamped to the upgrade's max level
    pub fn effect_at(self, level: u32) -> f32 {
        let info = self.info();
        level.min(info.max_level) as f32 * info.effect_per_level
    }
}

/// Effect of `id` at the level recorded in `levels`
pub fn upgrade_effect(levels: &UpgradeLevels, id: UpgradeId) -> f32 {
    id.effect_at(levels.get(&id).copied().unwrap_or(0))
}

/// Upgrades that become available exactly at `rank`
pub fn upgrades_unlocked_at_rank(rank: u32) -> Vec<UpgradeId> {
    UpgradeId::ALL
        .into_iter()
        .filter(|u| u.info().unlock_rank == rank)
        .collect()
}

/// Upgrades available at or below `rank`
pub fn upgrades_available_at_rank(rank: u32) -> Vec<UpgradeId> {
    UpgradeId::ALL
        .into_iter()
        .filter(|u| u.info().unlock_rank <= rank)
        .collect()
}
