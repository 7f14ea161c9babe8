//! Run settings and physics tuning
//!
//! Stored as JSON. Every field has a default, so partial files are fine.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::softbody::{Bounds, PhysicsParams};
use crate::upgrades::UpgradeLevels;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Soft-body quality levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Spring relaxation passes per physics step
    pub fn solver_iterations(&self) -> u32 {
        match self {
            QualityPreset::Low => 2,
            QualityPreset::Medium => 3,
            QualityPreset::High => 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub quality: QualityPreset,
    pub physics: PhysicsParams,
    /// Run the soft-body layer at all
    pub soft_bodies: bool,
    /// Override for the vertex clamp rectangle
    pub bounds: Option<Bounds>,
    /// Cumulative score banked before this run (sets rank and palette)
    pub starting_score: u64,
    /// Fixed run seed; random when absent
    pub seed: Option<u64>,
    /// Purchased upgrade levels
    pub upgrades: UpgradeLevels,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            physics: PhysicsParams::default(),
            soft_bodies: true,
            bounds: None,
            starting_score: 0,
            seed: None,
            upgrades: UpgradeLevels::new(),
        }
    }
}

impl Settings {
    pub fn from_preset(preset: QualityPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    pub fn apply_preset(&mut self, preset: QualityPreset) {
        self.quality = preset;
        self.physics.iterations = preset.solver_iterations();
    }

    pub fn physics_bounds(&self) -> Bounds {
        self.bounds.unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read settings from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            log::info!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let settings = Self::from_json(&std::fs::read_to_string(path)?)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        std::fs::write(path, self.to_json()?)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{ "physics": { "pressure": 8.0 }, "seed": 4 }"#).unwrap();
        assert_eq!(settings.physics.pressure, 8.0);
        assert_eq!(settings.physics.damping, PhysicsParams::default().damping);
        assert_eq!(settings.seed, Some(4));
        assert!(settings.soft_bodies);
    }

    #[test]
    fn test_upgrade_levels_from_json() {
        use crate::upgrades::UpgradeId;
        let settings = Settings::from_json(r#"{ "upgrades": { "HeatSink": 3 } }"#).unwrap();
        assert_eq!(settings.upgrades.get(&UpgradeId::HeatSink), Some(&3));
        assert!(Settings::from_json(r#"{ "upgrades": { "Turbo": 1 } }"#).is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let mut settings = Settings::from_preset(QualityPreset::High);
        settings.starting_score = 12_000;
        let back = Settings::from_json(&settings.to_json().unwrap()).unwrap();
        assert_eq!(back, settings);
        assert_eq!(back.physics.iterations, 5);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(matches!(Settings::from_json("{ nope"), Err(SettingsError::Json(_))));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("goop-tank-settings-does-not-exist.json");
        assert_eq!(Settings::load(&path).unwrap(), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("goop-tank-settings-{}.json", std::process::id()));
        let settings = Settings::from_preset(QualityPreset::Low);
        settings.save(&path).unwrap();
        let loaded = Settings::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!(QualityPreset::parse("MED"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::parse("ultra"), None);
        assert_eq!(QualityPreset::High.as_str(), "High");
    }
}
