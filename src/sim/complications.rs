//! Tank complications
//!
//! Each complication is fed by play: popping drains the laser capacitor,
//! rotating heats the controls, and a stack towering over the pressure line
//! can blow the lights. An unlocked complication that is off cooldown starts
//! when its meter trips and stays active until the player resolves it.
//! Resolving refills the meter and starts the cooldown.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComplicationKind {
    /// Popping is disabled until the laser is reset
    Laser,
    /// Lights out; no rule change, the view layer dims
    Lights,
    /// Rotation is disabled until the controls are reset
    Controls,
}

pub const CAPACITOR_MAX: f32 = 100.0;
/// Capacitor drain per popped unit
pub const DRAIN_PER_UNIT: f32 = 4.0;

pub const LIGHTS_TRIGGER_CHANCE: f32 = 0.20;
/// Rows the stack must stand above the pressure line (rolled per lock)
pub const PRESSURE_GAP_MIN: i32 = 3;
pub const PRESSURE_GAP_MAX: i32 = 5;

pub const HEAT_MAX: f32 = 100.0;
pub const HEAT_PER_ROTATION: f32 = 5.0;
/// Heat lost per idle second
pub const HEAT_DISSIPATION: f32 = 50.0;
/// Idle time before heat starts to fall (ms)
pub const IDLE_THRESHOLD_MS: u64 = 200;

pub const COOLDOWN_MIN_SECS: u32 = 8;
/// Cooldown at the complication's unlock rank
pub const COOLDOWN_MAX_SECS: u32 = 20;

impl ComplicationKind {
    pub const ALL: [Self; 3] = [Self::Laser, Self::Lights, Self::Controls];

    pub fn unlock_rank(self) -> u32 {
        match self {
            Self::Laser => 4,
            Self::Lights => 2,
            Self::Controls => 6,
        }
    }

    pub fn is_unlocked(self, rank: u32) -> bool {
        rank >= self.unlock_rank()
    }

    /// One second shorter per rank past unlock, down to the minimum
    pub fn cooldown_ms(self, rank: u32) -> u64 {
        let past_unlock = rank.saturating_sub(self.unlock_rank());
        let secs = COOLDOWN_MAX_SECS
            .saturating_sub(past_unlock)
            .max(COOLDOWN_MIN_SECS);
        secs as u64 * 1000
    }
}

/// Lights trigger chance after the circuit stabilizer's reduction
pub fn lights_trigger_chance(stabilizer: f32) -> f32 {
    LIGHTS_TRIGGER_CHANCE * (1.0 - stabilizer).clamp(0.0, 1.0)
}

/// Meters, active complications and cooldowns of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complications {
    pub capacitor: f32,
    pub heat: f32,
    /// Time since the last rotation (ms)
    pub idle_ms: u64,
    pub active: Vec<ComplicationKind>,
    /// Game time each kind may start again
    pub cooldown_until_ms: BTreeMap<ComplicationKind, u64>,
}

impl Default for Complications {
    fn default() -> Self {
        Self {
            capacitor: CAPACITOR_MAX,
            heat: 0.0,
            idle_ms: 0,
            active: Vec::new(),
            cooldown_until_ms: BTreeMap::new(),
        }
    }
}

impl Complications {
    pub fn is_active(&self, kind: ComplicationKind) -> bool {
        self.active.contains(&kind)
    }

    pub fn can_trigger(&self, kind: ComplicationKind, rank: u32, now_ms: u64) -> bool {
        kind.is_unlocked(rank)
            && !self.is_active(kind)
            && now_ms >= self.cooldown_until_ms.get(&kind).copied().unwrap_or(0)
    }

    /// `efficiency` is the fraction of drain removed by upgrades
    pub fn drain_capacitor(&mut self, units: u32, efficiency: f32) {
        let drain = units as f32 * DRAIN_PER_UNIT * (1.0 - efficiency).clamp(0.0, 1.0);
        self.capacitor = (self.capacitor - drain).max(0.0);
    }

    pub fn add_heat(&mut self) {
        self.heat = (self.heat + HEAT_PER_ROTATION).min(HEAT_MAX);
        self.idle_ms = 0;
    }

    /// Idle time passes; heat falls once past the idle threshold
    pub fn cool(&mut self, dt_ms: u64, dissipation_bonus: f32) {
        self.idle_ms += dt_ms;
        if self.idle_ms >= IDLE_THRESHOLD_MS {
            let rate = HEAT_DISSIPATION * (1.0 + dissipation_bonus);
            self.heat = (self.heat - rate * dt_ms as f32 / 1000.0).max(0.0);
        }
    }

    /// Kinds whose meter has tripped (lights are rolled separately)
    pub fn tripped(&self) -> Vec<ComplicationKind> {
        let mut kinds = Vec::new();
        if self.capacitor <= 0.0 {
            kinds.push(ComplicationKind::Laser);
        }
        if self.heat >= HEAT_MAX {
            kinds.push(ComplicationKind::Controls);
        }
        kinds
    }

    pub fn start(&mut self, kind: ComplicationKind) {
        if !self.is_active(kind) {
            self.active.push(kind);
        }
    }

    /// Clear `kind`, reset its meter and start its cooldown. False if it was not active.
    pub fn resolve(&mut self, kind: ComplicationKind, rank: u32, now_ms: u64) -> bool {
        if !self.is_active(kind) {
            return false;
        }
        self.active.retain(|k| *k != kind);
        match kind {
            ComplicationKind::Laser => self.capacitor = CAPACITOR_MAX,
            ComplicationKind::Controls => {
                self.heat = 0.0;
                self.idle_ms = 0;
            }
            ComplicationKind::Lights => {}
        }
        self.cooldown_until_ms.insert(kind, now_ms + kind.cooldown_ms(rank));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_by_rank() {
        assert_eq!(ComplicationKind::Lights.cooldown_ms(2), 20_000);
        assert_eq!(ComplicationKind::Lights.cooldown_ms(7), 15_000);
        assert_eq!(ComplicationKind::Lights.cooldown_ms(90), 8_000);
        // Below unlock rank the cooldown stays at its maximum
        assert_eq!(ComplicationKind::Controls.cooldown_ms(1), 20_000);
        assert!(!ComplicationKind::Controls.is_unlocked(5));
        assert!(ComplicationKind::Controls.is_unlocked(6));
    }

    #[test]
    fn test_capacitor_drain() {
        let mut c = Complications::default();
        c.drain_capacitor(10, 0.0);
        assert_eq!(c.capacitor, 60.0);
        c.drain_capacitor(10, 0.25);
        assert_eq!(c.capacitor, 30.0);
        c.drain_capacitor(100, 0.0);
        assert_eq!(c.capacitor, 0.0);
        assert_eq!(c.tripped(), vec![ComplicationKind::Laser]);
    }

    #[test]
    fn test_heat_waits_for_idle() {
        let mut c = Complications::default();
        for _ in 0..4 {
            c.add_heat();
        }
        assert_eq!(c.heat, 20.0);

        c.cool(100, 0.0);
        assert_eq!(c.heat, 20.0);
        c.cool(100, 0.0);
        assert_eq!(c.heat, 15.0);
        c.cool(1000, 0.0);
        assert_eq!(c.heat, 0.0);
    }

    #[test]
    fn test_heat_trips_controls() {
        let mut c = Complications::default();
        for _ in 0..(HEAT_MAX / HEAT_PER_ROTATION) as usize {
            c.add_heat();
        }
        assert_eq!(c.tripped(), vec![ComplicationKind::Controls]);
    }

    #[test]
    fn test_resolve_resets_and_cools_down() {
        let mut c = Complications::default();
        c.drain_capacitor(25, 0.0);
        c.start(ComplicationKind::Laser);
        assert!(!c.can_trigger(ComplicationKind::Laser, 10, 0));

        assert!(c.resolve(ComplicationKind::Laser, 4, 1_000));
        assert!(!c.resolve(ComplicationKind::Laser, 4, 1_000));
        assert_eq!(c.capacitor, CAPACITOR_MAX);
        assert!(!c.can_trigger(ComplicationKind::Laser, 4, 20_999));
        assert!(c.can_trigger(ComplicationKind::Laser, 4, 21_000));
    }

    #[test]
    fn test_locked_kind_never_triggers() {
        let c = Complications::default();
        assert!(!c.can_trigger(ComplicationKind::Lights, 1, 0));
        assert!(c.can_trigger(ComplicationKind::Lights, 2, 0));
    }

    #[test]
    fn test_stabilizer_lowers_chance() {
        assert!((lights_trigger_chance(0.0) - 0.2).abs() < 1e-6);
        assert!((lights_trigger_chance(0.3) - 0.14).abs() < 1e-6);
        assert_eq!(lights_trigger_chance(2.0), 0.0);
    }
}
