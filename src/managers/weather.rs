use std::collections::HashMap;

use crate::enums::{self, Family};
use crate::managers::aura::AuraManager;

/// Numeric effects a weather state id carries. The neutral
/// (no-weather) value multiplies nothing and adds nothing.
#[derive(Debug, Clone, Copy)]
pub struct WeatherEffect {
    /// Damage multiplier keyed by attacking family, applied on top of 1.0.
    pub dmg_mult_by_family: [f64; 10],
    pub heal_taken_mult: f64,
    pub hit_chance_add: f64,
    pub flat_damage_taken_add: i64,
}

impl WeatherEffect {
    fn neutral() -> Self {
        Self {
            dmg_mult_by_family: [1.0; 10],
            heal_taken_mult: 1.0,
            hit_chance_add: 0.0,
            flat_damage_taken_add: 0,
        }
    }

    pub fn dmg_mult(&self, family: Family) -> f64 {
        self.dmg_mult_by_family[family as usize]
    }
}

impl Default for WeatherEffect {
    fn default() -> Self {
        Self::neutral()
    }
}

fn family_table(overrides: &[(Family, f64)]) -> [f64; 10] {
    let mut table = [1.0; 10];
    for &(family, mult) in overrides {
        table[family as usize] = mult;
    }
    table
}

/// The fixed state_id -> effect registry. Overridable via
/// `EngineConfig` so ability packs can add families.
pub fn default_weather_registry() -> HashMap<i64, WeatherEffect> {
    let mut reg = HashMap::new();

    // Moonlight: +10% Magic dmg, +25% heal taken.
    reg.insert(
        53,
        WeatherEffect {
            dmg_mult_by_family: family_table(&[(Family::Magic, 1.10)]),
            heal_taken_mult: 1.25,
            ..WeatherEffect::neutral()
        },
    );

    // Darkness: heal taken x0.5, hit -10%.
    reg.insert(
        54,
        WeatherEffect {
            heal_taken_mult: 0.5,
            hit_chance_add: -0.10,
            ..WeatherEffect::neutral()
        },
    );

    // Rain: +25% Aquatic dmg.
    reg.insert(
        55,
        WeatherEffect {
            dmg_mult_by_family: family_table(&[(Family::Aquatic, 1.25)]),
            ..WeatherEffect::neutral()
        },
    );

    // Lightning Storm: +25% Mechanical dmg, +39 flat dmg taken.
    reg.insert(
        62,
        WeatherEffect {
            dmg_mult_by_family: family_table(&[(Family::Mechanical, 1.25)]),
            flat_damage_taken_add: 39,
            ..WeatherEffect::neutral()
        },
    );

    // Sandstorm: hit -10%, -99 flat dmg taken (floored at 0 by the caller).
    reg.insert(
        60,
        WeatherEffect {
            hit_chance_add: -0.10,
            flat_damage_taken_add: -99,
            ..WeatherEffect::neutral()
        },
    );

    reg
}

/// Observes the single caster-anchored aura that currently carries a
/// `Weather_*` state bind. Weather owns no separate storage.
#[derive(Debug, Clone, Default)]
pub struct WeatherManager {
    active_state_id: Option<i64>,
    active_aura_owner: Option<i64>,
    active_aura_id: Option<i64>,
    registry: HashMap<i64, WeatherEffect>,
}

impl WeatherManager {
    pub fn new() -> Self {
        Self {
            registry: default_weather_registry(),
            ..Default::default()
        }
    }

    pub fn with_registry(registry: HashMap<i64, WeatherEffect>) -> Self {
        Self {
            registry,
            ..Default::default()
        }
    }

    /// Caches the aura's weather bind if it carries a non-zero `Weather_*`
    /// state. Called right after an aura is applied/refreshed.
    pub fn on_aura_applied(&mut self, owner_pet_id: i64, aura_id: i64, auras: &AuraManager) {
        let Some(inst) = auras.get(owner_pet_id, aura_id) else {
            return;
        };
        for bind in &inst.meta.state_binds {
            if enums::is_weather_state(bind.state_id) && bind.value != 0 {
                self.active_state_id = Some(bind.state_id);
                self.active_aura_owner = Some(owner_pet_id);
                self.active_aura_id = Some(aura_id);
                return;
            }
        }
    }

    /// Scans every active aura across the given owners and picks the weather
    /// bind with the longest remaining duration.
    pub fn detect_from_ctx(&mut self, owners: &[i64], auras: &AuraManager) {
        let mut best: Option<(i64, i64, i64, i64)> = None; // (duration, owner, aura_id, state_id)
        for &owner in owners {
            for (aura_id, inst) in auras.list_owner(owner) {
                for bind in &inst.meta.state_binds {
                    if enums::is_weather_state(bind.state_id) && bind.value != 0 {
                        let better = match &best {
                            None => true,
                            Some((d, ..)) => inst.remaining_duration > *d,
                        };
                        if better {
                            best = Some((inst.remaining_duration, owner, aura_id, bind.state_id));
                        }
                    }
                }
            }
        }
        match best {
            Some((_, owner, aura_id, state_id)) => {
                self.active_aura_owner = Some(owner);
                self.active_aura_id = Some(aura_id);
                self.active_state_id = Some(state_id);
            }
            None => self.clear(),
        }
    }

    /// Nulls the cache if the anchor aura has been removed.
    pub fn clear_if_gone(&mut self, auras: &AuraManager) {
        if let (Some(owner), Some(aura_id)) = (self.active_aura_owner, self.active_aura_id) {
            if auras.get(owner, aura_id).is_none() {
                self.clear();
            }
        }
    }

    fn clear(&mut self) {
        self.active_state_id = None;
        self.active_aura_owner = None;
        self.active_aura_id = None;
    }

    /// Returns the cached weather state id, refreshing from `detect_from_ctx`
    /// if the cache is empty.
    pub fn current(&mut self, owners: &[i64], auras: &AuraManager) -> i64 {
        if self.active_state_id.is_none() {
            self.detect_from_ctx(owners, auras);
        }
        self.active_state_id.unwrap_or(0)
    }

    pub fn effect(&self, state_id: i64) -> WeatherEffect {
        self.registry.get(&state_id).copied().unwrap_or_else(WeatherEffect::neutral)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lightning_storm_boosts_mechanical_and_adds_flat() {
        let wm = WeatherManager::new();
        let eff = wm.effect(62);
        assert_eq!(eff.dmg_mult(Family::Mechanical), 1.25);
        assert_eq!(eff.flat_damage_taken_add, 39);
    }

    #[test]
    fn detect_picks_longest_remaining_duration() {
        let mut auras = AuraManager::new();
        auras.apply(1, 1, 900, 3, false, 0);
        auras.get_mut(1, 900).unwrap().meta.state_binds.push(crate::model::aura::StateBind {
            state_id: 62,
            value: 1,
            flags: 0,
        });
        auras.apply(2, 2, 901, 10, false, 0);
        auras.get_mut(2, 901).unwrap().meta.state_binds.push(crate::model::aura::StateBind {
            state_id: 54,
            value: 1,
            flags: 0,
        });

        let mut wm = WeatherManager::new();
        wm.detect_from_ctx(&[1, 2], &auras);
        assert_eq!(wm.current(&[1, 2], &auras), 54);
    }

    #[test]
    fn clear_if_gone_resets_cache() {
        let mut auras = AuraManager::new();
        auras.apply(1, 1, 900, 3, false, 0);
        let mut wm = WeatherManager::new();
        wm.on_aura_applied(1, 900, &auras);
        auras.get_mut(1, 900).unwrap().meta.state_binds.push(crate::model::aura::StateBind {
            state_id: 62,
            value: 1,
            flags: 0,
        });
        wm.on_aura_applied(1, 900, &auras);
        assert_eq!(wm.current(&[1], &auras), 62);
        auras.remove(1, 900);
        wm.clear_if_gone(&auras);
        assert_eq!(wm.current(&[1], &auras), 0);
    }
}
