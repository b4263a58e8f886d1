use crate::enums::{self, Family};
use crate::managers::aura::AuraManager;
use crate::managers::state::StateManager;
use crate::model::creature::Creature;

/// Sums `StateManager`'s raw value for `(pet_id, state_id)` with the
/// contribution of every aura bound to that state id (`bind.value * stacks`),
/// per the `Σstate` definition.
pub fn sigma_state(states: &StateManager, auras: &AuraManager, pet_id: i64, state_id: i64) -> i64 {
    let mut total = states.get(pet_id, state_id);
    for inst in auras.list_owner(pet_id).values() {
        for bind in &inst.meta.state_binds {
            if bind.state_id == state_id {
                total += bind.value * inst.stacks;
            }
        }
    }
    total
}

/// `max(0, (100+x)/100)`.
fn pct(x: i64) -> f64 {
    ((100 + x) as f64 / 100.0).max(0.0)
}

/// Effective stats synced back onto a creature at TURN_START/TURN_END.
#[derive(Debug, Clone, Copy)]
pub struct EffectiveStats {
    pub max_hp: i64,
    pub power: i64,
    pub speed: i64,
    pub hp_clamped: i64,
}

/// Derives effective `{max_hp, power, speed}` from base stats + state map +
/// aura bindings.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsResolver;

impl StatsResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn effective_max_hp(&self, creature: &Creature, states: &StateManager, auras: &AuraManager) -> i64 {
        let base = creature.base_max_hp + sigma_state(states, auras, creature.id, enums::STATE_MAX_HP_FLAT);
        (base as f64 * pct(sigma_state(states, auras, creature.id, enums::STATE_MAX_HP_PCT))).floor() as i64
    }

    pub fn effective_power(&self, creature: &Creature, states: &StateManager, auras: &AuraManager) -> i64 {
        creature.base_power + sigma_state(states, auras, creature.id, enums::STATE_POWER_FLAT)
    }

    /// Includes the Flying passive: ×1.5 if `hp*2 > effective_max_hp`.
    pub fn effective_speed(&self, creature: &Creature, states: &StateManager, auras: &AuraManager) -> i64 {
        let raw = creature.base_speed + sigma_state(states, auras, creature.id, enums::STATE_SPEED_FLAT);
        let raw = raw.max(1);
        let mut speed =
            (raw as f64 * pct(sigma_state(states, auras, creature.id, enums::STATE_SPEED_PCT))).floor() as i64;
        if creature.family == Family::Flying {
            let eff_max_hp = self.effective_max_hp(creature, states, auras);
            if creature.hp * 2 > eff_max_hp {
                speed = (speed as f64 * 1.5).floor() as i64;
            }
        }
        speed.max(1)
    }

    pub fn damage_multiplier(
        &self,
        actor_id: i64,
        target_id: i64,
        states: &StateManager,
        auras: &AuraManager,
    ) -> f64 {
        pct(sigma_state(states, auras, actor_id, enums::STATE_DMG_DEALT_PCT))
            * pct(sigma_state(states, auras, target_id, enums::STATE_DMG_TAKEN_PCT))
    }

    pub fn damage_flat_add(
        &self,
        actor_id: i64,
        target_id: i64,
        is_periodic: bool,
        states: &StateManager,
        auras: &AuraManager,
    ) -> i64 {
        let mut total = sigma_state(states, auras, actor_id, enums::STATE_FLAT_DMG_DEALT)
            + sigma_state(states, auras, target_id, enums::STATE_FLAT_DMG_TAKEN);
        if is_periodic {
            total += sigma_state(states, auras, target_id, enums::STATE_FLAT_DMG_TAKEN_PERIODIC);
        }
        total
    }

    pub fn heal_multiplier(&self, actor_id: i64, target_id: i64, states: &StateManager, auras: &AuraManager) -> f64 {
        pct(sigma_state(states, auras, actor_id, enums::STATE_HEAL_DEALT_PCT))
            * pct(sigma_state(states, auras, target_id, enums::STATE_HEAL_TAKEN_PCT))
    }

    /// `Σstate(191) > 0 ∧ dmg < threshold ⇒ 0`; `Σstate(200) > 0 ∧ dmg >
    /// threshold ⇒ clamp to threshold`. Both thresholds read from the same
    /// state ids as their gating flags (per the source's single-threshold
    /// convention — the flag's own `Σstate` value doubles as the threshold).
    pub fn apply_damage_thresholds(
        &self,
        target_id: i64,
        dmg: i64,
        states: &StateManager,
        auras: &AuraManager,
    ) -> i64 {
        let ignore_below = sigma_state(states, auras, target_id, enums::STATE_DMG_IGNORE_BELOW);
        if ignore_below > 0 && dmg < ignore_below {
            return 0;
        }
        let clamp_above = sigma_state(states, auras, target_id, enums::STATE_DMG_CLAMP_ABOVE);
        if clamp_above > 0 && dmg > clamp_above {
            return clamp_above;
        }
        dmg
    }

    /// Computes and pushes effective stats back onto the creature's mutable
    /// fields, clamping `hp` into `[0, effective_max_hp]`.
    pub fn sync_pet(&self, creature: &mut Creature, states: &StateManager, auras: &AuraManager) -> EffectiveStats {
        let max_hp = self.effective_max_hp(creature, states, auras);
        let power = self.effective_power(creature, states, auras);
        let speed = self.effective_speed(creature, states, auras);
        let hp_clamped = creature.hp.clamp(0, max_hp.max(0));

        creature.max_hp = max_hp;
        creature.power = power;
        creature.speed = speed;
        creature.hp = hp_clamped;
        creature
            .tags
            .insert("effective_max_hp".to_string(), serde_json::json!(max_hp));
        creature
            .tags
            .insert("effective_power".to_string(), serde_json::json!(power));
        creature
            .tags
            .insert("effective_speed".to_string(), serde_json::json!(speed));

        EffectiveStats {
            max_hp,
            power,
            speed,
            hp_clamped,
        }
    }

    pub fn sync(&self, creatures: &mut [Creature], states: &StateManager, auras: &AuraManager) {
        for c in creatures.iter_mut() {
            self.sync_pet(c, states, auras);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::creature::Creature;

    fn humanoid(id: i64) -> Creature {
        Creature::new(id, 1, Family::Humanoid, 4, 0, 25, [0, 0, 0], 300, 100, 50)
    }

    #[test]
    fn effective_max_hp_applies_flat_then_pct() {
        let resolver = StatsResolver::new();
        let mut states = StateManager::new();
        let auras = AuraManager::new();
        let c = humanoid(1);
        states.set(1, enums::STATE_MAX_HP_FLAT, 100);
        states.set(1, enums::STATE_MAX_HP_PCT, 50);
        assert_eq!(resolver.effective_max_hp(&c, &states, &auras), 600);
    }

    #[test]
    fn aura_binding_contributes_to_sigma_state() {
        let resolver = StatsResolver::new();
        let states = StateManager::new();
        let mut auras = AuraManager::new();
        let c = humanoid(1);
        auras.apply(1, 1, 600, -1, false, 0);
        auras.get_mut(1, 600).unwrap().meta.state_binds.push(crate::model::aura::StateBind {
            state_id: enums::STATE_POWER_FLAT,
            value: 20,
            flags: 0,
        });
        assert_eq!(resolver.effective_power(&c, &states, &auras), 120);
    }

    #[test]
    fn flying_passive_doubles_speed_above_half_hp() {
        let resolver = StatsResolver::new();
        let states = StateManager::new();
        let auras = AuraManager::new();
        let mut c = Creature::new(1, 1, Family::Flying, 4, 0, 25, [0, 0, 0], 300, 100, 50);
        c.hp = 300;
        let speed = resolver.effective_speed(&c, &states, &auras);
        assert_eq!(speed, 75);
    }

    #[test]
    fn damage_thresholds_zero_below_and_clamp_above() {
        let resolver = StatsResolver::new();
        let mut states = StateManager::new();
        let auras = AuraManager::new();
        states.set(1, enums::STATE_DMG_IGNORE_BELOW, 10);
        assert_eq!(resolver.apply_damage_thresholds(1, 5, &states, &auras), 0);
        assert_eq!(resolver.apply_damage_thresholds(1, 15, &states, &auras), 15);

        let mut states2 = StateManager::new();
        states2.set(2, enums::STATE_DMG_CLAMP_ABOVE, 50);
        assert_eq!(resolver.apply_damage_thresholds(2, 80, &states2, &auras), 50);
    }
}
