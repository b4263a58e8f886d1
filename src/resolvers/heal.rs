use std::collections::BTreeMap;

use serde_json::json;

use crate::enums::Family;
use crate::managers::aura::AuraManager;
use crate::managers::state::StateManager;
use crate::managers::stats::StatsResolver;
use crate::managers::weather::WeatherEffect;
use crate::model::creature::Creature;
use crate::model::heal::{HealEvent, ResolvedHeal};
use crate::rng::RngStreams;

pub struct HealPipeline;

const CRIT_MULT_DEFAULT: f64 = 1.5;

impl HealPipeline {
    /// Mirrors the damage pipeline's stage order: crit is always drawn,
    /// win or lose, so the crit stream never drifts between rounds that
    /// mix heals and damage.
    #[allow(clippy::too_many_arguments)]
    pub fn resolve(
        rng: &mut RngStreams,
        states: &StateManager,
        auras: &AuraManager,
        stats: &StatsResolver,
        weather_effect: WeatherEffect,
        heal_can_crit: bool,
        crit_chance: f64,
        trace_extended: bool,
        actor: &Creature,
        target: &Creature,
        event: &HealEvent,
    ) -> ResolvedHeal {
        let mut trace: BTreeMap<String, serde_json::Value> = BTreeMap::new();

        let actor_power = stats.effective_power(actor, states, auras);
        let base = (event.points as f64 * (1.0 + actor_power as f64 / 20.0)).floor();
        trace.insert("base".to_string(), json!(base));

        let heal_mult = stats.heal_multiplier(actor.id, target.id, states, auras);
        let mut value = base * heal_mult;
        if trace_extended {
            trace.insert("heal_multiplier".to_string(), json!(heal_mult));
        }

        let weather_mult = weather_effect.heal_taken_mult;
        if !(target.family == Family::Elemental && weather_mult < 1.0) {
            value *= weather_mult;
        }
        if trace_extended {
            trace.insert("weather_heal_mult".to_string(), json!(weather_mult));
        }

        let variance = event.variance_override.unwrap_or_else(|| rng.rand_variance());
        value *= variance;
        if trace_extended {
            trace.insert("variance".to_string(), json!(variance));
        }

        // Always consume rand_crit, even when heal_can_crit is off, so the
        // crit stream stays in lockstep with damage-only rounds.
        let crit_roll = rng.rand_crit();
        let crit_hit = heal_can_crit && crit_roll <= crit_chance;
        if crit_hit {
            value *= CRIT_MULT_DEFAULT;
        }
        trace.insert("crit".to_string(), json!(crit_hit));

        let heal = value.floor().max(0.0) as i64;
        ResolvedHeal {
            final_heal: heal,
            trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creature(id: i64, family: Family, max_hp: i64, power: i64) -> Creature {
        Creature::new(id, 1, family, 4, 0, 25, [0, 0, 0], max_hp, power, 50)
    }

    #[test]
    fn base_scales_with_power_and_variance() {
        let mut rng = RngStreams::sequence(vec![], vec![], vec![1.0], vec![]);
        let states = StateManager::new();
        let auras = AuraManager::new();
        let stats = StatsResolver::new();
        let actor = creature(1, Family::Humanoid, 300, 100);
        let target = creature(2, Family::Humanoid, 300, 0);
        let event = HealEvent {
            source_actor_id: 1,
            target_id: 2,
            ability_id: 1,
            effect_id: 1,
            points: 20,
            is_periodic: false,
            variance_override: None,
        };
        let resolved = HealPipeline::resolve(
            &mut rng,
            &states,
            &auras,
            &stats,
            WeatherEffect::default(),
            false,
            0.05,
            false,
            &actor,
            &target,
            &event,
        );
        assert_eq!(resolved.final_heal, 120);
    }

    #[test]
    fn elemental_target_ignores_subunity_weather_mult() {
        let mut rng = RngStreams::sequence(vec![], vec![], vec![1.0], vec![]);
        let states = StateManager::new();
        let auras = AuraManager::new();
        let stats = StatsResolver::new();
        let actor = creature(1, Family::Humanoid, 300, 0);
        let target = creature(2, Family::Elemental, 300, 0);
        let event = HealEvent {
            source_actor_id: 1,
            target_id: 2,
            ability_id: 1,
            effect_id: 1,
            points: 20,
            is_periodic: false,
            variance_override: None,
        };
        let weather = crate::managers::weather::WeatherEffect {
            heal_taken_mult: 0.5,
            ..WeatherEffect::default()
        };
        let resolved = HealPipeline::resolve(
            &mut rng, &states, &auras, &stats, weather, false, 0.05, false, &actor, &target, &event,
        );
        assert_eq!(resolved.final_heal, 20);
    }

    /// Matches the damage pipeline: crit is always drawn, even with
    /// `heal_can_crit=false`, so the stream never drifts against a round
    /// that mixes heals and damage.
    #[test]
    fn crit_stream_is_always_consumed_even_when_heal_cannot_crit() {
        let mut rng = RngStreams::sequence(vec![], vec![], vec![1.0], vec![0.01]);
        let states = StateManager::new();
        let auras = AuraManager::new();
        let stats = StatsResolver::new();
        let actor = creature(1, Family::Humanoid, 300, 0);
        let target = creature(2, Family::Humanoid, 300, 0);
        let event = HealEvent {
            source_actor_id: 1,
            target_id: 2,
            ability_id: 1,
            effect_id: 1,
            points: 20,
            is_periodic: false,
            variance_override: None,
        };
        let resolved = HealPipeline::resolve(
            &mut rng,
            &states,
            &auras,
            &stats,
            WeatherEffect::default(),
            false,
            0.05,
            false,
            &actor,
            &target,
            &event,
        );
        assert_eq!(resolved.final_heal, 20, "heal_can_crit=false must ignore the crit roll");
        assert_eq!(rng.draw_counts()[3], 1, "crit stream must still be drawn");
    }

    #[test]
    fn heal_can_crit_applies_multiplier_on_a_crit_roll() {
        let mut rng = RngStreams::sequence(vec![], vec![], vec![1.0], vec![0.01]);
        let states = StateManager::new();
        let auras = AuraManager::new();
        let stats = StatsResolver::new();
        let actor = creature(1, Family::Humanoid, 300, 0);
        let target = creature(2, Family::Humanoid, 300, 0);
        let event = HealEvent {
            source_actor_id: 1,
            target_id: 2,
            ability_id: 1,
            effect_id: 1,
            points: 20,
            is_periodic: false,
            variance_override: None,
        };
        let resolved = HealPipeline::resolve(
            &mut rng,
            &states,
            &auras,
            &stats,
            WeatherEffect::default(),
            true,
            0.05,
            false,
            &actor,
            &target,
            &event,
        );
        assert_eq!(resolved.final_heal, 30);
    }
}
