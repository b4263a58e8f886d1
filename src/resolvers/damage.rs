use std::collections::BTreeMap;

use serde_json::json;

use crate::enums::Family;
use crate::managers::aura::AuraManager;
use crate::managers::racial::RacialPassiveManager;
use crate::managers::state::StateManager;
use crate::managers::stats::StatsResolver;
use crate::managers::weather::WeatherEffect;
use crate::model::creature::Creature;
use crate::model::damage::{DamageEvent, ResolvedDamage};
use crate::rng::RngStreams;

const CRIT_CHANCE_DEFAULT: f64 = 0.05;
const CRIT_MULT_DEFAULT: f64 = 1.5;

pub struct DamagePipeline;

impl DamagePipeline {
    /// Ten-stage damage resolution.
    #[allow(clippy::too_many_arguments)]
    pub fn resolve(
        rng: &mut RngStreams,
        states: &StateManager,
        auras: &AuraManager,
        stats: &StatsResolver,
        racial: &RacialPassiveManager,
        weather_effect: WeatherEffect,
        periodic_can_crit: bool,
        trace_extended: bool,
        actor: &Creature,
        target: &Creature,
        event: &DamageEvent,
    ) -> ResolvedDamage {
        let mut trace: BTreeMap<String, serde_json::Value> = BTreeMap::new();

        // S1: effective power scaling.
        let actor_power = stats.effective_power(actor, states, auras);
        let base = (event.points as f64 * (1.0 + actor_power as f64 / 20.0)).floor();
        trace.insert("base".to_string(), json!(base));

        // S3: state/aura damage_multiplier.
        let dmg_mult = stats.damage_multiplier(actor.id, target.id, states, auras);
        let mut value = base * dmg_mult;
        if trace_extended {
            trace.insert("damage_multiplier".to_string(), json!(dmg_mult));
        }

        // S4-S6: attack type resolution vs target family.
        let attack_family = event.attack_type_override.unwrap_or(actor.family);
        let type_mult = attack_family.type_multiplier(target.family);
        value *= type_mult;
        trace.insert("attack_family".to_string(), json!(attack_family as i8));
        trace.insert("type_multiplier".to_string(), json!(type_mult));

        // S6: weather multiplier.
        let weather_mult = weather_effect.dmg_mult(attack_family);
        value *= weather_mult;
        if trace_extended {
            trace.insert("weather_multiplier".to_string(), json!(weather_mult));
        }

        // S6: racial offensive/defensive multipliers.
        let actor_eff_max_hp = stats.effective_max_hp(actor, states, auras);
        if actor.family == Family::Beast && actor.hp * 2 < actor_eff_max_hp {
            value *= 1.25;
            trace.insert("beast_offensive".to_string(), json!(true));
        }
        let dragonkin_mult = racial.get_damage_multiplier(actor.id);
        if dragonkin_mult > 1.0 {
            value *= dragonkin_mult;
            trace.insert("dragonkin_buff".to_string(), json!(true));
        }
        if event.is_periodic && target.family == Family::Aquatic {
            value *= 0.5;
            trace.insert("aquatic_defensive".to_string(), json!(true));
        }

        // Undead immortality short-circuit: variance/crit still consumed for
        // stream determinism, but the result is forced to 0.
        let undead_immune = racial.is_undead_immortal(target.id);

        // S7: variance. An explicit override replaces the draw entirely.
        let variance = event.variance_override.unwrap_or_else(|| rng.rand_variance());
        if !undead_immune {
            value *= variance;
        }
        if trace_extended {
            trace.insert("variance".to_string(), json!(variance));
        }

        // S8: crit. Always consumes rand_crit.
        let crit_roll = rng.rand_crit();
        let crit_eligible = !event.is_periodic || periodic_can_crit;
        let crit_hit = crit_eligible && crit_roll <= CRIT_CHANCE_DEFAULT;
        if crit_hit && !undead_immune {
            value *= CRIT_MULT_DEFAULT;
        }
        trace.insert("crit".to_string(), json!(crit_hit));

        if undead_immune {
            trace.insert("undead_immune".to_string(), json!(true));
            return ResolvedDamage {
                final_damage: 0,
                trace,
            };
        }

        // S9: flat add.
        let mut flat = stats.damage_flat_add(actor.id, target.id, event.is_periodic, states, auras);
        let weather_flat = weather_effect.flat_damage_taken_add;
        if !(target.family == Family::Elemental && weather_flat > 0) {
            flat += weather_flat;
        }
        value += flat as f64;
        if trace_extended {
            trace.insert("flat_add".to_string(), json!(flat));
        }

        // S10: passive caps + thresholds.
        let mut dmg = value.floor().max(0.0) as i64;
        if target.family == Family::Magic && !event.is_periodic {
            let cap = (0.35 * stats.effective_max_hp(target, states, auras) as f64).floor() as i64;
            dmg = dmg.min(cap);
            trace.insert("magic_cap".to_string(), json!(cap));
        }
        dmg = stats.apply_damage_thresholds(target.id, dmg, states, auras);

        ResolvedDamage {
            final_damage: dmg.max(0),
            trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managers::weather::WeatherEffect;

    fn beast(id: i64, power: i64, max_hp: i64) -> Creature {
        let mut c = Creature::new(id, 1, Family::Beast, 4, 0, 25, [0, 0, 0], max_hp, power, 50);
        c.hp = max_hp;
        c
    }

    fn mechanical(id: i64, max_hp: i64) -> Creature {
        let mut c = Creature::new(id, 2, Family::Mechanical, 4, 0, 25, [0, 0, 0], max_hp, 0, 50);
        c.hp = max_hp;
        c
    }

    /// Scenario S1: base=floor(25*(1+100/20))=150, x2/3 weak = 100.
    #[test]
    fn s1_simple_damage_with_type_disadvantage() {
        let mut rng = RngStreams::sequence(vec![], vec![], vec![1.0], vec![1.0]);
        let states = StateManager::new();
        let auras = AuraManager::new();
        let stats = StatsResolver::new();
        let racial = RacialPassiveManager::new();
        let actor = beast(1, 100, 300);
        let target = mechanical(2, 300);
        let event = DamageEvent {
            source_actor_id: 1,
            target_id: 2,
            ability_id: 1,
            effect_id: 1,
            points: 25,
            is_periodic: false,
            override_index: None,
            variance_override: None,
            attack_type_override: None,
        };
        let resolved = DamagePipeline::resolve(
            &mut rng,
            &states,
            &auras,
            &stats,
            &racial,
            WeatherEffect::default(),
            false,
            false,
            &actor,
            &target,
            &event,
        );
        assert_eq!(resolved.final_damage, 100);
    }

    /// Scenario S2: Lightning Storm: (150*1.25)+39 = 226.
    #[test]
    fn s2_weather_lightning_storm_boosts_mechanical() {
        let mut rng = RngStreams::sequence(vec![], vec![], vec![1.0], vec![1.0]);
        let states = StateManager::new();
        let auras = AuraManager::new();
        let stats = StatsResolver::new();
        let racial = RacialPassiveManager::new();
        let mut actor = mechanical(1, 300);
        actor.power = 100;
        actor.base_power = 100;
        let target = mechanical(2, 1000);
        let event = DamageEvent {
            source_actor_id: 1,
            target_id: 2,
            ability_id: 1,
            effect_id: 1,
            points: 25,
            is_periodic: false,
            override_index: None,
            variance_override: None,
            attack_type_override: Some(Family::Mechanical),
        };
        let weather = *crate::managers::weather::default_weather_registry().get(&62).unwrap();
        let resolved = DamagePipeline::resolve(
            &mut rng, &states, &auras, &stats, &racial, weather, false, false, &actor, &target, &event,
        );
        assert_eq!(resolved.final_damage, 226);
    }

    #[test]
    fn undead_immune_still_draws_variance_and_crit() {
        let mut rng = RngStreams::sequence(vec![], vec![], vec![1.0], vec![1.0]);
        let states = StateManager::new();
        let auras = AuraManager::new();
        let stats = StatsResolver::new();
        let mut racial = RacialPassiveManager::new();
        let mut undead = Creature::new(2, 3, Family::Undead, 4, 0, 25, [0, 0, 0], 300, 0, 50);
        undead.hp = 1;
        racial.on_pet_death(&mut undead);
        let actor = beast(1, 100, 300);
        let event = DamageEvent {
            source_actor_id: 1,
            target_id: 2,
            ability_id: 1,
            effect_id: 1,
            points: 25,
            is_periodic: false,
            override_index: None,
            variance_override: None,
            attack_type_override: None,
        };
        let resolved = DamagePipeline::resolve(
            &mut rng,
            &states,
            &auras,
            &stats,
            &racial,
            WeatherEffect::default(),
            false,
            false,
            &actor,
            &undead,
            &event,
        );
        assert_eq!(resolved.final_damage, 0);
        assert_eq!(rng.draw_counts()[2], 1);
        assert_eq!(rng.draw_counts()[3], 1);
    }
}
