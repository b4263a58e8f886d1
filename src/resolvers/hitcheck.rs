use crate::effects::types::AccCtx;
use crate::enums::{self, Family};
use crate::managers::aura::AuraManager;
use crate::managers::stats::sigma_state;
use crate::managers::state::StateManager;
use crate::rng::RngStreams;

/// Normalizes an accuracy/chance value: treated as a 0..1 fraction if `<=1`,
/// else as a 0..100 percentage.
fn normalize_fraction(value: f64) -> f64 {
    if value <= 1.0 {
        value
    } else {
        value / 100.0
    }
}

pub struct HitCheck;

impl HitCheck {
    /// 5-step hit check. Always consumes one `rand_hit`, except the
    /// `dont_miss` short-circuit, which returns before drawing.
    #[allow(clippy::too_many_arguments)]
    pub fn compute(
        rng: &mut RngStreams,
        states: &StateManager,
        auras: &AuraManager,
        actor_id: i64,
        actor_family: Family,
        target_id: i64,
        accuracy: f64,
        acc_ctx: &AccCtx,
        weather_hit_chance_add: f64,
    ) -> (bool, &'static str) {
        if acc_ctx.dont_miss {
            return (true, "DONT_MISS");
        }

        let roll = rng.rand_hit();

        let mut accuracy = normalize_fraction(accuracy);
        if let Some(over) = acc_ctx.accuracy_override {
            accuracy = normalize_fraction(over);
        }

        accuracy += sigma_state(states, auras, actor_id, enums::STATE_ACCURACY) as f64 / 100.0;
        accuracy -= sigma_state(states, auras, target_id, enums::STATE_DODGE) as f64 / 100.0;

        if !(actor_family == Family::Elemental && weather_hit_chance_add < 0.0) {
            accuracy += weather_hit_chance_add;
        }

        let accuracy = accuracy.clamp(0.0, 1.0);
        (roll <= accuracy, "ROLL")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dont_miss_short_circuits_without_drawing() {
        let mut rng = RngStreams::sequence(vec![0.99], vec![], vec![], vec![]);
        let states = StateManager::new();
        let auras = AuraManager::new();
        let mut ctx = AccCtx::new();
        ctx.dont_miss = true;
        let (hit, reason) = HitCheck::compute(
            &mut rng, &states, &auras, 1, Family::Humanoid, 2, 1.0, &ctx, 0.0,
        );
        assert!(hit);
        assert_eq!(reason, "DONT_MISS");
        assert_eq!(rng.draw_counts()[0], 0);
    }

    #[test]
    fn elemental_ignores_negative_weather_addend() {
        let mut rng = RngStreams::sequence(vec![0.95], vec![], vec![], vec![]);
        let states = StateManager::new();
        let auras = AuraManager::new();
        let ctx = AccCtx::new();
        let (hit, _) = HitCheck::compute(
            &mut rng,
            &states,
            &auras,
            1,
            Family::Elemental,
            2,
            1.0,
            &ctx,
            -0.5,
        );
        assert!(hit);
    }

    #[test]
    fn dodge_state_reduces_effective_accuracy() {
        let mut rng = RngStreams::sequence(vec![0.5], vec![], vec![], vec![]);
        let mut states = StateManager::new();
        states.set(2, enums::STATE_DODGE, 60);
        let auras = AuraManager::new();
        let ctx = AccCtx::new();
        let (hit, _) = HitCheck::compute(
            &mut rng, &states, &auras, 1, Family::Humanoid, 2, 1.0, &ctx, 0.0,
        );
        assert!(!hit);
    }
}
