//! Property-based coverage of the quantified invariants: hp bounds, aura
//! duration/stack bounds, and exactly-one-team-alive at round end. These run
//! across randomly generated stat rolls rather than one fixed scenario, so
//! they catch edge cases a handful of hand-picked examples would miss.

use std::rc::Rc;

use proptest::prelude::*;

use pawscale::config::EngineConfig;
use pawscale::context::BattleContext;
use pawscale::enums::Family;
use pawscale::model::creature::{Creature, Team};
use pawscale::rng::RngStreams;
use pawscale::scripts::JsonScriptSource;
use pawscale::{Action, BattleLoop, RoundOutcome};

const ABILITY_PACK: &str = r#"{
    "abilities": {
        "100": {
            "cooldown": 0,
            "cast_turns": [
                [
                    {
                        "ability_id": 100,
                        "turn_id": 1,
                        "effect_id": 1,
                        "opcode_id": 24,
                        "order_index": 100,
                        "param_label": "points,accuracy",
                        "params_raw": [20, 90, 0, 0, 0, 0],
                        "aura_ability_id": null,
                        "scheduled_effect_rows": null
                    }
                ]
            ]
        }
    },
    "auras": {}
}"#;

fn build_ctx(seed: u64, hp_a: i64, hp_b: i64, speed_a: i64, speed_b: i64) -> BattleContext {
    let scripts = Rc::new(JsonScriptSource::from_str(ABILITY_PACK).unwrap());
    let mut ctx = BattleContext::new(RngStreams::seeded(seed), EngineConfig::default(), scripts);
    ctx.add_creature(Creature::new(1, 1, Family::Beast, 4, 0, 25, [100, 0, 0], hp_a, 100, speed_a));
    ctx.add_creature(Creature::new(2, 1, Family::Beast, 4, 0, 25, [100, 0, 0], hp_b, 100, speed_b));
    ctx.teams.register_team(Team::new(10, vec![1]));
    ctx.teams.register_team(Team::new(20, vec![2]));
    ctx
}

proptest! {
    /// hp never leaves `[0, effective_max_hp]` for either pet, at every
    /// round boundary of a battle run to completion or a 200-round cap.
    #[test]
    fn prop_hp_stays_within_bounds(
        seed in 0u64..10_000,
        hp_a in 50i64..500,
        hp_b in 50i64..500,
        speed_a in 1i64..100,
        speed_b in 1i64..100,
    ) {
        let mut ctx = build_ctx(seed, hp_a, hp_b, speed_a, speed_b);
        for _ in 0..200 {
            let action = Action::UseAbility { ability_id: 100, slot: Some(1) };
            let outcome = BattleLoop::run_round(&mut ctx, 10, 20, action.clone(), action);

            for pet_id in [1, 2] {
                let c = ctx.creature(pet_id).unwrap();
                prop_assert!(c.hp >= 0, "pet {} hp went negative: {}", pet_id, c.hp);
                prop_assert!(
                    c.hp <= c.max_hp,
                    "pet {} hp {} exceeded effective_max_hp {}",
                    pet_id,
                    c.hp,
                    c.max_hp
                );
            }

            if outcome != RoundOutcome::Ongoing {
                break;
            }
        }
    }

    /// A completed battle (not a draw-by-round-cap) always ends with exactly
    /// one side holding an alive pet — never both, never neither.
    #[test]
    fn prop_exactly_one_team_alive_when_a_battle_concludes(
        seed in 0u64..10_000,
        hp_a in 20i64..150,
        hp_b in 20i64..150,
        speed_a in 1i64..100,
        speed_b in 1i64..100,
    ) {
        let mut ctx = build_ctx(seed, hp_a, hp_b, speed_a, speed_b);
        let mut outcome = RoundOutcome::Ongoing;
        for _ in 0..300 {
            let action = Action::UseAbility { ability_id: 100, slot: Some(1) };
            outcome = BattleLoop::run_round(&mut ctx, 10, 20, action.clone(), action);
            if outcome != RoundOutcome::Ongoing {
                break;
            }
        }

        let alive = |team_id: i64| -> bool {
            ctx.teams
                .team(team_id)
                .map(|t| t.pet_ids.iter().any(|id| ctx.creature(*id).map(|c| c.alive).unwrap_or(false)))
                .unwrap_or(false)
        };

        match outcome {
            RoundOutcome::TeamWon(winner) => {
                prop_assert!(alive(winner));
                let loser = if winner == 10 { 20 } else { 10 };
                prop_assert!(!alive(loser));
            }
            RoundOutcome::Draw => {
                // Either the round cap was hit with both sides still alive,
                // or both sides died in the same round.
                prop_assert!(!(alive(10) && !alive(20)) && !(!alive(10) && alive(20)));
            }
            RoundOutcome::Ongoing => {
                prop_assert!(alive(10) && alive(20), "still ongoing but one side already has no alive pet");
            }
        }
    }
}

proptest! {
    /// An aura's stack count, once applied with `apply_with_stack_limit`,
    /// never exceeds `max_stacks` no matter how many times it is reapplied.
    #[test]
    fn prop_aura_stacks_never_exceed_max(
        max_stacks in 1i64..10,
        reapplications in 1u32..40,
    ) {
        let mut ctx = build_ctx(1, 300, 300, 60, 60);
        for _ in 0..reapplications {
            ctx.auras.apply_with_stack_limit(1, 1, 900, 5, max_stacks, 0);
        }
        let stacks = ctx.auras.get(1, 900).unwrap().stacks;
        prop_assert!(stacks >= 1);
        prop_assert!(stacks <= max_stacks.max(1));
    }

    /// A permanent aura (`duration=-1`) is immune to any number of TURN_END
    /// ticks; a finite-duration aura never reports a negative
    /// `remaining_duration` and is removed, not left dangling at <= 0.
    #[test]
    fn prop_aura_duration_bounds_hold_across_many_ticks(
        duration in 1i64..20,
        ticks in 0u32..40,
    ) {
        let mut ctx = build_ctx(2, 300, 300, 60, 60);
        ctx.auras.apply(1, 1, 901, -1, false, 0);
        ctx.auras.apply(1, 1, 902, duration, false, 0);

        for _ in 0..ticks {
            pawscale::executor::AbilityExecutor::on_turn_end(&mut ctx);
        }

        prop_assert!(ctx.auras.get(1, 901).is_some(), "permanent aura must survive any number of ticks");
        if let Some(inst) = ctx.auras.get(1, 902) {
            prop_assert!(inst.remaining_duration > 0, "a live finite aura must report positive remaining_duration");
        }
    }
}
