//! S6 — determinism under a fixed seed: two battle contexts built from
//! identical creatures, teams, ability pack, and seed must produce
//! byte-identical battle logs and identical final creature state, round
//! after round, with no RNG stream drifting relative to the other run.

use std::rc::Rc;

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
            "cooldown": 1,
            "cast_turns": [
                [
                    {
                        "ability_id": 100,
                        "turn_id": 1,
                        "effect_id": 1,
                        "opcode_id": 24,
                        "order_index": 100,
                        "param_label": "points,accuracy",
                        "params_raw": [25, 100, 0, 0, 0, 0],
                        "aura_ability_id": null,
                        "scheduled_effect_rows": null
                    }
                ]
            ]
        }
    },
    "auras": {}
}"#;

fn build_ctx(seed: u64) -> BattleContext {
    let scripts = Rc::new(JsonScriptSource::from_str(ABILITY_PACK).unwrap());
    let mut ctx = BattleContext::new(RngStreams::seeded(seed), EngineConfig::default(), scripts);
    ctx.add_creature(Creature::new(1, 1, Family::Beast, 4, 0, 25, [100, 0, 0], 300, 120, 60));
    ctx.add_creature(Creature::new(2, 1, Family::Undead, 4, 0, 25, [100, 0, 0], 300, 90, 40));
    ctx.teams.register_team(Team::new(10, vec![1]));
    ctx.teams.register_team(Team::new(20, vec![2]));
    ctx
}

fn run_fixed_scenario(seed: u64, rounds: u32) -> BattleContext {
    let mut ctx = build_ctx(seed);
    for _ in 0..rounds {
        let action = Action::UseAbility { ability_id: 100, slot: Some(1) };
        let outcome = BattleLoop::run_round(&mut ctx, 10, 20, action.clone(), action);
        if outcome != RoundOutcome::Ongoing {
            break;
        }
    }
    ctx
}

#[test]
fn s6_identical_seed_produces_identical_logs_and_final_state() {
    let ctx_a = run_fixed_scenario(42, 10);
    let ctx_b = run_fixed_scenario(42, 10);

    let mut text_a = Vec::new();
    let mut text_b = Vec::new();
    ctx_a.log.write_text(&mut text_a).unwrap();
    ctx_b.log.write_text(&mut text_b).unwrap();
    assert_eq!(text_a, text_b, "identical seeds must produce byte-identical text logs");
    assert!(!text_a.is_empty());

    let mut jsonl_a = Vec::new();
    let mut jsonl_b = Vec::new();
    ctx_a.log.write_jsonl(&mut jsonl_a).unwrap();
    ctx_b.log.write_jsonl(&mut jsonl_b).unwrap();
    assert_eq!(jsonl_a, jsonl_b, "identical seeds must produce byte-identical jsonl logs");

    assert_eq!(ctx_a.creature(1).unwrap().hp, ctx_b.creature(1).unwrap().hp);
    assert_eq!(ctx_a.creature(2).unwrap().hp, ctx_b.creature(2).unwrap().hp);
    assert_eq!(ctx_a.rng.draw_counts(), ctx_b.rng.draw_counts());
    assert_eq!(ctx_a.round.round_number, ctx_b.round.round_number);
}

/// A different seed is extremely unlikely to reproduce the same log byte
/// for byte — this is a sanity check that the harness isn't accidentally
/// insensitive to the seed (e.g. always taking the RNG-exhaustion default).
#[test]
fn s6_different_seed_diverges() {
    let ctx_a = run_fixed_scenario(42, 10);
    let ctx_b = run_fixed_scenario(4242, 10);

    let mut text_a = Vec::new();
    let mut text_b = Vec::new();
    ctx_a.log.write_text(&mut text_a).unwrap();
    ctx_b.log.write_text(&mut text_b).unwrap();
    assert_ne!(text_a, text_b, "different seeds should not coincide on a 10-round trace");
}
