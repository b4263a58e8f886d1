//! S3 — aura tick-down timing, driven through the real TURN_START/TURN_END
//! lifecycle instead of `AuraManager::tick` in isolation (that unit-level
//! timing already lives next to `AuraManager` itself). This file checks that
//! `AbilityExecutor::on_turn_end` wires the tick into a live `BattleContext`
//! correctly: the log records an `aura_remove` on the round the aura
//! actually expires, and effective stats drop back to baseline the same
//! round.

use std::rc::Rc;

use pawscale::config::EngineConfig;
use pawscale::context::BattleContext;
use pawscale::enums::{self, Family};
use pawscale::executor::AbilityExecutor;
use pawscale::log::BattleEvent;
use pawscale::model::creature::{Creature, Team};
use pawscale::rng::RngStreams;
use pawscale::scripts::JsonScriptSource;

fn ctx_with_one_pet() -> BattleContext {
    let scripts = Rc::new(JsonScriptSource::from_str(r#"{"abilities":{},"auras":{}}"#).unwrap());
    let mut ctx = BattleContext::new(RngStreams::seeded(3), EngineConfig::default(), scripts);
    ctx.add_creature(Creature::new(1, 1, Family::Beast, 4, 0, 25, [0, 0, 0], 300, 100, 50));
    ctx.teams.register_team(Team::new(10, vec![1]));
    ctx
}

fn aura_removed_this_round(ctx: &BattleContext, aura_id: i64, before: usize) -> bool {
    ctx.log.records()[before..]
        .iter()
        .any(|e| matches!(e, BattleEvent::AuraRemove { aura_id: a, .. } if *a == aura_id))
}

/// An aura applied for `duration=2` without `tickdown_first_round` is a
/// no-op on the TURN_END of the round it was applied in (the round it was
/// just granted never counts against its own duration), decrements on the
/// next TURN_END, and is gone by the one after that.
#[test]
fn s3_aura_tick_down_timing_through_full_round_lifecycle() {
    let mut ctx = ctx_with_one_pet();
    let aura_id = 700;

    ctx.auras.apply(1, 1, aura_id, 2, false, 0);
    ctx.stats.sync_pet(ctx.creature_mut(1).unwrap(), &ctx.states, &ctx.auras);
    assert!(ctx.auras.get(1, aura_id).is_some());

    let before = ctx.log.records().len();
    AbilityExecutor::on_turn_end(&mut ctx);
    assert!(ctx.auras.get(1, aura_id).is_some(), "the grant round's own TURN_END is a no-op");
    assert_eq!(ctx.auras.get(1, aura_id).unwrap().remaining_duration, 2);
    assert!(!aura_removed_this_round(&ctx, aura_id, before));

    let before = ctx.log.records().len();
    AbilityExecutor::on_turn_end(&mut ctx);
    assert!(ctx.auras.get(1, aura_id).is_some(), "duration=2 still has one TURN_END left");
    assert_eq!(ctx.auras.get(1, aura_id).unwrap().remaining_duration, 1);
    assert!(!aura_removed_this_round(&ctx, aura_id, before));

    let before = ctx.log.records().len();
    AbilityExecutor::on_turn_end(&mut ctx);
    assert!(ctx.auras.get(1, aura_id).is_none(), "duration=2 is gone by the third TURN_END");
    assert!(aura_removed_this_round(&ctx, aura_id, before));
}

/// A permanent aura (`duration=-1`) never expires no matter how many
/// TURN_ENDs run, and its state contribution stays live throughout.
#[test]
fn permanent_aura_survives_many_turn_ends() {
    let mut ctx = ctx_with_one_pet();
    ctx.auras.apply(1, 1, 701, -1, false, 0);
    ctx.auras
        .get_mut(1, 701)
        .unwrap()
        .meta
        .state_binds
        .push(pawscale::model::aura::StateBind {
            state_id: enums::STATE_POWER_FLAT,
            value: 30,
            flags: 0,
        });

    for _ in 0..20 {
        AbilityExecutor::on_turn_end(&mut ctx);
    }

    assert!(ctx.auras.get(1, 701).is_some());
    let power = ctx.stats.effective_power(ctx.creature(1).unwrap(), &ctx.states, &ctx.auras);
    assert_eq!(power, 130);
}

/// Re-applying a stack-limited aura mid-lifecycle refreshes its duration
/// (so a tick that would otherwise have expired it doesn't) and increments
/// its stack count up to, but never past, `max_stacks`.
#[test]
fn stack_limited_aura_refresh_survives_a_tick_that_would_have_expired_it() {
    let mut ctx = ctx_with_one_pet();
    let aura_id = 702;

    ctx.auras.apply_with_stack_limit(1, 1, aura_id, 1, 3, 0);
    AbilityExecutor::on_turn_end(&mut ctx);
    assert!(ctx.auras.get(1, aura_id).is_some(), "the grant round's own TURN_END is still a no-op");
    AbilityExecutor::on_turn_end(&mut ctx);
    assert!(ctx.auras.get(1, aura_id).is_none(), "duration=1 with no refresh expires on the second TURN_END");

    ctx.auras.apply_with_stack_limit(1, 1, aura_id, 1, 3, 0);
    AbilityExecutor::on_turn_end(&mut ctx); // consumes the grant round's no-op tick
    ctx.auras.apply_with_stack_limit(1, 1, aura_id, 2, 3, 0);
    assert_eq!(ctx.auras.get(1, aura_id).unwrap().stacks, 2);
    AbilityExecutor::on_turn_end(&mut ctx);
    assert!(ctx.auras.get(1, aura_id).is_some(), "the refresh's own grant-round no-op outlives this tick");
}
