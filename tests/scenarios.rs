//! Concrete end-to-end scenarios. S1/S2/S4 live as focused unit tests next
//! to the resolver/manager they exercise (`resolvers/damage.rs`,
//! `managers/racial.rs`); S3 lives next to `AuraManager::tick`. This file
//! covers the two scenarios that only manifest across the
//! cooldown/lock/round-loop boundary.

use std::rc::Rc;

use pawscale::{AbilityExecutor, BattleContext, BattleLoop};
use pawscale::config::EngineConfig;
use pawscale::model::{Creature, Team};
use pawscale::rng::RngStreams;
use pawscale::enums::Family;
use pawscale::scripts::JsonScriptSource;

fn ctx_with_one_pet_per_side() -> BattleContext {
    let scripts = Rc::new(JsonScriptSource::from_str(r#"{"abilities":{},"auras":{}}"#).unwrap());
    let mut ctx = BattleContext::new(RngStreams::seeded(7), EngineConfig::default(), scripts);
    ctx.add_creature(Creature::new(1, 1, Family::Beast, 4, 0, 25, [100, 0, 0], 300, 100, 60));
    ctx.add_creature(Creature::new(2, 1, Family::Beast, 4, 0, 25, [0, 0, 0], 300, 100, 50));
    ctx.teams.register_team(Team::new(10, vec![1]));
    ctx.teams.register_team(Team::new(20, vec![2]));
    ctx
}

/// S5 — Cooldown + slot-lock interaction: ability X (cooldown=3) used at
/// round R clears exactly three TURN_START ticks later; slot 1 locked for
/// duration=2 at the same round blocks rounds R+1 and R+2 and is free again
/// at R+3.
#[test]
fn s5_cooldown_and_slot_lock_interaction() {
    let mut ctx = ctx_with_one_pet_per_side();
    let ability_id = 100;

    // "Use X at round R": commit the cooldown and the slot lock directly,
    // the way `AbilityExecutor::set_cooldown` and opcode 117's handler
    // would after a real cast turn.
    ctx.cooldowns.set(1, ability_id, 3);
    ctx.teams.lock_slot(1, 1, 2);
    assert_eq!(ctx.cooldowns.get(1, ability_id), 3);
    assert!(ctx.teams.is_slot_locked(1, 1));

    // TURN_START of R+1.
    AbilityExecutor::on_turn_start(&mut ctx);
    assert_eq!(ctx.cooldowns.get(1, ability_id), 2);
    assert!(ctx.teams.is_slot_locked(1, 1), "slot must still be locked at R+1");

    // TURN_START of R+2.
    AbilityExecutor::on_turn_start(&mut ctx);
    assert_eq!(ctx.cooldowns.get(1, ability_id), 1);
    assert!(ctx.teams.is_slot_locked(1, 1), "slot must still be locked at R+2");

    // TURN_START of R+3: cooldown clears, slot lock clears.
    AbilityExecutor::on_turn_start(&mut ctx);
    assert_eq!(ctx.cooldowns.get(1, ability_id), 0);
    assert!(!ctx.teams.is_slot_locked(1, 1), "slot must be free at R+3");
}

/// The locked slot must not appear in `legal_actions` while locked, and
/// must reappear only once the lock has actually cleared (one round later
/// than its `duration` alone would suggest — see
/// `TeamManager::tick_down`'s doc comment).
#[test]
fn locked_slot_excluded_from_legal_actions_until_cleared() {
    let mut ctx = ctx_with_one_pet_per_side();
    ctx.teams.lock_slot(1, 1, 1);

    let slot_1_present = |ctx: &BattleContext| {
        BattleLoop::legal_actions(ctx, 10)
            .iter()
            .any(|a| matches!(a, pawscale::Action::UseAbility { slot: Some(1), .. }))
    };
    assert!(!slot_1_present(&ctx));

    AbilityExecutor::on_turn_start(&mut ctx);
    assert!(!slot_1_present(&ctx), "duration=1 still blocks its one full round");

    AbilityExecutor::on_turn_start(&mut ctx);
    assert!(slot_1_present(&ctx), "lock must be free the round after");
}
