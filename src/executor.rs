//! Cross-row and cross-turn execution: running a sorted set of effect rows
//! as one turn, a creature's full ability use, and
//! the periodic/aura tick that brackets every round.

use crate::context::BattleContext;
use crate::effects::dispatcher::Dispatcher;
use crate::enums::RoundPhase;
use crate::model::effect_row::{CastTurn, EffectRow};

/// What happened after running one turn's worth of effect rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Every row ran (or the turn was halted early by `STOP_TURN`); the
    /// caller may proceed to the next cast turn, if any.
    Continue,
    /// A row returned `STOP_ABILITY`; the caller must not run any further
    /// cast turns for this ability use.
    StopAbility,
}

/// Runs one cast turn's effect rows in `(order_index, effect_id)` order.
pub struct AbilityTurnExecutor;

impl AbilityTurnExecutor {
    /// Resets the per-turn `acc_ctx` fields, then dispatches each row in
    /// order against `target_id` (or the live one-shot override, consumed
    /// immediately after the row that set it asked to consume it), tracking
    /// `prev_effect_executed` / `prev_effect_flow_control` / `prev_prop_id`
    /// for the next row to observe.
    pub fn execute_turn(
        ctx: &mut BattleContext,
        actor_id: i64,
        target_id: i64,
        rows: &[EffectRow],
    ) -> TurnOutcome {
        ctx.acc_ctx.reset_for_turn();

        let mut sorted: Vec<&EffectRow> = rows.iter().collect();
        sorted.sort_by_key(|r| r.sort_key());

        for row in sorted {
            let effective_target = ctx.acc_ctx.target_override_id.unwrap_or(target_id);

            let result = Dispatcher::dispatch(row, ctx, actor_id, effective_target);

            if ctx.acc_ctx.target_override_id.is_some() && ctx.acc_ctx.consume_target_override {
                ctx.acc_ctx.target_override_id = None;
                ctx.acc_ctx.consume_target_override = false;
            }

            ctx.acc_ctx.prev_prop_id = Some(row.effect_id);
            ctx.acc_ctx.prev_effect_executed = result.executed;
            ctx.acc_ctx.prev_effect_flow_control = result.flow_control;

            if let Some(warn) = result.warn {
                log::debug!(
                    "ability={} turn={} effect={} opcode={} warn={}",
                    row.ability_id,
                    row.turn_id,
                    row.effect_id,
                    row.opcode_id,
                    warn
                );
                ctx.log.effect_result(row.effect_id, warn.as_str(), None);
            }

            match result.flow_control {
                crate::enums::FlowControl::Continue => {}
                crate::enums::FlowControl::StopTurn => return TurnOutcome::Continue,
                crate::enums::FlowControl::StopAbility => return TurnOutcome::StopAbility,
            }
        }
        TurnOutcome::Continue
    }
}

/// Writes every computed `EffectiveStats` field back onto its owning
/// creature, splitting `ctx`'s fields so the stats resolver, state map, and
/// aura map can all be borrowed alongside the creature map being mutated.
fn sync_all_stats(ctx: &mut BattleContext) {
    let BattleContext {
        creatures, stats, states, auras, ..
    } = ctx;
    for creature in creatures.values_mut() {
        stats.sync_pet(creature, &*states, &*auras);
    }
}

/// Runs a creature's periodic aura payloads for one `RoundPhase`, and the
/// TURN_END aura-duration tick that follows them.
pub struct TickEngine;

impl TickEngine {
    /// Executes every live aura's payload registered for `phase`, owner by
    /// owner in ascending pet-id then aura-id order, skipping any payload
    /// whose caster or owner has left the battle since it was attached.
    pub fn run_periodics(ctx: &mut BattleContext, phase: RoundPhase) {
        for owner_id in ctx.all_pet_ids() {
            let owner_auras = ctx.auras.list_owner(owner_id);
            let mut aura_ids: Vec<i64> = owner_auras.keys().copied().collect();
            aura_ids.sort_unstable();

            for aura_id in aura_ids {
                let inst = &owner_auras[&aura_id];
                let Some(rows) = inst.periodic_payloads.get(&phase) else {
                    continue;
                };
                if rows.is_empty() {
                    continue;
                }
                let caster_id = inst.caster_pet_id;
                if ctx.creature(caster_id).is_none() || ctx.creature(owner_id).is_none() {
                    continue;
                }
                let rows = rows.clone();
                AbilityTurnExecutor::execute_turn(ctx, caster_id, owner_id, &rows);
            }
        }
    }

    /// Ticks every owner's aura durations down by one, logging each
    /// `(owner, aura)` pair that expired. Returns whether anything expired,
    /// so the caller knows whether the weather cache needs re-checking.
    pub fn tick_auras(ctx: &mut BattleContext) -> bool {
        let mut any_expired = false;
        for owner_id in ctx.all_pet_ids() {
            for expired in ctx.auras.tick(owner_id) {
                any_expired = true;
                log::debug!("aura_expire owner={} aura={}", expired.owner_pet_id, expired.aura_id);
                ctx.log.aura_remove(expired.aura_id, expired.owner_pet_id, "EXPIRED");
            }
        }
        any_expired
    }
}

/// What prevented (or didn't) an ability use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseAbilityOutcome {
    Executed,
    TurnLock,
    Cooldown,
    NoCastTurns,
}

/// Per-round TURN_START/TURN_END lifecycle and the two ways to use an
/// ability: with rows already resolved, or by id against the script source.
pub struct AbilityExecutor;

impl AbilityExecutor {
    /// TURN_START: advance the round counter, tick cooldowns and team
    /// lockouts, run the scheduler and execute any packet it hands back,
    /// run TURN_START periodics, then sync effective stats.
    pub fn on_turn_start(ctx: &mut BattleContext) {
        ctx.round.round_number += 1;
        ctx.cooldowns.tick_down();
        ctx.teams.tick_down();
        ctx.log.cooldown_tick();

        for packet in ctx.scheduler.tick() {
            if ctx.creature(packet.actor_id).is_none() || ctx.creature(packet.target_id).is_none() {
                continue;
            }
            AbilityTurnExecutor::execute_turn(ctx, packet.actor_id, packet.target_id, &packet.effect_rows);
        }

        TickEngine::run_periodics(ctx, RoundPhase::TurnStart);
        sync_all_stats(ctx);
    }

    /// TURN_END: TURN_END periodics before the aura tick, then the aura
    /// tick itself, then a stats sync, then a weather-cache refresh if
    /// anything expired.
    pub fn on_turn_end(ctx: &mut BattleContext) {
        TickEngine::run_periodics(ctx, RoundPhase::TurnEnd);
        let any_expired = TickEngine::tick_auras(ctx);
        sync_all_stats(ctx);
        if any_expired {
            ctx.weather.clear_if_gone(&ctx.auras);
        }
    }

    /// Consumes any pending next-ability lock at the moment an ability is
    /// committed to, before its own rows run.
    fn commit_use(ctx: &mut BattleContext, actor_id: i64, ability_id: i64, slot: Option<u8>) {
        ctx.teams.on_pet_use_ability(actor_id, slot, ability_id);
    }

    /// Sets the ability's cooldown after its rows have run, folding in
    /// whatever opcode-246 slot modifier those rows left in `trap_counters`.
    fn set_cooldown(ctx: &mut BattleContext, actor_id: i64, ability_id: i64, base_cooldown: i64, slot: Option<u8>) {
        if base_cooldown <= 0 {
            return;
        }
        let modifier = slot
            .and_then(|s| ctx.acc_ctx.trap_counters.get(&(1_000_000 + s as i64)).copied())
            .unwrap_or(0);
        ctx.cooldowns.set(actor_id, ability_id, (base_cooldown + modifier).max(0));
    }

    /// Executes an already-resolved set of cast turns directly (used by the
    /// scheduler and by callers that bypass the script source entirely,
    /// e.g. aura periodic payloads routed through here instead of
    /// `TickEngine`).
    pub fn use_ability(
        ctx: &mut BattleContext,
        actor_id: i64,
        target_id: i64,
        ability_id: i64,
        cast_turns: &[CastTurn],
        base_cooldown: i64,
        slot: Option<u8>,
    ) -> UseAbilityOutcome {
        if !ctx.teams.can_act(actor_id, &ctx.states, &ctx.auras) {
            return UseAbilityOutcome::TurnLock;
        }
        if ctx.cooldowns.get(actor_id, ability_id) > 0 {
            return UseAbilityOutcome::Cooldown;
        }

        ctx.log.ability_cast_start(actor_id, target_id, ability_id);
        Self::commit_use(ctx, actor_id, ability_id, slot);
        for turn in cast_turns {
            if AbilityTurnExecutor::execute_turn(ctx, actor_id, target_id, turn) == TurnOutcome::StopAbility {
                break;
            }
        }
        Self::set_cooldown(ctx, actor_id, ability_id, base_cooldown, slot);
        ctx.log.ability_cast_end(actor_id, ability_id);
        UseAbilityOutcome::Executed
    }

    /// Data-driven variant: looks the ability's cast turns and cooldown up
    /// from `ctx.scripts` before delegating to [`Self::use_ability`].
    pub fn use_ability_id(
        ctx: &mut BattleContext,
        actor_id: i64,
        target_id: i64,
        ability_id: i64,
        slot: Option<u8>,
    ) -> UseAbilityOutcome {
        if !ctx.teams.can_act(actor_id, &ctx.states, &ctx.auras) {
            return UseAbilityOutcome::TurnLock;
        }
        if ctx.cooldowns.get(actor_id, ability_id) > 0 {
            return UseAbilityOutcome::Cooldown;
        }
        let Ok(cast_turns) = ctx.scripts.get_ability_cast_turns(ability_id) else {
            return UseAbilityOutcome::NoCastTurns;
        };
        let cast_turns = cast_turns.to_vec();
        let base_cooldown = ctx.scripts.get_ability_cooldown(ability_id);

        ctx.log.ability_cast_start(actor_id, target_id, ability_id);
        Self::commit_use(ctx, actor_id, ability_id, slot);
        for turn in &cast_turns {
            if AbilityTurnExecutor::execute_turn(ctx, actor_id, target_id, turn) == TurnOutcome::StopAbility {
                break;
            }
        }
        Self::set_cooldown(ctx, actor_id, ability_id, base_cooldown, slot);
        ctx.log.ability_cast_end(actor_id, ability_id);
        UseAbilityOutcome::Executed
    }
}
