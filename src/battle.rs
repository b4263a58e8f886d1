//! Round lifecycle: legal-action enumeration, turn ordering, the two-action
//! round, death replacement, and winner detection.

use crate::context::BattleContext;
use crate::enums::{ActionKind, RoundPhase};
use crate::executor::AbilityExecutor;
use crate::model::creature::Creature;

/// One team's chosen action for a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Swap { team_id: i64, new_index: usize },
    UseAbility { ability_id: i64, slot: Option<u8> },
    Pass,
}

impl Action {
    fn kind(&self) -> ActionKind {
        match self {
            Action::Swap { .. } => ActionKind::Swap,
            Action::UseAbility { .. } => ActionKind::UseAbility,
            Action::Pass => ActionKind::Pass,
        }
    }
}

/// Outcome of a completed round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    Ongoing,
    TeamWon(i64),
    Draw,
}

struct TeamTurn {
    team_id: i64,
    action: Action,
    skipped: bool,
}

pub struct BattleLoop;

impl BattleLoop {
    /// Legal actions for `team_id`'s active pet. A dead active
    /// pet restricts the team to forced-swap candidates only (swap-in-legal
    /// first, with no candidate ever excluded outright — a team with no
    /// swap-in-legal alive pet still gets `[PASS]`, never a crash). A live
    /// active pet may use any non-cooldowned, non-locked ability, or
    /// voluntarily swap if not swap-out-locked. Falls back to `[PASS]` when
    /// nothing else is legal.
    pub fn legal_actions(ctx: &BattleContext, team_id: i64) -> Vec<Action> {
        let Some(active_id) = ctx.teams.active_pet_id(team_id) else {
            return vec![Action::Pass];
        };
        let Some(active) = ctx.creature(active_id) else {
            return vec![Action::Pass];
        };
        let Some(team) = ctx.teams.team(team_id) else {
            return vec![Action::Pass];
        };

        let mut actions = Vec::new();

        if !active.alive {
            for (idx, &pid) in team.pet_ids.iter().enumerate() {
                if idx == team.active_index {
                    continue;
                }
                if ctx.creature(pid).map(|c| c.alive).unwrap_or(false)
                    && ctx.teams.can_swap_in(pid, &ctx.states, &ctx.auras)
                {
                    actions.push(Action::Swap { team_id, new_index: idx });
                }
            }
            return if actions.is_empty() { vec![Action::Pass] } else { actions };
        }

        if ctx.teams.can_act(active_id, &ctx.states, &ctx.auras) {
            for (slot_idx, &ability_id) in active.ability_slots.iter().enumerate() {
                if ability_id == 0 {
                    continue;
                }
                let slot = (slot_idx + 1) as u8;
                if ctx.cooldowns.get(active_id, ability_id) > 0 {
                    continue;
                }
                if ctx.teams.is_slot_locked(active_id, slot) || ctx.teams.is_ability_locked(active_id, ability_id) {
                    continue;
                }
                actions.push(Action::UseAbility { ability_id, slot: Some(slot) });
            }
        }

        if ctx.teams.can_swap_out(active_id, &ctx.states, &ctx.auras) {
            for idx in 0..team.pet_ids.len() {
                if idx != team.active_index {
                    actions.push(Action::Swap { team_id, new_index: idx });
                }
            }
        }

        if actions.is_empty() {
            vec![Action::Pass]
        } else {
            actions
        }
    }

    /// Runs one full round for the two given teams against their chosen
    /// actions, returning the outcome after both actions (or fewer, on a
    /// mid-round death) have resolved.
    pub fn run_round(
        ctx: &mut BattleContext,
        team0_id: i64,
        team1_id: i64,
        action0: Action,
        action1: Action,
    ) -> RoundOutcome {
        // Step 1: TURN_START lifecycle, then racial on_round_start.
        AbilityExecutor::on_turn_start(ctx);
        let pet_ids = ctx.all_pet_ids();
        ctx.racial.on_round_start(&pet_ids);

        // Step 2: dead-active-pet auto-replacement, marking that side
        // skipped if no alive replacement exists.
        let skip0 = Self::auto_replace_if_dead(ctx, team0_id);
        let skip1 = Self::auto_replace_if_dead(ctx, team1_id);

        // Step 3: compute order.
        let t0 = TeamTurn { team_id: team0_id, action: action0, skipped: skip0 };
        let t1 = TeamTurn { team_id: team1_id, action: action1, skipped: skip1 };
        let (first, second) = Self::order_turns(ctx, t0, t1);

        // Step 4: freeze first/second actor ids, enter FIRST_ACTION.
        ctx.round.first_team_id = Some(first.team_id);
        ctx.round.second_team_id = Some(second.team_id);
        ctx.round.round_first_actor_id = ctx.teams.active_pet_id(first.team_id);
        ctx.round.round_second_actor_id = ctx.teams.active_pet_id(second.team_id);
        ctx.round.phase = Some(RoundPhase::FirstAction);

        // Step 5: execute the first team's action unless skipped; if its
        // target (the second team's active pet) died, mark second skipped.
        if !first.skipped {
            Self::execute_action(ctx, first.team_id, second.team_id, &first.action);
        }
        let mut second_skipped = second.skipped;
        if let Some(pid) = ctx.teams.active_pet_id(second.team_id) {
            if ctx.creature(pid).map(|c| !c.alive).unwrap_or(true) {
                second_skipped = true;
            }
        } else {
            second_skipped = true;
        }

        // Step 6: SECOND_ACTION.
        ctx.round.phase = Some(RoundPhase::SecondAction);
        if !second_skipped {
            Self::execute_action(ctx, second.team_id, first.team_id, &second.action);
        }

        // Step 7: clear phase, TURN_END lifecycle, racial on_round_end,
        // compute the winner.
        ctx.round.phase = None;
        AbilityExecutor::on_turn_end(ctx);
        Self::racial_round_end(ctx);

        let outcome = Self::compute_winner(ctx, team0_id, team1_id);
        if outcome == RoundOutcome::Ongoing && ctx.round.round_number >= ctx.config.max_rounds {
            RoundOutcome::Draw
        } else {
            outcome
        }
    }

    /// Replaces a dead active pet with the first swap-in-legal alive
    /// candidate in roster order, falling back to any alive candidate if
    /// none is swap-in-legal. Returns whether the team has no action this
    /// round (no active pet, or no alive pet at all to replace it with).
    fn auto_replace_if_dead(ctx: &mut BattleContext, team_id: i64) -> bool {
        let Some(active_id) = ctx.teams.active_pet_id(team_id) else {
            return true;
        };
        let alive = ctx.creature(active_id).map(|c| c.alive).unwrap_or(false);
        if alive {
            return false;
        }

        let Some(team) = ctx.teams.team(team_id).cloned() else {
            return true;
        };

        let mut candidate = None;
        for (idx, &pid) in team.pet_ids.iter().enumerate() {
            if idx == team.active_index {
                continue;
            }
            if ctx.creature(pid).map(|c| c.alive).unwrap_or(false)
                && ctx.teams.can_swap_in(pid, &ctx.states, &ctx.auras)
            {
                candidate = Some(idx);
                break;
            }
        }
        if candidate.is_none() {
            for (idx, &pid) in team.pet_ids.iter().enumerate() {
                if idx == team.active_index {
                    continue;
                }
                if ctx.creature(pid).map(|c| c.alive).unwrap_or(false) {
                    candidate = Some(idx);
                    break;
                }
            }
        }

        match candidate {
            Some(idx) => {
                let to_pet_id = ctx.teams.team(team_id).map(|t| t.pet_ids[idx]).unwrap_or(0);
                ctx.teams.set_active_index(team_id, idx);
                ctx.log.swap(team_id, active_id, to_pet_id, true, "DEAD_ACTIVE");
                false
            }
            None => true,
        }
    }

    /// Ordering rule: a one-shot priority marker beats
    /// action kind (`SWAP < USE_ABILITY < PASS`), which beats effective
    /// speed (higher first), which falls back to one `rand_gate` draw
    /// (`< 0.5` puts team 0 first).
    fn order_turns(ctx: &mut BattleContext, t0: TeamTurn, t1: TeamTurn) -> (TeamTurn, TeamTurn) {
        if let Some(priority_actor) = ctx.round.priority_actor_id.take() {
            if ctx.teams.active_pet_id(t0.team_id) == Some(priority_actor) {
                return (t0, t1);
            }
            if ctx.teams.active_pet_id(t1.team_id) == Some(priority_actor) {
                return (t1, t0);
            }
        }

        let k0 = t0.action.kind();
        let k1 = t1.action.kind();
        if k0 != k1 {
            return if k0 < k1 { (t0, t1) } else { (t1, t0) };
        }

        let speed0 = Self::active_speed(ctx, t0.team_id);
        let speed1 = Self::active_speed(ctx, t1.team_id);
        if speed0 != speed1 {
            return if speed0 > speed1 { (t0, t1) } else { (t1, t0) };
        }

        let roll = ctx.rng.rand_gate();
        let passed = roll < 0.5;
        ctx.log.gate(0, 0.5, roll, passed);
        if passed {
            (t0, t1)
        } else {
            (t1, t0)
        }
    }

    fn active_speed(ctx: &BattleContext, team_id: i64) -> i64 {
        let Some(pid) = ctx.teams.active_pet_id(team_id) else {
            return 0;
        };
        let Some(creature) = ctx.creature(pid) else {
            return 0;
        };
        ctx.stats.effective_speed(creature, &ctx.states, &ctx.auras)
    }

    /// Re-validates `action` against the live legal-action set before
    /// running it — a stale action (its ability went on cooldown, its swap
    /// target died, etc. since it was chosen) is replaced by the team's
    /// first currently-legal action.
    fn execute_action(ctx: &mut BattleContext, team_id: i64, opposing_team_id: i64, action: &Action) {
        let legal = Self::legal_actions(ctx, team_id);
        let action = if legal.contains(action) {
            action.clone()
        } else {
            legal.into_iter().next().unwrap_or(Action::Pass)
        };

        match action {
            Action::Swap { new_index, .. } => {
                let from_pet_id = ctx.teams.active_pet_id(team_id).unwrap_or(0);
                let (ok, reason) = ctx.teams.swap(team_id, new_index, &ctx.states, &ctx.auras);
                if ok {
                    let to_pet_id = ctx.teams.active_pet_id(team_id).unwrap_or(0);
                    ctx.log.swap(team_id, from_pet_id, to_pet_id, false, &format!("{reason:?}"));
                }
            }
            Action::UseAbility { ability_id, slot } => {
                let Some(actor_id) = ctx.teams.active_pet_id(team_id) else {
                    return;
                };
                let Some(target_id) = ctx.teams.active_pet_id(opposing_team_id) else {
                    return;
                };
                AbilityExecutor::use_ability_id(ctx, actor_id, target_id, ability_id, slot);
            }
            Action::Pass => {}
        }
    }

    /// Drives `RacialPassiveManager::on_round_end` over a cloned snapshot of
    /// every creature, then writes the (possibly healed, possibly finally
    /// dead) result back — the same clone-mutate-writeback shape the damage
    /// resolver uses for per-pet mutation against a `HashMap`-backed roster.
    fn racial_round_end(ctx: &mut BattleContext) {
        let ids = ctx.all_pet_ids();
        let mut pets: Vec<Creature> = ids.iter().filter_map(|id| ctx.creature(*id).cloned()).collect();
        ctx.racial.on_round_end(&mut pets);
        for pet in pets {
            if let Some(slot) = ctx.creature_mut(pet.id) {
                *slot = pet;
            }
        }
    }

    fn compute_winner(ctx: &BattleContext, team0_id: i64, team1_id: i64) -> RoundOutcome {
        let has_alive = |team_id: i64| -> bool {
            ctx.teams
                .team(team_id)
                .map(|t| t.pet_ids.iter().any(|id| ctx.creature(*id).map(|c| c.alive).unwrap_or(false)))
                .unwrap_or(false)
        };
        match (has_alive(team0_id), has_alive(team1_id)) {
            (true, false) => RoundOutcome::TeamWon(team0_id),
            (false, true) => RoundOutcome::TeamWon(team1_id),
            (false, false) => RoundOutcome::Draw,
            (true, true) => RoundOutcome::Ongoing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::enums::Family;
    use crate::model::creature::{Creature, Team};
    use crate::rng::RngStreams;
    use crate::scripts::JsonScriptSource;
    use std::rc::Rc;

    fn ctx_with_two_pets() -> BattleContext {
        let scripts = Rc::new(JsonScriptSource::from_str(r#"{"abilities":{},"auras":{}}"#).unwrap());
        let mut ctx = BattleContext::new(RngStreams::seeded(1), EngineConfig::default(), scripts);
        ctx.add_creature(Creature::new(1, 1, Family::Beast, 4, 0, 25, [0, 0, 0], 300, 100, 60));
        ctx.add_creature(Creature::new(2, 1, Family::Beast, 4, 0, 25, [0, 0, 0], 300, 100, 50));
        ctx.teams.register_team(Team::new(10, vec![1]));
        ctx.teams.register_team(Team::new(20, vec![2]));
        ctx
    }

    #[test]
    fn legal_actions_falls_back_to_pass_with_no_abilities() {
        let ctx = ctx_with_two_pets();
        let actions = BattleLoop::legal_actions(&ctx, 10);
        assert_eq!(actions, vec![Action::Pass]);
    }

    #[test]
    fn faster_pet_acts_first_on_equal_action_kind() {
        let mut ctx = ctx_with_two_pets();
        let outcome = BattleLoop::run_round(&mut ctx, 10, 20, Action::Pass, Action::Pass);
        assert_eq!(ctx.round.round_first_actor_id, Some(1));
        assert_eq!(ctx.round.round_second_actor_id, Some(2));
        assert_eq!(outcome, RoundOutcome::Ongoing);
        assert!(ctx.round.phase.is_none());
    }

    #[test]
    fn dead_team_with_no_replacement_is_a_loss() {
        let mut ctx = ctx_with_two_pets();
        ctx.creature_mut(2).unwrap().alive = false;
        ctx.creature_mut(2).unwrap().hp = 0;
        let outcome = BattleLoop::run_round(&mut ctx, 10, 20, Action::Pass, Action::Pass);
        assert_eq!(outcome, RoundOutcome::TeamWon(10));
    }

    #[test]
    fn max_rounds_forces_a_draw() {
        let mut ctx = ctx_with_two_pets();
        ctx.config.max_rounds = 1;
        let outcome = BattleLoop::run_round(&mut ctx, 10, 20, Action::Pass, Action::Pass);
        assert_eq!(outcome, RoundOutcome::Draw);
    }
}
