use std::collections::HashMap;

use crate::enums::SwapReason;
use crate::managers::aura::AuraManager;
use crate::managers::stats::sigma_state;
use crate::managers::state::StateManager;
use crate::model::creature::Team;

/// Roster, active index, swap rules, and ability lockouts for both sides of
/// a battle.
#[derive(Debug, Clone, Default)]
pub struct TeamManager {
    teams: HashMap<i64, Team>,
    pet_to_team: HashMap<i64, i64>,

    slot_locks: HashMap<i64, HashMap<u8, i64>>,
    ability_locks: HashMap<i64, HashMap<i64, i64>>,
    pending_next_ability_lock: HashMap<i64, i64>,
}

impl TeamManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_team(&mut self, team: Team) {
        for &pid in &team.pet_ids {
            self.pet_to_team.insert(pid, team.team_id);
        }
        self.teams.insert(team.team_id, team);
    }

    pub fn team_of_pet(&self, pet_id: i64) -> Option<i64> {
        self.pet_to_team.get(&pet_id).copied()
    }

    pub fn active_pet_id(&self, team_id: i64) -> Option<i64> {
        self.teams.get(&team_id).and_then(|t| t.active_pet_id())
    }

    pub fn team(&self, team_id: i64) -> Option<&Team> {
        self.teams.get(&team_id)
    }

    /// Every pet id on a team other than `team_id`'s, in no particular
    /// cross-team order. Used by targeting opcodes that search "the enemy
    /// side" without assuming exactly two teams.
    pub fn enemy_pet_ids(&self, team_id: i64) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .teams
            .iter()
            .filter(|(&id, _)| id != team_id)
            .flat_map(|(_, t)| t.pet_ids.iter().copied())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Unconditionally sets the active index, bypassing every lock. Used by
    /// the Battle Loop's death-replacement step, which falls back to this
    /// once no swap-in-legal candidate exists.
    pub fn set_active_index(&mut self, team_id: i64, new_index: usize) -> bool {
        match self.teams.get_mut(&team_id) {
            Some(team) if new_index < team.pet_ids.len() => {
                team.active_index = new_index;
                true
            }
            _ => false,
        }
    }

    fn aura_state_present(states: &StateManager, auras: &AuraManager, pet_id: i64, state_id: i64) -> bool {
        sigma_state(states, auras, pet_id, state_id) > 0
    }

    pub fn can_act(&self, pet_id: i64, states: &StateManager, auras: &AuraManager) -> bool {
        !Self::aura_state_present(states, auras, pet_id, crate::enums::STATE_TURN_LOCK)
    }

    pub fn can_swap_out(&self, pet_id: i64, states: &StateManager, auras: &AuraManager) -> bool {
        !Self::aura_state_present(states, auras, pet_id, crate::enums::STATE_SWAP_OUT_LOCK)
    }

    pub fn can_swap_in(&self, pet_id: i64, states: &StateManager, auras: &AuraManager) -> bool {
        !Self::aura_state_present(states, auras, pet_id, crate::enums::STATE_SWAP_IN_LOCK)
    }

    pub fn swap(
        &mut self,
        team_id: i64,
        new_index: usize,
        states: &StateManager,
        auras: &AuraManager,
    ) -> (bool, SwapReason) {
        let Some(team) = self.teams.get(&team_id) else {
            return (false, SwapReason::IndexOob);
        };
        if new_index >= team.pet_ids.len() {
            return (false, SwapReason::IndexOob);
        }
        if new_index == team.active_index {
            return (false, SwapReason::AlreadyActive);
        }
        let Some(active_pet) = team.active_pet_id() else {
            return (false, SwapReason::IndexOob);
        };
        let incoming_pet = team.pet_ids[new_index];
        if !self.can_swap_out(active_pet, states, auras) {
            return (false, SwapReason::SwapOutLock);
        }
        if !self.can_swap_in(incoming_pet, states, auras) {
            return (false, SwapReason::SwapInLock);
        }
        self.teams.get_mut(&team_id).unwrap().active_index = new_index;
        (true, SwapReason::Ok)
    }

    fn max_duration(existing: i64, new: i64) -> i64 {
        existing.max(new)
    }

    pub fn lock_slot(&mut self, pet_id: i64, slot: u8, duration: i64) {
        if duration <= 0 {
            return;
        }
        let m = self.slot_locks.entry(pet_id).or_default();
        let cur = m.get(&slot).copied().unwrap_or(0);
        m.insert(slot, Self::max_duration(cur, duration));
    }

    pub fn lock_ability_id(&mut self, pet_id: i64, ability_id: i64, duration: i64) {
        if duration <= 0 {
            return;
        }
        let m = self.ability_locks.entry(pet_id).or_default();
        let cur = m.get(&ability_id).copied().unwrap_or(0);
        m.insert(ability_id, Self::max_duration(cur, duration));
    }

    pub fn lock_next_ability(&mut self, pet_id: i64, duration: i64) {
        if duration <= 0 {
            return;
        }
        let cur = self.pending_next_ability_lock.get(&pet_id).copied().unwrap_or(0);
        self.pending_next_ability_lock
            .insert(pet_id, Self::max_duration(cur, duration));
    }

    pub fn is_slot_locked(&self, pet_id: i64, slot: u8) -> bool {
        self.slot_locks
            .get(&pet_id)
            .and_then(|m| m.get(&slot))
            .copied()
            .unwrap_or(0)
            > 0
    }

    pub fn is_ability_locked(&self, pet_id: i64, ability_id: i64) -> bool {
        self.ability_locks
            .get(&pet_id)
            .and_then(|m| m.get(&ability_id))
            .copied()
            .unwrap_or(0)
            > 0
    }

    /// Consumes any pending next-ability lock, redirecting it to the slot if
    /// known, else to the ability id.
    pub fn on_pet_use_ability(&mut self, pet_id: i64, slot: Option<u8>, ability_id: i64) {
        if let Some(duration) = self.pending_next_ability_lock.remove(&pet_id) {
            match slot {
                Some(s) => self.lock_slot(pet_id, s, duration),
                None => self.lock_ability_id(pet_id, ability_id, duration),
            }
        }
    }

    /// Unlike `CooldownManager::tick_down` (which clears on the tick that
    /// brings its counter to 0), a lock set with `duration=N` blocks exactly
    /// `N` full rounds: the counter survives `N` tick_down calls at `>= 0`
    /// and is only dropped once it goes negative on the `(N+1)`th.
    pub fn tick_down(&mut self) {
        for m in self.slot_locks.values_mut() {
            m.retain(|_, v| {
                *v -= 1;
                *v >= 0
            });
        }
        self.slot_locks.retain(|_, m| !m.is_empty());
        for m in self.ability_locks.values_mut() {
            m.retain(|_, v| {
                *v -= 1;
                *v >= 0
            });
        }
        self.ability_locks.retain(|_, m| !m.is_empty());
    }

    /// Forced swap that ejects `target_pet_id`'s team to a new active pet.
    /// Ignores voluntary swap-out locks (a forced eject is not a voluntary
    /// swap) but still respects swap-in locks on the candidate, and only
    /// ever picks an alive one. The candidate is chosen deterministically:
    /// `floor(roll * len)` clamped to `len - 1`, consuming exactly one
    /// `rand_gate`.
    pub fn force_swap_random(
        &mut self,
        target_pet_id: i64,
        states: &StateManager,
        auras: &AuraManager,
        is_alive: impl Fn(i64) -> bool,
        roll: f64,
    ) -> (bool, &'static str, Option<i64>) {
        let Some(&team_id) = self.pet_to_team.get(&target_pet_id) else {
            return (false, "NO_TEAM", None);
        };
        let team = self.teams.get(&team_id).unwrap();
        let candidates: Vec<i64> = team
            .pet_ids
            .iter()
            .copied()
            .filter(|&pid| pid != team.active_pet_id().unwrap_or(-1))
            .filter(|&pid| is_alive(pid))
            .filter(|&pid| self.can_swap_in(pid, states, auras))
            .collect();
        if candidates.is_empty() {
            return (false, "NO_SWAP_CAND", None);
        }
        let idx = ((roll * candidates.len() as f64).floor() as usize).min(candidates.len() - 1);
        let new_pet_id = candidates[idx];
        let new_index = team.pet_ids.iter().position(|&p| p == new_pet_id).unwrap();
        self.teams.get_mut(&team_id).unwrap().active_index = new_index;
        (true, "OK", Some(new_pet_id))
    }
}
