use std::collections::HashMap;

use crate::model::aura::{AuraApplyResult, AuraInstance};

/// An `(owner, aura)` pair that expired this tick.
#[derive(Debug, Clone, Copy)]
pub struct AuraExpire {
    pub owner_pet_id: i64,
    pub aura_id: i64,
}

/// Per-owner map of active auras. At most one instance per
/// `(owner, aura_id)`.
#[derive(Debug, Clone, Default)]
pub struct AuraManager {
    by_owner: HashMap<i64, HashMap<i64, AuraInstance>>,
}

impl AuraManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, owner_pet_id: i64, aura_id: i64) -> Option<&AuraInstance> {
        self.by_owner.get(&owner_pet_id).and_then(|m| m.get(&aura_id))
    }

    /// Mutable access for attaching periodic payloads/meta after creation
    /// (`attach_periodic_to_aura`, `attach_meta_to_aura`).
    pub fn get_mut(&mut self, owner_pet_id: i64, aura_id: i64) -> Option<&mut AuraInstance> {
        self.by_owner.get_mut(&owner_pet_id).and_then(|m| m.get_mut(&aura_id))
    }

    /// Stable enumeration of an owner's auras.
    pub fn list_owner(&self, owner_pet_id: i64) -> HashMap<i64, AuraInstance> {
        self.by_owner.get(&owner_pet_id).cloned().unwrap_or_default()
    }

    pub fn remove(&mut self, owner_pet_id: i64, aura_id: i64) {
        if let Some(m) = self.by_owner.get_mut(&owner_pet_id) {
            m.remove(&aura_id);
            if m.is_empty() {
                self.by_owner.remove(&owner_pet_id);
            }
        }
    }

    fn normalize_duration(duration: i64) -> i64 {
        if duration < 0 && duration != -1 {
            0
        } else {
            duration
        }
    }

    /// Plain apply: duration=0 expires immediately with no instance created.
    /// On an existing pair, refreshes (all fields but `stacks` overwritten;
    /// `stacks` resets to 1 — only the stack-limit variant preserves stacks).
    pub fn apply(
        &mut self,
        owner_pet_id: i64,
        caster_pet_id: i64,
        aura_id: i64,
        duration: i64,
        tickdown_first_round: bool,
        source_effect_id: i64,
    ) -> AuraApplyResult {
        let duration = Self::normalize_duration(duration);
        if duration == 0 {
            return AuraApplyResult {
                applied: false,
                refreshed: false,
                reason: "EXPIRED_IMMEDIATELY",
                aura: None,
            };
        }

        let owner_map = self.by_owner.entry(owner_pet_id).or_default();
        let refreshed = owner_map.contains_key(&aura_id);
        let inst = AuraInstance::new(
            owner_pet_id,
            caster_pet_id,
            aura_id,
            duration,
            tickdown_first_round,
            source_effect_id,
        );
        owner_map.insert(aura_id, inst.clone());

        AuraApplyResult {
            applied: !refreshed,
            refreshed,
            reason: "OK",
            aura: Some(inst),
        }
    }

    /// Stack-limited apply: a fresh instance starts at `stacks=1` with
    /// `tickdown_first_round=false`; a refresh mutates the existing instance
    /// in place, incrementing `stacks` by 1 only while strictly below
    /// `max_stacks`, and leaves `tickdown_first_round` untouched.
    pub fn apply_with_stack_limit(
        &mut self,
        owner_pet_id: i64,
        caster_pet_id: i64,
        aura_id: i64,
        duration: i64,
        max_stacks: i64,
        source_effect_id: i64,
    ) -> AuraApplyResult {
        let duration = Self::normalize_duration(duration);
        let max_stacks = if max_stacks <= 0 { 1 } else { max_stacks };
        if duration == 0 {
            return AuraApplyResult {
                applied: false,
                refreshed: false,
                reason: "EXPIRED_IMMEDIATELY",
                aura: None,
            };
        }

        let owner_map = self.by_owner.entry(owner_pet_id).or_default();
        if let Some(existing) = owner_map.get_mut(&aura_id) {
            existing.remaining_duration = duration;
            existing.caster_pet_id = caster_pet_id;
            existing.source_effect_id = source_effect_id;
            existing.just_applied = true;
            if existing.stacks < max_stacks {
                existing.stacks += 1;
            }
            return AuraApplyResult {
                applied: false,
                refreshed: true,
                reason: "OK",
                aura: Some(existing.clone()),
            };
        }

        let inst = AuraInstance::new(
            owner_pet_id,
            caster_pet_id,
            aura_id,
            duration,
            false,
            source_effect_id,
        );
        owner_map.insert(aura_id, inst.clone());
        AuraApplyResult {
            applied: true,
            refreshed: false,
            reason: "OK",
            aura: Some(inst),
        }
    }

    /// Tick algorithm: called exactly once per owner at
    /// TURN_END. Returns the auras that expired this tick.
    pub fn tick(&mut self, owner_pet_id: i64) -> Vec<AuraExpire> {
        let mut expired = Vec::new();
        let Some(owner_map) = self.by_owner.get_mut(&owner_pet_id) else {
            return expired;
        };

        owner_map.retain(|&aura_id, inst| {
            if inst.remaining_duration == -1 {
                inst.just_applied = false;
                return true;
            }
            if inst.just_applied {
                inst.just_applied = false;
                if inst.tickdown_first_round && inst.remaining_duration > 0 {
                    inst.remaining_duration -= 1;
                    if inst.remaining_duration <= 0 {
                        expired.push(AuraExpire { owner_pet_id, aura_id });
                        return false;
                    }
                }
                return true;
            }
            inst.remaining_duration -= 1;
            if inst.remaining_duration <= 0 {
                expired.push(AuraExpire { owner_pet_id, aura_id });
                return false;
            }
            true
        });

        if owner_map.is_empty() {
            self.by_owner.remove(&owner_pet_id);
        }
        expired
    }

    pub fn remove_all(&mut self, owner_pet_id: i64) -> Vec<i64> {
        let removed: Vec<i64> = self
            .by_owner
            .get(&owner_pet_id)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default();
        self.by_owner.remove(&owner_pet_id);
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_duration_expires_immediately() {
        let mut am = AuraManager::new();
        let r = am.apply(1, 1, 500, 0, false, 0);
        assert!(!r.applied && !r.refreshed);
        assert!(am.get(1, 500).is_none());
    }

    #[test]
    fn permanent_aura_never_expires() {
        let mut am = AuraManager::new();
        am.apply(1, 1, 500, -1, false, 0);
        for _ in 0..10 {
            let expired = am.tick(1);
            assert!(expired.is_empty());
        }
        assert!(am.get(1, 500).is_some());
    }

    #[test]
    fn just_applied_without_tickdown_first_round_is_noop_on_first_tick() {
        let mut am = AuraManager::new();
        am.apply(1, 1, 500, 2, false, 0);
        assert!(am.tick(1).is_empty());
        assert_eq!(am.get(1, 500).unwrap().remaining_duration, 2);
        assert!(am.tick(1).is_empty());
        assert_eq!(am.get(1, 500).unwrap().remaining_duration, 1);
        assert_eq!(am.tick(1).len(), 1);
        assert!(am.get(1, 500).is_none());
    }

    #[test]
    fn just_applied_with_tickdown_first_round_decrements_immediately() {
        let mut am = AuraManager::new();
        am.apply(1, 1, 500, 2, true, 0);
        assert!(am.tick(1).is_empty());
        assert_eq!(am.get(1, 500).unwrap().remaining_duration, 1);
    }

    #[test]
    fn stack_limit_caps_at_max() {
        let mut am = AuraManager::new();
        am.apply_with_stack_limit(1, 1, 500, 3, 2, 0);
        assert_eq!(am.get(1, 500).unwrap().stacks, 1);
        am.apply_with_stack_limit(1, 1, 500, 3, 2, 0);
        assert_eq!(am.get(1, 500).unwrap().stacks, 2);
        am.apply_with_stack_limit(1, 1, 500, 3, 2, 0);
        assert_eq!(am.get(1, 500).unwrap().stacks, 2);
    }

    #[test]
    fn plain_apply_resets_stacks_to_one_on_refresh() {
        let mut am = AuraManager::new();
        am.apply_with_stack_limit(1, 1, 500, 3, 5, 0);
        am.apply_with_stack_limit(1, 1, 500, 3, 5, 0);
        assert_eq!(am.get(1, 500).unwrap().stacks, 2);
        am.apply(1, 1, 500, 3, false, 0);
        assert_eq!(am.get(1, 500).unwrap().stacks, 1);
    }

    #[test]
    fn remove_all_clears_owner() {
        let mut am = AuraManager::new();
        am.apply(1, 1, 500, -1, false, 0);
        am.apply(1, 1, 501, -1, false, 0);
        let removed = am.remove_all(1);
        assert_eq!(removed.len(), 2);
        assert!(am.list_owner(1).is_empty());
    }
}
