use std::collections::HashMap;

use crate::enums::Family;
use crate::model::creature::Creature;

#[derive(Debug, Clone, Copy, Default)]
struct RacialState {
    dragonkin_buff_rounds: i64,
    undead_immortal: bool,
    undead_pending_death: bool,
    mechanical_revived: bool,
    humanoid_dealt_damage: bool,
}

/// Ten family-specific hooks sharing per-creature counters.
#[derive(Debug, Clone, Default)]
pub struct RacialPassiveManager {
    by_pet: HashMap<i64, RacialState>,
}

impl RacialPassiveManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, pet_id: i64) -> &mut RacialState {
        self.by_pet.entry(pet_id).or_default()
    }

    /// +50% if the actor's Dragonkin buff-round counter is >0.
    pub fn get_damage_multiplier(&self, actor_id: i64) -> f64 {
        match self.by_pet.get(&actor_id) {
            Some(s) if s.dragonkin_buff_rounds > 0 => 1.5,
            _ => 1.0,
        }
    }

    /// Humanoid marks damage dealt. Dragonkin grants itself a 1-round +50%
    /// buff when this hit crosses the target's 25% hp threshold.
    pub fn on_damage_dealt(
        &mut self,
        actor: &Creature,
        target_max_hp: i64,
        hp_before: i64,
        hp_after: i64,
    ) {
        if actor.family == Family::Humanoid {
            self.entry(actor.id).humanoid_dealt_damage = true;
        }
        if actor.family == Family::Dragonkin {
            let threshold = (0.25 * target_max_hp as f64).floor() as i64;
            if hp_before > threshold && threshold >= hp_after {
                self.entry(actor.id).dragonkin_buff_rounds = 1;
            }
        }
    }

    /// Returns `true` if the pet was revived in place (Undead immortality
    /// window, or a Mechanical one-time revive) and should not be treated as
    /// dead this round.
    pub fn on_pet_death(&mut self, pet: &mut Creature) -> bool {
        match pet.family {
            Family::Undead => {
                let s = self.entry(pet.id);
                if !s.undead_immortal && !s.undead_pending_death {
                    s.undead_immortal = true;
                    s.undead_pending_death = true;
                    pet.hp = 1;
                    pet.alive = true;
                    return true;
                }
                false
            }
            Family::Mechanical => {
                let s = self.entry(pet.id);
                if !s.mechanical_revived {
                    s.mechanical_revived = true;
                    pet.hp = (0.2 * pet.max_hp as f64).floor().max(1.0) as i64;
                    pet.alive = true;
                    return true;
                }
                false
            }
            _ => false,
        }
    }

    pub fn is_undead_immortal(&self, pet_id: i64) -> bool {
        self.by_pet.get(&pet_id).map(|s| s.undead_immortal).unwrap_or(false)
    }

    pub fn should_ignore_damage(&self, target_id: i64) -> bool {
        self.is_undead_immortal(target_id)
    }

    pub fn on_round_start(&mut self, pet_ids: &[i64]) {
        for &id in pet_ids {
            let s = self.entry(id);
            s.humanoid_dealt_damage = false;
            if s.dragonkin_buff_rounds > 0 {
                s.dragonkin_buff_rounds -= 1;
            }
        }
    }

    /// Humanoid heal + Undead real death. Returns pet ids that died for real
    /// this call so callers can finalize `alive=false` bookkeeping elsewhere.
    pub fn on_round_end(&mut self, pets: &mut [Creature]) -> Vec<i64> {
        let mut died = Vec::new();
        for pet in pets.iter_mut() {
            let Some(s) = self.by_pet.get(&pet.id).copied() else {
                continue;
            };
            if pet.alive && pet.family == Family::Humanoid && s.humanoid_dealt_damage {
                let heal = ((0.04 * pet.max_hp as f64).floor() as i64).max(1);
                pet.hp = (pet.hp + heal).min(pet.max_hp);
            }
            if pet.family == Family::Undead && s.undead_pending_death {
                pet.hp = 0;
                pet.alive = false;
                let entry = self.entry(pet.id);
                entry.undead_immortal = false;
                entry.undead_pending_death = false;
                died.push(pet.id);
            }
        }
        died
    }

    /// Critter: reduces an incoming CC aura's duration by 1, floored at 0.
    pub fn apply_cc_duration_reduction(&self, target: &Creature, duration: i64) -> i64 {
        if target.family == Family::Critter {
            (duration - 1).max(0)
        } else {
            duration
        }
    }
}
