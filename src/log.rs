//! Battle log: a structured record of what happened during a battle,
//! readable as line-oriented text or replayed as newline-delimited JSON
//! events. Distinct from the `log` crate facade used elsewhere in
//! this crate for internal diagnostics — this module is the battle's own
//! event stream, data a caller can persist or diff against.

use std::fmt;
use std::io::{self, Write};

use serde::Serialize;
use serde_json::Value;

/// One battle-log event. Serializes as `{"type": "...", ...fields}` so a
/// consumer can discriminate on `type` without a wrapper struct.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum BattleEvent {
    #[serde(rename = "ABILITY_CAST_START")]
    AbilityCastStart { actor_id: i64, target_id: i64, ability_id: i64 },

    #[serde(rename = "DAMAGE_APPLIED")]
    DamageApplied {
        actor_id: i64,
        target_id: i64,
        ability_id: i64,
        effect_id: i64,
        target_hp_before: i64,
        target_hp_after: i64,
        actual_damage: i64,
    },

    #[serde(rename = "ABILITY_EFFECTS")]
    AbilityEffects {
        actor_id: i64,
        ability_id: i64,
        diffs: Value,
        final_state: Value,
    },

    #[serde(rename = "ABILITY_CAST_END")]
    AbilityCastEnd { actor_id: i64, ability_id: i64 },

    #[serde(rename = "effect_result")]
    EffectResult { effect_id: i64, code: String, reason: Option<String> },

    #[serde(rename = "damage")]
    Damage { effect_id: i64, actor_id: i64, target_id: i64, final_damage: i64, trace: Value },

    #[serde(rename = "heal")]
    Heal { effect_id: i64, actor_id: i64, target_id: i64, final_heal: i64, trace: Value },

    #[serde(rename = "state_set")]
    StateSet { state_id: i64, value: i64, target_id: i64 },

    #[serde(rename = "aura_apply")]
    AuraApply {
        aura_id: i64,
        owner_id: i64,
        duration: i64,
        tickdown_first_round: bool,
        reason: String,
    },

    #[serde(rename = "aura_refresh")]
    AuraRefresh { aura_id: i64, owner_id: i64, remaining_duration: i64, tickdown_first_round: bool },

    #[serde(rename = "aura_stack")]
    AuraStack { aura_id: i64, owner_id: i64, stacks: i64, max_stack: i64 },

    #[serde(rename = "aura_remove")]
    AuraRemove { aura_id: i64, owner_id: i64, reason: String },

    #[serde(rename = "dispel")]
    Dispel { effect_id: i64, target_id: i64, removed_count: i64, reason: String },

    #[serde(rename = "cooldown_tick")]
    CooldownTick,

    #[serde(rename = "gate")]
    Gate { effect_id: i64, chance_norm: f64, roll: f64, passed: bool },

    #[serde(rename = "swap")]
    Swap { team_id: i64, from_pet_id: i64, to_pet_id: i64, forced: bool, reason: String },
}

impl fmt::Display for BattleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BattleEvent::AbilityCastStart { actor_id, target_id, ability_id } => {
                write!(f, "ABILITY_CAST_START actor={actor_id} target={target_id} ability={ability_id}")
            }
            BattleEvent::DamageApplied {
                actor_id,
                target_id,
                ability_id,
                effect_id,
                target_hp_before,
                target_hp_after,
                actual_damage,
            } => write!(
                f,
                "DAMAGE_APPLIED actor={actor_id} target={target_id} ability={ability_id} effect={effect_id} hp={target_hp_before}->{target_hp_after} damage={actual_damage}"
            ),
            BattleEvent::AbilityEffects { actor_id, ability_id, .. } => {
                write!(f, "ABILITY_EFFECTS actor={actor_id} ability={ability_id}")
            }
            BattleEvent::AbilityCastEnd { actor_id, ability_id } => {
                write!(f, "ABILITY_CAST_END actor={actor_id} ability={ability_id}")
            }
            BattleEvent::EffectResult { effect_id, code, reason } => match reason {
                Some(r) => write!(f, "effect_result effect={effect_id} code={code} reason={r}"),
                None => write!(f, "effect_result effect={effect_id} code={code}"),
            },
            BattleEvent::Damage { effect_id, actor_id, target_id, final_damage, .. } => {
                write!(f, "damage effect={effect_id} actor={actor_id} target={target_id} amount={final_damage}")
            }
            BattleEvent::Heal { effect_id, actor_id, target_id, final_heal, .. } => {
                write!(f, "heal effect={effect_id} actor={actor_id} target={target_id} amount={final_heal}")
            }
            BattleEvent::StateSet { state_id, value, target_id } => {
                write!(f, "state_set target={target_id} state={state_id} value={value}")
            }
            BattleEvent::AuraApply { aura_id, owner_id, duration, tickdown_first_round, reason } => write!(
                f,
                "aura_apply owner={owner_id} aura={aura_id} duration={duration} tickdown_first_round={tickdown_first_round} reason={reason}"
            ),
            BattleEvent::AuraRefresh { aura_id, owner_id, remaining_duration, tickdown_first_round } => write!(
                f,
                "aura_refresh owner={owner_id} aura={aura_id} remaining={remaining_duration} tickdown_first_round={tickdown_first_round}"
            ),
            BattleEvent::AuraStack { aura_id, owner_id, stacks, max_stack } => {
                write!(f, "aura_stack owner={owner_id} aura={aura_id} stacks={stacks} max={max_stack}")
            }
            BattleEvent::AuraRemove { aura_id, owner_id, reason } => {
                write!(f, "aura_remove owner={owner_id} aura={aura_id} reason={reason}")
            }
            BattleEvent::Dispel { effect_id, target_id, removed_count, reason } => write!(
                f,
                "dispel effect={effect_id} target={target_id} removed={removed_count} reason={reason}"
            ),
            BattleEvent::CooldownTick => write!(f, "cooldown_tick"),
            BattleEvent::Gate { effect_id, chance_norm, roll, passed } => {
                write!(f, "gate effect={effect_id} chance={chance_norm:.4} roll={roll:.4} passed={passed}")
            }
            BattleEvent::Swap { team_id, from_pet_id, to_pet_id, forced, reason } => write!(
                f,
                "swap team={team_id} from={from_pet_id} to={to_pet_id} forced={forced} reason={reason}"
            ),
        }
    }
}

/// An append-only record of [`BattleEvent`]s, replayable as either a
/// human-readable line per event or a JSON-lines stream.
#[derive(Debug, Clone, Default)]
pub struct BattleLog {
    records: Vec<BattleEvent>,
}

impl BattleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: BattleEvent) {
        self.records.push(event);
    }

    pub fn records(&self) -> &[BattleEvent] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Writes one JSON object per line, in recording order.
    pub fn write_jsonl<W: Write>(&self, mut w: W) -> io::Result<()> {
        for event in &self.records {
            let line = serde_json::to_string(event)
                .unwrap_or_else(|_| "{\"type\":\"SERIALIZE_ERROR\"}".to_string());
            writeln!(w, "{line}")?;
        }
        Ok(())
    }

    /// Writes one human-readable line per event, in recording order.
    pub fn write_text<W: Write>(&self, mut w: W) -> io::Result<()> {
        for event in &self.records {
            writeln!(w, "{event}")?;
        }
        Ok(())
    }

    pub fn ability_cast_start(&mut self, actor_id: i64, target_id: i64, ability_id: i64) {
        self.push(BattleEvent::AbilityCastStart { actor_id, target_id, ability_id });
    }

    pub fn ability_cast_end(&mut self, actor_id: i64, ability_id: i64) {
        self.push(BattleEvent::AbilityCastEnd { actor_id, ability_id });
    }

    pub fn ability_effects(&mut self, actor_id: i64, ability_id: i64, diffs: Value, final_state: Value) {
        self.push(BattleEvent::AbilityEffects { actor_id, ability_id, diffs, final_state });
    }

    #[allow(clippy::too_many_arguments)]
    pub fn damage_applied(
        &mut self,
        actor_id: i64,
        target_id: i64,
        ability_id: i64,
        effect_id: i64,
        target_hp_before: i64,
        target_hp_after: i64,
        actual_damage: i64,
    ) {
        self.push(BattleEvent::DamageApplied {
            actor_id,
            target_id,
            ability_id,
            effect_id,
            target_hp_before,
            target_hp_after,
            actual_damage,
        });
    }

    pub fn effect_result(&mut self, effect_id: i64, code: &str, reason: Option<&str>) {
        self.push(BattleEvent::EffectResult {
            effect_id,
            code: code.to_string(),
            reason: reason.map(str::to_string),
        });
    }

    pub fn damage(&mut self, effect_id: i64, actor_id: i64, target_id: i64, final_damage: i64, trace: Value) {
        self.push(BattleEvent::Damage { effect_id, actor_id, target_id, final_damage, trace });
    }

    pub fn heal(&mut self, effect_id: i64, actor_id: i64, target_id: i64, final_heal: i64, trace: Value) {
        self.push(BattleEvent::Heal { effect_id, actor_id, target_id, final_heal, trace });
    }

    pub fn state_set(&mut self, state_id: i64, value: i64, target_id: i64) {
        self.push(BattleEvent::StateSet { state_id, value, target_id });
    }

    pub fn aura_apply(&mut self, aura_id: i64, owner_id: i64, duration: i64, tickdown_first_round: bool, reason: &str) {
        self.push(BattleEvent::AuraApply {
            aura_id,
            owner_id,
            duration,
            tickdown_first_round,
            reason: reason.to_string(),
        });
    }

    pub fn aura_refresh(&mut self, aura_id: i64, owner_id: i64, remaining_duration: i64, tickdown_first_round: bool) {
        self.push(BattleEvent::AuraRefresh { aura_id, owner_id, remaining_duration, tickdown_first_round });
    }

    pub fn aura_stack(&mut self, aura_id: i64, owner_id: i64, stacks: i64, max_stack: i64) {
        self.push(BattleEvent::AuraStack { aura_id, owner_id, stacks, max_stack });
    }

    pub fn aura_remove(&mut self, aura_id: i64, owner_id: i64, reason: &str) {
        self.push(BattleEvent::AuraRemove { aura_id, owner_id, reason: reason.to_string() });
    }

    pub fn dispel(&mut self, effect_id: i64, target_id: i64, removed_count: i64, reason: &str) {
        self.push(BattleEvent::Dispel { effect_id, target_id, removed_count, reason: reason.to_string() });
    }

    pub fn cooldown_tick(&mut self) {
        self.push(BattleEvent::CooldownTick);
    }

    pub fn gate(&mut self, effect_id: i64, chance_norm: f64, roll: f64, passed: bool) {
        self.push(BattleEvent::Gate { effect_id, chance_norm, roll, passed });
    }

    pub fn swap(&mut self, team_id: i64, from_pet_id: i64, to_pet_id: i64, forced: bool, reason: &str) {
        self.push(BattleEvent::Swap { team_id, from_pet_id, to_pet_id, forced, reason: reason.to_string() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jsonl_round_trips_through_serde_value() {
        let mut log = BattleLog::new();
        log.ability_cast_start(1, 2, 100);
        log.damage_applied(1, 2, 100, 1, 50, 35, 15);

        let mut buf = Vec::new();
        log.write_jsonl(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["type"], "ABILITY_CAST_START");
        let second: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["type"], "DAMAGE_APPLIED");
        assert_eq!(second["actual_damage"], 15);
    }

    #[test]
    fn text_lines_are_one_per_event() {
        let mut log = BattleLog::new();
        log.cooldown_tick();
        log.gate(1, 0.5, 0.3, true);

        let mut buf = Vec::new();
        log.write_text(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("cooldown_tick"));
        assert!(text.contains("passed=true"));
    }
}
