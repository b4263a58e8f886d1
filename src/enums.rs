//! Shared small enums and well-known numeric ids used across the engine.

use serde::{Deserialize, Serialize};

/// Creature family, numbered per the source data's own DB2-style
/// enumeration (0 humanoid .. 9 mechanical).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i8)]
pub enum Family {
    Humanoid = 0,
    Dragonkin = 1,
    Flying = 2,
    Undead = 3,
    Critter = 4,
    Magic = 5,
    Elemental = 6,
    Beast = 7,
    Aquatic = 8,
    Mechanical = 9,
}

impl Family {
    pub fn from_i8(v: i8) -> Option<Family> {
        Some(match v {
            0 => Family::Humanoid,
            1 => Family::Dragonkin,
            2 => Family::Flying,
            3 => Family::Undead,
            4 => Family::Critter,
            5 => Family::Magic,
            6 => Family::Elemental,
            7 => Family::Beast,
            8 => Family::Aquatic,
            9 => Family::Mechanical,
            _ => return None,
        })
    }

    /// The family each family is strong against (1.5x). Not a simple cycle —
    /// the WoW pet-battle chart pairs each family with a specific
    /// counter/countered-by rather than its list neighbors.
    fn strong_against(self) -> Family {
        match self {
            Family::Humanoid => Family::Dragonkin,
            Family::Dragonkin => Family::Magic,
            Family::Flying => Family::Aquatic,
            Family::Undead => Family::Humanoid,
            Family::Critter => Family::Undead,
            Family::Magic => Family::Flying,
            Family::Elemental => Family::Mechanical,
            Family::Beast => Family::Critter,
            Family::Aquatic => Family::Elemental,
            Family::Mechanical => Family::Beast,
        }
    }

    /// The family each family is weak against (2/3x).
    fn weak_against(self) -> Family {
        match self {
            Family::Humanoid => Family::Undead,
            Family::Dragonkin => Family::Humanoid,
            Family::Flying => Family::Dragonkin,
            Family::Undead => Family::Critter,
            Family::Critter => Family::Beast,
            Family::Magic => Family::Mechanical,
            Family::Elemental => Family::Aquatic,
            Family::Beast => Family::Mechanical,
            Family::Aquatic => Family::Flying,
            Family::Mechanical => Family::Elemental,
        }
    }

    /// Type-chart multiplier for `self` attacking `target`.
    pub fn type_multiplier(self, target: Family) -> f64 {
        if self.strong_against() == target {
            1.5
        } else if self.weak_against() == target {
            2.0 / 3.0
        } else {
            1.0
        }
    }
}

/// Round phase, used both for periodic-payload keys and battle-loop phase
/// tagging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundPhase {
    TurnStart,
    TurnEnd,
    FirstAction,
    SecondAction,
}

impl RoundPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            RoundPhase::TurnStart => "TURN_START",
            RoundPhase::TurnEnd => "TURN_END",
            RoundPhase::FirstAction => "FIRST_ACTION",
            RoundPhase::SecondAction => "SECOND_ACTION",
        }
    }
}

/// Flow-control verdict a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FlowControl {
    #[default]
    Continue,
    StopTurn,
    StopAbility,
}

/// Kind of action chosen for a creature this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionKind {
    Swap = 0,
    UseAbility = 1,
    Pass = 2,
}

/// Reason codes returned by `TeamManager::swap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapReason {
    Ok,
    IndexOob,
    AlreadyActive,
    SwapOutLock,
    SwapInLock,
}

/// Reason codes returned by `AuraManager::apply`/`apply_with_stack_limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuraApplyReason {
    Ok,
    ExpiredImmediately,
}

// --- Well-known state ids -----------------------------------

pub const STATE_IS_DEAD: i64 = 1;
pub const STATE_MAX_HP_FLAT: i64 = 2;
pub const STATE_TURN_LOCK: i64 = 35;
pub const STATE_SWAP_OUT_LOCK: i64 = 36;
pub const STATE_ACCURACY: i64 = 41;
pub const STATE_DODGE: i64 = 73;
pub const STATE_POWER_FLAT: i64 = 18;
pub const STATE_SPEED_FLAT: i64 = 20;
pub const STATE_DMG_DEALT_PCT: i64 = 23;
pub const STATE_DMG_TAKEN_PCT: i64 = 24;
pub const STATE_SPEED_PCT: i64 = 25;
pub const STATE_HEAL_DEALT_PCT: i64 = 65;
pub const STATE_HEAL_TAKEN_PCT: i64 = 66;
pub const STATE_FLAT_DMG_DEALT: i64 = 72;
pub const STATE_FLAT_DMG_TAKEN: i64 = 71;
pub const STATE_FLAT_DMG_TAKEN_PERIODIC: i64 = 202;
pub const STATE_RESILIENT: i64 = 149;
pub const STATE_DISPEL_ALL_AURAS: i64 = 141;
pub const STATE_DMG_IGNORE_BELOW: i64 = 191;
pub const STATE_DMG_CLAMP_ABOVE: i64 = 200;
pub const STATE_MAX_HP_PCT: i64 = 99;
pub const STATE_SWAP_IN_LOCK: i64 = 98;

/// Weather-carrying state ids: 53..=62 plus 316.
pub fn is_weather_state(id: i64) -> bool {
    (53..=62).contains(&id) || id == 316
}
