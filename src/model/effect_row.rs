use serde::{Deserialize, Serialize};

use crate::enums::Family;

/// A single parametrized primitive inside a cast turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectRow {
    pub ability_id: i64,
    pub turn_id: i64,
    pub effect_id: i64,
    pub opcode_id: i64,
    /// `turn_order * 100 + effect_order`.
    pub order_index: i64,
    /// Comma-separated field names in positional order.
    pub param_label: String,
    /// Raw positional integer parameters, always normalized to length 6.
    pub params_raw: [i64; 6],
    pub aura_ability_id: Option<i64>,
    /// A pre-scheduled delayed payload this row carries (opcode 22's
    /// companion cast turns), if any.
    pub scheduled_effect_rows: Option<Vec<EffectRow>>,
}

impl EffectRow {
    pub fn sort_key(&self) -> (i64, i64) {
        (self.order_index, self.effect_id)
    }
}

/// One row-group of an ability script (spec GLOSSARY).
pub type CastTurn = Vec<EffectRow>;

/// Shape returned by `get_ability_info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityInfo {
    pub pet_type_enum: Option<Family>,
    pub cooldown: i64,
    pub flags: i64,
    pub visual_id: i64,
    pub kind: String,
}
