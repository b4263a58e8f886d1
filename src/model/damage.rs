use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::Family;

/// Input to the damage pipeline.
#[derive(Debug, Clone)]
pub struct DamageEvent {
    pub source_actor_id: i64,
    pub target_id: i64,
    pub ability_id: i64,
    pub effect_id: i64,
    pub points: i64,
    pub is_periodic: bool,
    pub override_index: Option<i64>,
    pub variance_override: Option<f64>,
    pub attack_type_override: Option<Family>,
}

/// Output of the damage pipeline: a non-negative final amount plus a stable
/// trace map for audit tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedDamage {
    pub final_damage: i64,
    pub trace: BTreeMap<String, serde_json::Value>,
}
