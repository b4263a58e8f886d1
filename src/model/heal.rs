use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Input to the heal pipeline.
#[derive(Debug, Clone)]
pub struct HealEvent {
    pub source_actor_id: i64,
    pub target_id: i64,
    pub ability_id: i64,
    pub effect_id: i64,
    pub points: i64,
    pub is_periodic: bool,
    pub variance_override: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedHeal {
    pub final_heal: i64,
    pub trace: BTreeMap<String, serde_json::Value>,
}
