use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::enums::RoundPhase;
use crate::model::effect_row::EffectRow;

/// A numeric binding carried by an aura's metadata: `value` is added to the
/// owner's `Σstate(state_id)` once per stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateBind {
    pub state_id: i64,
    pub value: i64,
    pub flags: i64,
}

/// Aura-carried data: numeric bindings plus weather hints (spec's "Design
/// Notes: aura metadata as data, not code").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuraMeta {
    pub state_binds: Vec<StateBind>,
    #[serde(default)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// An active aura instance, identified by `(owner, aura_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuraInstance {
    pub aura_id: i64,
    pub owner_pet_id: i64,
    pub caster_pet_id: i64,
    pub source_effect_id: i64,
    /// -1 = permanent.
    pub remaining_duration: i64,
    pub tickdown_first_round: bool,
    pub just_applied: bool,
    pub stacks: i64,
    pub periodic_payloads: HashMap<RoundPhase, Vec<EffectRow>>,
    pub meta: AuraMeta,
}

impl AuraInstance {
    pub fn new(
        owner_pet_id: i64,
        caster_pet_id: i64,
        aura_id: i64,
        duration: i64,
        tickdown_first_round: bool,
        source_effect_id: i64,
    ) -> Self {
        Self {
            aura_id,
            owner_pet_id,
            caster_pet_id,
            source_effect_id,
            remaining_duration: duration,
            tickdown_first_round,
            just_applied: true,
            stacks: 1,
            periodic_payloads: HashMap::new(),
            meta: AuraMeta::default(),
        }
    }
}

/// Result of an `apply`/`apply_with_stack_limit` call.
#[derive(Debug, Clone)]
pub struct AuraApplyResult {
    pub applied: bool,
    pub refreshed: bool,
    pub reason: &'static str,
    pub aura: Option<AuraInstance>,
}
