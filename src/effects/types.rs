use crate::enums::FlowControl;
use crate::error::WarnCode;

/// Per-effect-chain transient state, scrubbed at the
/// start of each turn execution.
#[derive(Debug, Clone, Default)]
pub struct AccCtx {
    /// Forces the next hit check to succeed without a roll-sensitive branch
    /// (still consumes no draw — see `HitCheck::compute`'s documented
    /// exception).
    pub dont_miss: bool,
    pub accuracy_override: Option<f64>,
    /// Free-form hint a handler can stash for a following handler in the
    /// same chain (e.g. "require state X present").
    pub state_hint: Option<i64>,

    /// Single-use hint consumed by the next aura-apply call: reduce the
    /// applied duration by the Critter passive before creation.
    pub cc_resilient_state: Option<i64>,
    pub cc_resilient_points: i64,
    pub cc_report_fails_as_immune: bool,

    pub target_override_id: Option<i64>,
    pub consume_target_override: bool,

    /// Multi-target cursor: the team being iterated, the frozen target list,
    /// and the current index into it.
    pub mt_team_id: Option<i64>,
    pub mt_targets: Vec<i64>,
    pub mt_index: usize,

    pub prev_prop_id: Option<i64>,
    pub prev_effect_executed: bool,
    pub prev_effect_flow_control: FlowControl,

    pub last_damage_dealt: i64,
    pub last_damage_target_id: Option<i64>,

    /// Per-actor synthetic ramp/trap counters keyed by opcode-defined id
    /// (e.g. opcode 27's ramp counter, which persists across swap-out/miss
    /// by design — no reset policy is invented for it).
    pub trap_counters: std::collections::HashMap<i64, i64>,
}

impl AccCtx {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the per-turn fields at the start of each turn execution,
    /// keeping nothing — `dont_miss` and other per-ability fields are set
    /// fresh by each row that needs them, never carried across turns.
    pub fn reset_for_turn(&mut self) {
        *self = AccCtx {
            trap_counters: std::mem::take(&mut self.trap_counters),
            ..AccCtx::default()
        };
    }
}

/// Outcome of a single opcode handler invocation.
#[derive(Debug, Clone)]
pub struct EffectResult {
    pub executed: bool,
    pub flow_control: FlowControl,
    pub warn: Option<WarnCode>,
}

impl EffectResult {
    pub fn executed() -> Self {
        Self {
            executed: true,
            flow_control: FlowControl::Continue,
            warn: None,
        }
    }

    pub fn not_executed(warn: WarnCode) -> Self {
        Self {
            executed: false,
            flow_control: FlowControl::Continue,
            warn: Some(warn),
        }
    }

    pub fn with_flow(mut self, flow: FlowControl) -> Self {
        self.flow_control = flow;
        self
    }

    pub fn with_warn(mut self, warn: WarnCode) -> Self {
        self.warn = Some(warn);
        self
    }
}
