use std::collections::HashMap;

use crate::context::BattleContext;
use crate::effects::handlers;
use crate::effects::types::EffectResult;
use crate::error::WarnCode;
use crate::model::effect_row::EffectRow;

/// An effect row's positional parameters, zipped with their (possibly
/// alias-normalized) field names.
#[derive(Debug, Clone, Default)]
pub struct ParsedParams {
    by_name: HashMap<String, i64>,
}

/// Known alternate spellings for the same logical field, so ability packs
/// authored against either naming still resolve to one lookup key.
fn normalize_token(token: &str) -> String {
    match token {
        "tick_down_first_round" => "tickdown_first_round".to_string(),
        other => other.to_string(),
    }
}

impl ParsedParams {
    pub fn parse(row: &EffectRow) -> Self {
        let mut tokens: Vec<String> = row
            .param_label
            .split(',')
            .map(|t| normalize_token(t.trim()))
            .filter(|t| !t.is_empty())
            .collect();
        while tokens.len() < 6 {
            tokens.push(format!("param_{}", tokens.len()));
        }

        let mut by_name = HashMap::new();
        for (i, token) in tokens.iter().enumerate().take(6) {
            by_name.insert(token.clone(), row.params_raw[i]);
        }
        Self { by_name }
    }

    pub fn get(&self, name: &str) -> i64 {
        self.by_name.get(name).copied().unwrap_or(0)
    }

    pub fn get_flag(&self, name: &str) -> bool {
        self.get(name) != 0
    }

    pub fn get_opt(&self, name: &str) -> Option<i64> {
        let v = self.get(name);
        if v == 0 {
            None
        } else {
            Some(v)
        }
    }
}

/// A schema entry used only to detect a stale/mismatched `param_label` on an
/// effect row — never to block dispatch.
pub fn schema_for_opcode(opcode_id: i64) -> Option<&'static [&'static str]> {
    handlers::schema_for_opcode(opcode_id)
}

pub struct Dispatcher;

impl Dispatcher {
    /// Routes an effect row to its handler. Never panics: a
    /// handler error is caught and demoted to a `HANDLER_ERROR` warning.
    pub fn dispatch(row: &EffectRow, ctx: &mut BattleContext, actor_id: i64, target_id: i64) -> EffectResult {
        if let Some(expected) = schema_for_opcode(row.opcode_id) {
            let declared: Vec<&str> = row.param_label.split(',').map(|t| t.trim()).collect();
            if declared != *expected {
                log::warn!(
                    "opcode {} param_label mismatch: declared={:?} expected={:?}",
                    row.opcode_id,
                    declared,
                    expected
                );
            }
        }

        let params = ParsedParams::parse(row);

        if !handlers::is_known_opcode(row.opcode_id) {
            let warn = if handlers::is_registered_opcode(row.opcode_id) {
                WarnCode::NoHandlerKnown
            } else {
                WarnCode::NoHandler
            };
            log::debug!("opcode {} has no handler ({:?})", row.opcode_id, warn);
            return EffectResult::not_executed(warn);
        }

        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            handlers::invoke(row.opcode_id, row, &params, ctx, actor_id, target_id)
        })) {
            Ok(result) => result,
            Err(_) => {
                log::warn!("opcode {} handler panicked", row.opcode_id);
                EffectResult::not_executed(WarnCode::HandlerError)
            }
        }
    }
}
