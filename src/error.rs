//! Two disjoint error surfaces: [`EngineError`] for conditions that abort a
//! single call (bad script data, an invalid pet record in strict mode), and
//! [`WarnCode`] for the recoverable, logged-only conditions a battle round
//! never aborts on.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("unknown pet record: {0}")]
    UnknownPetRecord(String),
    #[error("malformed ability pack: {0}")]
    MalformedScriptData(String),
    #[error("ability {0} has no cast turns")]
    EmptyCastTurns(i64),
    #[error("index out of bounds: {0}")]
    IndexOutOfBounds(String),
}

/// Recoverable condition codes, matching one-to-one. Carried inside
/// `EffectResult::warn` and/or emitted via `log::warn!`; never turned into a
/// `Result::Err` inside a live round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarnCode {
    Miss,
    NoHandler,
    NoHandlerKnown,
    ParamLabelMismatch,
    ArgSchema,
    HandlerError,
    AuraIdMissing,
    NoCast,
    NoScript,
    NoAuraManager,
    Cooldown,
    CannotAct,
    TurnLock,
    ReqStateFail,
    Immune,
    ExpiredImmediately,
}

impl WarnCode {
    pub fn as_str(self) -> &'static str {
        match self {
            WarnCode::Miss => "MISS",
            WarnCode::NoHandler => "NO_HANDLER",
            WarnCode::NoHandlerKnown => "NO_HANDLER_KNOWN",
            WarnCode::ParamLabelMismatch => "PARAM_LABEL_MISMATCH",
            WarnCode::ArgSchema => "ARG_SCHEMA",
            WarnCode::HandlerError => "HANDLER_ERROR",
            WarnCode::AuraIdMissing => "AURA_ID_MISSING",
            WarnCode::NoCast => "NO_CAST",
            WarnCode::NoScript => "NO_SCRIPT",
            WarnCode::NoAuraManager => "NO_AURA_MANAGER",
            WarnCode::Cooldown => "COOLDOWN",
            WarnCode::CannotAct => "CANNOT_ACT",
            WarnCode::TurnLock => "TURN_LOCK",
            WarnCode::ReqStateFail => "REQ_STATE_FAIL",
            WarnCode::Immune => "IMMUNE",
            WarnCode::ExpiredImmediately => "EXPIRED_IMMEDIATELY",
        }
    }
}

impl std::fmt::Display for WarnCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
