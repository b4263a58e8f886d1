pub mod battle;
#[cfg(feature = "cli")]
pub mod cli_support;
pub mod config;
pub mod context;
pub mod effects;
pub mod enums;
pub mod error;
pub mod executor;
pub mod log;
pub mod managers;
pub mod model;
pub mod pets;
pub mod resolvers;
pub mod rng;
pub mod scripts;

pub use battle::{Action, BattleLoop, RoundOutcome};
pub use context::BattleContext;
pub use error::{EngineError, EngineResult, WarnCode};
pub use executor::{AbilityExecutor, AbilityTurnExecutor, TickEngine, UseAbilityOutcome};
pub use log::{BattleEvent, BattleLog};
pub use pets::{PetFactory, PetFactoryConfig, PetStats};
pub use scripts::{JsonScriptSource, ScriptSource};
