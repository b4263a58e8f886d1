pub mod aura;
pub mod creature;
pub mod damage;
pub mod effect_row;
pub mod heal;

pub use aura::{AuraApplyResult, AuraInstance, AuraMeta, StateBind};
pub use creature::{Creature, Team};
pub use damage::{DamageEvent, ResolvedDamage};
pub use effect_row::{AbilityInfo, CastTurn, EffectRow};
pub use heal::{HealEvent, ResolvedHeal};
