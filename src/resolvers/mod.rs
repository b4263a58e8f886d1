pub mod damage;
pub mod gatecheck;
pub mod heal;
pub mod hitcheck;

pub use damage::DamagePipeline;
pub use gatecheck::{GateCheck, GateResult};
pub use heal::HealPipeline;
pub use hitcheck::HitCheck;
