pub mod aura;
pub mod cooldown;
pub mod racial;
pub mod scheduler;
pub mod state;
pub mod stats;
pub mod team;
pub mod weather;

pub use aura::AuraManager;
pub use cooldown::CooldownManager;
pub use racial::RacialPassiveManager;
pub use scheduler::{ScheduledPacket, Scheduler};
pub use state::{StateChange, StateManager};
pub use stats::{EffectiveStats, StatsResolver};
pub use team::TeamManager;
pub use weather::{WeatherEffect, WeatherManager};
