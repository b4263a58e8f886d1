use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use crate::config::EngineConfig;
use crate::effects::types::AccCtx;
use crate::log::BattleLog;
use crate::managers::aura::AuraManager;
use crate::managers::cooldown::CooldownManager;
use crate::managers::racial::RacialPassiveManager;
use crate::managers::scheduler::Scheduler;
use crate::managers::state::StateManager;
use crate::managers::stats::StatsResolver;
use crate::managers::team::TeamManager;
use crate::managers::weather::WeatherManager;
use crate::model::creature::Creature;
use crate::rng::RngStreams;
use crate::scripts::ScriptSource;

/// Per-round transient state.
#[derive(Debug, Clone, Default)]
pub struct RoundState {
    pub round_number: u32,
    pub first_team_id: Option<i64>,
    pub second_team_id: Option<i64>,
    /// Active creatures frozen at round start, keyed by team id.
    pub round_first_actor_id: Option<i64>,
    pub round_second_actor_id: Option<i64>,
    pub phase: Option<crate::enums::RoundPhase>,
    pub struck_before_own_action: BTreeSet<i64>,
    pub priority_actor_id: Option<i64>,
}

/// Aggregates every manager, the RNG, the creature roster, and the script
/// source into a single context reference passed to every handler. One
/// `BattleContext` per battle; no global mutable state.
pub struct BattleContext {
    pub states: StateManager,
    pub auras: AuraManager,
    pub cooldowns: CooldownManager,
    pub teams: TeamManager,
    pub scheduler: Scheduler,
    pub stats: StatsResolver,
    pub weather: WeatherManager,
    pub racial: RacialPassiveManager,
    pub rng: RngStreams,
    pub creatures: HashMap<i64, Creature>,
    pub config: EngineConfig,
    pub round: RoundState,
    pub acc_ctx: AccCtx,
    pub scripts: Rc<dyn ScriptSource>,
    pub log: BattleLog,
}

impl BattleContext {
    pub fn new(rng: RngStreams, config: EngineConfig, scripts: Rc<dyn ScriptSource>) -> Self {
        Self {
            states: StateManager::new(),
            auras: AuraManager::new(),
            cooldowns: CooldownManager::new(),
            teams: TeamManager::new(),
            scheduler: Scheduler::new(),
            stats: StatsResolver::new(),
            weather: WeatherManager::with_registry(config.weather_registry.clone()),
            racial: RacialPassiveManager::new(),
            rng,
            creatures: HashMap::new(),
            config,
            round: RoundState::default(),
            acc_ctx: AccCtx::new(),
            scripts,
            log: BattleLog::new(),
        }
    }

    pub fn add_creature(&mut self, creature: Creature) {
        self.creatures.insert(creature.id, creature);
    }

    pub fn creature(&self, id: i64) -> Option<&Creature> {
        self.creatures.get(&id)
    }

    pub fn creature_mut(&mut self, id: i64) -> Option<&mut Creature> {
        self.creatures.get_mut(&id)
    }

    pub fn all_pet_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.creatures.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Current weather effect, refreshing the cache from live auras first.
    pub fn current_weather(&mut self) -> crate::managers::weather::WeatherEffect {
        let owners = self.all_pet_ids();
        let state_id = self.weather.current(&owners, &self.auras);
        self.weather.effect(state_id)
    }
}
