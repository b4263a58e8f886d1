//! Scenario loading shared by the `pawscale_demo` and `pawscale_traverse`
//! binaries: a small JSON roster format (not the ability-pack format
//! [`crate::scripts`] loads), plus the simplest possible action-picking
//! policy so both binaries can drive a battle without an AI of their own.

use std::rc::Rc;

use serde::Deserialize;

use crate::battle::{Action, BattleLoop};
use crate::config::EngineConfig;
use crate::context::BattleContext;
use crate::enums::Family;
use crate::model::creature::{Creature, Team};
use crate::rng::RngStreams;
use crate::scripts::ScriptSource;

#[derive(Debug, Clone, Deserialize)]
pub struct CreatureSpec {
    pub id: i64,
    pub species_id: i64,
    pub family: Family,
    #[serde(default)]
    pub rarity: u8,
    #[serde(default)]
    pub breed: u8,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub ability_slots: [i64; 3],
    pub max_hp: i64,
    pub power: i64,
    pub speed: i64,
}

fn default_level() -> u32 {
    25
}

impl CreatureSpec {
    pub fn to_creature(&self) -> Creature {
        Creature::new(
            self.id,
            self.species_id,
            self.family,
            self.rarity,
            self.breed,
            self.level,
            self.ability_slots,
            self.max_hp,
            self.power,
            self.speed,
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamSpec {
    pub team_id: i64,
    pub pet_ids: Vec<i64>,
}

/// A full two-team battle roster, independent of the ability pack the
/// creatures' abilities are resolved against.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioFile {
    pub seed: u64,
    #[serde(default)]
    pub max_rounds: Option<u32>,
    pub creatures: Vec<CreatureSpec>,
    pub teams: [TeamSpec; 2],
}

impl ScenarioFile {
    pub fn build_context(&self, scripts: Rc<dyn ScriptSource>) -> BattleContext {
        let mut config = EngineConfig::default();
        if let Some(max_rounds) = self.max_rounds {
            config.max_rounds = max_rounds;
        }
        let mut ctx = BattleContext::new(RngStreams::seeded(self.seed), config, scripts);
        for spec in &self.creatures {
            ctx.add_creature(spec.to_creature());
        }
        for team in &self.teams {
            ctx.teams.register_team(Team::new(team.team_id, team.pet_ids.clone()));
        }
        ctx
    }

    pub fn team_ids(&self) -> (i64, i64) {
        (self.teams[0].team_id, self.teams[1].team_id)
    }
}

/// Builds a one-pet-per-side scenario for a single matchup, used by the
/// per-pet traversal binary.
pub fn one_v_one_scenario(
    attacker: CreatureSpec,
    defender: CreatureSpec,
    seed: u64,
    max_rounds: u32,
) -> ScenarioFile {
    let attacker_id = attacker.id;
    let defender_id = defender.id;
    ScenarioFile {
        seed,
        max_rounds: Some(max_rounds),
        creatures: vec![attacker, defender],
        teams: [
            TeamSpec { team_id: 1, pet_ids: vec![attacker_id] },
            TeamSpec { team_id: 2, pet_ids: vec![defender_id] },
        ],
    }
}

/// Picks the first legal action for `team_id` — no strategy, just enough to
/// drive a battle to a deterministic conclusion for log generation.
pub fn first_legal_action(ctx: &BattleContext, team_id: i64) -> Action {
    BattleLoop::legal_actions(ctx, team_id).into_iter().next().unwrap_or(Action::Pass)
}

/// Runs rounds until the battle ends or `config.max_rounds` is hit,
/// returning the final outcome.
pub fn run_to_completion(ctx: &mut BattleContext, team0_id: i64, team1_id: i64) -> crate::battle::RoundOutcome {
    loop {
        let action0 = first_legal_action(ctx, team0_id);
        let action1 = first_legal_action(ctx, team1_id);
        let outcome = BattleLoop::run_round(ctx, team0_id, team1_id, action0, action1);
        if outcome != crate::battle::RoundOutcome::Ongoing {
            return outcome;
        }
    }
}
