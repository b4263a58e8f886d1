use serde::{Deserialize, Serialize};

use crate::enums::Family;

/// A creature instance, unique per battle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creature {
    pub id: i64,
    pub species_id: i64,
    pub family: Family,
    pub rarity: u8,
    pub breed: u8,
    pub level: u32,
    /// Ability ids chosen for slots 1..=3 (0 if empty).
    pub ability_slots: [i64; 3],

    pub base_max_hp: i64,
    pub base_power: i64,
    pub base_speed: i64,

    pub max_hp: i64,
    pub hp: i64,
    pub power: i64,
    pub speed: i64,
    pub alive: bool,

    /// Opaque diagnostics bag for downstream observation; not consumed by
    /// the resolvers themselves.
    #[serde(default)]
    pub tags: std::collections::BTreeMap<String, serde_json::Value>,
}

impl Creature {
    pub fn new(
        id: i64,
        species_id: i64,
        family: Family,
        rarity: u8,
        breed: u8,
        level: u32,
        ability_slots: [i64; 3],
        base_max_hp: i64,
        base_power: i64,
        base_speed: i64,
    ) -> Self {
        Self {
            id,
            species_id,
            family,
            rarity,
            breed,
            level,
            ability_slots,
            base_max_hp,
            base_power,
            base_speed,
            max_hp: base_max_hp,
            hp: base_max_hp,
            power: base_power,
            speed: base_speed.max(1),
            alive: true,
            tags: Default::default(),
        }
    }

    pub fn hp_fraction(&self) -> f64 {
        if self.max_hp <= 0 {
            0.0
        } else {
            self.hp as f64 / self.max_hp as f64
        }
    }
}

/// Ordered roster of up to three creatures with a fixed active index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub team_id: i64,
    pub pet_ids: Vec<i64>,
    pub active_index: usize,
}

impl Team {
    pub fn new(team_id: i64, pet_ids: Vec<i64>) -> Self {
        Self {
            team_id,
            pet_ids,
            active_index: 0,
        }
    }

    pub fn active_pet_id(&self) -> Option<i64> {
        self.pet_ids.get(self.active_index).copied()
    }
}
