//! Level-25 (and fallback any-level) pet stat computation.
//!
//! The reference data this is derived from ships as a JSON table keyed by
//! pet/breed/rarity id; this crate never bundles that dataset (it isn't part
//! of the engine's own source, just content shipped alongside it), so the
//! base-stat, breed-point, and quality-multiplier tables are a trait
//! boundary — [`ProgressionSource`] — exactly like [`crate::scripts::ScriptSource`]
//! is a trait boundary over ability-pack content.

use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};

/// One pet's level-25 stat block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PetStats {
    pub health: i64,
    pub power: i64,
    pub speed: i64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BaseStats {
    pub base_health: f64,
    pub base_power: f64,
    pub base_speed: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BreedPoints {
    pub health_add: f64,
    pub power_add: f64,
    pub speed_add: f64,
}

/// Supplies the three tables [`PetFactory`] needs for the fallback
/// (non-exact) stat formula. Breed point fields are already pre-divided by
/// 10 (as the source data ships them); quality multipliers are the raw
/// per-rarity value before the ×2 normalization the formula applies.
pub trait ProgressionSource {
    fn base_stats(&self, pet_id: i64) -> Option<BaseStats>;
    fn breed_points(&self, breed_id: i64) -> Option<BreedPoints>;
    fn quality_multiplier(&self, rarity_id: i64) -> Option<f64>;
}

/// An in-memory [`ProgressionSource`] built from plain maps, for loaders
/// that deserialize the three tables out of a JSON document themselves.
#[derive(Debug, Clone, Default)]
pub struct StaticProgressionTable {
    base: HashMap<i64, BaseStats>,
    breeds: HashMap<i64, BreedPoints>,
    quality: HashMap<i64, f64>,
}

impl StaticProgressionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(mut self, pet_id: i64, stats: BaseStats) -> Self {
        self.base.insert(pet_id, stats);
        self
    }

    pub fn with_breed(mut self, breed_id: i64, points: BreedPoints) -> Self {
        self.breeds.insert(breed_id, points);
        self
    }

    pub fn with_quality(mut self, rarity_id: i64, raw_multiplier: f64) -> Self {
        self.quality.insert(rarity_id, raw_multiplier);
        self
    }
}

impl ProgressionSource for StaticProgressionTable {
    fn base_stats(&self, pet_id: i64) -> Option<BaseStats> {
        self.base.get(&pet_id).copied()
    }

    fn breed_points(&self, breed_id: i64) -> Option<BreedPoints> {
        self.breeds.get(&breed_id).copied()
    }

    fn quality_multiplier(&self, rarity_id: i64) -> Option<f64> {
        self.quality.get(&rarity_id).copied()
    }
}

/// An exact level-25 record keyed by the full `(pet_id, breed_id, rarity_id)`
/// tuple, consulted only in strict mode.
pub trait ExactStatSource {
    fn exact_stats(&self, pet_id: i64, breed_id: i64, rarity_id: i64) -> Option<PetStats>;
}

impl ExactStatSource for HashMap<(i64, i64, i64), PetStats> {
    fn exact_stats(&self, pet_id: i64, breed_id: i64, rarity_id: i64) -> Option<PetStats> {
        self.get(&(pet_id, breed_id, rarity_id)).copied()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PetFactoryConfig {
    /// When true, only level-25 requests are honored, and only via an exact
    /// `(pet_id, breed_id, rarity_id)` record — the progression formula is
    /// never consulted. When false, any level falls back to the formula.
    pub strict_level25: bool,
}

impl Default for PetFactoryConfig {
    fn default() -> Self {
        Self { strict_level25: true }
    }
}

/// Builds [`PetStats`] the way the reference pet database does: an exact
/// lookup table for the common level-25 case, and a deterministic formula
/// for everything else.
pub struct PetFactory<'a> {
    config: PetFactoryConfig,
    progression: &'a dyn ProgressionSource,
    exact: Option<&'a dyn ExactStatSource>,
}

impl<'a> PetFactory<'a> {
    pub fn new(config: PetFactoryConfig, progression: &'a dyn ProgressionSource) -> Self {
        Self { config, progression, exact: None }
    }

    pub fn with_exact_table(mut self, exact: &'a dyn ExactStatSource) -> Self {
        self.exact = Some(exact);
        self
    }

    pub fn create(
        &self,
        pet_id: i64,
        breed_id: i64,
        rarity_id: i64,
        level: i64,
    ) -> EngineResult<PetStats> {
        if let Some(exact) = self.exact {
            if let Some(stats) = exact.exact_stats(pet_id, breed_id, rarity_id) {
                return Ok(stats);
            }
        }

        if self.config.strict_level25 {
            return Err(EngineError::UnknownPetRecord(format!(
                "no exact level-25 record for pet_id={pet_id} breed_id={breed_id} rarity_id={rarity_id}"
            )));
        }

        self.compute(pet_id, breed_id, rarity_id, level)
    }

    /// The progression-table formula, used whenever strict
    /// level-25 lookup is disabled or misses.
    fn compute(&self, pet_id: i64, breed_id: i64, rarity_id: i64, level: i64) -> EngineResult<PetStats> {
        let base = self
            .progression
            .base_stats(pet_id)
            .ok_or_else(|| EngineError::UnknownPetRecord(format!("no base stats for pet_id={pet_id}")))?;
        let breed = self
            .progression
            .breed_points(breed_id)
            .ok_or_else(|| EngineError::UnknownPetRecord(format!("no progression for breed_id={breed_id}")))?;
        let quality_raw = self
            .progression
            .quality_multiplier(rarity_id)
            .filter(|q| *q > 0.0)
            .ok_or_else(|| {
                EngineError::UnknownPetRecord(format!("no quality multiplier for rarity_id={rarity_id}"))
            })?;

        let lvl = level.max(1) as f64;
        let quality = quality_raw * 2.0;

        let health = ((base.base_health + breed.health_add) * 5.0 * lvl * quality + 100.0).round() as i64;
        let power = ((base.base_power + breed.power_add) * lvl * quality).round() as i64;
        let speed = ((base.base_speed + breed.speed_add) * lvl * quality).round() as i64;

        Ok(PetStats {
            health: health.max(1),
            power: power.max(0),
            speed: speed.max(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> StaticProgressionTable {
        StaticProgressionTable::new()
            .with_base(2, BaseStats { base_health: 10.5, base_power: 8.0, base_speed: 9.5 })
            .with_breed(3, BreedPoints { health_add: 0.5, power_add: 0.5, speed_add: 0.5 })
            .with_quality(1, 0.5)
            .with_quality(2, 0.550_000_011_920_929)
            .with_quality(6, 0.75)
    }

    #[test]
    fn strict_mode_rejects_without_exact_record() {
        let table = sample_table();
        let factory = PetFactory::new(PetFactoryConfig { strict_level25: true }, &table);
        let err = factory.create(2, 3, 1, 25).unwrap_err();
        assert!(matches!(err, EngineError::UnknownPetRecord(_)));
    }

    #[test]
    fn strict_mode_uses_exact_table_when_present() {
        let table = sample_table();
        let mut exact: HashMap<(i64, i64, i64), PetStats> = HashMap::new();
        exact.insert((2, 3, 1), PetStats { health: 1375, power: 88, speed: 100 });
        let factory = PetFactory::new(PetFactoryConfig { strict_level25: true }, &table)
            .with_exact_table(&exact);
        let stats = factory.create(2, 3, 1, 25).unwrap();
        assert_eq!(stats, PetStats { health: 1375, power: 88, speed: 100 });
    }

    #[test]
    fn lax_mode_computes_from_formula() {
        let table = sample_table();
        let factory = PetFactory::new(PetFactoryConfig { strict_level25: false }, &table);
        let stats = factory.create(2, 3, 1, 25).unwrap();
        // health = round((10.5+0.5)*5*25*1.0 + 100) = round(1375+100) = 1475
        // power  = round((8.0+0.5)*25*1.0) = round(212.5) = 212 or 213 depending on rounding
        // speed  = round((9.5+0.5)*25*1.0) = round(250.0) = 250
        assert_eq!(stats.health, 1475);
        assert_eq!(stats.speed, 250);
    }

    #[test]
    fn lax_mode_missing_base_errors() {
        let table = sample_table();
        let factory = PetFactory::new(PetFactoryConfig { strict_level25: false }, &table);
        let err = factory.create(999, 3, 1, 25).unwrap_err();
        assert!(matches!(err, EngineError::UnknownPetRecord(_)));
    }

    #[test]
    fn lax_mode_missing_quality_errors() {
        let table = sample_table();
        let factory = PetFactory::new(PetFactoryConfig { strict_level25: false }, &table);
        let err = factory.create(2, 3, 99, 25).unwrap_err();
        assert!(matches!(err, EngineError::UnknownPetRecord(_)));
    }
}
