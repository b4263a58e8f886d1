use std::collections::{BTreeMap, HashMap};

/// A single state write, returned from `StateManager::set` for logging.
#[derive(Debug, Clone, Copy)]
pub struct StateChange {
    pub pet_id: i64,
    pub state_id: i64,
    pub value: i64,
}

/// Per-creature map `(state_id -> integer)`. Values are stored
/// verbatim; interpretation as percentage/flat/boolean lives in the
/// consumer (Stats Resolver, hit check, etc).
#[derive(Debug, Clone, Default)]
pub struct StateManager {
    by_pet: HashMap<i64, HashMap<i64, i64>>,
}

impl StateManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pet_id: i64, state_id: i64) -> i64 {
        self.by_pet
            .get(&pet_id)
            .and_then(|m| m.get(&state_id))
            .copied()
            .unwrap_or(0)
    }

    pub fn set(&mut self, pet_id: i64, state_id: i64, value: i64) -> StateChange {
        self.by_pet.entry(pet_id).or_default().insert(state_id, value);
        StateChange {
            pet_id,
            state_id,
            value,
        }
    }

    pub fn clear_pet(&mut self, pet_id: i64) {
        self.by_pet.remove(&pet_id);
    }

    /// Stable-ordered snapshot of a creature's state map.
    pub fn snapshot(&self, pet_id: i64) -> BTreeMap<i64, i64> {
        self.by_pet
            .get(&pet_id)
            .map(|m| m.iter().map(|(k, v)| (*k, *v)).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_zero() {
        let sm = StateManager::new();
        assert_eq!(sm.get(1, 41), 0);
    }

    #[test]
    fn set_then_get_roundtrips() {
        let mut sm = StateManager::new();
        sm.set(1, 41, 25);
        assert_eq!(sm.get(1, 41), 25);
        assert_eq!(sm.get(2, 41), 0);
    }

    #[test]
    fn clear_pet_removes_all_entries() {
        let mut sm = StateManager::new();
        sm.set(1, 41, 25);
        sm.set(1, 73, 5);
        sm.clear_pet(1);
        assert_eq!(sm.get(1, 41), 0);
        assert_eq!(sm.get(1, 73), 0);
    }
}
