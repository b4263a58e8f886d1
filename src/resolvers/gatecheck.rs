use crate::rng::RngStreams;

/// Result of a `GateCheck::compute` call. Failure semantics are
/// handler-specific — usually `STOP_TURN`.
#[derive(Debug, Clone, Copy)]
pub struct GateResult {
    pub passed: bool,
    pub normalized_chance: f64,
    pub roll: f64,
}

pub struct GateCheck;

impl GateCheck {
    /// Accepts `chance` as a fraction (`<=1`) or a percent (`>1, <=100`).
    /// Always consumes one `rand_gate`.
    pub fn compute(rng: &mut RngStreams, chance: f64) -> GateResult {
        let normalized = if chance <= 1.0 { chance } else { chance / 100.0 };
        let roll = rng.rand_gate();
        GateResult {
            passed: roll <= normalized,
            normalized_chance: normalized,
            roll,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_input_normalizes_to_fraction() {
        let mut rng = RngStreams::sequence(vec![], vec![0.3], vec![], vec![]);
        let result = GateCheck::compute(&mut rng, 50.0);
        assert_eq!(result.normalized_chance, 0.5);
        assert!(result.passed);
    }

    #[test]
    fn always_consumes_a_draw() {
        let mut rng = RngStreams::sequence(vec![], vec![0.1, 0.2], vec![], vec![]);
        GateCheck::compute(&mut rng, 0.0);
        assert_eq!(rng.draw_counts()[1], 1);
    }
}
