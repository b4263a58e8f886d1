//! Deterministic RNG streams for battle resolution.
//!
//! Every hit check, gate check, variance roll, and crit check draws from its
//! own stream so that adding a new kind of roll never perturbs the sequence
//! an existing one would have drawn. Draws are unconditional: even a forced
//! outcome (e.g. `dont_miss`, with the one narrow exception documented on
//! `HitCheck::compute`) still advances its stream, so identical seeds always
//! produce identical traces.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One of the four independent draw streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    Hit,
    Gate,
    Variance,
    Crit,
}

/// Backing source for a single `Stream`: either a live PRNG or a pre-recorded
/// sequence played back in order (for reproducible tests).
enum Source {
    Live(StdRng),
    Sequence { values: Vec<f64>, cursor: usize },
}

impl Source {
    fn draw(&mut self, default_on_exhaustion: f64) -> f64 {
        match self {
            Source::Live(rng) => rng.gen::<f64>(),
            Source::Sequence { values, cursor } => {
                let v = values.get(*cursor).copied().unwrap_or(default_on_exhaustion);
                *cursor += 1;
                v
            }
        }
    }
}

/// The four draw streams a battle context owns for its lifetime.
pub struct RngStreams {
    hit: Source,
    gate: Source,
    variance: Source,
    crit: Source,
    used: [u64; 4],
}

impl RngStreams {
    /// Seeded, live PRNG per stream (derived from the same seed but distinct
    /// stream indices so the four streams never correlate).
    pub fn seeded(seed: u64) -> Self {
        Self {
            hit: Source::Live(StdRng::seed_from_u64(seed ^ 0x1)),
            gate: Source::Live(StdRng::seed_from_u64(seed ^ 0x2)),
            variance: Source::Live(StdRng::seed_from_u64(seed ^ 0x3)),
            crit: Source::Live(StdRng::seed_from_u64(seed ^ 0x4)),
            used: [0; 4],
        }
    }

    /// A sequence RNG that plays back pre-recorded floats per stream, falling
    /// back to the stream's documented default once exhausted.
    pub fn sequence(hit: Vec<f64>, gate: Vec<f64>, variance: Vec<f64>, crit: Vec<f64>) -> Self {
        Self {
            hit: Source::Sequence { values: hit, cursor: 0 },
            gate: Source::Sequence { values: gate, cursor: 0 },
            variance: Source::Sequence { values: variance, cursor: 0 },
            crit: Source::Sequence { values: crit, cursor: 0 },
            used: [0; 4],
        }
    }

    fn draw(&mut self, stream: Stream, default_on_exhaustion: f64) -> f64 {
        let (source, idx) = match stream {
            Stream::Hit => (&mut self.hit, 0),
            Stream::Gate => (&mut self.gate, 1),
            Stream::Variance => (&mut self.variance, 2),
            Stream::Crit => (&mut self.crit, 3),
        };
        self.used[idx] += 1;
        source.draw(default_on_exhaustion)
    }

    /// Hit-check roll. Defaults to 0.0 once a sequence is exhausted (a miss
    /// that still resolves to "always hits" against a 0..1 accuracy of any
    /// positive value — matching the reference's `rand_hit` default).
    pub fn rand_hit(&mut self) -> f64 {
        self.draw(Stream::Hit, 0.0)
    }

    /// Gate-check roll. Defaults to 0.0 (gate always passes once exhausted).
    pub fn rand_gate(&mut self) -> f64 {
        self.draw(Stream::Gate, 0.0)
    }

    /// Variance roll. Defaults to 1.0 (neutral multiplier).
    pub fn rand_variance(&mut self) -> f64 {
        self.draw(Stream::Variance, 1.0)
    }

    /// Crit roll. Defaults to 1.0 (never crits once exhausted, for any
    /// crit_chance < 1.0).
    pub fn rand_crit(&mut self) -> f64 {
        self.draw(Stream::Crit, 1.0)
    }

    /// Draws consumed so far per stream: `[hit, gate, variance, crit]`. Used
    /// by determinism tests to assert no stream drifted across forced paths.
    pub fn draw_counts(&self) -> [u64; 4] {
        self.used
    }
}
