//! Selection of the rounds dropped in a DART round.

use crate::core::utils::random::Random;

/// Seeded choice of which earlier rounds to drop.
///
/// Draw order is fixed: one draw for the skip decision, then, unless the
/// round is skipped, one draw per earlier round in ascending order.
#[derive(Debug, Clone)]
pub struct DropSelector {
    skip_drop: f64,
    drop_rate: f64,
    random: Random,
    draw_count: u64,
}

impl DropSelector {
    /// Creates a selector whose stream is seeded with `seed`.
    pub fn new(skip_drop: f64, drop_rate: f64, seed: u64) -> Self {
        DropSelector {
            skip_drop,
            drop_rate,
            random: Random::with_seed(seed as i32),
            draw_count: 0,
        }
    }

    /// Picks round indices in `[0, num_rounds)` to drop, ascending.
    pub fn select(&mut self, num_rounds: usize) -> Vec<usize> {
        if self.next_double() < self.skip_drop {
            return Vec::new();
        }
        let mut dropped = Vec::new();
        for round in 0..num_rounds {
            if self.next_double() < self.drop_rate {
                dropped.push(round);
            }
        }
        dropped
    }

    /// Number of random draws consumed so far.
    pub fn draw_count(&self) -> u64 {
        self.draw_count
    }

    fn next_double(&mut self) -> f64 {
        self.draw_count += 1;
        self.random.next_double()
    }
}
