/*!
 * Copyright (c) 2016 Microsoft Corporation. All rights reserved.
 * Licensed under the MIT License. See LICENSE file in the project root for license information.
 */

//! Seeded pseudo-random stream used by the dropout selector.

/// Linear congruential generator matching LightGBM's `Random`.
///
/// The stream is owned by whoever consumes it; two generators built with
/// the same seed produce identical sequences.
#[derive(Debug, Clone)]
pub struct Random {
    x: u32,
}

impl Random {
    /// Constructor, with specific seed
    pub fn with_seed(seed: i32) -> Self {
        Random { x: seed as u32 }
    }

    /// Generate random double in [0.0, 1.0), consuming one step of the stream.
    pub fn next_double(&mut self) -> f64 {
        f64::from(self.rand_int16()) / 32768.0
    }

    fn rand_int16(&mut self) -> u32 {
        self.x = self.x.wrapping_mul(214013).wrapping_add(2531011);
        (self.x >> 16) & 0x7FFF
    }
}
