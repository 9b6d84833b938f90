//! Stimulus draws.
//!
//! Values are drawn uniformly from 0..=9 and redrawn while they hit 0, 5 or
//! the previous value, which leaves seven candidates per draw (about 1.43
//! draws on average). Neither 0 nor 5 has both a higher/lower and an odd/even
//! answer under the task rules.

use rand::Rng;
use switchrt_core::{ColorCategory, Stimulus};

/// Neutral under the magnitude rule.
pub const PIVOT_VALUE: u8 = 5;

/// Previous value used for the first trial of a session.
pub const NO_PREVIOUS: u8 = 0;

pub fn next_value<R: Rng + ?Sized>(rng: &mut R, previous: u8) -> u8 {
    loop {
        let candidate: u8 = rng.random_range(0..10);
        if candidate != 0 && candidate != PIVOT_VALUE && candidate != previous {
            return candidate;
        }
    }
}

pub fn next_category<R: Rng + ?Sized>(rng: &mut R) -> ColorCategory {
    if rng.random_bool(0.5) {
        ColorCategory::Blue
    } else {
        ColorCategory::Pink
    }
}

pub fn next_stimulus<R: Rng + ?Sized>(rng: &mut R, previous: u8) -> Stimulus {
    let category = next_category(rng);
    let value = next_value(rng, previous);
    Stimulus { value, category }
}
