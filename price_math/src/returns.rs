//! Period-over-period changes of a price series

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Simple returns `p[i] / p[i-1] - 1`
///
/// Returns an error if any divisor is zero, since the change is undefined.
pub fn pct_change(prices: &[f64]) -> Result<Vec<f64>> {
    prices
        .windows(2)
        .map(|w| {
            if w[0] == 0.0 {
                Err(MathError::CalculationError(
                    "Cannot compute a return from a zero price".to_string(),
                ))
            } else {
                Ok(w[1] / w[0] - 1.0)
            }
        })
        .collect()
}

/// First differences `p[i] - p[i-1]`
pub fn differences(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Number of rising and falling runs in a series
///
/// A run starts whenever the sign of the change flips. Unchanged periods
/// neither start nor break a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streaks {
    pub rising: usize,
    pub falling: usize,
    pub longest_rising: usize,
    pub longest_falling: usize,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

/// Count rising and falling streaks in a price series
pub fn streaks(prices: &[f64]) -> Streaks {
    let mut result = Streaks::default();
    let mut current: Option<Direction> = None;
    let mut length = 0usize;

    for change in differences(prices) {
        let direction = if change > 0.0 {
            Direction::Up
        } else if change < 0.0 {
            Direction::Down
        } else {
            continue;
        };

        if current == Some(direction) {
            length += 1;
        } else {
            current = Some(direction);
            length = 1;
            match direction {
                Direction::Up => result.rising += 1,
                Direction::Down => result.falling += 1,
            }
        }

        match direction {
            Direction::Up => result.longest_rising = result.longest_rising.max(length),
            Direction::Down => result.longest_falling = result.longest_falling.max(length),
        }
    }

    result
}
