//! Threshold state machine turning a z-scored spread into positions.
//!
//! Long the spread when it is cheap (`z < -entry`), short when rich
//! (`z > entry`), and close once it crosses back through `exit`. Exits are
//! evaluated before entries, so a position never flips between Long and
//! Short without at least one Flat bar.

use serde::{Deserialize, Serialize};

use crate::error::CointError;
use crate::types::Position;
use crate::CointResult;

/// Entry and exit thresholds in standard deviations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalThresholds {
    #[serde(default = "default_entry")]
    pub entry: f64,
    #[serde(default)]
    pub exit: f64,
}

fn default_entry() -> f64 {
    0.5
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            entry: default_entry(),
            exit: 0.0,
        }
    }
}

impl SignalThresholds {
    pub fn new(entry: f64, exit: f64) -> CointResult<Self> {
        let t = Self { entry, exit };
        t.validate()?;
        Ok(t)
    }

    pub fn validate(&self) -> CointResult<()> {
        if !self.entry.is_finite() || self.entry < 0.0 {
            return Err(CointError::InvalidInput {
                field: "entry_threshold".into(),
                reason: format!("Must be finite and non-negative, got {}", self.entry),
            });
        }
        if !self.exit.is_finite() || self.exit.abs() > self.entry {
            return Err(CointError::InvalidInput {
                field: "exit_threshold".into(),
                reason: format!(
                    "Must be finite and within ±entry ({}), got {}",
                    self.entry, self.exit
                ),
            });
        }
        Ok(())
    }
}

/// One step of the state machine: the position for this bar given the
/// previous bar's position and this bar's z-score.
///
/// Exit thresholds are inclusive. An undefined z-score carries the previous
/// position forward.
pub fn next_position(
    previous: Position,
    z: Option<f64>,
    thresholds: &SignalThresholds,
) -> Position {
    let Some(z) = z else {
        return previous;
    };
    match previous {
        Position::Long if z >= thresholds.exit => Position::Flat,
        Position::Short if z <= thresholds.exit => Position::Flat,
        _ if z < -thresholds.entry => Position::Long,
        _ if z > thresholds.entry => Position::Short,
        _ => previous,
    }
}

/// Positions for every bar of `zscore`, starting Flat.
pub fn generate_signals(
    zscore: &[Option<f64>],
    thresholds: &SignalThresholds,
) -> CointResult<Vec<Position>> {
    thresholds.validate()?;

    let positions: Vec<Position> = zscore
        .iter()
        .scan(Position::Flat, |state, z| {
            *state = next_position(*state, *z, thresholds);
            Some(*state)
        })
        .collect();

    tracing::debug!(
        bars = positions.len(),
        long = positions.iter().filter(|p| **p == Position::Long).count(),
        short = positions.iter().filter(|p| **p == Position::Short).count(),
        "generated signals"
    );
    Ok(positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Position::{Flat, Long, Short};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn run(z: &[Option<f64>]) -> Vec<Position> {
        generate_signals(z, &SignalThresholds::default()).unwrap()
    }

    #[test]
    fn test_enter_hold_and_exit_long() {
        let z = [Some(0.0), Some(-0.8), Some(-0.3), Some(-0.01), Some(0.0), Some(0.2)];
        assert_eq!(run(&z), vec![Flat, Long, Long, Long, Flat, Flat]);
    }

    #[test]
    fn test_enter_hold_and_exit_short() {
        let z = [Some(0.9), Some(0.4), Some(0.1), Some(0.0), Some(-0.2)];
        assert_eq!(run(&z), vec![Short, Short, Short, Flat, Flat]);
    }

    #[test]
    fn test_exit_ties_are_inclusive() {
        let t = SignalThresholds::new(0.5, 0.0).unwrap();
        assert_eq!(next_position(Long, Some(0.0), &t), Flat);
        assert_eq!(next_position(Short, Some(0.0), &t), Flat);
    }

    #[test]
    fn test_entry_threshold_is_exclusive() {
        let t = SignalThresholds::default();
        assert_eq!(next_position(Flat, Some(-0.5), &t), Flat);
        assert_eq!(next_position(Flat, Some(0.5), &t), Flat);
    }

    #[test]
    fn test_reentry_while_long_stays_long() {
        let z = [Some(-1.0), Some(-2.0), Some(-0.7)];
        assert_eq!(run(&z), vec![Long, Long, Long]);
    }

    #[test]
    fn test_jump_through_band_goes_flat_first() {
        let z = [Some(-1.0), Some(1.0), Some(1.0), Some(-1.0), Some(-1.0)];
        assert_eq!(run(&z), vec![Long, Flat, Short, Flat, Long]);
    }

    #[test]
    fn test_undefined_zscore_carries_state() {
        let z = [None, None, Some(-0.9), None, Some(-0.1), None];
        assert_eq!(run(&z), vec![Flat, Flat, Long, Long, Long, Long]);
    }

    #[test]
    fn test_output_aligned_with_input() {
        assert!(run(&[]).is_empty());
        assert_eq!(run(&[None; 7]).len(), 7);
    }

    #[test]
    fn test_never_flips_without_flat_on_random_input() {
        let mut rng = StdRng::seed_from_u64(1234);
        let z: Vec<Option<f64>> = (0..5000)
            .map(|_| {
                if rng.gen_bool(0.1) {
                    None
                } else {
                    Some(rng.gen_range(-3.0..3.0))
                }
            })
            .collect();
        let positions = run(&z);
        for (t, w) in positions.windows(2).enumerate() {
            assert!(
                !matches!((w[0], w[1]), (Long, Short) | (Short, Long)),
                "flip at bar {}",
                t + 1
            );
        }
        // Long persists until z reaches the exit threshold
        for t in 1..positions.len() {
            if positions[t - 1] == Long && positions[t] != Long {
                assert!(z[t].unwrap() >= 0.0);
            }
        }
    }

    #[test]
    fn test_invalid_thresholds() {
        assert!(SignalThresholds::new(-0.5, 0.0).is_err());
        assert!(SignalThresholds::new(0.5, 0.8).is_err());
        assert!(SignalThresholds::new(f64::NAN, 0.0).is_err());
        let inverted = SignalThresholds {
            entry: 1.0,
            exit: -2.0,
        };
        assert!(generate_signals(&[Some(1.0)], &inverted).is_err());
    }

    #[test]
    fn test_thresholds_deserialize_with_defaults() {
        let t: SignalThresholds = serde_json::from_str("{}").unwrap();
        assert_eq!(t, SignalThresholds::default());
    }
}
