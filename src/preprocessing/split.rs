//! Seeded train/validation splitting

use crate::error::{Result, TabError};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Train and validation row indices into the train-origin rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitAssignment {
    pub train: Vec<usize>,
    pub valid: Vec<usize>,
}

impl SplitAssignment {
    pub fn new(train: Vec<usize>, valid: Vec<usize>) -> Self {
        Self { train, valid }
    }

    pub fn len(&self) -> usize {
        self.train.len() + self.valid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check that the split partitions exactly `0..n_train`.
    ///
    /// An index outside the train range would pull non-train rows into
    /// fitting, so any violation is reported as a leakage violation.
    pub fn validate(&self, n_train: usize) -> Result<()> {
        let mut seen = vec![false; n_train];
        for &i in self.train.iter().chain(&self.valid) {
            if i >= n_train {
                return Err(TabError::LeakageViolation(format!(
                    "split index {} is outside the train range 0..{}",
                    i, n_train
                )));
            }
            if seen[i] {
                return Err(TabError::LeakageViolation(format!(
                    "split index {} is assigned twice",
                    i
                )));
            }
            seen[i] = true;
        }
        if let Some(missing) = seen.iter().position(|s| !s) {
            return Err(TabError::LeakageViolation(format!(
                "train row {} is in neither split",
                missing
            )));
        }
        Ok(())
    }
}

/// Random split holding out `valid_pct` of the rows for validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomSplitter {
    valid_pct: f64,
    random_state: Option<u64>,
}

impl Default for RandomSplitter {
    fn default() -> Self {
        Self {
            valid_pct: 0.2,
            random_state: None,
        }
    }
}

impl RandomSplitter {
    pub fn new(valid_pct: f64) -> Self {
        Self {
            valid_pct,
            random_state: None,
        }
    }

    /// Set random state for reproducibility
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn valid_pct(&self) -> f64 {
        self.valid_pct
    }

    /// Number of validation rows for `n` train rows
    pub fn n_valid(&self, n: usize) -> usize {
        ((self.valid_pct * n as f64).round() as usize).min(n)
    }

    /// Shuffle `0..n` and cut off the first `round(valid_pct * n)` indices
    /// as the validation set.
    pub fn split(&self, n: usize) -> Result<SplitAssignment> {
        if !(0.0..1.0).contains(&self.valid_pct) {
            return Err(TabError::invalid("valid_pct", self.valid_pct, "must be in [0, 1)"));
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = match self.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        indices.shuffle(&mut rng);

        let cut = self.n_valid(n);
        let train = indices.split_off(cut);
        Ok(SplitAssignment::new(train, indices))
    }
}
