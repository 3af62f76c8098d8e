//! Mini-batch loaders over processed rows

use crate::error::{Result, TabError};
use crate::preprocessing::ProcessedSplit;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Batches of a [`ProcessedSplit`], optionally reshuffled every epoch.
///
/// With a seed the order of epoch `e` is fully determined by `seed + e`.
#[derive(Debug, Clone)]
pub struct TabDataLoader {
    data: ProcessedSplit,
    batch_size: usize,
    shuffle: bool,
    seed: Option<u64>,
}

impl TabDataLoader {
    pub fn new(data: ProcessedSplit, batch_size: usize, shuffle: bool, seed: Option<u64>) -> Result<Self> {
        if batch_size == 0 {
            return Err(TabError::invalid("batch_size", batch_size, "must be at least 1"));
        }
        Ok(Self {
            data,
            batch_size,
            shuffle,
            seed,
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of batches per epoch; the last one may be short
    pub fn n_batches(&self) -> usize {
        (self.len() + self.batch_size - 1) / self.batch_size
    }

    pub fn data(&self) -> &ProcessedSplit {
        &self.data
    }

    fn order(&self, epoch: u64) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        if self.shuffle {
            let mut rng = match self.seed {
                Some(seed) => ChaCha8Rng::seed_from_u64(seed.wrapping_add(epoch)),
                None => ChaCha8Rng::from_entropy(),
            };
            indices.shuffle(&mut rng);
        }
        indices
    }

    /// Batches for one epoch
    pub fn batches(&self, epoch: u64) -> impl Iterator<Item = ProcessedSplit> + '_ {
        let order = self.order(epoch);
        let batch_size = self.batch_size;
        (0..self.n_batches()).map(move |b| {
            let end = ((b + 1) * batch_size).min(order.len());
            self.data.select(&order[b * batch_size..end])
        })
    }
}

/// Train and validation loaders plus the layout both share
#[derive(Debug, Clone)]
pub struct TabDataLoaders {
    pub train: TabDataLoader,
    pub valid: TabDataLoader,
    cardinalities: Vec<usize>,
    n_cont: usize,
}

impl TabDataLoaders {
    pub fn new(
        train: TabDataLoader,
        valid: TabDataLoader,
        cardinalities: Vec<usize>,
        n_cont: usize,
    ) -> Result<Self> {
        for (name, dl) in [("train", &train), ("valid", &valid)] {
            let (n_cat, n_con) = (dl.data().cats().ncols(), dl.data().conts().ncols());
            if n_cat != cardinalities.len() || n_con != n_cont {
                return Err(TabError::ShapeError {
                    expected: format!("{} categorical, {} continuous", cardinalities.len(), n_cont),
                    actual: format!("{} loader has {} categorical, {} continuous", name, n_cat, n_con),
                });
            }
        }
        Ok(Self {
            train,
            valid,
            cardinalities,
            n_cont,
        })
    }

    pub fn cardinalities(&self) -> &[usize] {
        &self.cardinalities
    }

    pub fn n_cont(&self) -> usize {
        self.n_cont
    }
}
