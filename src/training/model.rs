//! Embedding + dense network for tabular regression

use super::Adam;
use crate::error::{Result, TabError};
use ndarray::{s, Array1, Array2, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Half-width of the uniform range embeddings are drawn from
const EMB_INIT: f64 = 0.01;

/// Embedding width for a column with `n_cat` codes
pub fn emb_sz_rule(n_cat: usize) -> usize {
    let size = (1.6 * (n_cat as f64).powf(0.56)).round() as usize;
    size.min(600)
}

/// Cached activations of one forward pass
#[derive(Debug)]
pub(crate) struct Forward {
    /// Embeddings and continuous values, concatenated
    input: Array2<f64>,
    /// Pre-activation of every hidden layer
    pre: Vec<Array2<f64>>,
    /// Input of every dense layer (`acts[0] == input`)
    acts: Vec<Array2<f64>>,
    output: Array1<f64>,
}

impl Forward {
    pub(crate) fn output(&self) -> &Array1<f64> {
        &self.output
    }
}

/// Parameter gradients, laid out like the model
#[derive(Debug)]
pub(crate) struct Gradients {
    pub(crate) embeddings: Vec<Array2<f64>>,
    pub(crate) weights: Vec<Array2<f64>>,
    pub(crate) biases: Vec<Array1<f64>>,
}

/// One embedding table per categorical column, concatenated with the
/// continuous features and fed through dense ReLU layers to one linear
/// output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabularModel {
    embeddings: Vec<Array2<f64>>,
    weights: Vec<Array2<f64>>,
    biases: Vec<Array1<f64>>,
    n_cont: usize,
}

impl TabularModel {
    pub fn new(cardinalities: &[usize], n_cont: usize, layers: &[usize], seed: Option<u64>) -> Result<Self> {
        if let Some(&card) = cardinalities.iter().find(|&&c| c == 0) {
            return Err(TabError::invalid("cardinality", card, "every categorical column needs at least one code"));
        }
        if layers.iter().any(|&w| w == 0) {
            return Err(TabError::invalid("layers", format!("{:?}", layers), "layer widths must be positive"));
        }

        let mut rng = match seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        let mut embeddings = Vec::with_capacity(cardinalities.len());
        for &card in cardinalities {
            let width = emb_sz_rule(card);
            let values: Vec<f64> = (0..card * width)
                .map(|_| rng.gen_range(-EMB_INIT..=EMB_INIT))
                .collect();
            embeddings.push(Array2::from_shape_vec((card, width), values)?);
        }

        let n_emb: usize = embeddings.iter().map(|e| e.ncols()).sum();
        let mut layer_sizes = vec![n_emb + n_cont];
        layer_sizes.extend(layers);
        layer_sizes.push(1);

        let mut weights = Vec::with_capacity(layer_sizes.len() - 1);
        let mut biases = Vec::with_capacity(layer_sizes.len() - 1);
        for pair in layer_sizes.windows(2) {
            let (n_in, n_out) = (pair[0], pair[1]);
            // Xavier/Glorot initialization
            let scale = (2.0 / (n_in + n_out) as f64).sqrt();
            let values: Vec<f64> = (0..n_in * n_out)
                .map(|_| rng.gen::<f64>() * 2.0 * scale - scale)
                .collect();
            weights.push(Array2::from_shape_vec((n_in, n_out), values)?);
            biases.push(Array1::zeros(n_out));
        }

        Ok(Self {
            embeddings,
            weights,
            biases,
            n_cont,
        })
    }

    /// Start the output at `bias` instead of 0
    pub fn with_output_bias(mut self, bias: f64) -> Self {
        if let Some(last) = self.biases.last_mut() {
            last.fill(bias);
        }
        self
    }

    /// Embedding widths, one per categorical column
    pub fn emb_sizes(&self) -> Vec<usize> {
        self.embeddings.iter().map(|e| e.ncols()).collect()
    }

    pub fn n_inputs(&self) -> usize {
        self.weights.first().map(|w| w.nrows()).unwrap_or(0)
    }

    pub fn n_params(&self) -> usize {
        self.embeddings.iter().map(|e| e.len()).sum::<usize>()
            + self.weights.iter().map(|w| w.len()).sum::<usize>()
            + self.biases.iter().map(|b| b.len()).sum::<usize>()
    }

    pub fn predict(&self, cats: &Array2<usize>, conts: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self.forward(cats, conts)?.output)
    }

    fn check_inputs(&self, cats: &Array2<usize>, conts: &Array2<f64>) -> Result<()> {
        if cats.ncols() != self.embeddings.len() || conts.ncols() != self.n_cont || cats.nrows() != conts.nrows() {
            return Err(TabError::ShapeError {
                expected: format!("{} categorical, {} continuous", self.embeddings.len(), self.n_cont),
                actual: format!("{:?} codes, {:?} values", cats.dim(), conts.dim()),
            });
        }
        for (emb, column) in self.embeddings.iter().zip(cats.columns()) {
            if let Some(&code) = column.iter().find(|&&c| c >= emb.nrows()) {
                return Err(TabError::ShapeError {
                    expected: format!("code < {}", emb.nrows()),
                    actual: code.to_string(),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn forward(&self, cats: &Array2<usize>, conts: &Array2<f64>) -> Result<Forward> {
        self.check_inputs(cats, conts)?;
        let n = cats.nrows();

        let mut input = Array2::<f64>::zeros((n, self.n_inputs()));
        let mut offset = 0;
        for (j, emb) in self.embeddings.iter().enumerate() {
            let width = emb.ncols();
            for i in 0..n {
                input
                    .slice_mut(s![i, offset..offset + width])
                    .assign(&emb.row(cats[[i, j]]));
            }
            offset += width;
        }
        input.slice_mut(s![.., offset..]).assign(conts);

        let last = self.weights.len() - 1;
        let mut acts = vec![input.clone()];
        let mut pre = Vec::with_capacity(last);
        for i in 0..last {
            let z = acts[i].dot(&self.weights[i]) + &self.biases[i];
            acts.push(z.mapv(|x| x.max(0.0)));
            pre.push(z);
        }
        let output = acts[last].dot(&self.weights[last]) + &self.biases[last];

        Ok(Forward {
            input,
            pre,
            acts,
            output: output.column(0).to_owned(),
        })
    }

    /// Gradients of the mean squared error over the batch
    pub(crate) fn backward(&self, cache: &Forward, cats: &Array2<usize>, ys: &Array1<f64>) -> Result<Gradients> {
        let n = ys.len();
        if cache.output.len() != n {
            return Err(TabError::ShapeError {
                expected: format!("{} targets", cache.output.len()),
                actual: n.to_string(),
            });
        }

        let mut delta = ((&cache.output - ys) * (2.0 / n.max(1) as f64)).insert_axis(Axis(1));
        let mut weights = Vec::with_capacity(self.weights.len());
        let mut biases = Vec::with_capacity(self.biases.len());

        for i in (0..self.weights.len()).rev() {
            weights.push(cache.acts[i].t().dot(&delta));
            biases.push(delta.sum_axis(Axis(0)));
            let upstream = delta.dot(&self.weights[i].t());
            delta = if i > 0 {
                let relu_grad = cache.pre[i - 1].mapv(|x| if x > 0.0 { 1.0 } else { 0.0 });
                upstream * relu_grad
            } else {
                upstream
            };
        }
        weights.reverse();
        biases.reverse();

        // delta is now the gradient w.r.t. the concatenated input
        debug_assert_eq!(delta.dim(), cache.input.dim());
        let mut embeddings: Vec<Array2<f64>> = self
            .embeddings
            .iter()
            .map(|e| Array2::zeros(e.raw_dim()))
            .collect();
        let mut offset = 0;
        for (j, grad) in embeddings.iter_mut().enumerate() {
            let width = grad.ncols();
            for i in 0..n {
                let mut row = grad.row_mut(cats[[i, j]]);
                row += &delta.slice(s![i, offset..offset + width]);
            }
            offset += width;
        }

        Ok(Gradients {
            embeddings,
            weights,
            biases,
        })
    }

    /// One optimizer step. Slots run embeddings, weights, biases.
    pub(crate) fn step(&mut self, grads: &Gradients, optimizer: &mut Adam) {
        optimizer.step();
        let mut slot = 0;
        for (p, g) in self.embeddings.iter_mut().zip(&grads.embeddings) {
            optimizer.update(slot, p, g);
            slot += 1;
        }
        for (p, g) in self.weights.iter_mut().zip(&grads.weights) {
            optimizer.update(slot, p, g);
            slot += 1;
        }
        for (p, g) in self.biases.iter_mut().zip(&grads.biases) {
            optimizer.update(slot, p, g);
            slot += 1;
        }
    }
}
