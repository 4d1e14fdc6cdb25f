use anyhow::{bail, Result};
use ndarray::{Array1, Array2, Axis};
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::models::classifier_trait::Classifier;
use crate::models::decision_tree::{fit_tree, predict_tree, Tree};

/// Per-tree seed stride, keeps tree streams apart for neighbouring seeds.
const TREE_SEED_STRIDE: u64 = 0x9E37_79B9;

struct SubspaceTree {
    features: Vec<usize>,
    tree: Tree,
}

/// Bagged decision trees, each grown on a bootstrap sample of the rows and a
/// random subset of the feature columns. Prediction is a majority vote, ties
/// going to the lowest class index.
pub struct RandomForestClassifier {
    trees: Vec<SubspaceTree>,
    n_classes: usize,
}

pub struct ForestParams {
    pub n_trees: usize,
    pub max_features: Option<usize>,
    pub max_depth: Option<usize>,
    pub sample_fraction: f64,
}

impl RandomForestClassifier {
    pub fn fit(
        x: &Array2<f64>,
        y: &Array1<usize>,
        n_classes: usize,
        params: &ForestParams,
        seed: u64,
    ) -> Result<Self> {
        let (n_rows, n_features) = x.dim();
        if n_rows == 0 || n_features == 0 {
            bail!("Cannot fit a random forest on an empty matrix ({} x {})", n_rows, n_features);
        }
        if params.n_trees == 0 {
            bail!("Random forest needs at least one tree");
        }
        let max_features = params
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().floor() as usize)
            .clamp(1, n_features);
        let n_boot = ((n_rows as f64 * params.sample_fraction).round() as usize).max(1);

        let trees = (0..params.n_trees)
            .into_par_iter()
            .map(|t| {
                let tree_seed = seed.wrapping_add((t as u64).wrapping_mul(TREE_SEED_STRIDE));
                let mut rng = ChaCha8Rng::seed_from_u64(tree_seed);
                let rows: Vec<usize> = (0..n_boot).map(|_| rng.gen_range(0..n_rows)).collect();
                let mut features = sample(&mut rng, n_features, max_features).into_vec();
                features.sort_unstable();

                let xb = x.select(Axis(0), &rows).select(Axis(1), &features);
                let yb = y.select(Axis(0), &rows);
                let tree = fit_tree(&xb, &yb, params.max_depth)?;
                Ok(SubspaceTree { features, tree })
            })
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "Fitted random forest: {} trees, {} of {} features per tree, {} rows per bootstrap",
            trees.len(),
            max_features,
            n_features,
            n_boot
        );

        Ok(RandomForestClassifier { trees, n_classes })
    }

    /// Per-row vote counts, shape (n_rows, n_classes).
    pub fn votes(&self, x: &Array2<f64>) -> Result<Array2<usize>> {
        let mut votes = Array2::<usize>::zeros((x.nrows(), self.n_classes.max(1)));
        for member in &self.trees {
            let xs = x.select(Axis(1), &member.features);
            let pred = predict_tree(&member.tree, &xs)?;
            for (row, &class) in pred.iter().enumerate() {
                if class < votes.ncols() {
                    votes[[row, class]] += 1;
                }
            }
        }
        Ok(votes)
    }
}

impl Classifier for RandomForestClassifier {
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        Ok(self
            .votes(x)?
            .outer_iter()
            .map(|row| {
                let mut best = 0;
                for (class, &count) in row.iter().enumerate() {
                    if count > row[best] {
                        best = class;
                    }
                }
                best
            })
            .collect())
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}
