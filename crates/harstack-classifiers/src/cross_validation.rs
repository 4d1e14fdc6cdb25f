//! Repeated stratified k-fold cross-validation for hyper-parameter selection.
use anyhow::{bail, Context, Result};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::config::{CrossValidationConfig, MethodId, ModelType};
use crate::models::{fit_model, Classifier};
use crate::partition::indices_by_class;

/// Fold layout for repeated stratified k-fold resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatedKFold {
    pub folds: usize,
    pub repeats: usize,
}

impl From<&CrossValidationConfig> for RepeatedKFold {
    fn from(cfg: &CrossValidationConfig) -> Self {
        RepeatedKFold {
            folds: cfg.folds,
            repeats: cfg.repeats,
        }
    }
}

impl RepeatedKFold {
    /// Held-out row indices of every fold of one repeat.
    ///
    /// Within each class (ascending), the shuffled rows are dealt round-robin
    /// into the folds; the deal continues across classes so fold sizes differ
    /// by at most one. Each fold is sorted.
    pub fn folds_for_repeat(&self, labels: &[usize], repeat: usize, seed: u64) -> Vec<Vec<usize>> {
        let k = self.folds.max(1);
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(repeat as u64));
        let mut folds = vec![Vec::new(); k];
        let mut next = 0usize;
        for mut group in indices_by_class(labels) {
            group.shuffle(&mut rng);
            for idx in group {
                folds[next % k].push(idx);
                next += 1;
            }
        }
        for fold in folds.iter_mut() {
            fold.sort_unstable();
        }
        folds
    }
}

/// Resampled accuracy of one hyper-parameter candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub params: ModelType,
    pub mean_accuracy: f64,
    pub sd_accuracy: f64,
    pub n_resamples: usize,
}

/// Cross-validation results of one model, with the selected candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvSummary {
    pub method: MethodId,
    pub folds: usize,
    pub repeats: usize,
    pub candidates: Vec<CandidateScore>,
    pub best_index: usize,
}

impl CvSummary {
    pub fn best(&self) -> &CandidateScore {
        &self.candidates[self.best_index]
    }
}

/// A classifier refit on all training rows with its selected parameters.
pub struct TrainedModel {
    pub method: MethodId,
    pub params: ModelType,
    pub cv: CvSummary,
    pub model: Box<dyn Classifier>,
}

impl TrainedModel {
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        self.model.predict(x)
    }
}

pub fn accuracy(predicted: &Array1<usize>, actual: &Array1<usize>) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let correct = predicted.iter().zip(actual.iter()).filter(|(p, a)| p == a).count();
    correct as f64 / actual.len() as f64
}

/// Tune `model` by repeated stratified k-fold CV, then refit the best
/// candidate on all of `x`.
///
/// Every (candidate, repeat, fold) fit runs on the current rayon pool. The
/// candidate with the highest mean held-out accuracy wins; ties go to the
/// earlier candidate. Any fit failure aborts.
pub fn train_with_cv(
    model: &ModelType,
    x: &Array2<f64>,
    y: &Array1<usize>,
    n_classes: usize,
    cv: &CrossValidationConfig,
    seed: u64,
) -> Result<TrainedModel> {
    if x.nrows() != y.len() {
        bail!("Feature matrix has {} rows but {} labels were given", x.nrows(), y.len());
    }
    let method = model.method();
    let scheme = RepeatedKFold::from(cv);
    if scheme.folds < 2 || scheme.repeats == 0 {
        bail!(
            "Cross-validation needs at least 2 folds and 1 repeat (got {} folds, {} repeats)",
            scheme.folds,
            scheme.repeats
        );
    }
    let candidates = model.candidates(x.ncols(), cv.tune_length);
    let labels = y.to_vec();

    let fold_sets: Vec<Vec<Vec<usize>>> = (0..scheme.repeats)
        .map(|r| scheme.folds_for_repeat(&labels, r, seed))
        .collect();

    let jobs: Vec<(usize, usize, usize)> = (0..candidates.len())
        .flat_map(|c| {
            (0..scheme.repeats).flat_map(move |r| (0..scheme.folds).map(move |f| (c, r, f)))
        })
        .collect();

    log::debug!(
        "Cross-validating {} with {} candidates x {} repeats x {} folds",
        method,
        candidates.len(),
        scheme.repeats,
        scheme.folds
    );

    let scores: Vec<(usize, Option<f64>)> = jobs
        .par_iter()
        .map(|&(c, r, f)| {
            let held_out = &fold_sets[r][f];
            if held_out.is_empty() {
                return Ok((c, None));
            }
            let mut is_held_out = vec![false; labels.len()];
            for &i in held_out {
                is_held_out[i] = true;
            }
            let train_rows: Vec<usize> = (0..labels.len()).filter(|&i| !is_held_out[i]).collect();

            let fit_seed = seed.wrapping_add((r * scheme.folds + f) as u64);
            let fitted = fit_model(
                &candidates[c],
                &x.select(Axis(0), &train_rows),
                &y.select(Axis(0), &train_rows),
                n_classes,
                fit_seed,
            )
            .with_context(|| format!("{} fit failed in repeat {} fold {}", method, r + 1, f + 1))?;
            let predicted = fitted.predict(&x.select(Axis(0), held_out))?;
            let acc = accuracy(&predicted, &y.select(Axis(0), held_out));
            log::trace!(
                "{} candidate {} repeat {} fold {}: accuracy {:.4}",
                method,
                c,
                r + 1,
                f + 1,
                acc
            );
            Ok((c, Some(acc)))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut per_candidate: Vec<Vec<f64>> = vec![Vec::new(); candidates.len()];
    for (c, acc) in scores {
        if let Some(acc) = acc {
            per_candidate[c].push(acc);
        }
    }

    let summaries: Vec<CandidateScore> = candidates
        .iter()
        .zip(per_candidate.iter())
        .map(|(params, accs)| {
            let mean_accuracy = if accs.is_empty() { 0.0 } else { accs.iter().mean() };
            let sd = accs.iter().std_dev();
            let summary = CandidateScore {
                params: params.clone(),
                mean_accuracy,
                sd_accuracy: if sd.is_finite() { sd } else { 0.0 },
                n_resamples: accs.len(),
            };
            log::debug!(
                "{} {:?}: accuracy {:.4} (sd {:.4}, {} resamples)",
                method,
                summary.params,
                summary.mean_accuracy,
                summary.sd_accuracy,
                summary.n_resamples
            );
            summary
        })
        .collect();

    let mut best_index = 0;
    for (i, s) in summaries.iter().enumerate() {
        if s.mean_accuracy > summaries[best_index].mean_accuracy {
            best_index = i;
        }
    }
    let params = summaries[best_index].params.clone();
    log::info!(
        "{} selected {:?} with CV accuracy {:.4}",
        method,
        params,
        summaries[best_index].mean_accuracy
    );

    let model = fit_model(&params, x, y, n_classes, seed)
        .with_context(|| format!("Final {} fit failed", method))?;

    Ok(TrainedModel {
        method,
        params,
        cv: CvSummary {
            method,
            folds: scheme.folds,
            repeats: scheme.repeats,
            candidates: summaries,
            best_index,
        },
        model,
    })
}
