//! Seeded, label-stratified train/validation partitioning.
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Row indices of the model-training and validation subsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub train_indices: Vec<usize>,
    pub validation_indices: Vec<usize>,
}

impl Partition {
    pub fn n_train(&self) -> usize {
        self.train_indices.len()
    }

    pub fn n_validation(&self) -> usize {
        self.validation_indices.len()
    }
}

/// Row indices grouped by class, in ascending class order.
pub fn indices_by_class(labels: &[usize]) -> Vec<Vec<usize>> {
    let n_classes = labels.iter().copied().max().map_or(0, |m| m + 1);
    let mut groups = vec![Vec::new(); n_classes];
    for (i, &label) in labels.iter().enumerate() {
        groups[label].push(i);
    }
    groups
}

/// Split rows into train/validation subsets, preserving class proportions.
///
/// Within each class the rows are shuffled with a `ChaCha8Rng` seeded from
/// `seed`, and the first `ceil(n_class * train_fraction)` rows go to the
/// training subset. Identical inputs always give the identical partition.
pub fn stratified_split(labels: &[usize], train_fraction: f64, seed: u64) -> Partition {
    let partition = split_by_class(labels, train_fraction, seed);
    log::info!(
        "Partitioned {} rows into {} training and {} validation rows",
        labels.len(),
        partition.n_train(),
        partition.n_validation()
    );
    partition
}

/// Stratified subsample of at most `max_rows` row indices, sorted.
pub fn stratified_subsample(labels: &[usize], max_rows: usize, seed: u64) -> Vec<usize> {
    if labels.len() <= max_rows {
        return (0..labels.len()).collect();
    }
    let fraction = max_rows as f64 / labels.len() as f64;
    split_by_class(labels, fraction, seed).train_indices
}

fn split_by_class(labels: &[usize], train_fraction: f64, seed: u64) -> Partition {
    let fraction = train_fraction.clamp(0.0, 1.0);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut train_indices = Vec::with_capacity((labels.len() as f64 * fraction).ceil() as usize);
    let mut validation_indices = Vec::new();

    for mut group in indices_by_class(labels) {
        group.shuffle(&mut rng);
        let n_train =
            ((group.len() as f64 * fraction - 1e-9).ceil().max(0.0) as usize).min(group.len());
        train_indices.extend_from_slice(&group[..n_train]);
        validation_indices.extend_from_slice(&group[n_train..]);
    }

    train_indices.sort_unstable();
    validation_indices.sort_unstable();

    Partition {
        train_indices,
        validation_indices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balanced(n_per_class: usize, n_classes: usize) -> Vec<usize> {
        (0..n_per_class * n_classes).map(|i| i % n_classes).collect()
    }

    #[test]
    fn split_is_eighty_twenty_for_balanced_classes() {
        let labels = balanced(20, 5);
        let p = stratified_split(&labels, 0.8, 42);
        assert_eq!(p.n_train(), 80);
        assert_eq!(p.n_validation(), 20);
    }

    #[test]
    fn split_is_disjoint_and_exhaustive() {
        let labels: Vec<usize> = (0..97).map(|i| (i * 7 + 3) % 4).collect();
        let p = stratified_split(&labels, 0.8, 7);
        let mut all: Vec<usize> = p
            .train_indices
            .iter()
            .chain(p.validation_indices.iter())
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..97).collect::<Vec<_>>());
    }

    #[test]
    fn split_is_stable_for_seed() {
        let labels = balanced(30, 3);
        assert_eq!(stratified_split(&labels, 0.8, 1), stratified_split(&labels, 0.8, 1));
        assert_ne!(
            stratified_split(&labels, 0.8, 1).train_indices,
            stratified_split(&labels, 0.8, 2).train_indices
        );
    }

    #[test]
    fn class_proportions_are_preserved() {
        let mut labels = vec![0usize; 60];
        labels.extend(vec![1usize; 30]);
        labels.extend(vec![2usize; 10]);
        let p = stratified_split(&labels, 0.8, 3);
        let count =
            |idx: &[usize], class: usize| idx.iter().filter(|&&i| labels[i] == class).count();
        assert_eq!(count(&p.train_indices, 0), 48);
        assert_eq!(count(&p.train_indices, 1), 24);
        assert_eq!(count(&p.train_indices, 2), 8);
        assert_eq!(count(&p.validation_indices, 2), 2);
    }

    #[test]
    fn subsample_caps_rows_and_keeps_every_class() {
        let mut labels = vec![0usize; 90];
        labels.extend(vec![1usize; 10]);
        let rows = stratified_subsample(&labels, 50, 9);
        assert!(rows.len() >= 50 && rows.len() <= 52);
        assert!(rows.iter().any(|&i| labels[i] == 1));
        assert_eq!(stratified_subsample(&labels, 500, 9).len(), 100);
    }
}
