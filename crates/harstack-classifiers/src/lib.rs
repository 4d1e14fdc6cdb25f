//! harstack-classifiers: building blocks for stacked activity-recognition
//! classification.
//!
//! This crate provides table loading and cleaning, a center/scale/PCA
//! reducer, seeded stratified partitioning, four base classifiers tuned by
//! repeated k-fold cross-validation (decision tree, random forest, LDA and
//! radial SVM), a stacked ensemble over their predictions, confusion-matrix
//! evaluation, prediction-file output and HTML/JSON reporting.
//!
//! Trees come from `smartcore`, SVMs from `linfa`, and the PCA eigen-solver
//! and LDA Cholesky solve from `nalgebra`; all are pure Rust, so no system
//! BLAS/LAPACK is needed.
pub mod cleaning;
pub mod config;
pub mod cross_validation;
pub mod data_handling;
pub mod ensemble;
pub mod error;
pub mod evaluation;
pub mod io;
pub mod model_bank;
pub mod models;
pub mod partition;
pub mod preprocessing;
pub mod reduction;
pub mod report;
