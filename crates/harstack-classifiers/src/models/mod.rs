pub mod classifier_trait;
pub mod decision_tree;
pub mod factory;
pub mod lda;
pub mod random_forest;
pub mod svm;

#[cfg(test)]
pub(crate) mod test_data;

pub use classifier_trait::Classifier;
pub use factory::fit_model;
