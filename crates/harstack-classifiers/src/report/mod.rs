pub mod plots;
pub mod report;
pub mod summary;

pub use report::{Report, ReportSection};
pub use summary::{build_report, EnsembleSummary, ModelSummary, RunSummary, ShapeSummary};
