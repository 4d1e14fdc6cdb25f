//! Machine-readable run summary and the HTML report built from it.
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use maud::{html, Markup};
use serde::{Deserialize, Serialize};

use crate::config::{MethodId, ModelType};
use crate::cross_validation::CvSummary;
use crate::evaluation::{ErrorEstimate, EstimateKind};
use crate::reduction::PcaSummary;
use crate::report::plots::{plot_cumulative_variance, plot_cv_accuracy};
use crate::report::{Report, ReportSection};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeSummary {
    pub train_rows: usize,
    pub test_rows: usize,
    pub raw_columns: usize,
    pub feature_columns: usize,
    pub model_rows: usize,
    pub validation_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub method: MethodId,
    pub selected: ModelType,
    pub cv: CvSummary,
    pub held_out: ErrorEstimate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleSummary {
    pub combiner: ModelType,
    pub cv: CvSummary,
    pub resubstitution: ErrorEstimate,
    pub held_out: ErrorEstimate,
}

/// Everything a run reports, written as `summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub version: String,
    pub generated_at: String,
    pub seed: u64,
    pub classes: Vec<String>,
    pub shapes: ShapeSummary,
    pub pca: PcaSummary,
    pub models: Vec<ModelSummary>,
    pub ensemble: EnsembleSummary,
    pub predictions: Vec<String>,
}

impl RunSummary {
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
        log::info!("Summary written to {}", path.display());
        Ok(())
    }
}

fn confusion_table(estimate: &ErrorEstimate, classes: &[String]) -> Markup {
    html! {
        table {
            tr {
                th { "predicted \\ actual" }
                @for class in classes { th { (class) } }
            }
            @for (i, row) in estimate.confusion.iter().enumerate() {
                tr {
                    th { (classes.get(i).map(String::as_str).unwrap_or("?")) }
                    @for count in row { td { (count) } }
                }
            }
        }
    }
}

fn error_row(name: &str, estimate: &ErrorEstimate) -> Markup {
    let kind = match estimate.kind {
        EstimateKind::Resubstitution => "resubstitution (optimistic)",
        EstimateKind::HeldOut => "held-out",
    };
    html! {
        tr {
            td style="text-align: left" { (name) }
            td style="text-align: left" { (kind) }
            td { (estimate.n_rows) }
            td { (format!("{:.4}", estimate.accuracy)) }
            td { (format!("{:.4}", estimate.error)) }
            td { (format!("{:.4}", estimate.kappa)) }
        }
    }
}

/// Assemble the HTML report for a finished run.
pub fn build_report(summary: &RunSummary) -> Result<Report> {
    let mut report = Report::new(
        "harstack",
        &summary.version,
        "Activity Recognition Stacking Report",
    );

    /* Section 1: Overview */
    {
        let mut overview = ReportSection::new("Overview");
        let s = &summary.shapes;
        overview.add_content(html! {
            p {
                "Training table: " (s.train_rows) " rows, test table: " (s.test_rows) " rows, "
                (s.raw_columns) " raw columns reduced to " (s.feature_columns) " numeric features. "
                "Models were fit on " (s.model_rows) " rows and validated on " (s.validation_rows) " held-out rows."
            }
            p { "Classes: " (summary.classes.join(", ")) }
        });
        overview.add_content(html! {
            table {
                tr { th { "model" } th { "estimate" } th { "rows" } th { "accuracy" } th { "error" } th { "kappa" } }
                @for m in &summary.models {
                    (error_row(m.method.as_str(), &m.held_out))
                }
                (error_row("ensemble", &summary.ensemble.resubstitution))
                (error_row("ensemble", &summary.ensemble.held_out))
            }
        });
        report.add_section(overview);
    }

    /* Section 2: Dimensionality reduction */
    {
        let mut pca = ReportSection::new("Principal Components");
        pca.add_content(html! {
            p {
                (summary.pca.n_components) " of " (summary.pca.n_features) " components retained to explain "
                (format!("{:.0}%", summary.pca.threshold * 100.0)) " of the variance."
            }
        });
        pca.add_plot(plot_cumulative_variance(&summary.pca, "Cumulative Explained Variance"));
        report.add_section(pca);
    }

    /* Section 3: Cross-validation */
    {
        let mut cv = ReportSection::new("Cross-Validation");
        let mut summaries: Vec<(&str, &CvSummary)> =
            summary.models.iter().map(|m| (m.method.as_str(), &m.cv)).collect();
        summaries.push(("ensemble", &summary.ensemble.cv));
        cv.add_plot(plot_cv_accuracy(&summaries, "Mean CV Accuracy per Candidate"));
        for m in &summary.models {
            cv.add_content(html! {
                p { strong { (m.method) } ": selected " code { (format!("{:?}", m.selected)) } }
            });
        }
        cv.add_content(html! {
            p { strong { "ensemble" } ": selected " code { (format!("{:?}", summary.ensemble.combiner)) } }
        });
        report.add_section(cv);
    }

    /* Section 4: Confusion matrices */
    {
        let mut confusion = ReportSection::new("Held-Out Confusion Matrices");
        for m in &summary.models {
            confusion.add_content(html! {
                h3 { (m.method) }
                (confusion_table(&m.held_out, &summary.classes))
            });
        }
        confusion.add_content(html! {
            h3 { "ensemble" }
            (confusion_table(&summary.ensemble.held_out, &summary.classes))
        });
        report.add_section(confusion);
    }

    /* Section 5: Summary JSON */
    {
        let mut raw = ReportSection::new("Summary");
        let json = serde_json::to_string_pretty(summary)?;
        raw.add_content(html! {
            div class="code-container" {
                pre { code { (json) } }
            }
        });
        report.add_section(raw);
    }

    Ok(report)
}
