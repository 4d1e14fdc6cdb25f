use plotly::common::Mode;
use plotly::layout::{Axis, BarMode, Layout};
use plotly::{Bar, Plot, Scatter};

use crate::cross_validation::CvSummary;
use crate::reduction::PcaSummary;

/// Grouped bar chart of mean CV accuracy, one group per labelled model and
/// one bar per candidate rank.
pub fn plot_cv_accuracy(summaries: &[(&str, &CvSummary)], title: &str) -> Plot {
    let max_candidates = summaries.iter().map(|(_, s)| s.candidates.len()).max().unwrap_or(0);
    let mut plot = Plot::new();
    for rank in 0..max_candidates {
        let (names, accuracies): (Vec<String>, Vec<f64>) = summaries
            .iter()
            .filter_map(|(label, s)| {
                s.candidates
                    .get(rank)
                    .map(|c| (label.to_string(), c.mean_accuracy))
            })
            .unzip();
        plot.add_trace(Bar::new(names, accuracies).name(&format!("candidate {}", rank + 1)));
    }
    plot.set_layout(
        Layout::new()
            .title(title)
            .bar_mode(BarMode::Group)
            .x_axis(Axis::new().title("Model"))
            .y_axis(Axis::new().title("Mean CV accuracy")),
    );
    plot
}

/// Cumulative explained variance per component with the retention threshold.
pub fn plot_cumulative_variance(pca: &PcaSummary, title: &str) -> Plot {
    let components: Vec<usize> = (1..=pca.cumulative_variance_ratio.len()).collect();
    let n = components.len().max(1);

    let curve = Scatter::new(components, pca.cumulative_variance_ratio.clone())
        .mode(Mode::LinesMarkers)
        .name("Cumulative variance");
    let threshold = Scatter::new(vec![1, n], vec![pca.threshold, pca.threshold])
        .mode(Mode::Lines)
        .name("Threshold")
        .line(plotly::common::Line::new().color("red").dash(plotly::common::DashType::Dash));

    let mut plot = Plot::new();
    plot.add_trace(curve);
    plot.add_trace(threshold);
    plot.set_layout(
        Layout::new()
            .title(title)
            .x_axis(Axis::new().title("Component"))
            .y_axis(Axis::new().title("Cumulative variance ratio")),
    );
    plot
}
