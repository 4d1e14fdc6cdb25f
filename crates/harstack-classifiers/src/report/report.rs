use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use plotly::Plot;

/// Version of plotly.js loaded by rendered reports.
const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const STYLE: &str = "
body { font-family: sans-serif; margin: 2em auto; max-width: 1100px; color: #222; }
header { border-bottom: 2px solid #3b6ea5; margin-bottom: 1.5em; }
section { margin-bottom: 2.5em; }
table { border-collapse: collapse; margin: 0.5em 0 1.5em 0; }
th, td { border: 1px solid #ccc; padding: 4px 8px; text-align: right; }
th { background-color: #eef3f8; }
.code-container { background-color: #f5f5f5; padding: 10px; border-radius: 5px; overflow-x: auto; font-family: monospace; white-space: pre-wrap; }
";

enum Block {
    Content(Markup),
    Plot(Plot),
}

/// A titled block of HTML content and plots.
pub struct ReportSection {
    title: String,
    blocks: Vec<Block>,
}

impl ReportSection {
    pub fn new(title: &str) -> Self {
        ReportSection {
            title: title.to_string(),
            blocks: Vec::new(),
        }
    }

    pub fn add_content(&mut self, content: Markup) {
        self.blocks.push(Block::Content(content));
    }

    pub fn add_plot(&mut self, plot: Plot) {
        self.blocks.push(Block::Plot(plot));
    }

    fn render(&self, section_index: usize) -> Markup {
        html! {
            section {
                h2 { (self.title) }
                @for (i, block) in self.blocks.iter().enumerate() {
                    @match block {
                        Block::Content(markup) => { div { (markup) } }
                        Block::Plot(plot) => {
                            div { (PreEscaped(plot.to_inline_html(Some(&format!("plot-{}-{}", section_index, i))))) }
                        }
                    }
                }
            }
        }
    }
}

/// Self-contained HTML report assembled from sections.
pub struct Report {
    tool: String,
    version: String,
    title: String,
    generated_at: String,
    sections: Vec<ReportSection>,
}

impl Report {
    pub fn new(tool: &str, version: &str, title: &str) -> Self {
        Report {
            tool: tool.to_string(),
            version: version.to_string(),
            title: title.to_string(),
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            sections: Vec::new(),
        }
    }

    pub fn add_section(&mut self, section: ReportSection) {
        self.sections.push(section);
    }

    pub fn render(&self) -> Markup {
        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    script src=(PLOTLY_JS) {}
                    style { (PreEscaped(STYLE)) }
                }
                body {
                    header {
                        h1 { (self.title) }
                        p { (self.tool) " " (self.version) " | generated " (self.generated_at) }
                    }
                    @for (i, section) in self.sections.iter().enumerate() {
                        (section.render(i))
                    }
                }
            }
        }
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render().into_string())
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        log::info!("Report written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotly::Bar;

    #[test]
    fn renders_sections_and_plots() {
        let mut report = Report::new("harstack", "0.1.0", "Test Report");
        let mut section = ReportSection::new("Overview");
        section.add_content(html! { p { "hello & welcome" } });
        let mut plot = Plot::new();
        plot.add_trace(Bar::new(vec!["a", "b"], vec![1.0, 2.0]));
        section.add_plot(plot);
        report.add_section(section);

        let page = report.render().into_string();
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<h2>Overview</h2>"));
        assert!(page.contains("hello &amp; welcome"));
        assert!(page.contains("plot-0-1"));
    }

    #[test]
    fn save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");
        Report::new("harstack", "0.1.0", "Empty").save_to_file(&path).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("<title>Empty</title>"));
    }
}
