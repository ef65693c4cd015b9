//! Report generation for generation batches

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use hf_engine::TargetStyle;
use serde::Serialize;

use crate::output::WrittenHarness;

/// Generation report over every style of one batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Report title
    pub title: String,

    /// Seconds since the Unix epoch
    pub timestamp: u64,

    /// Per-style results
    pub styles: Vec<StyleReport>,

    /// Totals across styles
    pub summary: BatchSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct StyleReport {
    pub style: TargetStyle,
    pub generated: Vec<WrittenHarness>,
    pub abandoned: Vec<AbandonedTarget>,
}

/// A target skipped for this style
#[derive(Debug, Clone, Serialize)]
pub struct AbandonedTarget {
    pub api: String,
    pub reason: String,
}

/// Summary statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub total_targets: usize,
    pub generated: usize,
    pub abandoned: usize,
    pub total_slots: usize,
}

impl BatchReport {
    /// Create a new report
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
            styles: Vec::new(),
            summary: BatchSummary::default(),
        }
    }

    /// Add the results of one style
    pub fn add_style(&mut self, style: TargetStyle, generated: Vec<WrittenHarness>, abandoned: Vec<AbandonedTarget>) {
        self.summary.total_targets += generated.len() + abandoned.len();
        self.summary.generated += generated.len();
        self.summary.abandoned += abandoned.len();
        self.summary.total_slots += generated.iter().map(|h| h.slots).sum::<usize>();

        self.styles.push(StyleReport {
            style,
            generated,
            abandoned,
        });
    }

    pub fn all_generated(&self) -> bool {
        self.summary.abandoned == 0
    }

    /// Generate text report
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("{}\n", self.title));
        output.push_str(&format!("{}\n\n", "=".repeat(self.title.len())));

        output.push_str("Summary:\n");
        output.push_str(&format!(
            "  Targets: {} total, {} generated, {} abandoned\n",
            self.summary.total_targets, self.summary.generated, self.summary.abandoned
        ));
        output.push_str(&format!("  Input slots: {}\n\n", self.summary.total_slots));

        for style in &self.styles {
            output.push_str(&format!("[{}]\n", style.style));
            output.push_str(&"-".repeat(80));
            output.push('\n');
            for harness in &style.generated {
                output.push_str(&format!("  OK   {} -> {}\n", harness.api, harness.path.display()));
            }
            for target in &style.abandoned {
                output.push_str(&format!("  SKIP {}: {}\n", target.api, target.reason));
            }
            output.push('\n');
        }

        output
    }

    /// Generate JSON report
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".into())
    }

    /// Generate markdown report
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# {}\n\n", self.title));

        output.push_str("## Summary\n\n");
        output.push_str("| Metric | Value |\n");
        output.push_str("|--------|-------|\n");
        output.push_str(&format!("| Total Targets | {} |\n", self.summary.total_targets));
        output.push_str(&format!("| Generated | {} |\n", self.summary.generated));
        output.push_str(&format!("| Abandoned | {} |\n", self.summary.abandoned));
        output.push_str(&format!("| Input Slots | {} |\n\n", self.summary.total_slots));

        for style in &self.styles {
            output.push_str(&format!("## {}\n\n", style.style));
            output.push_str("| Target | Group | Slots | File |\n");
            output.push_str("|--------|-------|-------|------|\n");
            for harness in &style.generated {
                output.push_str(&format!(
                    "| `{}` | {} | {} | `{}` |\n",
                    harness.api,
                    harness.group,
                    harness.slots,
                    harness.path.display()
                ));
            }
            output.push('\n');

            if !style.abandoned.is_empty() {
                output.push_str("### Abandoned\n\n");
                for target in &style.abandoned {
                    output.push_str(&format!("- `{}`: {}\n", target.api, target.reason));
                }
                output.push('\n');
            }
        }

        output
    }

    /// Save report to file
    pub fn save<P: AsRef<Path>>(&self, path: P, format: ReportFormat) -> std::io::Result<()> {
        let content = match format {
            ReportFormat::Json => self.to_json(),
            ReportFormat::Markdown => self.to_markdown(),
        };
        fs::write(path, content)
    }
}

/// Report output format
#[derive(Debug, Clone, Copy)]
pub enum ReportFormat {
    Json,
    Markdown,
}
