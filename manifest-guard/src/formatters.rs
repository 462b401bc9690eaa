//! Report formatting for CLI and machine consumers.
//!
//! Two shipped formatters: [`JsonFormatter`] renders the positional-array
//! document spreadsheet consumers expect, [`HumanFormatter`] renders a
//! console summary.

use std::fmt::Write;

use crate::error::{GuardError, Result};
use crate::report::{Finding, ValidationReport};

/// Configuration options for formatting validation reports.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Include run metrics in output
    pub include_metrics: bool,
    /// Include individual findings
    pub include_findings: bool,
    /// Maximum number of findings to display (-1 for all)
    pub max_findings: i32,
    /// Whether to use colorized output (human formatter only)
    pub use_colors: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            include_metrics: true,
            include_findings: true,
            max_findings: -1,
            use_colors: true,
        }
    }
}

impl FormatterConfig {
    /// Creates a minimal configuration showing only the summary.
    pub fn minimal() -> Self {
        Self {
            include_metrics: true,
            include_findings: false,
            max_findings: 0,
            use_colors: false,
        }
    }

    /// Creates a configuration suitable for CI environments.
    pub fn ci() -> Self {
        Self {
            include_metrics: true,
            include_findings: true,
            max_findings: 50,
            use_colors: false,
        }
    }

    /// Sets whether to include run metrics.
    pub fn with_metrics(mut self, include: bool) -> Self {
        self.include_metrics = include;
        self
    }

    /// Sets the maximum number of findings to display.
    pub fn with_max_findings(mut self, max: i32) -> Self {
        self.max_findings = max;
        self
    }

    /// Sets whether to use colorized output.
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }
}

/// Trait for rendering a validation report into an output format.
pub trait ReportFormatter {
    /// Formats a report into a string representation.
    fn format(&self, report: &ValidationReport) -> Result<String>;

    /// Formats a report with custom configuration.
    fn format_with_config(
        &self,
        report: &ValidationReport,
        _config: &FormatterConfig,
    ) -> Result<String> {
        self.format(report)
    }
}

/// Renders the positional-array JSON document
/// `{"errors": [[row, attribute, message, value], …], "warnings": […]}`.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a pretty-printing JSON formatter.
    pub fn new() -> Self {
        Self { pretty: true }
    }

    /// Sets whether to pretty-print.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for JsonFormatter {
    fn format(&self, report: &ValidationReport) -> Result<String> {
        let document = report.to_positional_json();
        if self.pretty {
            serde_json::to_string_pretty(&document)
                .map_err(|e| GuardError::internal(format!("failed to serialize report: {e}")))
        } else {
            serde_json::to_string(&document)
                .map_err(|e| GuardError::internal(format!("failed to serialize report: {e}")))
        }
    }
}

/// Renders a human-readable console summary.
#[derive(Debug, Clone)]
pub struct HumanFormatter {
    config: FormatterConfig,
}

impl HumanFormatter {
    /// Creates a formatter with default configuration.
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
        }
    }

    /// Creates a formatter with the specified configuration.
    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }

    fn write_finding(output: &mut String, finding: &Finding, use_colors: bool) {
        let symbol = match finding.level {
            crate::report::Level::Error => {
                if use_colors {
                    "\x1b[31merror\x1b[0m"
                } else {
                    "error"
                }
            }
            crate::report::Level::Warning => {
                if use_colors {
                    "\x1b[33mwarning\x1b[0m"
                } else {
                    "warning"
                }
            }
        };
        let location = match finding.row {
            Some(row) => format!("row {row}, column '{}'", finding.attribute),
            None => format!("column '{}'", finding.attribute),
        };
        writeln!(
            output,
            "   {symbol} [{}] {location}: {}",
            finding.rule, finding.message
        )
        .unwrap();
    }
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for HumanFormatter {
    fn format(&self, report: &ValidationReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(
        &self,
        report: &ValidationReport,
        config: &FormatterConfig,
    ) -> Result<String> {
        let mut output = String::new();

        writeln!(output).unwrap();
        if report.is_valid() {
            if config.use_colors {
                writeln!(output, "\x1b[32mManifest VALID for submission\x1b[0m").unwrap();
            } else {
                writeln!(output, "Manifest VALID for submission").unwrap();
            }
        } else if config.use_colors {
            writeln!(output, "\x1b[31mManifest INVALID\x1b[0m").unwrap();
        } else {
            writeln!(output, "Manifest INVALID").unwrap();
        }

        if config.include_metrics {
            writeln!(output).unwrap();
            writeln!(output, "Summary:").unwrap();
            writeln!(output, "   Errors: {}", report.errors.len()).unwrap();
            writeln!(output, "   Warnings: {}", report.warnings.len()).unwrap();
            writeln!(
                output,
                "   Columns Validated: {}",
                report.metrics.columns_validated
            )
            .unwrap();
            writeln!(
                output,
                "   Rules Evaluated: {}",
                report.metrics.rules_evaluated
            )
            .unwrap();
            writeln!(
                output,
                "   Execution Time: {}ms",
                report.metrics.execution_time_ms
            )
            .unwrap();
        }

        if config.include_findings && !report.is_empty() {
            writeln!(output).unwrap();
            writeln!(output, "Findings:").unwrap();

            let all: Vec<&Finding> = report
                .errors
                .iter()
                .chain(report.warnings.iter())
                .collect();
            let shown = if config.max_findings < 0 {
                all.len()
            } else {
                all.len().min(config.max_findings as usize)
            };
            for finding in &all[..shown] {
                Self::write_finding(&mut output, finding, config.use_colors);
            }
            if all.len() > shown {
                writeln!(output, "   ... and {} more findings", all.len() - shown).unwrap();
            }
        }

        Ok(output)
    }
}
