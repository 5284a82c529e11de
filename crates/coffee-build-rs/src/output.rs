//! Output formatting.

use crate::cli::OutputFormat;
use serde::Serialize;

/// A diagnostic for a file that failed to build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildDiagnostic {
    /// The file path.
    pub filename: String,
    /// 1-based line number, when the compiler reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// The message.
    pub message: String,
}

/// Summary of one build pass.
#[derive(Debug, Default, Serialize)]
pub struct BuildSummary {
    /// Files compiled and written.
    pub compiled: usize,
    /// Files that failed.
    pub failed: usize,
}

/// Formats diagnostics and the build summary for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the build report: diagnostics first, then the summary.
    pub fn format_report(&self, diagnostics: &[BuildDiagnostic], summary: &BuildSummary) -> String {
        match self.format {
            OutputFormat::Human => self.format_human(diagnostics, summary),
            OutputFormat::Json => self.format_json(diagnostics, summary),
            OutputFormat::Machine => self.format_machine(diagnostics, summary),
        }
    }

    fn format_human(&self, diagnostics: &[BuildDiagnostic], summary: &BuildSummary) -> String {
        let mut output = String::new();

        for diag in diagnostics {
            let line = diag.line.map(|l| format!(":{}", l)).unwrap_or_default();
            output.push_str(&format!("{}{}\nError: {}\n\n", diag.filename, line, diag.message));
        }

        output.push_str(&format!(
            "{} file{} compiled, {} failed\n",
            summary.compiled,
            if summary.compiled == 1 { "" } else { "s" },
            summary.failed
        ));

        output
    }

    fn format_json(&self, diagnostics: &[BuildDiagnostic], summary: &BuildSummary) -> String {
        #[derive(Serialize)]
        struct Report<'a> {
            diagnostics: &'a [BuildDiagnostic],
            compiled: usize,
            failed: usize,
        }

        serde_json::to_string_pretty(&Report {
            diagnostics,
            compiled: summary.compiled,
            failed: summary.failed,
        })
        .unwrap_or_default()
    }

    fn format_machine(&self, diagnostics: &[BuildDiagnostic], _summary: &BuildSummary) -> String {
        let mut output = String::new();
        for diag in diagnostics {
            let line = diag.line.map(|l| format!(":{}", l)).unwrap_or_default();
            output.push_str(&format!("ERROR {}{} {}\n", diag.filename, line, diag.message));
        }
        output
    }
}
