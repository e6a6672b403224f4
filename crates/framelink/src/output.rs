use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One wire record as produced by `encode`.
pub fn print_record(record: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{record}"),
        OutputFormat::Pretty => println!(
            "{}",
            serde_json::to_string_pretty(record).unwrap_or_else(|_| record.to_string())
        ),
        OutputFormat::Table => {
            let mut table = new_table(vec!["FIELD", "VALUE"]);
            if let Value::Object(fields) = record {
                for (name, value) in fields {
                    table.add_row(vec![name.clone(), value.to_string()]);
                }
            }
            println!("{table}");
        }
    }
}

/// Outcome for one input line of `replay` or `decode`.
#[derive(Debug, Clone, Serialize)]
pub struct LineReport {
    pub line: usize,
    #[serde(rename = "type")]
    pub message_type: String,
    pub body: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Prints reports as they arrive; the table format collects them and prints
/// once in [`ReportSink::finish`].
pub struct ReportSink {
    format: OutputFormat,
    pending: Vec<LineReport>,
    errors: usize,
}

impl ReportSink {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            pending: Vec::new(),
            errors: 0,
        }
    }

    pub fn push(&mut self, report: LineReport) {
        if report.error.is_some() {
            self.errors += 1;
        }
        match self.format {
            OutputFormat::Json => println!(
                "{}",
                serde_json::to_string(&report).unwrap_or_else(|_| "{}".to_string())
            ),
            OutputFormat::Pretty => match &report.error {
                Some(error) => println!(
                    "line={} type={} body={} error={error}",
                    report.line, report.message_type, report.body
                ),
                None => println!(
                    "line={} type={} body={}",
                    report.line, report.message_type, report.body
                ),
            },
            OutputFormat::Table => self.pending.push(report),
        }
    }

    /// Flush buffered output; returns how many reports carried an error.
    pub fn finish(self) -> usize {
        if matches!(self.format, OutputFormat::Table) && !self.pending.is_empty() {
            let mut table = new_table(vec!["LINE", "TYPE", "BODY", "ERROR"]);
            for report in &self.pending {
                table.add_row(vec![
                    report.line.to_string(),
                    report.message_type.clone(),
                    report.body.to_string(),
                    report.error.clone().unwrap_or_default(),
                ]);
            }
            println!("{table}");
        }
        self.errors
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}
