//! Structured output rendering

use anyhow::Result;
use comfy_table::Table;
use nrlambda_core::report::{StepOutcome, WorkflowReport};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Table,
}

pub fn print_output<T: Serialize>(data: T, format: OutputFormat) -> Result<()> {
    let json_value = serde_json::to_value(data)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json_value)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(&json_value)?);
        }
        OutputFormat::Table => {
            print_as_table(&json_value)?;
        }
    }

    Ok(())
}

/// Render a workflow report in the requested structured format.
///
/// Tables list one row per step followed by the summary line.
pub fn print_report(report: &WorkflowReport, format: OutputFormat) -> Result<()> {
    if format != OutputFormat::Table {
        return print_output(report, format);
    }

    println!("{}", report_table(report));
    println!("{}", report.summary());
    if let Some(prompt) = &report.aborted {
        println!("Declined: {}", prompt);
    }
    Ok(())
}

fn report_table(report: &WorkflowReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Step", "Status", "Detail"]);
    for record in &report.steps {
        let (status, detail) = match &record.outcome {
            StepOutcome::Succeeded => ("succeeded", String::new()),
            StepOutcome::Failed(reason) => ("failed", reason.clone()),
            StepOutcome::Skipped(reason) => ("skipped", reason.clone()),
        };
        table.add_row(vec![
            record.step.description().to_string(),
            status.to_string(),
            detail,
        ]);
    }
    table
}

fn print_as_table(value: &Value) -> Result<()> {
    match value {
        Value::Array(arr) if !arr.is_empty() => {
            let mut table = Table::new();

            // Headers come from the first object
            if let Value::Object(first) = &arr[0] {
                let headers: Vec<String> = first.keys().cloned().collect();
                table.set_header(&headers);

                for item in arr {
                    if let Value::Object(obj) = item {
                        let row: Vec<String> = headers
                            .iter()
                            .map(|h| format_value(obj.get(h).unwrap_or(&Value::Null)))
                            .collect();
                        table.add_row(row);
                    }
                }
            } else {
                table.set_header(vec!["Value"]);
                for item in arr {
                    table.add_row(vec![format_value(item)]);
                }
            }

            println!("{}", table);
        }
        Value::Object(obj) => {
            let mut table = Table::new();
            table.set_header(vec!["Key", "Value"]);

            for (key, val) in obj {
                table.add_row(vec![key.clone(), format_value(val)]);
            }

            println!("{}", table);
        }
        _ => {
            println!("{}", format_value(value));
        }
    }

    Ok(())
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}
