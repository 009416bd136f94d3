//! Command implementations

pub mod integrations;
pub mod profile;

use crate::cli::OutputFormat;
use crate::output;

/// Structured rendering for `-o json|yaml|table`; `None` means human output
pub(crate) fn structured_format(format: OutputFormat) -> Option<output::OutputFormat> {
    match format {
        OutputFormat::Auto => None,
        OutputFormat::Json => Some(output::OutputFormat::Json),
        OutputFormat::Yaml => Some(output::OutputFormat::Yaml),
        OutputFormat::Table => Some(output::OutputFormat::Table),
    }
}
