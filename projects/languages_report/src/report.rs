use std::io::Write;

use interfaces_github_languages::index::Languages;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// One line of output: a repository and its language breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRecord {
	pub name: String,
	pub languages: Languages,
}

#[derive(Debug, Error)]
pub enum EmitError {
	#[error("SerializeRecord: {source}")]
	SerializeRecord {
		source: serde_json::Error,
	},

	#[error("WriteRecord: {source}")]
	WriteRecord {
		source: std::io::Error,
	},
}

/// Destination for report records. Called once per completed fetch, possibly
/// from several in-flight fetches in any order.
pub trait ReportSink: Send + Sync {
	fn emit(&self, record: ReportRecord) -> Result<(), EmitError>;
}

/// Writes each record as a single JSON line to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl ReportSink for StdoutSink {
	fn emit(&self, record: ReportRecord) -> Result<(), EmitError> {
		let line = serde_json::to_string(&record)
			.map_err(|source| EmitError::SerializeRecord { source })?;

		let mut stdout = std::io::stdout().lock();
		writeln!(stdout, "{line}").map_err(|source| EmitError::WriteRecord { source })?;

		debug!(name = %record.name, languages = record.languages.len(), "Report emitted");
		Ok(())
	}
}
