//! Error taxonomy for the export pipeline.

use std::time::Duration;

use thiserror::Error;

/// Errors raised inside the export pipeline.
///
/// Only [`ExportError::FormatterNotFound`] is allowed to escape
/// [`Exporter::export`](crate::Exporter::export). Every other variant is
/// recovered by the dispatcher's fallback cascade.
#[derive(Debug, Error)]
pub enum ExportError {
	#[error("no formatter registered for site '{site}' and no generic fallback available")]
	FormatterNotFound { site: String },

	#[error("walker '{walker}' exceeded its {timeout:?} budget")]
	FormattingTimeout { walker: &'static str, timeout: Duration },

	#[error("walker '{walker}' produced an empty result")]
	EmptyResult { walker: &'static str },

	#[error("malformed input: {0}")]
	MalformedInput(String),

	#[error("invalid rule configuration: {0}")]
	RuleConfig(#[from] serde_json::Error),

	#[error("invalid rule pattern '{pattern}': {source}")]
	RulePattern {
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("walker task failed: {0}")]
	WalkerTask(String),

	#[error("failed to write document archive: {0}")]
	Zip(#[from] zip::result::ZipError),

	#[error(transparent)]
	Io(#[from] std::io::Error),
}

impl ExportError {
	/// Whether the dispatcher may recover from this error by falling back.
	pub fn is_recoverable(&self) -> bool {
		!matches!(self, Self::FormatterNotFound { .. })
	}
}

pub type Result<T> = std::result::Result<T, ExportError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn only_missing_formatter_is_fatal() {
		assert!(!ExportError::FormatterNotFound { site: "x".into() }.is_recoverable());
		assert!(ExportError::EmptyResult { walker: "generic" }.is_recoverable());
		assert!(
			ExportError::FormattingTimeout {
				walker: "deepseek",
				timeout: Duration::from_secs(5)
			}
			.is_recoverable()
		);
		assert!(ExportError::MalformedInput("empty".into()).is_recoverable());
	}
}
