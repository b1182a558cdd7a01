//! Serializers consuming the canonical [`Document`](crate::document::Document).

pub mod docx;
mod entities;
pub mod html;
pub mod optimize;
pub mod text;

use serde::{Deserialize, Serialize};

/// Output form requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
	/// Optimized standalone markup for the clipboard.
	#[default]
	Html,
	/// Plain text.
	Text,
	/// Word-processing document archive.
	Docx,
}

impl OutputFormat {
	pub fn mime(self) -> &'static str {
		match self {
			OutputFormat::Html => "text/html",
			OutputFormat::Text => "text/plain",
			OutputFormat::Docx => docx::DOCX_MIME,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			OutputFormat::Html => "html",
			OutputFormat::Text => "text",
			OutputFormat::Docx => "docx",
		}
	}
}

impl std::fmt::Display for OutputFormat {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}
