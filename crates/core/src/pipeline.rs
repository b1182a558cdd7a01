//! Top-level entry point: one snapshot in, one clipboard payload out.

use std::sync::Arc;
use std::time::Instant;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::classify::{AuthorType, ClassificationResult, Geometry, classify};
use crate::clean::{clean, remove_thinking};
use crate::config::{ExportOptions, Rules};
use crate::dispatch::{Dispatcher, Fidelity, Registry};
use crate::document::Document;
use crate::dom::{container, inner_markup, parse_fragment};
use crate::error::{ExportError, Result};
use crate::filename::download_filename_now;
use crate::render::OutputFormat;
use crate::render::docx::to_docx;
use crate::render::html::render;
use crate::render::optimize::optimize;
use crate::render::text::document_to_text;

/// Message shown when the container is missing or not an AI answer.
pub const NOTHING_TO_COPY: &str = "Nothing to copy";
/// Message shown when no output could be produced at all.
pub const COPY_FAILED: &str = "Copy failed";

/// One export invocation as supplied by the host.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
	/// Markup of the response container; `None` when the host had no node.
	pub html: Option<String>,
	pub site: String,
	#[serde(default)]
	pub format: OutputFormat,
	#[serde(default)]
	pub geometry: Option<Geometry>,
	/// Host's own "should this node be processed" decision, when it made one.
	#[serde(default)]
	pub should_process: Option<bool>,
}

impl ExportRequest {
	pub fn new(html: impl Into<String>, site: impl Into<String>, format: OutputFormat) -> Self {
		Self {
			html: Some(html.into()),
			site: site.into(),
			format,
			geometry: None,
			should_process: None,
		}
	}
}

/// A single MIME-typed buffer ready for the clipboard or a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardPayload {
	pub mime: &'static str,
	pub bytes: Vec<u8>,
}

impl ClipboardPayload {
	/// The payload as text, for the markup and plain-text forms.
	pub fn as_text(&self) -> Option<&str> {
		std::str::from_utf8(&self.bytes).ok()
	}
}

/// Successful export.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
	pub payload: ClipboardPayload,
	pub format: OutputFormat,
	pub walker: &'static str,
	pub fidelity: Fidelity,
	/// Suggested download filename, set for document output.
	pub filename: Option<String>,
}

/// Caller-visible result of [`Exporter::export`].
#[derive(Debug, Clone)]
pub enum ExportOutcome {
	Exported(ExportArtifact),
	/// Missing or empty container, or content the gate judged not worth exporting.
	NothingToCopy { reason: String },
	/// Every fallback came up empty.
	CopyFailed { reason: String },
}

impl ExportOutcome {
	/// User-facing notification text for non-successful outcomes.
	pub fn message(&self) -> Option<&'static str> {
		match self {
			ExportOutcome::Exported(_) => None,
			ExportOutcome::NothingToCopy { .. } => Some(NOTHING_TO_COPY),
			ExportOutcome::CopyFailed { .. } => Some(COPY_FAILED),
		}
	}

	pub fn artifact(&self) -> Option<&ExportArtifact> {
		match self {
			ExportOutcome::Exported(artifact) => Some(artifact),
			_ => None,
		}
	}
}

/// The export context: rules, options and the walker registry.
///
/// Construct once and share; every [`export`](Self::export) call works on its
/// own parse of the request markup.
#[derive(Debug, Clone)]
pub struct Exporter {
	rules: Arc<Rules>,
	options: ExportOptions,
	dispatcher: Dispatcher,
}

impl Default for Exporter {
	fn default() -> Self {
		Self::new(ExportOptions::default())
	}
}

impl Exporter {
	/// Exporter over the bundled rule tables.
	pub fn new(options: ExportOptions) -> Self {
		Self::with_rules(Rules::builtin().clone(), options)
	}

	pub fn with_rules(rules: Rules, options: ExportOptions) -> Self {
		let rules = Arc::new(rules);
		let registry = Arc::new(Registry::new(options.register_builtins));
		let dispatcher = Dispatcher::new(registry, Arc::clone(&rules), options.clone());
		Self { rules, options, dispatcher }
	}

	pub fn rules(&self) -> &Rules {
		&self.rules
	}

	pub fn options(&self) -> &ExportOptions {
		&self.options
	}

	pub fn registry(&self) -> &Arc<Registry> {
		self.dispatcher.registry()
	}

	pub fn dispatcher(&self) -> &Dispatcher {
		&self.dispatcher
	}

	/// Classifies a container snippet.
	pub fn classify(&self, html: &str, geometry: Option<&Geometry>) -> Result<ClassificationResult> {
		if html.trim().is_empty() {
			return Err(ExportError::MalformedInput("empty container markup".into()));
		}
		let doc = parse_fragment(html);
		Ok(classify(container(&doc), geometry, &self.rules))
	}

	/// Runs the whole pipeline for one request.
	///
	/// Only [`ExportError::FormatterNotFound`] is returned as an error; every
	/// other failure is folded into the outcome.
	pub async fn export(&self, request: &ExportRequest) -> Result<ExportOutcome> {
		let started = Instant::now();
		let site = request.site.trim();

		let Some(html) = request.html.as_deref().filter(|h| !h.trim().is_empty()) else {
			let err = ExportError::MalformedInput("no container markup".into());
			warn!(target = "chx.pipeline", site, error = %err, "nothing to export");
			return Ok(ExportOutcome::NothingToCopy { reason: err.to_string() });
		};

		let markup = match self.prepare(html, site, request) {
			Prepared::Markup(markup) => markup,
			Prepared::Skip(reason) => {
				info!(target = "chx.pipeline", site, reason = %reason, "container skipped");
				return Ok(ExportOutcome::NothingToCopy { reason });
			}
		};

		let dispatched = match self.dispatcher.dispatch(site, markup).await {
			Ok(dispatched) => dispatched,
			Err(err @ ExportError::FormatterNotFound { .. }) => return Err(err),
			Err(err) => {
				warn!(target = "chx.pipeline", site, error = %err, "export failed");
				return Ok(ExportOutcome::CopyFailed { reason: err.to_string() });
			}
		};

		let payload = match render_payload(&dispatched.document, request.format) {
			Ok(payload) => payload,
			Err(err) => {
				warn!(target = "chx.render", site, format = %request.format, error = %err, "render failed");
				return Ok(ExportOutcome::CopyFailed { reason: err.to_string() });
			}
		};

		let filename = (request.format == OutputFormat::Docx).then(|| download_filename_now(site));
		info!(
			target = "chx.pipeline",
			site,
			walker = dispatched.walker,
			fidelity = ?dispatched.fidelity,
			format = %request.format,
			bytes = payload.bytes.len(),
			elapsed_ms = started.elapsed().as_millis() as u64,
			"export complete"
		);

		Ok(ExportOutcome::Exported(ExportArtifact {
			payload,
			format: request.format,
			walker: dispatched.walker,
			fidelity: dispatched.fidelity,
			filename,
		}))
	}

	/// Parses, gates and cleans the snapshot, returning the cleaned markup.
	///
	/// Synchronous so the non-`Send` tree never lives across an await.
	fn prepare(&self, html: &str, site: &str, request: &ExportRequest) -> Prepared {
		let mut doc = parse_fragment(html);

		match request.should_process {
			Some(false) => return Prepared::Skip("host declined the container".into()),
			Some(true) => {}
			None => {
				let result = classify(container(&doc), request.geometry.as_ref(), &self.rules);
				debug!(target = "chx.pipeline", site, kind = ?result.kind, confidence = result.confidence, "classified container");
				let skip = match result.kind {
					AuthorType::Human => true,
					AuthorType::Unknown => !self.options.classify_unknown_as_ai,
					AuthorType::Ai => false,
				};
				if skip {
					return Prepared::Skip(format!("container classified as {:?}", result.kind));
				}
			}
		}

		let mut report = clean(&mut doc, site, true, &self.rules);
		report.thinking = remove_thinking(&mut doc, &self.rules);
		debug!(target = "chx.pipeline", site, removed = report.total(), "cleaned snapshot");

		Prepared::Markup(Arc::from(inner_markup(&doc)))
	}
}

enum Prepared {
	Markup(Arc<str>),
	Skip(String),
}

/// Serializes a document into the requested payload.
pub fn render_payload(document: &Document, format: OutputFormat) -> Result<ClipboardPayload> {
	let bytes = match format {
		OutputFormat::Html => optimize(&render(document)).into_bytes(),
		OutputFormat::Text => document_to_text(document).into_bytes(),
		OutputFormat::Docx => to_docx(document)?,
	};
	Ok(ClipboardPayload { mime: format.mime(), bytes })
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::document::Block;

	#[tokio::test]
	async fn missing_markup_is_nothing_to_copy() {
		let exporter = Exporter::default();
		let request = ExportRequest {
			site: "deepseek".into(),
			..ExportRequest::default()
		};
		let outcome = exporter.export(&request).await.expect("export");
		assert!(matches!(outcome, ExportOutcome::NothingToCopy { .. }));
		assert_eq!(outcome.message(), Some(NOTHING_TO_COPY));
	}

	#[tokio::test]
	async fn host_decision_overrides_classifier() {
		let exporter = Exporter::default();
		let mut request = ExportRequest::new(r#"<div data-role="user">帮我写一首诗</div>"#, "kimi", OutputFormat::Text);
		let outcome = exporter.export(&request).await.expect("export");
		assert!(matches!(outcome, ExportOutcome::NothingToCopy { .. }));

		request.should_process = Some(true);
		let outcome = exporter.export(&request).await.expect("export");
		let artifact = outcome.artifact().expect("exported");
		assert_eq!(artifact.payload.as_text(), Some("帮我写一首诗"));
	}

	#[tokio::test]
	async fn missing_registrations_escape_as_error() {
		let exporter = Exporter::new(ExportOptions {
			register_builtins: false,
			..ExportOptions::default()
		});
		let request = ExportRequest {
			should_process: Some(true),
			..ExportRequest::new("<div>x</div>", "deepseek", OutputFormat::Html)
		};
		let err = exporter.export(&request).await.expect_err("no walkers");
		assert!(matches!(err, ExportError::FormatterNotFound { .. }));
	}

	#[test]
	fn payload_mime_follows_format() {
		let doc = Document::new(vec![Block::paragraph("x")]);
		assert_eq!(render_payload(&doc, OutputFormat::Text).expect("text").mime, "text/plain");
		assert_eq!(render_payload(&doc, OutputFormat::Html).expect("html").mime, "text/html");
		let docx = render_payload(&doc, OutputFormat::Docx).expect("docx");
		assert!(docx.bytes.starts_with(b"PK"));
	}

	#[test]
	fn classify_rejects_blank_markup() {
		assert!(matches!(Exporter::default().classify("  ", None), Err(ExportError::MalformedInput(_))));
	}
}
