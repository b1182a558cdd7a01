use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, anyhow};
use chat_export::filename::download_filename_now;
use chat_export::pipeline::{COPY_FAILED, NOTHING_TO_COPY};
use chat_export::{ExportArtifact, ExportError, ExportOutcome, ExportRequest, Fidelity, OutputFormat as PayloadKind};
use serde::Serialize;
use tracing::info;

use super::{CommandContext, io_failure, read_input};
use crate::cli::ExportArgs;
use crate::output::{ErrorCode, OutputFormat, ResultBuilder, print_result};

const COMMAND: &str = "export";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportData {
	site: String,
	walker: &'static str,
	fidelity: Fidelity,
	format: PayloadKind,
	mime: &'static str,
	bytes: usize,
	#[serde(skip_serializing_if = "Option::is_none")]
	filename: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	path: Option<PathBuf>,
	/// Payload text when it was not written to a file.
	#[serde(skip_serializing_if = "Option::is_none")]
	content: Option<String>,
}

pub(super) async fn run(ctx: &CommandContext, args: ExportArgs) -> Result<()> {
	let html = read_input(args.input.as_deref()).map_err(|err| io_failure(ctx, COMMAND, err))?;
	let format = args.payload_kind();
	let request = ExportRequest {
		should_process: args.assume_ai.then_some(true),
		..ExportRequest::new(html, args.site.clone(), format)
	};

	let outcome = match ctx.exporter.export(&request).await {
		Ok(outcome) => outcome,
		Err(err @ ExportError::FormatterNotFound { .. }) => {
			print_result(&ResultBuilder::<()>::new(COMMAND).error(ErrorCode::FormatterNotFound, err.to_string()).build(), ctx.format);
			return Err(err.into());
		}
		Err(err) => {
			print_result(&ResultBuilder::<()>::new(COMMAND).error(ErrorCode::InternalError, err.to_string()).build(), ctx.format);
			return Err(err.into());
		}
	};

	let artifact = match outcome {
		ExportOutcome::Exported(artifact) => artifact,
		ExportOutcome::NothingToCopy { reason } => return fail(ctx, ErrorCode::NothingToCopy, &outcome_message(&reason, NOTHING_TO_COPY), reason),
		ExportOutcome::CopyFailed { reason } => return fail(ctx, ErrorCode::CopyFailed, &outcome_message(&reason, COPY_FAILED), reason),
	};

	let target = output_path(&args, &artifact);
	let path = match &target {
		Some(path) => {
			write_payload(path, &artifact.payload.bytes).map_err(|err| io_failure(ctx, COMMAND, err))?;
			info!(target = "chx", path = %path.display(), bytes = artifact.payload.bytes.len(), "payload written");
			Some(path.clone())
		}
		None => None,
	};

	match ctx.format {
		OutputFormat::Json => {
			let data = ExportData {
				site: args.site,
				walker: artifact.walker,
				fidelity: artifact.fidelity,
				format: artifact.format,
				mime: artifact.payload.mime,
				bytes: artifact.payload.bytes.len(),
				filename: artifact.filename.clone(),
				content: path.is_none().then(|| String::from_utf8_lossy(&artifact.payload.bytes).into_owned()),
				path,
			};
			print_result(&ResultBuilder::new(COMMAND).data(data).build(), ctx.format);
		}
		OutputFormat::Text => match path {
			Some(path) => println!("{}", path.display()),
			None => {
				let mut stdout = std::io::stdout().lock();
				stdout.write_all(&artifact.payload.bytes)?;
				if !artifact.payload.bytes.ends_with(b"\n") {
					stdout.write_all(b"\n")?;
				}
			}
		},
	}
	Ok(())
}

fn outcome_message(reason: &str, message: &str) -> String {
	if reason.is_empty() { message.to_string() } else { format!("{message}: {reason}") }
}

fn fail(ctx: &CommandContext, code: ErrorCode, message: &str, reason: String) -> Result<()> {
	print_result(&ResultBuilder::<()>::new(COMMAND).error_with_details(code, message, reason).build(), ctx.format);
	Err(anyhow!("{message}"))
}

/// Where the payload goes: `--out`, else `--out-dir`, else the current
/// directory for documents. Markup and text default to stdout.
fn output_path(args: &ExportArgs, artifact: &ExportArtifact) -> Option<PathBuf> {
	if let Some(out) = &args.out {
		return Some(out.clone());
	}
	let binary = artifact.format == PayloadKind::Docx;
	let dir = match (&args.out_dir, binary) {
		(Some(dir), _) => dir.clone(),
		(None, true) => PathBuf::from("."),
		(None, false) => return None,
	};
	let name = artifact.filename.clone().unwrap_or_else(|| text_filename(&args.site, artifact.format));
	Some(dir.join(name))
}

/// Download-style name with the payload's own extension.
fn text_filename(site: &str, format: PayloadKind) -> String {
	let docx = download_filename_now(site);
	let stem = docx.strip_suffix(".docx").unwrap_or(&docx);
	let ext = match format {
		PayloadKind::Html => "html",
		PayloadKind::Text => "txt",
		PayloadKind::Docx => "docx",
	};
	format!("{stem}.{ext}")
}

fn write_payload(path: &Path, bytes: &[u8]) -> Result<()> {
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		std::fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
	}
	std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn text_filenames_follow_download_convention() {
		let name = text_filename("yuanbao", PayloadKind::Text);
		assert!(name.ends_with("_Yuanbao.txt"), "{name}");
		assert_eq!(name.len(), "yyyyMMdd_HHmmss_Yuanbao.txt".len());
	}

	#[test]
	fn outcome_message_appends_reason() {
		assert_eq!(outcome_message("", "Copy failed"), "Copy failed");
		assert_eq!(outcome_message("empty", "Copy failed"), "Copy failed: empty");
	}
}
