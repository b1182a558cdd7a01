//! Command implementations and dispatch.

mod classify;
mod export;
mod sites;

use std::io::Read;
use std::path::Path;

use anyhow::{Context as _, Result};
use chat_export::{ExportOptions, Exporter, Rules};
use tracing::debug;

use crate::cli::{Cli, Commands};
use crate::output::{ErrorCode, OutputFormat, ResultBuilder, print_result};

/// State shared by every command of one invocation.
pub struct CommandContext {
	pub exporter: Exporter,
	pub format: OutputFormat,
}

impl CommandContext {
	/// Builds the exporter from the optional `--rules` and `--config` files.
	pub fn new(rules: Option<&Path>, config: Option<&Path>, format: OutputFormat) -> Result<Self> {
		let rules = match rules {
			Some(path) => {
				let json = std::fs::read_to_string(path).with_context(|| format!("failed to read rules file {}", path.display()))?;
				Rules::from_json(&json).with_context(|| format!("invalid rules file {}", path.display()))?
			}
			None => Rules::builtin().clone(),
		};
		let options = match config {
			Some(path) => {
				let json = std::fs::read_to_string(path).with_context(|| format!("failed to read config file {}", path.display()))?;
				ExportOptions::from_json(&json).with_context(|| format!("invalid config file {}", path.display()))?
			}
			None => ExportOptions::default(),
		};
		debug!(target = "chx", ?options, "export options loaded");
		Ok(Self {
			exporter: Exporter::with_rules(rules, options),
			format,
		})
	}
}

pub async fn dispatch(cli: Cli) -> Result<()> {
	let ctx = CommandContext::new(cli.rules.as_deref(), cli.config.as_deref(), cli.format)?;
	match cli.command {
		Commands::Export(args) => export::run(&ctx, args).await,
		Commands::Classify(args) => classify::run(&ctx, args),
		Commands::Sites => sites::run(&ctx),
	}
}

/// Reads the snippet from `path`, or stdin when absent.
pub(crate) fn read_input(path: Option<&Path>) -> Result<String> {
	match path {
		Some(path) => std::fs::read_to_string(path).with_context(|| format!("failed to read input {}", path.display())),
		None => {
			let mut buf = String::new();
			std::io::stdin().read_to_string(&mut buf).context("failed to read stdin")?;
			Ok(buf)
		}
	}
}

/// Reports a file or stream failure in the result envelope and hands the error back.
pub(crate) fn io_failure(ctx: &CommandContext, command: &str, err: anyhow::Error) -> anyhow::Error {
	print_result(&ResultBuilder::<()>::new(command).error(ErrorCode::IoError, format!("{err:#}")).build(), ctx.format);
	err
}
