use anyhow::{Result, bail};
use chat_export::Geometry;

use super::{CommandContext, io_failure, read_input};
use crate::cli::ClassifyArgs;
use crate::output::{ErrorCode, OutputFormat, ResultBuilder, print_result};

pub(super) fn run(ctx: &CommandContext, args: ClassifyArgs) -> Result<()> {
	let html = read_input(args.input.as_deref()).map_err(|err| io_failure(ctx, "classify", err))?;
	let geometry = match (args.left, args.width, args.viewport_width) {
		(Some(left), Some(width), Some(viewport_width)) => Some(Geometry { left, width, viewport_width }),
		_ => None,
	};

	let result = match ctx.exporter.classify(&html, geometry.as_ref()) {
		Ok(result) => result,
		Err(err) => {
			print_result(&ResultBuilder::<()>::new("classify").error(ErrorCode::InvalidInput, err.to_string()).build(), ctx.format);
			bail!(err);
		}
	};

	match ctx.format {
		OutputFormat::Json => print_result(&ResultBuilder::new("classify").data(&result).build(), ctx.format),
		OutputFormat::Text => {
			let kind = serde_json::to_value(result.kind)?;
			println!("{} ({:.2})", kind.as_str().unwrap_or("Unknown"), result.confidence);
			for indicator in &result.indicators {
				println!("  {indicator}");
			}
		}
	}
	Ok(())
}
