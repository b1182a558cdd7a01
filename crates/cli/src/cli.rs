use std::path::PathBuf;

use chat_export::OutputFormat as PayloadKind;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "chx")]
#[command(about = "Export AI chat responses as clean markup, plain text or Word documents")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Result format printed to stdout
	#[arg(short = 'f', long = "format", global = true, value_enum, default_value = "text")]
	pub format: OutputFormat,

	/// Replace the bundled rule tables with a JSON file
	#[arg(long, global = true, value_name = "FILE")]
	pub rules: Option<PathBuf>,

	/// Load export options (timeouts, follow-up stripping) from a JSON file
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Convert a response-container snippet into a payload
	Export(ExportArgs),

	/// Report whether a snippet looks human- or AI-authored
	Classify(ClassifyArgs),

	/// List known sites and their walkers
	Sites,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
	/// Site identifier (deepseek, doubao, kimi, yuanbao, chatgpt, ...)
	#[arg(short, long)]
	pub site: String,

	/// Snippet file; reads stdin when omitted
	#[arg(short, long, value_name = "FILE")]
	pub input: Option<PathBuf>,

	/// Payload to produce
	#[arg(short = 'o', long = "output", value_enum, default_value = "html")]
	pub output: PayloadFormat,

	/// Write the payload to this path
	#[arg(long, value_name = "PATH", conflicts_with = "out_dir")]
	pub out: Option<PathBuf>,

	/// Write the payload into this directory under the download filename
	#[arg(long, value_name = "DIR")]
	pub out_dir: Option<PathBuf>,

	/// Produce a Word document named by the download convention
	#[arg(long)]
	pub download: bool,

	/// Skip the authorship check and treat the snippet as an AI answer
	#[arg(long)]
	pub assume_ai: bool,
}

impl ExportArgs {
	pub fn payload_kind(&self) -> PayloadKind {
		if self.download { PayloadKind::Docx } else { self.output.into() }
	}
}

#[derive(Args, Debug)]
pub struct ClassifyArgs {
	/// Snippet file; reads stdin when omitted
	#[arg(short, long, value_name = "FILE")]
	pub input: Option<PathBuf>,

	/// Container left offset in CSS pixels
	#[arg(long, requires_all = ["width", "viewport_width"])]
	pub left: Option<f32>,

	/// Container width in CSS pixels
	#[arg(long, requires_all = ["left", "viewport_width"])]
	pub width: Option<f32>,

	/// Viewport width in CSS pixels
	#[arg(long, requires_all = ["left", "width"])]
	pub viewport_width: Option<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PayloadFormat {
	/// Optimized standalone clipboard markup
	Html,
	/// Plain text
	Text,
	/// Word document (.docx)
	Docx,
}

impl From<PayloadFormat> for PayloadKind {
	fn from(format: PayloadFormat) -> Self {
		match format {
			PayloadFormat::Html => PayloadKind::Html,
			PayloadFormat::Text => PayloadKind::Text,
			PayloadFormat::Docx => PayloadKind::Docx,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn export_arguments_parse() {
		let cli = Cli::try_parse_from(["chx", "-f", "json", "export", "--site", "kimi", "-o", "text", "-i", "answer.html"]).expect("args should parse");
		assert_eq!(cli.format, OutputFormat::Json);
		let Commands::Export(args) = cli.command else {
			panic!("expected export");
		};
		assert_eq!(args.site, "kimi");
		assert_eq!(args.payload_kind(), PayloadKind::Text);
	}

	#[test]
	fn download_forces_docx() {
		let cli = Cli::try_parse_from(["chx", "export", "-s", "deepseek", "--download"]).expect("args should parse");
		let Commands::Export(args) = cli.command else {
			panic!("expected export");
		};
		assert_eq!(args.payload_kind(), PayloadKind::Docx);
	}

	#[test]
	fn out_and_out_dir_conflict() {
		assert!(Cli::try_parse_from(["chx", "export", "-s", "kimi", "--out", "a.html", "--out-dir", "dir"]).is_err());
	}

	#[test]
	fn geometry_requires_all_parts() {
		assert!(Cli::try_parse_from(["chx", "classify", "--left", "10"]).is_err());
		assert!(Cli::try_parse_from(["chx", "classify", "--left", "10", "--width", "300", "--viewport-width", "1200"]).is_ok());
	}
}
