use anyhow::Result;
use chat_export::walkers::sites::SITES;
use serde::Serialize;

use super::CommandContext;
use crate::output::{OutputFormat, ResultBuilder, print_result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SiteEntry {
	key: &'static str,
	short_name: &'static str,
	/// Whether a site walker is registered, as opposed to the generic one.
	site_walker: bool,
}

pub(super) fn run(ctx: &CommandContext) -> Result<()> {
	let registry = ctx.exporter.registry();
	registry.init();
	let entries: Vec<SiteEntry> = SITES
		.iter()
		.map(|site| SiteEntry {
			key: site.key,
			short_name: site.short_name,
			site_walker: registry.walker_for(site.key).is_some(),
		})
		.collect();

	match ctx.format {
		OutputFormat::Json => print_result(&ResultBuilder::new("sites").data(entries).build(), ctx.format),
		OutputFormat::Text => {
			for entry in &entries {
				let walker = if entry.site_walker { entry.key } else { "generic" };
				println!("{:<10} {:<10} {walker}", entry.key, entry.short_name);
			}
		}
	}
	Ok(())
}
