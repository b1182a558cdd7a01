//! Site catalogue and the per-site walker profiles.

mod chatgpt;
mod deepseek;
mod doubao;
mod kimi;
mod yuanbao;

use scraper::ElementRef;

use crate::dom::class_contains;

/// Short name used in filenames for sites outside the catalogue.
pub const UNKNOWN_SHORT_NAME: &str = "AI";

/// Markup vocabulary of one site, driving the shared walker engine.
///
/// Every class list is matched as lower-case substrings of the `class`
/// attribute.
#[derive(Debug)]
pub struct SiteProfile {
	pub key: &'static str,
	/// Class fragments unique to this site's answer markup.
	pub fingerprints: &'static [&'static str],
	/// Fingerprints of other sites; any match rejects the probe.
	pub rejected: &'static [&'static str],
	/// Containers that hold exactly one paragraph.
	pub paragraph_classes: &'static [&'static str],
	/// Whether bare `<p>` elements count as paragraphs.
	pub p_is_paragraph: bool,
	pub code_classes: &'static [&'static str],
	pub table_wrappers: &'static [&'static str],
	/// Toolbars, banners and buttons pruned before recursion.
	pub control_classes: &'static [&'static str],
}

impl SiteProfile {
	/// Looks for this site's fingerprint on the node or below it, rejecting
	/// markup that also carries another site's fingerprint.
	pub fn probe(&self, node: ElementRef<'_>) -> bool {
		let mut elements = std::iter::once(node).chain(node.descendants().skip(1).filter_map(ElementRef::wrap));
		let mut found = false;
		for el in elements.by_ref() {
			if class_contains(el, self.rejected) {
				return false;
			}
			found |= class_contains(el, self.fingerprints);
		}
		found
	}

	pub fn is_paragraph(&self, el: ElementRef<'_>) -> bool {
		(self.p_is_paragraph && el.value().name() == "p") || class_contains(el, self.paragraph_classes)
	}

	pub fn is_code_block(&self, el: ElementRef<'_>) -> bool {
		class_contains(el, self.code_classes)
	}

	pub fn is_table_wrapper(&self, el: ElementRef<'_>) -> bool {
		el.value().name() != "table" && class_contains(el, self.table_wrappers)
	}
}

/// One known site.
#[derive(Debug)]
pub struct SiteInfo {
	pub key: &'static str,
	/// Fixed abbreviation used in download filenames.
	pub short_name: &'static str,
	/// Built-in walker profile; `None` for sites served by the generic walker.
	pub profile: Option<&'static SiteProfile>,
}

pub static SITES: &[SiteInfo] = &[
	SiteInfo {
		key: "deepseek",
		short_name: "DeepSeek",
		profile: Some(&deepseek::PROFILE),
	},
	SiteInfo {
		key: "doubao",
		short_name: "Doubao",
		profile: Some(&doubao::PROFILE),
	},
	SiteInfo {
		key: "kimi",
		short_name: "Kimi",
		profile: Some(&kimi::PROFILE),
	},
	SiteInfo {
		key: "yuanbao",
		short_name: "Yuanbao",
		profile: Some(&yuanbao::PROFILE),
	},
	SiteInfo {
		key: "chatgpt",
		short_name: "ChatGPT",
		profile: Some(&chatgpt::PROFILE),
	},
	SiteInfo {
		key: "tongyi",
		short_name: "Tongyi",
		profile: None,
	},
	SiteInfo {
		key: "gemini",
		short_name: "Gemini",
		profile: None,
	},
];

/// Catalogue entry for a site key, matched case-insensitively.
pub fn site_info(site: &str) -> Option<&'static SiteInfo> {
	let site = site.trim();
	SITES.iter().find(|info| info.key.eq_ignore_ascii_case(site))
}

pub fn site_profile(site: &str) -> Option<&'static SiteProfile> {
	site_info(site).and_then(|info| info.profile)
}

pub fn short_name(site: &str) -> &'static str {
	site_info(site).map_or(UNKNOWN_SHORT_NAME, |info| info.short_name)
}

/// Profiles of every built-in site walker.
pub fn builtin_profiles() -> impl Iterator<Item = &'static SiteProfile> {
	SITES.iter().filter_map(|info| info.profile)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dom::{container, parse_fragment};

	#[test]
	fn short_names_cover_catalogue_and_unknown() {
		assert_eq!(short_name("deepseek"), "DeepSeek");
		assert_eq!(short_name("ChatGPT"), "ChatGPT");
		assert_eq!(short_name("gemini"), "Gemini");
		assert_eq!(short_name("claude"), UNKNOWN_SHORT_NAME);
	}

	#[test]
	fn generic_sites_have_no_profile() {
		assert!(site_profile("tongyi").is_none());
		assert!(site_profile("gemini").is_none());
		assert_eq!(builtin_profiles().count(), 5);
	}

	#[test]
	fn probes_accept_own_markup_only() {
		let samples = [
			("deepseek", r#"<div class="ds-markdown ds-markdown--block"><p>x</p></div>"#),
			("doubao", r#"<div class="flow-markdown-body"><div class="paragraph-element">x</div></div>"#),
			("kimi", r#"<div class="segment-content-box"><div class="markdown-container"><div class="markdown">x</div></div></div>"#),
			("yuanbao", r#"<div class="hyc-content-md"><div class="hyc-common-markdown">x</div></div>"#),
			("chatgpt", r#"<div class="markdown prose w-full break-words dark:prose-invert"><p>x</p></div>"#),
		];
		for (site, html) in samples {
			let doc = parse_fragment(html);
			for profile in builtin_profiles() {
				assert_eq!(profile.probe(container(&doc)), profile.key == site, "{} probing {site} markup", profile.key);
			}
		}
	}

	#[test]
	fn foreign_fingerprint_rejects_probe() {
		let doc = parse_fragment(r#"<div class="ds-markdown"><div class="flow-markdown-body">x</div></div>"#);
		let deepseek = site_profile("deepseek").expect("deepseek profile");
		assert!(!deepseek.probe(container(&doc)));
	}
}
