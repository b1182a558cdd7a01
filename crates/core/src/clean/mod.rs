//! Removal of non-content subtrees from the owned tree copy.

mod follow_ups;

use std::collections::HashSet;

use ego_tree::NodeId;
use scraper::{ElementRef, Html};
use serde::Serialize;
use tracing::debug;

use crate::classify::is_thinking_content;
use crate::config::{ControlRules, Rules};
use crate::dom::{class_contains, detach_all, visible_text};
use crate::walkers::site_profile;

pub use follow_ups::strip_follow_ups;

/// Disclaimer templates are short; longer text is real content.
const DISCLAIMER_MAX_CHARS: usize = 120;

/// Class fragments marking an inline element as a clickable control.
const CONTROL_CLASS_HINTS: &[&str] = &["btn", "button", "action", "tool", "icon", "operate", "opt-"];

/// Counts of subtrees removed by [`clean`] and [`remove_thinking`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CleanReport {
	pub markup: usize,
	pub controls: usize,
	pub disclaimers: usize,
	pub recommendations: usize,
	pub thinking: usize,
}

impl CleanReport {
	pub fn total(&self) -> usize {
		self.markup + self.controls + self.disclaimers + self.recommendations + self.thinking
	}
}

#[derive(Clone, Copy)]
enum Reason {
	Markup,
	Control,
	Disclaimer,
	Recommendation,
}

/// Strips controls, disclaimers and recommendation blocks from `html`.
///
/// `site` selects additional control class names registered for that site.
/// With `for_copy`, media and form elements are removed as well since they
/// cannot be carried through the clipboard. Only the owned tree is touched.
pub fn clean(html: &mut Html, site: &str, for_copy: bool, rules: &Rules) -> CleanReport {
	let site_controls: &[&str] = site_profile(site).map(|p| p.control_classes).unwrap_or_default();

	let mut marked: HashSet<NodeId> = HashSet::new();
	let mut order: Vec<(NodeId, Reason)> = Vec::new();

	for el in html.root_element().descendants().skip(1).filter_map(ElementRef::wrap) {
		if el.ancestors().any(|a| marked.contains(&a.id())) {
			continue;
		}
		let reason = if is_removable_tag(el, &rules.controls, for_copy) {
			Some(Reason::Markup)
		} else if is_control(el, &rules.controls) || class_contains(el, site_controls) {
			Some(Reason::Control)
		} else if is_disclaimer(el, rules) {
			Some(Reason::Disclaimer)
		} else if class_contains(el, &rules.recommend_classes) {
			Some(Reason::Recommendation)
		} else {
			None
		};
		if let Some(reason) = reason {
			marked.insert(el.id());
			order.push((el.id(), reason));
		}
	}

	let mut report = CleanReport::default();
	for (_, reason) in &order {
		match reason {
			Reason::Markup => report.markup += 1,
			Reason::Control => report.controls += 1,
			Reason::Disclaimer => report.disclaimers += 1,
			Reason::Recommendation => report.recommendations += 1,
		}
	}
	let ids: Vec<NodeId> = order.into_iter().map(|(id, _)| id).collect();
	detach_all(html, &ids);

	debug!(
		target = "chx.clean",
		site,
		for_copy,
		markup = report.markup,
		controls = report.controls,
		disclaimers = report.disclaimers,
		recommendations = report.recommendations,
		"cleaned container"
	);
	report
}

/// Detaches every thinking subtree, returning how many were removed.
pub fn remove_thinking(html: &mut Html, rules: &Rules) -> usize {
	let mut marked: HashSet<NodeId> = HashSet::new();
	let mut ids = Vec::new();
	for el in html.root_element().descendants().skip(1).filter_map(ElementRef::wrap) {
		if el.ancestors().any(|a| marked.contains(&a.id())) {
			continue;
		}
		if is_thinking_content(el, rules) {
			marked.insert(el.id());
			ids.push(el.id());
		}
	}
	let removed = detach_all(html, &ids);
	if removed > 0 {
		debug!(target = "chx.clean", removed, "removed thinking content");
	}
	removed
}

/// Cleans flat text: follow-up recommendations are stripped when enabled.
pub fn clean_text(text: &str, rules: &Rules) -> String {
	strip_follow_ups(text, &rules.follow_ups)
}

fn is_removable_tag(el: ElementRef<'_>, controls: &ControlRules, for_copy: bool) -> bool {
	let name = el.value().name();
	controls.always_remove_tags.iter().any(|t| t == name) || (for_copy && controls.copy_only_tags.iter().any(|t| t == name))
}

fn control_label(el: ElementRef<'_>, controls: &ControlRules) -> String {
	let text = visible_text(el);
	if !text.is_empty() {
		return text.to_lowercase();
	}
	controls
		.label_attributes
		.iter()
		.find_map(|attr| el.value().attr(attr))
		.map(|label| label.trim().to_lowercase())
		.unwrap_or_default()
}

fn is_control(el: ElementRef<'_>, controls: &ControlRules) -> bool {
	let name = el.value().name();
	let role = el.value().attr("role").map(str::to_lowercase);
	let is_button = controls.tags.iter().any(|t| t == name) || role.is_some_and(|r| controls.roles.contains(&r));
	let label = control_label(el, controls);

	if is_button {
		return label.is_empty() || controls.labels.contains(&label);
	}

	matches!(name, "span" | "a" | "div" | "i")
		&& class_contains(el, CONTROL_CLASS_HINTS)
		&& !label.is_empty()
		&& controls.labels.contains(&label)
}

fn is_disclaimer(el: ElementRef<'_>, rules: &Rules) -> bool {
	let text = visible_text(el);
	!text.is_empty() && text.chars().count() <= DISCLAIMER_MAX_CHARS && rules.disclaimers.iter().any(|re| re.is_match(&text))
}
