//! Tree walkers turning a cleaned container into a [`Document`].
//!
//! Every site walker is a [`SiteProfile`] table driving the shared
//! recursive-descent engine in `semantic`; sites without semantic markup use
//! the [`GenericWalker`], which groups text by block and hands it to
//! structure inference.

mod generic;
mod inline;
mod semantic;
pub mod sites;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use scraper::ElementRef;

use crate::config::Rules;
use crate::document::Document;
use crate::error::{ExportError, Result};
use crate::render::html;

pub use generic::GenericWalker;
pub use sites::{SiteInfo, SiteProfile, site_info, site_profile};

/// Key under which the generic fallback is registered.
pub const GENERIC_KEY: &str = "generic";

const SITE_PRIORITY: i32 = 10;
const GENERIC_PRIORITY: i32 = 0;

/// Cooperative cancellation shared between the dispatcher and a walker.
///
/// Walkers poll it at every element and abort once it is set, so a walker
/// that lost the timeout race stops instead of running to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cancel(&self) {
		self.0.store(true, Ordering::Relaxed);
	}

	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::Relaxed)
	}
}

/// Everything a walker needs besides the tree itself.
#[derive(Debug, Clone)]
pub struct WalkContext {
	pub rules: Arc<Rules>,
	pub cancel: CancelFlag,
	/// Reported in the timeout error when the walk is cancelled.
	pub timeout: Duration,
	pub strip_follow_ups: bool,
}

impl WalkContext {
	pub fn new(rules: Arc<Rules>) -> Self {
		Self {
			rules,
			cancel: CancelFlag::new(),
			timeout: Duration::from_secs(5),
			strip_follow_ups: true,
		}
	}

	pub(crate) fn checkpoint(&self, walker: &'static str) -> Result<()> {
		if self.cancel.is_cancelled() {
			return Err(ExportError::FormattingTimeout {
				walker,
				timeout: self.timeout,
			});
		}
		Ok(())
	}
}

/// Site-specific walker driven by a static profile.
#[derive(Debug, Clone, Copy)]
pub struct SiteWalker {
	profile: &'static SiteProfile,
}

impl SiteWalker {
	pub fn new(profile: &'static SiteProfile) -> Self {
		Self { profile }
	}

	pub fn profile(&self) -> &'static SiteProfile {
		self.profile
	}
}

/// A registered converter from markup to [`Document`].
#[derive(Debug, Clone, Copy)]
pub enum Walker {
	Site(SiteWalker),
	Generic(GenericWalker),
}

impl Walker {
	pub fn generic() -> Self {
		Walker::Generic(GenericWalker)
	}

	pub fn site(profile: &'static SiteProfile) -> Self {
		Walker::Site(SiteWalker::new(profile))
	}

	pub fn key(&self) -> &'static str {
		match self {
			Walker::Site(w) => w.profile.key,
			Walker::Generic(_) => GENERIC_KEY,
		}
	}

	pub fn priority(&self) -> i32 {
		match self {
			Walker::Site(_) => SITE_PRIORITY,
			Walker::Generic(_) => GENERIC_PRIORITY,
		}
	}

	pub fn is_generic(&self) -> bool {
		matches!(self, Walker::Generic(_))
	}

	/// Capability probe: whether this walker recognizes the markup shape.
	pub fn can_handle(&self, node: ElementRef<'_>) -> bool {
		match self {
			Walker::Site(w) => w.profile.probe(node),
			Walker::Generic(_) => true,
		}
	}

	/// Converts `node` into a normalized document.
	///
	/// Fails with [`ExportError::EmptyResult`] when nothing visible remains.
	pub fn walk(&self, node: ElementRef<'_>, ctx: &WalkContext) -> Result<Document> {
		let doc = match self {
			Walker::Site(w) => semantic::walk(w.profile, node, ctx)?,
			Walker::Generic(g) => g.walk(node, ctx)?,
		};
		let doc = doc.normalize();
		if doc.is_empty() {
			return Err(ExportError::EmptyResult { walker: self.key() });
		}
		Ok(doc)
	}

	/// Converts `node` and serializes it as plain markup.
	pub fn format(&self, node: ElementRef<'_>, ctx: &WalkContext) -> Result<String> {
		let doc = self.walk(node, ctx)?;
		Ok(html::render(&doc))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dom::{container, parse_fragment};

	fn ctx() -> WalkContext {
		WalkContext::new(Arc::new(Rules::builtin().clone()))
	}

	#[test]
	fn cancelled_walk_reports_timeout() {
		let doc = parse_fragment("<div class='ds-markdown'><p>x</p></div>");
		let ctx = ctx();
		ctx.cancel.cancel();
		let walker = Walker::site(site_profile("deepseek").expect("deepseek profile"));
		let err = walker.walk(container(&doc), &ctx).expect_err("walk should abort");
		assert!(matches!(err, ExportError::FormattingTimeout { walker: "deepseek", .. }));
	}

	#[test]
	fn blank_container_is_empty_result() {
		let doc = parse_fragment("<div> </div>");
		let err = Walker::generic().walk(container(&doc), &ctx()).expect_err("blank input");
		assert!(matches!(err, ExportError::EmptyResult { walker: GENERIC_KEY }));
	}

	#[test]
	fn format_renders_markup() {
		let doc = parse_fragment("<div class='ds-markdown'><p class='ds-markdown-paragraph'>你好</p></div>");
		let walker = Walker::site(site_profile("deepseek").expect("deepseek profile"));
		assert_eq!(walker.format(container(&doc), &ctx()).expect("format"), "<p>你好</p>");
	}

	#[test]
	fn priorities_favour_site_walkers() {
		let site = Walker::site(site_profile("kimi").expect("kimi profile"));
		assert!(site.priority() > Walker::generic().priority());
		assert!(Walker::generic().can_handle(container(&parse_fragment("<div/>"))));
	}
}
