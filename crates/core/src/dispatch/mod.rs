//! Walker selection and guarded execution.
//!
//! A walker runs on the blocking pool against its own parse of the cleaned
//! markup, raced against the walker timeout. When the timeout wins the
//! walker's [`CancelFlag`] is set so it stops at its next element. Failures
//! cascade to the generic walker and finally to raw text extraction.

mod registry;

use std::sync::Arc;
use std::time::Instant;

use scraper::ElementRef;
use serde::Serialize;
use tracing::{debug, info, warn};

pub use registry::{Registry, RegistryState};

use crate::config::{ExportOptions, Rules};
use crate::document::{Block, Document};
use crate::dom::{container, parse_fragment};
use crate::error::{ExportError, Result};
use crate::render::text::html_to_text;
use crate::walkers::{CancelFlag, WalkContext, Walker};

/// Walker key reported for raw text extraction.
pub const RAW_TEXT_KEY: &str = "raw-text";

/// How much structure survived the fallback cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Fidelity {
	/// The first-choice walker succeeded.
	Full,
	/// The first choice failed and the generic walker succeeded.
	GenericFallback,
	/// Every walker failed; the document is plain text paragraphs.
	RawText,
}

/// Document produced by [`Dispatcher::dispatch`].
#[derive(Debug, Clone)]
pub struct Dispatched {
	pub document: Document,
	pub walker: &'static str,
	pub fidelity: Fidelity,
}

/// Chooses walkers from a [`Registry`] and runs them under a timeout.
#[derive(Debug, Clone)]
pub struct Dispatcher {
	registry: Arc<Registry>,
	rules: Arc<Rules>,
	options: ExportOptions,
}

impl Dispatcher {
	pub fn new(registry: Arc<Registry>, rules: Arc<Rules>, options: ExportOptions) -> Self {
		Self { registry, rules, options }
	}

	pub fn registry(&self) -> &Arc<Registry> {
		&self.registry
	}

	/// Picks the walker for `site`.
	///
	/// Order: the site's own walker if its probe accepts the node, then any
	/// other registered walker whose probe accepts it, then the fallback.
	pub fn select_walker(&self, site: &str, node: ElementRef<'_>) -> Result<Walker> {
		if let Some(walker) = self.registry.walker_for(site).filter(|w| w.can_handle(node)) {
			return Ok(walker);
		}
		if let Some(walker) = self.registry.walkers().into_iter().find(|w| w.can_handle(node)) {
			debug!(target = "chx.dispatch", site, walker = walker.key(), "probe matched another site's walker");
			return Ok(walker);
		}
		self.registry.fallback().ok_or_else(|| ExportError::FormatterNotFound { site: site.to_string() })
	}

	/// Runs `walker` over `markup` on the blocking pool, bounded by the walker timeout.
	pub async fn execute(&self, walker: Walker, markup: Arc<str>, site: &str) -> Result<Document> {
		let timeout = self.options.walker_timeout;
		let cancel = CancelFlag::new();
		let ctx = WalkContext {
			rules: Arc::clone(&self.rules),
			cancel: cancel.clone(),
			timeout,
			strip_follow_ups: self.options.strip_follow_ups,
		};

		let started = Instant::now();
		let task = tokio::task::spawn_blocking(move || {
			let doc = parse_fragment(&markup);
			walker.walk(container(&doc), &ctx)
		});

		match tokio::time::timeout(timeout, task).await {
			Ok(Ok(result)) => {
				debug!(
					target = "chx.dispatch",
					site,
					walker = walker.key(),
					elapsed_ms = started.elapsed().as_millis() as u64,
					ok = result.is_ok(),
					"walker finished"
				);
				result
			}
			Ok(Err(join)) => Err(ExportError::WalkerTask(join.to_string())),
			Err(_) => {
				cancel.cancel();
				Err(ExportError::FormattingTimeout {
					walker: walker.key(),
					timeout,
				})
			}
		}
	}

	/// Selects and runs a walker, cascading through the generic walker and
	/// raw text extraction on recoverable failures.
	///
	/// Fails with [`ExportError::FormatterNotFound`] when nothing is
	/// registered, and with [`ExportError::EmptyResult`] when even raw text
	/// extraction finds nothing.
	pub async fn dispatch(&self, site: &str, markup: Arc<str>) -> Result<Dispatched> {
		if !self.registry.wait_ready(self.options.registry_poll_interval, self.options.registry_wait_ceiling).await {
			warn!(target = "chx.dispatch", site, "registry not ready, continuing with current registrations");
		}

		let walker = {
			let doc = parse_fragment(&markup);
			self.select_walker(site, container(&doc))?
		};

		let first = match self.execute(walker, Arc::clone(&markup), site).await {
			Ok(document) => {
				return Ok(Dispatched {
					document,
					walker: walker.key(),
					fidelity: Fidelity::Full,
				});
			}
			Err(err) => err,
		};
		warn!(target = "chx.dispatch", site, walker = walker.key(), error = %first, "walker failed");

		if !walker.is_generic() {
			if let Some(generic) = self.registry.fallback() {
				match self.execute(generic, Arc::clone(&markup), site).await {
					Ok(document) => {
						info!(target = "chx.dispatch", site, "recovered with generic walker");
						return Ok(Dispatched {
							document,
							walker: generic.key(),
							fidelity: Fidelity::GenericFallback,
						});
					}
					Err(err) => warn!(target = "chx.dispatch", site, error = %err, "generic walker failed"),
				}
			}
		}

		let document = raw_text_document(&markup);
		if document.is_empty() {
			return Err(ExportError::EmptyResult { walker: RAW_TEXT_KEY });
		}
		info!(target = "chx.dispatch", site, "degraded to raw text");
		Ok(Dispatched {
			document,
			walker: RAW_TEXT_KEY,
			fidelity: Fidelity::RawText,
		})
	}
}

/// One paragraph per non-blank line of the markup's text.
fn raw_text_document(markup: &str) -> Document {
	let text = html_to_text(markup);
	let blocks = text.lines().map(str::trim).filter(|l| !l.is_empty()).map(Block::paragraph).collect();
	Document::new(blocks).normalize()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::document::runs_text;

	fn dispatcher(register_builtins: bool) -> Dispatcher {
		let registry = Arc::new(Registry::new(register_builtins));
		registry.init();
		Dispatcher::new(registry, Arc::new(Rules::builtin().clone()), ExportOptions::default())
	}

	fn select(dispatcher: &Dispatcher, site: &str, html: &str) -> Result<Walker> {
		let doc = parse_fragment(html);
		dispatcher.select_walker(site, container(&doc))
	}

	#[test]
	fn unknown_site_selects_generic() {
		let walker = select(&dispatcher(true), "gemini", "<div><p>hi</p></div>").expect("generic fallback");
		assert!(walker.is_generic());
	}

	#[test]
	fn probe_can_redirect_to_another_site() {
		let walker = select(&dispatcher(true), "kimi", r#"<div class="ds-markdown"><p>x</p></div>"#).expect("walker");
		assert_eq!(walker.key(), "deepseek");
	}

	#[test]
	fn empty_registry_reports_formatter_not_found() {
		let err = select(&dispatcher(false), "deepseek", "<div>x</div>").expect_err("nothing registered");
		assert!(matches!(err, ExportError::FormatterNotFound { .. }));
	}

	#[tokio::test]
	async fn empty_site_result_falls_back_to_generic() {
		let markup: Arc<str> = Arc::from(r#"<div class="ds-markdown"><div class="ds-icon-button">hello</div></div>"#);
		let dispatched = dispatcher(true).dispatch("deepseek", markup).await.expect("dispatch");
		assert_eq!(dispatched.fidelity, Fidelity::GenericFallback);
		assert_eq!(dispatched.walker, "generic");
		assert_eq!(dispatched.document.blocks, vec![Block::paragraph("hello")]);
	}

	#[tokio::test]
	async fn raw_text_is_the_last_resort() {
		let markup: Arc<str> = Arc::from(r#"<div class="ds-markdown"><button>点击</button></div>"#);
		let dispatched = dispatcher(true).dispatch("deepseek", markup).await.expect("dispatch");
		assert_eq!(dispatched.fidelity, Fidelity::RawText);
		assert_eq!(dispatched.walker, RAW_TEXT_KEY);
		let Block::Paragraph { runs } = &dispatched.document.blocks[0] else {
			panic!("expected paragraph");
		};
		assert_eq!(runs_text(runs), "点击");
	}

	#[tokio::test]
	async fn blank_markup_is_empty_result() {
		let err = dispatcher(true).dispatch("kimi", Arc::from("<div>  </div>")).await.expect_err("blank");
		assert!(matches!(err, ExportError::EmptyResult { walker: RAW_TEXT_KEY }));
	}

	#[tokio::test]
	async fn site_walker_runs_at_full_fidelity() {
		let markup: Arc<str> = Arc::from(r#"<div class="flow-markdown-body"><div class="paragraph-element">豆包</div></div>"#);
		let dispatched = dispatcher(true).dispatch("doubao", markup).await.expect("dispatch");
		assert_eq!(dispatched.fidelity, Fidelity::Full);
		assert_eq!(dispatched.walker, "doubao");
	}

	fn large_deepseek_answer() -> Arc<str> {
		let mut html = String::from(r#"<div class="ds-markdown">"#);
		for idx in 0..5000 {
			html.push_str(&format!(r#"<p class="ds-markdown-paragraph">第 {idx} 段：<strong>缓存</strong>可以减少重复计算。</p>"#));
		}
		html.push_str("</div>");
		Arc::from(html)
	}

	fn impatient_dispatcher() -> Dispatcher {
		let registry = Arc::new(Registry::new(true));
		registry.init();
		let options = ExportOptions {
			walker_timeout: std::time::Duration::ZERO,
			..ExportOptions::default()
		};
		Dispatcher::new(registry, Arc::new(Rules::builtin().clone()), options)
	}

	#[tokio::test]
	async fn execute_reports_timeout_when_budget_is_spent() {
		let dispatcher = impatient_dispatcher();
		let walker = dispatcher.registry().walker_for("deepseek").expect("deepseek walker");
		let err = dispatcher.execute(walker, large_deepseek_answer(), "deepseek").await.expect_err("walker should time out");
		assert!(matches!(err, ExportError::FormattingTimeout { walker: "deepseek", .. }));
	}

	#[tokio::test]
	async fn timed_out_walker_degrades_without_escaping_errors() {
		let dispatched = impatient_dispatcher()
			.dispatch("deepseek", large_deepseek_answer())
			.await
			.expect("timeouts are recovered");
		assert_ne!(dispatched.fidelity, Fidelity::Full);
		assert!(!dispatched.document.is_empty());
	}
}
