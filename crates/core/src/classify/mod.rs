//! Authorship classification and thinking-content detection.
//!
//! Four independent signals each contribute a human score and an AI score.
//! The side with the strictly higher total wins. Ties resolve to AI so an
//! answer is never silently dropped; this is a heuristic choice, not a
//! guarantee, and is surfaced through the `tie-default-ai` indicator.

mod signals;
mod thinking;

use scraper::ElementRef;
use serde::Serialize;

use crate::config::Rules;

pub use thinking::{is_thinking_content, is_thinking_text_content};

/// Indicator attached when equal scores resolve to AI.
pub const TIE_DEFAULT_AI: &str = "tie-default-ai";

/// Who authored a candidate container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuthorType {
	Human,
	#[serde(rename = "AI")]
	Ai,
	Unknown,
}

/// Outcome of [`classify`]. Computed fresh for every invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
	#[serde(rename = "type")]
	pub kind: AuthorType,
	pub confidence: f32,
	pub indicators: Vec<String>,
}

/// Layout facts supplied by the host page, which this crate cannot measure.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Geometry {
	pub left: f32,
	pub width: f32,
	pub viewport_width: f32,
}

impl Geometry {
	pub(crate) fn width_ratio(&self) -> Option<f32> {
		(self.viewport_width > 0.0).then(|| self.width / self.viewport_width)
	}

	pub(crate) fn right_aligned(&self) -> bool {
		self.viewport_width > 0.0 && self.left > self.viewport_width * 0.3 && self.left + self.width >= self.viewport_width * 0.7
	}
}

/// Scores accumulated by one signal.
#[derive(Debug, Default, Clone)]
pub(crate) struct Score {
	pub(crate) human: f32,
	pub(crate) ai: f32,
	pub(crate) indicators: Vec<String>,
}

impl Score {
	pub(crate) fn human(&mut self, weight: f32, indicator: impl Into<String>) {
		self.human += weight;
		self.indicators.push(indicator.into());
	}

	pub(crate) fn ai(&mut self, weight: f32, indicator: impl Into<String>) {
		self.ai += weight;
		self.indicators.push(indicator.into());
	}

	fn absorb(&mut self, other: Score) {
		self.human += other.human;
		self.ai += other.ai;
		self.indicators.extend(other.indicators);
	}
}

/// Classifies a container as human- or AI-authored.
///
/// Containers without any text yield [`AuthorType::Unknown`]: there is
/// nothing to weigh and nothing worth exporting.
pub fn classify(node: ElementRef<'_>, geometry: Option<&Geometry>, rules: &Rules) -> ClassificationResult {
	let text = crate::dom::visible_text(node);
	if text.is_empty() {
		return ClassificationResult {
			kind: AuthorType::Unknown,
			confidence: 0.0,
			indicators: vec!["no-text".to_string()],
		};
	}

	let mut total = Score::default();
	total.absorb(signals::attribute_signal(node, &rules.classifier));
	total.absorb(signals::lexical_signal(&text, &rules.classifier));
	total.absorb(signals::structural_signal(node, geometry, &rules.classifier));
	total.absorb(signals::complexity_signal(node, &text));

	decide(total)
}

fn decide(score: Score) -> ClassificationResult {
	let Score { human, ai, mut indicators } = score;
	let sum = human + ai;

	if human > ai {
		ClassificationResult {
			kind: AuthorType::Human,
			confidence: human / sum,
			indicators,
		}
	} else if ai > human {
		ClassificationResult {
			kind: AuthorType::Ai,
			confidence: ai / sum,
			indicators,
		}
	} else {
		indicators.push(TIE_DEFAULT_AI.to_string());
		ClassificationResult {
			kind: AuthorType::Ai,
			confidence: 0.5,
			indicators,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dom::{container, parse_fragment};

	fn run(html: &str) -> ClassificationResult {
		let doc = parse_fragment(html);
		classify(container(&doc), None, Rules::builtin())
	}

	#[test]
	fn assistant_attribute_outweighs_human_phrasing() {
		let result = run(r#"<div data-role="assistant">Please help me understand this, can you explain? Please help me!</div>"#);
		assert_eq!(result.kind, AuthorType::Ai);
		assert!(result.confidence > 0.5);
		assert!(result.indicators.iter().any(|i| i == "attr:data-role=assistant"));
	}

	#[test]
	fn user_attribute_marks_human() {
		let result = run(r#"<div data-message-author-role="user">写一首关于秋天的诗</div>"#);
		assert_eq!(result.kind, AuthorType::Human);
	}

	#[test]
	fn long_structured_answer_is_ai() {
		let html = "<div><p>以下是三种常见的方法：</p><ul><li>第一种方法是使用缓存来减少重复计算，这样能显著提升性能。</li><li>第二种方法是并行处理。</li></ul><p>综上所述，我建议先从缓存开始。Here is why it works well in practice. It is cheap. It is simple.</p></div>";
		assert_eq!(run(html).kind, AuthorType::Ai);
	}

	#[test]
	fn equal_scores_default_to_ai_with_indicator() {
		let result = decide(Score {
			human: 2.0,
			ai: 2.0,
			indicators: vec![],
		});
		assert_eq!(result.kind, AuthorType::Ai);
		assert_eq!(result.confidence, 0.5);
		assert!(result.indicators.iter().any(|i| i == TIE_DEFAULT_AI));
	}

	#[test]
	fn empty_container_is_unknown() {
		assert_eq!(run("<div>   </div>").kind, AuthorType::Unknown);
	}

	#[test]
	fn confidence_is_winner_share() {
		let result = decide(Score {
			human: 1.0,
			ai: 3.0,
			indicators: vec![],
		});
		assert_eq!(result.kind, AuthorType::Ai);
		assert!((result.confidence - 0.75).abs() < f32::EPSILON);
	}
}
