//! Heuristic rule tables and runtime options.
//!
//! The rule tables ship as `rules.json` and are compiled once into a
//! [`Rules`] value. Callers can supply their own table through
//! [`Rules::from_json`] to tune vocabularies without touching walker code.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;

use crate::error::{ExportError, Result};

static BUILTIN: LazyLock<Rules> = LazyLock::new(|| {
	let json = include_str!("../rules.json");
	Rules::from_json(json).expect("bundled rules.json should compile")
});

/// Runtime knobs for one [`Exporter`](crate::Exporter).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportOptions {
	/// Budget for a single walker run before falling back.
	#[serde(with = "millis")]
	pub walker_timeout: Duration,
	/// Step between registry readiness checks.
	#[serde(with = "millis")]
	pub registry_poll_interval: Duration,
	/// Upper bound on waiting for the registry to become ready.
	#[serde(with = "millis")]
	pub registry_wait_ceiling: Duration,
	/// Register the built-in walkers lazily on first use.
	pub register_builtins: bool,
	/// Treat containers with no classification signal as AI output.
	pub classify_unknown_as_ai: bool,
	/// Strip recommended follow-up questions from flat text.
	pub strip_follow_ups: bool,
}

impl Default for ExportOptions {
	fn default() -> Self {
		Self {
			walker_timeout: Duration::from_secs(5),
			registry_poll_interval: Duration::from_millis(100),
			registry_wait_ceiling: Duration::from_secs(5),
			register_builtins: true,
			classify_unknown_as_ai: true,
			strip_follow_ups: true,
		}
	}
}

impl ExportOptions {
	/// Parses options from JSON, filling unspecified fields with defaults.
	pub fn from_json(json: &str) -> Result<Self> {
		Ok(serde_json::from_str(json)?)
	}
}

mod millis {
	use std::time::Duration;

	use serde::{Deserialize, Deserializer};

	pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
		u64::deserialize(deserializer).map(Duration::from_millis)
	}
}

/// A substring or regex with a score contribution.
#[derive(Debug, Clone, Deserialize)]
pub struct WeightedPattern {
	pub pattern: String,
	pub weight: f32,
}

#[derive(Debug, Deserialize)]
struct RuleFile {
	controls: ControlRules,
	disclaimers: Vec<String>,
	recommend_classes: Vec<String>,
	thinking: ThinkingFile,
	classifier: ClassifierFile,
	follow_ups: FollowUpFile,
}

/// Interactive-control vocabulary used by the cleaner.
#[derive(Debug, Clone, Deserialize)]
pub struct ControlRules {
	pub labels: Vec<String>,
	pub tags: Vec<String>,
	pub roles: Vec<String>,
	pub label_attributes: Vec<String>,
	pub always_remove_tags: Vec<String>,
	pub copy_only_tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ThinkingFile {
	classes: Vec<String>,
	attributes: Vec<String>,
	ambiguous_classes: Vec<String>,
	ambiguous_tags: Vec<String>,
	text_patterns: Vec<String>,
	keywords: Vec<String>,
	keyword_threshold: usize,
	pure_process_patterns: Vec<String>,
	pure_process_max_chars: usize,
}

#[derive(Debug, Deserialize)]
struct ClassifierFile {
	role_attributes: Vec<String>,
	human_attribute_values: Vec<String>,
	ai_attribute_values: Vec<String>,
	human_classes: Vec<WeightedPattern>,
	ai_classes: Vec<WeightedPattern>,
	human_phrases: Vec<WeightedPattern>,
	ai_phrases: Vec<WeightedPattern>,
	ai_fingerprints: Vec<String>,
	input_controls: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct FollowUpFile {
	families: Vec<String>,
	min_chars: usize,
	max_chars: usize,
	main_content_min_chars: usize,
}

/// Compiled regex with its weight.
#[derive(Debug, Clone)]
pub struct WeightedRegex {
	pub regex: Regex,
	pub weight: f32,
}

/// Compiled thinking-detection vocabulary.
#[derive(Debug, Clone)]
pub struct ThinkingRules {
	pub classes: Vec<String>,
	/// `(name, Some(value))` entries require the attribute to equal `value`.
	pub attributes: Vec<(String, Option<String>)>,
	pub ambiguous_classes: Vec<String>,
	pub ambiguous_tags: Vec<String>,
	pub text_patterns: Vec<Regex>,
	pub keywords: Vec<String>,
	pub keyword_threshold: usize,
	pub pure_process_patterns: Vec<Regex>,
	pub pure_process_max_chars: usize,
}

/// Compiled classifier vocabulary.
#[derive(Debug, Clone)]
pub struct ClassifierRules {
	pub role_attributes: Vec<String>,
	pub human_attribute_values: Vec<String>,
	pub ai_attribute_values: Vec<String>,
	pub human_classes: Vec<WeightedPattern>,
	pub ai_classes: Vec<WeightedPattern>,
	pub human_phrases: Vec<WeightedRegex>,
	pub ai_phrases: Vec<WeightedRegex>,
	pub ai_fingerprints: Vec<String>,
	pub input_controls: Vec<String>,
}

/// Compiled follow-up question heuristics.
#[derive(Debug, Clone)]
pub struct FollowUpRules {
	pub families: Vec<Regex>,
	pub min_chars: usize,
	pub max_chars: usize,
	pub main_content_min_chars: usize,
}

/// Every heuristic table the pipeline consults.
#[derive(Debug, Clone)]
pub struct Rules {
	pub controls: ControlRules,
	pub disclaimers: Vec<Regex>,
	pub recommend_classes: Vec<String>,
	pub thinking: ThinkingRules,
	pub classifier: ClassifierRules,
	pub follow_ups: FollowUpRules,
}

impl Rules {
	/// The bundled rule tables.
	pub fn builtin() -> &'static Rules {
		&BUILTIN
	}

	/// Compiles a rule file. Vocabulary entries are lower-cased so matching
	/// can be done against lower-cased class names and labels.
	pub fn from_json(json: &str) -> Result<Self> {
		let file: RuleFile = serde_json::from_str(json)?;

		let mut controls = file.controls;
		controls.labels = lowercase(controls.labels);

		Ok(Self {
			controls,
			disclaimers: compile_all(&file.disclaimers)?,
			recommend_classes: lowercase(file.recommend_classes),
			thinking: ThinkingRules {
				classes: lowercase(file.thinking.classes),
				attributes: file
					.thinking
					.attributes
					.into_iter()
					.map(|entry| match entry.split_once('=') {
						Some((name, value)) => (name.to_ascii_lowercase(), Some(value.to_string())),
						None => (entry.to_ascii_lowercase(), None),
					})
					.collect(),
				ambiguous_classes: lowercase(file.thinking.ambiguous_classes),
				ambiguous_tags: lowercase(file.thinking.ambiguous_tags),
				text_patterns: compile_all(&file.thinking.text_patterns)?,
				keywords: lowercase(file.thinking.keywords),
				keyword_threshold: file.thinking.keyword_threshold,
				pure_process_patterns: compile_all(&file.thinking.pure_process_patterns)?,
				pure_process_max_chars: file.thinking.pure_process_max_chars,
			},
			classifier: ClassifierRules {
				role_attributes: lowercase(file.classifier.role_attributes),
				human_attribute_values: lowercase(file.classifier.human_attribute_values),
				ai_attribute_values: lowercase(file.classifier.ai_attribute_values),
				human_classes: file.classifier.human_classes,
				ai_classes: file.classifier.ai_classes,
				human_phrases: compile_weighted(&file.classifier.human_phrases)?,
				ai_phrases: compile_weighted(&file.classifier.ai_phrases)?,
				ai_fingerprints: lowercase(file.classifier.ai_fingerprints),
				input_controls: file.classifier.input_controls,
			},
			follow_ups: FollowUpRules {
				families: compile_all(&file.follow_ups.families)?,
				min_chars: file.follow_ups.min_chars,
				max_chars: file.follow_ups.max_chars,
				main_content_min_chars: file.follow_ups.main_content_min_chars,
			},
		})
	}
}

fn lowercase(values: Vec<String>) -> Vec<String> {
	values.into_iter().map(|v| v.to_lowercase()).collect()
}

fn compile(pattern: &str) -> Result<Regex> {
	Regex::new(pattern).map_err(|source| ExportError::RulePattern {
		pattern: pattern.to_string(),
		source,
	})
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>> {
	patterns.iter().map(|p| compile(p)).collect()
}

fn compile_weighted(patterns: &[WeightedPattern]) -> Result<Vec<WeightedRegex>> {
	patterns
		.iter()
		.map(|p| {
			Ok(WeightedRegex {
				regex: compile(&p.pattern)?,
				weight: p.weight,
			})
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bundled_rules_load() {
		let rules = Rules::builtin();
		assert!(rules.controls.labels.contains(&"copy".to_string()));
		assert!(rules.controls.labels.contains(&"复制".to_string()));
		assert!(!rules.disclaimers.is_empty());
		assert!(rules.thinking.classes.iter().any(|c| c == "thinking-container"));
		assert_eq!(rules.thinking.keyword_threshold, 3);
		assert!(!rules.follow_ups.families.is_empty());
	}

	#[test]
	fn attribute_rules_split_name_and_value() {
		let rules = Rules::builtin();
		assert!(rules.thinking.attributes.contains(&("data-thinking".to_string(), None)));
		assert!(
			rules
				.thinking
				.attributes
				.contains(&("data-testid".to_string(), Some("thinking-block".to_string())))
		);
	}

	#[test]
	fn invalid_pattern_is_reported() {
		let json = include_str!("../rules.json").replacen("\"(?i)please help me\"", "\"(unclosed\"", 1);
		let err = Rules::from_json(&json).expect_err("broken regex should fail");
		assert!(matches!(err, ExportError::RulePattern { .. }));
	}

	#[test]
	fn options_fill_defaults() {
		let opts = ExportOptions::from_json(r#"{"walkerTimeout": 250}"#).expect("options should parse");
		assert_eq!(opts.walker_timeout, Duration::from_millis(250));
		assert_eq!(opts.registry_poll_interval, Duration::from_millis(100));
		assert!(opts.register_builtins);
	}
}
