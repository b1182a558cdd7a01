//! Recommended follow-up question stripping for flat text.
//!
//! Two layers run in order. The pattern layer removes runs of at least two
//! consecutive question-shaped lines wherever they appear, which catches
//! recommendation blocks even before any answer text was seen. The structure
//! layer then drops a trailing block of short interrogative lines, but only
//! once substantial non-interrogative content precedes it, so a single short
//! question embedded in the answer survives both layers.

use crate::config::FollowUpRules;

fn is_interrogative(line: &str) -> bool {
	line.ends_with('?') || line.ends_with('？')
}

fn is_candidate(line: &str, rules: &FollowUpRules) -> bool {
	let chars = line.chars().count();
	(rules.min_chars..=rules.max_chars).contains(&chars) && rules.families.iter().any(|re| re.is_match(line))
}

fn is_main_content(line: &str, rules: &FollowUpRules) -> bool {
	line.chars().count() > rules.main_content_min_chars && !is_interrogative(line)
}

/// Removes recommended follow-up questions from extracted text.
pub fn strip_follow_ups(text: &str, rules: &FollowUpRules) -> String {
	let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
	let mut keep = vec![true; lines.len()];

	// pattern layer
	let candidates: Vec<usize> = lines
		.iter()
		.enumerate()
		.filter(|(_, line)| !line.trim().is_empty())
		.map(|(idx, _)| idx)
		.collect();
	let mut run: Vec<usize> = Vec::new();
	for &idx in candidates.iter().chain(std::iter::once(&usize::MAX)) {
		let hit = idx != usize::MAX && is_candidate(lines[idx].trim(), rules);
		if hit {
			run.push(idx);
			continue;
		}
		if run.len() >= 2 {
			for &r in &run {
				keep[r] = false;
			}
		}
		run.clear();
	}

	// structure layer
	let mut trailing: Vec<usize> = Vec::new();
	let mut block_start = lines.len();
	for idx in (0..lines.len()).rev() {
		if !keep[idx] {
			continue;
		}
		let line = lines[idx].trim();
		if line.is_empty() {
			continue;
		}
		if is_interrogative(line) && line.chars().count() <= rules.max_chars {
			trailing.push(idx);
			block_start = idx;
		} else {
			break;
		}
	}
	let main_before = lines[..block_start]
		.iter()
		.enumerate()
		.any(|(idx, line)| keep[idx] && is_main_content(line.trim(), rules));
	if main_before {
		for idx in trailing {
			keep[idx] = false;
		}
	}

	let kept: Vec<&str> = lines.iter().zip(&keep).filter(|(_, k)| **k).map(|(line, _)| *line).collect();
	kept.join("\n").trim_end().to_string()
}
