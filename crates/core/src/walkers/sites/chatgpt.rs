use super::SiteProfile;

pub(crate) static PROFILE: SiteProfile = SiteProfile {
	key: "chatgpt",
	fingerprints: &["markdown prose"],
	rejected: &["ds-markdown", "flow-markdown-body", "segment-content-box", "markdown-container", "hyc-common-markdown", "hyc-content-md"],
	paragraph_classes: &[],
	p_is_paragraph: true,
	code_classes: &[],
	table_wrappers: &["tablecontainer", "table-container"],
	control_classes: &["code-block-header", "sticky"],
};

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use crate::config::Rules;
	use crate::document::{Block, runs_text};
	use crate::dom::{container, parse_fragment};
	use crate::walkers::{WalkContext, Walker};

	#[test]
	fn headings_math_and_code() {
		let html = r#"<div class="markdown prose w-full break-words dark:prose-invert light">
			<h2>Pythagoras</h2>
			<p>For a right triangle <span class="katex"><span class="katex-mathml"><math><semantics><annotation encoding="application/x-tex">c</annotation></semantics></math></span><span class="katex-html">c</span></span> is the hypotenuse:</p>
			<span class="katex-display"><span class="katex"><span class="katex-mathml"><math><semantics><annotation encoding="application/x-tex">a^2 + b^2 = c^2</annotation></semantics></math></span></span></span>
			<pre class="overflow-visible!"><div class="contain-inline-size"><div class="sticky top-9">python</div><div class="overflow-y-auto"><code class="language-python"><span class="hljs-keyword">import</span> math</code></div></div></pre>
			<hr>
		</div>"#;
		let doc = parse_fragment(html);
		let ctx = WalkContext::new(Arc::new(Rules::builtin().clone()));
		let blocks = Walker::site(&super::PROFILE).walk(container(&doc), &ctx).expect("walk").blocks;

		assert!(matches!(&blocks[0], Block::Heading { level: 2, .. }));
		let Block::Paragraph { runs } = &blocks[1] else {
			panic!("expected paragraph, got {:?}", blocks[1]);
		};
		assert_eq!(runs_text(runs), "For a right triangle $c$ is the hypotenuse:");
		assert_eq!(
			blocks[2],
			Block::MathFormula {
				latex: "a^2 + b^2 = c^2".into(),
				display_mode: true,
			}
		);
		assert_eq!(blocks[3], Block::CodeBlock { text: "import math".into() });
		assert_eq!(blocks[4], Block::HorizontalRule);
	}
}
