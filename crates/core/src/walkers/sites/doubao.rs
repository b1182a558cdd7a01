use super::SiteProfile;

pub(crate) static PROFILE: SiteProfile = SiteProfile {
	key: "doubao",
	fingerprints: &["flow-markdown-body"],
	rejected: &["ds-markdown", "segment-content-box", "markdown-container", "hyc-common-markdown", "hyc-content-md", "markdown prose"],
	paragraph_classes: &["paragraph-element"],
	p_is_paragraph: true,
	code_classes: &["code-block-element", "custom-code-block"],
	table_wrappers: &["table-container", "table-wrapper"],
	control_classes: &["code-block-header", "message-action", "table-actions", "header-wrapper-"],
};

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use crate::config::Rules;
	use crate::document::{Block, runs_text};
	use crate::dom::{container, parse_fragment};
	use crate::walkers::{WalkContext, Walker};

	#[test]
	fn div_paragraphs_and_ordered_list() {
		let html = r#"<div class="flow-markdown-body">
			<div class="auto-hide-last-sibling-br paragraph-element br-paragraph-space">豆包给出三个建议：</div>
			<ol><li><div class="paragraph-element"><strong>早睡</strong>早起</div></li><li><div class="paragraph-element">多喝水</div></li></ol>
			<div class="custom-code-block"><div class="code-block-header">python 复制</div><pre><code class="language-python">print("hi")
</code></pre></div>
		</div>"#;
		let doc = parse_fragment(html);
		let ctx = WalkContext::new(Arc::new(Rules::builtin().clone()));
		let blocks = Walker::site(&super::PROFILE).walk(container(&doc), &ctx).expect("walk").blocks;

		assert_eq!(blocks.len(), 3);
		let Block::List { ordered: true, items, .. } = &blocks[1] else {
			panic!("expected ordered list, got {:?}", blocks[1]);
		};
		let Block::Paragraph { runs } = &items[0][0] else {
			panic!("expected unwrapped paragraph");
		};
		assert!(runs[0].bold);
		assert_eq!(runs_text(runs), "早睡早起");
		assert_eq!(blocks[2], Block::CodeBlock { text: "print(\"hi\")".into() });
	}
}
