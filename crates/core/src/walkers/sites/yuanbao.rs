use super::SiteProfile;

pub(crate) static PROFILE: SiteProfile = SiteProfile {
	key: "yuanbao",
	fingerprints: &["hyc-common-markdown", "hyc-content-md"],
	rejected: &["ds-markdown", "flow-markdown-body", "segment-content-box", "markdown-container", "markdown prose"],
	paragraph_classes: &[],
	p_is_paragraph: true,
	code_classes: &["hyc-common-markdown__code"],
	table_wrappers: &["hyc-common-markdown__table-wrapper"],
	control_classes: &["hyc-common-markdown__code__hd", "hyc-common-markdown__table-tools", "hyc-common-markdown__ref", "agent-chat__toolbar"],
};

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use crate::config::Rules;
	use crate::document::Block;
	use crate::dom::{container, parse_fragment};
	use crate::walkers::{WalkContext, Walker};

	#[test]
	fn code_banner_and_references_are_skipped() {
		let html = r#"<div class="hyc-content-md"><div class="hyc-common-markdown">
			<p>结论如下<span class="hyc-common-markdown__ref">[1]</span></p>
			<div class="hyc-common-markdown__code"><div class="hyc-common-markdown__code__hd"><span>rust</span><span>复制</span></div><pre><code>let x = 1;</code></pre></div>
			<div class="agent-chat__toolbar"><span>重新生成</span></div>
		</div></div>"#;
		let doc = parse_fragment(html);
		let ctx = WalkContext::new(Arc::new(Rules::builtin().clone()));
		let blocks = Walker::site(&super::PROFILE).walk(container(&doc), &ctx).expect("walk").blocks;

		assert_eq!(blocks, vec![Block::paragraph("结论如下"), Block::CodeBlock { text: "let x = 1;".into() }]);
	}
}
