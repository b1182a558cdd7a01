use super::SiteProfile;

pub(crate) static PROFILE: SiteProfile = SiteProfile {
	key: "kimi",
	fingerprints: &["segment-content-box", "markdown-container"],
	rejected: &["ds-markdown", "flow-markdown-body", "hyc-common-markdown", "hyc-content-md", "markdown prose"],
	paragraph_classes: &["paragraph"],
	p_is_paragraph: true,
	code_classes: &["segment-code"],
	table_wrappers: &["table-container"],
	control_classes: &["segment-assistant-actions", "segment-code-header", "table-actions", "rag-tag"],
};

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use crate::config::Rules;
	use crate::document::{Block, runs_text};
	use crate::dom::{container, parse_fragment};
	use crate::walkers::{WalkContext, Walker};

	#[test]
	fn paragraph_divs_links_and_table() {
		let html = r#"<div class="markdown-container"><div class="markdown">
			<div class="paragraph">详见 <a href="https://kimi.moonshot.cn/docs" title="文档">官方文档</a><span class="rag-tag">1</span></div>
			<div class="table-container"><div class="table-actions">复制</div><table><tr><th>模型</th><th>上下文</th></tr><tr><td>k1</td><td>128k</td></tr></table></div>
			<div class="segment-assistant-actions"><span>复制</span><span>分享</span></div>
		</div></div>"#;
		let doc = parse_fragment(html);
		let ctx = WalkContext::new(Arc::new(Rules::builtin().clone()));
		let blocks = Walker::site(&super::PROFILE).walk(container(&doc), &ctx).expect("walk").blocks;

		assert_eq!(blocks.len(), 2);
		let Block::Paragraph { runs } = &blocks[0] else {
			panic!("expected paragraph");
		};
		assert_eq!(runs_text(runs), "详见 官方文档");
		assert_eq!(runs[1].link.as_ref().map(|l| l.href.as_str()), Some("https://kimi.moonshot.cn/docs"));
		let Block::Table { rows } = &blocks[1] else {
			panic!("expected table");
		};
		assert_eq!(rows.len(), 2);
		assert!(rows[0].iter().all(|c| c.is_header));
	}
}
