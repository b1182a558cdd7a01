use super::SiteProfile;

pub(crate) static PROFILE: SiteProfile = SiteProfile {
	key: "deepseek",
	fingerprints: &["ds-markdown"],
	rejected: &["flow-markdown-body", "segment-content-box", "markdown-container", "hyc-common-markdown", "hyc-content-md", "markdown prose"],
	paragraph_classes: &["ds-markdown-paragraph"],
	p_is_paragraph: true,
	code_classes: &["md-code-block"],
	table_wrappers: &["markdown-table-wrapper"],
	control_classes: &["md-code-block-banner", "ds-icon-button", "ds-markdown-cite"],
};
