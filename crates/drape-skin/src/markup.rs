//! HTML fragments emitted for a cascade.

use drape_types::IeCondition;

/// `<link>` tag referencing a stylesheet.
pub fn stylesheet_link(href: &str, media: &str) -> String {
    format!(r#"<link rel="stylesheet" type="text/css" media="{media}" href="{href}" />"#)
}

/// Inline `<style>` block.
pub fn style_block(media: &str, css: &str) -> String {
    format!(r#"<style type="text/css" media="{media}">{css}</style>"#)
}

/// Wrap `content` in a legacy conditional comment, or return it unchanged
/// when there is no condition.
pub fn ie_comment(content: &str, condition: Option<IeCondition>) -> String {
    let Some(condition) = condition else {
        return content.to_string();
    };
    let mut test = String::new();
    if let Some(op) = condition.comparison() {
        test.push_str(op);
        test.push(' ');
    }
    test.push_str("IE");
    if let Some(version) = condition.version() {
        test.push_str(&format!(" {version}"));
    }
    format!("<!--[if {test}]>{content}<![endif]-->")
}
