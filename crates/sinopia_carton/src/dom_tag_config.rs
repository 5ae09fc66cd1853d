//! HTML tag tables.

use phf::phf_set;

/// Elements that never have children or a closing tag.
static VOID_TAGS: phf::Set<&'static str> = phf_set! {
    "area", "base", "br", "col", "embed", "hr", "img", "input",
    "link", "meta", "param", "source", "track", "wbr",
};

/// Elements whose content is raw text and must not be entity-decoded or tokenized.
static RAW_TEXT_TAGS: phf::Set<&'static str> = phf_set! {
    "script", "style",
};

/// Check if a tag is a void element (`<br>`, `<img>`, ...).
#[inline]
pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(tag) || VOID_TAGS.contains(tag.to_ascii_lowercase().as_str())
}

/// Check if a tag holds raw text content.
#[inline]
pub fn is_raw_text_tag(tag: &str) -> bool {
    RAW_TEXT_TAGS.contains(tag.to_ascii_lowercase().as_str())
}
