//! Token scanner.
//!
//! Finds `{{ expression }}` tokens in text nodes and isolates each one as its
//! own placeholder marker so it can be addressed by path.

use compact_str::CompactString;
use once_cell::sync::Lazy;
use regex::Regex;
use sinopia_relief::Node;

/// Data carried by a token placeholder in compiled content.
pub const TOKEN_MARKER: &str = "sinopia:token";

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{(.*?)\}\}").unwrap());

/// A token found in text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMatch {
    /// Byte offset of `{{`
    pub start: usize,
    /// Byte offset after `}}`
    pub end: usize,
    /// Trimmed text between the braces
    pub expression: CompactString,
}

/// First token in `text`, if any.
pub fn find_token(text: &str) -> Option<TokenMatch> {
    let captures = TOKEN_RE.captures(text)?;
    let whole = captures.get(0)?;
    Some(TokenMatch {
        start: whole.start(),
        end: whole.end(),
        expression: captures.get(1).map_or("", |m| m.as_str()).trim().into(),
    })
}

/// Every token in `text`, left to right.
pub fn find_tokens(text: &str) -> Vec<TokenMatch> {
    TOKEN_RE
        .captures_iter(text)
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            Some(TokenMatch {
                start: whole.start(),
                end: whole.end(),
                expression: captures.get(1).map_or("", |m| m.as_str()).trim().into(),
            })
        })
        .collect()
}

#[inline]
pub fn has_token(text: &str) -> bool {
    TOKEN_RE.is_match(text)
}

/// Replace an empty text node with an empty marker. Returns the node now
/// occupying that position.
pub fn normalize_empty_text(node: &Node) -> Node {
    if node.is_text() && node.node_value().is_empty() {
        let marker = Node::marker("");
        if node.replace_with(&marker).is_ok() {
            return marker;
        }
    }
    node.clone()
}

/// Split `text` so every token becomes a [`TOKEN_MARKER`] placeholder.
///
/// Returns each placeholder with its token in source order. Literal segments
/// stay as text nodes; empty segments become empty markers. Scanning resumes
/// on the untouched remainder after each split, so adjacent tokens are each
/// found exactly once.
pub fn split_tokens(text: &Node) -> Vec<(Node, TokenMatch)> {
    let mut found = Vec::new();
    if !text.is_text() || text.parent().is_none() {
        return found;
    }

    let mut current = text.clone();
    while let Some(token) = find_token(&current.node_value()) {
        let token_len = token.end - token.start;

        let Ok(token_node) = current.split_text(token.start) else {
            break;
        };
        normalize_empty_text(&current);

        let Ok(rest) = token_node.split_text(token_len) else {
            break;
        };
        let placeholder = Node::marker(TOKEN_MARKER);
        if token_node.replace_with(&placeholder).is_err() {
            break;
        }
        found.push((placeholder, token));

        if !has_token(&rest.node_value()) {
            normalize_empty_text(&rest);
            break;
        }
        current = rest;
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(parent: &Node) -> Vec<String> {
        parent
            .children()
            .iter()
            .map(|child| {
                if child.is_text() {
                    format!("text:{}", child.node_value())
                } else {
                    format!("marker:{}", child.node_value())
                }
            })
            .collect()
    }

    #[test]
    fn test_find_tokens() {
        let tokens = find_tokens("a {{ x }} b {{y.z}}");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].expression, "x");
        assert_eq!((tokens[0].start, tokens[0].end), (2, 9));
        assert_eq!(tokens[1].expression, "y.z");
    }

    #[test]
    fn test_lazy_match() {
        let token = find_token("{{ a }}}}").unwrap();
        assert_eq!(token.expression, "a");
        assert_eq!(token.end, 7);
    }

    #[test]
    fn test_split_keeps_literal_segments() {
        let parent = Node::element("p");
        let text = Node::text("Hello {{ name }}, you have {{count}} items");
        parent.append_child(&text).unwrap();

        let found = split_tokens(&text);
        assert_eq!(found.len(), 2);
        assert_eq!(
            shape(&parent),
            vec![
                "text:Hello ",
                "marker:sinopia:token",
                "text:, you have ",
                "marker:sinopia:token",
                "text: items",
            ]
        );
    }

    #[test]
    fn test_split_adjacent_tokens_normalizes_empty_segments() {
        let parent = Node::element("p");
        let text = Node::text("{{a}}{{b}}");
        parent.append_child(&text).unwrap();

        let found = split_tokens(&text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].1.expression, "b");
        assert_eq!(
            shape(&parent),
            vec![
                "marker:",
                "marker:sinopia:token",
                "marker:",
                "marker:sinopia:token",
                "marker:",
            ]
        );
    }

    #[test]
    fn test_no_token_is_untouched() {
        let parent = Node::element("p");
        let text = Node::text("plain {{ text");
        parent.append_child(&text).unwrap();

        assert!(split_tokens(&text).is_empty());
        assert_eq!(shape(&parent), vec!["text:plain {{ text"]);
    }
}
