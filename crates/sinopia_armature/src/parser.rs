//! Markup tree builder.
//!
//! This parser drives the tokenizer and builds a live [`Node`] tree. Recovery
//! is lenient: mismatched and unclosed tags are reported as [`ParseError`]s and
//! the tree is still produced.

use compact_str::CompactString;
use sinopia_carton::is_void_tag;
use sinopia_relief::Node;

use crate::errors::{ErrorCode, ParseError};
use crate::tokenizer::{Callbacks, QuoteType, Tokenizer};

/// Parser options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Keep `<!-- -->` comments as marker nodes
    pub comments: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self { comments: true }
    }
}

/// Parser context for building the tree
pub struct Parser<'a> {
    /// Source code
    source: &'a str,
    /// Parser options
    options: ParserOptions,
    /// Root fragment
    root: Node,
    /// Open elements with the offset of their start tag
    stack: Vec<(Node, usize)>,
    /// Element whose start tag is being read
    current_element: Option<CurrentElement>,
    /// Attribute whose value is being read
    current_attr: Option<CurrentAttribute>,
    /// Errors collected during parsing
    errors: Vec<ParseError>,
}

/// Current element being parsed
struct CurrentElement {
    node: Node,
    tag_start: usize,
    is_self_closing: bool,
}

/// Current attribute being parsed
struct CurrentAttribute {
    name: CompactString,
    name_start: usize,
    value: Option<(usize, usize)>,
}

impl<'a> Parser<'a> {
    /// Create a new parser
    pub fn new(source: &'a str) -> Self {
        Self::with_options(source, ParserOptions::default())
    }

    /// Create a new parser with options
    pub fn with_options(source: &'a str, options: ParserOptions) -> Self {
        Self {
            source,
            options,
            root: Node::fragment(),
            stack: Vec::new(),
            current_element: None,
            current_attr: None,
            errors: Vec::new(),
        }
    }

    /// Parse the source and return the root fragment
    pub fn parse(mut self) -> (Node, Vec<ParseError>) {
        let source = self.source;
        let mut tokenizer = Tokenizer::new(source, ParserCallbacks { parser: &mut self });
        tokenizer.tokenize();

        self.handle_unclosed_elements();
        (self.root, self.errors)
    }

    fn get_source(&self, start: usize, end: usize) -> &'a str {
        &self.source[start..end]
    }

    /// Current insertion parent (stack top or root)
    fn current_parent(&self) -> &Node {
        self.stack
            .last()
            .map(|(node, _)| node)
            .unwrap_or(&self.root)
    }

    fn add_child(&mut self, child: &Node) {
        // Freshly created nodes can never form a cycle
        let _ = self.current_parent().append_child(child);
    }

    fn handle_unclosed_elements(&mut self) {
        while let Some((_, start)) = self.stack.pop() {
            self.errors
                .push(ParseError::new(ErrorCode::MissingEndTag, start));
        }
    }

    fn on_text_impl(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let raw = self.get_source(start, end);
        let in_raw_text = self
            .stack
            .last()
            .and_then(|(node, _)| node.tag())
            .is_some_and(|tag| sinopia_carton::is_raw_text_tag(&tag));
        let content: CompactString = if in_raw_text {
            raw.into()
        } else {
            htmlize::unescape(raw).as_ref().into()
        };

        // Merge with a preceding text node split by a skipped declaration
        if let Some(last) = self.current_parent().last_child() {
            if last.is_text() {
                let mut merged = last.node_value();
                merged.push_str(&content);
                last.set_node_value(merged);
                return;
            }
        }
        let text = Node::text(content);
        self.add_child(&text);
    }

    fn on_open_tag_name_impl(&mut self, start: usize, end: usize) {
        let tag = self.get_source(start, end);
        self.current_element = Some(CurrentElement {
            node: Node::element(tag),
            tag_start: start.saturating_sub(1),
            is_self_closing: false,
        });
    }

    fn on_open_tag_end_impl(&mut self, _end: usize) {
        let Some(element) = self.current_element.take() else {
            return;
        };
        self.add_child(&element.node);

        let is_void = element
            .node
            .tag()
            .is_some_and(|tag| is_void_tag(&tag.to_ascii_lowercase()));
        if !is_void && !element.is_self_closing {
            self.stack.push((element.node, element.tag_start));
        }
    }

    fn on_self_closing_tag_impl(&mut self, _end: usize) {
        if let Some(ref mut element) = self.current_element {
            element.is_self_closing = true;
        }
    }

    fn on_close_tag_impl(&mut self, start: usize, end: usize) {
        let tag = self.get_source(start, end);

        let found = self.stack.iter().rposition(|(node, _)| {
            node.tag()
                .is_some_and(|open| open.eq_ignore_ascii_case(tag))
        });

        match found {
            Some(index) => {
                // Everything opened after the match was left unclosed
                while self.stack.len() > index + 1 {
                    if let Some((_, open_start)) = self.stack.pop() {
                        self.errors
                            .push(ParseError::new(ErrorCode::MissingEndTag, open_start));
                    }
                }
                self.stack.pop();
            }
            None => {
                if !is_void_tag(&tag.to_ascii_lowercase()) {
                    self.errors.push(ParseError::new(
                        ErrorCode::InvalidEndTag,
                        start.saturating_sub(2),
                    ));
                }
            }
        }
    }

    fn on_attrib_name_impl(&mut self, start: usize, end: usize) {
        self.current_attr = Some(CurrentAttribute {
            name: self.get_source(start, end).into(),
            name_start: start,
            value: None,
        });
    }

    fn on_attrib_data_impl(&mut self, start: usize, end: usize) {
        if let Some(ref mut attr) = self.current_attr {
            attr.value = Some((start, end));
        }
    }

    fn on_attrib_end_impl(&mut self, _quote: QuoteType, _end: usize) {
        let Some(attr) = self.current_attr.take() else {
            return;
        };
        let Some(ref element) = self.current_element else {
            return;
        };

        if element.node.has_attribute(&attr.name) {
            self.errors.push(ParseError::new(
                ErrorCode::DuplicateAttribute,
                attr.name_start,
            ));
            return;
        }

        let value: CompactString = match attr.value {
            Some((start, end)) => htmlize::unescape_attribute(self.get_source(start, end))
                .as_ref()
                .into(),
            None => CompactString::default(),
        };
        element.node.set_attribute(&attr.name, value);
    }

    fn on_comment_impl(&mut self, start: usize, end: usize) {
        if !self.options.comments {
            return;
        }
        let marker = Node::marker(self.get_source(start, end));
        self.add_child(&marker);
    }

    fn on_error_impl(&mut self, code: ErrorCode, index: usize) {
        self.errors.push(ParseError::new(code, index));
    }
}

/// Wrapper struct for implementing Callbacks
struct ParserCallbacks<'a, 'p> {
    parser: &'p mut Parser<'a>,
}

impl Callbacks for ParserCallbacks<'_, '_> {
    fn on_text(&mut self, start: usize, end: usize) {
        self.parser.on_text_impl(start, end);
    }

    fn on_open_tag_name(&mut self, start: usize, end: usize) {
        self.parser.on_open_tag_name_impl(start, end);
    }

    fn on_open_tag_end(&mut self, end: usize) {
        self.parser.on_open_tag_end_impl(end);
    }

    fn on_self_closing_tag(&mut self, end: usize) {
        self.parser.on_self_closing_tag_impl(end);
        self.parser.on_open_tag_end_impl(end);
    }

    fn on_close_tag(&mut self, start: usize, end: usize) {
        self.parser.on_close_tag_impl(start, end);
    }

    fn on_attrib_name(&mut self, start: usize, end: usize) {
        self.parser.on_attrib_name_impl(start, end);
    }

    fn on_attrib_data(&mut self, start: usize, end: usize) {
        self.parser.on_attrib_data_impl(start, end);
    }

    fn on_attrib_end(&mut self, quote: QuoteType, end: usize) {
        self.parser.on_attrib_end_impl(quote, end);
    }

    fn on_comment(&mut self, start: usize, end: usize) {
        self.parser.on_comment_impl(start, end);
    }

    fn on_end(&mut self) {}

    fn on_error(&mut self, code: ErrorCode, index: usize) {
        self.parser.on_error_impl(code, index);
    }
}

/// Parse markup into a fragment
pub fn parse(source: &str) -> (Node, Vec<ParseError>) {
    Parser::new(source).parse()
}

/// Parse markup with options
pub fn parse_with_options(source: &str, options: ParserOptions) -> (Node, Vec<ParseError>) {
    Parser::with_options(source, options).parse()
}

/// Parse template markup.
///
/// When the markup is a single `<template>` element (surrounding whitespace
/// aside), its children become the content; otherwise this is [`parse`].
pub fn parse_template(source: &str, options: ParserOptions) -> (Node, Vec<ParseError>) {
    let (root, errors) = parse_with_options(source, options);

    let meaningful: Vec<Node> = root
        .children()
        .into_iter()
        .filter(|child| !(child.is_text() && sinopia_carton::is_whitespace_only(&child.node_value())))
        .collect();

    if let [only] = meaningful.as_slice() {
        if only.tag().is_some_and(|tag| tag.eq_ignore_ascii_case("template")) {
            let content = Node::fragment();
            for child in only.children() {
                let _ = content.append_child(&child);
            }
            return (content, errors);
        }
    }
    (root, errors)
}
