//! Markup tokenizer.
//!
//! A byte-level state machine in the style of htmlparser2: it never allocates,
//! it only reports spans of the input through [`Callbacks`]. Token (`{{ }}`)
//! detection is not done here; text spans are reported verbatim and scanned
//! later by the template compiler.

use sinopia_carton::is_raw_text_tag;

use crate::errors::ErrorCode;

/// Character codes for fast comparison
pub mod char_codes {
    pub const TAB: u8 = 0x09;
    pub const NEWLINE: u8 = 0x0A;
    pub const FORM_FEED: u8 = 0x0C;
    pub const CARRIAGE_RETURN: u8 = 0x0D;
    pub const SPACE: u8 = 0x20;
    pub const EXCLAMATION_MARK: u8 = 0x21;
    pub const DOUBLE_QUOTE: u8 = 0x22;
    pub const SINGLE_QUOTE: u8 = 0x27;
    pub const DASH: u8 = 0x2D;
    pub const SLASH: u8 = 0x2F;
    pub const LT: u8 = 0x3C;
    pub const EQ: u8 = 0x3D;
    pub const GT: u8 = 0x3E;
    pub const UPPER_A: u8 = 0x41;
    pub const UPPER_Z: u8 = 0x5A;
    pub const LOWER_A: u8 = 0x61;
    pub const LOWER_Z: u8 = 0x7A;
}

use char_codes::*;

/// All the states the tokenizer can be in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum State {
    Text = 1,

    // Tags
    BeforeTagName,
    InTagName,
    InSelfClosingTag,
    BeforeClosingTagName,
    InClosingTagName,
    AfterClosingTagName,

    // Attributes
    BeforeAttrName,
    InAttrName,
    AfterAttrName,
    BeforeAttrValue,
    InAttrValueDq,
    InAttrValueSq,
    InAttrValueNq,

    // Declarations, comments
    BeforeDeclaration,
    InDeclaration,
    InComment,

    // <script>, <style>
    InRawText,
}

/// Quote type for attribute values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum QuoteType {
    NoValue = 0,
    Unquoted = 1,
    Single = 2,
    Double = 3,
}

/// Tokenizer callbacks
pub trait Callbacks {
    fn on_text(&mut self, start: usize, end: usize);

    fn on_open_tag_name(&mut self, start: usize, end: usize);
    fn on_open_tag_end(&mut self, end: usize);
    fn on_self_closing_tag(&mut self, end: usize);
    fn on_close_tag(&mut self, start: usize, end: usize);

    fn on_attrib_name(&mut self, start: usize, end: usize);
    fn on_attrib_data(&mut self, start: usize, end: usize);
    fn on_attrib_end(&mut self, quote: QuoteType, end: usize);

    fn on_comment(&mut self, start: usize, end: usize);

    fn on_end(&mut self);
    fn on_error(&mut self, code: ErrorCode, index: usize);
}

/// Check if character is a tag start character (a-z, A-Z)
#[inline]
pub fn is_tag_start_char(c: u8) -> bool {
    (LOWER_A..=LOWER_Z).contains(&c) || (UPPER_A..=UPPER_Z).contains(&c)
}

/// Check if character is whitespace
#[inline]
pub fn is_whitespace(c: u8) -> bool {
    c == SPACE || c == NEWLINE || c == TAB || c == FORM_FEED || c == CARRIAGE_RETURN
}

/// Check if character ends a tag section
#[inline]
pub fn is_end_of_tag_section(c: u8) -> bool {
    c == SLASH || c == GT || is_whitespace(c)
}

/// Markup tokenizer
pub struct Tokenizer<'a, C: Callbacks> {
    /// Input source
    input: &'a [u8],
    /// Current state
    state: State,
    /// Buffer start position
    section_start: usize,
    /// Current index
    index: usize,
    /// Span of the most recent open tag name
    tag_name: (usize, usize),
    /// Position of a `<` not yet known to open a tag
    pending_lt: usize,
    /// Callbacks
    callbacks: C,
}

impl<'a, C: Callbacks> Tokenizer<'a, C> {
    /// Create a new tokenizer
    pub fn new(input: &'a str, callbacks: C) -> Self {
        Self {
            input: input.as_bytes(),
            state: State::Text,
            section_start: 0,
            index: 0,
            tag_name: (0, 0),
            pending_lt: 0,
            callbacks,
        }
    }

    /// Consume the tokenizer, returning the callbacks.
    pub fn into_callbacks(self) -> C {
        self.callbacks
    }

    /// Run the state machine over the whole input.
    pub fn tokenize(&mut self) {
        while self.index < self.input.len() {
            let c = self.input[self.index];
            self.step(c);
            self.index += 1;
        }
        self.cleanup();
        self.callbacks.on_end();
    }

    fn step(&mut self, c: u8) {
        match self.state {
            State::Text => self.state_text(c),
            State::BeforeTagName => self.state_before_tag_name(c),
            State::InTagName => self.state_in_tag_name(c),
            State::InSelfClosingTag => self.state_in_self_closing_tag(c),
            State::BeforeClosingTagName => self.state_before_closing_tag_name(c),
            State::InClosingTagName => self.state_in_closing_tag_name(c),
            State::AfterClosingTagName => self.state_after_closing_tag_name(c),
            State::BeforeAttrName => self.state_before_attr_name(c),
            State::InAttrName => self.state_in_attr_name(c),
            State::AfterAttrName => self.state_after_attr_name(c),
            State::BeforeAttrValue => self.state_before_attr_value(c),
            State::InAttrValueDq => self.state_in_attr_value_quoted(c, DOUBLE_QUOTE),
            State::InAttrValueSq => self.state_in_attr_value_quoted(c, SINGLE_QUOTE),
            State::InAttrValueNq => self.state_in_attr_value_nq(c),
            State::BeforeDeclaration => self.state_before_declaration(c),
            State::InDeclaration => self.state_in_declaration(c),
            State::InComment => self.state_in_comment(c),
            State::InRawText => self.state_in_raw_text(c),
        }
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.input.get(self.index + offset).copied()
    }

    fn state_text(&mut self, c: u8) {
        if c == LT {
            self.pending_lt = self.index;
            self.state = State::BeforeTagName;
        }
    }

    /// Emit the text preceding a `<` that turned out to open markup.
    fn flush_pending_text(&mut self) {
        if self.pending_lt > self.section_start {
            self.callbacks.on_text(self.section_start, self.pending_lt);
        }
    }

    fn state_before_tag_name(&mut self, c: u8) {
        if c == EXCLAMATION_MARK {
            self.flush_pending_text();
            self.state = State::BeforeDeclaration;
            self.section_start = self.index + 1;
        } else if c == SLASH {
            self.flush_pending_text();
            self.state = State::BeforeClosingTagName;
        } else if is_tag_start_char(c) {
            self.flush_pending_text();
            self.state = State::InTagName;
            self.section_start = self.index;
        } else {
            // Not a tag: the `<` stays part of the current text run
            self.state = State::Text;
            self.state_text(c);
        }
    }

    fn state_in_tag_name(&mut self, c: u8) {
        if is_end_of_tag_section(c) {
            self.tag_name = (self.section_start, self.index);
            self.callbacks.on_open_tag_name(self.section_start, self.index);
            self.state = State::BeforeAttrName;
            self.state_before_attr_name(c);
        }
    }

    fn state_before_attr_name(&mut self, c: u8) {
        if c == GT {
            self.callbacks.on_open_tag_end(self.index);
            self.section_start = self.index + 1;
            self.state = if self.in_raw_text_tag() {
                State::InRawText
            } else {
                State::Text
            };
        } else if c == SLASH {
            self.state = State::InSelfClosingTag;
        } else if !is_whitespace(c) {
            self.state = State::InAttrName;
            self.section_start = self.index;
        }
    }

    fn in_raw_text_tag(&self) -> bool {
        let (start, end) = self.tag_name;
        std::str::from_utf8(&self.input[start..end]).is_ok_and(is_raw_text_tag)
    }

    fn state_in_self_closing_tag(&mut self, c: u8) {
        if c == GT {
            self.callbacks.on_self_closing_tag(self.index);
            self.state = State::Text;
            self.section_start = self.index + 1;
        } else if !is_whitespace(c) {
            self.state = State::BeforeAttrName;
            self.state_before_attr_name(c);
        }
    }

    fn state_in_attr_name(&mut self, c: u8) {
        if c == EQ || is_end_of_tag_section(c) {
            self.callbacks.on_attrib_name(self.section_start, self.index);
            self.state = State::AfterAttrName;
            self.state_after_attr_name(c);
        }
    }

    fn state_after_attr_name(&mut self, c: u8) {
        if c == EQ {
            self.state = State::BeforeAttrValue;
        } else if c == SLASH || c == GT {
            self.callbacks.on_attrib_end(QuoteType::NoValue, self.index);
            self.state = State::BeforeAttrName;
            self.state_before_attr_name(c);
        } else if !is_whitespace(c) {
            self.callbacks.on_attrib_end(QuoteType::NoValue, self.index);
            self.state = State::InAttrName;
            self.section_start = self.index;
        }
    }

    fn state_before_attr_value(&mut self, c: u8) {
        if c == DOUBLE_QUOTE {
            self.state = State::InAttrValueDq;
            self.section_start = self.index + 1;
        } else if c == SINGLE_QUOTE {
            self.state = State::InAttrValueSq;
            self.section_start = self.index + 1;
        } else if !is_whitespace(c) {
            self.section_start = self.index;
            self.state = State::InAttrValueNq;
            self.state_in_attr_value_nq(c);
        }
    }

    fn state_in_attr_value_quoted(&mut self, c: u8, quote: u8) {
        if c == quote {
            self.callbacks.on_attrib_data(self.section_start, self.index);
            let quote_type = if quote == DOUBLE_QUOTE {
                QuoteType::Double
            } else {
                QuoteType::Single
            };
            self.callbacks.on_attrib_end(quote_type, self.index + 1);
            self.state = State::BeforeAttrName;
        }
    }

    fn state_in_attr_value_nq(&mut self, c: u8) {
        if is_whitespace(c) || c == GT {
            self.callbacks.on_attrib_data(self.section_start, self.index);
            self.callbacks.on_attrib_end(QuoteType::Unquoted, self.index);
            self.state = State::BeforeAttrName;
            self.state_before_attr_name(c);
        }
    }

    fn state_before_closing_tag_name(&mut self, c: u8) {
        if is_tag_start_char(c) {
            self.state = State::InClosingTagName;
            self.section_start = self.index;
        } else if c == GT {
            self.callbacks.on_error(ErrorCode::MissingEndTagName, self.index);
            self.state = State::Text;
            self.section_start = self.index + 1;
        } else {
            // Bogus comment such as `</ foo>`: skip to the next `>`
            self.state = State::InDeclaration;
        }
    }

    fn state_in_closing_tag_name(&mut self, c: u8) {
        if c == GT || is_whitespace(c) {
            self.callbacks.on_close_tag(self.section_start, self.index);
            self.state = State::AfterClosingTagName;
            self.state_after_closing_tag_name(c);
        }
    }

    fn state_after_closing_tag_name(&mut self, c: u8) {
        if c == GT {
            self.state = State::Text;
            self.section_start = self.index + 1;
        }
    }

    fn state_before_declaration(&mut self, c: u8) {
        if c == DASH && self.peek(1) == Some(DASH) {
            self.index += 1;
            self.state = State::InComment;
            self.section_start = self.index + 1;
        } else {
            self.state = State::InDeclaration;
            self.state_in_declaration(c);
        }
    }

    fn state_in_declaration(&mut self, c: u8) {
        if c == GT {
            self.state = State::Text;
            self.section_start = self.index + 1;
        }
    }

    fn state_in_comment(&mut self, c: u8) {
        if c == DASH && self.peek(1) == Some(DASH) && self.peek(2) == Some(GT) {
            self.callbacks.on_comment(self.section_start, self.index);
            self.index += 2;
            self.state = State::Text;
            self.section_start = self.index + 1;
        }
    }

    fn state_in_raw_text(&mut self, c: u8) {
        if c != LT || self.peek(1) != Some(SLASH) {
            return;
        }
        let (start, end) = self.tag_name;
        let name = &self.input[start..end];
        let candidate_start = self.index + 2;
        let candidate_end = candidate_start + name.len();
        let matches = self
            .input
            .get(candidate_start..candidate_end)
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name))
            && self
                .input
                .get(candidate_end)
                .map_or(true, |&next| is_end_of_tag_section(next));

        if matches {
            self.pending_lt = self.index;
            self.flush_pending_text();
            self.index += 1;
            self.state = State::BeforeClosingTagName;
        }
    }

    fn cleanup(&mut self) {
        let len = self.input.len();
        match self.state {
            State::Text | State::InRawText | State::BeforeTagName => {
                if self.section_start < len {
                    self.callbacks.on_text(self.section_start, len);
                }
            }
            State::InComment => {
                self.callbacks.on_error(ErrorCode::EofInComment, len);
                if self.section_start <= len {
                    self.callbacks.on_comment(self.section_start, len);
                }
            }
            State::InDeclaration | State::BeforeDeclaration => {}
            _ => self.callbacks.on_error(ErrorCode::EofInTag, len),
        }
    }
}
