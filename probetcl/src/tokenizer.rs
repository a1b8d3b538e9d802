//! The script lexer.
//!
//! The tokenizer walks a script buffer one field at a time, classifying each
//! step as a complete word ([`Token::Field`]), a fragment of a word that is
//! still open ([`Token::Partial`]), a command terminator
//! ([`Token::ExecPoint`]), or a lexical error ([`Token::Error`]); iterator
//! exhaustion marks the end of the buffer.  The evaluator concatenates the
//! substituted `Partial` fragments of a word until a `Field` closes it.
//!
//! The returned spans are raw slices of the input: quoting is *not* resolved
//! here.  A braced or bracketed field keeps its delimiters; backslash escapes
//! are consumed verbatim.  Interpretation happens during substitution, which
//! needs the raw form to decide how to expand each fragment.
//!
//! Once the tokenizer reports an error it stays in that state; further calls
//! return [`Token::Error`] without consuming input.

/// One lexed step of a script.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Token<'a> {
    /// A complete word (or the final fragment of one).
    Field(&'a str),

    /// A fragment of a word that continues in the next token.
    Partial(&'a str),

    /// An unquoted command terminator: newline, carriage return, semicolon,
    /// or NUL.
    ExecPoint,

    /// A lexical error; the tokenizer has stopped.
    Error,
}

/// Characters that separate words within a command.
pub(crate) fn is_space(c: u8) -> bool {
    c == b' ' || c == b'\t'
}

/// Characters that terminate a command.
fn is_terminator(c: u8) -> bool {
    matches!(c, b'\n' | b'\r' | b';' | 0)
}

/// Characters that end a word when unquoted.
fn is_splice_end(c: u8) -> bool {
    is_space(c) || is_terminator(c)
}

/// Characters that end a variable name, beyond the generic special set.
/// These are the expression operators, so that `$a+$b` splits cleanly.
fn is_operator(c: u8) -> bool {
    matches!(
        c,
        b'+' | b'-' | b'*' | b'/' | b'%' | b'<' | b'>' | b'=' | b'!' | b'&' | b'|' | b'^'
            | b'~' | b'?' | b':' | b')'
    )
}

/// Characters that are special in any mode (quoted or not).
fn is_special(c: u8) -> bool {
    matches!(c, b'[' | b']' | b'"' | b'\\' | b'$' | 0)
}

pub(crate) struct Tokenizer<'a> {
    text: &'a str,
    pos: usize,

    // Start of the most recently returned fragment.
    start: usize,

    // Inside a quoted section.
    quote: bool,

    // A '#' at this position starts a comment (start of buffer or start of
    // a command; cleared once a field has been seen).
    comment_ok: bool,

    // Terminal error state.
    failed: bool,

    // The failure was caused by running out of input (open quote, brace,
    // bracket, or escape), i.e. the script is incomplete rather than
    // malformed.
    truncated: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            start: 0,
            quote: false,
            comment_ok: true,
            failed: false,
            truncated: false,
        }
    }

    /// Byte offset of the start of the most recently returned fragment.
    pub fn token_start(&self) -> usize {
        self.start
    }

    /// Whether the whole buffer has been consumed.
    pub fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    /// Whether a reported error was caused by the buffer ending inside an
    /// open construct (used by completeness checking).
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    fn mark_failed(&mut self, truncated: bool) -> bool {
        self.failed = true;
        self.truncated |= truncated;
        false
    }

    /// Consumes a balanced `open`…`close` region starting at the current
    /// position.  Backslash-escaped characters are skipped without counting
    /// toward the nesting depth.
    fn consume_delimited(&mut self, open: u8, close: u8) -> bool {
        let bytes = self.text.as_bytes();
        let mut depth = 0usize;

        while self.pos < bytes.len() {
            let c = bytes[self.pos];
            if c == b'\\' {
                if !self.skip_escape() {
                    return false;
                }
                continue;
            }
            if c == open {
                depth += 1;
            } else if c == close {
                depth -= 1;
                if depth == 0 {
                    self.pos += 1;
                    return true;
                }
            }
            self.pos += 1;
        }

        self.mark_failed(true)
    }

    /// Advances past one backslash escape: `\x` plus two hex digits is four
    /// characters, anything else is the backslash plus one character
    /// (a whole character, not byte, so multi-byte input can't be split).
    fn skip_escape(&mut self) -> bool {
        let bytes = self.text.as_bytes();
        debug_assert_eq!(bytes[self.pos], b'\\');

        let Some(next) = self.text[self.pos + 1..].chars().next() else {
            return self.mark_failed(true);
        };

        if next == 'x'
            && self.pos + 3 < bytes.len()
            && bytes[self.pos + 2].is_ascii_hexdigit()
            && bytes[self.pos + 3].is_ascii_hexdigit()
        {
            self.pos += 4;
        } else if next == '\r' && bytes.get(self.pos + 2) == Some(&b'\n') {
            // Line continuation across a CRLF pair.
            self.pos += 3;
        } else {
            self.pos += 1 + next.len_utf8();
        }
        true
    }

    /// Consumes a parenthesized array index: a balanced `(`…`)` region whose
    /// interior may contain escaped characters and nested bracket or brace
    /// regions.
    fn consume_index(&mut self) -> bool {
        let bytes = self.text.as_bytes();
        let mut depth = 0usize;

        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b'\\' => {
                    if !self.skip_escape() {
                        return false;
                    }
                }
                b'[' => {
                    if !self.consume_delimited(b'[', b']') {
                        return false;
                    }
                }
                b'{' => {
                    if !self.consume_delimited(b'{', b'}') {
                        return false;
                    }
                }
                b'(' => {
                    depth += 1;
                    self.pos += 1;
                }
                b')' => {
                    depth -= 1;
                    self.pos += 1;
                    if depth == 0 {
                        return true;
                    }
                }
                _ => self.pos += 1,
            }
        }

        self.mark_failed(true)
    }

    /// Consumes a `$` variable splice: sigil (possibly doubled), then a
    /// braced/bracketed name or a bare identifier, then an optional
    /// parenthesized index.
    fn consume_splice(&mut self) -> bool {
        let bytes = self.text.as_bytes();
        debug_assert_eq!(bytes[self.pos], b'$');
        self.pos += 1;

        // Doubled sigil: double dereference.
        if bytes.get(self.pos) == Some(&b'$') {
            self.pos += 1;
        }

        let Some(&c) = bytes.get(self.pos) else {
            return self.mark_failed(true);
        };

        // The name may not start with whitespace or a quote.
        if is_space(c) || c == b'"' {
            return self.mark_failed(false);
        }

        match c {
            b'{' => {
                if !self.consume_delimited(b'{', b'}') {
                    return false;
                }
            }
            b'[' => {
                if !self.consume_delimited(b'[', b']') {
                    return false;
                }
            }
            _ => {
                let name_start = self.pos;
                while self.pos < bytes.len() {
                    let c = bytes[self.pos];
                    if c == b'(' {
                        break;
                    }
                    if is_splice_end(c) || is_special(c) || is_operator(c)
                        || c == b'{' || c == b'}'
                    {
                        break;
                    }
                    self.pos += 1;
                }
                if self.pos == name_start {
                    return self.mark_failed(false);
                }
            }
        }

        // Optional array index.
        if bytes.get(self.pos) == Some(&b'(') {
            return self.consume_index();
        }
        true
    }

    /// Consumes an ordinary run of word characters.
    fn consume_run(&mut self) {
        let bytes = self.text.as_bytes();
        while self.pos < bytes.len() {
            let c = bytes[self.pos];
            if is_special(c) {
                break;
            }
            if !self.quote && (c == b'{' || c == b'}' || is_splice_end(c)) {
                break;
            }
            self.pos += 1;
        }
    }

    fn word_token(&mut self) -> Token<'a> {
        let word = &self.text[self.start..self.pos];
        self.comment_ok = false;

        if self.quote {
            return Token::Partial(word);
        }

        match self.text.as_bytes().get(self.pos) {
            None => Token::Field(word),
            Some(&c) if is_splice_end(c) => Token::Field(word),
            Some(_) => Token::Partial(word),
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if self.failed {
            return Some(Token::Error);
        }

        let bytes = self.text.as_bytes();

        if !self.quote {
            while self.pos < bytes.len() && is_space(bytes[self.pos]) {
                self.pos += 1;
            }
        }

        if self.pos >= bytes.len() {
            if self.quote {
                self.mark_failed(true);
                return Some(Token::Error);
            }
            return None;
        }

        // A comment runs to the end of the line; the line terminator itself
        // is reported as the execution point.
        if !self.quote && self.comment_ok && bytes[self.pos] == b'#' {
            while self.pos < bytes.len() && !matches!(bytes[self.pos], b'\n' | b'\r') {
                self.pos += 1;
            }
            if self.pos >= bytes.len() {
                return None;
            }
        }

        let c = bytes[self.pos];

        if !self.quote && is_terminator(c) {
            self.pos += 1;
            self.comment_ok = true;
            return Some(Token::ExecPoint);
        }

        self.start = self.pos;

        let ok = match c {
            b']' => self.mark_failed(false),
            b'}' if !self.quote => self.mark_failed(false),
            b'$' => self.consume_splice(),
            b'[' => self.consume_delimited(b'[', b']'),
            b'{' if !self.quote => self.consume_delimited(b'{', b'}'),
            b'"' => {
                self.pos += 1;
                self.quote = !self.quote;
                self.comment_ok = false;
                if self.quote {
                    // An empty fragment opens the word; tokenization resumes
                    // with the quote flag set.
                    return Some(Token::Partial(""));
                }
                // Closing quote: the word must end here.
                if let Some(&next) = bytes.get(self.pos) {
                    if !is_splice_end(next) {
                        self.mark_failed(false);
                        return Some(Token::Error);
                    }
                }
                return Some(Token::Field(""));
            }
            b'\\' => self.skip_escape(),
            _ => {
                self.consume_run();
                true
            }
        };

        if !ok {
            return Some(Token::Error);
        }

        Some(self.word_token())
    }
}
