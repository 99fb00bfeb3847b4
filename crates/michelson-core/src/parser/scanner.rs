//! Cursor over source text shared by every grammar rule
//!
//! Handles: whitespace, `#` line comments and non-nesting `/* */` block
//! comments. There is no separate token stream: grammar rules consume
//! characters directly and call `skip_space` after each lexeme.
//!
//! Backtracking:
//! - `checkpoint`/`restore` save and reset the cursor (offset, line, column)
//! - a failed alternative returns `Failure::Backtrack` and must leave the
//!   cursor where it started; `attempt` and `optional` guarantee that
//! - what each alternative expected is merged into a furthest-failure record,
//!   turned into an `Error` only once the whole parse has failed

use crate::config::ParseOptions;
use crate::error::{Error, Span, SyntaxErrorKind};

/// Why a grammar rule did not produce a value
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Failure {
    /// Recoverable: the caller may try another alternative
    Backtrack,
    /// Committed: no other alternative can apply
    Fatal(Error),
}

impl From<Error> for Failure {
    fn from(err: Error) -> Self {
        Failure::Fatal(err)
    }
}

pub(crate) type PResult<T> = std::result::Result<T, Failure>;

#[derive(Debug, Clone, PartialEq)]
enum Expected {
    Item(String),
    AnnotationBody,
}

impl Expected {
    fn describe(&self) -> String {
        match self {
            Expected::Item(what) => what.clone(),
            Expected::AnnotationBody => "annotation body character".to_string(),
        }
    }
}

#[derive(Debug)]
struct Furthest {
    span: Span,
    expected: Vec<Expected>,
}

/// Backtracking scanner for Michelson source text
pub(crate) struct Scanner<'a> {
    input: &'a str,
    span: Span,
    furthest: Option<Furthest>,
    depth: usize,
    max_depth: Option<usize>,
}

pub(crate) fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Characters that can begin some token of the language
fn can_start_token(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || ch.is_whitespace()
        || matches!(
            ch,
            '{' | '}' | '(' | ')' | ';' | '"' | '-' | '@' | '%' | ':' | '#' | '/' | '_'
        )
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str, options: &ParseOptions) -> Self {
        Scanner {
            input,
            span: Span::start(),
            furthest: None,
            depth: 0,
            max_depth: options.max_depth,
        }
    }

    // ── Cursor ─────────────────────────────────────────────

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn checkpoint(&self) -> Span {
        self.span
    }

    pub fn restore(&mut self, checkpoint: Span) {
        self.span = checkpoint;
    }

    pub fn rest(&self) -> &'a str {
        &self.input[self.span.offset..]
    }

    pub fn is_at_end(&self) -> bool {
        self.span.offset >= self.input.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.span.offset += ch.len_utf8();
        if ch == '\n' {
            self.span.line += 1;
            self.span.column = 1;
        } else {
            self.span.column += 1;
        }
        Some(ch)
    }

    /// Advance past `text`, which must be a prefix of `rest()`
    pub fn consume(&mut self, text: &str) {
        for _ in text.chars() {
            self.bump();
        }
    }

    /// Consume `lit` if the input starts with it; records nothing on mismatch
    pub fn eat(&mut self, lit: &str) -> bool {
        if self.rest().starts_with(lit) {
            self.consume(lit);
            true
        } else {
            false
        }
    }

    pub fn at_word_end(&self) -> bool {
        !self.peek().is_some_and(is_word_char)
    }

    /// The maximal run of word characters at the cursor, if it starts with a letter
    pub fn peek_word(&self) -> Option<&'a str> {
        let rest = self.rest();
        if !rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return None;
        }
        let len = rest.find(|c: char| !is_word_char(c)).unwrap_or(rest.len());
        Some(&rest[..len])
    }

    // ── Failure tracking ───────────────────────────────────

    fn record(&mut self, span: Span, expected: Expected) {
        if let Some(f) = &mut self.furthest {
            if f.span.offset > span.offset {
                return;
            }
            if f.span.offset == span.offset {
                if !f.expected.contains(&expected) {
                    f.expected.push(expected);
                }
                return;
            }
        }
        self.furthest = Some(Furthest {
            span,
            expected: vec![expected],
        });
    }

    /// Record that `what` was expected at the cursor and backtrack
    pub fn fail(&mut self, what: impl Into<String>) -> Failure {
        self.record(self.span, Expected::Item(what.into()));
        Failure::Backtrack
    }

    pub fn fail_annotation(&mut self) -> Failure {
        self.record(self.span, Expected::AnnotationBody);
        Failure::Backtrack
    }

    /// Turn the outcome of a failed parse into the reported error
    pub fn into_error(self, failure: Failure) -> Error {
        let furthest = match failure {
            Failure::Fatal(err) => return err,
            Failure::Backtrack => self.furthest,
        };
        let Some(furthest) = furthest else {
            return Error::SyntaxError {
                span: self.span,
                expected: vec!["input".to_string()],
                kind: SyntaxErrorKind::Grammar,
            };
        };
        let expected: Vec<String> = furthest.expected.iter().map(Expected::describe).collect();
        if furthest.expected.contains(&Expected::AnnotationBody) {
            return Error::SyntaxError {
                span: furthest.span,
                expected,
                kind: SyntaxErrorKind::Annotation,
            };
        }
        match self.input[furthest.span.offset..].chars().next() {
            Some(ch) if !can_start_token(ch) => Error::LexError {
                span: furthest.span,
                message: format!("unexpected character '{}'", ch),
            },
            _ => Error::SyntaxError {
                span: furthest.span,
                expected,
                kind: SyntaxErrorKind::Grammar,
            },
        }
    }

    // ── Whitespace & Comments ──────────────────────────────

    pub fn skip_space(&mut self) -> PResult<()> {
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.bump();
            }

            if self.peek() == Some('#') {
                while let Some(ch) = self.peek() {
                    if ch == '\n' {
                        break;
                    }
                    self.bump();
                }
                continue;
            }

            if self.rest().starts_with("/*") {
                let start = self.span;
                self.consume("/*");
                loop {
                    if self.eat("*/") {
                        break;
                    }
                    if self.bump().is_none() {
                        return Err(Failure::Fatal(Error::LexError {
                            span: start,
                            message: "unterminated block comment".to_string(),
                        }));
                    }
                }
                continue;
            }

            return Ok(());
        }
    }

    // ── Lexemes ────────────────────────────────────────────

    /// Match a literal then skip trailing space
    pub fn symbol(&mut self, lit: &str) -> PResult<()> {
        if self.rest().starts_with(lit) {
            self.lexeme(|s| {
                s.consume(lit);
                Ok(())
            })
        } else {
            Err(self.fail(format!("`{}`", lit)))
        }
    }

    /// Match a whole word then skip trailing space
    pub fn keyword(&mut self, kw: &str) -> PResult<()> {
        if self.peek_word() == Some(kw) {
            self.lexeme(|s| {
                s.consume(kw);
                Ok(())
            })
        } else {
            Err(self.fail(format!("`{}`", kw)))
        }
    }

    /// Run `f` then skip the space that follows the token it read
    pub fn lexeme<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        let value = f(self)?;
        self.skip_space()?;
        Ok(value)
    }

    pub fn eof(&mut self) -> PResult<()> {
        if self.is_at_end() {
            Ok(())
        } else {
            Err(self.fail("end of input"))
        }
    }

    // ── Combinators ────────────────────────────────────────

    /// Run `f`; on backtrack the cursor returns to where it was
    pub fn attempt<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        let checkpoint = self.checkpoint();
        let result = f(self);
        if let Err(Failure::Backtrack) = result {
            self.restore(checkpoint);
        }
        result
    }

    /// Like `attempt`, but a backtrack becomes `Ok(None)`
    pub fn optional<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<Option<T>> {
        match self.attempt(f) {
            Ok(value) => Ok(Some(value)),
            Err(Failure::Backtrack) => Ok(None),
            Err(fatal) => Err(fatal),
        }
    }

    /// One or more repetitions of `f`
    pub fn many1<T>(&mut self, mut f: impl FnMut(&mut Self) -> PResult<T>) -> PResult<Vec<T>> {
        let mut items = vec![self.attempt(&mut f)?];
        while let Some(item) = self.optional(&mut f)? {
            items.push(item);
        }
        Ok(items)
    }

    /// `{ item (; item)* ;? }` with an optional trailing semicolon
    pub fn braced_list<T>(
        &mut self,
        mut item: impl FnMut(&mut Self) -> PResult<T>,
    ) -> PResult<Vec<T>> {
        self.attempt(|s| {
            s.symbol("{")?;
            let mut items = Vec::new();
            if s.optional(|s| s.symbol("}"))?.is_some() {
                return Ok(items);
            }
            loop {
                items.push(item(s)?);
                if s.optional(|s| s.symbol(";"))?.is_some() {
                    if s.optional(|s| s.symbol("}"))?.is_some() {
                        return Ok(items);
                    }
                } else {
                    s.symbol("}")?;
                    return Ok(items);
                }
            }
        })
    }

    /// Run `f` one nesting level deeper, enforcing `max_depth`
    pub fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if let Some(limit) = self.max_depth {
            if self.depth >= limit {
                return Err(Failure::Fatal(Error::DepthLimitExceeded {
                    span: self.span,
                    limit,
                }));
            }
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner(input: &str) -> Scanner<'_> {
        Scanner::new(input, &ParseOptions::default())
    }

    // ── Whitespace & comments ──────────────────────────

    #[test]
    fn test_skip_line_comments() {
        let mut s = scanner("  # a comment\n  # another\nDROP");
        s.skip_space().unwrap();
        assert_eq!(s.rest(), "DROP");
        assert_eq!(s.span(), Span { line: 3, column: 1, offset: 26 });
    }

    #[test]
    fn test_skip_block_comments() {
        let mut s = scanner("/* one */ /* two\n lines */DROP");
        s.skip_space().unwrap();
        assert_eq!(s.rest(), "DROP");
    }

    #[test]
    fn test_block_comments_do_not_nest() {
        let mut s = scanner("/* outer /* inner */ rest */");
        s.skip_space().unwrap();
        assert_eq!(s.rest(), "rest */");
    }

    #[test]
    fn test_unterminated_block_comment_is_fatal() {
        let mut s = scanner("/* never closed");
        match s.skip_space() {
            Err(Failure::Fatal(Error::LexError { span, message })) => {
                assert_eq!(span.offset, 0);
                assert!(message.contains("unterminated"));
            }
            other => panic!("expected fatal lex error, got {:?}", other),
        }
    }

    // ── Lexemes ────────────────────────────────────────

    #[test]
    fn test_symbol_skips_trailing_space() {
        let mut s = scanner("{  # c\n }");
        s.symbol("{").unwrap();
        assert_eq!(s.rest(), "}");
    }

    #[test]
    fn test_lexeme_returns_value_and_skips_space() {
        let mut s = scanner("42 /* c */\n ;");
        let n = s
            .lexeme(|s| {
                s.consume("42");
                Ok(42)
            })
            .unwrap();
        assert_eq!(n, 42);
        assert_eq!(s.rest(), ";");
    }

    #[test]
    fn test_lexeme_failure_leaves_space() {
        let mut s = scanner("x  ;");
        let result: PResult<()> = s.lexeme(|s| Err(s.fail("digit")));
        assert_eq!(result, Err(Failure::Backtrack));
        assert_eq!(s.rest(), "x  ;");
    }

    #[test]
    fn test_keyword_requires_word_boundary() {
        let mut s = scanner("IF_NONE");
        assert_eq!(s.keyword("IF"), Err(Failure::Backtrack));
        assert_eq!(s.span().offset, 0);
        s.keyword("IF_NONE").unwrap();
        assert!(s.is_at_end());
    }

    #[test]
    fn test_keyword_allows_adjacent_sigil() {
        let mut s = scanner("DUP@x");
        s.keyword("DUP").unwrap();
        assert_eq!(s.rest(), "@x");
    }

    #[test]
    fn test_peek_word() {
        assert_eq!(scanner("key_hash)").peek_word(), Some("key_hash"));
        assert_eq!(scanner("SHA256 ;").peek_word(), Some("SHA256"));
        assert_eq!(scanner("_x").peek_word(), None);
        assert_eq!(scanner("12").peek_word(), None);
    }

    // ── Backtracking ───────────────────────────────────

    #[test]
    fn test_attempt_restores_cursor_on_backtrack() {
        let mut s = scanner("ab\ncd");
        let result: PResult<()> = s.attempt(|s| {
            s.consume("ab\nc");
            Err(s.fail("x"))
        });
        assert_eq!(result, Err(Failure::Backtrack));
        assert_eq!(s.span(), Span::start());
    }

    #[test]
    fn test_optional_turns_backtrack_into_none() {
        let mut s = scanner("a");
        let got = s.optional(|s| s.symbol("b")).unwrap();
        assert_eq!(got, None);
        assert_eq!(s.rest(), "a");
    }

    #[test]
    fn test_braced_list_trailing_semicolon() {
        let mut s = scanner("{ a ; a ; }");
        let items = s.braced_list(|s| s.keyword("a")).unwrap();
        assert_eq!(items.len(), 2);
        assert!(s.is_at_end());
    }

    #[test]
    fn test_braced_list_empty() {
        let mut s = scanner("{ }");
        let items = s.braced_list(|s| s.keyword("a")).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_many1_needs_one_match() {
        let mut s = scanner("b");
        assert_eq!(s.many1(|s| s.keyword("a")), Err(Failure::Backtrack));
        let mut s = scanner("a a a b");
        assert_eq!(s.many1(|s| s.keyword("a")).unwrap().len(), 3);
        assert_eq!(s.rest(), "b");
    }

    // ── Error reporting ────────────────────────────────

    #[test]
    fn test_furthest_failure_wins() {
        let mut s = scanner("abc");
        let _ = s.attempt(|s| {
            s.consume("ab");
            Err::<(), _>(s.fail("`x`"))
        });
        let _ = s.fail("`y`");
        match s.into_error(Failure::Backtrack) {
            Error::SyntaxError { span, expected, .. } => {
                assert_eq!(span.offset, 2);
                assert_eq!(expected, vec!["`x`".to_string()]);
            }
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_expectations_merge_at_same_offset() {
        let mut s = scanner("z");
        let _ = s.fail("`a`");
        let _ = s.fail("`b`");
        let _ = s.fail("`a`");
        match s.into_error(Failure::Backtrack) {
            Error::SyntaxError { expected, .. } => {
                assert_eq!(expected, vec!["`a`".to_string(), "`b`".to_string()]);
            }
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_character_is_lex_error() {
        let mut s = scanner("$");
        let _ = s.fail("instruction");
        assert!(matches!(s.into_error(Failure::Backtrack), Error::LexError { .. }));
    }

    #[test]
    fn test_depth_limit() {
        let mut s = Scanner::new("", &ParseOptions::with_max_depth(1));
        let result = s.nested(|s| s.nested(|_| Ok(())));
        assert!(matches!(
            result,
            Err(Failure::Fatal(Error::DepthLimitExceeded { limit: 1, .. }))
        ));
    }
}
