/*! Parser combinators over a byte cursor.

This module knows nothing about regular expressions. It provides a
[`Cursor`] over some input text and the [`Parse`] trait, whose provided
methods are the primitives every grammar in this crate is built with:
single character matches, ordered alternatives and optional matches.

Backtracking is bounded. [`Parse::or`] tries the next alternative only if
the failing one consumed at most one character. An alternative that fails
after consuming more than that makes the whole `or` fail, which prevents
the exponential blowup that unrestricted backtracking produces in deeply
ambiguous grammars. Grammars must be written so that alternatives can be
told apart by their first character.
*/

use crate::re::{SyntaxError, SyntaxErrorKind};

/// Position within some input text.
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    text: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a [u8]) -> Self {
        Self { text, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn set_position(&mut self, pos: usize) {
        debug_assert!(pos <= self.text.len());
        self.pos = pos;
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.pos == self.text.len()
    }
}

/// Result type returned by parsing functions.
pub type ParseResult<T> = Result<T, SyntaxError>;

/// An alternative passed to [`Parse::or`].
pub type Alternative<'f, P, T> = &'f mut dyn FnMut(&mut P) -> ParseResult<T>;

/// Trait implemented by anything that parses some text through a
/// [`Cursor`].
///
/// Implementors only need to expose their cursor, the parsing primitives
/// are provided.
pub trait Parse<'a>: Sized {
    fn cursor(&mut self) -> &mut Cursor<'a>;

    /// Returns an error of the given kind located at the current position.
    fn error(&mut self, kind: SyntaxErrorKind) -> SyntaxError {
        SyntaxError::new(self.cursor().position(), kind)
    }

    /// Consumes and returns one character.
    fn char(&mut self) -> ParseResult<u8> {
        let cursor = self.cursor();
        if let Some(c) = cursor.text.get(cursor.pos).copied() {
            cursor.pos += 1;
            return Ok(c);
        }
        Err(self.error(SyntaxErrorKind::UnexpectedEnd))
    }

    /// Consumes one character and returns it if it satisfies `predicate`.
    ///
    /// The character is consumed even if the predicate fails, which counts
    /// as one consumed character for [`Parse::or`].
    fn char_if(&mut self, predicate: impl Fn(u8) -> bool) -> ParseResult<u8> {
        let c = self.char()?;
        if predicate(c) {
            Ok(c)
        } else {
            let pos = self.cursor().position() - 1;
            Err(SyntaxError::new(pos, SyntaxErrorKind::InvalidSyntax(None)))
        }
    }

    /// Consumes `expected` or fails.
    fn literal(&mut self, expected: u8) -> ParseResult<u8> {
        self.char_if(|c| c == expected)
    }

    /// Fails if there is some input left.
    fn end_of_input(&mut self) -> ParseResult<()> {
        if self.cursor().is_at_end() {
            Ok(())
        } else {
            Err(self.error(SyntaxErrorKind::TrailingInput))
        }
    }

    /// Tries the alternatives in order and returns the result of the first
    /// one that succeeds.
    ///
    /// When an alternative fails having consumed at most one character, the
    /// cursor is restored and the next alternative is tried. When it fails
    /// after consuming more, its error is returned right away. The error of
    /// the last alternative is always returned as is.
    fn or<T>(
        &mut self,
        alternatives: &mut [Alternative<'_, Self, T>],
    ) -> ParseResult<T> {
        let saved = self.cursor().position();

        let (last, rest) = match alternatives.split_last_mut() {
            Some(split) => split,
            None => {
                return Err(self.error(SyntaxErrorKind::InvalidSyntax(None)))
            }
        };

        for alternative in rest {
            match alternative(self) {
                Ok(value) => return Ok(value),
                Err(err) if self.cursor().position() > saved + 1 => {
                    return Err(err)
                }
                Err(_) => self.cursor().set_position(saved),
            }
        }

        last(self)
    }

    /// Runs `f` and returns its result, or `None` if it fails. On failure
    /// the cursor is restored no matter how many characters were consumed.
    fn optional<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> Option<T> {
        let saved = self.cursor().position();
        match f(self) {
            Ok(value) => Some(value),
            Err(_) => {
                self.cursor().set_position(saved);
                None
            }
        }
    }
}

impl<'a> Parse<'a> for Cursor<'a> {
    #[inline]
    fn cursor(&mut self) -> &mut Cursor<'a> {
        self
    }
}
