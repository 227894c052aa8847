/*! This module parses, compiles, optimizes, determinizes and executes
regular expressions.

The pipeline goes like this:

```text
pattern ─► thompson ─► raw NFA ─► optimizer ─► NFA ─┬───────────────► scanner
                                                    │
                                                    └─► dfa ─► DFA ─► scanner
```

The regex grammar is recognized by a recursive-descent parser written on
top of the combinators in [`parser`]. While recognizing the pattern the
parser emits NFA fragments following [Thompson's construction][1], and the
fragments are glued together with epsilon transitions. The result is an
[`nfa::Automaton`] with lots of redundant epsilon states, that the
[`optimizer`] removes. The optimized NFA can be matched directly by the
[`scanner`] or converted into a DFA by [`dfa`] with the classic subset
construction. Both NFAs and DFAs share the same representation, the
scanner doesn't care which one it runs.

This approach is inspired by Russ Cox's article
[Regular Expression Matching Can Be Simple And Fast][2].

[1]: https://en.wikipedia.org/wiki/Thompson%27s_construction
[2]: https://swtch.com/~rsc/regexp/regexp1.html
*/

use std::fmt::{Display, Formatter};

use thiserror::Error;

pub mod dfa;
pub mod export;
pub mod nfa;
pub mod optimizer;
pub mod parser;
pub mod scanner;
pub mod thompson;

mod bitmapset;

/// Errors returned while compiling a regular expression.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    SyntaxError(#[from] SyntaxError),
}

/// The kinds of syntax errors.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SyntaxErrorKind {
    /// The pattern ended while more characters were expected.
    UnexpectedEnd,
    /// Some character is not valid at this position. May carry a reason.
    InvalidSyntax(Option<String>),
    /// A range like `[z-a]`, where the lower bound is greater than the
    /// upper bound.
    InvalidRange,
    /// The pattern is complete, but there are more characters after it.
    TrailingInput,
}

/// A malformed pattern.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SyntaxError {
    position: usize,
    kind: SyntaxErrorKind,
}

impl SyntaxError {
    pub fn new(position: usize, kind: SyntaxErrorKind) -> Self {
        Self { position, kind }
    }

    /// Offset within the pattern where the error was found.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn kind(&self) -> &SyntaxErrorKind {
        &self.kind
    }

    /// Human-readable explanation of the error, if any.
    pub fn reason(&self) -> Option<&str> {
        match &self.kind {
            SyntaxErrorKind::UnexpectedEnd => {
                Some("unexpected end of pattern")
            }
            SyntaxErrorKind::InvalidSyntax(reason) => reason.as_deref(),
            SyntaxErrorKind::InvalidRange => Some("invalid range boundaries"),
            SyntaxErrorKind::TrailingInput => {
                Some("junk at the end of pattern")
            }
        }
    }
}

impl Display for SyntaxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid syntax at character {}", self.position)?;
        if let Some(reason) = self.reason() {
            write!(f, ": {}", reason)?;
        }
        Ok(())
    }
}

impl std::error::Error for SyntaxError {}
