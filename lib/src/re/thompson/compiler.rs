/*!
This module implements the regexp grammar on top of the combinators in
[`crate::re::parser`], emitting NFA fragments as the rules are recognized.

All the fragments returned by the rules follow these conventions:

1. The exit state never has outgoing transitions when the fragment is
   returned, the rule that uses the fragment adds them.
2. Entry and exit states may coincide.
3. Epsilon-only loops are allowed.
4. The intermediate states in loop-closing paths are marked as "back".
*/

use log::debug;

use crate::re::nfa::{Automaton, CharClass, CharRange, State, StateId};
use crate::re::parser::{Cursor, Parse, ParseResult};
use crate::re::thompson::BuiltinClasses;
use crate::re::{Error, SyntaxError, SyntaxErrorKind};

/// Entry and exit states of an NFA fragment.
type Fragment = (StateId, StateId);

/// Converts regexp patterns into NFAs.
///
/// Only ASCII patterns are accepted. Printable characters stand for
/// themselves unless they are metacharacters, any other byte value can be
/// matched with an `\xHH` escape sequence.
#[derive(Clone, Debug, Default)]
pub struct RegexParser {
    builtin_classes: BuiltinClasses,
}

impl RegexParser {
    /// Creates a parser with the default builtin classes. See
    /// [`BuiltinClasses::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the table of builtin classes.
    pub fn builtin_classes(mut self, classes: BuiltinClasses) -> Self {
        self.builtin_classes = classes;
        self
    }

    /// Parses the pattern and returns the corresponding NFA.
    ///
    /// The NFA has a single source and a single accepting state, both of
    /// them are epsilon states.
    pub fn parse(&self, pattern: &str) -> Result<Automaton, Error> {
        let mut grammar =
            Grammar::new(pattern.as_bytes(), &self.builtin_classes);

        let parsed = grammar.alternative().and_then(|fragment| {
            grammar.end_of_input()?;
            Ok(fragment)
        });

        let (start, end) = parsed.map_err(|err| grammar.furthest_error(err))?;

        let source = grammar.add_state(State::epsilon());
        let accept = grammar.add_state(State::epsilon());

        grammar.link(source, start);
        grammar.link(end, accept);

        let nfa = Automaton::from_arena(grammar.arena, &[source], accept);

        debug!("parsed `{}` into an NFA with {} states", pattern, nfa.len());

        Ok(nfa)
    }
}

/// State of a single parsing call. The arena is private to the call, and
/// may contain garbage states built by alternatives that failed. Those are
/// unreachable and dropped once the pattern is parsed.
struct Grammar<'a> {
    cursor: Cursor<'a>,
    builtin_classes: &'a BuiltinClasses,
    arena: Vec<State>,
    /// Error raised furthest into the pattern by an atom that followed
    /// some other atom. Those errors end a concatenation without failing
    /// the parse.
    furthest: Option<SyntaxError>,
}

impl<'a> Parse<'a> for Grammar<'a> {
    #[inline]
    fn cursor(&mut self) -> &mut Cursor<'a> {
        &mut self.cursor
    }
}

impl<'a> Grammar<'a> {
    fn new(pattern: &'a [u8], builtin_classes: &'a BuiltinClasses) -> Self {
        Self {
            cursor: Cursor::new(pattern),
            builtin_classes,
            arena: Vec::new(),
            furthest: None,
        }
    }

    /// Returns `err`, or the recorded error if it is located further in
    /// the pattern.
    fn furthest_error(&mut self, err: SyntaxError) -> SyntaxError {
        match self.furthest.take() {
            Some(furthest) if furthest.position() > err.position() => furthest,
            _ => err,
        }
    }

    /// Records `err` if no error was recorded further in the pattern.
    fn record_error(&mut self, err: SyntaxError) {
        let further = self
            .furthest
            .as_ref()
            .map_or(true, |furthest| err.position() > furthest.position());
        if further {
            self.furthest = Some(err);
        }
    }

    fn add_state(&mut self, state: State) -> StateId {
        let id = StateId::from(self.arena.len());
        self.arena.push(state);
        id
    }

    #[inline]
    fn link(&mut self, from: StateId, to: StateId) {
        self.arena[from.index()].add_next(to);
    }

    fn hex_digit(&mut self) -> ParseResult<u8> {
        let c = self.char_if(|c| c.is_ascii_hexdigit())?;
        Ok(match c {
            b'0'..=b'9' => c - b'0',
            b'a'..=b'f' => c - b'a' + 10,
            _ => c - b'A' + 10,
        })
    }

    fn hex_byte(&mut self) -> ParseResult<u8> {
        let high = self.hex_digit()?;
        let low = self.hex_digit()?;
        Ok(high << 4 | low)
    }

    /// Parses the part of an escape sequence that follows the backslash,
    /// and returns the byte it stands for.
    fn escaped(&mut self) -> ParseResult<u8> {
        let pos = self.cursor.position();
        match self.char()? {
            b'x' | b'X' => self.hex_byte(),
            c @ (b']' | b'[' | b'\\' | b'(' | b')' | b'^' | b'.' | b'?'
            | b'+' | b'*' | b'|' | b'-') => Ok(c),
            b'n' => Ok(b'\n'),
            b'0' => Ok(0x00),
            b'r' => Ok(b'\r'),
            b't' => Ok(b'\t'),
            b'a' => Ok(0x07),
            b'b' => Ok(0x08),
            b'v' => Ok(0x0b),
            c => Err(SyntaxError::new(
                pos,
                SyntaxErrorKind::InvalidSyntax(Some(format!(
                    "unknown escape sequence `\\{}`",
                    c.escape_ascii()
                ))),
            )),
        }
    }

    /// Parses the name of a builtin class, the backslash was already
    /// consumed.
    fn builtin_class(&mut self) -> ParseResult<CharClass> {
        let pos = self.cursor.position();
        let name = self.char()?;
        self.builtin_classes.get(name).cloned().ok_or_else(|| {
            SyntaxError::new(pos, SyntaxErrorKind::InvalidSyntax(None))
        })
    }

    /// A single character inside a bracketed class, which may be an escape
    /// sequence.
    fn range_boundary(&mut self) -> ParseResult<u8> {
        self.or(&mut [
            &mut |p: &mut Self| {
                p.literal(b'\\')?;
                p.escaped()
            },
            &mut |p: &mut Self| {
                p.char_if(|c| {
                    (0x20..=0x7e).contains(&c)
                        && c != b']'
                        && c != b'\\'
                        && c != b'-'
                })
            },
        ])
    }

    /// Parses `a` or `a-b` inside a bracketed class. Returns the position
    /// where the range starts and its boundaries, which are not validated.
    fn range_bounds(&mut self) -> ParseResult<(usize, u8, u8)> {
        let pos = self.cursor.position();
        let from = self.range_boundary()?;
        let to = self.optional(|p| {
            p.literal(b'-')?;
            p.range_boundary()
        });
        Ok((pos, from, to.unwrap_or(from)))
    }

    fn char_range(bounds: (usize, u8, u8)) -> ParseResult<CharRange> {
        match bounds {
            (pos, from, to) if from > to => {
                Err(SyntaxError::new(pos, SyntaxErrorKind::InvalidRange))
            }
            (_, from, to) => Ok(CharRange::new(from, to)),
        }
    }

    /// Parses a bracketed class like `[a-z_]` or `[^0-9]`. At least one
    /// range is required.
    fn char_class(&mut self) -> ParseResult<CharClass> {
        self.literal(b'[')?;

        let inverted = self.optional(|p| p.literal(b'^')).is_some();

        let first = self.range_bounds()?;
        let mut ranges = vec![Self::char_range(first)?];

        while let Some(bounds) = self.optional(Self::range_bounds) {
            ranges.push(Self::char_range(bounds)?);
        }

        self.literal(b']')?;

        Ok(CharClass::new(ranges, inverted))
    }

    fn char_match(&mut self) -> ParseResult<CharClass> {
        self.or(&mut [
            // [a-bZ]
            &mut |p: &mut Self| p.char_class(),
            // Dot
            &mut |p: &mut Self| p.literal(b'.').map(|_| CharClass::any()),
            // Builtin class or escaped byte.
            &mut |p: &mut Self| {
                p.literal(b'\\')?;
                p.or(&mut [
                    &mut |p: &mut Self| p.builtin_class(),
                    &mut |p: &mut Self| p.escaped().map(CharClass::single),
                ])
            },
            // Any other printable character.
            &mut |p: &mut Self| {
                p.char_if(|c| {
                    (0x20..=0x7e).contains(&c)
                        && !matches!(
                            c,
                            b'\\'
                                | b'*'
                                | b'?'
                                | b')'
                                | b'|'
                                | b'+'
                                | b'['
                                | b']'
                                | b'('
                                | b'.'
                        )
                })
                .map(CharClass::single)
            },
        ])
    }

    fn group(&mut self) -> ParseResult<Fragment> {
        self.literal(b'(')?;
        let fragment = self.alternative()?;
        self.literal(b')')?;
        Ok(fragment)
    }

    fn atom(&mut self) -> ParseResult<Fragment> {
        self.or(&mut [
            &mut |p: &mut Self| p.group(),
            // -> s ->
            &mut |p: &mut Self| {
                let class = p.char_match()?;
                let s = p.add_state(State::consuming(class));
                Ok((s, s))
            },
        ])
    }

    fn atom_quantified(&mut self) -> ParseResult<Fragment> {
        let (s, e) = self.atom()?;
        self.or(&mut [
            // -> s1 -> s -> ... -> e -> e1 ->
            //     \                     ^
            //      \                    |
            //       *-------------------*
            &mut |p: &mut Self| {
                p.literal(b'?')?;
                let s1 = p.add_state(State::epsilon());
                let e1 = p.add_state(State::epsilon());
                p.link(e, e1);
                p.link(s1, s);
                p.link(s1, e1);
                Ok((s1, e1))
            },
            // -> s -> ... -> e -> e1 ->
            //    ^                /
            //     \              /
            //      *---- b <----*
            &mut |p: &mut Self| {
                p.literal(b'+')?;
                let b = p.add_state(State::back());
                let e1 = p.add_state(State::epsilon());
                p.link(e, e1);
                p.link(e1, b);
                p.link(b, s);
                Ok((s, e1))
            },
            //      +-> s -> ... -> e
            //     /                |
            // -> s1 <----- b <-----+
            //     \
            //      *-----> e1 ----->
            &mut |p: &mut Self| {
                p.literal(b'*')?;
                let s1 = p.add_state(State::epsilon());
                let b = p.add_state(State::back());
                let e1 = p.add_state(State::epsilon());
                p.link(s1, s);
                p.link(s1, e1);
                p.link(e, b);
                p.link(b, s1);
                Ok((s1, e1))
            },
            // No quantifier.
            &mut |_: &mut Self| Ok((s, e)),
        ])
    }

    fn concat(&mut self) -> ParseResult<Fragment> {
        let (s, mut e) = self.atom_quantified()?;
        // -> s -> ... -> e -> s1 -> ... -> e1 ->
        loop {
            let saved = self.cursor.position();
            match self.atom_quantified() {
                Ok((s1, e1)) => {
                    self.link(e, s1);
                    e = e1;
                }
                Err(err) => {
                    // The concatenation ends here. Errors located past
                    // the start of the failed atom are kept for `parse`.
                    if err.position() > saved {
                        self.record_error(err);
                    }
                    self.cursor.set_position(saved);
                    return Ok((s, e));
                }
            }
        }
    }

    fn alternative(&mut self) -> ParseResult<Fragment> {
        let (s1, e1) = self.concat()?;

        let rest = self.optional(|p| {
            p.literal(b'|')?;
            p.alternative()
        });

        let (s2, e2) = match rest {
            Some(fragment) => fragment,
            None => return Ok((s1, e1)),
        };

        //      +-> s1 -> ... -> e1 --> e ->
        //     /                        ^
        //    /                        /
        // -> s --> s2 -> ... -> e2 --*
        let s = self.add_state(State::epsilon());
        let e = self.add_state(State::epsilon());

        self.link(s, s1);
        self.link(s, s2);
        self.link(e1, e);
        self.link(e2, e);

        Ok((s, e))
    }
}
