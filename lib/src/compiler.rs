/*! Compiles regular expressions into automata.

The [`Compiler`] glues together the stages implemented in [`crate::re`]:
the pattern is parsed into an NFA, which is optionally optimized and
optionally converted into a DFA. Each stage can be enabled or disabled
with the builder methods.
*/

use log::debug;

use crate::re::dfa::{Alphabet, Determinizer};
use crate::re::nfa::Automaton;
use crate::re::optimizer::optimize;
use crate::re::thompson::{BuiltinClasses, RegexParser};
use crate::re::Error;

/// Compiles a regular expression with the default settings.
///
/// This is equivalent to `Compiler::new().compile(pattern)`.
///
/// # Example
///
/// ```rust
/// let automaton = regex_fa::compile(r#"[0-9]+\.[0-9]*"#).unwrap();
/// let mut scanner = regex_fa::Scanner::new(&automaton);
///
/// assert!(scanner.is_match(b"3.14"));
/// assert!(!scanner.is_match(b"pi"));
/// ```
pub fn compile(pattern: &str) -> Result<Automaton, Error> {
    Compiler::new().compile(pattern)
}

/// Compiles regular expressions into automata.
///
/// The default settings produce an optimized NFA, where the builtin
/// classes `\d`, `\D`, `\w`, `\W`, `\s` and `\S` are available.
#[derive(Clone, Debug)]
pub struct Compiler {
    parser: RegexParser,
    optimize: bool,
    determinizer: Option<Determinizer>,
    compact_classes: bool,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    /// Creates a new compiler with the default settings.
    pub fn new() -> Self {
        Self {
            parser: RegexParser::new(),
            optimize: true,
            determinizer: None,
            compact_classes: false,
        }
    }

    /// Sets the table of builtin classes that can be used in patterns
    /// with a `\<name>` escape sequence.
    pub fn builtin_classes(mut self, classes: BuiltinClasses) -> Self {
        self.parser = self.parser.builtin_classes(classes);
        self
    }

    /// Enables or disables the removal of redundant epsilon states. It's
    /// enabled by default.
    pub fn optimize(mut self, yes: bool) -> Self {
        self.optimize = yes;
        self
    }

    /// If an alphabet is given, the compiler produces a DFA that accepts
    /// only inputs made of bytes in the alphabet. With `None`, which is
    /// the default, the compiler produces an NFA.
    ///
    /// Determinization always works on an optimized NFA, regardless of
    /// [`Compiler::optimize`].
    pub fn determinize(mut self, alphabet: Option<Alphabet>) -> Self {
        self.determinizer = alphabet.map(Determinizer::new);
        self
    }

    /// When producing a DFA, merges the transitions that go from one state
    /// to the same state into a single transition. Disabled by default.
    pub fn compact_classes(mut self, yes: bool) -> Self {
        self.compact_classes = yes;
        self
    }

    /// Compiles a pattern.
    pub fn compile(&self, pattern: &str) -> Result<Automaton, Error> {
        let nfa = self.parser.parse(pattern)?;

        let nfa = if self.optimize || self.determinizer.is_some() {
            optimize(&nfa)
        } else {
            nfa
        };

        let automaton = match &self.determinizer {
            Some(determinizer) => determinizer
                .clone()
                .compact_classes(self.compact_classes)
                .determinize(&nfa),
            None => nfa,
        };

        debug!(
            "compiled `{}` into an automaton with {} states",
            pattern,
            automaton.len()
        );

        Ok(automaton)
    }
}
