/*! A regexp parser that produces NFAs following the [Thompson's
construction][1] algorithm.

Each grammar rule returns the entry and exit states of a fresh NFA
fragment, and fragments are connected with epsilon transitions. The
construction favours clarity over size: it's always better to generate
redundant epsilon states, which the [optimizer][`crate::re::optimizer`]
removes later, than to special-case the construction.

The grammar, from highest to lowest precedence, is:

```text
Atom           → Group | CharMatch
AtomQuantified → Atom ('?' | '+' | '*')?
Concat         → AtomQuantified+
Alternative    → Concat ('|' Alternative)?
```

[1]: https://en.wikipedia.org/wiki/Thompson%27s_construction
*/

pub use compiler::RegexParser;

use crate::re::nfa::{CharClass, CharRange};

mod compiler;

#[cfg(test)]
mod tests;

/// Table of character classes that can be referenced with an escape
/// sequence like `\d`.
///
/// Each byte can name one class. Names used by other escape sequences (`x`,
/// `X`, `n`, `0`, `r`, `t`, `a`, `b`, `v` and the metacharacters) should be
/// avoided, as the builtin class takes precedence and the escape sequence
/// becomes unreachable.
#[derive(Clone, Debug)]
pub struct BuiltinClasses {
    table: Vec<Option<CharClass>>,
}

impl BuiltinClasses {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self { table: vec![None; 256] }
    }

    /// Adds a class named `name` to the table, replacing any existing class
    /// with the same name.
    pub fn with(mut self, name: u8, class: CharClass) -> Self {
        self.table[name as usize] = Some(class);
        self
    }

    /// Returns the class named `name`, if any.
    #[inline]
    pub fn get(&self, name: u8) -> Option<&CharClass> {
        self.table[name as usize].as_ref()
    }
}

impl Default for BuiltinClasses {
    /// Digits (`\d`), word characters (`\w`), spaces (`\s`) and their
    /// negations (`\D`, `\W`, `\S`).
    fn default() -> Self {
        let digits = CharClass::new(vec![CharRange::new(b'0', b'9')], false);
        let word = CharClass::new(
            vec![
                CharRange::new(b'A', b'Z'),
                CharRange::new(b'a', b'z'),
                CharRange::new(b'0', b'9'),
                CharRange::new(b'_', b'_'),
            ],
            false,
        );
        let space = CharClass::list(b" \n\r\t\x0b\x0c");

        Self::new()
            .with(b'd', digits.clone())
            .with(b'D', digits.inverted())
            .with(b'w', word.clone())
            .with(b'W', word.inverted())
            .with(b's', space.clone())
            .with(b'S', space.inverted())
    }
}
