/*! A regular expression engine based on finite automata.

Patterns are compiled into automata by the [`Compiler`] and matched
against inputs by the [`Scanner`]. The compiler produces a non-deterministic
finite automaton (NFA) following Thompson's construction, removes its
redundant epsilon states and, if requested, converts it into a
deterministic finite automaton (DFA) with the subset construction. Both
kinds of automata share the same representation, [`Automaton`], and the
scanner runs both of them in time linear with the input size, without
backtracking.

A match is always a full match: the whole input must be accepted by the
pattern, as if the pattern was surrounded by `^(` and `)$`.

# Example

```rust
use regex_fa::{Alphabet, Compiler, Scanner};

// Compile the pattern into an NFA.
let nfa = regex_fa::compile("(a|bc)+z").unwrap();

// Compile the same pattern into a DFA for inputs made of any byte.
let dfa = Compiler::new()
    .determinize(Some(Alphabet::all()))
    .compile("(a|bc)+z")
    .unwrap();

for automaton in [&nfa, &dfa] {
    let mut scanner = Scanner::new(automaton);
    assert!(scanner.is_match(b"abcaz"));
    assert!(!scanner.is_match(b"abz"));
}
```

The [`re`] module gives access to each stage of the pipeline, and to the
[flat representation](re::export::FlatAutomaton) of automata used for
exchanging them with other execution backends.
*/

pub use compiler::compile;
pub use compiler::Compiler;

pub use re::dfa::Alphabet;
pub use re::export::FlatAutomaton;
pub use re::export::SerializationError;
pub use re::nfa::Automaton;
pub use re::scanner::IoReader;
pub use re::scanner::Reader;
pub use re::scanner::ScanError;
pub use re::scanner::Scanner;
pub use re::scanner::SliceReader;
pub use re::thompson::BuiltinClasses;
pub use re::Error;
pub use re::SyntaxError;

mod compiler;

pub mod re;

#[cfg(test)]
mod tests;
