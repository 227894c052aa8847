/*! End-to-end tests. */
use std::iter;

use itertools::Itertools;
use pretty_assertions::assert_eq;
use regex_automata::meta::Regex;

use crate::re::dfa::{Alphabet, Determinizer};
use crate::re::optimizer::optimize;
use crate::re::thompson::RegexParser;
use crate::{compile, Automaton, Compiler, Scanner};

macro_rules! test_pattern {
    ($pattern:literal, $data:expr, $expected_result:expr) => {{
        for automaton in automata($pattern, &Alphabet::all()) {
            assert_eq!(
                Scanner::new(&automaton).is_match($data),
                $expected_result,
                "\n\n`{}` on {:?} should be {}, but it is {}",
                $pattern,
                $data.escape_ascii().to_string(),
                $expected_result,
                !$expected_result
            );
        }
    }};
}

macro_rules! pattern_match {
    ($pattern:literal, $data:expr) => {{
        test_pattern!($pattern, $data, true);
    }};
}

macro_rules! pattern_no_match {
    ($pattern:literal, $data:expr) => {{
        test_pattern!($pattern, $data, false);
    }};
}

/// Labels for the automata returned by [`automata`], in the same order.
const KINDS: [&str; 4] = ["raw", "nfa", "dfa", "compact dfa"];

/// Returns the raw NFA, the optimized NFA, the DFA and the DFA with
/// compacted classes for a pattern.
fn automata(pattern: &str, alphabet: &Alphabet) -> [Automaton; 4] {
    let raw = RegexParser::new().parse(pattern).unwrap();
    let optimized = optimize(&raw);
    let dfa = Determinizer::new(alphabet.clone()).determinize(&optimized);
    let compact_dfa = Determinizer::new(alphabet.clone())
        .compact_classes(true)
        .determinize(&optimized);
    [raw, optimized, dfa, compact_dfa]
}

/// Returns every word over `alphabet` with up to `max_len` bytes, shortest
/// words first.
fn words(
    alphabet: &[u8],
    max_len: usize,
) -> impl Iterator<Item = Vec<u8>> + '_ {
    iter::once(Vec::new()).chain((1..=max_len).flat_map(move |len| {
        (0..len)
            .map(move |_| alphabet.iter().copied())
            .multi_cartesian_product()
    }))
}

/// Checks that every automaton built for `pattern` accepts the same words
/// as the reference engine running the anchored pattern `^(pattern)$`.
fn compare_with_reference(pattern: &str, alphabet: &[u8], max_len: usize) {
    let reference = Regex::new(&format!("^({})$", pattern)).unwrap();

    let automata = automata(pattern, &Alphabet::from_bytes(alphabet));
    let mut scanners: Vec<Scanner> =
        automata.iter().map(Scanner::new).collect();

    for word in words(alphabet, max_len) {
        let expected = reference.is_match(word.as_slice());
        for (scanner, kind) in scanners.iter_mut().zip(KINDS) {
            assert_eq!(
                scanner.is_match(word.as_slice()),
                expected,
                "{}: `{}` on `{}`",
                kind,
                pattern,
                word.escape_ascii()
            );
        }
    }
}

/// Like [`compare_with_reference`], but compiling the pattern again for
/// every word.
fn compare_with_reference_recompiling(
    pattern: &str,
    alphabet: &[u8],
    max_len: usize,
) {
    let reference = Regex::new(&format!("^({})$", pattern)).unwrap();

    for word in words(alphabet, max_len) {
        let automaton = compile(pattern).unwrap();
        assert_eq!(
            Scanner::new(&automaton).is_match(word.as_slice()),
            reference.is_match(word.as_slice()),
            "`{}` on `{}`",
            pattern,
            word.escape_ascii()
        );
    }
}

#[test]
fn kleene_closure_1() {
    compare_with_reference_recompiling("[^a1]|a*", b"a1 ", 5);
    compare_with_reference("[^a1]|a*", b"a1 ", 12);
}

#[test]
fn kleene_closure_2() {
    compare_with_reference_recompiling("[01]+1[01][01]", b"01z", 5);
    compare_with_reference("[01]+1[01][01]", b"01z", 12);
}

#[test]
fn kleene_closure_3() {
    compare_with_reference_recompiling("(a|bc)+z", b"abc", 5);
    compare_with_reference("(a|bc)+z", b"abc", 11);
    compare_with_reference("(a|bc)+z", b"abcz", 7);
}

#[test]
fn kleene_closure_nested_loops() {
    compare_with_reference("((a*)*|b?)+", b"ab", 10);
    compare_with_reference("(ab|ac|a)*c", b"abc", 9);
    compare_with_reference("(a?b?)+c?", b"abc", 8);
    compare_with_reference("x(a|b)*(b|c)+y", b"abcxy", 7);
}

#[test]
fn words_generation() {
    let words: Vec<Vec<u8>> = words(b"ab", 2).collect();
    assert_eq!(
        words,
        vec![
            vec![],
            vec![b'a'],
            vec![b'b'],
            vec![b'a', b'a'],
            vec![b'a', b'b'],
            vec![b'b', b'a'],
            vec![b'b', b'b'],
        ]
    );
}

#[test]
fn escape_fidelity() {
    let expected = |c: u8| {
        matches!(c, b'a' | 0x00 | 0x7f | b'0' | b' ' | b'_')
            || c.is_ascii_alphanumeric()
    };

    for automaton in automata(r#"a|\0|0|\x7f| |\w"#, &Alphabet::all()) {
        let mut scanner = Scanner::new(&automaton);
        for c in 0..=255_u8 {
            assert_eq!(scanner.is_match(&[c]), expected(c), "{:#04x}", c);
        }
    }
}

#[test]
fn char_classes() {
    let expected = |c: u8| {
        matches!(c, b'.' | b'^' | b'a' | b'z' | b'-') || c.is_ascii_digit()
    };

    for automaton in automata(r#"[.^az\-0-9]"#, &Alphabet::all()) {
        let mut scanner = Scanner::new(&automaton);
        for c in 0..=255_u8 {
            assert_eq!(scanner.is_match(&[c]), expected(c), "{:#04x}", c);
        }
    }

    let expected = |c: u8| {
        !(c.is_ascii_lowercase()
            || matches!(c, b'[' | b'\\' | b'\n' | 0x9f | b'^'))
    };

    for automaton in automata(r#"[^a-z[\\\n\x9f^]"#, &Alphabet::all()) {
        let mut scanner = Scanner::new(&automaton);
        for c in 0..=255_u8 {
            assert_eq!(scanner.is_match(&[c]), expected(c), "{:#04x}", c);
        }
    }
}

#[test]
fn builtin_classes() {
    pattern_match!(r#"\d+"#, b"0123456789");
    pattern_no_match!(r#"\d+"#, b"12a");
    pattern_match!(r#"\D\D"#, b"a ");
    pattern_no_match!(r#"\D"#, b"7");
    pattern_match!(r#"\w+"#, b"Hello_World_42");
    pattern_no_match!(r#"\w"#, b"-");
    pattern_match!(r#"\W"#, b"-");
    pattern_match!(r#"\s\s\s\s\s\s"#, b" \n\r\t\x0b\x0c");
    pattern_no_match!(r#"\s"#, b"x");
    pattern_match!(r#"\S"#, b"x");
}

#[test]
fn patterns() {
    pattern_no_match!("a", b"");
    pattern_match!("abc", b"abc");
    pattern_no_match!("abc", b"abcd");
    pattern_no_match!("abc", b"ab");
    pattern_match!("a.c", b"a\xffc");
    pattern_match!("a.c", b"a\x00c");
    pattern_match!("(a|b|c)?d", b"d");
    pattern_match!("(a|b|c)?d", b"bd");
    pattern_no_match!("(a|b|c)?d", b"abd");
    pattern_match!(r#"\x00+\xFF"#, b"\x00\x00\xff");
    pattern_match!(r#"[\x80-\xff]+"#, b"\x80\x90\xff");
    pattern_no_match!(r#"[\x80-\xff]+"#, b"\x80\x7f");
    pattern_match!(r#"\(\)\[\]\.\*\?\+\|"#, b"()[].*?+|");
    pattern_match!("a b", b"a b");
    pattern_match!("(((a)))", b"a");
}

#[test]
fn invalid_syntax() {
    let patterns = [
        "[2-1]", "[]", "]]", "[", "[1-]", "a|", "|b", "a++", "a+?", "a*+",
        "(a", "a)", "(()", "()", r#"a+\!junk!!!!"#, "",
    ];

    for pattern in patterns {
        assert!(compile(pattern).is_err(), "`{}` should fail", pattern);
    }
}

#[test]
fn compile_determinism() {
    let patterns = ["(a|bc)+z", "[01]+1[01][01]", r#"[^a1]|a*"#];

    for pattern in patterns {
        assert_eq!(compile(pattern).unwrap(), compile(pattern).unwrap());

        let compiler = Compiler::new().determinize(Some(Alphabet::all()));
        assert_eq!(
            compiler.compile(pattern).unwrap(),
            compiler.compile(pattern).unwrap()
        );
    }
}

#[test]
fn dfa_alphabet() {
    let dfa = Compiler::new()
        .determinize(Some(Alphabet::from_bytes(b"ab")))
        .compile(".*")
        .unwrap();

    let mut scanner = Scanner::new(&dfa);

    assert!(scanner.is_match(b""));
    assert!(scanner.is_match(b"abba"));
    // `c` is not in the alphabet.
    assert!(!scanner.is_match(b"abc"));
}

#[test]
fn concurrent_scans() {
    let automaton = compile("(a|bc)+z").unwrap();

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                let mut scanner = Scanner::new(&automaton);
                assert!(scanner.is_match(b"abcbcaz"));
                assert!(!scanner.is_match(b"abcbca"));
            });
        }
    });
}
