use pretty_assertions::assert_eq;

use super::{Alphabet, Determinizer};
use crate::re::optimizer::optimize;
use crate::re::thompson::RegexParser;

macro_rules! assert_re_dfa {
    ($re:expr, $alphabet:expr, $dfa:expr) => {{
        let nfa = optimize(&RegexParser::new().parse($re).unwrap());
        let dfa = Determinizer::new(Alphabet::from_bytes($alphabet))
            .determinize(&nfa);
        assert_eq!($dfa, dfa.to_string());
    }};
}

#[test]
fn alphabet() {
    let alphabet = Alphabet::from_bytes(b"zaa\x00");

    assert_eq!(alphabet.len(), 3);
    assert!(alphabet.contains(b'a'));
    assert!(!alphabet.contains(b'b'));
    assert_eq!(alphabet.iter().collect::<Vec<_>>(), vec![0x00, b'a', b'z']);

    assert_eq!(Alphabet::all().len(), 256);
    assert_eq!(Alphabet::all().iter().last(), Some(0xff));
    assert!(Alphabet::from_bytes(&[]).is_empty());
}

#[test]
fn re_dfa_1() {
    assert_re_dfa!(
        "a*",
        b"ab",
        r#"
00000: SOURCE EPSILON -> 00001
00001: CLASS [0x61-0x61] -> 00002
00002: EPSILON -> 00003 00004
00003: CLASS [0x61-0x61] -> 00002
00004: ACCEPT
00005: SOURCE EPSILON -> 00004
"#
    );
}

#[test]
fn re_dfa_2() {
    assert_re_dfa!(
        "a|b",
        b"ab",
        r#"
00000: SOURCE EPSILON -> 00001
00001: CLASS [0x61-0x61] -> 00002
00002: EPSILON -> 00003
00003: ACCEPT
00004: SOURCE EPSILON -> 00005
00005: CLASS [0x62-0x62] -> 00006
00006: EPSILON -> 00003
"#
    );
}

#[test]
fn re_dfa_empty_alphabet() {
    // The empty string is still accepted.
    assert_re_dfa!(
        "a*",
        b"",
        r#"
00000: SOURCE EPSILON
00001: SOURCE EPSILON -> 00002
00002: ACCEPT
"#
    );
}

#[test]
fn re_dfa_compact_classes() {
    let nfa = RegexParser::new().parse("[a-cx]y").unwrap();
    let dfa = Determinizer::new(Alphabet::from_bytes(b"abcxyz"))
        .compact_classes(true)
        .determinize(&nfa);

    assert_eq!(
        r#"
00000: SOURCE EPSILON -> 00001
00001: CLASS [0x61-0x63] [0x78-0x78] -> 00002
00002: EPSILON -> 00003
00003: CLASS [0x79-0x79] -> 00004
00004: EPSILON -> 00005
00005: ACCEPT
"#,
        dfa.to_string()
    );
}

#[test]
fn re_dfa_accepts_raw_nfa() {
    let nfa = RegexParser::new().parse("(a|bc)+z").unwrap();
    assert!(!nfa.is_epsilon_free());

    let determinizer = Determinizer::new(Alphabet::from_bytes(b"abcz"));

    assert_eq!(
        determinizer.determinize(&nfa),
        determinizer.determinize(&optimize(&nfa))
    );
}

#[test]
fn re_dfa_is_deterministic() {
    let patterns = [
        "a*",
        "(a|bc)+z",
        "[01]+1[01][01]",
        r#"[^a1]|a*"#,
        "((a*)*|b?)+",
        "(ab|ac|a)*c",
    ];

    for compact in [false, true] {
        for pattern in patterns {
            let nfa = RegexParser::new().parse(pattern).unwrap();
            let dfa = Determinizer::new(Alphabet::all())
                .compact_classes(compact)
                .determinize(&nfa);

            for (id, state) in dfa.iter() {
                if !state.is_epsilon() {
                    // Consuming states lead to exactly one DFA state.
                    assert_eq!(state.next().len(), 1, "{}: {}", pattern, id);
                    assert!(dfa.state(state.next()[0]).is_epsilon());
                    continue;
                }
                for byte in 0..=255_u8 {
                    let transitions = state
                        .next()
                        .iter()
                        .filter_map(|next| dfa.state(*next).condition())
                        .filter(|class| class.matches(byte))
                        .count();

                    assert!(
                        transitions <= 1,
                        "{}: state {} has {} transitions for {:#04x}",
                        pattern,
                        id,
                        transitions,
                        byte
                    );
                }
            }
        }
    }
}
