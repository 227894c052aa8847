use pretty_assertions::assert_eq;

use super::{BuiltinClasses, RegexParser};
use crate::re::nfa::{CharClass, StateKind};
use crate::re::{Error, SyntaxError, SyntaxErrorKind};

macro_rules! assert_re_nfa {
    ($re:expr, $nfa:expr) => {{
        let nfa = RegexParser::new().parse($re).unwrap();
        assert_eq!($nfa, nfa.to_string());
    }};
}

macro_rules! assert_re_error {
    ($re:expr, $position:expr, $kind:expr) => {{
        assert_eq!(
            RegexParser::new().parse($re).unwrap_err(),
            Error::SyntaxError(SyntaxError::new($position, $kind))
        );
    }};
}

#[test]
fn re_nfa_1() {
    assert_re_nfa!(
        "a",
        r#"
00000: SOURCE EPSILON -> 00001
00001: CLASS [0x61-0x61] -> 00002
00002: ACCEPT
"#
    );
}

#[test]
fn re_nfa_2() {
    assert_re_nfa!(
        "a|b",
        r#"
00000: SOURCE EPSILON -> 00001
00001: EPSILON -> 00002 00005
00002: CLASS [0x61-0x61] -> 00003
00003: EPSILON -> 00004
00004: ACCEPT
00005: CLASS [0x62-0x62] -> 00003
"#
    );
}

#[test]
fn re_nfa_3() {
    assert_re_nfa!(
        "a?",
        r#"
00000: SOURCE EPSILON -> 00001
00001: EPSILON -> 00002 00003
00002: CLASS [0x61-0x61] -> 00003
00003: EPSILON -> 00004
00004: ACCEPT
"#
    );
}

#[test]
fn re_nfa_4() {
    assert_re_nfa!(
        "a+",
        r#"
00000: SOURCE EPSILON -> 00001
00001: CLASS [0x61-0x61] -> 00002
00002: EPSILON -> 00003 00004
00003: BACK -> 00001
00004: ACCEPT
"#
    );
}

#[test]
fn re_nfa_5() {
    assert_re_nfa!(
        "a*",
        r#"
00000: SOURCE EPSILON -> 00001
00001: EPSILON -> 00002 00004
00002: CLASS [0x61-0x61] -> 00003
00003: BACK -> 00001
00004: EPSILON -> 00005
00005: ACCEPT
"#
    );
}

#[test]
fn re_nfa_6() {
    assert_re_nfa!(
        r#"[^a-c\x41]."#,
        r#"
00000: SOURCE EPSILON -> 00001
00001: CLASS ^[0x61-0x63] [0x41-0x41] -> 00002
00002: CLASS ^ -> 00003
00003: ACCEPT
"#
    );
}

#[test]
fn re_nfa_invariants() {
    let patterns = [
        "a",
        "(a|bc)+z",
        "[01]+1[01][01]",
        "((a*)*|b?)+",
        r#"[^a1]|a*"#,
        r#"\w\d\s.\x00"#,
    ];

    for pattern in patterns {
        let nfa = RegexParser::new().parse(pattern).unwrap();

        assert_eq!(nfa.sources().len(), 1, "{}", pattern);

        let accept = nfa.state(nfa.accept());
        assert!(accept.is_epsilon() && accept.is_sink(), "{}", pattern);

        for (id, state) in nfa.iter() {
            for next in state.next() {
                assert!(
                    next.index() < nfa.len(),
                    "{}: {} dangles",
                    pattern,
                    id
                );
            }
            if let StateKind::Consuming(_) = state.kind() {
                assert!(!state.is_back());
            }
        }
    }
}

#[test]
fn escapes() {
    let nfa = RegexParser::new()
        .parse(r#"\x7f\X4A\n\0\r\t\a\b\v\.\-\^"#)
        .unwrap();

    let bytes: Vec<u8> = nfa
        .states()
        .iter()
        .filter_map(|state| state.condition())
        .map(|class| class.ranges()[0].from)
        .collect();

    assert_eq!(
        bytes,
        vec![
            0x7f, 0x4a, b'\n', 0x00, b'\r', b'\t', 0x07, 0x08, 0x0b, b'.',
            b'-', b'^',
        ]
    );
}

#[test]
fn builtin_classes() {
    let hex = CharClass::list(b"0123456789abcdef");
    let parser = RegexParser::new()
        .builtin_classes(BuiltinClasses::new().with(b'h', hex.clone()));

    let nfa = parser.parse(r#"\h"#).unwrap();
    assert_eq!(nfa.states()[1].condition(), Some(&hex));

    // `\d` is not defined in this table, and it's not a valid escape
    // sequence either.
    assert!(parser.parse(r#"\d"#).is_err());

    let digits = BuiltinClasses::default();
    assert!(digits.get(b'd').unwrap().matches(b'7'));
    assert!(!digits.get(b'D').unwrap().matches(b'7'));
    assert!(digits.get(b'S').unwrap().matches(b'x'));
    assert!(digits.get(b'x').is_none());
}

#[test]
fn invalid_syntax() {
    let patterns = [
        "[2-1]", "[]", "]]", "[", "[1-]", "a|", "|b", "a++", "a+?", "a*+",
        "(a", "a)", "(()", "()", r#"a+\!junk!!!!"#, r#"\xg0"#, r#"\q"#,
        "\u{e9}",
    ];

    for pattern in patterns {
        assert!(
            RegexParser::new().parse(pattern).is_err(),
            "`{}` should fail",
            pattern
        );
    }
}

#[test]
fn syntax_error_details() {
    assert_re_error!("[2-1]", 1, SyntaxErrorKind::InvalidRange);
    assert_re_error!("[ab2-1]", 3, SyntaxErrorKind::InvalidRange);
    assert_re_error!("a)", 1, SyntaxErrorKind::TrailingInput);
    assert_re_error!("a|", 1, SyntaxErrorKind::TrailingInput);
    assert_re_error!("a++", 2, SyntaxErrorKind::TrailingInput);
    assert_re_error!("(a", 2, SyntaxErrorKind::UnexpectedEnd);
    assert_re_error!("|b", 0, SyntaxErrorKind::InvalidSyntax(None));
    assert_re_error!(
        r#"\q"#,
        1,
        SyntaxErrorKind::InvalidSyntax(Some(
            "unknown escape sequence `\\q`".to_string()
        ))
    );

    // Errors in atoms that follow other atoms are reported where they
    // happen, not as junk at the end of the pattern.
    assert_re_error!("a[2-1]", 2, SyntaxErrorKind::InvalidRange);
    assert_re_error!("ab[2-1]", 3, SyntaxErrorKind::InvalidRange);
    assert_re_error!("(a[2-1])", 3, SyntaxErrorKind::InvalidRange);
    assert_re_error!("a[2-1]|b", 2, SyntaxErrorKind::InvalidRange);
    assert_re_error!(
        r#"a\q"#,
        2,
        SyntaxErrorKind::InvalidSyntax(Some(
            "unknown escape sequence `\\q`".to_string()
        ))
    );

    let err = RegexParser::new().parse("[2-1]").unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid syntax at character 1: invalid range boundaries"
    );
}
