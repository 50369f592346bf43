//! Recognition agreement across automaton representations: for every
//! pattern in the corpus, the NFA, the subset-constructed DFA, its dense
//! copy, and the minimized DFA must agree on every input, and
//! minimization must never grow the state count.

use super::support::{regex, word};
use crate::automata::{Dfa, EquivalentDfa, FiniteAutomaton, MinimizedDfa, Nfa, SmallDfa};

/// Patterns with expected acceptance per input. The empty-alternative
/// patterns near the end are the treacherous ones: their sub-machines
/// start and end on the same state unless construction keeps them apart.
pub fn regular_cases() -> Vec<(&'static str, Vec<(&'static str, bool)>)> {
    vec![
        // Basic cases
        ("", vec![("", true), ("x", false), ("xy", false)]),
        ("x", vec![("", false), ("x", true), ("xy", false)]),
        ("x+", vec![("", false), ("x", true), ("xy", false), ("xx", true)]),
        ("x*", vec![("", true), ("x", true), ("xy", false), ("xx", true)]),
        ("x?", vec![("", true), ("x", true), ("xy", false), ("xx", false)]),
        ("x|y", vec![("", false), ("x", true), ("y", true), ("xx", false)]),
        // Nested groups
        ("(xy)+", vec![("", false), ("xy", true), ("xyxy", true), ("x", false)]),
        (
            "(x|y)*",
            vec![("", true), ("x", true), ("y", true), ("xy", true), ("yx", true), ("xyxy", true)],
        ),
        // Complex combinations
        (
            "x(y|z)+",
            vec![
                ("", false),
                ("x", false),
                ("xy", true),
                ("xz", true),
                ("xyz", true),
                ("xyzyz", true),
            ],
        ),
        (
            "(ab|cd)*",
            vec![("", true), ("ab", true), ("cd", true), ("abcd", true), ("cdab", true), ("abc", false)],
        ),
        // Multiple alternatives
        (
            "a|b|c",
            vec![("", false), ("a", true), ("b", true), ("c", true), ("d", false), ("ab", false)],
        ),
        (
            "(x|y)(a|b)",
            vec![("xa", true), ("xb", true), ("ya", true), ("yb", true), ("xx", false), ("ab", false)],
        ),
        // Double nesting
        (
            "((x|y)z)+",
            vec![
                ("xa", false),
                ("xy", false),
                ("xz", true),
                ("yz", true),
                ("xzx", false),
                ("xzyy", false),
                ("xzyz", true),
            ],
        ),
        // Empty alternatives
        ("x(|y)z", vec![("xyyz", false), ("xz", true), ("xyz", true), ("x", false)]),
        ("x(y|)z", vec![("xyyz", false), ("xz", true), ("xyz", true), ("x", false)]),
        (
            "xyzzyq|x*y+q",
            vec![
                ("xyzxy", false),
                ("yxyq", false),
                ("xyzzyq", true),
                ("yyq", true),
                ("xq", false),
                ("q", false),
                ("xyq", true),
            ],
        ),
    ]
}

#[test]
fn representations_agree_on_the_corpus() {
    for (pattern, expectations) in regular_cases() {
        let r = regex(pattern);
        let n = r.to_nfa();
        let d = EquivalentDfa::new(n.clone());
        let small = SmallDfa::from_dfa(&d);
        let m = MinimizedDfa::new(small.clone());
        assert!(
            m.states().len() <= small.states().len(),
            "pattern: {pattern}\n---- DFA ----\n{small}\n---- MINIMIZED ----\n{m}"
        );

        for (input, expected) in expectations {
            let w = word(input);
            assert_eq!(
                n.recognizes(&w),
                expected,
                "pattern: {pattern}, input: {input}, nfa:\n{n}"
            );
            assert_eq!(
                d.recognizes(&w),
                expected,
                "pattern: {pattern}, input: {input}, dfa:\n{small}"
            );
            assert_eq!(
                small.recognizes(&w),
                expected,
                "pattern: {pattern}, input: {input}, dense dfa:\n{small}"
            );
            assert_eq!(
                m.recognizes(&w),
                expected,
                "pattern: {pattern}, input: {input}, minimized dfa:\n{m}"
            );
        }
    }
}

#[test]
fn minimization_preserves_language_over_short_words() {
    let alphabet = ['x', 'y', 'z'];
    for (pattern, _) in regular_cases() {
        let r = regex(pattern);
        let d = r.dfa();
        let m = MinimizedDfa::new(d.clone());
        for w in words_up_to(3, &alphabet) {
            assert_eq!(
                m.recognizes(&w),
                d.recognizes(&w),
                "pattern: {pattern}, input: {w:?}"
            );
        }
    }
}

/// All words over `alphabet` of length ≤ `n`.
fn words_up_to(n: usize, alphabet: &[char]) -> Vec<Vec<char>> {
    let mut words = vec![Vec::new()];
    let mut frontier = vec![Vec::new()];
    for _ in 0..n {
        let mut next = Vec::new();
        for w in &frontier {
            for c in alphabet {
                let mut longer = w.clone();
                longer.push(*c);
                next.push(longer);
            }
        }
        words.extend(next.iter().cloned());
        frontier = next;
    }
    words
}
