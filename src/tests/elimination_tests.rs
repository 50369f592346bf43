//! State elimination and simplification over the shared corpus: the
//! recovered regex must denote the same language as the machine it came
//! from, and `simplified` must never print longer than its input.

use super::automata_tests::regular_cases;
use super::support::{regex, word};
use crate::automata::Dfa;
use crate::regex::RegularExpression;

#[test]
fn recovered_regexes_preserve_the_language() {
    for (pattern, expectations) in regular_cases() {
        let r = regex(pattern);
        let recovered = RegularExpression::from_dfa(&r.dfa());
        assert!(
            recovered.is_functionally_equivalent(&r),
            "pattern: {pattern}, recovered: {recovered}"
        );
        let d = recovered.dfa();
        for (input, expected) in expectations {
            assert_eq!(
                d.recognizes(&word(input)),
                expected,
                "pattern: {pattern}, input: {input}, recovered: {recovered}"
            );
        }
    }
}

#[test]
fn simplification_is_language_preserving_and_non_expanding() {
    for (pattern, _) in regular_cases() {
        let r = regex(pattern);
        let s = r.simplified();
        assert!(
            s.to_string().chars().count() <= r.to_string().chars().count(),
            "pattern: {pattern} grew to {s}"
        );
        assert!(
            s.is_functionally_equivalent(&r),
            "pattern: {pattern} simplified to a different language: {s}"
        );
    }
}

#[test]
fn simplification_collapses_a_redundant_union() {
    // x|xx*|ɛ is x* in disguise.
    let verbose = regex("x|xx*|ɛ");
    let s = verbose.simplified();
    assert!(s.is_functionally_equivalent(&regex("x*")));
    assert!(s.to_string().chars().count() <= verbose.to_string().chars().count());
}
