//! Thompson construction: regex → NFA.
//!
//! Builds the machine bottom-up into any [`MutableFiniteAutomaton`] with
//! epsilon-or-symbol labels. Quantifiers wrap their sub-machine in fresh
//! entry/exit states so that the epsilon bypass and back-edge never capture
//! surrounding structure — the classic hazard with patterns whose
//! sub-machine starts and ends on the same state (empty alternatives,
//! nested stars).

use super::{EpsilonOr, EquivalentDfa, MutableFiniteAutomaton, SimpleNfa, SmallDfa};
use crate::regex::{Quantifier, RegularExpression};
use crate::Symbol;

impl<S: Symbol> RegularExpression<S> {
    /// Append this expression's machine to `nfa` starting at `at`, returning
    /// the state in which a match of the expression ends.
    ///
    /// The caller marks the returned state accepting (or chains further).
    pub fn build_into<A>(&self, nfa: &mut A, at: A::State) -> A::State
    where
        A: MutableFiniteAutomaton<EdgeLabel = EpsilonOr<S>>,
    {
        match self {
            Self::Epsilon => at,
            Self::Null => nfa.add_state(),
            Self::Atom(s) => {
                let end = nfa.add_state();
                nfa.add_edge(at, end.clone(), EpsilonOr::Symbol(s.clone()));
                end
            }
            Self::Sequence(elements) => elements
                .iter()
                .fold(at, |current, element| element.build_into(nfa, current)),
            Self::Alternatives(branches) => {
                let join = nfa.add_state();
                for branch in branches {
                    let entry = nfa.add_state();
                    nfa.add_edge(at.clone(), entry.clone(), EpsilonOr::Epsilon);
                    let end = branch.build_into(nfa, entry);
                    nfa.add_edge(end, join.clone(), EpsilonOr::Epsilon);
                }
                join
            }
            Self::Quantified(base, q) => {
                let entry = nfa.add_state();
                nfa.add_edge(at, entry.clone(), EpsilonOr::Epsilon);
                let body_end = base.build_into(nfa, entry.clone());
                let exit = nfa.add_state();
                nfa.add_edge(body_end, exit.clone(), EpsilonOr::Epsilon);
                if matches!(q, Quantifier::Optional | Quantifier::ZeroOrMore) {
                    nfa.add_edge(entry.clone(), exit.clone(), EpsilonOr::Epsilon);
                }
                if matches!(q, Quantifier::OneOrMore | Quantifier::ZeroOrMore) {
                    nfa.add_edge(exit.clone(), entry, EpsilonOr::Epsilon);
                }
                exit
            }
        }
    }

    /// The complete NFA for this expression: built from a fresh start state,
    /// with the end state marked accepting.
    pub fn to_nfa(&self) -> SimpleNfa<S> {
        let mut nfa = SimpleNfa::new();
        let end = self.build_into(&mut nfa, 0);
        nfa.set_accepting(end);
        nfa
    }

    /// The expression compiled to a dense DFA via Thompson construction and
    /// subset construction. Not minimized; callers that need the minimal
    /// machine wrap the result in [`MinimizedDfa`](super::MinimizedDfa).
    pub fn dfa(&self) -> SmallDfa<S> {
        SmallDfa::from_dfa(&EquivalentDfa::new(self.to_nfa()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automata::Nfa;

    fn atom(c: char) -> RegularExpression<char> {
        RegularExpression::Atom(c)
    }

    #[test]
    fn atom_machine() {
        let n = atom('x').to_nfa();
        assert!(n.recognizes(&['x']));
        assert!(!n.recognizes(&[]));
        assert!(!n.recognizes(&['x', 'x']));
        assert!(!n.recognizes(&['y']));
    }

    #[test]
    fn null_machine_recognizes_nothing() {
        let n = RegularExpression::<char>::Null.to_nfa();
        assert!(!n.recognizes(&[]));
        assert!(!n.recognizes(&['x']));
    }

    #[test]
    fn epsilon_machine_recognizes_only_empty() {
        let n = RegularExpression::<char>::Epsilon.to_nfa();
        assert!(n.recognizes(&[]));
        assert!(!n.recognizes(&['x']));
    }

    #[test]
    fn star_allows_zero_and_many() {
        let n = atom('x').star().to_nfa();
        assert!(n.recognizes(&[]));
        assert!(n.recognizes(&['x']));
        assert!(n.recognizes(&['x', 'x', 'x']));
        assert!(!n.recognizes(&['x', 'y']));
    }

    #[test]
    fn plus_requires_one() {
        let n = atom('x').plus().to_nfa();
        assert!(!n.recognizes(&[]));
        assert!(n.recognizes(&['x']));
        assert!(n.recognizes(&['x', 'x']));
    }

    #[test]
    fn alternatives_fan_out() {
        let n = atom('x').union(atom('y')).to_nfa();
        assert!(n.recognizes(&['x']));
        assert!(n.recognizes(&['y']));
        assert!(!n.recognizes(&[]));
        assert!(!n.recognizes(&['x', 'x']));
    }
}
