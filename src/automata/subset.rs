//! Subset construction: NFA → DFA.
//!
//! The DFA's states are epsilon-closures of NFA state sets, discovered by a
//! worklist breadth-first traversal. The state space is bounded by the NFA
//! powerset but in practice governed by reachability; each reachable subset
//! is visited once.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;

use super::{Dfa, EpsilonOr, FiniteAutomaton, LabeledEdge, Nfa};

/// The deterministic equivalent of an NFA.
///
/// States are sets of source-NFA states; a state accepts iff it contains an
/// accepting source state. Discovery order is preserved so downstream
/// concretization is deterministic.
#[derive(Debug, Clone)]
pub struct EquivalentDfa<N: Nfa> {
    source: N,
    start: BTreeSet<N::State>,
    states: IndexSet<BTreeSet<N::State>>,
    outgoing: IndexMap<BTreeSet<N::State>, BTreeMap<N::Symbol, BTreeSet<N::State>>>,
}

impl<N: Nfa> EquivalentDfa<N> {
    pub fn new(source: N) -> Self {
        let start = source.epsilon_closure(&BTreeSet::from([source.start()]));
        let mut states = IndexSet::new();
        let mut outgoing = IndexMap::new();

        let mut pending = VecDeque::from([start.clone()]);
        while let Some(current) = pending.pop_front() {
            if !states.insert(current.clone()) {
                continue;
            }

            // Union of NFA targets per symbol over every member of the set.
            let mut moves: BTreeMap<N::Symbol, BTreeSet<N::State>> = BTreeMap::new();
            for s in &current {
                for e in source.outgoing_edges(s) {
                    if let EpsilonOr::Symbol(symbol) = e.label {
                        moves.entry(symbol).or_default().insert(e.target);
                    }
                }
            }

            let closed: BTreeMap<N::Symbol, BTreeSet<N::State>> = moves
                .into_iter()
                .map(|(symbol, targets)| (symbol, source.epsilon_closure(&targets)))
                .collect();

            for target in closed.values() {
                pending.push_back(target.clone());
            }
            outgoing.insert(current, closed);
        }

        EquivalentDfa { source, start, states, outgoing }
    }
}

impl<N: Nfa> FiniteAutomaton for EquivalentDfa<N> {
    type EdgeLabel = N::Symbol;
    type State = BTreeSet<N::State>;

    fn start(&self) -> Self::State {
        self.start.clone()
    }

    fn states(&self) -> Vec<Self::State> {
        self.states.iter().cloned().collect()
    }

    fn is_accepting(&self, s: &Self::State) -> bool {
        s.iter().any(|ns| self.source.is_accepting(ns))
    }

    fn outgoing_edges(&self, s: &Self::State) -> Vec<LabeledEdge<N::Symbol, Self::State>> {
        self.outgoing
            .get(s)
            .map(|row| {
                row.iter()
                    .map(|(label, target)| LabeledEdge::new(label.clone(), target.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl<N: Nfa> Dfa for EquivalentDfa<N> {
    type Symbol = N::Symbol;

    fn successor(&self, s: &Self::State, label: &N::Symbol) -> Option<Self::State> {
        self.outgoing.get(s).and_then(|row| row.get(label).cloned())
    }
}

impl<N: Nfa> fmt::Display for EquivalentDfa<N>
where
    N::Symbol: fmt::Display,
    N::State: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = |s: &BTreeSet<N::State>| {
            format!("{{{}}}", s.iter().map(|ns| ns.to_string()).join(","))
        };
        writeln!(f, "start: {}", name(&self.start))?;
        for s in &self.states {
            writeln!(
                f,
                "{}{}: {}",
                if self.is_accepting(s) { "*" } else { "" },
                name(s),
                self.outgoing[s]
                    .iter()
                    .map(|(label, target)| format!("{label}->{}", name(target)))
                    .join(" ")
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex::RegularExpression;

    fn atom(c: char) -> RegularExpression<char> {
        RegularExpression::Atom(c)
    }

    #[test]
    fn determinizes_an_alternation_of_prefixes() {
        // x(y|z)+ — shared prefix forces state-set states.
        let r = atom('x').concatenated(atom('y').union(atom('z')).plus());
        let d = EquivalentDfa::new(r.to_nfa());

        assert!(!d.recognizes(&[]));
        assert!(!d.recognizes(&['x']));
        assert!(d.recognizes(&['x', 'y']));
        assert!(d.recognizes(&['x', 'z']));
        assert!(d.recognizes(&['x', 'y', 'z', 'y', 'z']));
        assert!(!d.recognizes(&['y']));
    }

    #[test]
    fn one_outgoing_edge_per_label_per_state() {
        let r = atom('x').union(atom('x').concatenated(atom('y')));
        let d = EquivalentDfa::new(r.to_nfa());
        for s in d.states() {
            let labels: Vec<_> = d.outgoing_edges(&s).into_iter().map(|e| e.label).collect();
            let mut deduped = labels.clone();
            deduped.dedup();
            assert_eq!(labels, deduped, "duplicate label out of {s:?}");
        }
    }

    #[test]
    fn visits_each_reachable_subset_once() {
        let r = atom('x').star().concatenated(atom('y').plus());
        let d = EquivalentDfa::new(r.to_nfa());
        let states = d.states();
        let unique: std::collections::BTreeSet<_> = states.iter().cloned().collect();
        assert_eq!(states.len(), unique.len());
    }
}
