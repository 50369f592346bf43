//! The merged atomic-language machine set.
//!
//! Compiles every resolved atomic language to a DFA, embeds them all into
//! one automaton with a per-id entry-point edge from a shared start
//! state, and minimizes the merged automaton once. Languages with
//! structurally identical suffixes then share states, which minimizing
//! each language independently could never achieve; each id's machine is
//! a reachable slice of the shared graph.
//!
//! The per-language compilations are independent and run in parallel;
//! the merge into the shared automaton is serial.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::atomic::LanguageId;
use crate::automata::{Dfa, FiniteAutomaton, LabeledEdge, MutableFiniteAutomaton, SmallDfa};
use crate::grammar::AtomicLanguageSet;
use crate::Symbol;

/// Edge label of the merged automaton: an ordinary symbol transition
/// inside some language's subgraph, or the entry-point edge naming which
/// language a walk from the shared start is entering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MergedEdgeLabel<S: Ord> {
    Normal(S),
    EntryPoint(LanguageId<S>),
}

impl<S: Ord> MergedEdgeLabel<S> {
    /// The wrapped symbol, or `None` for an entry-point edge.
    pub fn normal(&self) -> Option<&S> {
        match self {
            MergedEdgeLabel::Normal(s) => Some(s),
            MergedEdgeLabel::EntryPoint(_) => None,
        }
    }

    /// The wrapped language id, or `None` for a symbol edge.
    pub fn entry_point(&self) -> Option<&LanguageId<S>> {
        match self {
            MergedEdgeLabel::Normal(_) => None,
            MergedEdgeLabel::EntryPoint(id) => Some(id),
        }
    }
}

impl<S: Ord + fmt::Display> fmt::Display for MergedEdgeLabel<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergedEdgeLabel::Normal(s) => write!(f, "{s}"),
            MergedEdgeLabel::EntryPoint(id) => write!(f, "{id}"),
        }
    }
}

/// One atomic language's machine: a start state and the reachable slice
/// of the shared minimized transition graph.
#[derive(Debug, Clone)]
pub struct LanguageMachine<S> {
    start: usize,
    states: BTreeSet<usize>,
    graph: Arc<Vec<BTreeMap<S, usize>>>,
    accepting: BTreeSet<usize>,
}

impl<S: Symbol> FiniteAutomaton for LanguageMachine<S> {
    type EdgeLabel = S;
    type State = usize;

    fn start(&self) -> usize {
        self.start
    }

    fn states(&self) -> Vec<usize> {
        self.states.iter().copied().collect()
    }

    fn is_accepting(&self, s: &usize) -> bool {
        self.accepting.contains(s)
    }

    fn outgoing_edges(&self, s: &usize) -> Vec<LabeledEdge<S, usize>> {
        self.graph[*s]
            .iter()
            .map(|(label, target)| LabeledEdge::new(label.clone(), *target))
            .collect()
    }
}

impl<S: Symbol> Dfa for LanguageMachine<S> {
    type Symbol = S;

    fn successor(&self, s: &usize, label: &S) -> Option<usize> {
        self.graph[*s].get(label).copied()
    }
}

/// Every resolved atomic language of a grammar, compiled and merged into
/// one minimized DFA, sliced back into per-id machines.
#[derive(Debug, Clone)]
pub struct AtomicLanguageMachines<S: Ord> {
    machines: BTreeMap<LanguageId<S>, LanguageMachine<S>>,
    merged: SmallDfa<MergedEdgeLabel<S>>,
}

impl<S: Symbol + Send + Sync> AtomicLanguageMachines<S> {
    pub fn new(languages: &AtomicLanguageSet<S>) -> Self {
        // Independent compilations; merge order stays the map order.
        let compiled: Vec<(LanguageId<S>, SmallDfa<S>)> = languages
            .par_iter()
            .map(|(id, language)| (id.clone(), language.dfa()))
            .collect();

        let mut merged: SmallDfa<MergedEdgeLabel<S>> = SmallDfa::new();
        for (id, d) in &compiled {
            let local = merged.insert_graph(d, |label| MergedEdgeLabel::Normal(label.clone()));
            merged.add_edge(
                merged.start(),
                local[&d.start()],
                MergedEdgeLabel::EntryPoint(id.clone()),
            );
            for s in d.states() {
                if d.is_accepting(&s) {
                    merged.set_accepting(local[&s]);
                }
            }
        }
        let merged = merged.minimized();

        // The shared symbol-only transition graph; entry-point edges only
        // ever leave the start state.
        let graph: Arc<Vec<BTreeMap<S, usize>>> = Arc::new(
            merged
                .graph()
                .iter()
                .map(|row| {
                    row.iter()
                        .filter_map(|(label, target)| {
                            label.normal().map(|s| (s.clone(), *target))
                        })
                        .collect()
                })
                .collect(),
        );

        let mut machines = BTreeMap::new();
        for e in merged.outgoing_edges(&merged.start()) {
            let MergedEdgeLabel::EntryPoint(id) = e.label else {
                panic!("non-entry edge out of the merged start state");
            };
            let states = merged.reachable_states(e.target);
            let accepting = merged.accepting().intersection(&states).copied().collect();
            machines.insert(
                id,
                LanguageMachine { start: e.target, states, graph: Arc::clone(&graph), accepting },
            );
        }

        AtomicLanguageMachines { machines, merged }
    }
}

impl<S: Symbol> AtomicLanguageMachines<S> {
    /// The machine for `id`, if that language resolved to anything.
    pub fn machine(&self, id: &LanguageId<S>) -> Option<&LanguageMachine<S>> {
        self.machines.get(id)
    }

    pub fn machines(&self) -> &BTreeMap<LanguageId<S>, LanguageMachine<S>> {
        &self.machines
    }

    /// The single minimized automaton all machines slice into.
    pub fn merged_dfa(&self) -> &SmallDfa<MergedEdgeLabel<S>> {
        &self.merged
    }
}

impl<S: Symbol> Index<&LanguageId<S>> for AtomicLanguageMachines<S> {
    type Output = LanguageMachine<S>;

    fn index(&self, id: &LanguageId<S>) -> &LanguageMachine<S> {
        self.machine(id).expect("no machine for the requested language id")
    }
}

impl<S: Symbol + fmt::Display> fmt::Display for AtomicLanguageMachines<S> {
    /// Graphviz digraph of the merged machine: one `shape=none` entry
    /// node per language id, double circles on accepting states.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph \"Atomic Languages\" {{")?;
        writeln!(f, "  node [shape=circle]; edge [len=1.5];")?;
        writeln!(f)?;
        for (id, machine) in &self.machines {
            writeln!(f, "  \"{id}\" [shape=none]; \"{id}\" -> {};", machine.start)?;
        }
        let start = self.merged.start();
        for s in self.merged.states() {
            if s == start {
                continue;
            }
            if self.merged.is_accepting(&s) {
                writeln!(f, "  {s} [shape=doublecircle];")?;
            }
            for e in self.merged.outgoing_edges(&s) {
                let label = e.label.normal().expect("interior edges carry symbols");
                writeln!(f, "  {s} -> {} [label=\"{label}\"];", e.target)?;
            }
        }
        writeln!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex::RegularExpression;

    type R = RegularExpression<char>;

    fn atom(c: char) -> R {
        R::Atom(c)
    }

    fn machine_set(languages: &[(char, char, R)]) -> AtomicLanguageMachines<char> {
        let set: AtomicLanguageSet<char> = languages
            .iter()
            .map(|(base, prefix, r)| (LanguageId::new(*base, *prefix), r.clone()))
            .collect();
        AtomicLanguageMachines::new(&set)
    }

    #[test]
    fn every_language_gets_an_entry_point() {
        let machines = machine_set(&[
            ('A', 'x', atom('y').star()),
            ('B', 'x', atom('z')),
        ]);
        assert!(machines.machine(&LanguageId::new('A', 'x')).is_some());
        assert!(machines.machine(&LanguageId::new('B', 'x')).is_some());
        assert!(machines.machine(&LanguageId::new('C', 'x')).is_none());
    }

    #[test]
    fn sliced_machines_recognize_their_own_language() {
        let machines = machine_set(&[
            ('A', 'x', atom('y').star()),
            ('B', 'x', atom('y').concatenated(atom('z'))),
        ]);
        let a = &machines[&LanguageId::new('A', 'x')];
        assert!(a.recognizes(&[]));
        assert!(a.recognizes(&['y', 'y']));
        assert!(!a.recognizes(&['z']));

        let b = &machines[&LanguageId::new('B', 'x')];
        assert!(b.recognizes(&['y', 'z']));
        assert!(!b.recognizes(&['y']));
        assert!(!b.recognizes(&[]));
    }

    #[test]
    fn identical_languages_share_their_subgraph() {
        let machines = machine_set(&[
            ('A', 'x', atom('y').plus()),
            ('B', 'x', atom('y').plus()),
        ]);
        let a = &machines[&LanguageId::new('A', 'x')];
        let b = &machines[&LanguageId::new('B', 'x')];
        assert_eq!(a.start(), b.start());
        assert_eq!(a.states(), b.states());
    }

    #[test]
    fn dot_rendering_names_every_entry() {
        let machines = machine_set(&[('A', 'x', atom('y'))]);
        let dot = machines.to_string();
        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("\"A⁽x⁾\" [shape=none]"));
        assert!(dot.contains("doublecircle"));
    }
}
