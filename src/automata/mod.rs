//! Finite-automaton abstractions and concrete machines.
//!
//! Capability traits ([`FiniteAutomaton`], [`Nfa`], [`Dfa`],
//! [`MutableFiniteAutomaton`]) with concrete variants implementing only
//! what they need: [`SimpleNfa`] (dense integer states, adjacency rows),
//! [`EquivalentDfa`] (subset construction over state sets),
//! [`MinimizedDfa`] (quotient wrapper), [`SmallDfa`] (dense concretized
//! DFA). Composition is by wrapping, not subclassing.

pub mod eliminate;
pub mod minimize;
pub mod subset;
pub mod thompson;

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::Hash;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::Symbol;

pub use eliminate::LabeledMultiGraph;
pub use minimize::{is_structurally_equivalent, state_equivalence_sets, MinimizedDfa};
pub use subset::EquivalentDfa;

/// An edge label that is either a bare symbol or the empty transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EpsilonOr<T> {
    Epsilon,
    Symbol(T),
}

impl<T> EpsilonOr<T> {
    /// The wrapped symbol, or `None` for an epsilon label.
    pub fn symbol(&self) -> Option<&T> {
        match self {
            EpsilonOr::Epsilon => None,
            EpsilonOr::Symbol(s) => Some(s),
        }
    }
}

impl<T: fmt::Display> fmt::Display for EpsilonOr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EpsilonOr::Epsilon => f.write_str("ɛ"),
            EpsilonOr::Symbol(s) => write!(f, "{s}"),
        }
    }
}

/// A labeled graph edge for an adjacency list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LabeledEdge<L, V> {
    pub label: L,
    pub target: V,
}

impl<L, V> LabeledEdge<L, V> {
    pub fn new(label: L, target: V) -> Self {
        LabeledEdge { label, target }
    }
}

impl<L: fmt::Display, V: fmt::Display> fmt::Display for LabeledEdge<L, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} via {}", self.target, self.label)
    }
}

/// Anything with a start state, an enumerable state set, an accept
/// predicate, and labeled outgoing edges per state.
pub trait FiniteAutomaton {
    type EdgeLabel;
    type State: Clone + Ord + Hash + fmt::Debug;

    fn start(&self) -> Self::State;
    fn states(&self) -> Vec<Self::State>;
    fn is_accepting(&self, s: &Self::State) -> bool;
    fn outgoing_edges(&self, s: &Self::State) -> Vec<LabeledEdge<Self::EdgeLabel, Self::State>>;
}

/// An automaton that can be grown a state and an edge at a time.
pub trait MutableFiniteAutomaton: FiniteAutomaton + Default {
    fn add_state(&mut self) -> Self::State;
    fn add_edge(&mut self, source: Self::State, target: Self::State, label: Self::EdgeLabel);
    fn set_accepting(&mut self, s: Self::State);
}

/// A nondeterministic automaton whose edges carry "epsilon or a symbol".
///
/// Recognition walks epsilon-closures of state sets, failing as soon as no
/// edge matches the next input symbol.
pub trait Nfa: FiniteAutomaton<EdgeLabel = EpsilonOr<<Self as Nfa>::Symbol>> {
    type Symbol: Symbol;

    /// All states reachable from `seed` via zero or more epsilon edges.
    fn epsilon_closure(&self, seed: &BTreeSet<Self::State>) -> BTreeSet<Self::State> {
        let mut closure = BTreeSet::new();
        let mut pending: Vec<Self::State> = seed.iter().cloned().collect();
        while let Some(s) = pending.pop() {
            if closure.insert(s.clone()) {
                for e in self.outgoing_edges(&s) {
                    if matches!(e.label, EpsilonOr::Epsilon) {
                        pending.push(e.target);
                    }
                }
            }
        }
        closure
    }

    /// The set of accepting states reached by recognizing `word`, empty if
    /// `word` is not recognized.
    fn accepting_states(&self, word: &[Self::Symbol]) -> BTreeSet<Self::State> {
        let mut current = self.epsilon_closure(&BTreeSet::from([self.start()]));
        for c in word {
            let mut next = BTreeSet::new();
            for s in &current {
                for e in self.outgoing_edges(s) {
                    if e.label.symbol() == Some(c) {
                        next.insert(e.target);
                    }
                }
            }
            if next.is_empty() {
                return BTreeSet::new();
            }
            current = self.epsilon_closure(&next);
        }
        current.into_iter().filter(|s| self.is_accepting(s)).collect()
    }

    /// Whether the automaton recognizes `word`.
    fn recognizes(&self, word: &[Self::Symbol]) -> bool {
        !self.accepting_states(word).is_empty()
    }
}

/// A deterministic automaton: bare-symbol edge labels, at most one outgoing
/// edge per label per state.
pub trait Dfa: FiniteAutomaton<EdgeLabel = <Self as Dfa>::Symbol> {
    type Symbol: Symbol;

    /// The state reached from `s` via `label`, if that edge exists.
    fn successor(&self, s: &Self::State, label: &Self::Symbol) -> Option<Self::State>;

    /// The accepting state reached by recognizing `word`, or `None` if the
    /// walk fails or ends in a non-accepting state.
    fn accepting_state(&self, word: &[Self::Symbol]) -> Option<Self::State> {
        let mut current = self.start();
        for c in word {
            current = self.successor(&current, c)?;
        }
        self.is_accepting(&current).then_some(current)
    }

    /// Whether the automaton recognizes `word`.
    fn recognizes(&self, word: &[Self::Symbol]) -> bool {
        self.accepting_state(word).is_some()
    }
}

/// A dense NFA with integer states. State 0 is the start state.
#[derive(Debug, Clone)]
pub struct SimpleNfa<S> {
    outgoing: Vec<Vec<LabeledEdge<EpsilonOr<S>, usize>>>,
    accepting: BTreeSet<usize>,
}

impl<S> SimpleNfa<S> {
    /// An NFA with a single non-accepting start state.
    pub fn new() -> Self {
        SimpleNfa { outgoing: vec![Vec::new()], accepting: BTreeSet::new() }
    }
}

impl<S> Default for SimpleNfa<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Symbol> FiniteAutomaton for SimpleNfa<S> {
    type EdgeLabel = EpsilonOr<S>;
    type State = usize;

    fn start(&self) -> usize {
        0
    }

    fn states(&self) -> Vec<usize> {
        (0..self.outgoing.len()).collect()
    }

    fn is_accepting(&self, s: &usize) -> bool {
        self.accepting.contains(s)
    }

    fn outgoing_edges(&self, s: &usize) -> Vec<LabeledEdge<EpsilonOr<S>, usize>> {
        self.outgoing[*s].clone()
    }
}

impl<S: Symbol> MutableFiniteAutomaton for SimpleNfa<S> {
    fn add_state(&mut self) -> usize {
        self.outgoing.push(Vec::new());
        self.outgoing.len() - 1
    }

    fn add_edge(&mut self, source: usize, target: usize, label: EpsilonOr<S>) {
        self.outgoing[source].push(LabeledEdge::new(label, target));
    }

    fn set_accepting(&mut self, s: usize) {
        self.accepting.insert(s);
    }
}

impl<S: Symbol> Nfa for SimpleNfa<S> {
    type Symbol = S;
}

impl<S: Symbol + fmt::Display> fmt::Display for SimpleNfa<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "start: 0; accepting: {{{}}}",
            self.accepting.iter().map(|s| s.to_string()).join(", ")
        )?;
        for (s, edges) in self.outgoing.iter().enumerate() {
            writeln!(
                f,
                "{s}: {}",
                edges.iter().map(|e| format!("{}->{}", e.label, e.target)).join(" ")
            )?;
        }
        Ok(())
    }
}

/// A dense DFA with integer states, one ordered transition row per state.
///
/// This is the concretized form every other DFA representation reduces to
/// before merging or elimination: states are small indices, so the
/// refinement and ripping passes stay cache-friendly.
#[derive(Debug, Clone)]
pub struct SmallDfa<L> {
    graph: Vec<std::collections::BTreeMap<L, usize>>,
    accepting: BTreeSet<usize>,
    start: usize,
}

impl<L: Symbol> SmallDfa<L> {
    /// A DFA with a single non-accepting start state 0.
    pub fn new() -> Self {
        SmallDfa { graph: vec![Default::default()], accepting: BTreeSet::new(), start: 0 }
    }

    /// An isomorphic dense copy of `source`, states renumbered from 0 in
    /// `source.states()` order.
    pub fn from_dfa<D: Dfa<Symbol = L>>(source: &D) -> Self {
        let mut dfa = SmallDfa { graph: Vec::new(), accepting: BTreeSet::new(), start: 0 };
        let local = dfa.insert_graph(source, |label| label.clone());
        dfa.start = local[&source.start()];
        dfa.accepting = source
            .states()
            .iter()
            .filter(|s| source.is_accepting(s))
            .map(|s| local[s])
            .collect();
        dfa
    }

    /// Embed `source` as a disconnected subgraph, relabeling its edges, and
    /// return the state mapping. Accept flags are not carried over; the
    /// caller decides which embedded states accept.
    pub fn insert_graph<D: Dfa>(
        &mut self,
        source: &D,
        map_label: impl Fn(&D::Symbol) -> L,
    ) -> HashMap<D::State, usize> {
        let states = source.states();
        let mut local = HashMap::with_capacity(states.len());
        for s in &states {
            local.insert(s.clone(), self.add_state());
        }
        for s in &states {
            for e in source.outgoing_edges(s) {
                self.add_edge(local[s], local[&e.target], map_label(&e.label));
            }
        }
        local
    }

    /// All states reachable from `from`, itself included.
    pub fn reachable_states(&self, from: usize) -> BTreeSet<usize> {
        let mut reachable = BTreeSet::new();
        let mut pending = vec![from];
        while let Some(s) = pending.pop() {
            if reachable.insert(s) {
                pending.extend(self.graph[s].values().copied());
            }
        }
        reachable
    }

    /// The Hopcroft-minimized equivalent, re-concretized to dense states.
    pub fn minimized(&self) -> Self {
        Self::from_dfa(&MinimizedDfa::new(self.clone()))
    }

    /// The per-state transition rows, indexed by state.
    pub fn graph(&self) -> &[std::collections::BTreeMap<L, usize>] {
        &self.graph
    }

    /// The accepting state set.
    pub fn accepting(&self) -> &BTreeSet<usize> {
        &self.accepting
    }
}

impl<L: Symbol> Default for SmallDfa<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Symbol> FiniteAutomaton for SmallDfa<L> {
    type EdgeLabel = L;
    type State = usize;

    fn start(&self) -> usize {
        self.start
    }

    fn states(&self) -> Vec<usize> {
        (0..self.graph.len()).collect()
    }

    fn is_accepting(&self, s: &usize) -> bool {
        self.accepting.contains(s)
    }

    fn outgoing_edges(&self, s: &usize) -> Vec<LabeledEdge<L, usize>> {
        self.graph[*s].iter().map(|(label, target)| LabeledEdge::new(label.clone(), *target)).collect()
    }
}

impl<L: Symbol> MutableFiniteAutomaton for SmallDfa<L> {
    fn add_state(&mut self) -> usize {
        self.graph.push(Default::default());
        self.graph.len() - 1
    }

    fn add_edge(&mut self, source: usize, target: usize, label: L) {
        let previous = self.graph[source].insert(label, target);
        assert!(previous.is_none(), "duplicate edge label out of state {source}");
    }

    fn set_accepting(&mut self, s: usize) {
        self.accepting.insert(s);
    }
}

impl<L: Symbol> Dfa for SmallDfa<L> {
    type Symbol = L;

    fn successor(&self, s: &usize, label: &L) -> Option<usize> {
        self.graph[*s].get(label).copied()
    }
}

impl<L: Symbol + fmt::Display> fmt::Display for SmallDfa<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "start: {}; accepting: {{{}}}",
            self.start,
            self.accepting.iter().map(|s| s.to_string()).join(", ")
        )?;
        for (s, row) in self.graph.iter().enumerate() {
            writeln!(
                f,
                "{s}: {}",
                row.iter().map(|(label, target)| format!("{label}->{target}")).join(" ")
            )?;
        }
        Ok(())
    }
}
