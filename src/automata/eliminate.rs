//! State elimination: DFA → regex.
//!
//! The DFA is loaded into a bidirectional multigraph whose edges carry
//! regex labels, bracketed by a fresh initial and accept vertex connected
//! with epsilon edges. Interior vertices are then ripped one at a time,
//! each removal rerouting every predecessor/successor pair through a
//! shortcut edge; the label left on the surviving initial→accept edge is
//! the equivalent regular expression.
//!
//! Ripping order prefers vertices with the fewest through-paths
//! (predecessor count × successor count, self-loops excluded), which keeps
//! the intermediate labels from blowing up as badly as an arbitrary order
//! would. The result is still only heuristically small; [`simplified`]
//! compares printed lengths and keeps the shorter rendering.
//!
//! [`simplified`]: RegularExpression::simplified

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::{Dfa, MinimizedDfa};
use crate::regex::RegularExpression;
use crate::Symbol;

/// A bidirectional multigraph with a set of labels per ordered vertex
/// pair.
///
/// Only the operations the ripping pass needs: vertex/edge insertion,
/// whole-vertex removal, and the pre-unioned label bundle between two
/// vertices.
#[derive(Debug, Clone)]
pub struct LabeledMultiGraph<L: Ord> {
    successors: BTreeMap<usize, BTreeSet<usize>>,
    predecessors: BTreeMap<usize, BTreeSet<usize>>,
    labels: BTreeMap<(usize, usize), BTreeSet<L>>,
    next_vertex: usize,
}

impl<L: Ord + Clone> LabeledMultiGraph<L> {
    pub fn new() -> Self {
        LabeledMultiGraph {
            successors: BTreeMap::new(),
            predecessors: BTreeMap::new(),
            labels: BTreeMap::new(),
            next_vertex: 0,
        }
    }

    pub fn add_vertex(&mut self) -> usize {
        let v = self.next_vertex;
        self.next_vertex += 1;
        self.successors.insert(v, BTreeSet::new());
        self.predecessors.insert(v, BTreeSet::new());
        v
    }

    pub fn add_edge(&mut self, source: usize, target: usize, label: L) {
        self.successors.get_mut(&source).expect("source vertex exists").insert(target);
        self.predecessors.get_mut(&target).expect("target vertex exists").insert(source);
        self.labels.entry((source, target)).or_default().insert(label);
    }

    /// Remove `v` together with every edge touching it.
    pub fn remove_vertex(&mut self, v: usize) {
        let succs = self.successors.remove(&v).unwrap_or_default();
        let preds = self.predecessors.remove(&v).unwrap_or_default();
        for s in succs {
            self.labels.remove(&(v, s));
            if let Some(back) = self.predecessors.get_mut(&s) {
                back.remove(&v);
            }
        }
        for p in preds {
            self.labels.remove(&(p, v));
            if let Some(fwd) = self.successors.get_mut(&p) {
                fwd.remove(&v);
            }
        }
        self.labels.remove(&(v, v));
    }

    /// The number of distinct paths through `v`, self-loops excluded.
    /// Cheap proxy for how many shortcut edges ripping `v` creates.
    fn steps_through(&self, v: usize) -> usize {
        let preds = self.predecessors[&v].iter().filter(|p| **p != v).count();
        let succs = self.successors[&v].iter().filter(|s| **s != v).count();
        preds * succs
    }

    /// Embed a DFA's transition graph, relabeling edges, and return the
    /// state → vertex mapping. Start/accept structure is the caller's to
    /// wire up.
    pub fn insert_dfa<D: Dfa>(
        &mut self,
        d: &D,
        map_label: impl Fn(&D::Symbol) -> L,
    ) -> BTreeMap<D::State, usize> {
        let mut vertex = BTreeMap::new();
        for s in d.states() {
            vertex.insert(s, self.add_vertex());
        }
        for s in d.states() {
            for e in d.outgoing_edges(&s) {
                self.add_edge(vertex[&s], vertex[&e.target], map_label(&e.label));
            }
        }
        vertex
    }
}

impl<L: Ord + Clone> Default for LabeledMultiGraph<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Symbol> LabeledMultiGraph<RegularExpression<S>> {
    /// The union of all parallel edge labels from `s` to `t`; `∅` when no
    /// edge exists.
    pub fn bundled_label(&self, s: usize, t: usize) -> RegularExpression<S> {
        self.labels
            .get(&(s, t))
            .into_iter()
            .flatten()
            .cloned()
            .fold(RegularExpression::Null, RegularExpression::union)
    }

    /// Remove `v`, rerouting every predecessor → successor path through a
    /// shortcut edge labeled `first ◦ (self-loop)* ◦ last`.
    ///
    /// Relies on `∅*` normalizing to `ɛ` so a vertex without a self-loop
    /// contributes nothing to the shortcut, and on `x ◦ ɛ` being `x`.
    pub fn rip(&mut self, v: usize) {
        let center = self.bundled_label(v, v).star();
        let preds: Vec<usize> =
            self.predecessors[&v].iter().copied().filter(|p| *p != v).collect();
        let succs: Vec<usize> =
            self.successors[&v].iter().copied().filter(|s| *s != v).collect();
        for &p in &preds {
            let first = self.bundled_label(p, v);
            for &s in &succs {
                let last = self.bundled_label(v, s);
                let shortcut =
                    first.clone().concatenated(center.clone()).concatenated(last);
                self.add_edge(p, s, shortcut);
            }
        }
        self.remove_vertex(v);
    }
}

impl<S: Symbol> RegularExpression<S> {
    /// Recover a regex denoting the same language as `d` by state
    /// elimination.
    pub fn from_dfa<D: Dfa<Symbol = S>>(d: &D) -> Self {
        let mut g = LabeledMultiGraph::new();
        let vertex = g.insert_dfa(d, |label| Self::Atom(label.clone()));
        let initial = g.add_vertex();
        let accept = g.add_vertex();
        g.add_edge(initial, vertex[&d.start()], Self::Epsilon);
        for s in d.states() {
            if d.is_accepting(&s) {
                g.add_edge(vertex[&s], accept, Self::Epsilon);
            }
        }

        let mut interior: Vec<usize> = vertex.into_values().collect();
        while !interior.is_empty() {
            // Re-rank each round: ripping changes the degree of every
            // neighbor of the removed vertex.
            interior.sort_by_key(|v| std::cmp::Reverse(g.steps_through(*v)));
            let v = interior.pop().expect("loop guard");
            g.rip(v);
        }
        g.bundled_label(initial, accept)
    }
}

/// The candidate whose printed form is shorter; ties keep `a`.
fn shorter_rendering<S: Symbol + fmt::Display>(
    a: RegularExpression<S>,
    b: RegularExpression<S>,
) -> RegularExpression<S> {
    if b.to_string().chars().count() < a.to_string().chars().count() {
        b
    } else {
        a
    }
}

impl<S: Symbol + fmt::Display> RegularExpression<S> {
    /// A possibly shorter expression for the same language: minimize the
    /// compiled DFA, rip it back to a regex, and keep whichever of the two
    /// renderings prints shorter. A heuristic, not a canonical minimal
    /// form.
    pub fn simplified(&self) -> Self {
        let minimized = MinimizedDfa::new(self.dfa());
        let ripped = Self::from_dfa(&minimized);
        shorter_rendering(self.clone(), ripped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automata::Dfa;

    fn atom(c: char) -> RegularExpression<char> {
        RegularExpression::Atom(c)
    }

    #[test]
    fn round_trips_a_single_atom() {
        let r = atom('x');
        let recovered = RegularExpression::from_dfa(&r.dfa());
        assert!(recovered.is_functionally_equivalent(&r));
    }

    #[test]
    fn recovers_the_language_of_a_loop() {
        let r = atom('x').concatenated(atom('y').union(atom('z')).plus());
        let recovered = RegularExpression::from_dfa(&r.dfa());
        assert!(recovered.is_functionally_equivalent(&r));
    }

    #[test]
    fn ripping_handles_self_loops() {
        // x*y — the x* state carries a self-loop that must fold into the
        // shortcut as its star.
        let r = atom('x').star().concatenated(atom('y'));
        let recovered = RegularExpression::from_dfa(&r.dfa());
        assert!(recovered.is_functionally_equivalent(&r));
        let d = recovered.dfa();
        assert!(d.recognizes(&['y']));
        assert!(d.recognizes(&['x', 'x', 'y']));
        assert!(!d.recognizes(&['x']));
    }

    #[test]
    fn null_dfa_rips_to_null() {
        let r = RegularExpression::<char>::Null;
        let recovered = RegularExpression::from_dfa(&r.dfa());
        assert!(recovered.is_functionally_equivalent(&r));
    }

    #[test]
    fn simplified_is_never_longer() {
        let verbose = atom('x')
            .union(atom('x').concatenated(atom('x').star()))
            .union(RegularExpression::Epsilon);
        let simplified = verbose.simplified();
        assert!(simplified.to_string().len() <= verbose.to_string().len());
        assert!(simplified.is_functionally_equivalent(&verbose));
    }
}
