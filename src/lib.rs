//! # atomlang — atomic-language decomposition of context-free grammars
//!
//! A formal-language toolkit: a regular-expression term algebra, finite
//! automaton machinery, and the decomposition of an arbitrary (possibly
//! left-recursive, possibly ambiguous) EBNF grammar into a family of
//! **atomic languages** — one regular language per `(symbol, terminal)`
//! pair describing the valid continuations of that symbol's expansion
//! once the terminal has been consumed as its first symbol. The resolved
//! family compiles into a single minimized DFA suitable for linear-time
//! recognition, left recursion included.
//!
//! ## Pipeline
//!
//! ```text
//!  EbnfGrammar
//!       │ derivatives / nullability
//!       ▼
//!  AtomicLanguage system ──(substitution + Arden's rule)──▶ regexes
//!       │                                                      │
//!       │              Thompson → Subset → Minimize            │
//!       ▼                                                      ▼
//!  AtomicLanguageMachines ◀──(merge, minimize once, slice)── SmallDfa
//! ```
//!
//! The automaton layer also runs backwards: `RegularExpression::from_dfa`
//! recovers a regex from any DFA by state elimination, which is what
//! `simplified` uses to shrink printed forms.

pub mod atomic;
pub mod automata;
pub mod grammar;
pub mod machines;
pub mod regex;

#[cfg(test)]
mod tests;

use std::fmt;
use std::hash::Hash;

pub use atomic::{AtomicLanguage, Component, DerivativeSet, LanguageId};
pub use automata::{
    is_structurally_equivalent, Dfa, EpsilonOr, EquivalentDfa, FiniteAutomaton, LabeledEdge,
    MinimizedDfa, MutableFiniteAutomaton, Nfa, SimpleNfa, SmallDfa,
};
pub use grammar::{AtomicLanguageSet, EbnfGrammar, GrammarParseError, GrammarToken, Rule};
pub use machines::{AtomicLanguageMachines, LanguageMachine, MergedEdgeLabel};
pub use regex::{Quantifier, RegularExpression};

/// An alphabet element: a terminal or nonterminal token supplied by the
/// caller. Everything in this crate is generic over it.
///
/// `Ord` buys deterministic sets and maps throughout (alternative sets,
/// subset-construction states, resolution order); `Hash` is needed where
/// states are sets of other states; `Debug` appears in contract-violation
/// messages.
pub trait Symbol: Clone + Ord + Hash + fmt::Debug {}

impl<T: Clone + Ord + Hash + fmt::Debug> Symbol for T {}

/// Values that form a language under concatenation and union.
///
/// Implemented by [`RegularExpression`] and [`DerivativeSet`]; the atomic
/// language algebra is written against these two operations.
pub trait Language: Sized {
    /// The language of `self` followed by `tail`.
    fn concatenated(self, tail: Self) -> Self;
    /// The language accepting anything `self` or `other` accepts.
    fn union(self, other: Self) -> Self;
}
