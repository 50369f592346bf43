//! EBNF grammar and the atomic-language decomposition driver.
//!
//! [`EbnfGrammar`] holds an ordered list of rules whose right-hand sides
//! are regular expressions over terminals and nonterminals, with the
//! derived symbol sets and the fixed-point nullable set computed once at
//! construction.
//!
//! The decomposition computes, for every `(symbol, terminal)` pair, the
//! regular language of valid continuations after that terminal opens the
//! symbol's expansion: [`derivatives`] strips one leading terminal from a
//! rule body, [`raw_atomic_languages`] assembles the full system of
//! partially resolved languages, and [`atomic_languages`] closes the
//! system by depth-first substitution, leaving cycles (mutual and left
//! recursion) to Arden's rule.
//!
//! [`derivatives`]: EbnfGrammar::derivatives
//! [`raw_atomic_languages`]: EbnfGrammar::raw_atomic_languages
//! [`atomic_languages`]: EbnfGrammar::atomic_languages

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use itertools::iproduct;
use serde::{Deserialize, Serialize};

use crate::atomic::{AtomicLanguage, Component, DerivativeSet, LanguageId};
use crate::regex::parse::Token;
use crate::regex::{Quantifier, RegularExpression};
use crate::{Language, Symbol};

/// One production: a nonterminal defined by a regular expression over the
/// grammar's symbols. A nonterminal may have any number of rules; their
/// bodies are alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule<S: Ord> {
    pub lhs: S,
    pub rhs: RegularExpression<S>,
}

impl<S: Ord> Rule<S> {
    pub fn new(lhs: S, rhs: RegularExpression<S>) -> Self {
        Rule { lhs, rhs }
    }
}

impl<S: Symbol + fmt::Display> fmt::Display for Rule<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.lhs, self.rhs)
    }
}

/// The fully resolved decomposition: one closed-form regular expression
/// per `(symbol, terminal)` pair that has any continuation at all.
pub type AtomicLanguageSet<S> = BTreeMap<LanguageId<S>, RegularExpression<S>>;

/// One classified token of grammar input: rules are an alternating
/// `Lhs`, `IsDefinedAs`, `Rhs` sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarToken<S> {
    Lhs(S),
    IsDefinedAs,
    /// The rule body as a regex token sequence, handed to the regex
    /// builder unparsed.
    Rhs(Vec<Token<S>>),
}

/// Error from a structurally invalid grammar token stream.
#[derive(Debug, Clone)]
pub struct GrammarParseError {
    /// Human-readable description naming the offending token.
    pub message: String,
}

impl GrammarParseError {
    fn new(message: impl Into<String>) -> Self {
        GrammarParseError { message: message.into() }
    }
}

impl fmt::Display for GrammarParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "grammar parse error: {}", self.message)
    }
}

impl std::error::Error for GrammarParseError {}

/// Internal per-language tag for the resolution walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResolutionStatus {
    Unvisited,
    InProgress,
    Resolved,
}

/// A context-free grammar in extended regular-expression form.
///
/// Rules never mutate after construction; the derived sets and the
/// nullable fixed point are computed once.
#[derive(Debug, Clone)]
pub struct EbnfGrammar<S: Ord> {
    start: S,
    rules: Vec<Rule<S>>,
    terminals: BTreeSet<S>,
    non_terminals: BTreeSet<S>,
    symbols: BTreeSet<S>,
    nullables: BTreeSet<S>,
    rules_by_lhs: BTreeMap<S, Vec<usize>>,
}

impl<S: Symbol> EbnfGrammar<S> {
    pub fn new(start: S, rules: Vec<Rule<S>>) -> Self {
        let non_terminals: BTreeSet<S> = rules.iter().map(|r| r.lhs.clone()).collect();
        let terminals: BTreeSet<S> = rules
            .iter()
            .flat_map(|r| r.rhs.symbols())
            .filter(|s| !non_terminals.contains(s))
            .collect();
        let symbols: BTreeSet<S> = terminals.union(&non_terminals).cloned().collect();
        let mut rules_by_lhs: BTreeMap<S, Vec<usize>> = BTreeMap::new();
        for (i, r) in rules.iter().enumerate() {
            rules_by_lhs.entry(r.lhs.clone()).or_default().push(i);
        }

        let mut grammar = EbnfGrammar {
            start,
            rules,
            terminals,
            non_terminals,
            symbols,
            nullables: BTreeSet::new(),
            rules_by_lhs,
        };
        grammar.nullables = grammar.find_nullables();
        grammar
    }

    /// Build a grammar from a token stream. The first rule's left-hand
    /// side is the start symbol.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarParseError`] naming the offending token on any
    /// out-of-order token, a truncated rule, a malformed rule body, or an
    /// empty stream.
    pub fn read_from(
        tokens: impl IntoIterator<Item = GrammarToken<S>>,
    ) -> Result<Self, GrammarParseError> {
        let mut input = tokens.into_iter();
        let mut rules = Vec::new();

        while let Some(first) = input.next() {
            let lhs = match first {
                GrammarToken::Lhs(lhs) => lhs,
                t => {
                    return Err(GrammarParseError::new(format!("unexpected token: {t:?}")));
                }
            };
            match input.next() {
                Some(GrammarToken::IsDefinedAs) => {}
                Some(t) => {
                    return Err(GrammarParseError::new(format!(
                        "expected is-defined-as token; got {t:?}"
                    )));
                }
                None => {
                    return Err(GrammarParseError::new(
                        "expected is-defined-as token; got end of input",
                    ));
                }
            }
            let body = match input.next() {
                Some(GrammarToken::Rhs(body)) => body,
                Some(t) => {
                    return Err(GrammarParseError::new(format!(
                        "expected rule body; got {t:?}"
                    )));
                }
                None => {
                    return Err(GrammarParseError::new("expected rule body; got end of input"));
                }
            };
            let rhs = RegularExpression::read_from(body)
                .map_err(|e| GrammarParseError::new(e.message))?;
            rules.push(Rule::new(lhs, rhs));
        }

        let Some(start) = rules.first().map(|r| r.lhs.clone()) else {
            return Err(GrammarParseError::new("grammar has no rules"));
        };
        Ok(Self::new(start, rules))
    }

    pub fn start(&self) -> &S {
        &self.start
    }

    pub fn rules(&self) -> &[Rule<S>] {
        &self.rules
    }

    pub fn terminals(&self) -> &BTreeSet<S> {
        &self.terminals
    }

    pub fn non_terminals(&self) -> &BTreeSet<S> {
        &self.non_terminals
    }

    /// Terminals and nonterminals together; the two sets are disjoint.
    pub fn symbols(&self) -> &BTreeSet<S> {
        &self.symbols
    }

    /// The symbols whose language contains the empty string.
    pub fn nullables(&self) -> &BTreeSet<S> {
        &self.nullables
    }

    /// The rules defining `lhs`, in declaration order.
    pub fn rules_for<'a>(&'a self, lhs: &S) -> impl Iterator<Item = &'a Rule<S>> {
        self.rules_by_lhs
            .get(lhs)
            .into_iter()
            .flatten()
            .map(|i| &self.rules[*i])
    }

    /// Iterative fixed point: a symbol is nullable once some rule body
    /// for it is nullable under the current set. Monotone and bounded by
    /// the nonterminal count, so it terminates.
    fn find_nullables(&self) -> BTreeSet<S> {
        let mut nullables = BTreeSet::new();
        loop {
            let mut grew = false;
            for r in &self.rules {
                if !nullables.contains(&r.lhs) && r.rhs.is_nullable(&nullables) {
                    nullables.insert(r.lhs.clone());
                    grew = true;
                }
            }
            if !grew {
                return nullables;
            }
        }
    }

    /// The nonterminals that can begin an expansion of `s`.
    pub fn leading_nonterminals(&self, s: &S) -> BTreeSet<S> {
        self.rules_for(s)
            .flat_map(|r| r.rhs.leading_symbols(&self.nullables))
            .filter(|x| self.non_terminals.contains(x))
            .collect()
    }

    /// What remains of `s` after consuming one occurrence of `t` as its
    /// first symbol.
    ///
    /// A quantified loop re-enters through `base*`; a sequence's
    /// derivative is its head's derivative followed by the nulled
    /// remainder, unioned with the remainder's own derivative when the
    /// head can match empty.
    pub fn derivatives(&self, s: &RegularExpression<S>, t: &S) -> DerivativeSet<S> {
        match s {
            RegularExpression::Epsilon | RegularExpression::Null => DerivativeSet::new(),

            RegularExpression::Quantified(base, q) => {
                let d = self.derivatives(base, t);
                if *q == Quantifier::Optional || d.is_empty() {
                    return d;
                }
                d.concatenated(DerivativeSet::singleton(Component::resolved(
                    (**base).clone().star(),
                )))
            }

            RegularExpression::Alternatives(branches) => branches
                .iter()
                .fold(DerivativeSet::new(), |acc, x| acc.union(self.derivatives(x, t))),

            RegularExpression::Atom(x) if self.terminals.contains(x) => {
                if x == t {
                    DerivativeSet::singleton(Component::resolved(RegularExpression::Epsilon))
                } else {
                    DerivativeSet::new()
                }
            }
            RegularExpression::Atom(x) => {
                DerivativeSet::singleton(Component::leading(x.clone(), RegularExpression::Epsilon))
            }

            RegularExpression::Sequence(elements) => {
                let (first, rest) = elements.split_first().expect("sequences are non-empty");
                let d = self.derivatives(first, t);
                if rest.is_empty() {
                    return d;
                }
                let tail = RegularExpression::sequence(rest.iter().cloned());
                let mut result = if d.is_empty() {
                    d
                } else {
                    d.concatenated(DerivativeSet::singleton(Component::resolved(
                        tail.nulled(&self.nullables),
                    )))
                };
                // The matched terminal may begin inside the tail when the
                // head matches empty.
                if first.is_nullable(&self.nullables) {
                    result = result.union(self.derivatives(&tail, t));
                }
                result
            }
        }
    }

    /// The derivative set for one atomic-language id: the union over every
    /// rule for its base, or the trivial `ɛ` language when the base is
    /// itself a terminal matching the stripped prefix.
    pub fn atomic_language_components(&self, id: &LanguageId<S>) -> DerivativeSet<S> {
        if self.terminals.contains(&id.base) {
            return if id.base == id.stripped_prefix {
                DerivativeSet::singleton(Component::resolved(RegularExpression::Epsilon))
            } else {
                DerivativeSet::new()
            };
        }
        self.rules_for(&id.base).fold(DerivativeSet::new(), |acc, r| {
            acc.union(self.derivatives(&r.rhs, &id.stripped_prefix))
        })
    }

    /// The unresolved atomic-language system: one language per element of
    /// the symbols × terminals product.
    pub fn raw_atomic_languages(&self) -> BTreeMap<LanguageId<S>, AtomicLanguage<S>> {
        iproduct!(self.symbols.iter(), self.terminals.iter())
            .map(|(s, t)| {
                let id = LanguageId::new(s.clone(), t.clone());
                let components = self.atomic_language_components(&id);
                let language =
                    AtomicLanguage::new(s.clone(), t.clone(), components.components());
                (id, language)
            })
            .collect()
    }

    /// Resolve the full atomic-language system to closed-form regular
    /// expressions.
    ///
    /// Depth-first resolve-then-substitute over the dependency graph; a
    /// dependency that closes back onto a language already being visited
    /// is left in place for the outer pass, which finishes it via Arden's
    /// rule once the cycle has collapsed into self recursion. Languages
    /// that resolve to no component at all (a terminal's language under a
    /// different terminal) drop out of the result.
    pub fn atomic_languages(&self) -> AtomicLanguageSet<S> {
        let mut languages = self.raw_atomic_languages();

        for (t, n) in iproduct!(self.terminals.iter(), self.non_terminals.iter()) {
            self.resolve(&mut languages, &LanguageId::new(n.clone(), t.clone()));
        }

        for l in languages.values() {
            assert!(
                !l.has_unresolved(),
                "resolution left unresolved components in {:?}",
                l.id()
            );
        }

        languages
            .into_iter()
            .filter_map(|(id, l)| {
                let mut components = l.all_components();
                assert!(
                    components.len() <= 1,
                    "resolved language {id:?} has {} components",
                    components.len()
                );
                components.pop().map(|c| (id, c.tail))
            })
            .collect()
    }

    /// [`atomic_languages`] with every entry passed through
    /// [`RegularExpression::simplified`].
    ///
    /// [`atomic_languages`]: EbnfGrammar::atomic_languages
    pub fn reduced_atomic_languages(&self) -> AtomicLanguageSet<S>
    where
        S: fmt::Display,
    {
        self.atomic_languages()
            .into_iter()
            .map(|(id, r)| (id, r.simplified()))
            .collect()
    }

    /// Drive `root`'s dependencies to empty, one visiting pass at a time.
    fn resolve(
        &self,
        languages: &mut BTreeMap<LanguageId<S>, AtomicLanguage<S>>,
        root: &LanguageId<S>,
    ) {
        while languages[root].has_unresolved() {
            let mut status = BTreeMap::new();
            self.visit(languages, &mut status, root.clone());
        }
    }

    /// One depth-first pass: resolve each dependency as far as this pass
    /// can, then substitute it in. An `InProgress` dependency is a cycle
    /// edge and is skipped; whatever it leaves behind collapses into self
    /// recursion on the way back up and is closed by Arden's rule.
    fn visit(
        &self,
        languages: &mut BTreeMap<LanguageId<S>, AtomicLanguage<S>>,
        status: &mut BTreeMap<LanguageId<S>, ResolutionStatus>,
        u: LanguageId<S>,
    ) {
        status.insert(u.clone(), ResolutionStatus::InProgress);

        for base in languages[&u].unresolved_bases() {
            let v = LanguageId::new(base, u.stripped_prefix.clone());
            match status.get(&v).copied().unwrap_or(ResolutionStatus::Unvisited) {
                ResolutionStatus::InProgress => continue,
                ResolutionStatus::Unvisited => self.visit(languages, status, v.clone()),
                ResolutionStatus::Resolved => {}
            }
            let substitution = languages[&v].clone();
            languages
                .get_mut(&u)
                .expect("every id is in the raw system")
                .substitute(&substitution);
        }

        let closed = !languages[&u].has_unresolved();
        status.insert(
            u,
            if closed { ResolutionStatus::Resolved } else { ResolutionStatus::Unvisited },
        );
    }
}

impl<S: Symbol + fmt::Display> fmt::Display for EbnfGrammar<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in &self.rules {
            writeln!(f, "{r}")?;
        }
        Ok(())
    }
}
