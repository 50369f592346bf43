//! Regular-expression term algebra.
//!
//! [`RegularExpression`] is a recursive sum type kept in a reduced normal
//! form by its smart operations: empty sequences and alternative sets
//! collapse to [`Epsilon`]/[`Null`], concatenation with `Epsilon` is
//! identity and with `Null` absorbing, nested alternatives flatten and
//! deduplicate, a term whose language is (cheaply recognizable as) a subset
//! of a sibling alternative is dropped, and adjacent repeats of the same
//! starred sub-term merge (`x* x*` stays `x*`, `x x*` becomes `x+`).
//!
//! Normal form is what makes the atomic-language resolution terminate and
//! makes tree equality a usable fast approximation of language equality.
//! Two normalized terms can still denote the same language with different
//! trees; [`RegularExpression::is_functionally_equivalent`] (minimized-DFA
//! comparison) is the ground truth.
//!
//! [`Epsilon`]: RegularExpression::Epsilon
//! [`Null`]: RegularExpression::Null

pub mod parse;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Language, Symbol};

/// A repetition operator, printing as its conventional sigil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quantifier {
    /// `*` — zero or more repeats.
    ZeroOrMore,
    /// `+` — one or more repeats.
    OneOrMore,
    /// `?` — zero or one occurrence.
    Optional,
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Quantifier::ZeroOrMore => "*",
            Quantifier::OneOrMore => "+",
            Quantifier::Optional => "?",
        })
    }
}

/// A regular expression over an opaque symbol type.
///
/// Construct terms through the smart operations ([`concatenated`],
/// [`union`], [`star`], [`plus`], [`optional`], [`sequence`],
/// [`alternatives`]) — they maintain the normal form documented at module
/// level. The variants are public so terms can be inspected by pattern
/// matching, but hand-assembled non-normalized trees void the algebra's
/// guarantees.
///
/// [`concatenated`]: RegularExpression::concatenated
/// [`union`]: RegularExpression::union
/// [`star`]: RegularExpression::star
/// [`plus`]: RegularExpression::plus
/// [`optional`]: RegularExpression::optional
/// [`sequence`]: RegularExpression::sequence
/// [`alternatives`]: RegularExpression::alternatives
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RegularExpression<S: Ord> {
    /// Matches exactly the empty string.
    Epsilon,
    /// Matches nothing at all.
    Null,
    /// Matches exactly one occurrence of the symbol.
    Atom(S),
    /// Matches each element in order. Never empty, never length one, never
    /// directly nested in normal form.
    Sequence(Vec<Self>),
    /// Matches any element. Never empty, never a singleton, never directly
    /// nested in normal form.
    Alternatives(BTreeSet<Self>),
    /// A quantified sub-term. Stacked quantifiers collapse in normal form.
    Quantified(Box<Self>, Quantifier),
}

impl<S: Symbol> RegularExpression<S> {
    /// Concatenate in normal form: `ɛ` is identity, `∅` absorbs, sequences
    /// flatten, and adjacent starred repeats of the same sub-term merge.
    pub fn concatenated(self, tail: Self) -> Self {
        if matches!(self, Self::Null) || matches!(tail, Self::Null) {
            return Self::Null;
        }
        let mut elements = match self {
            Self::Sequence(xs) => xs,
            Self::Epsilon => Vec::new(),
            x => vec![x],
        };
        match tail {
            Self::Sequence(xs) => {
                for x in xs {
                    Self::push_concatenated(&mut elements, x);
                }
            }
            Self::Epsilon => {}
            x => Self::push_concatenated(&mut elements, x),
        }
        match elements.len() {
            0 => Self::Epsilon,
            1 => elements.pop().unwrap(),
            _ => Self::Sequence(elements),
        }
    }

    fn push_concatenated(elements: &mut Vec<Self>, x: Self) {
        if matches!(x, Self::Epsilon) {
            return;
        }
        if let Some(last) = elements.last_mut() {
            if let Some(merged) = Self::merged_repeat(last, &x) {
                *last = merged;
                return;
            }
        }
        elements.push(x);
    }

    /// `x* x*` → `x*`, `x* x+` / `x+ x*` → `x+`, `x* x` / `x x*` → `x+`.
    fn merged_repeat(left: &Self, right: &Self) -> Option<Self> {
        use Quantifier::*;
        match (left, right) {
            (Self::Quantified(a, ZeroOrMore), Self::Quantified(b, ZeroOrMore)) if a == b => {
                Some(left.clone())
            }
            (Self::Quantified(a, ZeroOrMore), Self::Quantified(b, OneOrMore)) if a == b => {
                Some(right.clone())
            }
            (Self::Quantified(a, OneOrMore), Self::Quantified(b, ZeroOrMore)) if a == b => {
                Some(left.clone())
            }
            (Self::Quantified(a, ZeroOrMore), r) if **a == *r => {
                Some(Self::Quantified(a.clone(), OneOrMore))
            }
            (l, Self::Quantified(b, ZeroOrMore)) if *l == **b => {
                Some(Self::Quantified(b.clone(), OneOrMore))
            }
            _ => None,
        }
    }

    /// Union in normal form: `∅` is identity, alternative sets flatten and
    /// deduplicate, and a term subsumed by a sibling (or subsuming one) is
    /// dropped (or replaces it).
    pub fn union(self, other: Self) -> Self {
        let mut set = match self {
            Self::Alternatives(s) => s,
            Self::Null => BTreeSet::new(),
            x => BTreeSet::from([x]),
        };
        match other {
            Self::Alternatives(s) => {
                for x in s {
                    Self::insert_alternative(&mut set, x);
                }
            }
            Self::Null => {}
            x => Self::insert_alternative(&mut set, x),
        }
        Self::from_alternative_set(set)
    }

    fn insert_alternative(set: &mut BTreeSet<Self>, x: Self) {
        if set.iter().any(|sibling| sibling.subsumes(&x)) {
            return;
        }
        set.retain(|sibling| !x.subsumes(sibling));
        set.insert(x);
    }

    /// Cheap, shallow subset-language check used by [`union`] to keep
    /// alternative sets reduced. Sound but deliberately incomplete: `x` is
    /// covered by a sibling `x*`/`x+`/`x?`, `x?`/`x+` by `x*`, and `ɛ` by
    /// any sibling that repeats or is optional.
    ///
    /// [`union`]: RegularExpression::union
    fn subsumes(&self, other: &Self) -> bool {
        use Quantifier::*;
        if self == other {
            return true;
        }
        match self {
            Self::Quantified(base, ZeroOrMore) => match other {
                Self::Epsilon => true,
                Self::Quantified(b, _) => b == base,
                x => *x == **base,
            },
            Self::Quantified(base, OneOrMore) => *other == **base,
            Self::Quantified(base, Optional) => {
                matches!(other, Self::Epsilon) || *other == **base
            }
            _ => false,
        }
    }

    fn from_alternative_set(mut set: BTreeSet<Self>) -> Self {
        match set.len() {
            0 => Self::Null,
            1 => set.pop_first().unwrap(),
            _ => Self::Alternatives(set),
        }
    }

    /// Zero-or-more repetition. `∅*` and `ɛ*` are `ɛ` (state elimination
    /// depends on the former), and stacked quantifiers collapse.
    pub fn star(self) -> Self {
        match self {
            Self::Null | Self::Epsilon => Self::Epsilon,
            Self::Quantified(base, _) => Self::Quantified(base, Quantifier::ZeroOrMore),
            x => Self::Quantified(Box::new(x), Quantifier::ZeroOrMore),
        }
    }

    /// One-or-more repetition. `(x?)+` collapses to `x*`.
    pub fn plus(self) -> Self {
        use Quantifier::*;
        match self {
            Self::Null => Self::Null,
            Self::Epsilon => Self::Epsilon,
            Self::Quantified(base, ZeroOrMore | Optional) => Self::Quantified(base, ZeroOrMore),
            Self::Quantified(base, OneOrMore) => Self::Quantified(base, OneOrMore),
            x => Self::Quantified(Box::new(x), OneOrMore),
        }
    }

    /// Zero-or-one occurrence. `(x+)?` collapses to `x*`.
    pub fn optional(self) -> Self {
        use Quantifier::*;
        match self {
            Self::Null | Self::Epsilon => Self::Epsilon,
            Self::Quantified(base, ZeroOrMore | OneOrMore) => Self::Quantified(base, ZeroOrMore),
            Self::Quantified(base, Optional) => Self::Quantified(base, Optional),
            x => Self::Quantified(Box::new(x), Optional),
        }
    }

    /// Apply `q` through the matching normalizing constructor.
    pub fn quantified(self, q: Quantifier) -> Self {
        match q {
            Quantifier::ZeroOrMore => self.star(),
            Quantifier::OneOrMore => self.plus(),
            Quantifier::Optional => self.optional(),
        }
    }

    /// Normalized concatenation of all items; empty input is `ɛ`.
    pub fn sequence(items: impl IntoIterator<Item = Self>) -> Self {
        items.into_iter().fold(Self::Epsilon, Self::concatenated)
    }

    /// Normalized union of all items; empty input is `∅`.
    pub fn alternatives(items: impl IntoIterator<Item = Self>) -> Self {
        items.into_iter().fold(Self::Null, Self::union)
    }

    /// Whether the language contains the empty string, treating the given
    /// symbols as nullable nonterminals.
    pub fn is_nullable(&self, nullable_symbols: &BTreeSet<S>) -> bool {
        match self {
            Self::Epsilon => true,
            Self::Null => false,
            Self::Atom(s) => nullable_symbols.contains(s),
            Self::Sequence(xs) => xs.iter().all(|x| x.is_nullable(nullable_symbols)),
            Self::Alternatives(xs) => xs.iter().any(|x| x.is_nullable(nullable_symbols)),
            Self::Quantified(_, Quantifier::ZeroOrMore | Quantifier::Optional) => true,
            Self::Quantified(base, Quantifier::OneOrMore) => base.is_nullable(nullable_symbols),
        }
    }

    /// The symbols that can begin a match, recursing into a sequence only
    /// while each visited element is nullable.
    pub fn leading_symbols(&self, nullables: &BTreeSet<S>) -> BTreeSet<S> {
        match self {
            Self::Epsilon | Self::Null => BTreeSet::new(),
            Self::Atom(s) => BTreeSet::from([s.clone()]),
            Self::Quantified(base, _) => base.leading_symbols(nullables),
            Self::Alternatives(xs) => {
                xs.iter().flat_map(|x| x.leading_symbols(nullables)).collect()
            }
            Self::Sequence(xs) => {
                let mut leading = BTreeSet::new();
                for x in xs {
                    leading.extend(x.leading_symbols(nullables));
                    if !x.is_nullable(nullables) {
                        break;
                    }
                }
                leading
            }
        }
    }

    /// Every symbol mentioned anywhere in the term.
    pub fn symbols(&self) -> BTreeSet<S> {
        match self {
            Self::Epsilon | Self::Null => BTreeSet::new(),
            Self::Atom(s) => BTreeSet::from([s.clone()]),
            Self::Quantified(base, _) => base.symbols(),
            Self::Sequence(xs) => xs.iter().flat_map(|x| x.symbols()).collect(),
            Self::Alternatives(xs) => xs.iter().flat_map(|x| x.symbols()).collect(),
        }
    }

    /// Relabel every atom, preserving structure. The result is re-normalized
    /// through the smart constructors since `f` may identify symbols that
    /// were previously distinct.
    pub fn map<T: Symbol>(&self, f: &impl Fn(&S) -> T) -> RegularExpression<T> {
        match self {
            Self::Epsilon => RegularExpression::Epsilon,
            Self::Null => RegularExpression::Null,
            Self::Atom(s) => RegularExpression::Atom(f(s)),
            Self::Sequence(xs) => RegularExpression::sequence(xs.iter().map(|x| x.map(f))),
            Self::Alternatives(xs) => {
                RegularExpression::alternatives(xs.iter().map(|x| x.map(f)))
            }
            Self::Quantified(base, q) => base.map(f).quantified(*q),
        }
    }

    /// Make every nullable-symbol atom explicitly optional. The sequence
    /// derivative rule applies this to remainders so that a continuation's
    /// leading nonterminals, which stand for non-empty expansions, can
    /// still be skipped when the grammar lets them match nothing.
    pub fn nulled(&self, nullables: &BTreeSet<S>) -> Self {
        match self {
            Self::Epsilon => Self::Epsilon,
            Self::Null => Self::Null,
            Self::Atom(s) if nullables.contains(s) => {
                Self::Atom(s.clone()).optional()
            }
            Self::Atom(s) => Self::Atom(s.clone()),
            Self::Sequence(xs) => Self::sequence(xs.iter().map(|x| x.nulled(nullables))),
            Self::Alternatives(xs) => {
                Self::alternatives(xs.iter().map(|x| x.nulled(nullables)))
            }
            Self::Quantified(base, q) => base.nulled(nullables).quantified(*q),
        }
    }
}

impl<S: Symbol> Language for RegularExpression<S> {
    fn concatenated(self, tail: Self) -> Self {
        RegularExpression::concatenated(self, tail)
    }

    fn union(self, other: Self) -> Self {
        RegularExpression::union(self, other)
    }
}

impl<S: Symbol + fmt::Display> RegularExpression<S> {
    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>, nested: bool) -> fmt::Result {
        match self {
            Self::Epsilon => f.write_str("ɛ"),
            Self::Null => f.write_str("∅"),
            Self::Atom(s) => write!(f, "{s}"),
            Self::Sequence(xs) => {
                if nested {
                    f.write_str("(")?;
                }
                for x in xs {
                    x.fmt_nested(f, true)?;
                }
                if nested {
                    f.write_str(")")?;
                }
                Ok(())
            }
            Self::Alternatives(xs) => {
                if nested {
                    f.write_str("(")?;
                }
                for (i, x) in xs.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    x.fmt_nested(f, false)?;
                }
                if nested {
                    f.write_str(")")?;
                }
                Ok(())
            }
            Self::Quantified(base, q) => {
                base.fmt_nested(f, true)?;
                write!(f, "{q}")
            }
        }
    }
}

impl<S: Symbol + fmt::Display> fmt::Display for RegularExpression<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_nested(f, false)
    }
}
