//! Atomic-language component algebra.
//!
//! An atomic language `[s]⁽t⁾` is the regular language of valid
//! continuations of `s`'s expansion once the terminal `t` has been
//! consumed as its first symbol. During grammar decomposition each such
//! language is held as a union of [`Component`] alternatives, partitioned
//! three ways: already-plain regex tails, tails behind the language's own
//! base (self recursion, destined for Arden's rule), and tails behind
//! some other base symbol (eliminated by substitution).
//!
//! [`DerivativeSet`] is the keyed form of that union used while computing
//! derivatives: components sharing a leading base merge by regex-union of
//! their tails, which keeps the representation linear under repeated
//! substitution instead of exponential.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::regex::RegularExpression;
use crate::{Language, Symbol};

/// The name of an atomic language: the residual language of `base` after
/// a leading occurrence whose last consumed terminal was
/// `stripped_prefix`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LanguageId<S> {
    /// The symbol whose continuations this language describes.
    pub base: S,
    /// The terminal assumed already consumed.
    pub stripped_prefix: S,
}

impl<S> LanguageId<S> {
    pub fn new(base: S, stripped_prefix: S) -> Self {
        LanguageId { base, stripped_prefix }
    }
}

impl<S: fmt::Display> fmt::Display for LanguageId<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}⁽{}⁾", self.base, self.stripped_prefix)
    }
}

/// One alternative of a continuation language: an optional leading
/// atomic-language dependency followed by a plain regex tail.
///
/// `leading_base == None` means the alternative is already a plain regex;
/// `Some(b)` means "the atomic language of `b` (under the same stripped
/// prefix), concatenated with `tail`".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Component<S: Ord> {
    pub leading_base: Option<S>,
    pub tail: RegularExpression<S>,
}

impl<S: Symbol> Component<S> {
    /// A plain-regex alternative with no symbolic leading dependency.
    pub fn resolved(tail: RegularExpression<S>) -> Self {
        Component { leading_base: None, tail }
    }

    /// An alternative led by the atomic language of `base`.
    pub fn leading(base: S, tail: RegularExpression<S>) -> Self {
        Component { leading_base: Some(base), tail }
    }

    /// This alternative followed by a plain regex.
    pub fn concatenated(self, tail: RegularExpression<S>) -> Self {
        Component { leading_base: self.leading_base, tail: self.tail.concatenated(tail) }
    }
}

impl<S: Symbol + fmt::Display> fmt::Display for Component<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.leading_base {
            Some(base) => write!(f, "({base}, {})", self.tail),
            None => write!(f, "(ɛ, {})", self.tail),
        }
    }
}

/// The derivative of a regex by a terminal: a union of components keyed
/// by their leading base.
///
/// Inserting a component with a key already present unions the tails, so
/// the set stays one entry per distinct leading base no matter how many
/// alternatives contribute to it. Components with a `∅` tail denote the
/// empty language and are never stored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DerivativeSet<S: Ord> {
    by_base: BTreeMap<Option<S>, RegularExpression<S>>,
}

impl<S: Symbol> DerivativeSet<S> {
    /// The empty derivative: no way to consume the terminal.
    pub fn new() -> Self {
        DerivativeSet { by_base: BTreeMap::new() }
    }

    /// A set holding one component.
    pub fn singleton(c: Component<S>) -> Self {
        let mut set = Self::new();
        set.insert(c);
        set
    }

    /// Merge a component in, unioning tails that share a leading base.
    pub fn insert(&mut self, c: Component<S>) {
        if matches!(c.tail, RegularExpression::Null) {
            return;
        }
        let slot = self.by_base.entry(c.leading_base).or_insert(RegularExpression::Null);
        let merged = std::mem::replace(slot, RegularExpression::Null);
        *slot = merged.union(c.tail);
    }

    pub fn is_empty(&self) -> bool {
        self.by_base.is_empty()
    }

    /// The components of the set, one per distinct leading base.
    pub fn components(&self) -> impl Iterator<Item = Component<S>> + '_ {
        self.by_base
            .iter()
            .map(|(base, tail)| Component { leading_base: base.clone(), tail: tail.clone() })
    }
}

impl<S: Symbol> Language for DerivativeSet<S> {
    /// Distribute a plain tail onto every partition.
    ///
    /// The only legal non-empty operand is a single component with no
    /// leading base — the already-nulled continuation of a sequence. An
    /// empty operand annihilates, as concatenating with `∅` must.
    fn concatenated(mut self, tail: Self) -> Self {
        if tail.by_base.is_empty() {
            return Self::new();
        }
        assert!(
            tail.by_base.len() == 1,
            "illegal concatenation with a multi-component derivative set"
        );
        let Some(plain) = tail.by_base.get(&None) else {
            panic!("illegal concatenation with a symbol-led derivative set");
        };
        for t in self.by_base.values_mut() {
            let lifted = std::mem::replace(t, RegularExpression::Null);
            *t = lifted.concatenated(plain.clone());
        }
        self
    }

    fn union(mut self, other: Self) -> Self {
        for c in other.components() {
            self.insert(c);
        }
        self
    }
}

impl<S: Symbol + fmt::Display> fmt::Display for DerivativeSet<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, c) in self.components().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{c}")?;
        }
        f.write_str("}")
    }
}

/// A partially resolved atomic language, mutated in place during the
/// grammar driver's resolution phase.
///
/// The component alternatives live in three partitions: `resolved` (pure
/// regex, no symbolic dependency), `self_recursive` (tails whose leading
/// dependency is this language's own base), and `unresolved` (tail per
/// other base symbol). Resolution empties `unresolved` by substitution;
/// [`all_components`] then closes the self recursion with Arden's rule.
///
/// [`all_components`]: AtomicLanguage::all_components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomicLanguage<S: Ord> {
    base: S,
    stripped_prefix: S,
    resolved: RegularExpression<S>,
    self_recursive: RegularExpression<S>,
    unresolved: BTreeMap<S, RegularExpression<S>>,
}

impl<S: Symbol> AtomicLanguage<S> {
    pub fn new(
        base: S,
        stripped_prefix: S,
        components: impl IntoIterator<Item = Component<S>>,
    ) -> Self {
        let mut language = AtomicLanguage {
            base,
            stripped_prefix,
            resolved: RegularExpression::Null,
            self_recursive: RegularExpression::Null,
            unresolved: BTreeMap::new(),
        };
        for c in components {
            language.add(c);
        }
        language
    }

    pub fn id(&self) -> LanguageId<S> {
        LanguageId::new(self.base.clone(), self.stripped_prefix.clone())
    }

    pub fn base(&self) -> &S {
        &self.base
    }

    /// Classify a component into its partition. A `∅` tail denotes the
    /// empty language and is dropped.
    pub fn add(&mut self, c: Component<S>) {
        if matches!(c.tail, RegularExpression::Null) {
            return;
        }
        match c.leading_base {
            Some(b) if b == self.base => {
                let tails = std::mem::replace(&mut self.self_recursive, RegularExpression::Null);
                self.self_recursive = tails.union(c.tail);
            }
            Some(b) => {
                let slot = self.unresolved.entry(b).or_insert(RegularExpression::Null);
                let merged = std::mem::replace(slot, RegularExpression::Null);
                *slot = merged.union(c.tail);
            }
            None => {
                let tails = std::mem::replace(&mut self.resolved, RegularExpression::Null);
                self.resolved = tails.union(c.tail);
            }
        }
    }

    /// The base symbols this language still depends on.
    pub fn unresolved_bases(&self) -> Vec<S> {
        self.unresolved.keys().cloned().collect()
    }

    pub fn has_unresolved(&self) -> bool {
        !self.unresolved.is_empty()
    }

    /// Every current alternative, with the self recursion closed by
    /// Arden's rule: `X = R | U | X·T` solves to `(R | U) ◦ T*`, so the
    /// resolved part and every unresolved part are right-concatenated
    /// with the star of the self-recursive tails.
    pub fn all_components(&self) -> Vec<Component<S>> {
        let common = self.self_recursive.clone().star();
        let mut components = Vec::with_capacity(1 + self.unresolved.len());
        if !matches!(self.resolved, RegularExpression::Null) {
            components
                .push(Component::resolved(self.resolved.clone().concatenated(common.clone())));
        }
        for (base, tail) in &self.unresolved {
            components.push(Component::leading(
                base.clone(),
                tail.clone().concatenated(common.clone()),
            ));
        }
        components
    }

    /// Eliminate the dependency on `other.base`: the tail recorded
    /// against it is replaced by `other`'s own alternatives, each
    /// concatenated with that tail.
    ///
    /// Self recursion is closed by Arden's rule, never by substitution;
    /// calling this with `other.base == self.base` is a caller bug.
    pub fn substitute(&mut self, other: &Self) {
        assert!(
            other.base != self.base,
            "substituting a language into itself; self recursion resolves via Arden's rule"
        );
        let Some(replaced) = self.unresolved.remove(&other.base) else {
            return;
        };
        for c in other.all_components() {
            self.add(c.concatenated(replaced.clone()));
        }
    }
}

impl<S: Symbol + fmt::Display> fmt::Display for AtomicLanguage<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.id(), self.resolved)?;
        if !matches!(self.self_recursive, RegularExpression::Null) {
            write!(f, " | {}·{}", self.id(), self.self_recursive)?;
        }
        for (base, tail) in &self.unresolved {
            write!(f, " | {base}·{tail}")?;
        }
        Ok(())
    }
}
