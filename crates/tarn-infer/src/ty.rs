//! Type representation for the Tarn inference engine.
//!
//! Defines the nominal [`Ty`] enum and the union-combinable [`TypeSet`].
//! Tarn is dynamically typed, so a "type" here is a candidate: inference
//! produces sets of candidates, never verdicts.

use std::fmt;

use serde::Serialize;

/// A Tarn type: a primitive marker or a declared class name.
///
/// Types are nominal -- two class types are equal iff their names match.
/// There is no separate metatype: the class value `Point`, an instance
/// `Point()`, and `self` inside a `Point` method all carry `Class("Point")`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Ty {
    /// The `nil` value.
    Nil,
    /// `true` / `false`.
    Bool,
    /// Integer and float values (Tarn has a single number type).
    Number,
    /// String values.
    Str,
    /// Functions and closures.
    Function,
    /// Table values produced by table constructors.
    Table,
    /// An instance (or the class value) of a declared class.
    Class(String),
}

impl Ty {
    /// Create a class type from a name.
    pub fn class(name: impl Into<String>) -> Ty {
        Ty::Class(name.into())
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Nil => write!(f, "nil"),
            Ty::Bool => write!(f, "bool"),
            Ty::Number => write!(f, "number"),
            Ty::Str => write!(f, "string"),
            Ty::Function => write!(f, "function"),
            Ty::Table => write!(f, "table"),
            Ty::Class(name) => write!(f, "{name}"),
        }
    }
}

/// An unordered, duplicate-free set of candidate [`Ty`]s.
///
/// The `unknown` flag distinguishes "inference gave up" (a recursion guard
/// rejection, an unresolved global, a parameter) from "the search completed
/// and found no candidates". Both have empty members; only the former is
/// flagged.
///
/// Sets are values: operations return new sets and never mutate an existing
/// one after it has been handed to a caller. Members are kept sorted so
/// union is a linear merge and iteration order is deterministic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TypeSet {
    members: Vec<Ty>,
    unknown: bool,
}

impl TypeSet {
    /// The empty set: a completed search with no candidates.
    pub fn empty() -> TypeSet {
        TypeSet {
            members: Vec::new(),
            unknown: false,
        }
    }

    /// The unknown set: empty members plus the unknown flag.
    pub fn unknown() -> TypeSet {
        TypeSet {
            members: Vec::new(),
            unknown: true,
        }
    }

    /// A set with exactly one member.
    pub fn singleton(ty: Ty) -> TypeSet {
        TypeSet {
            members: vec![ty],
            unknown: false,
        }
    }

    /// The set union of `self` and `other`; O(|a| + |b|) sorted merge.
    ///
    /// Union is commutative, associative, and idempotent, and the unknown
    /// flags are ORed.
    pub fn union(&self, other: &TypeSet) -> TypeSet {
        let mut members = Vec::with_capacity(self.members.len() + other.members.len());
        let mut a = self.members.iter().peekable();
        let mut b = other.members.iter().peekable();
        loop {
            let next = match (a.peek(), b.peek()) {
                (Some(x), Some(y)) => match x.cmp(y) {
                    std::cmp::Ordering::Less => a.next(),
                    std::cmp::Ordering::Greater => b.next(),
                    std::cmp::Ordering::Equal => {
                        b.next();
                        a.next()
                    }
                },
                (Some(_), None) => a.next(),
                (None, Some(_)) => b.next(),
                (None, None) => break,
            };
            if let Some(ty) = next {
                members.push(ty.clone());
            }
        }
        TypeSet {
            members,
            unknown: self.unknown || other.unknown,
        }
    }

    /// Whether the set has no members (regardless of the unknown flag).
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether inference gave up somewhere while producing this set.
    pub fn is_unknown(&self) -> bool {
        self.unknown
    }

    /// Whether the set contains the given type.
    pub fn contains(&self, ty: &Ty) -> bool {
        self.members.binary_search(ty).is_ok()
    }

    /// The members, sorted. Order is deterministic but not significant.
    pub fn members(&self) -> &[Ty] {
        &self.members
    }
}

impl fmt::Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.members.is_empty() {
            return if self.unknown {
                write!(f, "unknown")
            } else {
                write!(f, "{{}}")
            };
        }
        write!(f, "{{")?;
        for (i, ty) in self.members.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{ty}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(tys: &[Ty]) -> TypeSet {
        tys.iter()
            .cloned()
            .fold(TypeSet::empty(), |acc, t| acc.union(&TypeSet::singleton(t)))
    }

    #[test]
    fn union_is_commutative() {
        let a = set(&[Ty::Number, Ty::Str]);
        let b = set(&[Ty::Bool, Ty::Number]);
        assert_eq!(a.union(&b), b.union(&a));
    }

    #[test]
    fn union_is_associative() {
        let a = set(&[Ty::Number]);
        let b = set(&[Ty::Str]);
        let c = set(&[Ty::class("Point")]);
        assert_eq!(a.union(&b.union(&c)), a.union(&b).union(&c));
    }

    #[test]
    fn union_is_idempotent() {
        let a = set(&[Ty::Number, Ty::class("Point")]);
        assert_eq!(a.union(&a), a);
    }

    #[test]
    fn empty_is_identity() {
        let a = set(&[Ty::Table, Ty::Nil]);
        assert_eq!(a.union(&TypeSet::empty()), a);
        assert_eq!(TypeSet::empty().union(&a), a);
    }

    #[test]
    fn no_duplicate_members() {
        let a = set(&[Ty::Number]);
        let b = set(&[Ty::Number]);
        assert_eq!(a.union(&b).members().len(), 1);
    }

    #[test]
    fn unknown_is_distinct_from_empty() {
        assert_ne!(TypeSet::empty(), TypeSet::unknown());
        assert!(TypeSet::empty().is_empty());
        assert!(TypeSet::unknown().is_empty());
        assert!(!TypeSet::empty().is_unknown());
        assert!(TypeSet::unknown().is_unknown());
    }

    #[test]
    fn union_preserves_unknown_flag() {
        let a = TypeSet::singleton(Ty::Number);
        let u = a.union(&TypeSet::unknown());
        assert!(u.is_unknown());
        assert_eq!(u.members(), &[Ty::Number]);
    }

    #[test]
    fn contains_and_members() {
        let a = set(&[Ty::Str, Ty::Number]);
        assert!(a.contains(&Ty::Number));
        assert!(a.contains(&Ty::Str));
        assert!(!a.contains(&Ty::Nil));
        // Members are sorted by enum order for determinism.
        assert_eq!(a.members(), &[Ty::Number, Ty::Str]);
    }

    #[test]
    fn class_types_are_nominal() {
        assert_eq!(Ty::class("A"), Ty::class("A"));
        assert_ne!(Ty::class("A"), Ty::class("B"));
    }

    #[test]
    fn display_formatting() {
        assert_eq!(TypeSet::empty().to_string(), "{}");
        assert_eq!(TypeSet::unknown().to_string(), "unknown");
        let s = set(&[Ty::Str, Ty::Number]);
        assert_eq!(s.to_string(), "{number, string}");
    }
}
