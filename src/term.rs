// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A signed statement about a package's allowed versions (C2).

use std::fmt;

use crate::package::PackageReference;
use crate::requirement::{Requirement, VersionSetSpec};

/// The result of comparing two terms over the same package: does `other`
/// follow from `self` (`Subset`), contradict it (`Disjoint`), or neither
/// (`Overlap`)?
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Relation {
    Disjoint,
    Overlap,
    Subset,
}

/// `(package, requirement, isPositive)`. Positive means "this package is in
/// this set"; negative means "this package is NOT in this set". Two terms
/// only interact when their packages match — every method here assumes the
/// caller has already checked that.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Term {
    package: PackageReference,
    requirement: Requirement,
    positive: bool,
}

impl Term {
    pub fn new(package: PackageReference, requirement: Requirement, positive: bool) -> Self {
        Self {
            package,
            requirement,
            positive,
        }
    }

    pub fn positive(package: PackageReference, requirement: Requirement) -> Self {
        Self::new(package, requirement, true)
    }

    pub fn negative(package: PackageReference, requirement: Requirement) -> Self {
        Self::new(package, requirement, false)
    }

    /// `root@version` is positive and unconditionally true once the root
    /// has been decided; used to seed the initial incompatibility.
    pub fn root_at(version: crate::version::Version) -> Self {
        Self::positive(PackageReference::root(), Requirement::exact(version))
    }

    pub fn package(&self) -> &PackageReference {
        &self.package
    }

    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    pub fn is_positive(&self) -> bool {
        self.positive
    }

    /// Flip polarity without touching the requirement.
    pub fn inverse(&self) -> Self {
        Self {
            package: self.package.clone(),
            requirement: self.requirement.clone(),
            positive: !self.positive,
        }
    }

    /// Intersect two terms about the same package. Returns `None` when the
    /// combination denotes the empty set, or is unrepresentable (e.g. two
    /// distinct revisions, or a version set crossed with an unversioned
    /// term).
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        debug_assert_eq!(self.package, other.package);
        match (&self.requirement, &other.requirement) {
            (Requirement::Unversioned, Requirement::Unversioned) => {
                (self.positive == other.positive).then(|| Self {
                    package: self.package.clone(),
                    requirement: Requirement::Unversioned,
                    positive: self.positive,
                })
            }
            (Requirement::Revision(x), Requirement::Revision(y)) => {
                (self.positive == other.positive && x == y).then(|| Self {
                    package: self.package.clone(),
                    requirement: Requirement::Revision(x.clone()),
                    positive: self.positive,
                })
            }
            (Requirement::Revision(_), Requirement::VersionSet(_)) if self.positive => {
                Some(self.clone())
            }
            (Requirement::VersionSet(_), Requirement::Revision(_)) if other.positive => {
                Some(other.clone())
            }
            (Requirement::VersionSet(l), Requirement::VersionSet(r)) => {
                let (set, positive) = match (self.positive, other.positive) {
                    (true, true) => (l.intersection(r), true),
                    (true, false) => (l.intersection_with_inverse(r), true),
                    (false, true) => (r.intersection_with_inverse(l), true),
                    (false, false) => (l.covering_hull(r), false),
                };
                if set.is_empty() {
                    None
                } else {
                    Some(Self {
                        package: self.package.clone(),
                        requirement: Requirement::VersionSet(set),
                        positive,
                    })
                }
            }
            _ => None,
        }
    }

    /// `a \ b := a.intersect(b.inverse())`.
    pub fn difference(&self, other: &Self) -> Option<Self> {
        self.intersect(&other.inverse())
    }

    /// How `other` relates to `self`: does `self` being true force `other`
    /// to be true (`Subset`), contradict it (`Disjoint`), or neither?
    pub fn relation(&self, other: &Self) -> Relation {
        debug_assert_eq!(self.package, other.package);
        let other_contains_self = other.requirement.contains_all(&self.requirement);
        let overlap = other.requirement.contains_any(&self.requirement);
        match (self.positive, other.positive) {
            (true, true) => {
                if other_contains_self {
                    Relation::Subset
                } else if overlap {
                    Relation::Overlap
                } else {
                    Relation::Disjoint
                }
            }
            (false, true) => {
                if self.requirement.contains_all(&other.requirement) {
                    Relation::Disjoint
                } else {
                    Relation::Overlap
                }
            }
            (true, false) => {
                if !overlap {
                    Relation::Subset
                } else if other_contains_self {
                    Relation::Disjoint
                } else {
                    Relation::Overlap
                }
            }
            (false, false) => {
                if self.requirement.contains_all(&other.requirement) {
                    Relation::Subset
                } else {
                    Relation::Overlap
                }
            }
        }
    }

    /// `self.relation(other) == Subset`, i.e. `self` being true guarantees
    /// `other`.
    pub fn satisfies(&self, other: &Self) -> bool {
        self.relation(other) == Relation::Subset
    }

    /// `true` when this term's requirement is a single concrete version, a
    /// revision, or unversioned — never a multi-version range. Decisions
    /// must only ever carry such a term.
    pub fn is_decision_shaped(&self) -> bool {
        match &self.requirement {
            Requirement::VersionSet(VersionSetSpec::Range {
                lower: Some(l),
                upper: Some(u),
            }) => *u == l.bump(),
            Requirement::Revision(_) | Requirement::Unversioned => true,
            _ => false,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.positive {
            write!(f, "{} {}", self.package, self.requirement)
        } else {
            write!(f, "not {} {}", self.package, self.requirement)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Version;
    use proptest::prelude::*;

    fn pkg() -> PackageReference {
        PackageReference::new("left-pad")
    }

    fn version_strategy() -> impl Strategy<Value = Version> {
        (0u32..4, 0u32..4, 0u32..4).prop_map(|(a, b, c)| Version::new(a, b, c))
    }

    fn term_strategy() -> impl Strategy<Value = Term> {
        (version_strategy(), version_strategy(), any::<bool>()).prop_map(
            |(a, b, positive)| {
                let (lo, hi) = (a.min(b), a.max(b).bump());
                Term::new(
                    pkg(),
                    Requirement::VersionSet(VersionSetSpec::range(lo, hi)),
                    positive,
                )
            },
        )
    }

    #[test]
    fn relation_is_antisymmetric_up_to_polarity() {
        let t = Term::positive(pkg(), Requirement::exact(Version::new(1, 0, 0)));
        assert_eq!(t.relation(&t.inverse()), Relation::Disjoint);
        assert_eq!(t.relation(&t), Relation::Subset);
    }

    #[test]
    fn inverse_is_involutive() {
        let t = Term::positive(pkg(), Requirement::any());
        assert_eq!(t.inverse().inverse(), t);
    }

    #[test]
    fn distinct_revisions_do_not_intersect() {
        let a = Term::positive(pkg(), Requirement::Revision("main".into()));
        let b = Term::positive(pkg(), Requirement::Revision("develop".into()));
        assert!(a.intersect(&b).is_none());
    }

    #[test]
    fn positive_revision_wins_over_version_set() {
        let rev = Term::positive(pkg(), Requirement::Revision("main".into()));
        let range = Term::positive(pkg(), Requirement::any());
        assert_eq!(rev.intersect(&range), Some(rev.clone()));
        assert_eq!(range.intersect(&rev), Some(rev));
    }

    proptest! {
        #[test]
        fn relation_antisymmetric_prop(t in term_strategy()) {
            prop_assert_eq!(t.relation(&t.inverse()), Relation::Disjoint);
            prop_assert_eq!(t.relation(&t), Relation::Subset);
        }

        #[test]
        fn inverse_involutive_prop(t in term_strategy()) {
            prop_assert_eq!(t.inverse().inverse(), t);
        }
    }
}
