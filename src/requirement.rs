// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Version sets and the requirement algebra built on top of them (C1).

use std::cmp::Ordering;
use std::fmt;

use crate::version::{Revision, Version};

/// A set of versions expressed as a single half-open interval `[lower, upper)`.
///
/// `None` for `lower` means unbounded below; `None` for `upper` means
/// unbounded above. This is deliberately a *single* interval rather than a
/// union of intervals: it mirrors the source system's `VersionSetSpecifier`,
/// including its one documented asymmetry (see
/// [`VersionSetSpec::intersection_with_inverse`]).
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum VersionSetSpec {
    /// No version satisfies this set. Identity for union, annihilator for
    /// intersection.
    Empty,
    /// `[lower, upper)`, each bound optionally open.
    Range {
        lower: Option<Version>,
        upper: Option<Version>,
    },
}

fn lower_cmp(a: &Option<Version>, b: &Option<Version>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.cmp(y),
    }
}

fn upper_cmp(a: &Option<Version>, b: &Option<Version>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => x.cmp(y),
    }
}

fn lower_max(a: &Option<Version>, b: &Option<Version>) -> Option<Version> {
    if lower_cmp(a, b) == Ordering::Less {
        b.clone()
    } else {
        a.clone()
    }
}

fn upper_min(a: &Option<Version>, b: &Option<Version>) -> Option<Version> {
    if upper_cmp(a, b) == Ordering::Greater {
        b.clone()
    } else {
        a.clone()
    }
}

/// Is `[lower, upper)` non-empty?
fn range_nonempty(lower: &Option<Version>, upper: &Option<Version>) -> bool {
    match (lower, upper) {
        (None, _) | (_, None) => true,
        (Some(l), Some(u)) => l < u,
    }
}

impl VersionSetSpec {
    /// The set containing every version.
    pub fn any() -> Self {
        Self::Range {
            lower: None,
            upper: None,
        }
    }

    /// The empty set.
    pub fn empty() -> Self {
        Self::Empty
    }

    /// The set containing exactly `v`, represented as `[v, v.bump())`.
    pub fn exact(v: Version) -> Self {
        let upper = v.bump();
        Self::Range {
            lower: Some(v),
            upper: Some(upper),
        }
    }

    /// `[lower, upper)`.
    pub fn range(lower: Version, upper: Version) -> Self {
        if lower < upper {
            Self::Range {
                lower: Some(lower),
                upper: Some(upper),
            }
        } else {
            Self::Empty
        }
    }

    /// Everything strictly lower than `v`.
    pub fn strictly_lower_than(v: Version) -> Self {
        Self::Range {
            lower: None,
            upper: Some(v),
        }
    }

    /// Everything greater than or equal to `v`.
    pub fn higher_than(v: Version) -> Self {
        Self::Range {
            lower: Some(v),
            upper: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn contains(&self, v: &Version) -> bool {
        match self {
            Self::Empty => false,
            Self::Range { lower, upper } => {
                lower.as_ref().map_or(true, |l| l <= v) && upper.as_ref().map_or(true, |u| v < u)
            }
        }
    }

    /// Standard interval intersection: max of lowers, min of uppers,
    /// collapsing to [`Empty`](Self::Empty) if the result is disordered.
    pub fn intersection(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Empty, _) | (_, Self::Empty) => Self::Empty,
            (
                Self::Range {
                    lower: a_lo,
                    upper: a_hi,
                },
                Self::Range {
                    lower: b_lo,
                    upper: b_hi,
                },
            ) => {
                let lower = lower_max(a_lo, b_lo);
                let upper = upper_min(a_hi, b_hi);
                if range_nonempty(&lower, &upper) {
                    Self::Range { lower, upper }
                } else {
                    Self::Empty
                }
            }
        }
    }

    /// The smallest single interval covering both `self` and `other`. Used
    /// by the term algebra's negative/negative polarity case, which asks
    /// for "the smallest range covering both" rather than a true union.
    pub fn covering_hull(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Empty, x) | (x, Self::Empty) => x.clone(),
            (
                Self::Range {
                    lower: a_lo,
                    upper: a_hi,
                },
                Self::Range {
                    lower: b_lo,
                    upper: b_hi,
                },
            ) => {
                let lower = if lower_cmp(a_lo, b_lo) == Ordering::Greater {
                    b_lo.clone()
                } else {
                    a_lo.clone()
                };
                let upper = if upper_cmp(a_hi, b_hi) == Ordering::Less {
                    b_hi.clone()
                } else {
                    a_hi.clone()
                };
                Self::Range { lower, upper }
            }
        }
    }

    /// `self ∩ ¬other`.
    ///
    /// This single-interval representation cannot express "remove a chunk
    /// from the middle" as an exact result: when `other` is strictly inside
    /// `self` on both sides, this reproduces the source system's documented
    /// asymmetry and keeps only the lower remainder `[self.lower, other.lower)`
    /// (§9, open question (b)). Callers must not rely on the upper remainder
    /// surviving in that case.
    pub fn intersection_with_inverse(&self, other: &Self) -> Self {
        let (a_lo, a_hi) = match self {
            Self::Empty => return Self::Empty,
            Self::Range { lower, upper } => (lower, upper),
        };
        let (b_lo, b_hi) = match other {
            Self::Empty => return self.clone(),
            Self::Range { lower, upper } => (lower, upper),
        };

        let overlap_lo = lower_max(a_lo, b_lo);
        let overlap_hi = upper_min(a_hi, b_hi);
        if !range_nonempty(&overlap_lo, &overlap_hi) {
            // other does not overlap self at all.
            return self.clone();
        }

        let trims_low = lower_cmp(b_lo, a_lo) != Ordering::Greater;
        let trims_high = upper_cmp(b_hi, a_hi) != Ordering::Less;

        let result = match (trims_low, trims_high) {
            (true, true) => return Self::Empty,
            (true, false) => Self::Range {
                lower: b_hi.clone(),
                upper: a_hi.clone(),
            },
            (false, true) => Self::Range {
                lower: a_lo.clone(),
                upper: b_lo.clone(),
            },
            (false, false) => Self::Range {
                lower: a_lo.clone(),
                upper: b_lo.clone(),
            },
        };
        match &result {
            Self::Range { lower, upper } if !range_nonempty(lower, upper) => Self::Empty,
            _ => result,
        }
    }

    /// `self.containsAll(other)`: every version in `other` is in `self`.
    pub fn contains_all(&self, other: &Self) -> bool {
        &self.intersection(other) == other
    }

    /// `self.containsAny(other)`: some version is in both.
    pub fn contains_any(&self, other: &Self) -> bool {
        !self.intersection(other).is_empty()
    }
}

impl fmt::Display for VersionSetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "∅"),
            Self::Range {
                lower: None,
                upper: None,
            } => write!(f, "*"),
            Self::Range {
                lower: Some(l),
                upper: None,
            } => write!(f, ">={l}"),
            Self::Range {
                lower: None,
                upper: Some(u),
            } => write!(f, "<{u}"),
            Self::Range {
                lower: Some(l),
                upper: Some(u),
            } if *u == l.bump() => write!(f, "={l}"),
            Self::Range {
                lower: Some(l),
                upper: Some(u),
            } if *u == l.next_major() => write!(f, "^{l}"),
            Self::Range {
                lower: Some(l),
                upper: Some(u),
            } => write!(f, ">={l}, <{u}"),
        }
    }
}

/// What a dependency edge requires of the package it points to.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Requirement {
    /// A set of acceptable versions.
    VersionSet(VersionSetSpec),
    /// A single named commit or branch.
    Revision(Revision),
    /// Bound to a local working copy, independent of any version.
    Unversioned,
}

impl Requirement {
    pub fn any() -> Self {
        Self::VersionSet(VersionSetSpec::any())
    }

    pub fn exact(v: Version) -> Self {
        Self::VersionSet(VersionSetSpec::exact(v))
    }

    /// Every version of `other` is accepted by `self`. Asymmetric across
    /// shapes: unversioned and revision requirements dominate version sets
    /// (§4.1).
    pub fn contains_all(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unversioned, Self::Unversioned) => true,
            (_, Self::Unversioned) => true,
            (Self::Unversioned, _) => false,
            (Self::VersionSet(a), Self::VersionSet(b)) => a.contains_all(b),
            (Self::Revision(x), Self::Revision(y)) => x == y,
            (Self::Revision(_), _) => false,
            (_, Self::Revision(_)) => true,
        }
    }

    /// Some version is accepted by both `self` and `other`.
    pub fn contains_any(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unversioned, Self::Unversioned) => true,
            (_, Self::Unversioned) => true,
            (Self::Unversioned, _) => false,
            (Self::VersionSet(a), Self::VersionSet(b)) => a.contains_any(b),
            (Self::Revision(x), Self::Revision(y)) => x == y,
            (Self::Revision(_), _) => false,
            (_, Self::Revision(_)) => true,
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VersionSet(spec) => write!(f, "{spec}"),
            Self::Revision(r) => write!(f, "@{r}"),
            Self::Unversioned => write!(f, "*unversioned*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn version_strategy() -> impl Strategy<Value = Version> {
        (0u32..5, 0u32..5, 0u32..5).prop_map(|(a, b, c)| Version::new(a, b, c))
    }

    fn spec_strategy() -> impl Strategy<Value = VersionSetSpec> {
        prop_oneof![
            Just(VersionSetSpec::empty()),
            Just(VersionSetSpec::any()),
            version_strategy().prop_map(VersionSetSpec::exact),
            (version_strategy(), version_strategy())
                .prop_map(|(a, b)| VersionSetSpec::range(a.min(b), a.max(b).bump())),
        ]
    }

    #[test]
    fn exact_is_half_open_singleton() {
        let v = Version::new(1, 2, 3);
        let spec = VersionSetSpec::exact(v);
        assert!(spec.contains(&v));
        assert!(!spec.contains(&v.bump()));
    }

    #[test]
    fn empty_is_intersection_annihilator() {
        let any = VersionSetSpec::any();
        assert_eq!(any.intersection(&VersionSetSpec::empty()), VersionSetSpec::empty());
    }

    #[test]
    fn intersection_with_inverse_keeps_lower_remainder_when_strictly_inside() {
        let a = VersionSetSpec::range(Version::new(1, 0, 0), Version::new(5, 0, 0));
        let b = VersionSetSpec::range(Version::new(2, 0, 0), Version::new(3, 0, 0));
        let result = a.intersection_with_inverse(&b);
        assert_eq!(
            result,
            VersionSetSpec::range(Version::new(1, 0, 0), Version::new(2, 0, 0))
        );
    }

    #[test]
    fn unversioned_dominates_requirement_containment() {
        let unversioned = Requirement::Unversioned;
        let any_range = Requirement::any();
        assert!(any_range.contains_all(&unversioned));
        assert!(any_range.contains_any(&unversioned));
        assert!(!unversioned.contains_all(&any_range));
        assert!(!unversioned.contains_any(&any_range));
    }

    #[test]
    fn revision_dominates_version_set_containment() {
        let rev = Requirement::Revision(Revision::new("main"));
        let range = Requirement::any();
        assert!(range.contains_all(&rev));
        assert!(!rev.contains_all(&range));
    }

    proptest! {
        #[test]
        fn intersection_is_commutative(a in spec_strategy(), b in spec_strategy()) {
            prop_assert_eq!(a.intersection(&b), b.intersection(&a));
        }

        #[test]
        fn intersection_is_associative(a in spec_strategy(), b in spec_strategy(), c in spec_strategy()) {
            prop_assert_eq!(
                a.intersection(&b).intersection(&c),
                a.intersection(&b.intersection(&c))
            );
        }

        #[test]
        fn any_is_intersection_identity(a in spec_strategy()) {
            prop_assert_eq!(a.intersection(&VersionSetSpec::any()), a.clone());
        }

        #[test]
        fn empty_is_intersection_annihilator_prop(a in spec_strategy()) {
            prop_assert_eq!(a.intersection(&VersionSetSpec::empty()), VersionSetSpec::empty());
        }

        #[test]
        fn containment_antisymmetry_implies_equality(a in spec_strategy(), b in spec_strategy()) {
            if a.contains_all(&b) && b.contains_all(&a) {
                prop_assert_eq!(a, b);
            }
        }
    }
}
