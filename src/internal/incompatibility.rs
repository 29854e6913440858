// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A normalized set of terms that should never all be true at once (C3).

use std::fmt;

use indexmap::IndexMap;

use crate::internal::arena::Id;
use crate::package::PackageReference;
use crate::term::{self, Term};
use crate::version::Version;

/// Arena index of an [`Incompatibility`].
pub(crate) type IncompId = Id<Incompatibility>;

/// Why an incompatibility exists.
#[derive(Debug, Clone)]
pub(crate) enum Cause {
    /// Seeded at the start of a solve: `{¬root@version}`.
    Root,
    /// Encodes "`depender` depends on `dependency`".
    Dependency(PackageReference),
    /// Nothing available matches a requirement.
    NoAvailableVersion,
    /// Learned during conflict resolution; carries back-pointers to the two
    /// incompatibilities it was resolved from, forming the derivation DAG.
    Conflict { left: IncompId, right: IncompId },
}

/// How a set of terms (typically the partial solution) relates to an
/// incompatibility.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) enum Relation {
    /// Every term is true: the incompatibility has fired.
    Satisfied,
    /// At least one term is already known false: this clause is inert.
    Contradicted(PackageReference, Term),
    /// All but one term are true; the remaining term is the one this clause
    /// can still force.
    AlmostSatisfied(PackageReference),
    /// Two or more terms are still undetermined.
    Inconclusive,
}

/// Ordered set of terms (for diagnostics) for different packages that must
/// never all be true simultaneously.
#[derive(Debug, Clone)]
pub(crate) struct Incompatibility {
    terms: IndexMap<PackageReference, Term>,
    cause: Cause,
}

impl Incompatibility {
    fn new(terms: Vec<Term>, cause: Cause) -> Self {
        let mut grouped: IndexMap<PackageReference, Term> = IndexMap::new();
        for term in terms {
            let pkg = term.package().clone();
            match grouped.get(&pkg) {
                Some(existing) => {
                    let merged = existing.intersect(&term).unwrap_or_else(|| {
                        unreachable!(
                            "incompatibility construction produced an empty term for {pkg}"
                        )
                    });
                    grouped.insert(pkg, merged);
                }
                None => {
                    grouped.insert(pkg, term);
                }
            }
        }
        if matches!(cause, Cause::Conflict { .. }) && grouped.len() > 1 {
            grouped.retain(|pkg, term| !(pkg.is_root() && term.is_positive()));
        }
        assert!(
            !grouped.is_empty(),
            "incompatibility normalized to zero terms; this is an internal invariant violation"
        );
        Self {
            terms: grouped,
            cause,
        }
    }

    /// The synthetic `{¬root@version}` incompatibility seeded at the start
    /// of every solve (§4.5 Entry).
    pub(crate) fn root(root_package: PackageReference, root_version: Version) -> Self {
        Self::new(
            vec![Term::negative(
                root_package,
                crate::requirement::Requirement::exact(root_version),
            )],
            Cause::Root,
        )
    }

    /// `{term}` recording that nothing available satisfies `term`'s
    /// requirement.
    pub(crate) fn no_available_version(term: Term) -> Self {
        assert!(term.is_positive(), "no_available_version term must be positive");
        Self::new(vec![term], Cause::NoAvailableVersion)
    }

    /// `{depender_term, ¬dependency_term}`, encoding that `depender` being
    /// at `depender_term`'s bound requires `dependency_term`'s package to
    /// satisfy `dependency_term`'s requirement.
    pub(crate) fn from_dependency(
        depender: PackageReference,
        depender_term: Term,
        dependency_term: Term,
    ) -> Self {
        Self::new(
            vec![depender_term, dependency_term.inverse()],
            Cause::Dependency(depender),
        )
    }

    /// Rewrite by the rule of resolution: combine `incompat` and
    /// `satisfier_cause` around their shared `package`, per §4.5 step 4.
    pub(crate) fn prior_cause(
        incompat: &Self,
        satisfier_cause: &Self,
        package: &PackageReference,
        left_id: IncompId,
        right_id: IncompId,
    ) -> Self {
        let mut terms: Vec<Term> = incompat
            .terms
            .iter()
            .filter(|(p, _)| *p != package)
            .map(|(_, t)| t.clone())
            .collect();
        terms.extend(
            satisfier_cause
                .terms
                .iter()
                .filter(|(p, _)| *p != package)
                .map(|(_, t)| t.clone()),
        );
        let t1 = incompat
            .terms
            .get(package)
            .expect("pivot package term must exist in incompat");
        let t2 = satisfier_cause
            .terms
            .get(package)
            .expect("pivot package term must exist in satisfier cause");
        // union(t1, t2) = ¬(¬t1 ∩ ¬t2); `None` means the union is
        // trivially true, in which case it contributes nothing.
        if let Some(union_inverse) = t1.inverse().intersect(&t2.inverse()) {
            terms.push(union_inverse.inverse());
        }
        Self::new(
            terms,
            Cause::Conflict {
                left: left_id,
                right: right_id,
            },
        )
    }

    /// Classify this incompatibility against an observer function that
    /// reports how a package's known state relates to a given term (§4.5
    /// unit propagation classification).
    pub(crate) fn relation(
        &self,
        mut solution_relation: impl FnMut(&PackageReference, &Term) -> term::Relation,
    ) -> Relation {
        let mut unknown_count = 0;
        let mut unknown_package = None;
        for (package, incompat_term) in self.terms.iter() {
            match solution_relation(package, incompat_term) {
                term::Relation::Disjoint => {
                    return Relation::Contradicted(package.clone(), incompat_term.clone());
                }
                term::Relation::Subset => {}
                term::Relation::Overlap => {
                    unknown_count += 1;
                    unknown_package = Some(package.clone());
                }
            }
        }
        match unknown_count {
            0 => Relation::Satisfied,
            1 => Relation::AlmostSatisfied(unknown_package.expect("counted exactly one")),
            _ => Relation::Inconclusive,
        }
    }

    /// True when this incompatibility can only mean "no solution exists":
    /// a single term about the synthetic root, or no terms at all.
    pub(crate) fn is_terminal(&self) -> bool {
        match self.terms.len() {
            0 => true,
            1 => self.terms.keys().next().expect("len is 1").is_root(),
            _ => false,
        }
    }

    pub(crate) fn get(&self, package: &PackageReference) -> Option<&Term> {
        self.terms.get(package)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&PackageReference, &Term)> {
        self.terms.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.terms.len()
    }

    pub(crate) fn causes(&self) -> Option<(IncompId, IncompId)> {
        match self.cause {
            Cause::Conflict { left, right } => Some((left, right)),
            _ => None,
        }
    }

    pub(crate) fn cause(&self) -> &Cause {
        &self.cause
    }
}

impl fmt::Display for Incompatibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.terms.values().map(|t| t.to_string()).collect();
        write!(f, "{}", rendered.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirement::Requirement;

    fn pkg(name: &str) -> PackageReference {
        PackageReference::new(name)
    }

    #[test]
    fn normalization_rejects_empty_intersection() {
        let a = Term::positive(pkg("a"), Requirement::exact(Version::new(1, 0, 0)));
        let b = Term::positive(pkg("a"), Requirement::exact(Version::new(2, 0, 0)));
        let result = std::panic::catch_unwind(|| Incompatibility::new(vec![a, b], Cause::Root));
        assert!(result.is_err());
    }

    #[test]
    fn duplicate_package_terms_are_intersected() {
        let wide = Term::positive(pkg("a"), Requirement::any());
        let narrow = Term::positive(pkg("a"), Requirement::exact(Version::new(1, 0, 0)));
        let incompat = Incompatibility::new(vec![wide, narrow.clone()], Cause::Root);
        assert_eq!(incompat.len(), 1);
        assert_eq!(incompat.get(&pkg("a")), Some(&narrow));
    }

    #[test]
    fn conflict_cause_elides_root_positive_term_when_other_terms_present() {
        let root_term = Term::positive(PackageReference::root(), Requirement::exact(Version::one()));
        let other = Term::negative(pkg("a"), Requirement::any());
        let incompat = Incompatibility::new(
            vec![root_term, other],
            Cause::Conflict {
                left: placeholder_id(),
                right: placeholder_id(),
            },
        );
        assert_eq!(incompat.len(), 1);
        assert!(incompat.get(&PackageReference::root()).is_none());
    }

    // Arena ids can only be minted by an Arena; build a throwaway one for tests
    // that merely need a placeholder id to construct a Conflict cause.
    fn placeholder_id() -> IncompId {
        let mut arena = crate::internal::arena::Arena::new();
        arena.alloc(Incompatibility::new(
            vec![Term::positive(pkg("placeholder"), Requirement::any())],
            Cause::Root,
        ))
    }

    #[test]
    fn is_terminal_on_root_singleton() {
        let incompat = Incompatibility::root(PackageReference::root(), Version::one());
        assert!(incompat.is_terminal());
    }
}
