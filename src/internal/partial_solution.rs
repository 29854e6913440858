// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The append-only log of decisions and derivations, and the per-package
//! caches derived from it (C4).

use indexmap::IndexMap;

use crate::internal::assignment::{Assignment, DecisionLevel};
use crate::internal::incompatibility::IncompId;
use crate::package::PackageReference;
use crate::solver::BoundVersion;
use crate::term::{self, Term};
use crate::type_aliases::Map;

/// The assignment (by index into the log) that first made a term true, and
/// the decision level and cause of that assignment.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Satisfier {
    pub index: usize,
    pub decision_level: DecisionLevel,
    pub cause: Option<IncompId>,
}

/// Append-only log of assignments plus the per-package caches derived from
/// it. The only mutable state during a solve.
#[derive(Debug, Clone)]
pub(crate) struct PartialSolution {
    assignments: Vec<Assignment>,
    /// Intersection of all positive terms seen so far, net of negatives.
    positive: IndexMap<PackageReference, Term>,
    /// Union of negative terms, present only while no positive term exists.
    negative: Map<PackageReference, Term>,
    /// One entry per decided package, in decision order.
    decisions: IndexMap<PackageReference, (BoundVersion, DecisionLevel)>,
    current_decision_level: DecisionLevel,
}

impl PartialSolution {
    pub(crate) fn empty() -> Self {
        Self {
            assignments: Vec::new(),
            positive: IndexMap::new(),
            negative: Map::default(),
            decisions: IndexMap::new(),
            current_decision_level: DecisionLevel::zero(),
        }
    }

    fn register(&mut self, assignment: &Assignment) {
        let package = assignment.term().package().clone();
        if let Some(existing) = self.positive.get(&package) {
            let merged = existing.intersect(assignment.term()).unwrap_or_else(|| {
                unreachable!(
                    "assignment for {package} contradicts the positive cache; this is an \
                     internal invariant violation"
                )
            });
            self.positive.insert(package, merged);
            return;
        }
        let updated = match self.negative.get(&package) {
            Some(existing_negative) => {
                assignment.term().intersect(existing_negative).unwrap_or_else(|| {
                    unreachable!(
                        "assignment for {package} contradicts the negative cache; this is an \
                         internal invariant violation"
                    )
                })
            }
            None => assignment.term().clone(),
        };
        if updated.is_positive() {
            self.negative.remove(&package);
            self.positive.insert(package, updated);
        } else {
            self.negative.insert(package, updated);
        }
    }

    /// Append a forced assignment and fold it into the caches.
    pub(crate) fn derive(&mut self, term: Term, cause: IncompId) {
        let assignment = Assignment::derivation(term, self.current_decision_level, cause);
        self.register(&assignment);
        self.assignments.push(assignment);
    }

    /// Commit to a concrete bound for `package`, bumping the decision level.
    pub(crate) fn decide(&mut self, package: PackageReference, bound: BoundVersion) {
        let level = DecisionLevel(self.decisions.len() as u32);
        self.current_decision_level = level;
        let term = bound.to_term(package.clone());
        self.decisions.insert(package, (bound, level));
        let assignment = Assignment::decision(term, level);
        self.register(&assignment);
        self.assignments.push(assignment);
    }

    /// Drop every assignment past `level`, then rebuild the caches from
    /// scratch by replaying what remains. This is the backtrack contract
    /// (§8 invariant 3): replay must reconstruct the caches bit-identically.
    pub(crate) fn backtrack(&mut self, level: DecisionLevel) {
        self.assignments.retain(|a| a.decision_level() <= level);
        self.decisions.retain(|_, (_, lvl)| *lvl <= level);
        self.current_decision_level = level;
        self.positive.clear();
        self.negative.clear();
        let assignments = std::mem::take(&mut self.assignments);
        for assignment in &assignments {
            self.register(assignment);
        }
        self.assignments = assignments;
    }

    /// How the solution currently relates to `term`'s package: subset,
    /// disjoint, or overlap (§4.4). Absence of any knowledge counts as
    /// overlap, never subset or disjoint.
    pub(crate) fn relation_for(&self, package: &PackageReference, term: &Term) -> term::Relation {
        if let Some(positive) = self.positive.get(package) {
            return positive.relation(term);
        }
        if let Some(negative) = self.negative.get(package) {
            return negative.relation(term);
        }
        term::Relation::Overlap
    }

    /// The first package with a positive cached term but no decision yet,
    /// in the order it first appeared (§4.5's decision heuristic: pick the
    /// first undecided package).
    pub(crate) fn first_undecided(&self) -> Option<PackageReference> {
        self.positive
            .keys()
            .find(|p| !self.decisions.contains_key(*p))
            .cloned()
    }

    pub(crate) fn current_decision_level(&self) -> DecisionLevel {
        self.current_decision_level
    }

    /// The current positive term cached for `package`, if any. Decision
    /// making uses this to learn what requirement a freshly undecided
    /// package must satisfy.
    pub(crate) fn term_for(&self, package: &PackageReference) -> Option<&Term> {
        self.positive.get(package)
    }

    /// The raw term of the assignment at `index`, as opposed to the running
    /// accumulated intersection — used by conflict resolution to tell apart
    /// a satisfier that stands on its own from one that only satisfies a
    /// term in combination with earlier assignments for the same package.
    pub(crate) fn assignment_term_at(&self, index: usize) -> &Term {
        self.assignments[index].term()
    }

    /// Decided bindings in the order they were decided, including the
    /// synthetic root.
    pub(crate) fn decisions(&self) -> impl Iterator<Item = (&PackageReference, &BoundVersion)> {
        self.decisions.iter().map(|(p, (b, _))| (p, b))
    }

    /// Scan the log for `term`'s package, maintaining the running
    /// intersection of same-package terms, and return the first assignment
    /// after which that intersection is a subset of `term` (§4.4
    /// `satisfier`). Always succeeds for terms actually satisfied by the
    /// solution; otherwise this is a fatal invariant violation.
    pub(crate) fn satisfier(&self, term: &Term) -> Satisfier {
        let package = term.package();
        let mut accumulated: Option<Term> = None;
        for (index, assignment) in self.assignments.iter().enumerate() {
            if assignment.term().package() != package {
                continue;
            }
            accumulated = Some(match accumulated {
                None => assignment.term().clone(),
                Some(acc) => acc.intersect(assignment.term()).unwrap_or_else(|| {
                    unreachable!(
                        "accumulated term for {package} became contradictory; this is an \
                         internal invariant violation"
                    )
                }),
            });
            if accumulated.as_ref().expect("just set").satisfies(term) {
                return Satisfier {
                    index,
                    decision_level: assignment.decision_level(),
                    cause: assignment.cause(),
                };
            }
        }
        unreachable!(
            "no satisfier found for {term}; this is an internal invariant violation \
             (the caller must only ask for terms the solution actually satisfies)"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirement::Requirement;
    use crate::version::Version;

    fn pkg(name: &str) -> PackageReference {
        PackageReference::new(name)
    }

    #[test]
    fn decide_then_derive_keeps_positive_cache_in_sync() {
        let mut ps = PartialSolution::empty();
        ps.decide(pkg("root"), BoundVersion::Version(Version::one()));
        assert_eq!(ps.current_decision_level(), DecisionLevel(0));
        assert!(ps.decisions().any(|(p, _)| p == &pkg("root")));
    }

    #[test]
    fn backtrack_drops_assignments_above_level() {
        let mut ps = PartialSolution::empty();
        ps.decide(pkg("root"), BoundVersion::Version(Version::one()));
        ps.decide(pkg("a"), BoundVersion::Version(Version::one()));
        assert_eq!(ps.current_decision_level(), DecisionLevel(1));
        ps.backtrack(DecisionLevel(0));
        assert_eq!(ps.current_decision_level(), DecisionLevel(0));
        assert!(!ps.decisions().any(|(p, _)| p == &pkg("a")));
    }

    #[test]
    fn relation_for_unknown_package_is_overlap() {
        let ps = PartialSolution::empty();
        let term = Term::positive(pkg("a"), Requirement::any());
        assert_eq!(ps.relation_for(&pkg("a"), &term), term::Relation::Overlap);
    }
}
