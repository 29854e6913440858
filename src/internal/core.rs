// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Solver state: the incompatibility store, the partial solution, and the
//! unit propagation / conflict resolution loop (C5).

use crate::internal::arena::Arena;
use crate::internal::incompatibility::{self, Cause, IncompId, Incompatibility};
use crate::internal::partial_solution::PartialSolution;
use crate::package::PackageReference;
use crate::requirement::Requirement;
use crate::solver::BoundVersion;
use crate::term::Term;
use crate::type_aliases::Map;
use crate::version::Version;

/// Mutable state of one solve. Discarded once `solve` returns.
pub(crate) struct State {
    root_package: PackageReference,
    #[allow(dead_code)]
    root_version: Version,

    incompatibilities: Map<PackageReference, Vec<IncompId>>,

    /// Incompatibilities already known contradicted, tagged with the
    /// decision level at which that was established; dropped on backtrack
    /// past that level.
    contradicted_incompatibilities: Map<IncompId, crate::internal::assignment::DecisionLevel>,

    partial_solution: PartialSolution,
    incompatibility_store: Arena<Incompatibility>,

    unit_propagation_buffer: Vec<PackageReference>,
}

impl State {
    /// Seed a fresh state with the root incompatibility `{¬root@version}`
    /// (§4.5 Entry).
    pub(crate) fn init(root_package: PackageReference, root_version: Version) -> Self {
        let mut incompatibility_store = Arena::new();
        let root_id = incompatibility_store.alloc(Incompatibility::root(
            root_package.clone(),
            root_version.clone(),
        ));
        let mut incompatibilities = Map::default();
        incompatibilities.insert(root_package.clone(), vec![root_id]);
        Self {
            root_package,
            root_version,
            incompatibilities,
            contradicted_incompatibilities: Map::default(),
            partial_solution: PartialSolution::empty(),
            incompatibility_store,
            unit_propagation_buffer: Vec::new(),
        }
    }

    pub(crate) fn root_package(&self) -> &PackageReference {
        &self.root_package
    }

    pub(crate) fn partial_solution(&self) -> &PartialSolution {
        &self.partial_solution
    }

    pub(crate) fn incompatibility(&self, id: IncompId) -> &Incompatibility {
        &self.incompatibility_store[id]
    }

    /// Allocate an incompatibility and index it under every package it
    /// mentions.
    pub(crate) fn add_incompatibility(&mut self, incompat: Incompatibility) -> IncompId {
        let id = self.incompatibility_store.alloc(incompat);
        self.index_incompatibility(id);
        id
    }

    /// `{package_at_bound, ¬dep}` for every `dep` the decided package
    /// requires (§4.6).
    pub(crate) fn add_incompatibility_from_dependencies(
        &mut self,
        package: PackageReference,
        self_term: Term,
        dependencies: impl IntoIterator<Item = (PackageReference, Requirement)>,
    ) -> Vec<IncompId> {
        dependencies
            .into_iter()
            .map(|(dep_package, dep_requirement)| {
                let incompat = Incompatibility::from_dependency(
                    package.clone(),
                    self_term.clone(),
                    Term::positive(dep_package, dep_requirement),
                );
                self.add_incompatibility(incompat)
            })
            .collect()
    }

    fn index_incompatibility(&mut self, id: IncompId) {
        for (package, _) in self.incompatibility_store[id].iter() {
            self.incompatibilities
                .entry(package.clone())
                .or_default()
                .push(id);
        }
    }

    /// Commit `package` to `bound` unless doing so would immediately
    /// conflict with one of `new_incompats` (§4.5 decision making: "skip the
    /// decision" case). Returns whether the decision was committed.
    pub(crate) fn decide_if_safe(
        &mut self,
        package: PackageReference,
        bound: BoundVersion,
        new_incompats: &[IncompId],
    ) -> bool {
        let candidate_term = bound.to_term(package.clone());
        let safe = new_incompats.iter().all(|&id| {
            let relation = self.incompatibility_store[id].relation(|p, t| {
                if *p == package {
                    candidate_term.relation(t)
                } else {
                    self.partial_solution.relation_for(p, t)
                }
            });
            relation != incompatibility::Relation::Satisfied
        });
        if safe {
            self.partial_solution.decide(package, bound);
        }
        safe
    }

    /// Propagate the consequences of `package`'s assignment until either no
    /// package has changed, or a conflicting incompatibility is found and
    /// resolved down to a root cause, in which case that root cause's id is
    /// returned as the error (§4.5 unit propagation / conflict resolution).
    pub(crate) fn unit_propagation(&mut self, package: PackageReference) -> Result<(), IncompId> {
        self.unit_propagation_buffer.clear();
        self.unit_propagation_buffer.push(package);
        while let Some(current_package) = self.unit_propagation_buffer.pop() {
            let relevant: Vec<IncompId> = self
                .incompatibilities
                .get(&current_package)
                .cloned()
                .unwrap_or_default();
            let mut conflict_id = None;
            for &incompat_id in relevant.iter().rev() {
                if self
                    .contradicted_incompatibilities
                    .contains_key(&incompat_id)
                {
                    continue;
                }
                let relation = self.incompatibility_store[incompat_id]
                    .relation(|p, t| self.partial_solution.relation_for(p, t));
                match relation {
                    incompatibility::Relation::Satisfied => {
                        conflict_id = Some(incompat_id);
                        break;
                    }
                    incompatibility::Relation::AlmostSatisfied(package_almost) => {
                        if !self.unit_propagation_buffer.contains(&package_almost) {
                            self.unit_propagation_buffer.push(package_almost.clone());
                        }
                        let forced = self.incompatibility_store[incompat_id]
                            .get(&package_almost)
                            .expect("almost-satisfied package must have a term")
                            .inverse();
                        self.partial_solution.derive(forced, incompat_id);
                        self.contradicted_incompatibilities
                            .insert(incompat_id, self.partial_solution.current_decision_level());
                    }
                    incompatibility::Relation::Contradicted(..) => {
                        self.contradicted_incompatibilities
                            .insert(incompat_id, self.partial_solution.current_decision_level());
                    }
                    incompatibility::Relation::Inconclusive => {}
                }
            }
            if let Some(incompat_id) = conflict_id {
                let (package_almost, root_cause) = self.conflict_resolution(incompat_id)?;
                self.unit_propagation_buffer.clear();
                self.unit_propagation_buffer.push(package_almost.clone());
                let forced = self.incompatibility_store[root_cause]
                    .get(&package_almost)
                    .expect("root cause must mention the forced package")
                    .inverse();
                self.partial_solution.derive(forced, root_cause);
                self.contradicted_incompatibilities
                    .insert(root_cause, self.partial_solution.current_decision_level());
            }
        }
        Ok(())
    }

    /// Rewrite a conflicting incompatibility by the rule of resolution
    /// until it becomes back-jumpable, then backtrack to the appropriate
    /// decision level (§4.5 conflict resolution, steps 1-4).
    fn conflict_resolution(
        &mut self,
        incompatibility: IncompId,
    ) -> Result<(PackageReference, IncompId), IncompId> {
        let mut current_id = incompatibility;
        let mut current_changed = false;
        loop {
            if self.incompatibility_store[current_id].is_terminal() {
                return Err(current_id);
            }
            let incompat = self.incompatibility_store[current_id].clone();

            let satisfiers: Vec<(PackageReference, crate::internal::partial_solution::Satisfier)> =
                incompat
                    .iter()
                    .map(|(p, t)| (p.clone(), self.partial_solution.satisfier(t)))
                    .collect();
            let (most_recent_package, most_recent) = satisfiers
                .iter()
                .max_by_key(|(_, s)| s.index)
                .cloned()
                .expect("a conflicting incompatibility has at least one term");
            let most_recent_term = incompat
                .get(&most_recent_package)
                .expect("package came from this incompatibility's own terms")
                .clone();

            let mut previous_satisfier_level = satisfiers
                .iter()
                .filter(|(p, _)| *p != most_recent_package)
                .map(|(_, s)| s.decision_level)
                .max()
                .unwrap_or_else(crate::internal::assignment::DecisionLevel::zero);

            let satisfier_assignment_term = self
                .partial_solution
                .assignment_term_at(most_recent.index)
                .clone();
            if !satisfier_assignment_term.satisfies(&most_recent_term) {
                if let Some(difference) = satisfier_assignment_term.difference(&most_recent_term) {
                    let difference_satisfier = self.partial_solution.satisfier(&difference.inverse());
                    previous_satisfier_level =
                        previous_satisfier_level.max(difference_satisfier.decision_level);
                }
            }

            if previous_satisfier_level < most_recent.decision_level || most_recent.cause.is_none()
            {
                self.backtrack(current_id, current_changed, previous_satisfier_level);
                return Ok((most_recent_package, current_id));
            }

            let satisfier_cause_id = most_recent.cause.expect("checked above: has a cause");
            let satisfier_cause = self.incompatibility_store[satisfier_cause_id].clone();
            let prior_cause = Incompatibility::prior_cause(
                &incompat,
                &satisfier_cause,
                &most_recent_package,
                current_id,
                satisfier_cause_id,
            );
            current_id = self.incompatibility_store.alloc(prior_cause);
            current_changed = true;
        }
    }

    fn backtrack(
        &mut self,
        incompat: IncompId,
        incompat_changed: bool,
        decision_level: crate::internal::assignment::DecisionLevel,
    ) {
        self.partial_solution.backtrack(decision_level);
        self.contradicted_incompatibilities
            .retain(|_, dl| *dl <= decision_level);
        if incompat_changed {
            self.index_incompatibility(incompat);
        }
    }

    /// Walk the derivation DAG rooted at `incompat`, tagging nodes reached
    /// from more than one parent so the report builder can number them once
    /// and refer back to them (§4.8 step 1), then build the tree bottom-up
    /// in an order that never visits a cause before its effect.
    pub(crate) fn build_derivation_tree(&self, incompat: IncompId) -> crate::report::DerivationTree {
        use std::collections::HashSet;

        let mut all_ids: HashSet<IncompId> = HashSet::new();
        let mut shared_ids: HashSet<IncompId> = HashSet::new();
        let mut stack = vec![incompat];
        while let Some(id) = stack.pop() {
            if let Some((left, right)) = self.incompatibility_store[id].causes() {
                if all_ids.contains(&id) {
                    shared_ids.insert(id);
                } else {
                    stack.push(left);
                    stack.push(right);
                }
            }
            all_ids.insert(id);
        }
        let mut sorted_ids: Vec<IncompId> = all_ids.into_iter().collect();
        sorted_ids.sort_unstable_by_key(|id| id.into_raw());

        let mut built: Map<IncompId, std::sync::Arc<crate::report::DerivationTree>> = Map::default();
        for id in sorted_ids {
            let tree = crate::report::build_node(
                id,
                &self.incompatibility_store[id],
                &shared_ids,
                &built,
            );
            built.insert(id, std::sync::Arc::new(tree));
        }
        std::sync::Arc::into_inner(built.remove(&incompat).expect("root was just inserted"))
            .expect("no other references to the root outlive this function")
    }

    pub(crate) fn cause(&self, id: IncompId) -> &Cause {
        self.incompatibility_store[id].cause()
    }
}
