// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Walk the derivation DAG of a root-cause incompatibility and render it as
//! a numbered, human-readable explanation (C7).

use std::collections::HashSet;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::internal::incompatibility::{Cause, IncompId, Incompatibility};
use crate::package::PackageReference;
use crate::requirement::{Requirement, VersionSetSpec};
use crate::term::Term;
use crate::type_aliases::Map;
use crate::version::Version;

/// The full chain of reasons why no assignment satisfies a set of
/// constraints. Leaves are [`External`], internal nodes are [`Derived`].
#[derive(Debug, Clone)]
pub enum DerivationTree {
    /// A reason independent of how the solver is implemented.
    External(External),
    /// An incompatibility learned by resolving two others.
    Derived(Derived),
}

/// Leaves of a [`DerivationTree`]: reasons that need no further unpacking.
#[derive(Debug, Clone)]
pub enum External {
    /// We are looking for an assignment to the root package at this version.
    Root(PackageReference, Version),
    /// Nothing available satisfies this requirement.
    NoAvailableVersion(PackageReference, Requirement),
    /// `depender` at `depender_requirement` depends on `dependency` at
    /// `dependency_requirement`.
    Dependency(PackageReference, Requirement, PackageReference, Requirement),
}

/// An incompatibility learned during conflict resolution, together with the
/// two incompatibilities it was resolved from.
#[derive(Debug, Clone)]
pub struct Derived {
    /// Terms of the incompatibility, in insertion order.
    pub terms: IndexMap<PackageReference, Term>,
    /// `Some(id)` when this node is reached from more than one parent in
    /// the DAG — such nodes are explained once and referred back to.
    pub shared_id: Option<usize>,
    /// First parent.
    pub cause1: Box<DerivationTree>,
    /// Second parent.
    pub cause2: Box<DerivationTree>,
}

impl DerivationTree {
    /// Every package mentioned anywhere in the tree.
    pub fn packages(&self) -> HashSet<&PackageReference> {
        let mut packages = HashSet::new();
        match self {
            Self::External(external) => match external {
                External::Dependency(p, _, q, _) => {
                    packages.insert(p);
                    packages.insert(q);
                }
                External::Root(p, _) | External::NoAvailableVersion(p, _) => {
                    packages.insert(p);
                }
            },
            Self::Derived(derived) => {
                packages.extend(derived.terms.keys());
                packages.extend(derived.cause1.packages());
                packages.extend(derived.cause2.packages());
            }
        }
        packages
    }
}

fn is_any(requirement: &Requirement) -> bool {
    requirement == &Requirement::any()
}

impl fmt::Display for External {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root(package, version) => {
                write!(f, "we are solving dependencies of {package} {version}")
            }
            Self::NoAvailableVersion(package, requirement) => {
                if is_any(requirement) {
                    write!(f, "there is no available version for {package}")
                } else {
                    write!(f, "there is no version of {package} in {requirement}")
                }
            }
            Self::Dependency(p, p_req, dep, dep_req) => {
                format_dependency_line(f, p, p_req, dep, dep_req)
            }
        }
    }
}

fn format_dependency_line(
    f: &mut fmt::Formatter<'_>,
    p: &PackageReference,
    p_req: &Requirement,
    dep: &PackageReference,
    dep_req: &Requirement,
) -> fmt::Result {
    match (is_any(p_req), is_any(dep_req)) {
        (true, true) => write!(f, "{p} depends on {dep}"),
        (true, false) => write!(f, "{p} depends on {dep} {dep_req}"),
        (false, true) => write!(f, "{p} {p_req} depends on {dep}"),
        (false, false) => write!(f, "{p} {p_req} depends on {dep} {dep_req}"),
    }
}

/// Version-range description used for the caret-form rendering mentioned in
/// §4.8; [`Requirement`]'s own [`Display`](std::fmt::Display) already does
/// this (see `requirement.rs`), so callers just format requirements
/// directly.
fn extract_root_version(requirement: &Requirement) -> Version {
    match requirement {
        Requirement::VersionSet(VersionSetSpec::Range { lower: Some(v), .. }) => v.clone(),
        _ => unreachable!("root incompatibility's requirement is always an exact version"),
    }
}

/// Build the `DerivationTree` node for a single incompatibility, given that
/// its causes (if any) have already been built and recorded in `built`.
/// Called bottom-up by [`crate::internal::core::State::build_derivation_tree`].
pub(crate) fn build_node(
    id: IncompId,
    incompat: &Incompatibility,
    shared_ids: &HashSet<IncompId>,
    built: &Map<IncompId, Arc<DerivationTree>>,
) -> DerivationTree {
    match incompat.cause() {
        Cause::Root => {
            let (package, term) = incompat
                .iter()
                .next()
                .expect("root incompatibility has exactly one term");
            DerivationTree::External(External::Root(
                package.clone(),
                extract_root_version(term.requirement()),
            ))
        }
        Cause::NoAvailableVersion => {
            let (package, term) = incompat
                .iter()
                .next()
                .expect("no-available-version incompatibility has exactly one term");
            DerivationTree::External(External::NoAvailableVersion(
                package.clone(),
                term.requirement().clone(),
            ))
        }
        Cause::Dependency(depender) => {
            let depender_term = incompat
                .get(depender)
                .expect("dependency incompatibility mentions its depender");
            let (dependency, dependency_term) = incompat
                .iter()
                .find(|(p, _)| *p != depender)
                .expect("dependency incompatibility has a second term");
            DerivationTree::External(External::Dependency(
                depender.clone(),
                depender_term.requirement().clone(),
                dependency.clone(),
                dependency_term.requirement().clone(),
            ))
        }
        Cause::Conflict { left, right } => DerivationTree::Derived(Derived {
            terms: incompat.iter().map(|(p, t)| (p.clone(), t.clone())).collect(),
            shared_id: shared_ids.contains(&id).then(|| id.into_raw()),
            cause1: Box::new((**built.get(left).expect("cause already built")).clone()),
            cause2: Box::new((**built.get(right).expect("cause already built")).clone()),
        }),
    }
}

fn format_terms(terms: &IndexMap<PackageReference, Term>) -> String {
    let terms_vec: Vec<_> = terms.iter().collect();
    match terms_vec.as_slice() {
        [] => "version solving failed".into(),
        [(package, term)] if term.is_positive() => {
            format!("{package} {} is forbidden", term.requirement())
        }
        [(package, term)] => format!("{package} {} is mandatory", term.requirement()),
        [(p1, t1), (p2, t2)] if t1.is_positive() && !t2.is_positive() => {
            format!("{p1} {} depends on {p2} {}", t1.requirement(), t2.requirement())
        }
        [(p1, t1), (p2, t2)] if !t1.is_positive() && t2.is_positive() => {
            format!("{p2} {} depends on {p1} {}", t2.requirement(), t1.requirement())
        }
        slice => {
            let rendered: Vec<String> = slice
                .iter()
                .map(|(p, t)| format!("{p} {t}"))
                .collect();
            rendered.join(", ") + " are incompatible"
        }
    }
}

/// Renders a [`DerivationTree`] into a [`Reporter::Output`].
pub trait Reporter {
    /// Output type of the report.
    type Output;

    /// Generate a report from the derivation tree describing the
    /// resolution failure.
    fn report(tree: &DerivationTree) -> Self::Output;
}

/// Produces the default, numbered English explanation (§4.8).
pub struct DefaultStringReporter {
    ref_count: usize,
    shared_with_ref: Map<usize, usize>,
    lines: Vec<String>,
}

impl DefaultStringReporter {
    fn new() -> Self {
        Self {
            ref_count: 0,
            shared_with_ref: Map::default(),
            lines: Vec::new(),
        }
    }

    fn build_recursive(&mut self, derived: &Derived) {
        self.build_recursive_helper(derived);
        if let Some(id) = derived.shared_id {
            if !self.shared_with_ref.contains_key(&id) {
                self.add_line_ref();
                self.shared_with_ref.insert(id, self.ref_count);
            }
        }
    }

    fn build_recursive_helper(&mut self, current: &Derived) {
        match (current.cause1.deref(), current.cause2.deref()) {
            (DerivationTree::External(e1), DerivationTree::External(e2)) => {
                self.lines.push(format!(
                    "Because {e1} and {e2}, {}.",
                    format_terms(&current.terms)
                ));
            }
            (DerivationTree::Derived(derived), DerivationTree::External(external)) => {
                self.report_one_each(derived, external, &current.terms);
            }
            (DerivationTree::External(external), DerivationTree::Derived(derived)) => {
                self.report_one_each(derived, external, &current.terms);
            }
            (DerivationTree::Derived(derived1), DerivationTree::Derived(derived2)) => {
                match (self.line_ref_of(derived1.shared_id), self.line_ref_of(derived2.shared_id))
                {
                    (Some(ref1), Some(ref2)) => self.lines.push(format!(
                        "Because {} ({ref1}) and {} ({ref2}), {}.",
                        format_terms(&derived1.terms),
                        format_terms(&derived2.terms),
                        format_terms(&current.terms)
                    )),
                    (Some(ref1), None) => {
                        self.build_recursive(derived2);
                        self.lines.push(format!(
                            "And because {} ({ref1}), {}.",
                            format_terms(&derived1.terms),
                            format_terms(&current.terms)
                        ));
                    }
                    (None, Some(ref2)) => {
                        self.build_recursive(derived1);
                        self.lines.push(format!(
                            "And because {} ({ref2}), {}.",
                            format_terms(&derived2.terms),
                            format_terms(&current.terms)
                        ));
                    }
                    (None, None) => {
                        self.build_recursive(derived1);
                        if derived1.shared_id.is_some() {
                            self.lines.push(String::new());
                            self.build_recursive(current);
                        } else {
                            self.add_line_ref();
                            let ref1 = self.ref_count;
                            self.lines.push(String::new());
                            self.build_recursive(derived2);
                            self.lines.push(format!(
                                "And because {} ({ref1}), {}.",
                                format_terms(&derived1.terms),
                                format_terms(&current.terms)
                            ));
                        }
                    }
                }
            }
        }
    }

    fn report_one_each(&mut self, derived: &Derived, external: &External, current_terms: &IndexMap<PackageReference, Term>) {
        match self.line_ref_of(derived.shared_id) {
            Some(ref_id) => self.lines.push(format!(
                "Because {} ({ref_id}) and {external}, {}.",
                format_terms(&derived.terms),
                format_terms(current_terms)
            )),
            None => self.report_recurse_one_each(derived, external, current_terms),
        }
    }

    fn report_recurse_one_each(
        &mut self,
        derived: &Derived,
        external: &External,
        current_terms: &IndexMap<PackageReference, Term>,
    ) {
        match (derived.cause1.deref(), derived.cause2.deref()) {
            (DerivationTree::Derived(prior_derived), DerivationTree::External(prior_external))
            | (DerivationTree::External(prior_external), DerivationTree::Derived(prior_derived)) => {
                self.build_recursive(prior_derived);
                self.lines.push(format!(
                    "And because {prior_external} and {external}, {}.",
                    format_terms(current_terms)
                ));
            }
            _ => {
                self.build_recursive(derived);
                self.lines.push(format!(
                    "And because {external}, {}.",
                    format_terms(current_terms)
                ));
            }
        }
    }

    fn add_line_ref(&mut self) {
        self.ref_count += 1;
        if let Some(line) = self.lines.last_mut() {
            *line = format!("{line} ({})", self.ref_count);
        }
    }

    fn line_ref_of(&self, shared_id: Option<usize>) -> Option<usize> {
        shared_id.and_then(|id| self.shared_with_ref.get(&id).copied())
    }
}

impl Reporter for DefaultStringReporter {
    type Output = String;

    fn report(tree: &DerivationTree) -> String {
        match tree {
            DerivationTree::External(external) => external.to_string(),
            DerivationTree::Derived(derived) => {
                let mut reporter = Self::new();
                reporter.build_recursive(derived);
                reporter.lines.join("\n")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(name: &str) -> PackageReference {
        PackageReference::new(name)
    }

    #[test]
    fn external_dependency_omits_any_requirement() {
        let external = External::Dependency(pkg("a"), Requirement::any(), pkg("b"), Requirement::any());
        assert_eq!(external.to_string(), "a depends on b");
    }

    #[test]
    fn report_on_single_external_is_just_its_display() {
        let tree = DerivationTree::External(External::NoAvailableVersion(pkg("a"), Requirement::any()));
        assert_eq!(
            DefaultStringReporter::report(&tree),
            "there is no available version for a"
        );
    }

    #[test]
    fn report_on_two_externals_combines_them() {
        let terms: IndexMap<PackageReference, Term> = IndexMap::new();
        let derived = Derived {
            terms,
            shared_id: None,
            cause1: Box::new(DerivationTree::External(External::Root(
                pkg("root"),
                Version::one(),
            ))),
            cause2: Box::new(DerivationTree::External(External::NoAvailableVersion(
                pkg("a"),
                Requirement::any(),
            ))),
        };
        let report = DefaultStringReporter::report(&DerivationTree::Derived(derived));
        assert!(report.starts_with("Because "));
        assert!(report.ends_with("version solving failed."));
    }
}
