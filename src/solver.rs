// SPDX-License-Identifier: MPL-2.0

//! The solve entry point (C5, §4.5, §6).
//!
//! `solve` seeds a synthetic root incompatibility, decides the root, then
//! alternates unit propagation and decision making until either every
//! package reachable from the root has a concrete binding, or propagation
//! produces a failure that [`crate::report`] can turn into a diagnostic.

use std::fmt;
use std::sync::Arc;

use log::{debug, info, trace};

use crate::container::{Constraint, Container, ContainerProvider};
use crate::error::SolveError;
use crate::gateway::ContainerGateway;
use crate::internal::State;
use crate::options::Options;
use crate::package::PackageReference;
use crate::report::{DefaultStringReporter, External, Reporter};
use crate::requirement::{Requirement, VersionSetSpec};
use crate::term::Term;
use crate::trace::{FileTraceSink, NullTraceSink, TraceEvent, TraceKind, TraceLocation, TraceSink};
use crate::type_aliases::Map;
use crate::version::{Revision, Version};

/// A concrete binding for a decided package: an exact version, a named
/// revision, or a local working-copy binding with no version at all (§3).
///
/// `Excluded` exists only to round out the variant the source system
/// reserves for an impossible state; the solver never constructs it, and
/// encountering it anywhere is an internal invariant violation, not a
/// recoverable error.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum BoundVersion {
    /// Bound to a specific version.
    Version(Version),
    /// Bound to a specific named commit or branch.
    Revision(Revision),
    /// Bound to a local working copy, independent of any version.
    Unversioned,
    /// Never produced by the solver; encountering this is a fatal bug.
    Excluded,
}

impl BoundVersion {
    pub(crate) fn to_term(&self, package: PackageReference) -> Term {
        match self {
            Self::Version(v) => Term::positive(package, Requirement::exact(v.clone())),
            Self::Revision(r) => Term::positive(package, Requirement::Revision(r.clone())),
            Self::Unversioned => Term::positive(package, Requirement::Unversioned),
            Self::Excluded => unreachable!(
                "BoundVersion::Excluded reached a decision; this is an internal invariant \
                 violation"
            ),
        }
    }
}

impl fmt::Display for BoundVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Version(v) => write!(f, "{v}"),
            Self::Revision(r) => write!(f, "@{r}"),
            Self::Unversioned => write!(f, "*unversioned*"),
            Self::Excluded => write!(f, "<excluded>"),
        }
    }
}

/// The complete set of bindings produced by a successful solve, in the
/// order packages were decided, not including the synthetic root.
pub type Solution = Vec<(PackageReference, BoundVersion)>;

/// Drives one version solve against a [`ContainerProvider`], with caching,
/// optional prefetching, and an optional trace sink (§5, §6).
pub struct Solver<CP: ContainerProvider + 'static> {
    gateway: ContainerGateway<CP>,
    options: Options,
    trace: Arc<dyn TraceSink>,
}

impl<CP: ContainerProvider + 'static> Solver<CP> {
    /// Build a solver around `provider`, honoring `options`' prefetching,
    /// incomplete-mode, and trace-file settings.
    pub fn new(provider: CP, options: Options) -> Result<Self, std::io::Error> {
        let trace: Arc<dyn TraceSink> = match options.trace_file() {
            Some(path) => Arc::new(FileTraceSink::open(path)),
            None => Arc::new(NullTraceSink),
        };
        Ok(Self {
            gateway: ContainerGateway::new(provider, options.skip_update()),
            options,
            trace,
        })
    }

    /// Use a trace sink supplied by the caller instead of one derived from
    /// `options.with_trace_file`. Useful when the sink needs to write
    /// somewhere other than a plain file (§6 "trace sink", a value
    /// appender rather than a free-floating stream).
    pub fn with_trace_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.trace = sink;
        self
    }

    fn trace_general(
        &self,
        kind: TraceKind,
        location: TraceLocation,
        value: impl fmt::Display,
        cause: Option<String>,
        decision_level: u32,
    ) {
        self.trace.trace(TraceEvent::General {
            value: value.to_string(),
            kind,
            location,
            cause,
            decision_level,
        });
    }

    /// Find a unique assignment of a version, revision, or unversioned
    /// binding to every package transitively required by `dependencies` and
    /// `pins` (§6 Solve API). The solver synthesizes its own root package
    /// under a reserved identity (§4.5 Entry) — callers never name it. Pins
    /// are consulted before user constraints at the top level; ordering
    /// among pins and among dependencies encodes preference.
    pub fn solve(
        &self,
        dependencies: Vec<Constraint>,
        pins: Vec<Constraint>,
    ) -> Result<Solution, SolveError> {
        let root = PackageReference::root();
        let root_version = Version::one();
        let direct_exact: Map<PackageReference, Requirement> = pins
            .iter()
            .chain(dependencies.iter())
            .filter(|(_, req)| is_exact(req))
            .map(|(p, r)| (p.clone(), r.clone()))
            .collect();

        if self.options.prefetching_enabled() {
            self.gateway.prefetch(
                pins.iter()
                    .chain(dependencies.iter())
                    .map(|(p, _)| p.clone()),
            );
        }

        let mut state = State::init(root.clone(), root_version.clone());
        self.trace_general(
            TraceKind::Incompatibility,
            TraceLocation::TopLevel,
            format!("¬{root}@{root_version}"),
            None,
            0,
        );

        let root_term = Term::positive(root.clone(), Requirement::exact(root_version.clone()));
        state.add_incompatibility_from_dependencies(
            root.clone(),
            root_term.clone(),
            pins.into_iter().chain(dependencies),
        );

        let root_bound = BoundVersion::Version(root_version.clone());
        state.decide_if_safe(root.clone(), root_bound.clone(), &[]);
        self.trace_general(
            TraceKind::Decision,
            TraceLocation::TopLevel,
            format!("{root} {root_bound}"),
            None,
            0,
        );
        info!("root decided: {root} @ {root_version}");

        let mut next = root.clone();
        loop {
            info!("unit_propagation: {next}");
            if let Err(root_cause) = state.unit_propagation(next) {
                let tree = state.build_derivation_tree(root_cause);
                debug!("{}", DefaultStringReporter::report(&tree));
                return Err(classify_failure(tree));
            }
            trace!(
                "partial solution after propagation: {} decisions",
                state.partial_solution().decisions().count()
            );

            match self.make_decision(&mut state, &direct_exact)? {
                Some(package) => next = package,
                None => break,
            }
        }

        self.emit_solution(&state, &root)
    }

    /// §4.5 decision making: pick the first undecided package, ask the
    /// container for the best bound matching its requirement, and add the
    /// incompatibilities that bound's dependencies impose.
    fn make_decision(
        &self,
        state: &mut State,
        direct_exact: &Map<PackageReference, Requirement>,
    ) -> Result<Option<PackageReference>, SolveError> {
        let Some(package) = state.partial_solution().first_undecided() else {
            return Ok(None);
        };
        let term = state
            .partial_solution()
            .term_for(&package)
            .cloned()
            .expect("an undecided package always has a positive cached term");

        let container = self
            .gateway
            .get(&package)
            .map_err(|e| SolveError::Provider(Box::new(e)))?;

        let bound = choose_bound(term.requirement(), container.as_ref());

        let Some(bound) = bound else {
            if self.options.skip_update() {
                if let Some(requirement) = direct_exact.get(&package) {
                    return Err(SolveError::MissingVersions {
                        package,
                        requirement: requirement.clone(),
                    });
                }
            }
            let incompat = crate::internal::incompatibility::Incompatibility::no_available_version(
                term.clone(),
            );
            self.trace_general(
                TraceKind::Incompatibility,
                TraceLocation::DecisionMaking,
                format!("{incompat}"),
                None,
                state.partial_solution().current_decision_level().0,
            );
            state.add_incompatibility(incompat);
            return Ok(Some(package));
        };

        info!("decided: {package} @ {bound}");
        let self_term = self_term_for(&package, &bound);
        let deps = fetch_dependencies(container.as_ref(), &bound);
        let new_incompats =
            state.add_incompatibility_from_dependencies(package.clone(), self_term, deps);

        let committed = state.decide_if_safe(package.clone(), bound.clone(), &new_incompats);
        self.trace_general(
            TraceKind::Decision,
            TraceLocation::DecisionMaking,
            format!("{package} {bound} (committed: {committed})"),
            None,
            state.partial_solution().current_decision_level().0,
        );
        Ok(Some(package))
    }

    /// §4.5 "Emitting the final assignment": collect every decision except
    /// the synthetic root, asking the container gateway for each package's
    /// possibly-canonicalized identifier.
    fn emit_solution(&self, state: &State, root: &PackageReference) -> Result<Solution, SolveError> {
        let mut solution = Vec::new();
        for (package, bound) in state.partial_solution().decisions() {
            if package == root {
                continue;
            }
            let container = self
                .gateway
                .get(package)
                .map_err(|e| SolveError::Provider(Box::new(e)))?;
            let updated = container.updated_identifier(bound);
            solution.push((updated, bound.clone()));
        }
        Ok(solution)
    }
}

fn is_exact(requirement: &Requirement) -> bool {
    matches!(
        requirement,
        Requirement::VersionSet(VersionSetSpec::Range {
            lower: Some(l),
            upper: Some(u),
        }) if *u == l.bump()
    )
}

/// Pick the best available bound for `requirement` from `container`.
/// Version sets search `container.versions()` (already in descending
/// order) for the first match; revisions and unversioned bindings have no
/// enumeration to search, they're singleton sets by construction.
fn choose_bound(requirement: &Requirement, container: &dyn Container) -> Option<BoundVersion> {
    match requirement {
        Requirement::Revision(r) => Some(BoundVersion::Revision(r.clone())),
        Requirement::Unversioned => Some(BoundVersion::Unversioned),
        Requirement::VersionSet(spec) => container
            .versions()
            .into_iter()
            .find(|v| spec.contains(v))
            .map(BoundVersion::Version),
    }
}

/// §4.6: the self-term a decided package imposes on its own dependency
/// incompatibilities.
fn self_term_for(package: &PackageReference, bound: &BoundVersion) -> Term {
    match bound {
        BoundVersion::Version(v) => Term::positive(
            package.clone(),
            Requirement::VersionSet(VersionSetSpec::range(v.clone(), v.next_major())),
        ),
        BoundVersion::Revision(r) => Term::positive(package.clone(), Requirement::Revision(r.clone())),
        BoundVersion::Unversioned => Term::positive(package.clone(), Requirement::Unversioned),
        BoundVersion::Excluded => unreachable!(
            "BoundVersion::Excluded reached self_term_for; this is an internal invariant violation"
        ),
    }
}

fn fetch_dependencies(container: &dyn Container, bound: &BoundVersion) -> Vec<Constraint> {
    match bound {
        BoundVersion::Version(v) => container.dependencies_at_version(v),
        BoundVersion::Revision(r) => container.dependencies_at_revision(r),
        BoundVersion::Unversioned => container.unversioned_dependencies(),
        BoundVersion::Excluded => unreachable!(
            "BoundVersion::Excluded reached fetch_dependencies; this is an internal invariant \
             violation"
        ),
    }
}

/// Best-effort classification of an unresolvable derivation tree: when its
/// leaves show the same package pinned to more than one distinct revision
/// by different dependency edges, surface [`SolveError::IncompatibleConstraints`]
/// instead of the generic [`SolveError::Unresolvable`] (§7). This only
/// inspects the external leaves directly present in the tree; it is a
/// diagnostic refinement, not a soundness-affecting check — any case it
/// misses still surfaces as `Unresolvable` with the full derivation tree
/// attached.
fn classify_failure(tree: crate::report::DerivationTree) -> SolveError {
    let mut revisions_by_package: Map<PackageReference, Vec<Revision>> = Map::default();
    collect_revision_pins(&tree, &mut revisions_by_package);
    for (package, mut revisions) in revisions_by_package {
        revisions.sort();
        revisions.dedup();
        if revisions.len() > 1 {
            return SolveError::IncompatibleConstraints {
                dependency: package,
                revisions,
            };
        }
    }
    SolveError::Unresolvable(tree)
}

fn collect_revision_pins(
    tree: &crate::report::DerivationTree,
    out: &mut Map<PackageReference, Vec<Revision>>,
) {
    match tree {
        crate::report::DerivationTree::External(External::Dependency(_, _, dep, dep_req)) => {
            if let Requirement::Revision(r) = dep_req {
                out.entry(dep.clone()).or_default().push(r.clone());
            }
        }
        crate::report::DerivationTree::External(_) => {}
        crate::report::DerivationTree::Derived(derived) => {
            collect_revision_pins(&derived.cause1, out);
            collect_revision_pins(&derived.cause2, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirement::VersionSetSpec;

    #[test]
    fn self_term_for_version_uses_next_major_upper_bound() {
        let package = PackageReference::new("left-pad");
        let bound = BoundVersion::Version(Version::new(1, 2, 3));
        let term = self_term_for(&package, &bound);
        assert_eq!(
            term.requirement(),
            &Requirement::VersionSet(VersionSetSpec::range(
                Version::new(1, 2, 3),
                Version::new(2, 0, 0)
            ))
        );
    }

    #[test]
    fn is_exact_recognizes_single_version_range() {
        assert!(is_exact(&Requirement::exact(Version::one())));
        assert!(!is_exact(&Requirement::any()));
    }
}
