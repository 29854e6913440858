// SPDX-License-Identifier: MPL-2.0

//! End to end solves against [`OfflineContainerProvider`], covering the
//! trivial chain, conflict-driven backtracking, an unsatisfiable transitive
//! constraint, exact pins, revision dominance, and unversioned bindings.

use log::LevelFilter;
use std::io::Write;

use version_solver::{
    BoundVersion, Options, PackageReference, Requirement, Revision, SolveError, Solver, Version,
};
use version_solver::{OfflineContainerProvider, VersionSetSpec};

fn init_log() {
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Trace)
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .is_test(true)
        .try_init();
}

fn caret(major: u32) -> Requirement {
    Requirement::VersionSet(VersionSetSpec::range(
        Version::new(major, 0, 0),
        Version::new(major + 1, 0, 0),
    ))
}

fn bound_of<'a>(solution: &'a [(PackageReference, BoundVersion)], name: &str) -> &'a BoundVersion {
    solution
        .iter()
        .find(|(p, _)| p.identity() == name)
        .map(|(_, b)| b)
        .unwrap_or_else(|| panic!("{name} missing from solution"))
}

#[test]
fn trivial_chain_resolves_to_the_only_matching_versions() {
    init_log();
    let mut provider = OfflineContainerProvider::new();
    provider.add_version("a", Version::new(1, 0, 0), [("b".to_string(), caret(1))]);
    provider.add_version("b", Version::new(1, 0, 0), [("c".to_string(), caret(1))]);
    provider.add_version("c", Version::new(1, 0, 0), []);
    provider.add_version("c", Version::new(2, 0, 0), []);

    let solver = Solver::new(provider, Options::new()).unwrap();
    let solution = solver
        .solve(vec![(PackageReference::new("a"), caret(1))], vec![])
        .unwrap();

    assert_eq!(bound_of(&solution, "a"), &BoundVersion::Version(Version::new(1, 0, 0)));
    assert_eq!(bound_of(&solution, "b"), &BoundVersion::Version(Version::new(1, 0, 0)));
    assert_eq!(bound_of(&solution, "c"), &BoundVersion::Version(Version::new(1, 0, 0)));
}

#[test]
fn a_conflicting_highest_version_triggers_backtracking_to_the_next_best() {
    init_log();
    let mut provider = OfflineContainerProvider::new();
    provider.add_version("a", Version::new(2, 0, 0), [("b".to_string(), caret(2))]);
    provider.add_version("a", Version::new(1, 0, 0), [("b".to_string(), caret(1))]);
    provider.add_version("b", Version::new(1, 0, 0), []);

    let solver = Solver::new(provider, Options::new()).unwrap();
    let solution = solver
        .solve(vec![(PackageReference::new("a"), Requirement::any())], vec![])
        .unwrap();

    assert_eq!(bound_of(&solution, "a"), &BoundVersion::Version(Version::new(1, 0, 0)));
    assert_eq!(bound_of(&solution, "b"), &BoundVersion::Version(Version::new(1, 0, 0)));
}

#[test]
fn an_unsatisfiable_transitive_constraint_is_reported_with_every_implicated_package() {
    init_log();
    let mut provider = OfflineContainerProvider::new();
    provider.add_version("a", Version::new(1, 0, 0), [("b".to_string(), caret(1))]);
    provider.add_version("b", Version::new(1, 0, 0), [("c".to_string(), caret(1))]);
    provider.add_version("c", Version::new(1, 0, 0), []);
    provider.add_version("c", Version::new(2, 0, 0), []);

    let solver = Solver::new(provider, Options::new()).unwrap();
    let err = solver
        .solve(
            vec![
                (PackageReference::new("a"), caret(1)),
                (PackageReference::new("c"), caret(2)),
            ],
            vec![],
        )
        .unwrap_err();

    let SolveError::Unresolvable(tree) = err else {
        panic!("expected an unresolvable diagnostic, got {err:?}");
    };
    let names: Vec<&str> = tree.packages().iter().map(|p| p.identity()).collect();
    assert!(names.contains(&"a"), "{names:?}");
    assert!(names.contains(&"b"), "{names:?}");
    assert!(names.contains(&"c"), "{names:?}");
}

#[test]
fn an_exact_pin_narrows_a_wider_range_constraint() {
    init_log();
    let mut provider = OfflineContainerProvider::new();
    provider.add_version("a", Version::new(1, 0, 0), []);
    provider.add_version("a", Version::new(1, 1, 0), []);

    let solver = Solver::new(provider, Options::new()).unwrap();
    let solution = solver
        .solve(
            vec![
                (PackageReference::new("a"), caret(1)),
                (PackageReference::new("a"), Requirement::exact(Version::new(1, 0, 0))),
            ],
            vec![],
        )
        .unwrap();

    assert_eq!(bound_of(&solution, "a"), &BoundVersion::Version(Version::new(1, 0, 0)));
}

#[test]
fn a_revision_constraint_wins_over_an_overlapping_version_range() {
    init_log();
    let mut provider = OfflineContainerProvider::new();
    provider.add_revision("c", Revision::new("develop"), []);
    provider.add_version("c", Version::new(1, 0, 0), []);

    let solver = Solver::new(provider, Options::new()).unwrap();
    let solution = solver
        .solve(
            vec![
                (PackageReference::new("c"), caret(1)),
                (PackageReference::new("c"), Requirement::Revision(Revision::new("develop"))),
            ],
            vec![],
        )
        .unwrap();

    assert_eq!(
        bound_of(&solution, "c"),
        &BoundVersion::Revision(Revision::new("develop"))
    );
}

#[test]
fn an_unversioned_binding_dominates_its_own_transitive_version_requirement() {
    init_log();
    let mut provider = OfflineContainerProvider::new();
    provider.add_unversioned("b", [("a".to_string(), caret(1))]);
    provider.add_version("a", Version::new(1, 0, 0), []);

    let solver = Solver::new(provider, Options::new()).unwrap();
    let solution = solver
        .solve(
            vec![
                (PackageReference::new("b"), Requirement::Unversioned),
                (PackageReference::new("a"), Requirement::exact(Version::new(1, 0, 0))),
            ],
            vec![],
        )
        .unwrap();

    assert_eq!(bound_of(&solution, "a"), &BoundVersion::Version(Version::new(1, 0, 0)));
    assert_eq!(bound_of(&solution, "b"), &BoundVersion::Unversioned);
}
