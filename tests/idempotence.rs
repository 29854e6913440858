// SPDX-License-Identifier: MPL-2.0

//! Round-trip properties: solving the same provider and constraints twice
//! yields identical bindings, and term inversion is involutive.

use log::LevelFilter;
use std::io::Write;

use version_solver::{
    BoundVersion, Options, PackageReference, Requirement, Solver, Term, Version,
};
use version_solver::OfflineContainerProvider;

fn init_log() {
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Trace)
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .is_test(true)
        .try_init();
}

#[test]
fn solving_the_same_constraints_twice_yields_identical_bindings() {
    init_log();
    let mut provider = OfflineContainerProvider::new();
    provider.add_version(
        "left-pad",
        Version::new(1, 0, 0),
        [("string-utils".to_string(), Requirement::any())],
    );
    provider.add_version("string-utils", Version::new(1, 0, 0), []);
    provider.add_version("string-utils", Version::new(2, 0, 0), []);

    let solver = Solver::new(provider, Options::new()).unwrap();
    let request = vec![(PackageReference::new("left-pad"), Requirement::any())];

    let first: Vec<(PackageReference, BoundVersion)> =
        solver.solve(request.clone(), vec![]).unwrap();
    let second: Vec<(PackageReference, BoundVersion)> = solver.solve(request, vec![]).unwrap();

    assert_eq!(first, second);
}

#[test]
fn inverting_a_term_twice_returns_the_original() {
    init_log();
    let term = Term::positive(PackageReference::new("left-pad"), Requirement::any());
    assert_eq!(term.inverse().inverse(), term);

    let exact = Term::negative(
        PackageReference::new("left-pad"),
        Requirement::exact(Version::new(1, 2, 3)),
    );
    assert_eq!(exact.inverse().inverse(), exact);
}
