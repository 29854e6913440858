// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A single entry in the partial solution's append-only log (C4).

use crate::internal::incompatibility::IncompId;
use crate::term::Term;

/// Count of decisions made so far; determines how far back to jump on
/// conflict. The root decision is level 0.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub(crate) struct DecisionLevel(pub u32);

impl DecisionLevel {
    pub fn zero() -> Self {
        Self(0)
    }

    pub fn increment(self) -> Self {
        Self(self.0 + 1)
    }
}

/// A term stamped with the decision level it was added at. Derivations
/// additionally carry a back-pointer to the incompatibility that forced
/// them; decisions carry none.
#[derive(Debug, Clone)]
pub(crate) struct Assignment {
    term: Term,
    decision_level: DecisionLevel,
    cause: Option<IncompId>,
}

impl Assignment {
    /// A decision's term must already be decision-shaped (a concrete
    /// version, a revision, or unversioned) — callers enforce this before
    /// construction, per §3.
    pub(crate) fn decision(term: Term, decision_level: DecisionLevel) -> Self {
        debug_assert!(term.is_decision_shaped());
        Self {
            term,
            decision_level,
            cause: None,
        }
    }

    pub(crate) fn derivation(term: Term, decision_level: DecisionLevel, cause: IncompId) -> Self {
        Self {
            term,
            decision_level,
            cause: Some(cause),
        }
    }

    pub(crate) fn term(&self) -> &Term {
        &self.term
    }

    pub(crate) fn decision_level(&self) -> DecisionLevel {
        self.decision_level
    }

    pub(crate) fn is_decision(&self) -> bool {
        self.cause.is_none()
    }

    pub(crate) fn cause(&self) -> Option<IncompId> {
        self.cause
    }
}
