// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Internal map/set aliases built on `rustc_hash`, matching the hasher the
//! teacher crate uses for its own bookkeeping maps.

use std::collections::{HashMap, HashSet};
use std::hash::BuildHasherDefault;

use rustc_hash::FxHasher;

/// Map implementation used throughout the solver's internal bookkeeping.
pub(crate) type Map<K, V> = HashMap<K, V, BuildHasherDefault<FxHasher>>;

/// Set implementation used throughout the solver's internal bookkeeping.
pub(crate) type Set<V> = HashSet<V, BuildHasherDefault<FxHasher>>;
