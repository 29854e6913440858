// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Cached, serialized access to external package containers, with optional
//! background prefetching (C6, §4.7, §5).

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex};

use crate::container::ContainerProvider;
use crate::package::PackageReference;
use crate::type_aliases::Map;

/// A container fetch failed. Wraps the provider's own error so the caller
/// can downcast or display it.
#[derive(Debug)]
pub struct GatewayError<E>(pub Arc<E>);

impl<E> Clone for GatewayError<E> {
    fn clone(&self) -> Self {
        GatewayError(Arc::clone(&self.0))
    }
}

impl<E: fmt::Display> fmt::Display for GatewayError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for GatewayError<E> {}

struct Inner<CP: ContainerProvider> {
    fetched: Map<PackageReference, Result<Arc<CP::Container>, GatewayError<CP::Err>>>,
    inflight: HashSet<PackageReference>,
}

/// Serializes access to a [`ContainerProvider`] so that at most one fetch
/// per package is ever in flight, and repeated calls for the same package
/// are served from a cache. All state is guarded by a single mutex paired
/// with a condition variable; background prefetches run on spawned threads
/// and publish their results back through the same lock (§5).
pub struct ContainerGateway<CP: ContainerProvider + 'static> {
    provider: Arc<CP>,
    state: Arc<(Mutex<Inner<CP>>, Condvar)>,
    skip_update: bool,
}

impl<CP: ContainerProvider + 'static> ContainerGateway<CP> {
    /// Build a gateway around `provider`. `skip_update` is forwarded to
    /// every fetch (§6 construction options).
    pub fn new(provider: CP, skip_update: bool) -> Self {
        Self {
            provider: Arc::new(provider),
            state: Arc::new((
                Mutex::new(Inner {
                    fetched: Map::default(),
                    inflight: HashSet::new(),
                }),
                Condvar::new(),
            )),
            skip_update,
        }
    }

    /// Fetch the container for `package`, blocking until it is available.
    /// Serialized: if another caller (or a prefetch) is already fetching
    /// the same package, this waits for that fetch rather than starting a
    /// second one.
    pub fn get(&self, package: &PackageReference) -> Result<Arc<CP::Container>, GatewayError<CP::Err>> {
        let (mutex, condvar) = &*self.state;
        let mut guard = mutex.lock().unwrap_or_else(|p| p.into_inner());
        loop {
            if let Some(result) = guard.fetched.get(package) {
                return result.clone();
            }
            if guard.inflight.contains(package) {
                guard = condvar.wait(guard).unwrap_or_else(|p| p.into_inner());
                continue;
            }
            guard.inflight.insert(package.clone());
            drop(guard);
            let result = self
                .provider
                .get_container(package, self.skip_update)
                .map(Arc::new)
                .map_err(|e| GatewayError(Arc::new(e)));
            guard = mutex.lock().unwrap_or_else(|p| p.into_inner());
            guard.inflight.remove(package);
            guard.fetched.insert(package.clone(), result.clone());
            condvar.notify_all();
            return result;
        }
    }

    /// Fire-and-forget: start background fetches for every package in
    /// `packages` that is neither cached nor already in flight. Completions
    /// populate the cache and wake anyone waiting in [`get`](Self::get).
    pub fn prefetch(&self, packages: impl IntoIterator<Item = PackageReference>) {
        let (mutex, _condvar) = &*self.state;
        let mut guard = mutex.lock().unwrap_or_else(|p| p.into_inner());
        let to_spawn: Vec<PackageReference> = packages
            .into_iter()
            .filter(|p| !guard.fetched.contains_key(p) && guard.inflight.insert(p.clone()))
            .collect();
        drop(guard);
        for package in to_spawn {
            let provider = Arc::clone(&self.provider);
            let state = Arc::clone(&self.state);
            let skip_update = self.skip_update;
            std::thread::spawn(move || {
                let result = provider
                    .get_container(&package, skip_update)
                    .map(Arc::new)
                    .map_err(|e| GatewayError(Arc::new(e)));
                let (mutex, condvar) = &*state;
                let mut guard = mutex.lock().unwrap_or_else(|p| p.into_inner());
                guard.inflight.remove(&package);
                guard.fetched.insert(package, result);
                condvar.notify_all();
            });
        }
    }
}
