// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! Cache contents versus history
//!
//! The catalog is what the cache holds; the referenced set is what history
//! points at. Status, push, pull and gc are all set differences of the two.
//! Both sets are recomputed on every call.

use crate::backend::{Backend, RevScope};
use crate::digest::Digest;
use crate::error::FatResult;
use crate::pointer::PlaceholderCodec;
use crate::store::ObjectStore;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Reachability queries over one cache and one repository.
pub struct ObjectCatalog<'a, B: Backend + ?Sized> {
    backend: &'a B,
    store: &'a ObjectStore,
    codec: PlaceholderCodec,
}

impl<'a, B: Backend + ?Sized> ObjectCatalog<'a, B> {
    /// Creates a catalog view
    pub fn new(backend: &'a B, store: &'a ObjectStore, codec: PlaceholderCodec) -> Self {
        Self { backend, store, codec }
    }

    /// Digests with an entry in the cache
    pub fn catalog(&self) -> FatResult<HashSet<Digest>> {
        self.store.catalog()
    }

    /// Digests named by placeholder blobs reachable from `scope`.
    ///
    /// Only blobs whose size is a known placeholder length are read. A
    /// candidate that fails to decode is not a placeholder and is skipped. A
    /// revision that does not resolve references nothing.
    pub fn referenced(&self, scope: &RevScope) -> FatResult<HashSet<Digest>> {
        let mut referenced = HashSet::new();

        if let Some(rev) = scope.revision() {
            if self.backend.resolve_revision(rev)?.is_none() {
                debug!("{} does not resolve; nothing is referenced", rev);
                return Ok(referenced);
            }
        }

        let sizes: Vec<u64> = self.codec.known_lens().iter().map(|len| *len as u64).collect();
        self.backend.read_reachable_blobs(scope, &sizes, &mut |info, content| {
            match self.codec.try_decode(content) {
                Some(placeholder) => {
                    referenced.insert(placeholder.digest);
                }
                None => debug!("Blob {} has a placeholder size but is not one", info.id),
            }
            Ok(())
        })?;

        debug!("{} digests referenced from {}", referenced.len(), scope);
        Ok(referenced)
    }

    /// Catalog and referenced set for `scope`, side by side
    pub fn reconcile(&self, scope: &RevScope) -> FatResult<Reconciliation> {
        Ok(Reconciliation::new(self.catalog()?, self.referenced(scope)?))
    }
}

/// The two sets and their differences.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    catalog: HashSet<Digest>,
    referenced: HashSet<Digest>,
}

impl Reconciliation {
    /// Pairs a catalog with a referenced set
    pub fn new(catalog: HashSet<Digest>, referenced: HashSet<Digest>) -> Self {
        Self { catalog, referenced }
    }

    /// Cached but unreferenced: safe to delete
    pub fn garbage(&self) -> Vec<Digest> {
        sorted(self.catalog.difference(&self.referenced))
    }

    /// Referenced but not cached: what a pull fetches
    pub fn orphans(&self) -> Vec<Digest> {
        sorted(self.referenced.difference(&self.catalog))
    }

    /// Referenced and cached: what a push sends
    pub fn to_push(&self) -> Vec<Digest> {
        sorted(self.catalog.intersection(&self.referenced))
    }

    /// Every referenced digest
    pub fn referenced(&self) -> Vec<Digest> {
        sorted(self.referenced.iter())
    }

    /// Every cached digest
    pub fn catalog(&self) -> Vec<Digest> {
        sorted(self.catalog.iter())
    }

    /// Sorted sets for rendering
    pub fn summary(&self) -> StatusSummary {
        StatusSummary {
            orphans: self.orphans(),
            garbage: self.garbage(),
            referenced: self.referenced(),
        }
    }
}

/// Serializable view of a [`Reconciliation`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    /// Referenced but not cached
    pub orphans: Vec<Digest>,
    /// Cached but unreferenced
    pub garbage: Vec<Digest>,
    /// Everything referenced
    pub referenced: Vec<Digest>,
}

fn sorted<'a>(digests: impl Iterator<Item = &'a Digest>) -> Vec<Digest> {
    let mut digests: Vec<Digest> = digests.cloned().collect();
    digests.sort();
    digests
}
