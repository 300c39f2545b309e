//! Scene - a field store bound to its scene parameters.
//!
//! Every query takes a `&Scene<S>`: the store is read through
//! [`FieldStore`] and the parameters fix the truncation margin, voxel size
//! and view-frustum clamp. Multiple scenes can exist side by side.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::StoreError;
use crate::field::FieldStore;
use crate::types::SceneParams;

// =============================================================================
// SceneId - unique identifier
// =============================================================================

static SCENE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Opaque scene identifier, unique within the process lifetime.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SceneId(u64);

impl SceneId {
    pub fn new() -> Self {
        Self(SCENE_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SceneId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Scene<S>
// =============================================================================

/// Read-only query target, generic over the store.
///
/// Mutating the store through [`Scene::store_mut`] requires `&mut self`, so a
/// scene can never be written while a query pass borrows it.
pub struct Scene<S: FieldStore> {
    pub id: SceneId,
    params: SceneParams,
    store: S,
}

impl<S: FieldStore> Scene<S> {
    /// Bind `store` to validated `params`.
    pub fn new(store: S, params: SceneParams) -> Result<Self, StoreError> {
        params.validate()?;
        Ok(Self {
            id: SceneId::new(),
            params,
            store,
        })
    }

    #[inline]
    pub fn params(&self) -> &SceneParams {
        &self.params
    }

    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
