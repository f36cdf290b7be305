//! Persist and restore grouped arrays through the active context.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tessera_array::GroupedArray;
use tessera_core::{ArrayError, Backend, HostArray};

use crate::context::active_backend;

/// Backend-independent form of a grouped array: one host value per group,
/// in group order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistedGroups {
    groups: Vec<HostArray>,
}

impl PersistedGroups {
    /// Wrap per-group host values.
    pub fn new(groups: Vec<HostArray>) -> Self {
        Self { groups }
    }

    /// Per-group host values.
    pub fn groups(&self) -> &[HostArray] {
        &self.groups
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether there are no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Unwrap into the per-group values.
    pub fn into_groups(self) -> Vec<HostArray> {
        self.groups
    }
}

/// Extract every group of `array` to host form through the active backend.
///
/// An array attached to a different backend instance, or to none, is first
/// moved onto the active backend (freeze, then thaw) so that the host
/// transfer always runs on the active backend.
pub fn persist<B: Backend>(array: &GroupedArray<B>) -> Result<PersistedGroups, ArrayError> {
    let active = active_backend::<B>("persist")?;
    let foreign = !array.backend().is_some_and(|own| Arc::ptr_eq(own, &active));
    if foreign {
        tracing::debug!(
            from = ?array.backend().map(|b| b.name()),
            to = active.name(),
            groups = array.len(),
            "canonicalizing before persist"
        );
    }

    let groups = array
        .iter()
        .map(|buffer| {
            if !foreign {
                return active.to_host(buffer);
            }
            let frozen = match array.backend() {
                Some(own) => own.freeze(buffer)?,
                None => active.freeze(buffer)?,
            };
            let attached = active.thaw(&frozen)?;
            active.to_host(&attached)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PersistedGroups { groups })
}

/// Rebuild a grouped array on the active backend, preserving group order.
pub fn restore<B: Backend>(persisted: &PersistedGroups) -> Result<GroupedArray<B>, ArrayError> {
    let active = active_backend::<B>("restore")?;
    let buffers = persisted
        .groups
        .iter()
        .map(|host| active.from_host(host))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(backend = active.name(), groups = buffers.len(), "restored grouped array");
    GroupedArray::attached(active, buffers)
}
