//! Container registry: `TypeId` → decompose/recompose.
//!
//! Built once with a [`RegistryBuilder`] and read-only afterwards, so a
//! `&Registry` can be shared freely across threads. Registration order is
//! preserved for diagnostics.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tessera_core::{ArrayError, Backend};

use crate::container::{ArrayContainer, ObjectArray};
use crate::grouped::GroupedArray;
use crate::node::{Composite, Node};

type DecomposeFn<B> = fn(&Composite<B>) -> Result<Vec<(usize, Node<B>)>, ArrayError>;
type RecomposeFn<B> =
    fn(Option<&Arc<B>>, Vec<(usize, Node<B>)>) -> Result<Composite<B>, ArrayError>;

struct Entry<B: Backend> {
    name: &'static str,
    decompose: DecomposeFn<B>,
    recompose: RecomposeFn<B>,
}

impl<B: Backend> Entry<B> {
    fn of<T: ArrayContainer<B>>() -> Self {
        Self {
            name: T::NAME,
            decompose: decompose_erased::<B, T>,
            recompose: recompose_erased::<B, T>,
        }
    }
}

fn decompose_erased<B: Backend, T: ArrayContainer<B>>(
    composite: &Composite<B>,
) -> Result<Vec<(usize, Node<B>)>, ArrayError> {
    composite
        .downcast_ref::<T>()
        .map(T::decompose)
        .ok_or_else(|| {
            ArrayError::type_error(format!("expected {}, found {}", T::NAME, composite.name()))
        })
}

fn recompose_erased<B: Backend, T: ArrayContainer<B>>(
    backend: Option<&Arc<B>>,
    entries: Vec<(usize, Node<B>)>,
) -> Result<Composite<B>, ArrayError> {
    T::recompose(backend, entries).map(Composite::new)
}

/// Accumulates container registrations.
pub struct RegistryBuilder<B: Backend> {
    entries: IndexMap<TypeId, Entry<B>>,
}

impl<B: Backend> RegistryBuilder<B> {
    /// An empty builder.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// A builder with [`GroupedArray`] and [`ObjectArray`] pre-registered.
    pub fn with_builtins() -> Self {
        let mut builder = Self::new();
        builder.insert::<GroupedArray<B>>();
        builder.insert::<ObjectArray<B>>();
        builder
    }

    fn insert<T: ArrayContainer<B>>(&mut self) {
        self.entries.insert(TypeId::of::<T>(), Entry::of::<T>());
    }

    /// Register container type `T`.
    ///
    /// Registering the same type twice is an error.
    pub fn register<T: ArrayContainer<B>>(mut self) -> Result<Self, ArrayError> {
        if self.entries.contains_key(&TypeId::of::<T>()) {
            return Err(ArrayError::DuplicateRegistration { name: T::NAME });
        }
        self.insert::<T>();
        Ok(self)
    }

    /// Freeze the registrations.
    pub fn build(self) -> Registry<B> {
        tracing::debug!(
            containers = ?self.entries.values().map(|e| e.name).collect::<Vec<_>>(),
            "container registry built"
        );
        Registry {
            entries: self.entries,
        }
    }
}

impl<B: Backend> Default for RegistryBuilder<B> {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only mapping from container type to its decompose/recompose pair.
pub struct Registry<B: Backend> {
    entries: IndexMap<TypeId, Entry<B>>,
}

impl<B: Backend> Registry<B> {
    /// Start building a registry with the built-in containers.
    pub fn builder() -> RegistryBuilder<B> {
        RegistryBuilder::with_builtins()
    }

    /// A registry holding only the built-in containers.
    pub fn with_builtins() -> Self {
        RegistryBuilder::with_builtins().build()
    }

    /// Number of registered container types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `T` is registered.
    pub fn contains<T: ArrayContainer<B>>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Registered container names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.values().map(|e| e.name)
    }

    fn entry(&self, type_id: TypeId, name: &'static str) -> Result<&Entry<B>, ArrayError> {
        self.entries
            .get(&type_id)
            .ok_or(ArrayError::UnregisteredContainer { name })
    }

    /// Decompose a registered container value.
    pub fn decompose<T: ArrayContainer<B>>(
        &self,
        value: &T,
    ) -> Result<Vec<(usize, Node<B>)>, ArrayError> {
        self.entry(TypeId::of::<T>(), T::NAME)?;
        Ok(value.decompose())
    }

    /// Recompose a registered container type from indexed children.
    pub fn recompose<T: ArrayContainer<B>>(
        &self,
        backend: Option<&Arc<B>>,
        entries: Vec<(usize, Node<B>)>,
    ) -> Result<T, ArrayError> {
        self.entry(TypeId::of::<T>(), T::NAME)?;
        T::recompose(backend, entries)
    }

    /// Decompose a type-erased composite.
    pub fn decompose_composite(
        &self,
        composite: &Composite<B>,
    ) -> Result<Vec<(usize, Node<B>)>, ArrayError> {
        let entry = self.entry(composite.type_id(), composite.name())?;
        (entry.decompose)(composite)
    }

    /// Recompose a composite of the same type as `like`.
    pub fn recompose_like(
        &self,
        like: &Composite<B>,
        backend: Option<&Arc<B>>,
        entries: Vec<(usize, Node<B>)>,
    ) -> Result<Composite<B>, ArrayError> {
        let entry = self.entry(like.type_id(), like.name())?;
        (entry.recompose)(backend, entries)
    }
}

impl<B: Backend> fmt::Debug for Registry<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_host::{HostBackend, HostBuffer};

    type Reg = Registry<HostBackend>;

    #[test]
    fn builtins_registered() {
        let reg = Reg::with_builtins();
        assert_eq!(reg.len(), 2);
        assert!(reg.contains::<GroupedArray<HostBackend>>());
        assert!(reg.contains::<ObjectArray<HostBackend>>());
        assert_eq!(reg.names().collect::<Vec<_>>(), ["GroupedArray", "ObjectArray"]);
    }

    #[test]
    fn duplicate_registration_rejected() {
        let err = Reg::builder()
            .register::<ObjectArray<HostBackend>>()
            .err()
            .unwrap();
        assert_eq!(
            err,
            ArrayError::DuplicateRegistration {
                name: "ObjectArray"
            }
        );
    }

    #[test]
    fn unregistered_composite_rejected() {
        let reg = RegistryBuilder::<HostBackend>::new().build();
        let obj = Composite::new(ObjectArray::<HostBackend>::new([]));
        let err = reg.decompose_composite(&obj).unwrap_err();
        assert_eq!(
            err,
            ArrayError::UnregisteredContainer {
                name: "ObjectArray"
            }
        );
    }

    #[test]
    fn grouped_array_round_trip() {
        let reg = Reg::with_builtins();
        let be = Arc::new(HostBackend::default());
        let bufs = [
            HostBuffer::from_f64(&[2], vec![1.0, 2.0]).unwrap(),
            HostBuffer::from_f64(&[1], vec![3.0]).unwrap(),
        ];
        let arr = GroupedArray::attached(be.clone(), bufs).unwrap();
        let mut parts = reg.decompose(&arr).unwrap();
        parts.reverse();
        let back: GroupedArray<HostBackend> = reg.recompose(Some(&be), parts).unwrap();
        assert_eq!(back.len(), 2);
        assert!(back[0].ptr_eq(&arr[0]));
        assert!(back[1].ptr_eq(&arr[1]));
    }

    #[test]
    fn erased_round_trip_keeps_type() {
        let reg = Reg::with_builtins();
        let leaf = HostBuffer::from_i64(&[1], vec![7]).unwrap();
        let obj = Composite::new(ObjectArray::new([Node::<HostBackend>::Leaf(leaf.clone())]));
        let parts = reg.decompose_composite(&obj).unwrap();
        let back = reg.recompose_like(&obj, None, parts).unwrap();
        assert!(back.is::<ObjectArray<HostBackend>>());
        let inner = back.downcast_ref::<ObjectArray<HostBackend>>().unwrap();
        assert!(inner.get(0).and_then(Node::as_leaf).unwrap().ptr_eq(&leaf));
    }
}
