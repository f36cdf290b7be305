//! The container protocol and the built-in containers.
//!
//! Any type that implements [`ArrayContainer`] and is registered in a
//! [`Registry`](crate::Registry) can be traversed: the traversal engine
//! decomposes it into indexed children, rebuilds each child, and calls
//! [`ArrayContainer::recompose`] with the rebuilt children.

use std::any::Any;
use std::sync::Arc;

use tessera_core::{ArrayError, Backend};

use crate::grouped::GroupedArray;
use crate::node::Node;

/// A container that can be taken apart into indexed children and rebuilt.
///
/// `decompose` yields `(index, child)` pairs with indices `0..n`.
/// `recompose` must accept those pairs in any order.
pub trait ArrayContainer<B: Backend>: Any + Send + Sync + Sized {
    /// Name used in diagnostics and duplicate-registration errors.
    const NAME: &'static str;

    /// The container's children, each tagged with its position.
    fn decompose(&self) -> Vec<(usize, Node<B>)>;

    /// Rebuild a container from `(index, child)` pairs.
    ///
    /// `backend` is the backend of the rebuilt children, when one is known.
    fn recompose(backend: Option<&Arc<B>>, entries: Vec<(usize, Node<B>)>)
        -> Result<Self, ArrayError>;
}

/// Place `(index, value)` pairs into a dense vector.
///
/// With `k` pairs, every index in `0..k` must appear exactly once; the
/// first unfilled slot is reported as [`ArrayError::MissingIndex`].
pub fn assemble_indexed<T>(entries: Vec<(usize, T)>) -> Result<Vec<T>, ArrayError> {
    let len = entries.len();
    let mut slots: Vec<Option<T>> = (0..len).map(|_| None).collect();
    for (index, value) in entries {
        // Out-of-range or repeated indices leave some slot in 0..len empty.
        if let Some(slot) = slots.get_mut(index) {
            *slot = Some(value);
        }
    }
    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| slot.ok_or(ArrayError::MissingIndex { index, len }))
        .collect()
}

/// A heterogeneous sequence of nodes.
pub struct ObjectArray<B: Backend> {
    entries: Vec<Node<B>>,
}

impl<B: Backend> ObjectArray<B> {
    /// Wrap a sequence of nodes.
    pub fn new(entries: impl IntoIterator<Item = Node<B>>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry `i`.
    pub fn get(&self, i: usize) -> Option<&Node<B>> {
        self.entries.get(i)
    }

    /// Iterate over entries in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Node<B>> {
        self.entries.iter()
    }

    /// Unwrap into the entry vector.
    pub fn into_vec(self) -> Vec<Node<B>> {
        self.entries
    }
}

impl<B: Backend> Clone for ObjectArray<B> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<B: Backend> std::fmt::Debug for ObjectArray<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(&self.entries).finish()
    }
}

impl<B: Backend> ArrayContainer<B> for ObjectArray<B> {
    const NAME: &'static str = "ObjectArray";

    fn decompose(&self) -> Vec<(usize, Node<B>)> {
        self.entries.iter().cloned().enumerate().collect()
    }

    fn recompose(
        _backend: Option<&Arc<B>>,
        entries: Vec<(usize, Node<B>)>,
    ) -> Result<Self, ArrayError> {
        assemble_indexed(entries).map(|entries| Self { entries })
    }
}

/// A grouped array decomposes into its group buffers as leaves.
impl<B: Backend> ArrayContainer<B> for GroupedArray<B> {
    const NAME: &'static str = "GroupedArray";

    fn decompose(&self) -> Vec<(usize, Node<B>)> {
        self.iter()
            .cloned()
            .map(Node::Leaf)
            .enumerate()
            .collect()
    }

    fn recompose(
        backend: Option<&Arc<B>>,
        entries: Vec<(usize, Node<B>)>,
    ) -> Result<Self, ArrayError> {
        let buffers = assemble_indexed(entries)?
            .into_iter()
            .map(Node::into_leaf)
            .collect::<Result<Vec<_>, _>>()?;
        GroupedArray::new(backend.cloned(), buffers)
    }
}
