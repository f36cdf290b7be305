//! The closed traversal variant.

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tessera_core::{ArrayError, Backend};

use crate::container::ArrayContainer;
use crate::grouped::GroupedArray;

/// A value visited by [`Traversal`](crate::Traversal).
///
/// Grouped arrays and leaf buffers are base cases. Composites are opened
/// through the [`Registry`](crate::Registry).
pub enum Node<B: Backend> {
    /// A grouped array, never descended into.
    Array(GroupedArray<B>),
    /// A registered container.
    Composite(Composite<B>),
    /// A bare backend buffer.
    Leaf(B::Buffer),
}

impl<B: Backend> Node<B> {
    /// Wrap a registered container.
    ///
    /// A `GroupedArray` passed here becomes [`Node::Array`], so it stays a
    /// base case of every traversal.
    pub fn composite<T: ArrayContainer<B>>(value: T) -> Self {
        Node::from(Composite::new(value))
    }

    /// Name of the node's concrete type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Array(_) => "GroupedArray",
            Node::Composite(c) => c.name(),
            Node::Leaf(_) => "leaf buffer",
        }
    }

    /// The grouped array, if this is one.
    pub fn as_array(&self) -> Option<&GroupedArray<B>> {
        match self {
            Node::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Unwrap a grouped array.
    pub fn into_array(self) -> Result<GroupedArray<B>, ArrayError> {
        match self {
            Node::Array(a) => Ok(a),
            other => Err(ArrayError::type_error(format!(
                "expected GroupedArray, found {}",
                other.type_name()
            ))),
        }
    }

    /// The leaf buffer, if this is one.
    pub fn as_leaf(&self) -> Option<&B::Buffer> {
        match self {
            Node::Leaf(b) => Some(b),
            _ => None,
        }
    }

    /// Unwrap a leaf buffer.
    pub fn into_leaf(self) -> Result<B::Buffer, ArrayError> {
        match self {
            Node::Leaf(b) => Ok(b),
            other => Err(ArrayError::type_error(format!(
                "expected leaf buffer, found {}",
                other.type_name()
            ))),
        }
    }

    /// The composite, if this is one.
    pub fn as_composite(&self) -> Option<&Composite<B>> {
        match self {
            Node::Composite(c) => Some(c),
            _ => None,
        }
    }

    /// Downcast a composite node to its container type.
    pub fn downcast_ref<T: ArrayContainer<B>>(&self) -> Option<&T> {
        self.as_composite().and_then(Composite::downcast_ref)
    }

    /// Unwrap a composite that holds a grouped array into [`Node::Array`].
    pub(crate) fn into_base_case(self) -> Self {
        match self {
            Node::Composite(c) => match c.as_grouped_array() {
                Some(array) => Node::Array(array.clone()),
                None => Node::Composite(c),
            },
            other => other,
        }
    }

    /// Short tag used in structure-mismatch reports.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Node::Array(_) => "array",
            Node::Composite(_) => "composite",
            Node::Leaf(_) => "leaf",
        }
    }
}

impl<B: Backend> Clone for Node<B> {
    fn clone(&self) -> Self {
        match self {
            Node::Array(a) => Node::Array(a.clone()),
            Node::Composite(c) => Node::Composite(c.clone()),
            Node::Leaf(b) => Node::Leaf(b.clone()),
        }
    }
}

impl<B: Backend> fmt::Debug for Node<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Array(a) => f.debug_tuple("Array").field(a).finish(),
            Node::Composite(c) => f.debug_tuple("Composite").field(c).finish(),
            Node::Leaf(b) => f.debug_tuple("Leaf").field(b).finish(),
        }
    }
}

impl<B: Backend> From<GroupedArray<B>> for Node<B> {
    fn from(array: GroupedArray<B>) -> Self {
        Node::Array(array)
    }
}

impl<B: Backend> From<Composite<B>> for Node<B> {
    fn from(composite: Composite<B>) -> Self {
        Node::Composite(composite).into_base_case()
    }
}

/// A type-erased registered container.
///
/// Holds the value behind an `Arc`, so cloning a composite is cheap and
/// shares the container (whose buffers are themselves shared handles).
pub struct Composite<B: Backend> {
    type_id: TypeId,
    name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
    _backend: PhantomData<fn() -> B>,
}

impl<B: Backend> Composite<B> {
    /// Erase a container value.
    pub fn new<T: ArrayContainer<B>>(value: T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: T::NAME,
            value: Arc::new(value),
            _backend: PhantomData,
        }
    }

    /// `TypeId` of the wrapped container.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Registered name of the wrapped container.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the wrapped value is a `T`.
    pub fn is<T: ArrayContainer<B>>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Borrow the wrapped value as a `T`.
    pub fn downcast_ref<T: ArrayContainer<B>>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// The wrapped value, if it is a grouped array.
    pub(crate) fn as_grouped_array(&self) -> Option<&GroupedArray<B>> {
        self.downcast_ref::<GroupedArray<B>>()
    }

    /// Take shared ownership of the wrapped value as a `T`.
    pub fn downcast<T: ArrayContainer<B>>(self) -> Result<Arc<T>, ArrayError> {
        let name = self.name;
        self.value.downcast::<T>().map_err(|_| {
            ArrayError::type_error(format!("expected {}, found {name}", T::NAME))
        })
    }
}

impl<B: Backend> Clone for Composite<B> {
    fn clone(&self) -> Self {
        Self {
            type_id: self.type_id,
            name: self.name,
            value: Arc::clone(&self.value),
            _backend: PhantomData,
        }
    }
}

impl<B: Backend> fmt::Debug for Composite<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composite")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
