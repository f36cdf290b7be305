//! Generic traversal over grouped arrays and registered containers.
//!
//! Every entry point rebuilds the input: composites are decomposed through
//! the [`Registry`], their children rebuilt recursively, and the results
//! recomposed into the same container type. Base cases are grouped arrays
//! (mapped group by group, or handed whole to the caller) and leaf
//! buffers.
//!
//! [`Traversal::multimap`] zips several inputs. It checks the full
//! structure of all inputs before calling the user function even once, so
//! a mismatch deep inside the tree never leaves partial work behind.

use std::any::TypeId;
use std::sync::Arc;

use tessera_core::{ArrayError, Backend};

use crate::grouped::GroupedArray;
use crate::node::{Composite, Node};
use crate::registry::Registry;

/// A base case reached during rebuilding.
enum Visit<'a, B: Backend> {
    Array(&'a GroupedArray<B>),
    Leaf(&'a B::Buffer),
}

type Visitor<'v, B> = dyn FnMut(Visit<'_, B>) -> Result<Node<B>, ArrayError> + 'v;

/// Several inputs, aligned and checked, ready for evaluation.
enum Zipped<B: Backend> {
    Arrays(Vec<GroupedArray<B>>),
    Leaves(Vec<B::Buffer>),
    Composite {
        like: Composite<B>,
        children: Vec<(usize, Zipped<B>)>,
    },
}

/// Traversal engine bound to a container registry.
pub struct Traversal<'r, B: Backend> {
    registry: &'r Registry<B>,
}

impl<'r, B: Backend> Traversal<'r, B> {
    /// Traverse using `registry` to open composites.
    pub fn new(registry: &'r Registry<B>) -> Self {
        Self { registry }
    }

    /// The registry in use.
    pub fn registry(&self) -> &'r Registry<B> {
        self.registry
    }

    /// Apply `f` to every group buffer and leaf, rebuilding the structure.
    pub fn map<F>(&self, node: &Node<B>, mut f: F) -> Result<Node<B>, ArrayError>
    where
        F: FnMut(&B::Buffer) -> Result<B::Buffer, ArrayError>,
    {
        self.rebuild(node, &mut |visit| match visit {
            Visit::Array(array) => {
                let data = array.iter().map(&mut f).collect::<Result<Vec<_>, _>>()?;
                GroupedArray::new(array.backend().cloned(), data).map(Node::Array)
            }
            Visit::Leaf(buffer) => f(buffer).map(Node::Leaf),
        })
    }

    /// Rebuild `node`, handing grouped arrays to `on_array` and leaf
    /// buffers to `on_leaf`.
    pub fn map_with<FA, FL>(
        &self,
        node: &Node<B>,
        mut on_array: FA,
        mut on_leaf: FL,
    ) -> Result<Node<B>, ArrayError>
    where
        FA: FnMut(&GroupedArray<B>) -> Result<Node<B>, ArrayError>,
        FL: FnMut(&B::Buffer) -> Result<Node<B>, ArrayError>,
    {
        self.rebuild(node, &mut |visit| match visit {
            Visit::Array(array) => on_array(array),
            Visit::Leaf(buffer) => on_leaf(buffer),
        })
    }

    /// Apply `f` to every grouped array; leaves pass through unchanged.
    pub fn map_arrays<F>(&self, node: &Node<B>, f: F) -> Result<Node<B>, ArrayError>
    where
        F: FnMut(&GroupedArray<B>) -> Result<Node<B>, ArrayError>,
    {
        self.map_with(node, f, |buffer| Ok(Node::Leaf(buffer.clone())))
    }

    /// Apply `f` to every leaf buffer; grouped arrays pass through unchanged.
    pub fn map_leaves<F>(&self, node: &Node<B>, f: F) -> Result<Node<B>, ArrayError>
    where
        F: FnMut(&B::Buffer) -> Result<Node<B>, ArrayError>,
    {
        self.map_with(node, |array| Ok(Node::Array(array.clone())), f)
    }

    /// Zip `nodes` and apply `f` to each aligned tuple of buffers.
    ///
    /// All inputs must share the same structure: the same node kinds, the
    /// same container types with the same child indices, and grouped arrays
    /// of equal length. The result follows the structure of `nodes[0]`.
    pub fn multimap<F>(&self, nodes: &[&Node<B>], mut f: F) -> Result<Node<B>, ArrayError>
    where
        F: FnMut(&[&B::Buffer]) -> Result<B::Buffer, ArrayError>,
    {
        if nodes.is_empty() {
            return Err(ArrayError::structure(
                0,
                "multimap requires at least one input",
            ));
        }
        let owned = nodes.iter().map(|n| (*n).clone()).collect();
        let zipped = self.zip(owned, 0)?;
        self.evaluate(zipped, &mut f)
    }

    fn rebuild(&self, node: &Node<B>, visit: &mut Visitor<'_, B>) -> Result<Node<B>, ArrayError> {
        match node {
            Node::Array(array) => visit(Visit::Array(array)),
            Node::Leaf(buffer) => visit(Visit::Leaf(buffer)),
            Node::Composite(composite) => {
                if let Some(array) = composite.as_grouped_array() {
                    return visit(Visit::Array(array));
                }
                let children = self.registry.decompose_composite(composite)?;
                let mut rebuilt = Vec::with_capacity(children.len());
                for (index, child) in children {
                    rebuilt.push((index, self.rebuild(&child, visit)?));
                }
                self.recompose(composite, rebuilt)
            }
        }
    }

    /// Recompose with the backend of the first attached child array.
    fn recompose(
        &self,
        like: &Composite<B>,
        children: Vec<(usize, Node<B>)>,
    ) -> Result<Node<B>, ArrayError> {
        let backend: Option<Arc<B>> = children
            .iter()
            .find_map(|(_, n)| n.as_array().and_then(GroupedArray::backend))
            .cloned();
        tracing::trace!(container = like.name(), children = children.len(), "recompose");
        self.registry
            .recompose_like(like, backend.as_ref(), children)
            .map(Node::Composite)
    }

    fn zip(&self, nodes: Vec<Node<B>>, depth: usize) -> Result<Zipped<B>, ArrayError> {
        let nodes: Vec<Node<B>> = nodes.into_iter().map(Node::into_base_case).collect();
        let kind = nodes[0].kind();
        if let Some((i, odd)) = nodes.iter().enumerate().find(|(_, n)| n.kind() != kind) {
            return Err(ArrayError::structure(
                depth,
                format!("input 0 is {kind}, input {i} is {}", odd.kind()),
            ));
        }

        if let Node::Composite(first) = &nodes[0] {
            let like = first.clone();
            return self.zip_composites(like, nodes, depth);
        }
        if nodes[0].as_leaf().is_some() {
            return nodes
                .into_iter()
                .map(Node::into_leaf)
                .collect::<Result<_, _>>()
                .map(Zipped::Leaves);
        }

        let arrays: Vec<GroupedArray<B>> = nodes
            .into_iter()
            .map(Node::into_array)
            .collect::<Result<_, _>>()?;
        let len = arrays[0].len();
        if let Some(odd) = arrays.iter().find(|a| a.len() != len) {
            return Err(ArrayError::LengthMismatch {
                left: len,
                right: odd.len(),
            });
        }
        Ok(Zipped::Arrays(arrays))
    }

    fn zip_composites(
        &self,
        like: Composite<B>,
        nodes: Vec<Node<B>>,
        depth: usize,
    ) -> Result<Zipped<B>, ArrayError> {
        let type_id: TypeId = like.type_id();
        let mut decomposed = Vec::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            let Some(composite) = node.as_composite() else {
                continue;
            };
            if composite.type_id() != type_id {
                return Err(ArrayError::structure(
                    depth,
                    format!(
                        "input 0 is {}, input {i} is {}",
                        like.name(),
                        composite.name()
                    ),
                ));
            }
            let mut children = self.registry.decompose_composite(composite)?;
            children.sort_by_key(|(index, _)| *index);
            decomposed.push(children);
        }

        let reference: Vec<usize> = decomposed[0].iter().map(|(index, _)| *index).collect();
        for (i, children) in decomposed.iter().enumerate().skip(1) {
            if children.len() != reference.len() {
                return Err(ArrayError::structure(
                    depth,
                    format!(
                        "{} input 0 has {} entries, input {i} has {}",
                        like.name(),
                        reference.len(),
                        children.len()
                    ),
                ));
            }
            if !children.iter().map(|(index, _)| *index).eq(reference.iter().copied()) {
                return Err(ArrayError::structure(
                    depth,
                    format!("{} entry indices differ between input 0 and input {i}", like.name()),
                ));
            }
        }

        // Transpose: one column of aligned children per index.
        let mut columns: Vec<Vec<Node<B>>> =
            (0..reference.len()).map(|_| Vec::with_capacity(decomposed.len())).collect();
        for children in decomposed {
            for (column, (_, child)) in columns.iter_mut().zip(children) {
                column.push(child);
            }
        }

        let children = reference
            .into_iter()
            .zip(columns)
            .map(|(index, column)| Ok((index, self.zip(column, depth + 1)?)))
            .collect::<Result<Vec<_>, ArrayError>>()?;
        Ok(Zipped::Composite { like, children })
    }

    fn evaluate<F>(&self, zipped: Zipped<B>, f: &mut F) -> Result<Node<B>, ArrayError>
    where
        F: FnMut(&[&B::Buffer]) -> Result<B::Buffer, ArrayError>,
    {
        match zipped {
            Zipped::Arrays(arrays) => {
                let mut data = Vec::with_capacity(arrays[0].len());
                for group in 0..arrays[0].len() {
                    let args: Vec<&B::Buffer> = arrays.iter().map(|a| &a[group]).collect();
                    data.push(f(&args)?);
                }
                GroupedArray::new(arrays[0].backend().cloned(), data).map(Node::Array)
            }
            Zipped::Leaves(leaves) => {
                let args: Vec<&B::Buffer> = leaves.iter().collect();
                f(&args).map(Node::Leaf)
            }
            Zipped::Composite { like, children } => {
                let mut rebuilt = Vec::with_capacity(children.len());
                for (index, child) in children {
                    rebuilt.push((index, self.evaluate(child, f)?));
                }
                self.recompose(&like, rebuilt)
            }
        }
    }
}

/// Lift a buffer function into a function over nodes.
pub fn mapped<'r, B, F>(
    registry: &'r Registry<B>,
    mut f: F,
) -> impl FnMut(&Node<B>) -> Result<Node<B>, ArrayError> + 'r
where
    B: Backend,
    F: FnMut(&B::Buffer) -> Result<B::Buffer, ArrayError> + 'r,
{
    move |node| Traversal::new(registry).map(node, &mut f)
}

/// Lift a multi-buffer function into a function over zipped nodes.
pub fn multimapped<'r, B, F>(
    registry: &'r Registry<B>,
    mut f: F,
) -> impl FnMut(&[&Node<B>]) -> Result<Node<B>, ArrayError> + 'r
where
    B: Backend,
    F: FnMut(&[&B::Buffer]) -> Result<B::Buffer, ArrayError> + 'r,
{
    move |nodes| Traversal::new(registry).multimap(nodes, &mut f)
}
