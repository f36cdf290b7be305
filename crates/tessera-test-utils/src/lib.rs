//! Test utilities and mock types for Tessera development.
//!
//! Provides host-backed fixtures, a two-field composite container
//! ([`FieldPair`]), and a [`MockDiscretization`] for layout tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::Arc;

use tessera_array::{ArrayContainer, Node, Registry};
use tessera_core::{ArrayError, Backend};
use tessera_host::HostBackend;
use tessera_layout::{Discretization, ElementGroupInfo};

pub use fixtures::*;

/// A composite holding two named child nodes.
///
/// Stands in for user-defined containers such as a field pair on a mesh.
pub struct FieldPair<B: Backend> {
    pub left: Node<B>,
    pub right: Node<B>,
}

impl<B: Backend> FieldPair<B> {
    pub fn new(left: impl Into<Node<B>>, right: impl Into<Node<B>>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }
}

impl<B: Backend> ArrayContainer<B> for FieldPair<B> {
    const NAME: &'static str = "FieldPair";

    fn decompose(&self) -> Vec<(usize, Node<B>)> {
        vec![(0, self.left.clone()), (1, self.right.clone())]
    }

    fn recompose(
        _backend: Option<&Arc<B>>,
        entries: Vec<(usize, Node<B>)>,
    ) -> Result<Self, ArrayError> {
        let [left, right]: [Node<B>; 2] = tessera_array::assemble_indexed(entries)?
            .try_into()
            .map_err(|v: Vec<Node<B>>| {
                ArrayError::type_error(format!("FieldPair needs 2 entries, got {}", v.len()))
            })?;
        Ok(Self { left, right })
    }
}

/// Registry with the built-ins plus [`FieldPair`].
pub fn registry() -> Registry<HostBackend> {
    Registry::builder()
        .register::<FieldPair<HostBackend>>()
        .unwrap()
        .build()
}

/// Discretization with fixed group sizes.
#[derive(Clone, Debug, Default)]
pub struct MockDiscretization {
    groups: Vec<ElementGroupInfo>,
}

impl MockDiscretization {
    /// Groups given as `(nelements, nunit_dofs)`.
    pub fn new(groups: &[(usize, usize)]) -> Self {
        Self {
            groups: groups
                .iter()
                .map(|&(nelements, nunit_dofs)| ElementGroupInfo {
                    nelements,
                    nunit_dofs,
                })
                .collect(),
        }
    }
}

impl Discretization for MockDiscretization {
    fn groups(&self) -> Vec<ElementGroupInfo> {
        self.groups.clone()
    }
}
