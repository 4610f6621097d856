use smallvec::SmallVec;

use crate::scene::transform::TransformAlgebra;
use crate::scene::{FeatureKey, NodeKey};

/// A node in the spatial hierarchy.
///
/// # Hierarchy
///
/// Nodes form a tree through parent-child relationships:
/// - `parent`: optional handle to the parent node (`None` for root nodes)
/// - `children`: list of child node handles
///
/// # Transform cache
///
/// Each node stores its local transformation and a cached world
/// transformation guarded by a dirty flag. Setting the local transformation
/// marks the node and its entire subtree dirty; the cache is refreshed lazily
/// when [`Scene::absolute_transformation`](crate::scene::Scene::absolute_transformation)
/// is queried.
///
/// # Features
///
/// A node owns the features attached to it. Feature data lives in the scene's
/// feature arena; the node keeps the handles so that removing the node can
/// destroy its features in the same operation.
#[derive(Debug, Clone)]
pub struct Node<T: TransformAlgebra> {
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,

    pub(crate) local: T,
    /// Composition of `local` with the parent's world transformation, valid
    /// while `dirty` is false.
    pub(crate) world: T,
    pub(crate) dirty: bool,

    pub(crate) features: SmallVec<[FeatureKey; 4]>,
}

impl<T: TransformAlgebra> Node<T> {
    /// Creates a detached node with the identity transformation.
    #[must_use]
    pub fn new() -> Self {
        Self::with_transformation(T::IDENTITY)
    }

    /// Creates a detached node with the given local transformation.
    #[must_use]
    pub fn with_transformation(local: T) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            local,
            world: local,
            dirty: true,
            features: SmallVec::new(),
        }
    }

    /// Returns the parent node handle, if any.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Returns a read-only slice of child node handles.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    /// Returns the local transformation.
    #[inline]
    #[must_use]
    pub fn transformation(&self) -> &T {
        &self.local
    }

    /// Returns the handles of the features attached to this node, in
    /// attachment order.
    #[inline]
    #[must_use]
    pub fn features(&self) -> &[FeatureKey] {
        &self.features
    }

    /// Whether the cached world transformation is stale.
    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl<T: TransformAlgebra> Default for Node<T> {
    fn default() -> Self {
        Self::new()
    }
}
