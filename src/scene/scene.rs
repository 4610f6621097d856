use std::sync::atomic::{AtomicU32, Ordering};

use glam::{Affine2, Affine3A};
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::errors::{Result, SceneError};
use crate::scene::feature::{FeatureGroup, FeatureSlot};
use crate::scene::node::Node;
use crate::scene::transform::TransformAlgebra;
use crate::scene::{FeatureKey, GroupKey, NodeKey};

static NEXT_SCENE_ID: AtomicU32 = AtomicU32::new(1);

/// The scene graph container.
///
/// `Scene` owns every node, feature and feature group through slotmap arenas;
/// all relations between them (parent/child, feature/owner, feature/group)
/// are generational keys into those arenas, so a stale handle fails lookup
/// instead of dangling.
///
/// The container is single-owner, single-thread state: all mutation goes
/// through `&mut self` and no operation blocks or suspends. Embedding it in a
/// multithreaded application requires external locking.
pub struct Scene<T: TransformAlgebra> {
    id: u32,

    pub(crate) nodes: SlotMap<NodeKey, Node<T>>,
    pub(crate) roots: Vec<NodeKey>,

    pub(crate) features: SlotMap<FeatureKey, FeatureSlot>,
    pub(crate) groups: SlotMap<GroupKey, FeatureGroup>,
}

/// A scene over 2D affine transformations.
pub type Scene2D = Scene<Affine2>;
/// A scene over 3D affine transformations.
pub type Scene3D = Scene<Affine3A>;

impl<T: TransformAlgebra> Default for Scene<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TransformAlgebra> Scene<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed),
            nodes: SlotMap::with_key(),
            roots: Vec::new(),
            features: SlotMap::with_key(),
            groups: SlotMap::with_key(),
        }
    }

    /// Process-unique identifier of this scene.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    // ========================================================================
    // Node management
    // ========================================================================

    /// Adds a node to the scene as a root node.
    pub fn add_node(&mut self, node: Node<T>) -> NodeKey {
        let key = self.nodes.insert(node);
        self.roots.push(key);
        key
    }

    /// Adds a node as a child of `parent`.
    pub fn add_child(&mut self, parent: NodeKey, node: Node<T>) -> Result<NodeKey> {
        if !self.nodes.contains_key(parent) {
            return Err(SceneError::NodeNotFound);
        }
        let key = self.nodes.insert(node);
        self.nodes[parent].children.push(key);
        self.nodes[key].parent = Some(parent);
        Ok(key)
    }

    /// Re-parents `child` under `parent`, keeping the child's local
    /// transformation.
    ///
    /// The child's subtree is marked dirty since its world transformation now
    /// derives from a different parent chain.
    pub fn attach(&mut self, child: NodeKey, parent: NodeKey) -> Result<()> {
        if !self.nodes.contains_key(child) || !self.nodes.contains_key(parent) {
            return Err(SceneError::NodeNotFound);
        }
        if child == parent || self.is_ancestor_of(child, parent) {
            log::warn!("attach: rejected, would create a hierarchy cycle");
            return Err(SceneError::HierarchyCycle);
        }

        self.unlink(child);
        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);
        self.mark_subtree_dirty(child);
        Ok(())
    }

    /// Re-parents `child` under `parent`, keeping the child's *absolute*
    /// transformation by rewriting its local transformation.
    pub fn attach_keeping_world(&mut self, child: NodeKey, parent: NodeKey) -> Result<()> {
        let child_world = self
            .absolute_transformation(child)
            .ok_or(SceneError::NodeNotFound)?;
        let parent_world = self
            .absolute_transformation(parent)
            .ok_or(SceneError::NodeNotFound)?;

        self.attach(child, parent)?;
        self.set_transformation(child, parent_world.inverse().compose(&child_world))
    }

    /// Detaches `child` from its parent, making it a root node.
    pub fn detach(&mut self, child: NodeKey) -> Result<()> {
        if !self.nodes.contains_key(child) {
            return Err(SceneError::NodeNotFound);
        }
        if self.nodes[child].parent.is_none() {
            return Ok(());
        }
        self.unlink(child);
        self.roots.push(child);
        self.mark_subtree_dirty(child);
        Ok(())
    }

    /// Removes a node, its entire subtree, and every feature attached to any
    /// node in that subtree. Features are detached from their groups before
    /// they are destroyed. A stale handle is a logged no-op.
    pub fn remove_node(&mut self, node: NodeKey) {
        if !self.nodes.contains_key(node) {
            log::debug!("remove_node: stale node handle, ignoring");
            return;
        }
        self.unlink(node);

        // Collect the subtree iteratively; deep hierarchies must not recurse.
        let mut subtree = vec![node];
        let mut i = 0;
        while i < subtree.len() {
            if let Some(n) = self.nodes.get(subtree[i]) {
                subtree.extend_from_slice(&n.children);
            }
            i += 1;
        }

        for &key in &subtree {
            self.destroy_features_of(key);
            self.nodes.remove(key);
        }
    }

    /// Returns a reference to a node.
    #[inline]
    #[must_use]
    pub fn node(&self, key: NodeKey) -> Option<&Node<T>> {
        self.nodes.get(key)
    }

    /// Whether `key` refers to a live node.
    #[inline]
    #[must_use]
    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Number of live nodes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The current root nodes, in creation/detach order.
    #[inline]
    #[must_use]
    pub fn roots(&self) -> &[NodeKey] {
        &self.roots
    }

    // ========================================================================
    // Transformations
    // ========================================================================

    /// Sets the node's local transformation and marks the node and all of its
    /// descendants dirty. The marking is absolute: it does not depend on the
    /// dirty state of any ancestor.
    pub fn set_transformation(&mut self, node: NodeKey, transformation: T) -> Result<()> {
        let n = self.nodes.get_mut(node).ok_or(SceneError::NodeNotFound)?;
        n.local = transformation;
        // An already dirty node implies an already dirty subtree, but the
        // local value changed, so the flag itself must be (re)set.
        n.dirty = true;
        self.mark_subtree_dirty(node);
        Ok(())
    }

    /// Returns the node's local transformation. No side effects.
    #[inline]
    #[must_use]
    pub fn transformation(&self, node: NodeKey) -> Option<&T> {
        self.nodes.get(node).map(Node::transformation)
    }

    /// Returns the node's world transformation, recomputing and caching any
    /// stale part of the parent chain.
    ///
    /// Cleaning happens top-down along the queried path only; siblings stay
    /// dirty until they are themselves queried. Amortized O(1) per node per
    /// frame, O(depth) for a single cold query.
    pub fn absolute_transformation(&mut self, node: NodeKey) -> Option<T> {
        self.nodes.get(node)?;

        // Walk up and collect the dirty suffix of the chain, deepest first.
        // Eager downward marking guarantees that everything below the first
        // clean ancestor is clean too.
        let mut pending: SmallVec<[NodeKey; 16]> = SmallVec::new();
        let mut cursor = Some(node);
        let mut world = T::IDENTITY;
        while let Some(key) = cursor {
            let n = &self.nodes[key];
            if !n.dirty {
                world = n.world;
                break;
            }
            pending.push(key);
            cursor = n.parent;
        }

        if pending.is_empty() {
            return Some(self.nodes[node].world);
        }

        for &key in pending.iter().rev() {
            let n = &mut self.nodes[key];
            world = world.compose(&n.local);
            n.world = world;
            n.dirty = false;
        }
        Some(world)
    }

    /// Whether the node's cached world transformation is stale. Exposed for
    /// consumers (renderers, culling) that track transform changes.
    #[inline]
    #[must_use]
    pub fn is_dirty(&self, node: NodeKey) -> Option<bool> {
        self.nodes.get(node).map(Node::is_dirty)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Removes `node` from its parent's child list or from the root list.
    /// Does not touch `node.parent` beyond what the caller overwrites.
    fn unlink(&mut self, node: NodeKey) {
        let parent = self.nodes[node].parent.take();
        if let Some(p) = parent {
            if let Some(pn) = self.nodes.get_mut(p)
                && let Some(i) = pn.children.iter().position(|&k| k == node)
            {
                pn.children.remove(i);
            }
        } else if let Some(i) = self.roots.iter().position(|&k| k == node) {
            self.roots.remove(i);
        }
    }

    /// Marks a node and all descendants dirty with an explicit work stack.
    /// Subtrees already marked are pruned: a dirty node never has a clean
    /// descendant.
    fn mark_subtree_dirty(&mut self, root: NodeKey) {
        let mut stack: Vec<NodeKey> = Vec::with_capacity(16);
        stack.push(root);
        while let Some(key) = stack.pop() {
            let Some(node) = self.nodes.get_mut(key) else {
                continue;
            };
            if node.dirty && key != root {
                continue;
            }
            node.dirty = true;
            stack.extend_from_slice(&node.children);
        }
    }

    /// Whether `ancestor` appears in `node`'s parent chain.
    fn is_ancestor_of(&self, ancestor: NodeKey, node: NodeKey) -> bool {
        let mut cursor = self.nodes.get(node).and_then(Node::parent);
        while let Some(key) = cursor {
            if key == ancestor {
                return true;
            }
            cursor = self.nodes.get(key).and_then(Node::parent);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Affine3A, Vec3};

    #[test]
    fn hierarchy_edit_basics() {
        let mut scene: Scene3D = Scene::new();

        let a = scene.add_node(Node::new());
        let b = scene.add_child(a, Node::new()).unwrap();
        let c = scene.add_node(Node::new());

        assert_eq!(scene.roots(), &[a, c]);
        assert_eq!(scene.node(b).unwrap().parent(), Some(a));

        scene.attach(c, b).unwrap();
        assert_eq!(scene.roots(), &[a]);
        assert_eq!(scene.node(b).unwrap().children(), &[c]);

        // Attaching a node below itself must be rejected.
        assert_eq!(scene.attach(a, c), Err(SceneError::HierarchyCycle));
        assert_eq!(scene.attach(a, a), Err(SceneError::HierarchyCycle));

        scene.remove_node(a);
        assert!(scene.is_empty());
        assert!(scene.roots().is_empty());
    }

    #[test]
    fn world_transform_of_child_composes_parent() {
        let mut scene: Scene3D = Scene::new();
        let parent = scene.add_node(Node::with_transformation(Affine3A::from_translation(
            Vec3::new(1.0, 0.0, 0.0),
        )));
        let child = scene
            .add_child(
                parent,
                Node::with_transformation(Affine3A::from_translation(Vec3::new(0.0, 2.0, 0.0))),
            )
            .unwrap();

        let world = scene.absolute_transformation(child).unwrap();
        assert_eq!(world.translation.x, 1.0);
        assert_eq!(world.translation.y, 2.0);
        assert_eq!(scene.is_dirty(child), Some(false));
    }
}
