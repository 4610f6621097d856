//! Features and feature groups.
//!
//! A feature is a capability attached to exactly one node for the feature's
//! entire lifetime: animation, drawing, collision and similar concerns are
//! each independent feature kinds, and one node may carry any mix of them.
//! Feature data lives in the scene's feature arena as boxed trait objects;
//! typed access goes through downcasts, and every kind relation is checked
//! with `TypeId`s.
//!
//! A feature group is an ordered collection of same-kind features across many
//! nodes. Groups exist for batch passes ("step all animations", "draw all
//! drawables") that must not traverse the tree; insertion order is iteration
//! order, which makes per-frame processing deterministic.

use std::any::{Any, TypeId};

use crate::errors::{Result, SceneError};
use crate::scene::scene::Scene;
use crate::scene::transform::TransformAlgebra;
use crate::scene::{FeatureKey, GroupKey, NodeKey};

/// Marker for types that can be attached to a node as a feature.
///
/// The trait carries no behavior of its own; concrete capabilities define
/// their own hook traits (see [`Animable`](crate::animation::Animable) and
/// [`Drawable`](crate::scene::Drawable)). The `Any` supertrait is what allows
/// the scene to hand back typed references from its type-erased storage.
pub trait Feature: Any {}

/// Arena slot for one feature: owner, optional group membership, and the
/// boxed feature itself.
///
/// `data` is `None` only while the feature is temporarily checked out during
/// a batch pass over its group; user-visible operations treat an empty slot
/// as absent.
///
/// `scheduled` is the generic "this member wants processing on the next batch
/// pass" bit; the owning group counts scheduled members so an idle group can
/// be skipped in O(1).
pub(crate) struct FeatureSlot {
    pub(crate) node: NodeKey,
    pub(crate) group: Option<GroupKey>,
    pub(crate) scheduled: bool,
    pub(crate) kind: TypeId,
    pub(crate) data: Option<Box<dyn Feature>>,
}

/// An ordered collection of same-kind features for batch processing.
pub struct FeatureGroup {
    pub(crate) kind: TypeId,
    pub(crate) members: Vec<FeatureKey>,
    pub(crate) scheduled: usize,
    pub(crate) stepping: bool,
}

impl FeatureGroup {
    /// Number of member features.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member handles in attachment order. This is also the order every
    /// batch pass visits them in.
    #[inline]
    #[must_use]
    pub fn members(&self) -> &[FeatureKey] {
        &self.members
    }

    /// The feature kind this group accepts.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> TypeId {
        self.kind
    }
}

impl<T: TransformAlgebra> Scene<T> {
    // ========================================================================
    // Groups
    // ========================================================================

    /// Creates an empty group accepting features of kind `F`.
    pub fn create_group<F: Feature>(&mut self) -> GroupKey {
        self.groups.insert(FeatureGroup {
            kind: TypeId::of::<F>(),
            members: Vec::new(),
            scheduled: 0,
            stepping: false,
        })
    }

    /// Returns a reference to a group.
    #[inline]
    #[must_use]
    pub fn group(&self, key: GroupKey) -> Option<&FeatureGroup> {
        self.groups.get(key)
    }

    /// Destroys a group. Member features survive; their group membership is
    /// cleared.
    pub fn remove_group(&mut self, key: GroupKey) {
        let Some(group) = self.groups.remove(key) else {
            log::debug!("remove_group: stale group handle, ignoring");
            return;
        };
        for member in group.members {
            if let Some(slot) = self.features.get_mut(member) {
                slot.group = None;
            }
        }
    }

    // ========================================================================
    // Features
    // ========================================================================

    /// Attaches a feature to `node`. The owner is fixed for the feature's
    /// lifetime; group membership can be assigned later with
    /// [`set_feature_group`](Scene::set_feature_group).
    pub fn add_feature<F: Feature>(&mut self, node: NodeKey, feature: F) -> Result<FeatureKey> {
        if !self.nodes.contains_key(node) {
            return Err(SceneError::NodeNotFound);
        }
        let key = self.features.insert(FeatureSlot {
            node,
            group: None,
            scheduled: false,
            kind: TypeId::of::<F>(),
            data: Some(Box::new(feature)),
        });
        self.nodes[node].features.push(key);
        Ok(key)
    }

    /// Attaches a feature to `node` and appends it to `group`.
    pub fn add_feature_to_group<F: Feature>(
        &mut self,
        node: NodeKey,
        feature: F,
        group: GroupKey,
    ) -> Result<FeatureKey> {
        let g = self.groups.get(group).ok_or(SceneError::GroupNotFound)?;
        if g.kind != TypeId::of::<F>() {
            return Err(SceneError::GroupKindMismatch);
        }
        let key = self.add_feature(node, feature)?;
        self.attach_slot_to_group(key, group);
        Ok(key)
    }

    /// Moves a feature between groups: removes it from its current group (if
    /// any) and appends it to `group`. Passing `None` detaches. Setting the
    /// group it is already in keeps its position.
    pub fn set_feature_group(&mut self, feature: FeatureKey, group: Option<GroupKey>) -> Result<()> {
        let slot = self.features.get(feature).ok_or(SceneError::FeatureNotFound)?;
        if let Some(gk) = group {
            let g = self.groups.get(gk).ok_or(SceneError::GroupNotFound)?;
            if g.kind != slot.kind {
                return Err(SceneError::GroupKindMismatch);
            }
            if slot.group == Some(gk) {
                return Ok(());
            }
        }
        self.detach_slot_from_group(feature);
        if let Some(gk) = group {
            self.attach_slot_to_group(feature, gk);
        }
        Ok(())
    }

    /// Destroys a feature. It is removed from its group and from its owner's
    /// feature list before the slot is freed, so no stale entry is ever
    /// observable. A stale handle is a logged no-op.
    pub fn remove_feature(&mut self, feature: FeatureKey) {
        if !self.features.contains_key(feature) {
            log::debug!("remove_feature: stale feature handle, ignoring");
            return;
        }
        self.detach_slot_from_group(feature);
        if let Some(slot) = self.features.remove(feature)
            && let Some(node) = self.nodes.get_mut(slot.node)
            && let Some(i) = node.features.iter().position(|&k| k == feature)
        {
            node.features.remove(i);
        }
    }

    /// Typed access to a feature.
    #[must_use]
    pub fn feature<F: Feature>(&self, key: FeatureKey) -> Option<&F> {
        let data = self.features.get(key)?.data.as_deref()?;
        (data as &dyn Any).downcast_ref::<F>()
    }

    /// Typed mutable access to a feature.
    #[must_use]
    pub fn feature_mut<F: Feature>(&mut self, key: FeatureKey) -> Option<&mut F> {
        let data = self.features.get_mut(key)?.data.as_deref_mut()?;
        (data as &mut dyn Any).downcast_mut::<F>()
    }

    /// The node a feature is attached to.
    #[inline]
    #[must_use]
    pub fn feature_node(&self, key: FeatureKey) -> Option<NodeKey> {
        self.features.get(key).map(|slot| slot.node)
    }

    /// The group a feature currently belongs to, if any.
    #[inline]
    #[must_use]
    pub fn feature_group(&self, key: FeatureKey) -> Option<GroupKey> {
        self.features.get(key).and_then(|slot| slot.group)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Destroys every feature attached to `node`. Used by node removal; the
    /// node's own feature list is dropped wholesale with the node.
    pub(crate) fn destroy_features_of(&mut self, node: NodeKey) {
        let Some(n) = self.nodes.get_mut(node) else {
            return;
        };
        let keys = std::mem::take(&mut n.features);
        for key in keys {
            self.detach_slot_from_group(key);
            self.features.remove(key);
        }
    }

    /// Removes a feature from its group's member list and scheduled count.
    pub(crate) fn detach_slot_from_group(&mut self, key: FeatureKey) {
        let Some(slot) = self.features.get_mut(key) else {
            return;
        };
        let Some(gk) = slot.group.take() else {
            return;
        };
        let scheduled = slot.scheduled;
        if let Some(group) = self.groups.get_mut(gk) {
            if let Some(i) = group.members.iter().position(|&k| k == key) {
                group.members.remove(i);
            }
            if scheduled {
                group.scheduled = group.scheduled.saturating_sub(1);
            }
        }
    }

    /// Appends a feature to a group. The caller has validated the kind.
    pub(crate) fn attach_slot_to_group(&mut self, key: FeatureKey, gk: GroupKey) {
        let slot = &mut self.features[key];
        slot.group = Some(gk);
        let scheduled = slot.scheduled;
        let group = &mut self.groups[gk];
        group.members.push(key);
        if scheduled {
            group.scheduled += 1;
        }
    }

    /// Flips a feature's scheduled bit, keeping its group's counter in sync.
    pub(crate) fn set_feature_scheduled(&mut self, key: FeatureKey, scheduled: bool) {
        let Some(slot) = self.features.get_mut(key) else {
            return;
        };
        if slot.scheduled == scheduled {
            return;
        }
        slot.scheduled = scheduled;
        if let Some(gk) = slot.group
            && let Some(group) = self.groups.get_mut(gk)
        {
            if scheduled {
                group.scheduled += 1;
            } else {
                group.scheduled = group.scheduled.saturating_sub(1);
            }
        }
    }
}
