//! A minimal drawing feature.
//!
//! `Drawable` is the proof that the composition model carries more than one
//! capability kind: it resolves its owner's world transformation and hands it
//! to a user-supplied behavior. What the behavior does with it (record a
//! draw call, cull, debug-print) is outside this crate; no pipeline state
//! lives here.

use crate::scene::feature::Feature;
use crate::scene::scene::Scene;
use crate::scene::transform::TransformAlgebra;
use crate::scene::GroupKey;

/// User hook invoked once per [`Scene::draw_group`] pass for each member.
pub trait DrawBehavior<T: TransformAlgebra>: 'static {
    /// Called with the owning node's world transformation.
    fn draw(&mut self, world: &T);
}

impl<T: TransformAlgebra, F: FnMut(&T) + 'static> DrawBehavior<T> for F {
    fn draw(&mut self, world: &T) {
        self(world);
    }
}

/// A feature that exposes its owner's world transformation to a draw hook.
pub struct Drawable<T: TransformAlgebra> {
    behavior: Box<dyn DrawBehavior<T>>,
}

impl<T: TransformAlgebra> Drawable<T> {
    #[must_use]
    pub fn new(behavior: impl DrawBehavior<T>) -> Self {
        Self {
            behavior: Box::new(behavior),
        }
    }
}

impl<T: TransformAlgebra> Feature for Drawable<T> {}

impl<T: TransformAlgebra> Scene<T> {
    /// Convenience for `create_group::<Drawable<T>>()`.
    pub fn create_drawable_group(&mut self) -> GroupKey {
        self.create_group::<Drawable<T>>()
    }

    /// Invokes every member drawable with its owner's world transformation,
    /// in attachment order. Resolving the world transformations consumes the
    /// dirty flags along the queried paths.
    pub fn draw_group(&mut self, group: GroupKey) {
        let Some(g) = self.groups.get(group) else {
            log::warn!("draw_group: stale group handle, ignoring");
            return;
        };
        debug_assert_eq!(g.kind, std::any::TypeId::of::<Drawable<T>>());

        let mut i = 0;
        loop {
            let Some(g) = self.groups.get(group) else {
                return;
            };
            let Some(&key) = g.members.get(i) else {
                return;
            };
            i += 1;

            let Some(node) = self.feature_node(key) else {
                continue;
            };
            let Some(world) = self.absolute_transformation(node) else {
                continue;
            };
            if let Some(drawable) = self.feature_mut::<Drawable<T>>(key) {
                drawable.behavior.draw(&world);
            }
        }
    }
}
