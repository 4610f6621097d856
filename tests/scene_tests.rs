//! Feature and group lifecycle tests
//!
//! Tests for:
//! - Attaching features (mandatory owner, optional group)
//! - Group membership order and regrouping
//! - Synchronous removal: no stale group entries are ever observable
//! - Node destruction destroying features recursively
//! - Kind checks between features and groups
//! - The drawable feature kind consuming world transformations

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Affine3A, Vec3};
use sylva::{Drawable, Feature, Node, Scene, Scene3D, SceneError};

// ============================================================================
// Helpers
// ============================================================================

/// A bare-bones feature kind for lifecycle tests.
struct Tag(u32);

impl Feature for Tag {}

fn translation_x(x: f32) -> Affine3A {
    Affine3A::from_translation(Vec3::new(x, 0.0, 0.0))
}

// ============================================================================
// Attachment
// ============================================================================

#[test]
fn feature_attachment_and_back_references() {
    let mut scene: Scene3D = Scene::new();
    let node = scene.add_node(Node::new());

    let f = scene.add_feature(node, Tag(7)).unwrap();

    assert_eq!(scene.feature_node(f), Some(node));
    assert_eq!(scene.feature_group(f), None);
    assert_eq!(scene.feature::<Tag>(f).unwrap().0, 7);
    assert_eq!(scene.node(node).unwrap().features(), &[f]);
}

#[test]
fn feature_needs_a_live_owner() {
    let mut scene: Scene3D = Scene::new();
    let node = scene.add_node(Node::new());
    scene.remove_node(node);

    assert_eq!(
        scene.add_feature(node, Tag(0)).unwrap_err(),
        SceneError::NodeNotFound
    );
}

#[test]
fn multiple_features_per_node() {
    let mut scene: Scene3D = Scene::new();
    let node = scene.add_node(Node::new());

    let a = scene.add_feature(node, Tag(1)).unwrap();
    let b = scene
        .add_feature(node, Drawable::<Affine3A>::new(|_: &Affine3A| {}))
        .unwrap();

    assert_eq!(scene.node(node).unwrap().features(), &[a, b]);
    // Typed access only succeeds for the right kind.
    assert!(scene.feature::<Tag>(a).is_some());
    assert!(scene.feature::<Tag>(b).is_none());
    assert!(scene.feature::<Drawable<Affine3A>>(b).is_some());
}

// ============================================================================
// Groups
// ============================================================================

#[test]
fn group_preserves_attachment_order() {
    let mut scene: Scene3D = Scene::new();
    let node = scene.add_node(Node::new());
    let group = scene.create_group::<Tag>();

    let a = scene.add_feature_to_group(node, Tag(1), group).unwrap();
    let b = scene.add_feature_to_group(node, Tag(2), group).unwrap();
    let c = scene.add_feature_to_group(node, Tag(3), group).unwrap();

    let g = scene.group(group).unwrap();
    assert_eq!(g.len(), 3);
    assert_eq!(g.members(), &[a, b, c]);

    // Removing the middle member keeps the order of the rest.
    scene.remove_feature(b);
    assert_eq!(scene.group(group).unwrap().members(), &[a, c]);
}

#[test]
fn regrouping_moves_between_groups() {
    let mut scene: Scene3D = Scene::new();
    let node = scene.add_node(Node::new());
    let first = scene.create_group::<Tag>();
    let second = scene.create_group::<Tag>();

    let f = scene.add_feature_to_group(node, Tag(0), first).unwrap();
    assert_eq!(scene.feature_group(f), Some(first));

    scene.set_feature_group(f, Some(second)).unwrap();
    assert!(scene.group(first).unwrap().is_empty());
    assert_eq!(scene.group(second).unwrap().members(), &[f]);
    assert_eq!(scene.feature_group(f), Some(second));

    // Re-assigning the same group keeps the position.
    let g = scene.add_feature_to_group(node, Tag(1), second).unwrap();
    scene.set_feature_group(f, Some(second)).unwrap();
    assert_eq!(scene.group(second).unwrap().members(), &[f, g]);

    // None detaches.
    scene.set_feature_group(f, None).unwrap();
    assert_eq!(scene.feature_group(f), None);
    assert_eq!(scene.group(second).unwrap().members(), &[g]);
}

#[test]
fn group_rejects_wrong_kind() {
    let mut scene: Scene3D = Scene::new();
    let node = scene.add_node(Node::new());
    let tags = scene.create_group::<Tag>();
    let drawables = scene.create_drawable_group();

    assert_eq!(
        scene
            .add_feature_to_group(node, Drawable::<Affine3A>::new(|_: &Affine3A| {}), tags)
            .unwrap_err(),
        SceneError::GroupKindMismatch
    );

    let f = scene.add_feature(node, Tag(0)).unwrap();
    assert_eq!(
        scene.set_feature_group(f, Some(drawables)).unwrap_err(),
        SceneError::GroupKindMismatch
    );
    // The failed move did not detach the feature from anything.
    assert_eq!(scene.feature_group(f), None);
}

#[test]
fn destroying_a_group_releases_members() {
    let mut scene: Scene3D = Scene::new();
    let node = scene.add_node(Node::new());
    let group = scene.create_group::<Tag>();
    let f = scene.add_feature_to_group(node, Tag(0), group).unwrap();

    scene.remove_group(group);

    assert!(scene.group(group).is_none());
    // The feature survives, ungrouped.
    assert!(scene.feature::<Tag>(f).is_some());
    assert_eq!(scene.feature_group(f), None);
}

// ============================================================================
// Destruction order
// ============================================================================

#[test]
fn removing_a_feature_clears_group_and_owner_entries() {
    let mut scene: Scene3D = Scene::new();
    let node = scene.add_node(Node::new());
    let group = scene.create_group::<Tag>();
    let f = scene.add_feature_to_group(node, Tag(0), group).unwrap();

    scene.remove_feature(f);

    assert!(scene.feature::<Tag>(f).is_none());
    assert!(scene.group(group).unwrap().is_empty());
    assert!(scene.node(node).unwrap().features().is_empty());
}

#[test]
fn removing_a_node_destroys_its_features() {
    let mut scene: Scene3D = Scene::new();
    let node = scene.add_node(Node::new());
    let group = scene.create_group::<Tag>();
    let f = scene.add_feature_to_group(node, Tag(0), group).unwrap();

    scene.remove_node(node);

    assert!(scene.feature::<Tag>(f).is_none());
    assert_eq!(scene.feature_node(f), None);
    assert!(scene.group(group).unwrap().is_empty());
}

#[test]
fn removing_a_subtree_destroys_descendant_features() {
    let mut scene: Scene3D = Scene::new();
    let root = scene.add_node(Node::new());
    let child = scene.add_child(root, Node::new()).unwrap();
    let grandchild = scene.add_child(child, Node::new()).unwrap();
    let group = scene.create_group::<Tag>();

    let on_root = scene.add_feature_to_group(root, Tag(0), group).unwrap();
    let on_grandchild = scene
        .add_feature_to_group(grandchild, Tag(1), group)
        .unwrap();

    // Removing the middle node takes the grandchild's feature with it but
    // leaves the root's feature alone.
    scene.remove_node(child);

    assert!(scene.feature::<Tag>(on_root).is_some());
    assert!(scene.feature::<Tag>(on_grandchild).is_none());
    assert_eq!(scene.group(group).unwrap().members(), &[on_root]);
    assert!(scene.contains(root));
    assert!(!scene.contains(grandchild));
}

// ============================================================================
// Drawables
// ============================================================================

#[test]
fn draw_group_visits_members_in_order_with_world_transforms() {
    let mut scene: Scene3D = Scene::new();
    let drawn: Rc<RefCell<Vec<f32>>> = Rc::default();

    let parent = scene.add_node(Node::with_transformation(translation_x(1.0)));
    let child = scene
        .add_child(parent, Node::with_transformation(translation_x(2.0)))
        .unwrap();
    let group = scene.create_drawable_group();

    for &node in &[child, parent] {
        let log = Rc::clone(&drawn);
        scene
            .add_feature_to_group(
                node,
                Drawable::new(move |world: &Affine3A| {
                    log.borrow_mut().push(world.translation.x);
                }),
                group,
            )
            .unwrap();
    }

    scene.draw_group(group);

    // Attachment order: the child's drawable was attached first.
    assert_eq!(drawn.borrow().as_slice(), &[3.0, 1.0]);
}

#[test]
fn draw_group_consumes_dirty_flags() {
    let mut scene: Scene3D = Scene::new();
    let node = scene.add_node(Node::with_transformation(translation_x(4.0)));
    let group = scene.create_drawable_group();
    scene
        .add_feature_to_group(node, Drawable::new(|_: &Affine3A| {}), group)
        .unwrap();

    assert_eq!(scene.is_dirty(node), Some(true));
    scene.draw_group(group);
    assert_eq!(scene.is_dirty(node), Some(false));
}
