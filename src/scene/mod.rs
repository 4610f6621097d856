//! Scene graph module.
//!
//! Manages the spatial hierarchy and the features attached to it:
//! - `Node`: a positioned entity with parent/child links and a transform cache
//! - `Scene`: the arena that owns nodes, features and feature groups
//! - `Feature` / `FeatureGroup`: capability attachments and their batch groups
//! - `Drawable`: a minimal feature kind that consumes world transformations
//! - `TransformAlgebra`: the capability set required of a transform value

pub mod drawable;
pub mod feature;
pub mod node;
pub mod scene;
pub mod transform;

pub use drawable::{DrawBehavior, Drawable};
pub use feature::{Feature, FeatureGroup};
pub use node::Node;
pub use scene::{Scene, Scene2D, Scene3D};
pub use transform::TransformAlgebra;

use slotmap::new_key_type;

new_key_type! {
    /// Handle to a node owned by a [`Scene`].
    pub struct NodeKey;
    /// Handle to a feature owned by a [`Scene`].
    pub struct FeatureKey;
    /// Handle to a feature group owned by a [`Scene`].
    pub struct GroupKey;
}
