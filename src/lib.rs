#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod animation;
pub mod errors;
pub mod scene;
pub mod utils;

pub use animation::{Animable, Animable2D, Animable3D, AnimationBehavior, AnimationState};
pub use errors::{Result, SceneError};
pub use scene::{
    DrawBehavior, Drawable, Feature, FeatureGroup, FeatureKey, GroupKey, Node, NodeKey, Scene,
    Scene2D, Scene3D, TransformAlgebra,
};
pub use utils::time::Timer;
