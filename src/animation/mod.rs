//! Animation module.
//!
//! - `Animable`: a feature implementing a timed animation state machine
//! - `AnimationBehavior`: the hook trait concrete animations supply
//! - group stepping: advancing every running animation once per frame, with
//!   an O(1) fast path when nothing in a group is running

pub mod animable;
pub mod group;

pub use animable::{Animable, Animable2D, Animable3D, AnimationBehavior, AnimationState};
