use glam::{Affine2, Affine3A};

use crate::scene::feature::Feature;
use crate::scene::scene::Scene;
use crate::scene::transform::TransformAlgebra;
use crate::scene::NodeKey;

/// Animation state.
///
/// See [`Scene::set_animation_state`](crate::scene::Scene::set_animation_state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnimationState {
    /// The animation is stopped. Changing state to `Running` starts it from
    /// the beginning.
    #[default]
    Stopped,

    /// The animation is paused. Changing state to `Running` continues from
    /// the paused position.
    Paused,

    /// The animation is running.
    Running,
}

/// Hooks a concrete animation supplies.
///
/// All hooks run inside a group step and receive the scene plus the owning
/// node, so an implementation can mutate the node's transformation or other
/// scene state. The hooks must not transition the animation's own state or
/// re-enter the step that invoked them; to stop an animation, call
/// `set_animation_state(Stopped)` before the next step.
pub trait AnimationBehavior<T: TransformAlgebra>: 'static {
    /// Performs one animation step.
    ///
    /// `time` is the time since the start of the current cycle, always in
    /// `[0, duration)` for finite durations, and `delta` is the duration of
    /// the current frame. Called once per group step while the animation is
    /// running.
    fn animation_step(&mut self, scene: &mut Scene<T>, node: NodeKey, time: f32, delta: f32);

    /// Called when the animation leaves `Stopped` for `Running`, before the
    /// first `animation_step` of the run.
    fn animation_started(&mut self, scene: &mut Scene<T>, node: NodeKey) {
        let _ = (scene, node);
    }

    /// Called when the animation leaves `Running` for `Paused`, after the
    /// last `animation_step` of the run.
    fn animation_paused(&mut self, scene: &mut Scene<T>, node: NodeKey) {
        let _ = (scene, node);
    }

    /// Called when the animation leaves `Paused` for `Running`, before
    /// `animation_step` calls resume. Time continues from the paused offset.
    fn animation_resumed(&mut self, scene: &mut Scene<T>, node: NodeKey) {
        let _ = (scene, node);
    }

    /// Called when the animation becomes `Stopped`, either through
    /// `set_animation_state` or because its duration and repeat budget ran
    /// out. Useful for snapping external state to the animation's end pose
    /// when the frame rate was too low for `animation_step` to reach it.
    fn animation_stopped(&mut self, scene: &mut Scene<T>, node: NodeKey) {
        let _ = (scene, node);
    }
}

/// A feature implementing a per-object animation timer and state machine.
///
/// Created stopped, non-repeating, with infinite duration. The state is
/// driven by [`Scene::set_animation_state`] and advanced by
/// [`Scene::step_animations`]; state transitions take effect (and fire their
/// hooks) at the next step, which is also where the clock comes from.
///
/// Timing fields (`start_time`, `pause_time`) are meaningful only while the
/// animation is running or paused.
pub struct Animable<T: TransformAlgebra> {
    duration: f32,
    repeated: bool,
    repeat_count: u16,

    pub(crate) current_state: AnimationState,
    pub(crate) previous_state: AnimationState,
    pub(crate) start_time: f32,
    pub(crate) pause_time: f32,
    pub(crate) repeats: u16,

    pub(crate) behavior: Box<dyn AnimationBehavior<T>>,
}

/// An animable for 2D scenes.
pub type Animable2D = Animable<Affine2>;
/// An animable for 3D scenes.
pub type Animable3D = Animable<Affine3A>;

impl<T: TransformAlgebra> Animable<T> {
    /// Creates a stopped, non-repeating animation with infinite duration.
    #[must_use]
    pub fn new(behavior: impl AnimationBehavior<T>) -> Self {
        Self {
            duration: 0.0,
            repeated: false,
            repeat_count: 0,
            current_state: AnimationState::Stopped,
            previous_state: AnimationState::Stopped,
            start_time: 0.0,
            pause_time: 0.0,
            repeats: 0,
            behavior: Box::new(behavior),
        }
    }

    /// Sets the duration of one animation cycle in seconds. `0.0` means an
    /// infinite, non-repeating animation. Default is `0.0`.
    #[must_use]
    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration;
        self
    }

    /// Enables or disables repetition. Default is `false`.
    #[must_use]
    pub fn with_repeated(mut self, repeated: bool) -> Self {
        self.repeated = repeated;
        self
    }

    /// Sets the repeat budget. Effective only when repetition is enabled;
    /// `0` means an infinitely repeated animation, `n` allows cycles `0..=n`.
    /// Default is `0`.
    #[must_use]
    pub fn with_repeat_count(mut self, count: u16) -> Self {
        self.repeat_count = count;
        self
    }

    /// Animation cycle duration in seconds (`0.0` = infinite).
    #[inline]
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Sets the cycle duration. A change made while the animation is running
    /// is picked up at the next step: the step re-derives elapsed time from
    /// the recorded start, so shrinking the duration below the elapsed time
    /// wraps or stops the animation on that step.
    pub fn set_duration(&mut self, duration: f32) {
        self.duration = duration;
    }

    /// Whether the animation repeats after its duration elapses.
    #[inline]
    #[must_use]
    pub fn is_repeated(&self) -> bool {
        self.repeated
    }

    pub fn set_repeated(&mut self, repeated: bool) {
        self.repeated = repeated;
    }

    /// The repeat budget (`0` = unbounded).
    #[inline]
    #[must_use]
    pub fn repeat_count(&self) -> u16 {
        self.repeat_count
    }

    pub fn set_repeat_count(&mut self, count: u16) {
        self.repeat_count = count;
    }

    /// The current animation state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> AnimationState {
        self.current_state
    }

    /// Completed repeat cycles of the current run.
    #[inline]
    #[must_use]
    pub fn repeats(&self) -> u16 {
        self.repeats
    }

    /// Whether this animation wants attention on the next group step: it is
    /// either running or has a pending state transition whose hooks have not
    /// fired yet.
    pub(crate) fn needs_step(&self) -> bool {
        self.current_state == AnimationState::Running
            || self.previous_state != self.current_state
    }
}

impl<T: TransformAlgebra> Feature for Animable<T> {}
