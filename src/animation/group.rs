//! Group stepping for animables.
//!
//! An external driver owns the clock and calls
//! [`Scene::step_animations`] once per frame with the absolute time and the
//! frame delta. The group dispatches to every member that is running or has
//! a pending state transition, in attachment order; a group with neither
//! returns immediately without visiting any member.

use std::any::{Any, TypeId};

use crate::animation::animable::{Animable, AnimationState};
use crate::errors::{Result, SceneError};
use crate::scene::scene::Scene;
use crate::scene::transform::TransformAlgebra;
use crate::scene::{FeatureKey, GroupKey};

impl<T: TransformAlgebra> Scene<T> {
    /// Convenience for `create_group::<Animable<T>>()`.
    pub fn create_animable_group(&mut self) -> GroupKey {
        self.create_group::<Animable<T>>()
    }

    /// Requests an animation state transition.
    ///
    /// Transitions take effect at the next [`step_animations`] call of the
    /// animable's group, which is where the corresponding hooks fire and
    /// where the clock is read. Two requests are ignored by contract:
    /// changing `Stopped` to `Paused` (there is nothing to pause) and
    /// re-requesting the current state.
    ///
    /// [`step_animations`]: Scene::step_animations
    pub fn set_animation_state(&mut self, animable: FeatureKey, state: AnimationState) -> Result<()> {
        let needs = {
            let slot = self
                .features
                .get_mut(animable)
                .ok_or(SceneError::FeatureNotFound)?;
            let Some(data) = slot.data.as_deref_mut() else {
                // The animable is being dispatched right now; the contract is
                // to stop an animation before the next step, not during it.
                log::debug!("set_animation_state: animable is currently being stepped, ignoring");
                return Ok(());
            };
            let anim = (data as &mut dyn Any)
                .downcast_mut::<Animable<T>>()
                .ok_or(SceneError::FeatureKindMismatch)?;

            if anim.current_state == state
                || (anim.current_state == AnimationState::Stopped
                    && state == AnimationState::Paused)
            {
                return Ok(());
            }
            if state == AnimationState::Paused
                && anim.current_state == AnimationState::Running
                && anim.previous_state == AnimationState::Stopped
            {
                // The run was requested but never reached a step; pausing an
                // unstarted animation cancels the start instead of parking a
                // paused run that has no position to resume from.
                anim.current_state = AnimationState::Stopped;
            } else {
                anim.current_state = state;
            }
            anim.needs_step()
        };
        self.set_feature_scheduled(animable, needs);
        Ok(())
    }

    /// The current state of an animable.
    #[must_use]
    pub fn animation_state(&self, animable: FeatureKey) -> Option<AnimationState> {
        self.feature::<Animable<T>>(animable).map(Animable::state)
    }

    /// Advances every running member of `group` once.
    ///
    /// `time` is the absolute clock in seconds and `delta` the duration of
    /// the current frame; both come from the external frame clock. Members
    /// are visited in attachment order. Pending state transitions are
    /// resolved here (their hooks fire from this call), running members get
    /// one `animation_step`, and members whose duration and repeat budget
    /// ran out are stopped autonomously.
    ///
    /// If no member is running and no transition is pending, the call
    /// returns immediately without visiting any member.
    ///
    /// Not reentrant: behaviors must not call `step_animations` for the
    /// group currently being stepped.
    pub fn step_animations(&mut self, group: GroupKey, time: f32, delta: f32) {
        let Some(g) = self.groups.get_mut(group) else {
            log::warn!("step_animations: stale group handle, ignoring");
            return;
        };
        debug_assert_eq!(g.kind, TypeId::of::<Animable<T>>());
        if g.stepping {
            debug_assert!(false, "step_animations re-entered for the same group");
            log::error!("step_animations: group is already being stepped, ignoring");
            return;
        }
        // Idle fast path: a fully dormant group costs O(1) per frame.
        if g.scheduled == 0 {
            return;
        }
        g.stepping = true;

        let mut i = 0;
        loop {
            let Some(g) = self.groups.get(group) else {
                // A hook destroyed the group itself.
                return;
            };
            let Some(&key) = g.members.get(i) else {
                break;
            };
            i += 1;
            self.step_one(key, time, delta);
        }

        if let Some(g) = self.groups.get_mut(group) {
            g.stepping = false;
            debug_assert!(g.scheduled <= g.members.len());
        }
    }

    /// Processes one member: resolve the pending state edge, apply the
    /// duration/repeat logic, invoke the behavior.
    ///
    /// The boxed animable is taken out of its slot for the duration of the
    /// dispatch so hooks can receive `&mut Scene` without aliasing it.
    fn step_one(&mut self, key: FeatureKey, time: f32, delta: f32) {
        let (node, mut data) = {
            let Some(slot) = self.features.get_mut(key) else {
                return;
            };
            if !slot.scheduled {
                // Dormant member: stopped long ago, nothing pending.
                return;
            }
            let Some(data) = slot.data.take() else {
                return;
            };
            (slot.node, data)
        };

        let needs = {
            let Some(anim) = (&mut *data as &mut dyn Any).downcast_mut::<Animable<T>>() else {
                debug_assert!(false, "non-animable member in an animable group");
                if let Some(slot) = self.features.get_mut(key) {
                    slot.data = Some(data);
                }
                return;
            };

            // Resolve the state edge recorded since the previous step. Hooks
            // fire here; the started/resumed edges also (re)anchor the timer
            // now that a clock value is available.
            match (anim.previous_state, anim.current_state) {
                (AnimationState::Stopped, AnimationState::Running) => {
                    anim.previous_state = AnimationState::Running;
                    anim.start_time = time;
                    anim.repeats = 0;
                    anim.behavior.animation_started(self, node);
                }
                (AnimationState::Paused, AnimationState::Running) => {
                    anim.previous_state = AnimationState::Running;
                    // Shift the anchor so the paused span does not count.
                    anim.start_time += time - anim.pause_time;
                    anim.behavior.animation_resumed(self, node);
                }
                (AnimationState::Running, AnimationState::Paused) => {
                    anim.previous_state = AnimationState::Paused;
                    anim.pause_time = time;
                    anim.behavior.animation_paused(self, node);
                }
                (
                    AnimationState::Running | AnimationState::Paused,
                    AnimationState::Stopped,
                ) => {
                    anim.previous_state = AnimationState::Stopped;
                    anim.behavior.animation_stopped(self, node);
                }
                _ => {}
            }

            if anim.current_state == AnimationState::Running {
                let mut elapsed = time - anim.start_time;

                // Past the end of the cycle: wrap while the repeat budget
                // allows, otherwise stop autonomously. An oversized frame
                // can cross several cycle boundaries at once.
                if anim.duration() > 0.0 {
                    while elapsed >= anim.duration() {
                        if anim.is_repeated()
                            && (anim.repeat_count() == 0 || anim.repeats < anim.repeat_count())
                        {
                            anim.repeats += 1;
                            anim.start_time += anim.duration();
                            elapsed -= anim.duration();
                        } else {
                            anim.current_state = AnimationState::Stopped;
                            anim.previous_state = AnimationState::Stopped;
                            anim.behavior.animation_stopped(self, node);
                            break;
                        }
                    }
                }

                // No step call ever observes a time at or past the duration.
                if anim.current_state == AnimationState::Running {
                    anim.behavior.animation_step(self, node, elapsed, delta);
                }
            }

            anim.needs_step()
        };

        // Reinsert and reconcile the scheduled bit. If a hook removed the
        // owning node (and with it this feature), the slot is gone and the
        // box is simply dropped here.
        let Some(slot) = self.features.get_mut(key) else {
            return;
        };
        slot.data = Some(data);
        self.set_feature_scheduled(key, needs);
    }
}
