//! Auto-rotation arbitration between the play/pause control, pointer
//! interaction and the idle-resume timer.
//!
//! [`transition`] is a pure function from `(state, event)` to the next state
//! plus the timer commands to carry out. [`RotationController`] owns the
//! state and a [`ResumeTimers`] deadline queue and is the only thing that
//! executes those commands.
//!
//! A resume timer can only exist inside [`RotationState::PausedByInteraction`],
//! and every edge out of that state cancels it, so a late timer cannot race a
//! fresh interaction or an explicit pause.

use std::time::{Duration, Instant};

/// Identifies one scheduled resume. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationState {
    Rotating,
    /// Paused with the play/pause control. Sticky across pointer interaction.
    PausedByUser,
    /// Paused by a drag or zoom. `resume` is set once the interaction ended
    /// and the idle timer is pending.
    PausedByInteraction { resume: Option<TimerHandle> },
}

impl RotationState {
    pub fn is_rotating(self) -> bool {
        matches!(self, RotationState::Rotating)
    }

    pub fn pending_timer(self) -> Option<TimerHandle> {
        match self {
            RotationState::PausedByInteraction { resume } => resume,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationEvent {
    ButtonToggle,
    InteractionStart,
    InteractionEnd,
    ResumeElapsed(TimerHandle),
    Unmount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Schedule { handle: TimerHandle, delay: Duration },
    Cancel(TimerHandle),
}

/// Result of one transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub state: RotationState,
    pub commands: Vec<TimerCommand>,
}

impl Step {
    fn stay(state: RotationState) -> Self {
        Self {
            state,
            commands: Vec::new(),
        }
    }
}

/// Next state for `event`. `fresh` is used only when a new resume timer is
/// scheduled.
pub fn transition(
    state: RotationState,
    event: RotationEvent,
    fresh: TimerHandle,
    resume_delay: Duration,
) -> Step {
    use RotationEvent as E;
    use RotationState as S;

    let cancel_pending = |state: RotationState| -> Vec<TimerCommand> {
        state
            .pending_timer()
            .map(TimerCommand::Cancel)
            .into_iter()
            .collect()
    };

    match (state, event) {
        (S::Rotating, E::ButtonToggle) => Step::stay(S::PausedByUser),
        (S::PausedByUser, E::ButtonToggle) => Step::stay(S::Rotating),
        (S::PausedByInteraction { .. }, E::ButtonToggle) => Step {
            state: S::Rotating,
            commands: cancel_pending(state),
        },

        (S::Rotating, E::InteractionStart) => Step::stay(S::PausedByInteraction { resume: None }),
        (S::PausedByInteraction { .. }, E::InteractionStart) => Step {
            state: S::PausedByInteraction { resume: None },
            commands: cancel_pending(state),
        },

        (S::PausedByInteraction { .. }, E::InteractionEnd) => {
            let mut commands = cancel_pending(state);
            commands.push(TimerCommand::Schedule {
                handle: fresh,
                delay: resume_delay,
            });
            Step {
                state: S::PausedByInteraction {
                    resume: Some(fresh),
                },
                commands,
            }
        }

        (S::PausedByInteraction { resume: Some(pending) }, E::ResumeElapsed(fired))
            if pending == fired =>
        {
            Step::stay(S::Rotating)
        }

        (S::PausedByInteraction { .. }, E::Unmount) => Step {
            state: S::PausedByInteraction { resume: None },
            commands: cancel_pending(state),
        },

        // Explicit pause is sticky, stray ends are ignored, and stale timers
        // are dropped.
        (_, E::InteractionStart | E::InteractionEnd | E::ResumeElapsed(_) | E::Unmount) => {
            Step::stay(state)
        }
    }
}

/// Pending resume deadlines, polled with an explicit clock.
#[derive(Debug, Default)]
pub struct ResumeTimers {
    pending: Vec<(TimerHandle, Instant)>,
}

impl ResumeTimers {
    pub fn schedule(&mut self, handle: TimerHandle, deadline: Instant) {
        self.pending.push((handle, deadline));
    }

    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|(h, _)| *h != handle);
        self.pending.len() != before
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Remove and return every timer due at `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<TimerHandle> {
        let mut due: Vec<_> = self
            .pending
            .iter()
            .filter(|(_, deadline)| *deadline <= now)
            .copied()
            .collect();
        self.pending.retain(|(_, deadline)| *deadline > now);
        due.sort_by_key(|(_, deadline)| *deadline);
        due.into_iter().map(|(h, _)| h).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Owns the rotation state for one viewer session.
#[derive(Debug)]
pub struct RotationController {
    state: RotationState,
    timers: ResumeTimers,
    next_handle: u64,
    resume_delay: Duration,
    torn_down: bool,
}

impl RotationController {
    pub fn new(rotating: bool, resume_delay: Duration) -> Self {
        Self {
            state: if rotating {
                RotationState::Rotating
            } else {
                RotationState::PausedByUser
            },
            timers: ResumeTimers::default(),
            next_handle: 0,
            resume_delay,
            torn_down: false,
        }
    }

    pub fn state(&self) -> RotationState {
        self.state
    }

    pub fn is_rotating(&self) -> bool {
        !self.torn_down && self.state.is_rotating()
    }

    pub fn resume_delay(&self) -> Duration {
        self.resume_delay
    }

    /// Number of scheduled resumes. At most one outside of tests that poke
    /// [`ResumeTimers`] directly.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Apply `event` at time `now`. Ignored after [`unmount`](Self::unmount).
    pub fn handle(&mut self, event: RotationEvent, now: Instant) -> RotationState {
        if self.torn_down {
            return self.state;
        }
        let fresh = TimerHandle(self.next_handle);
        self.next_handle += 1;

        let step = transition(self.state, event, fresh, self.resume_delay);
        for command in step.commands {
            match command {
                TimerCommand::Schedule { handle, delay } => {
                    self.timers.schedule(handle, now + delay);
                }
                TimerCommand::Cancel(handle) => {
                    self.timers.cancel(handle);
                }
            }
        }
        if step.state != self.state {
            tracing::debug!(from = ?self.state, to = ?step.state, ?event, "Rotation state changed");
        }
        self.state = step.state;
        self.state
    }

    /// Fire resume timers that are due at `now`. Call once per frame.
    pub fn poll(&mut self, now: Instant) {
        if self.torn_down {
            return;
        }
        for handle in self.timers.take_due(now) {
            self.handle(RotationEvent::ResumeElapsed(handle), now);
        }
    }

    /// Cancel everything and stop reacting to events.
    pub fn unmount(&mut self) {
        if self.torn_down {
            return;
        }
        self.handle(RotationEvent::Unmount, Instant::now());
        self.timers.clear();
        self.torn_down = true;
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

impl Drop for RotationController {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_secs(4);

    fn step(state: RotationState, event: RotationEvent) -> Step {
        transition(state, event, TimerHandle(99), DELAY)
    }

    #[test]
    fn test_toggle_cycles_between_rotating_and_user_pause() {
        assert_eq!(
            step(RotationState::Rotating, RotationEvent::ButtonToggle).state,
            RotationState::PausedByUser
        );
        assert_eq!(
            step(RotationState::PausedByUser, RotationEvent::ButtonToggle).state,
            RotationState::Rotating
        );
    }

    #[test]
    fn test_toggle_from_interaction_pause_resumes_and_cancels() {
        let paused = RotationState::PausedByInteraction {
            resume: Some(TimerHandle(3)),
        };
        let s = step(paused, RotationEvent::ButtonToggle);
        assert_eq!(s.state, RotationState::Rotating);
        assert_eq!(s.commands, vec![TimerCommand::Cancel(TimerHandle(3))]);
    }

    #[test]
    fn test_user_pause_is_sticky_across_interaction() {
        for event in [RotationEvent::InteractionStart, RotationEvent::InteractionEnd] {
            let s = step(RotationState::PausedByUser, event);
            assert_eq!(s.state, RotationState::PausedByUser);
            assert!(s.commands.is_empty());
        }
    }

    #[test]
    fn test_interaction_end_schedules_fresh_timer() {
        let s = step(
            RotationState::PausedByInteraction { resume: None },
            RotationEvent::InteractionEnd,
        );
        assert_eq!(
            s.state,
            RotationState::PausedByInteraction {
                resume: Some(TimerHandle(99))
            }
        );
        assert_eq!(
            s.commands,
            vec![TimerCommand::Schedule {
                handle: TimerHandle(99),
                delay: DELAY
            }]
        );
    }

    #[test]
    fn test_new_interaction_invalidates_pending_timer() {
        let s = step(
            RotationState::PausedByInteraction {
                resume: Some(TimerHandle(1)),
            },
            RotationEvent::InteractionStart,
        );
        assert_eq!(s.state, RotationState::PausedByInteraction { resume: None });
        assert_eq!(s.commands, vec![TimerCommand::Cancel(TimerHandle(1))]);
    }

    #[test]
    fn test_stale_timer_is_ignored() {
        let state = RotationState::PausedByInteraction {
            resume: Some(TimerHandle(2)),
        };
        assert_eq!(
            step(state, RotationEvent::ResumeElapsed(TimerHandle(1))).state,
            state
        );
        assert_eq!(
            step(RotationState::PausedByUser, RotationEvent::ResumeElapsed(TimerHandle(2))).state,
            RotationState::PausedByUser
        );
    }

    #[test]
    fn test_matching_timer_resumes() {
        let state = RotationState::PausedByInteraction {
            resume: Some(TimerHandle(2)),
        };
        assert_eq!(
            step(state, RotationEvent::ResumeElapsed(TimerHandle(2))).state,
            RotationState::Rotating
        );
    }

    #[test]
    fn test_no_state_holds_a_timer_outside_interaction_pause() {
        let states = [
            RotationState::Rotating,
            RotationState::PausedByUser,
            RotationState::PausedByInteraction { resume: None },
            RotationState::PausedByInteraction {
                resume: Some(TimerHandle(5)),
            },
        ];
        let events = [
            RotationEvent::ButtonToggle,
            RotationEvent::InteractionStart,
            RotationEvent::InteractionEnd,
            RotationEvent::ResumeElapsed(TimerHandle(5)),
            RotationEvent::Unmount,
        ];
        for state in states {
            for event in events {
                let next = step(state, event).state;
                if !matches!(next, RotationState::PausedByInteraction { .. }) {
                    assert_eq!(next.pending_timer(), None, "{state:?} + {event:?}");
                }
            }
        }
    }

    #[test]
    fn test_controller_resumes_after_delay() {
        let start = Instant::now();
        let mut rotation = RotationController::new(true, DELAY);
        rotation.handle(RotationEvent::InteractionStart, start);
        rotation.handle(RotationEvent::InteractionEnd, start);
        assert_eq!(rotation.pending_timers(), 1);

        rotation.poll(start + Duration::from_secs(3));
        assert!(!rotation.is_rotating());

        rotation.poll(start + DELAY);
        assert!(rotation.is_rotating());
        assert_eq!(rotation.pending_timers(), 0);
    }

    #[test]
    fn test_controller_interaction_before_deadline_keeps_paused() {
        let start = Instant::now();
        let mut rotation = RotationController::new(true, DELAY);
        rotation.handle(RotationEvent::InteractionStart, start);
        rotation.handle(RotationEvent::InteractionEnd, start);
        rotation.handle(RotationEvent::InteractionStart, start + Duration::from_secs(2));
        assert_eq!(rotation.pending_timers(), 0);

        rotation.poll(start + Duration::from_secs(10));
        assert_eq!(
            rotation.state(),
            RotationState::PausedByInteraction { resume: None }
        );
    }

    #[test]
    fn test_controller_repeated_ends_keep_single_timer() {
        let start = Instant::now();
        let mut rotation = RotationController::new(true, DELAY);
        rotation.handle(RotationEvent::InteractionStart, start);
        rotation.handle(RotationEvent::InteractionEnd, start);
        rotation.handle(RotationEvent::InteractionEnd, start + Duration::from_secs(2));
        assert_eq!(rotation.pending_timers(), 1);

        rotation.poll(start + Duration::from_secs(5));
        assert!(!rotation.is_rotating(), "first timer was superseded");
        rotation.poll(start + Duration::from_secs(6));
        assert!(rotation.is_rotating());
    }

    #[test]
    fn test_explicit_pause_during_wait_blocks_resume() {
        let start = Instant::now();
        let mut rotation = RotationController::new(true, DELAY);
        rotation.handle(RotationEvent::InteractionStart, start);
        rotation.handle(RotationEvent::InteractionEnd, start);
        rotation.handle(RotationEvent::ButtonToggle, start);
        rotation.handle(RotationEvent::ButtonToggle, start);
        assert_eq!(rotation.state(), RotationState::PausedByUser);
        assert_eq!(rotation.pending_timers(), 0);

        rotation.poll(start + DELAY * 2);
        assert_eq!(rotation.state(), RotationState::PausedByUser);
    }

    #[test]
    fn test_unmount_cancels_and_freezes() {
        let start = Instant::now();
        let mut rotation = RotationController::new(true, DELAY);
        rotation.handle(RotationEvent::InteractionStart, start);
        rotation.handle(RotationEvent::InteractionEnd, start);
        rotation.unmount();
        assert!(rotation.is_torn_down());
        assert_eq!(rotation.pending_timers(), 0);

        rotation.poll(start + DELAY * 2);
        rotation.handle(RotationEvent::ButtonToggle, start);
        assert!(!rotation.is_rotating());
    }

    #[test]
    fn test_starts_paused_when_auto_rotate_disabled() {
        let rotation = RotationController::new(false, DELAY);
        assert_eq!(rotation.state(), RotationState::PausedByUser);
    }

    #[test]
    fn test_take_due_orders_by_deadline() {
        let now = Instant::now();
        let mut timers = ResumeTimers::default();
        timers.schedule(TimerHandle(1), now + Duration::from_secs(2));
        timers.schedule(TimerHandle(2), now + Duration::from_secs(1));
        timers.schedule(TimerHandle(3), now + Duration::from_secs(9));
        assert_eq!(
            timers.take_due(now + Duration::from_secs(5)),
            vec![TimerHandle(2), TimerHandle(1)]
        );
        assert_eq!(timers.len(), 1);
        assert!(timers.cancel(TimerHandle(3)));
        assert!(!timers.cancel(TimerHandle(3)));
        assert!(timers.is_empty());
    }
}
