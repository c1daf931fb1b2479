//! Per-character animation state machine.

use std::time::Duration;

use gridsiege_core::AnimationState;

/// Frame-accurate animation state shared by every character.
///
/// Death is absorbing: once entered, no transition leaves it and the frame
/// index pins to the last frame of the clip.
#[derive(Clone, Debug)]
pub(crate) struct Animator {
    state: AnimationState,
    frame: u32,
    elapsed: Duration,
    finished: bool,
}

/// Observations collected while advancing an animator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct FrameReport {
    /// The attack clip entered its impact frame.
    pub(crate) impact: bool,
    /// An attack or hit clip played out and the character settled.
    pub(crate) concluded: bool,
    /// The death clip reached its last frame.
    pub(crate) removal_ready: bool,
}

impl Animator {
    pub(crate) fn new() -> Self {
        Self {
            state: AnimationState::Idle,
            frame: 0,
            elapsed: Duration::ZERO,
            finished: false,
        }
    }

    pub(crate) const fn state(&self) -> AnimationState {
        self.state
    }

    pub(crate) const fn frame(&self) -> u32 {
        self.frame
    }

    /// Enters `next`, resetting the frame and timer.
    ///
    /// Returns `false` without touching anything when already in `next`, when
    /// dying, or when a hit reaction tries to interrupt an attack.
    pub(crate) fn transition(&mut self, next: AnimationState) -> bool {
        if self.state.is_terminal() || self.state == next {
            return false;
        }
        if self.state == AnimationState::Attack && next == AnimationState::Hit {
            return false;
        }

        self.state = next;
        self.frame = 0;
        self.elapsed = Duration::ZERO;
        true
    }

    /// Advances the clip by `dt`.
    ///
    /// `frame_count` is the length of the current state's clip and
    /// `impact_frame` the attack frame on which damage resolves. `moving`
    /// decides whether a finished attack or hit falls back to running.
    pub(crate) fn advance(
        &mut self,
        dt: Duration,
        frame_count: u32,
        impact_frame: u32,
        moving: bool,
    ) -> FrameReport {
        let mut report = FrameReport::default();
        if self.finished {
            return report;
        }

        let frame_count = frame_count.max(1);
        let frame_duration = self.state.frame_duration();
        self.elapsed = self.elapsed.saturating_add(dt);

        while self.elapsed >= frame_duration {
            self.elapsed -= frame_duration;
            self.frame += 1;

            if self.frame < frame_count {
                if self.state == AnimationState::Attack && self.frame == impact_frame {
                    report.impact = true;
                }
                continue;
            }

            match self.state {
                AnimationState::Attack | AnimationState::Hit => {
                    let next = if moving {
                        AnimationState::Run
                    } else {
                        AnimationState::Idle
                    };
                    let _ = self.transition(next);
                    report.concluded = true;
                    break;
                }
                AnimationState::Death => {
                    self.frame = frame_count - 1;
                    self.elapsed = Duration::ZERO;
                    self.finished = true;
                    report.removal_ready = true;
                    break;
                }
                AnimationState::Idle | AnimationState::Run => self.frame = 0,
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(100);
    const FAST_FRAME: Duration = Duration::from_millis(60);

    #[test]
    fn entering_a_state_resets_frame_and_timer() {
        let mut animator = Animator::new();
        let _ = animator.advance(FRAME * 2, 4, 0, false);
        assert_eq!(animator.frame(), 2);

        assert!(animator.transition(AnimationState::Run));
        assert_eq!(animator.frame(), 0);
        let _ = animator.advance(FRAME / 2, 4, 0, false);
        assert_eq!(animator.frame(), 0);
    }

    #[test]
    fn repeated_state_does_not_reset() {
        let mut animator = Animator::new();
        assert!(animator.transition(AnimationState::Run));
        let _ = animator.advance(FRAME, 4, 0, true);
        assert!(!animator.transition(AnimationState::Run));
        assert_eq!(animator.frame(), 1);
    }

    #[test]
    fn hit_cannot_interrupt_attack() {
        let mut animator = Animator::new();
        assert!(animator.transition(AnimationState::Attack));
        assert!(!animator.transition(AnimationState::Hit));
        assert_eq!(animator.state(), AnimationState::Attack);
    }

    #[test]
    fn loops_wrap_back_to_first_frame() {
        let mut animator = Animator::new();
        let report = animator.advance(FRAME * 4, 4, 0, false);
        assert_eq!(animator.frame(), 0);
        assert_eq!(report, FrameReport::default());
    }

    #[test]
    fn impact_fires_once_on_the_designated_frame() {
        let mut animator = Animator::new();
        assert!(animator.transition(AnimationState::Attack));

        let mut impacts = Vec::new();
        for _ in 0..7 {
            let report = animator.advance(FAST_FRAME, 8, 6, false);
            impacts.push((animator.frame(), report.impact));
        }

        let fired: Vec<u32> = impacts
            .iter()
            .filter(|(_, impact)| *impact)
            .map(|(frame, _)| *frame)
            .collect();
        assert_eq!(fired, vec![6]);
    }

    #[test]
    fn finished_attack_settles_by_motion() {
        let mut idle = Animator::new();
        assert!(idle.transition(AnimationState::Attack));
        let report = idle.advance(FAST_FRAME * 4, 4, 2, false);
        assert!(report.concluded);
        assert_eq!(idle.state(), AnimationState::Idle);

        let mut running = Animator::new();
        assert!(running.transition(AnimationState::Hit));
        let report = running.advance(FAST_FRAME, 1, 2, true);
        assert!(report.concluded);
        assert_eq!(running.state(), AnimationState::Run);
    }

    #[test]
    fn death_is_absorbing_and_pins_last_frame() {
        let mut animator = Animator::new();
        assert!(animator.transition(AnimationState::Attack));
        assert!(animator.transition(AnimationState::Death));

        let first = animator.advance(FRAME * 3, 4, 0, false);
        assert!(!first.removal_ready);
        let second = animator.advance(FRAME * 10, 4, 0, false);
        assert!(second.removal_ready);
        assert_eq!(animator.frame(), 3);

        for next in [
            AnimationState::Idle,
            AnimationState::Run,
            AnimationState::Attack,
            AnimationState::Hit,
        ] {
            assert!(!animator.transition(next));
        }
        let third = animator.advance(FRAME * 10, 4, 0, false);
        assert_eq!(third, FrameReport::default());
        assert_eq!(animator.frame(), 3);
        assert_eq!(animator.state(), AnimationState::Death);
    }
}
