//! The "do not auto-hide right now" flag read by the panel visibility timer.
//!
//! ```text
//! Idle ──drag start / edit mode on──▶ Active ──drag end──▶ Grace ──deadline──▶ Idle
//!                                       ▲                    │
//!                                       └────drag start──────┘
//! ```
//!
//! Time is passed in by the caller, so nothing here owns a timer.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use super::types::FloatingId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuspensionState {
    Idle,
    Active,
    Grace,
}

/// The grace window opened by the last drag end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GraceWindow {
    Closed,
    Until(Instant),
    /// `now + grace` is not representable; held until the next drag starts.
    Unbounded,
}

#[derive(Debug)]
pub(super) struct SuspensionSignal {
    grace: Duration,
    drag_active: bool,
    edit_modes: BTreeSet<FloatingId>,
    grace_window: GraceWindow,
}

impl SuspensionSignal {
    pub(super) fn new(grace: Duration) -> Self {
        Self {
            grace,
            drag_active: false,
            edit_modes: BTreeSet::new(),
            grace_window: GraceWindow::Closed,
        }
    }

    pub(super) fn drag_started(&mut self) {
        self.drag_active = true;
        // A new drag during the grace window cancels the pending idle transition.
        self.grace_window = GraceWindow::Closed;
    }

    pub(super) fn drag_ended(&mut self, now: Instant) {
        if !self.drag_active {
            return;
        }
        self.drag_active = false;
        self.grace_window = match now.checked_add(self.grace) {
            Some(until) => GraceWindow::Until(until),
            None => {
                log::warn!("suspension grace {:?} overflows the clock; holding", self.grace);
                GraceWindow::Unbounded
            }
        };
    }

    /// Returns `true` if the edit-mode set changed.
    pub(super) fn set_edit_mode(&mut self, floating: FloatingId, editing: bool) -> bool {
        if editing {
            self.edit_modes.insert(floating)
        } else {
            self.edit_modes.remove(&floating)
        }
    }

    pub(super) fn is_editing(&self, floating: FloatingId) -> bool {
        self.edit_modes.contains(&floating)
    }

    pub(super) fn state(&self, now: Instant) -> SuspensionState {
        if self.drag_active || !self.edit_modes.is_empty() {
            SuspensionState::Active
        } else if self.in_grace(now) {
            SuspensionState::Grace
        } else {
            SuspensionState::Idle
        }
    }

    pub(super) fn is_suspended(&self, now: Instant) -> bool {
        self.state(now) != SuspensionState::Idle
    }

    fn in_grace(&self, now: Instant) -> bool {
        match self.grace_window {
            GraceWindow::Closed => false,
            GraceWindow::Until(until) => now < until,
            GraceWindow::Unbounded => true,
        }
    }

    /// When the current grace window closes, if one is pending and bounded.
    pub(super) fn grace_deadline(&self) -> Option<Instant> {
        match self.grace_window {
            GraceWindow::Until(until) => Some(until),
            GraceWindow::Closed | GraceWindow::Unbounded => None,
        }
    }

    /// Forget an elapsed grace deadline. Returns `true` if one was dropped.
    pub(super) fn expire(&mut self, now: Instant) -> bool {
        match self.grace_window {
            GraceWindow::Until(until) if now >= until => {
                self.grace_window = GraceWindow::Closed;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRACE: Duration = Duration::from_millis(300);

    #[test]
    fn idle_active_grace_idle() {
        let t0 = Instant::now();
        let mut s = SuspensionSignal::new(GRACE);
        assert_eq!(s.state(t0), SuspensionState::Idle);

        s.drag_started();
        assert_eq!(s.state(t0), SuspensionState::Active);

        s.drag_ended(t0);
        assert_eq!(s.state(t0), SuspensionState::Grace);
        assert_eq!(s.state(t0 + Duration::from_millis(299)), SuspensionState::Grace);
        assert_eq!(s.state(t0 + GRACE), SuspensionState::Idle);
    }

    #[test]
    fn drag_during_grace_returns_to_active() {
        let t0 = Instant::now();
        let mut s = SuspensionSignal::new(GRACE);
        s.drag_started();
        s.drag_ended(t0);

        s.drag_started();
        assert_eq!(s.state(t0 + Duration::from_secs(5)), SuspensionState::Active);
        assert_eq!(s.grace_deadline(), None);

        let t1 = t0 + Duration::from_secs(5);
        s.drag_ended(t1);
        assert_eq!(s.state(t1 + Duration::from_millis(100)), SuspensionState::Grace);
    }

    #[test]
    fn edit_mode_holds_active_past_grace() {
        let t0 = Instant::now();
        let mut s = SuspensionSignal::new(GRACE);
        assert!(s.set_edit_mode(7, true));
        assert!(!s.set_edit_mode(7, true));
        assert_eq!(s.state(t0), SuspensionState::Active);

        s.drag_started();
        s.drag_ended(t0);
        assert_eq!(s.state(t0 + Duration::from_secs(1)), SuspensionState::Active);

        assert!(s.set_edit_mode(7, false));
        assert_eq!(s.state(t0 + Duration::from_secs(1)), SuspensionState::Idle);
    }

    #[test]
    fn drag_end_without_drag_does_not_open_grace() {
        let t0 = Instant::now();
        let mut s = SuspensionSignal::new(GRACE);
        s.drag_ended(t0);
        assert_eq!(s.state(t0), SuspensionState::Idle);
        assert_eq!(s.grace_deadline(), None);
    }

    #[test]
    fn expire_drops_only_elapsed_deadlines() {
        let t0 = Instant::now();
        let mut s = SuspensionSignal::new(GRACE);
        s.drag_started();
        s.drag_ended(t0);
        assert!(!s.expire(t0 + Duration::from_millis(10)));
        assert!(s.expire(t0 + GRACE));
        assert_eq!(s.grace_deadline(), None);
    }

    #[test]
    fn overflowing_grace_holds_until_next_drag() {
        let t0 = Instant::now();
        let mut s = SuspensionSignal::new(Duration::MAX);
        s.drag_started();
        s.drag_ended(t0);
        assert_eq!(s.state(t0 + Duration::from_secs(3600)), SuspensionState::Grace);
        assert_eq!(s.grace_deadline(), None);
        assert!(!s.expire(t0 + Duration::from_secs(3600)));

        s.drag_started();
        assert_eq!(s.state(t0), SuspensionState::Active);
        s.drag_ended(t0);
        assert_eq!(s.state(t0), SuspensionState::Grace);
    }
}
