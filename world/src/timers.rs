//! Delayed completion callbacks for characters that have nothing to execute.

use std::time::Duration;

use tactics_core::CharacterId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingTimer {
    character: CharacterId,
    remaining: Duration,
}

/// Fire-and-forget timers keyed by character, advanced by simulation time.
#[derive(Clone, Debug, Default)]
pub(crate) struct TimerQueue {
    pending: Vec<PendingTimer>,
}

impl TimerQueue {
    /// Schedules a timer for `character`, replacing any earlier one.
    pub(crate) fn schedule(&mut self, character: CharacterId, delay: Duration) {
        self.pending.retain(|timer| timer.character != character);
        self.pending.push(PendingTimer {
            character,
            remaining: delay,
        });
    }

    /// Drops every pending timer.
    pub(crate) fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    /// Advances every timer by `dt` and returns the characters whose timers
    /// expired, in scheduling order.
    pub(crate) fn advance(&mut self, dt: Duration) -> Vec<CharacterId> {
        let mut fired = Vec::new();
        self.pending.retain_mut(|timer| {
            timer.remaining = timer.remaining.saturating_sub(dt);
            if timer.remaining.is_zero() {
                fired.push(timer.character);
                false
            } else {
                true
            }
        });
        fired
    }
}
