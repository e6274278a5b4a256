//! Contact debouncer.
//!
//! A new position is accepted only after `required` consecutive samples
//! agree on it AND it has persisted for at least `min_stable_ms` since the
//! first of those samples (`0` disables the duration check).  Any sample
//! that disagrees with the candidate restarts the count, so a single
//! flicker against N−1 stable readings never changes the accepted value.

use super::ContactPosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Candidate {
    position: ContactPosition,
    count: u8,
    since_ms: u64,
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    required: u8,
    min_stable_ms: u32,
    stable: Option<ContactPosition>,
    candidate: Option<Candidate>,
}

impl Debouncer {
    pub fn new(required: u8, min_stable_ms: u32) -> Self {
        Self {
            required: required.max(1),
            min_stable_ms,
            stable: None,
            candidate: None,
        }
    }

    /// Accept `position` as stable without debouncing (startup reading).
    pub fn seed(&mut self, position: ContactPosition) {
        self.stable = Some(position);
        self.candidate = None;
    }

    pub fn stable(&self) -> Option<ContactPosition> {
        self.stable
    }

    /// Feed one classified sample.  Returns the newly accepted position
    /// when, and only when, the stable value changes.
    pub fn feed(&mut self, position: ContactPosition, now_ms: u64) -> Option<ContactPosition> {
        if self.stable == Some(position) {
            self.candidate = None;
            return None;
        }

        let c = match self.candidate {
            Some(mut c) if c.position == position => {
                c.count = c.count.saturating_add(1);
                c
            }
            _ => Candidate {
                position,
                count: 1,
                since_ms: now_ms,
            },
        };

        let held_ms = now_ms.saturating_sub(c.since_ms);
        if c.count >= self.required && held_ms >= self.min_stable_ms as u64 {
            self.stable = Some(position);
            self.candidate = None;
            Some(position)
        } else {
            self.candidate = Some(c);
            None
        }
    }
}
