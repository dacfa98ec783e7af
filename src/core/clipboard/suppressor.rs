use std::time::{Duration, Instant};

/// Keeps the watcher from reading the engine's own clipboard writes back as
/// new copies.
///
/// Two independent guards: a deadline that blocks ticks until it passes, and
/// a one-shot flag that swallows exactly the next tick whatever the time.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteSuppressor {
    deadline: Option<Instant>,
    just_wrote: bool,
}

impl WriteSuppressor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block ticks until `now + duration`
    pub fn arm(&mut self, duration: Duration, now: Instant) {
        self.deadline = Some(now + duration);
    }

    /// Swallow the very next tick
    pub fn mark_self_write(&mut self) {
        self.just_wrote = true;
    }

    pub fn is_suppressed(&self, now: Instant) -> bool {
        matches!(self.deadline, Some(deadline) if now < deadline)
    }

    /// Whether the current tick must be skipped. Always consumes the one-shot flag.
    pub fn should_skip(&mut self, now: Instant) -> bool {
        let just_wrote = std::mem::take(&mut self.just_wrote);
        just_wrote || self.is_suppressed(now)
    }

    pub fn disarm(&mut self) {
        *self = Self::default();
    }
}
