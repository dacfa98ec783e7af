use chrono::{DateTime, Utc};
use std::time::Instant;

use crate::core::clipboard::backend::Clock;

/// The real clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }
}
