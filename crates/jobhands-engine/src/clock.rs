//! Time source for fire-time computation.

use chrono::{DateTime, Utc};
#[cfg(test)]
use chrono::TimeDelta;

/// Where the engine reads "now" from.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Clock {
    /// Wall clock.
    System,
    /// Wall time at creation advanced by the tokio clock, so paused test
    /// time drives scheduling.
    #[cfg(test)]
    Tokio {
        origin: DateTime<Utc>,
        started: tokio::time::Instant,
    },
}

impl Clock {
    #[cfg(test)]
    pub(crate) fn tokio() -> Self {
        Clock::Tokio {
            origin: Utc::now(),
            started: tokio::time::Instant::now(),
        }
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            #[cfg(test)]
            Clock::Tokio { origin, started } => TimeDelta::from_std(started.elapsed())
                .ok()
                .and_then(|elapsed| origin.checked_add_signed(elapsed))
                .unwrap_or(*origin),
        }
    }
}
