pub mod core;

use chrono::{DateTime, Utc};

use crate::domain::Clock;

/// システム時計
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
