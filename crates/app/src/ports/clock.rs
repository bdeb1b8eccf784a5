//! Clock port.

use chrono::NaiveDateTime;

use stovepanel_domain::time::Timestamp;

/// Source of the current time.
///
/// Slot lookup works on the local wall clock of the house; deadlines and
/// debounce compare UTC instants.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;

    fn local_now(&self) -> NaiveDateTime;
}

/// Reads the system clock and time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        stovepanel_domain::time::now()
    }

    fn local_now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}
