//! A clock that never moves.

use busdesk_core::environment::Clock;
use chrono::{DateTime, NaiveDate, Utc};

/// Clock reporting one fixed instant.
///
/// ```
/// use busdesk_core::environment::Clock;
/// use busdesk_testing::FixedClock;
/// use chrono::NaiveDate;
///
/// let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap_or_default();
/// let clock = FixedClock::on(day);
/// assert_eq!(clock.now().date_naive(), day);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    time: DateTime<Utc>,
}

impl FixedClock {
    /// Clock stuck at `time`.
    #[must_use]
    pub const fn new(time: DateTime<Utc>) -> Self {
        Self { time }
    }

    /// Clock stuck at noon UTC on `date`, far from either midnight.
    #[must_use]
    pub fn on(date: NaiveDate) -> Self {
        Self::new(date.and_hms_opt(12, 0, 0).unwrap_or_default().and_utc())
    }

    /// The day this clock reports.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.time.date_naive()
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.time
    }
}

/// The shared default: 2025-01-01, 12:00 UTC.
#[must_use]
pub fn test_clock() -> FixedClock {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .map_or(FixedClock::new(DateTime::<Utc>::UNIX_EPOCH), FixedClock::on)
}
