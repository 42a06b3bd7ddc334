use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// Business calendar used to derive "today" and other date-only values.
///
/// Due dates are calendar dates. Both sides of every due-date comparison go
/// through the same offset, so an instant late in the evening UTC never
/// lands on the wrong local day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessCalendar {
    offset: FixedOffset,
}

impl BusinessCalendar {
    /// Calendar at a fixed offset from UTC, in minutes
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(|offset| Self { offset })
    }

    pub fn utc() -> Self {
        Self {
            offset: FixedOffset::east_opt(0).expect("zero offset is valid"),
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Local calendar date of a UTC instant
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    pub fn today(&self) -> NaiveDate {
        self.local_date(Utc::now())
    }
}

impl Default for BusinessCalendar {
    fn default() -> Self {
        Self::utc()
    }
}
