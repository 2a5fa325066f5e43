//! Calendar-day boundaries between message timestamps.

use chrono::{DateTime, Datelike, FixedOffset, Offset, Utc};

/// Decides whether two timestamps share a calendar day and renders the
/// divider shown between days. The divider text is opaque to the feed.
pub trait DayBoundary {
    fn is_same_day(&self, ts_a: i64, ts_b: i64) -> bool;
    fn format_divider(&self, ts_earlier: i64, ts_later: i64) -> String;
}

/// Calendar days in a fixed UTC offset.
#[derive(Clone, Copy, Debug)]
pub struct CalendarDays {
    offset: FixedOffset,
}

impl Default for CalendarDays {
    fn default() -> Self {
        Self::utc()
    }
}

impl CalendarDays {
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    pub fn with_offset(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Use the host's current local offset.
    pub fn local() -> Self {
        Self {
            offset: *chrono::Local::now().offset(),
        }
    }

    fn to_local(&self, ts: i64) -> Option<DateTime<FixedOffset>> {
        match DateTime::<Utc>::from_timestamp(ts, 0) {
            Some(dt) => Some(dt.with_timezone(&self.offset)),
            None => {
                tracing::warn!(
                    timestamp = ts,
                    "timestamp is outside the representable calendar"
                );
                None
            }
        }
    }
}

impl DayBoundary for CalendarDays {
    fn is_same_day(&self, ts_a: i64, ts_b: i64) -> bool {
        match (self.to_local(ts_a), self.to_local(ts_b)) {
            (Some(a), Some(b)) => a.date_naive() == b.date_naive(),
            // Unreadable timestamps never introduce a day break
            _ => true,
        }
    }

    fn format_divider(&self, ts_earlier: i64, ts_later: i64) -> String {
        let Some(later) = self.to_local(ts_later) else {
            return String::new();
        };
        let same_year = self
            .to_local(ts_earlier)
            .is_some_and(|earlier| earlier.year() == later.year());
        if same_year {
            later.format("%b %-d").to_string()
        } else {
            later.format("%b %-d, %Y").to_string()
        }
    }
}
