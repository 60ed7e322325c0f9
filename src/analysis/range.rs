//! Time windows and trend buckets for each dashboard range.

use crate::models::TimeRange;
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};

/// Half-open time window `[start, end)`. A missing start means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: Option<DateTime<Utc>>,
    pub end: DateTime<Utc>,
}

impl Window {
    /// Whether a submission time falls in the window.
    ///
    /// Windows without a start accept undated reviews and anything before `end`.
    pub fn contains(&self, at: Option<DateTime<Utc>>) -> bool {
        match self.start {
            None => at.map_or(true, |at| at < self.end),
            Some(start) => matches!(at, Some(at) if at >= start && at < self.end),
        }
    }

    /// The window of equal length immediately before this one.
    pub fn previous(&self) -> Option<Window> {
        let start = self.start?;
        let span = self.end - start;
        Some(Window {
            start: Some(start - span),
            end: start,
        })
    }
}

/// Size of one trend bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Day,
    Week,
    Month,
}

impl TimeRange {
    pub fn granularity(&self) -> Granularity {
        match self {
            TimeRange::Last7Days | TimeRange::Last30Days => Granularity::Day,
            TimeRange::Last90Days => Granularity::Week,
            TimeRange::LastYear | TimeRange::AllTime => Granularity::Month,
        }
    }
}

/// One sub-period of a trend series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or_default()
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn months_between(from: NaiveDate, to: NaiveDate) -> u32 {
    let months = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    months.max(0) as u32
}

/// Split a range into trend buckets ending with the period containing `now`.
///
/// `earliest` is only consulted for `AllTime`, where the series starts at
/// the month of the oldest review. The last bucket never extends past the
/// end of today, so buckets cover exactly the range's window.
pub fn buckets(range: TimeRange, now: DateTime<Utc>, earliest: Option<DateTime<Utc>>) -> Vec<Bucket> {
    let today = now.date_naive();
    let tomorrow = midnight(today + Duration::days(1));

    let day_buckets = |count: i64, days: i64, weekly: bool| -> Vec<Bucket> {
        (0..count)
            .map(|i| {
                let first_day = today - Duration::days((count - i) * days - 1);
                let start = midnight(first_day);
                let label = if weekly {
                    format!("Week of {}", first_day.format("%b %d"))
                } else {
                    first_day.format("%b %d").to_string()
                };
                Bucket {
                    label,
                    start,
                    end: start + Duration::days(days),
                }
            })
            .collect()
    };

    let month_buckets = |count: u32| -> Vec<Bucket> {
        let current = first_of_month(today);
        (0..count)
            .rev()
            .filter_map(|back| {
                let first = current.checked_sub_months(Months::new(back))?;
                let next = first.checked_add_months(Months::new(1))?;
                Some(Bucket {
                    label: first.format("%b %Y").to_string(),
                    start: midnight(first),
                    end: midnight(next).min(tomorrow),
                })
            })
            .collect()
    };

    match range {
        TimeRange::Last7Days => day_buckets(7, 1, false),
        TimeRange::Last30Days => day_buckets(30, 1, false),
        TimeRange::Last90Days => day_buckets(13, 7, true),
        TimeRange::LastYear => month_buckets(12),
        TimeRange::AllTime => {
            let count = earliest
                .map(|at| months_between(first_of_month(at.date_naive()), first_of_month(today)) + 1)
                .unwrap_or(1)
                .max(1);
            month_buckets(count)
        }
    }
}

/// The window a range covers, aligned with its buckets.
pub fn window(range: TimeRange, now: DateTime<Utc>) -> Window {
    let end = midnight(now.date_naive() + Duration::days(1));
    let start = match range {
        TimeRange::AllTime => None,
        other => buckets(other, now, None).first().map(|b| b.start),
    };
    Window { start, end }
}
