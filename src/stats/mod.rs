use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Timestamp format the Graph API uses for `created_time`.
const GRAPH_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Minute-resolution histogram of comment creation times.
///
/// Buckets are aligned to the Unix epoch, so any width that divides 24
/// hours also aligns with day boundaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeries {
    counts: BTreeMap<DateTime<Utc>, u64>,
}

/// The four time scales a report is made of, each an ordered sequence of
/// (bucket start, comment count).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// The focus day divided into fixed-width minute slices, trailing
    /// midnight included.
    pub focus_day: Vec<(DateTime<Utc>, u64)>,
    /// One bucket per day, `days` before through `days` after the focus.
    pub surrounding_days: Vec<(DateTime<Utc>, u64)>,
    /// One bucket per calendar month, oldest through newest data.
    pub monthly: Vec<(DateTime<Utc>, u64)>,
    /// One bucket per calendar year, oldest through newest data.
    pub yearly: Vec<(DateTime<Utc>, u64)>,
}

fn floor_to_step(ts: DateTime<Utc>, step: Duration) -> DateTime<Utc> {
    let rem = ts.timestamp().rem_euclid(step.num_seconds());
    ts - Duration::seconds(rem) - Duration::nanoseconds(ts.timestamp_subsec_nanos() as i64)
}

fn day_start(ts: DateTime<Utc>) -> DateTime<Utc> {
    floor_to_step(ts, Duration::days(1))
}

fn month_start(ts: DateTime<Utc>) -> DateTime<Utc> {
    day_start(ts) - Duration::days(ts.day0() as i64)
}

fn year_start(ts: DateTime<Utc>) -> DateTime<Utc> {
    day_start(ts) - Duration::days(ts.ordinal0() as i64)
}

impl TimeSeries {
    /// Build the histogram from Graph `created_time` strings.
    pub fn from_created_times<I, S>(times: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts = BTreeMap::new();

        for raw in times {
            let raw = raw.as_ref();
            let ts = DateTime::parse_from_str(raw, GRAPH_TIME_FORMAT)
                .with_context(|| format!("Invalid comment timestamp: {}", raw))?
                .with_timezone(&Utc);
            let minute = floor_to_step(ts, Duration::minutes(1));
            *counts.entry(minute).or_insert(0) += 1;
        }

        Ok(TimeSeries { counts })
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    fn total_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
        self.counts.range(from..to).map(|(_, count)| count).sum()
    }

    /// Aggregate the histogram at the four report scales around `focus`.
    ///
    /// The focus-day sequence covers midnight through the next midnight
    /// inclusive; the trailing bucket counts events in the first slice of
    /// the following day.
    pub fn summarize(&self, focus: DateTime<Utc>, days: u32, minutes: u32) -> Summary {
        let step = Duration::minutes(i64::from(minutes));
        let day = day_start(focus);
        let day_end = day + Duration::days(1);

        let mut focus_day = Vec::new();
        let mut slot = day;
        while slot <= day_end {
            focus_day.push((slot, self.total_between(slot, slot + step)));
            slot = slot + step;
        }

        let mut surrounding_days = Vec::new();
        let last = day + Duration::days(i64::from(days));
        let mut current = day - Duration::days(i64::from(days));
        while current <= last {
            let next = current + Duration::days(1);
            surrounding_days.push((current, self.total_between(current, next)));
            current = next;
        }

        let monthly = self.calendar_totals(month_start, Months::new(1));
        let yearly = self.calendar_totals(year_start, Months::new(12));

        Summary {
            focus_day,
            surrounding_days,
            monthly,
            yearly,
        }
    }

    /// Zero-filled totals per calendar unit between the oldest and the
    /// newest stored timestamp.
    fn calendar_totals(
        &self,
        bucket_of: fn(DateTime<Utc>) -> DateTime<Utc>,
        width: Months,
    ) -> Vec<(DateTime<Utc>, u64)> {
        let (Some((&first, _)), Some((&last, _))) =
            (self.counts.first_key_value(), self.counts.last_key_value())
        else {
            return Vec::new();
        };

        let mut totals = Vec::new();
        let mut bucket = bucket_of(first);
        let end = bucket_of(last);
        while bucket <= end {
            let next = bucket + width;
            totals.push((bucket, self.total_between(bucket, next)));
            bucket = next;
        }

        totals
    }

    /// Serialize the histogram for later offline analysis.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create export file {}", path.display()))?;
        serde_json::to_writer(BufWriter::new(file), self).context("Failed to serialize data")?;
        Ok(())
    }

    /// Restore a histogram previously written by [`TimeSeries::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open data file {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse data file {}", path.display()))
    }
}
