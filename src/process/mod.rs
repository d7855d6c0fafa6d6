use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::fetch::RawRecord;

/// Rows in the trailing window of the positivity-rate smoothing.
pub const ROLLING_WINDOW: usize = 7;

/// One working row of the pipeline frame. `normalize` renames the source
/// feed's columns onto these fields (`fecha` → date, `total` → daily
/// change, `positivos` → positive); `positive_rate` stays unset until the
/// rolling stage fills it.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub date: NaiveDate,
    pub daily_change: i64,
    pub positive: i64,
    pub positive_rate: Option<f64>,
}

pub type Frame = Vec<MetricRow>;

/// A named pure transform. Each stage consumes the previous stage's frame
/// and returns a fresh one.
pub type Stage = (&'static str, fn(Frame) -> Frame);

/// The metric stages, in the order they run.
pub const METRIC_STAGES: &[Stage] = &[
    ("filter_pre_2020", filter_pre_2020),
    ("sum_by_date", sum_by_date),
    ("rolling_positive_rate", rolling_positive_rate),
    ("drop_nonpositive", drop_nonpositive),
];

/// Map raw feed rows onto the canonical column names.
pub fn normalize(records: Vec<RawRecord>) -> Frame {
    records
        .into_iter()
        .map(|r| MetricRow {
            date: r.date,
            daily_change: r.total,
            positive: r.positives,
            positive_rate: None,
        })
        .collect()
}

/// Run the given stages in order, logging row counts per stage.
pub fn run_stages(mut frame: Frame, stages: &[Stage]) -> Frame {
    for &(name, stage) in stages {
        let rows_in = frame.len();
        frame = stage(frame);
        debug!(stage = name, rows_in, rows_out = frame.len(), "stage done");
    }
    frame
}

fn first_valid_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).expect("static date is valid")
}

/// Some labs occasionally submit rows mis-dated before the pandemic;
/// discard them before aggregation.
fn filter_pre_2020(frame: Frame) -> Frame {
    let cutoff = first_valid_date();
    frame.into_iter().filter(|row| row.date >= cutoff).collect()
}

/// Collapse the per-lab rows into one row per date, summing both counters.
/// The result is ordered by ascending date, which the rolling stage relies
/// on.
fn sum_by_date(frame: Frame) -> Frame {
    let mut groups: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
    for row in frame {
        let entry = groups.entry(row.date).or_insert((0, 0));
        entry.0 += row.daily_change;
        entry.1 += row.positive;
    }
    groups
        .into_iter()
        .map(|(date, (daily_change, positive))| MetricRow {
            date,
            daily_change,
            positive,
            positive_rate: None,
        })
        .collect()
}

/// Fill `positive_rate` with the ratio of two 7-row trailing sums, rounded
/// to 3 decimals. The window slides over row order, not calendar days, so
/// gaps in the feed widen the effective period rather than being filled.
/// Unset until the window is full and whenever the denominator sum is zero.
fn rolling_positive_rate(mut frame: Frame) -> Frame {
    let mut positives_sum: i64 = 0;
    let mut total_sum: i64 = 0;
    for i in 0..frame.len() {
        positives_sum += frame[i].positive;
        total_sum += frame[i].daily_change;
        if i >= ROLLING_WINDOW {
            positives_sum -= frame[i - ROLLING_WINDOW].positive;
            total_sum -= frame[i - ROLLING_WINDOW].daily_change;
        }
        if i + 1 >= ROLLING_WINDOW && total_sum != 0 {
            frame[i].positive_rate = Some(round3(positives_sum as f64 / total_sum as f64));
        }
    }
    frame
}

/// A non-positive daily total cannot support a rate; drop the row. Runs
/// after the rolling stage so the filter does not change which rows fall
/// inside each window.
fn drop_nonpositive(frame: Frame) -> Frame {
    frame.into_iter().filter(|row| row.daily_change > 0).collect()
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
