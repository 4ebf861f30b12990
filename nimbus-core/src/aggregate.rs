//! Collapses the raw forecast series into the hourly and daily views.

use std::{collections::HashMap, fmt};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::model::{DailyPoint, ForecastSample, HourlyPoint, round_temp};

/// Number of samples shown in the short-term view.
pub const HOURLY_POINTS: usize = 6;

/// First [`HOURLY_POINTS`] samples projected into `tz` with an `HH:MM` label.
pub fn summarize_hourly<Tz>(samples: &[ForecastSample], tz: &Tz) -> Vec<HourlyPoint>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    samples
        .iter()
        .take(HOURLY_POINTS)
        .map(|sample| HourlyPoint {
            timestamp: sample.timestamp,
            time: local_time(sample.timestamp, tz)
                .map(|dt| dt.format("%H:%M").to_string())
                .unwrap_or_default(),
            temperature: round_temp(sample.temperature),
            description: sample.description.clone(),
            icon: sample.icon.clone(),
        })
        .collect()
}

/// One point per calendar day of `tz`, in first-seen order.
///
/// Input must be ascending by timestamp. The first sample of a day seeds the
/// representative temperature, description and icon; later samples of the
/// same day only widen `temp_min`/`temp_max`.
pub fn summarize_daily<Tz>(samples: &[ForecastSample], tz: &Tz) -> Vec<DailyPoint>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut order: Vec<NaiveDate> = Vec::new();
    let mut days: HashMap<NaiveDate, DailyPoint> = HashMap::new();

    for sample in samples {
        let Some(local) = local_time(sample.timestamp, tz) else {
            tracing::warn!(timestamp = sample.timestamp, "Skipping forecast sample with out-of-range timestamp");
            continue;
        };
        let day = local.date_naive();
        let temp_min = round_temp(sample.temp_min);
        let temp_max = round_temp(sample.temp_max);

        match days.get_mut(&day) {
            Some(point) => {
                point.temp_min = point.temp_min.min(temp_min);
                point.temp_max = point.temp_max.max(temp_max);
            }
            None => {
                order.push(day);
                days.insert(
                    day,
                    DailyPoint {
                        day,
                        label: local.format("%a").to_string(),
                        temperature: round_temp(sample.temperature),
                        temp_min,
                        temp_max,
                        description: sample.description.clone(),
                        icon: sample.icon.clone(),
                    },
                );
            }
        }
    }

    order.into_iter().filter_map(|day| days.remove(&day)).collect()
}

fn local_time<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> Option<DateTime<Tz>> {
    DateTime::<Utc>::from_timestamp(timestamp, 0).map(|utc| utc.with_timezone(tz))
}
