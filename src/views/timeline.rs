use crate::table::Table;
use crate::types::StreamKind;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimePoint {
    pub timestamp: NaiveDateTime,
    /// Records logged at or before `timestamp`
    pub cumulative_count: usize,
}

/// Cumulative record count over time for one stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSeries {
    pub stream: StreamKind,
    pub points: Vec<TimePoint>,
}

/// One cumulative series per table, in chronological order.
///
/// Records sharing a timestamp collapse into a single point. Streams are
/// independent: no points are added to line one series up with another.
pub fn time_series(tables: &[&Table]) -> Vec<TimeSeries> {
    tables
        .iter()
        .map(|table| {
            let mut stamps = table.timestamps();
            stamps.sort();

            let mut points: Vec<TimePoint> = Vec::new();
            for (i, timestamp) in stamps.into_iter().enumerate() {
                match points.last_mut() {
                    Some(last) if last.timestamp == timestamp => last.cumulative_count = i + 1,
                    _ => points.push(TimePoint {
                        timestamp,
                        cumulative_count: i + 1,
                    }),
                }
            }

            TimeSeries {
                stream: table.stream,
                points,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: usize,
}

/// Records per calendar day, oldest first
pub fn daily_counts(table: &Table) -> Vec<DailyCount> {
    let mut days: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for ts in table.timestamps() {
        *days.entry(ts.date()).or_default() += 1;
    }
    days.into_iter()
        .map(|(date, count)| DailyCount { date, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::test_support::table;
    use pretty_assertions::assert_eq;

    fn ts(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_time_series_sorted_and_cumulative() {
        // Rows out of order, two at the same instant
        let symptoms = table(
            StreamKind::Symptoms,
            "timestamp,symptom_type,severity,notes\n\
             2024-01-02 09:00:00,Headache,3,\n\
             2024-01-01 09:00:00,Nausea,5,\n\
             2024-01-02 09:00:00,Fatigue,2,\n",
        );
        let emotions = Table::empty(StreamKind::Emotions);

        let series = time_series(&[&symptoms, &emotions]);
        assert_eq!(series.len(), 2);
        assert_eq!(
            series[0].points,
            vec![
                TimePoint {
                    timestamp: ts("2024-01-01 09:00:00"),
                    cumulative_count: 1
                },
                TimePoint {
                    timestamp: ts("2024-01-02 09:00:00"),
                    cumulative_count: 3
                },
            ]
        );
        assert_eq!(series[1].stream, StreamKind::Emotions);
        assert!(series[1].points.is_empty());
    }

    #[test]
    fn test_daily_counts() {
        let meals = table(
            StreamKind::Meals,
            "timestamp,meal_type,food_consumed,optional_notes\n\
             2024-01-02 08:00:00,Breakfast,eggs,\n\
             2024-01-01 19:00:00,Dinner,rice,\n\
             2024-01-02 12:00:00,Lunch,soup,\n",
        );
        let days = daily_counts(&meals);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].count, 1);
        assert_eq!(days[1].count, 2);
        assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }
}
