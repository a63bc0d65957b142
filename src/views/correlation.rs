//! Cross-stream alignment and correlation
//!
//! Streams are outer-joined on an alignment key derived from each row's
//! timestamp. The default key is the timestamp itself, so two records are
//! only aligned when logged in the same second. `Alignment::Bucket` floors
//! timestamps to fixed windows for a coarser join.

use crate::table::{Cell, Table};
use crate::types::StreamKind;
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// How rows from different streams are matched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Alignment {
    /// Exact timestamp equality
    #[default]
    Exact,
    /// Timestamps floored to windows of `width_seconds`
    Bucket { width_seconds: i64 },
}

impl Alignment {
    pub fn key(&self, ts: NaiveDateTime) -> NaiveDateTime {
        match *self {
            Alignment::Bucket { width_seconds } if width_seconds > 0 => {
                let offset = ts.and_utc().timestamp().rem_euclid(width_seconds);
                ts - Duration::seconds(offset)
            }
            _ => ts,
        }
    }
}

/// One row of the joined table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedRow {
    pub key: NaiveDateTime,
    /// One value per joined column; `None` where the stream had no row
    pub values: Vec<Option<f64>>,
}

/// Correlation between two joined columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationPair {
    pub left: String,
    pub right: String,
    /// Rows where both values are present
    pub n: usize,
    /// Pearson coefficient; `None` below two aligned rows or with zero variance
    pub coefficient: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationView {
    pub alignment: Alignment,
    /// Joined column names, `<stream>.<field>`
    pub columns: Vec<String>,
    pub rows: Vec<JoinedRow>,
    pub pairs: Vec<CorrelationPair>,
    /// Streams left out for having no numeric column
    pub skipped_streams: Vec<StreamKind>,
}

struct Participant {
    numeric: Vec<usize>,
    by_key: BTreeMap<NaiveDateTime, Vec<Vec<Option<f64>>>>,
}

/// Outer-join the numeric columns of several streams and correlate each pair.
///
/// Keys present in only some streams produce rows with `None` on the other
/// side. Several rows of one stream sharing a key multiply out against the
/// rows of the other streams at that key.
pub fn correlate(tables: &[&Table], alignment: Alignment) -> CorrelationView {
    let mut columns = Vec::new();
    let mut participants = Vec::new();
    let mut skipped_streams = Vec::new();

    for table in tables {
        let numeric = table.numeric_columns();
        let Some(ts_idx) = table.timestamp_index() else {
            skipped_streams.push(table.stream);
            continue;
        };
        if numeric.is_empty() {
            skipped_streams.push(table.stream);
            continue;
        }

        let mut by_key: BTreeMap<NaiveDateTime, Vec<Vec<Option<f64>>>> = BTreeMap::new();
        for row in &table.rows {
            let Some(ts) = row.get(ts_idx).and_then(Cell::as_timestamp) else {
                continue;
            };
            let values = numeric
                .iter()
                .map(|&i| row.get(i).and_then(Cell::as_f64))
                .collect();
            by_key.entry(alignment.key(ts)).or_default().push(values);
        }

        columns.extend(
            numeric
                .iter()
                .map(|&i| format!("{}.{}", table.stream, table.columns[i].name)),
        );
        participants.push(Participant { numeric, by_key });
    }

    let keys: BTreeSet<NaiveDateTime> = participants
        .iter()
        .flat_map(|p| p.by_key.keys().copied())
        .collect();

    let mut rows = Vec::new();
    for key in keys {
        let mut partials: Vec<Vec<Option<f64>>> = vec![Vec::new()];
        for participant in &participants {
            let missing = [vec![None; participant.numeric.len()]];
            let matches = participant
                .by_key
                .get(&key)
                .map(Vec::as_slice)
                .unwrap_or(&missing[..]);

            partials = partials
                .iter()
                .flat_map(|prefix| {
                    matches.iter().map(move |values| {
                        let mut joined = prefix.clone();
                        joined.extend(values.iter().copied());
                        joined
                    })
                })
                .collect();
        }
        rows.extend(partials.into_iter().map(|values| JoinedRow { key, values }));
    }

    let mut pairs = Vec::new();
    for left in 0..columns.len() {
        for right in (left + 1)..columns.len() {
            let aligned: Vec<(f64, f64)> = rows
                .iter()
                .filter_map(|row| Some((row.values[left]?, row.values[right]?)))
                .collect();
            pairs.push(CorrelationPair {
                left: columns[left].clone(),
                right: columns[right].clone(),
                n: aligned.len(),
                coefficient: pearson(&aligned),
            });
        }
    }

    CorrelationView {
        alignment,
        columns,
        rows,
        pairs,
        skipped_streams,
    }
}

/// Pearson correlation of paired samples
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::test_support::table;
    use pretty_assertions::assert_eq;

    const SYMPTOMS: &str = "timestamp,symptom_type,severity,notes\n\
        2024-01-01 09:00:00,Headache,3,\n\
        2024-01-01 12:00:00,Nausea,6,\n\
        2024-01-01 18:00:00,Fatigue,8,\n";

    #[test]
    fn test_disjoint_timestamps_never_align() {
        let symptoms = table(StreamKind::Symptoms, SYMPTOMS);
        let emotions = table(
            StreamKind::Emotions,
            "timestamp,emotion_type,severity,notes\n\
             2024-01-01 09:00:01,Anxious,4,\n\
             2024-01-01 12:00:01,Bored,2,\n",
        );

        let view = correlate(&[&symptoms, &emotions], Alignment::Exact);
        assert_eq!(view.columns, vec!["symptoms.severity", "emotions.severity"]);
        assert_eq!(view.rows.len(), 5);
        for row in &view.rows {
            assert_eq!(row.values.iter().filter(|v| v.is_none()).count(), 1);
        }
        assert_eq!(view.pairs.len(), 1);
        assert_eq!(view.pairs[0].n, 0);
        assert_eq!(view.pairs[0].coefficient, None);
    }

    #[test]
    fn test_bucket_alignment_joins_nearby_rows() {
        let symptoms = table(StreamKind::Symptoms, SYMPTOMS);
        let emotions = table(
            StreamKind::Emotions,
            "timestamp,emotion_type,severity,notes\n\
             2024-01-01 09:10:00,Anxious,2,\n\
             2024-01-01 12:20:00,Overwhelmed,5,\n\
             2024-01-01 18:05:00,Depressed,9,\n",
        );

        let view = correlate(
            &[&symptoms, &emotions],
            Alignment::Bucket { width_seconds: 3600 },
        );
        assert_eq!(view.rows.len(), 3);
        assert_eq!(view.pairs[0].n, 3);
        let r = view.pairs[0].coefficient.unwrap();
        assert!(r > 0.95, "expected strong positive correlation, got {r}");
    }

    #[test]
    fn test_shared_key_multiplies_out() {
        let symptoms = table(
            StreamKind::Symptoms,
            "timestamp,symptom_type,severity,notes\n\
             2024-01-01 09:00:00,Headache,3,\n\
             2024-01-01 09:00:00,Nausea,5,\n",
        );
        let emotions = table(
            StreamKind::Emotions,
            "timestamp,emotion_type,severity,notes\n\
             2024-01-01 09:00:00,Anxious,4,\n\
             2024-01-01 09:00:00,Bored,1,\n",
        );
        let meals = Table::empty(StreamKind::Meals);

        let view = correlate(&[&symptoms, &meals, &emotions], Alignment::Exact);
        assert_eq!(view.skipped_streams, vec![StreamKind::Meals]);
        assert_eq!(view.rows.len(), 4);
        assert_eq!(
            view.rows.iter().map(|r| r.values.clone()).collect::<Vec<_>>(),
            vec![
                vec![Some(3.0), Some(4.0)],
                vec![Some(3.0), Some(1.0)],
                vec![Some(5.0), Some(4.0)],
                vec![Some(5.0), Some(1.0)],
            ]
        );
        // x and y vary independently across the product
        assert_eq!(view.pairs[0].coefficient, Some(0.0));
    }

    #[test]
    fn test_pearson_edge_cases() {
        assert_eq!(pearson(&[]), None);
        assert_eq!(pearson(&[(1.0, 2.0)]), None);
        assert_eq!(pearson(&[(1.0, 2.0), (1.0, 5.0)]), None);
        let r = pearson(&[(1.0, 10.0), (2.0, 8.0), (3.0, 6.0)]).unwrap();
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_bucket_key_floors() {
        let ts = NaiveDateTime::parse_from_str("2024-01-01 09:59:59", "%Y-%m-%d %H:%M:%S").unwrap();
        let key = Alignment::Bucket { width_seconds: 1800 }.key(ts);
        assert_eq!(key.to_string(), "2024-01-01 09:30:00");
        assert_eq!(Alignment::Exact.key(ts), ts);
    }
}
