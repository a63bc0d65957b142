use crate::schema::ColumnKind;
use crate::table::{Cell, Table};
use crate::types::StreamKind;
use crate::views::frequency::{value_counts, ValueCount};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::HashSet;

/// Descriptive statistics for one stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamSummary {
    pub stream: StreamKind,
    /// Number of records
    pub count: usize,
    pub columns: Vec<ColumnSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    #[serde(flatten)]
    pub stats: ColumnStats,
}

/// Per-column statistics, by column kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnStats {
    Timestamp {
        count: usize,
        first: Option<NaiveDateTime>,
        last: Option<NaiveDateTime>,
    },
    Categorical {
        count: usize,
        frequencies: Vec<ValueCount>,
    },
    Numeric(NumericSummary),
    Text {
        count: usize,
        distinct: usize,
    },
}

/// Count, mean, sample standard deviation and quartiles of a numeric column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub p25: Option<f64>,
    #[serde(rename = "50%")]
    pub p50: Option<f64>,
    #[serde(rename = "75%")]
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

impl NumericSummary {
    pub fn from_values(values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean = (count > 0).then(|| sorted.iter().sum::<f64>() / count as f64);
        let std = mean.filter(|_| count > 1).map(|m| {
            let ss: f64 = sorted.iter().map(|v| (v - m).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        });

        Self {
            count,
            mean,
            std,
            min: sorted.first().copied(),
            p25: quantile(&sorted, 0.25),
            p50: quantile(&sorted, 0.50),
            p75: quantile(&sorted, 0.75),
            max: sorted.last().copied(),
        }
    }
}

/// Linear-interpolated quantile of sorted values
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Summarize every column of a table
pub fn summarize(table: &Table) -> StreamSummary {
    let columns = table
        .columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let rows = &table.rows;
            let cells = move || {
                rows.iter()
                    .filter_map(move |row| row.get(idx))
                    .filter(|cell| !cell.is_absent())
            };

            let stats = match column.kind {
                ColumnKind::Timestamp => {
                    let stamps: Vec<NaiveDateTime> =
                        cells().filter_map(Cell::as_timestamp).collect();
                    ColumnStats::Timestamp {
                        count: stamps.len(),
                        first: stamps.iter().min().copied(),
                        last: stamps.iter().max().copied(),
                    }
                }
                ColumnKind::Categorical => ColumnStats::Categorical {
                    count: cells().count(),
                    frequencies: value_counts(table, idx),
                },
                ColumnKind::Numeric => {
                    let values: Vec<f64> = cells().filter_map(Cell::as_f64).collect();
                    ColumnStats::Numeric(NumericSummary::from_values(&values))
                }
                ColumnKind::Text => {
                    let distinct: HashSet<&str> = cells().filter_map(Cell::as_text).collect();
                    ColumnStats::Text {
                        count: cells().count(),
                        distinct: distinct.len(),
                    }
                }
            };

            ColumnSummary {
                name: column.name.clone(),
                stats,
            }
        })
        .collect();

    StreamSummary {
        stream: table.stream,
        count: table.len(),
        columns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::test_support::table;
    use pretty_assertions::assert_eq;

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.unwrap();
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_single_breakfast_summary() {
        let meals = table(
            StreamKind::Meals,
            "timestamp,meal_type,food_consumed,optional_notes\n2024-01-01 08:00:00,Breakfast,eggs,\n",
        );
        let summary = summarize(&meals);

        assert_eq!(summary.count, 1);
        assert_eq!(
            summary.columns[1].stats,
            ColumnStats::Categorical {
                count: 1,
                frequencies: vec![ValueCount {
                    value: "Breakfast".into(),
                    count: 1
                }],
            }
        );
        assert_eq!(
            summary.columns[3].stats,
            ColumnStats::Text {
                count: 0,
                distinct: 0
            }
        );
    }

    #[test]
    fn test_numeric_summary_matches_describe() {
        let symptoms = table(
            StreamKind::Symptoms,
            "timestamp,symptom_type,severity,notes\n\
             2024-01-01 08:00:00,Headache,2,\n\
             2024-01-01 09:00:00,Headache,4,\n\
             2024-01-01 10:00:00,Nausea,4,\n\
             2024-01-01 11:00:00,Fatigue,5,\n\
             2024-01-01 12:00:00,Other,7,\n",
        );
        let summary = summarize(&symptoms);
        let ColumnStats::Numeric(severity) = &summary.columns[2].stats else {
            panic!("severity should be numeric");
        };

        assert_eq!(severity.count, 5);
        assert_close(severity.mean, 4.4);
        assert_close(severity.std, 1.8165902124584950);
        assert_close(severity.min, 2.0);
        assert_close(severity.p25, 4.0);
        assert_close(severity.p50, 4.0);
        assert_close(severity.p75, 5.0);
        assert_close(severity.max, 7.0);
    }

    #[test]
    fn test_empty_table_summary() {
        let summary = summarize(&Table::empty(StreamKind::Emotions));
        assert_eq!(summary.count, 0);
        let ColumnStats::Numeric(severity) = &summary.columns[2].stats else {
            panic!("severity should be numeric");
        };
        assert_eq!(severity.mean, None);
        assert_eq!(severity.std, None);
        assert_eq!(severity.p50, None);
    }

    #[test]
    fn test_quantile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_close(quantile(&values, 0.25), 1.75);
        assert_close(quantile(&values, 0.5), 2.5);
        assert_eq!(quantile(&[], 0.5), None);
    }
}
