use crate::error::JournalError;
use crate::table::Table;
use serde::Serialize;
use std::collections::HashMap;

/// A distinct value and how often it occurs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Counts of every distinct value in a column, most frequent first.
///
/// Ties keep the order in which values were first encountered. Absent cells
/// are not counted.
pub fn value_counts(table: &Table, column: usize) -> Vec<ValueCount> {
    let mut counts: Vec<ValueCount> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for value in table
        .rows
        .iter()
        .filter_map(|row| row.get(column).and_then(|cell| cell.display()))
    {
        match index.get(&value) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(value.clone(), counts.len());
                counts.push(ValueCount { value, count: 1 });
            }
        }
    }

    // stable: equal counts stay in first-seen order
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// The `n` most frequent values of `field`
pub fn top_n(table: &Table, field: &str, n: usize) -> Result<Vec<ValueCount>, JournalError> {
    let column = table.require_column(field)?;
    let mut counts = value_counts(table, column);
    counts.truncate(n);
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StreamKind;
    use crate::views::test_support::table;
    use pretty_assertions::assert_eq;

    const MEALS: &str = "timestamp,meal_type,food_consumed,optional_notes\n\
        2024-01-01 08:00:00,Breakfast,oats,\n\
        2024-01-01 12:00:00,Lunch,soup,\n\
        2024-01-01 15:00:00,Snack,apple,\n\
        2024-01-01 19:00:00,Dinner,soup,\n\
        2024-01-02 08:00:00,Breakfast,eggs,\n\
        2024-01-02 12:30:00,Lunch,salad,\n\
        2024-01-02 16:00:00,Snack,apple,\n\
        2024-01-02 20:00:00,Dinner,rice,\n\
        2024-01-03 10:30:00,Brunch,pancakes,\n";

    fn vc(value: &str, count: usize) -> ValueCount {
        ValueCount {
            value: value.to_string(),
            count,
        }
    }

    #[test]
    fn test_top_n_orders_by_count_then_first_seen() {
        let meals = table(StreamKind::Meals, MEALS);
        let top = top_n(&meals, "food_consumed", 5).unwrap();
        assert_eq!(
            top,
            vec![
                vc("soup", 2),
                vc("apple", 2),
                vc("oats", 1),
                vc("eggs", 1),
                vc("salad", 1),
            ]
        );
    }

    #[test]
    fn test_top_n_bounds() {
        let meals = table(StreamKind::Meals, MEALS);
        assert!(top_n(&meals, "meal_type", 5).unwrap().len() <= 5);
        assert_eq!(top_n(&meals, "meal_type", 1).unwrap(), vec![vc("Breakfast", 2)]);
        assert!(top_n(&meals, "meal_type", 0).unwrap().is_empty());
        assert!(matches!(
            top_n(&meals, "mood", 3),
            Err(JournalError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_absent_values_not_counted() {
        let meals = table(StreamKind::Meals, MEALS);
        assert!(top_n(&meals, "optional_notes", 5).unwrap().is_empty());
    }
}
