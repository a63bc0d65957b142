//! Seed a data directory with a week of sample entries
//!
//! Usage: cargo run --example seed_journal -- <data_dir>

use synheart_journal::forms::{EmotionForm, MealForm, SymptomForm};
use synheart_journal::views;
use synheart_journal::{JournalStore, LoadPolicy, StreamKind, StreamReader};

fn main() {
    let data_dir = std::env::args().nth(1).unwrap_or_else(|| "journal-data".to_string());
    let store = JournalStore::new(&data_dir);

    let meals = [
        ("Breakfast", "08:00", "oatmeal and coffee"),
        ("Lunch", "12:30", "lentil soup"),
        ("Dinner", "19:00", "pasta with tomato sauce"),
    ];
    let symptoms = [("Stomachache", "13:30", 3), ("Headache", "20:00", 5)];

    for day in 1..=7 {
        let date = format!("2024-03-{day:02}");

        for (meal_type, time, food) in meals {
            let form = MealForm {
                date: date.clone(),
                time: time.to_string(),
                meal_type: meal_type.to_string(),
                food_consumed: food.to_string(),
                notes: None,
            };
            if let Err(e) = form.validate().map_err(Into::into).and_then(|m| store.append(&m)) {
                eprintln!("Error: {e}");
                return;
            }
        }

        for (symptom_type, time, base) in symptoms {
            let form = SymptomForm {
                date: date.clone(),
                time: time.to_string(),
                symptom_type: symptom_type.to_string(),
                severity: base + (day % 3),
                notes: (day % 2 == 0).then(|| "after a long meeting".to_string()),
            };
            if let Err(e) = form.validate().map_err(Into::into).and_then(|s| store.append(&s)) {
                eprintln!("Error: {e}");
                return;
            }

            // Logged in the same minute so bucketed correlation lines them up
            let form = EmotionForm {
                date: date.clone(),
                time: time.to_string(),
                emotion_type: "Anxious".to_string(),
                severity: base + (day % 3) - 1,
                notes: None,
            };
            if let Err(e) = form.validate().map_err(Into::into).and_then(|s| store.append(&s)) {
                eprintln!("Error: {e}");
                return;
            }
        }
    }

    let reader = StreamReader::new(&data_dir, LoadPolicy::Strict);
    match reader.load(StreamKind::Meals) {
        Ok(loaded) => match views::top_n(&loaded.table, "food_consumed", 3) {
            Ok(top) => {
                println!("Seeded {} with {} meals", data_dir, loaded.table.len());
                for entry in top {
                    println!("  {} ({})", entry.value, entry.count);
                }
            }
            Err(e) => eprintln!("Error: {e}"),
        },
        Err(e) => eprintln!("Error: {e}"),
    }
}
