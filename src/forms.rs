//! Input boundary
//!
//! Raw values as a form collects them (separate date and time strings, a
//! selected label, an integer severity, free text) are validated here and
//! turned into records. Nothing that fails validation reaches the store.

use crate::error::ValidationError;
use crate::types::{
    Category, EmotionEntry, EmotionType, MealEntry, MealType, Severity, SymptomEntry, SymptomType,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Combine a `YYYY-MM-DD` date and an `HH:MM[:SS]` time
pub fn combine_date_time(date: &str, time: &str) -> Result<NaiveDateTime, ValidationError> {
    let day = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(date.to_string()))?;

    let time_trimmed = time.trim();
    let clock = NaiveTime::parse_from_str(time_trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time_trimmed, "%H:%M"))
        .map_err(|_| ValidationError::InvalidTime(time.to_string()))?;

    Ok(day.and_time(clock))
}

/// Values collected by the meal form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealForm {
    pub date: String,
    pub time: String,
    pub meal_type: String,
    pub food_consumed: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl MealForm {
    pub fn validate(&self) -> Result<MealEntry, ValidationError> {
        let timestamp = combine_date_time(&self.date, &self.time)?;
        let meal_type = MealType::from_label(&self.meal_type)?;
        MealEntry::new(
            timestamp,
            meal_type,
            self.food_consumed.clone(),
            self.notes.clone(),
        )
    }
}

/// Values collected by the symptom form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomForm {
    pub date: String,
    pub time: String,
    pub symptom_type: String,
    pub severity: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl SymptomForm {
    pub fn validate(&self) -> Result<SymptomEntry, ValidationError> {
        let timestamp = combine_date_time(&self.date, &self.time)?;
        let symptom_type = SymptomType::from_label(&self.symptom_type)?;
        let severity = Severity::new(self.severity)?;
        Ok(SymptomEntry::new(
            timestamp,
            symptom_type,
            severity,
            self.notes.clone(),
        ))
    }
}

/// Values collected by the emotion form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionForm {
    pub date: String,
    pub time: String,
    pub emotion_type: String,
    pub severity: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl EmotionForm {
    pub fn validate(&self) -> Result<EmotionEntry, ValidationError> {
        let timestamp = combine_date_time(&self.date, &self.time)?;
        let emotion_type = EmotionType::from_label(&self.emotion_type)?;
        let severity = Severity::new(self.severity)?;
        Ok(EmotionEntry::new(
            timestamp,
            emotion_type,
            severity,
            self.notes.clone(),
        ))
    }
}
