//! Core record types for the journal
//!
//! This module defines the three record kinds that flow through the journal
//! (meals, symptoms, emotions), their categorical fields, and the bounded
//! severity value shared by symptoms and emotions.

use crate::error::ValidationError;
use crate::schema::Record;
use crate::table::Cell;
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timestamp layout used on disk
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Stream identifier; each stream lives in its own append-only file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Meals,
    Symptoms,
    Emotions,
}

impl StreamKind {
    pub const ALL: [StreamKind; 3] = [StreamKind::Meals, StreamKind::Symptoms, StreamKind::Emotions];

    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Meals => "meals",
            StreamKind::Symptoms => "symptoms",
            StreamKind::Emotions => "emotions",
        }
    }

    /// Backing file name inside the data directory
    pub fn file_name(&self) -> &'static str {
        match self {
            StreamKind::Meals => "food_entries.csv",
            StreamKind::Symptoms => "symptoms.csv",
            StreamKind::Emotions => "emotions.csv",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "meals" | "meal" | "food" => Ok(StreamKind::Meals),
            "symptoms" | "symptom" => Ok(StreamKind::Symptoms),
            "emotions" | "emotion" => Ok(StreamKind::Emotions),
            _ => Err(ValidationError::UnknownStream(s.to_string())),
        }
    }
}

/// A closed set of labels selectable on an input form
pub trait Category: Sized + Copy + 'static {
    /// Field name used in error messages and headers
    const FIELD: &'static str;
    /// Every variant in display order
    const ALL: &'static [Self];

    fn label(&self) -> &'static str;

    /// Parse a label, ignoring ASCII case and surrounding whitespace
    fn from_label(value: &str) -> Result<Self, ValidationError> {
        let trimmed = value.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ValidationError::UnknownCategory {
                field: Self::FIELD,
                value: value.to_string(),
            })
    }
}

/// Canonical label for a raw category value (used by the schema decoder)
pub fn canonical_label<C: Category>(value: &str) -> Result<&'static str, ValidationError> {
    C::from_label(value).map(|c| c.label())
}

/// Meal type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MealType {
    Breakfast,
    Brunch,
    Lunch,
    Dinner,
    Snack,
}

impl Category for MealType {
    const FIELD: &'static str = "meal_type";
    const ALL: &'static [Self] = &[
        MealType::Breakfast,
        MealType::Brunch,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    fn label(&self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Brunch => "Brunch",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
            MealType::Snack => "Snack",
        }
    }
}

/// Symptom type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymptomType {
    Stomachache,
    Headache,
    Nausea,
    Fatigue,
    Other,
}

impl Category for SymptomType {
    const FIELD: &'static str = "symptom_type";
    const ALL: &'static [Self] = &[
        SymptomType::Stomachache,
        SymptomType::Headache,
        SymptomType::Nausea,
        SymptomType::Fatigue,
        SymptomType::Other,
    ];

    fn label(&self) -> &'static str {
        match self {
            SymptomType::Stomachache => "Stomachache",
            SymptomType::Headache => "Headache",
            SymptomType::Nausea => "Nausea",
            SymptomType::Fatigue => "Fatigue",
            SymptomType::Other => "Other",
        }
    }
}

/// Emotion type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmotionType {
    Anxious,
    Depressed,
    Overwhelmed,
    Bored,
    #[serde(rename = "Doom scrolling")]
    DoomScrolling,
    Other,
}

impl Category for EmotionType {
    const FIELD: &'static str = "emotion_type";
    const ALL: &'static [Self] = &[
        EmotionType::Anxious,
        EmotionType::Depressed,
        EmotionType::Overwhelmed,
        EmotionType::Bored,
        EmotionType::DoomScrolling,
        EmotionType::Other,
    ];

    fn label(&self) -> &'static str {
        match self {
            EmotionType::Anxious => "Anxious",
            EmotionType::Depressed => "Depressed",
            EmotionType::Overwhelmed => "Overwhelmed",
            EmotionType::Bored => "Bored",
            EmotionType::DoomScrolling => "Doom scrolling",
            EmotionType::Other => "Other",
        }
    }
}

impl FromStr for MealType {
    type Err = ValidationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s)
    }
}

impl FromStr for SymptomType {
    type Err = ValidationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s)
    }
}

impl FromStr for EmotionType {
    type Err = ValidationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s)
    }
}

/// Severity rating, always within 1..=10
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Severity(u8);

impl Severity {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 10;

    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Severity(value as u8))
        } else {
            Err(ValidationError::SeverityOutOfRange { value })
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Severity {
    type Error = ValidationError;
    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Severity::new(value)
    }
}

impl From<Severity> for i64 {
    fn from(s: Severity) -> Self {
        s.0 as i64
    }
}

/// Normalize free text: blank input becomes absent, never an empty string
pub fn normalize_free_text(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn normalize_optional(text: Option<String>) -> Option<String> {
    text.and_then(|t| normalize_free_text(&t))
}

/// Drop sub-second precision
pub fn truncate_to_second(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_nanosecond(0).unwrap_or(ts)
}

/// One logged meal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealEntry {
    pub timestamp: NaiveDateTime,
    pub meal_type: MealType,
    pub food_consumed: String,
    #[serde(default)]
    pub optional_notes: Option<String>,
}

impl MealEntry {
    pub fn new(
        timestamp: NaiveDateTime,
        meal_type: MealType,
        food_consumed: impl Into<String>,
        notes: Option<String>,
    ) -> Result<Self, ValidationError> {
        MealEntry {
            timestamp,
            meal_type,
            food_consumed: food_consumed.into(),
            optional_notes: notes,
        }
        .normalized()
    }
}

/// One logged symptom
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomEntry {
    pub timestamp: NaiveDateTime,
    pub symptom_type: SymptomType,
    pub severity: Severity,
    #[serde(default)]
    pub notes: Option<String>,
}

impl SymptomEntry {
    pub fn new(
        timestamp: NaiveDateTime,
        symptom_type: SymptomType,
        severity: Severity,
        notes: Option<String>,
    ) -> Self {
        SymptomEntry {
            timestamp: truncate_to_second(timestamp),
            symptom_type,
            severity,
            notes: normalize_optional(notes),
        }
    }
}

/// One logged emotion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionEntry {
    pub timestamp: NaiveDateTime,
    pub emotion_type: EmotionType,
    pub severity: Severity,
    #[serde(default)]
    pub notes: Option<String>,
}

impl EmotionEntry {
    pub fn new(
        timestamp: NaiveDateTime,
        emotion_type: EmotionType,
        severity: Severity,
        notes: Option<String>,
    ) -> Self {
        EmotionEntry {
            timestamp: truncate_to_second(timestamp),
            emotion_type,
            severity,
            notes: normalize_optional(notes),
        }
    }
}

fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn text_cell(value: &Option<String>) -> Cell {
    match value {
        Some(v) => Cell::Text(v.clone()),
        None => Cell::Absent,
    }
}

impl Record for MealEntry {
    const STREAM: StreamKind = StreamKind::Meals;

    fn normalized(self) -> Result<Self, ValidationError> {
        if self.food_consumed.trim().is_empty() {
            return Err(ValidationError::EmptyField("food_consumed"));
        }
        Ok(MealEntry {
            timestamp: truncate_to_second(self.timestamp),
            optional_notes: normalize_optional(self.optional_notes),
            ..self
        })
    }

    fn to_fields(&self) -> Vec<Option<String>> {
        vec![
            Some(format_timestamp(&self.timestamp)),
            Some(self.meal_type.label().to_string()),
            Some(self.food_consumed.clone()),
            self.optional_notes.clone(),
        ]
    }

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::Timestamp(self.timestamp),
            Cell::Text(self.meal_type.label().to_string()),
            Cell::Text(self.food_consumed.clone()),
            text_cell(&self.optional_notes),
        ]
    }

    fn from_row(row: &[Cell]) -> Result<Self, String> {
        match row {
            [Cell::Timestamp(ts), Cell::Text(kind), Cell::Text(food), notes] => Ok(MealEntry {
                timestamp: *ts,
                meal_type: MealType::from_label(kind).map_err(|e| e.to_string())?,
                food_consumed: food.clone(),
                optional_notes: notes.as_text().map(str::to_string),
            }),
            _ => Err(format!("row does not match the meals schema: {row:?}")),
        }
    }
}

impl Record for SymptomEntry {
    const STREAM: StreamKind = StreamKind::Symptoms;

    fn normalized(self) -> Result<Self, ValidationError> {
        Ok(Self::new(self.timestamp, self.symptom_type, self.severity, self.notes))
    }

    fn to_fields(&self) -> Vec<Option<String>> {
        vec![
            Some(format_timestamp(&self.timestamp)),
            Some(self.symptom_type.label().to_string()),
            Some(self.severity.get().to_string()),
            self.notes.clone(),
        ]
    }

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::Timestamp(self.timestamp),
            Cell::Text(self.symptom_type.label().to_string()),
            Cell::Integer(self.severity.into()),
            text_cell(&self.notes),
        ]
    }

    fn from_row(row: &[Cell]) -> Result<Self, String> {
        match row {
            [Cell::Timestamp(ts), Cell::Text(kind), Cell::Integer(severity), notes] => {
                Ok(SymptomEntry {
                    timestamp: *ts,
                    symptom_type: SymptomType::from_label(kind).map_err(|e| e.to_string())?,
                    severity: Severity::new(*severity).map_err(|e| e.to_string())?,
                    notes: notes.as_text().map(str::to_string),
                })
            }
            _ => Err(format!("row does not match the symptoms schema: {row:?}")),
        }
    }
}

impl Record for EmotionEntry {
    const STREAM: StreamKind = StreamKind::Emotions;

    fn normalized(self) -> Result<Self, ValidationError> {
        Ok(Self::new(self.timestamp, self.emotion_type, self.severity, self.notes))
    }

    fn to_fields(&self) -> Vec<Option<String>> {
        vec![
            Some(format_timestamp(&self.timestamp)),
            Some(self.emotion_type.label().to_string()),
            Some(self.severity.get().to_string()),
            self.notes.clone(),
        ]
    }

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::Timestamp(self.timestamp),
            Cell::Text(self.emotion_type.label().to_string()),
            Cell::Integer(self.severity.into()),
            text_cell(&self.notes),
        ]
    }

    fn from_row(row: &[Cell]) -> Result<Self, String> {
        match row {
            [Cell::Timestamp(ts), Cell::Text(kind), Cell::Integer(severity), notes] => {
                Ok(EmotionEntry {
                    timestamp: *ts,
                    emotion_type: EmotionType::from_label(kind).map_err(|e| e.to_string())?,
                    severity: Severity::new(*severity).map_err(|e| e.to_string())?,
                    notes: notes.as_text().map(str::to_string),
                })
            }
            _ => Err(format!("row does not match the emotions schema: {row:?}")),
        }
    }
}
