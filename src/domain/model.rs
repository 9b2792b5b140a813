use crate::utils::error::{PrepError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Meal slots covered by automated prep. Snack trays are patient-initiated
/// and never assembled by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealSlot {
    pub fn as_str(self) -> &'static str {
        match self {
            MealSlot::Breakfast => "breakfast",
            MealSlot::Lunch => "lunch",
            MealSlot::Dinner => "dinner",
        }
    }

    /// Fixed serve hours: breakfast 08:00, lunch 12:00, dinner 18:00.
    pub fn serve_hour(self) -> u32 {
        match self {
            MealSlot::Breakfast => 8,
            MealSlot::Lunch => 12,
            MealSlot::Dinner => 18,
        }
    }

    pub fn serve_time(self, date: NaiveDate) -> NaiveDateTime {
        date.and_hms_opt(self.serve_hour(), 0, 0)
            .expect("serve hour is a valid wall-clock time")
    }

    /// Maps the wall clock to the slot whose cron trigger window contains it.
    ///
    /// | window          | slot      |
    /// |-----------------|-----------|
    /// | 03:30 - 04:00   | breakfast |
    /// | 07:30 - 08:00   | lunch     |
    /// | 13:30 - 14:00   | dinner    |
    pub fn for_trigger_time(time: NaiveTime) -> Option<MealSlot> {
        let minutes = time.hour() * 60 + time.minute();
        match minutes {
            210..=239 => Some(MealSlot::Breakfast),
            450..=479 => Some(MealSlot::Lunch),
            810..=839 => Some(MealSlot::Dinner),
            _ => None,
        }
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealSlot {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "breakfast" => Ok(MealSlot::Breakfast),
            "lunch" => Ok(MealSlot::Lunch),
            "dinner" => Ok(MealSlot::Dinner),
            other => Err(PrepError::ConfigError {
                message: format!("Unknown meal slot: {}", other),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub name: String,
}

/// A named calorie policy shared by any number of patients. Absent bounds are
/// resolved by [`DailyBudget::resolve`]: no minimum means 0, no maximum means
/// unbounded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DietOrder {
    pub id: String,
    pub name: String,
    pub minimum_calories: Option<i64>,
    pub maximum_calories: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipeCategory {
    Entrees,
    Sides,
    Desserts,
    Beverages,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub category: RecipeCategory,
    pub calories: i64,
}

/// Per-category candidate lists handed to the composer. The collaborator
/// pre-filters each pool to the patient's remaining daily budget and sorts it
/// descending by calories.
#[derive(Debug, Clone, Default)]
pub struct RecipePools {
    pub entrees: Vec<Recipe>,
    pub sides: Vec<Recipe>,
    pub desserts: Vec<Recipe>,
    pub beverages: Vec<Recipe>,
}

/// A committed meal for one patient and one slot. Either the order exists
/// with all of its recipes, or not at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrayOrder {
    pub id: String,
    pub patient_id: String,
    pub slot: MealSlot,
    pub scheduled_for: NaiveDateTime,
    pub recipes: Vec<Recipe>,
}

/// A patient's calorie policy resolved against what they already consumed
/// today.
#[derive(Debug, Clone, Copy)]
pub struct DailyBudget {
    pub minimum: i64,
    pub maximum: i64,
    pub consumed: i64,
}

impl DailyBudget {
    pub fn resolve(order: &DietOrder, consumed: i64) -> Self {
        Self {
            minimum: order.minimum_calories.unwrap_or(0),
            maximum: order.maximum_calories.unwrap_or(i64::MAX),
            consumed,
        }
    }

    pub fn remaining(&self) -> i64 {
        self.maximum.saturating_sub(self.consumed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientError {
    pub patient_id: String,
    pub error: String,
}

/// Aggregate report of one scheduler run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub patients_processed: usize,
    pub orders_created: usize,
    pub errors: Vec<PatientError>,
}

/// Immutable audit record of one scheduler run. At most one exists per
/// (slot, calendar day).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepExecution {
    pub id: String,
    pub slot: MealSlot,
    pub executed_at: NaiveDateTime,
    pub patients_processed: usize,
    pub orders_created: usize,
    pub errors: Vec<PatientError>,
}
