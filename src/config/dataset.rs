use crate::domain::model::{DietOrder, MealSlot, Recipe};
use crate::utils::error::Result;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// TOML document seeding the in-memory store: patients with their active
/// diet-order association, the shared diet orders and recipe catalog, and
/// any tray orders that already exist (earlier meals, patient-placed
/// orders).
///
/// ```toml
/// [[diet_orders]]
/// id = "standard"
/// name = "Standard 2000"
/// minimum_calories = 1500
/// maximum_calories = 2500
///
/// [[patients]]
/// id = "p1"
/// name = "Avery Quinn"
/// diet_order = "standard"
///
/// [[recipes]]
/// id = "r1"
/// name = "Grilled chicken"
/// category = "entrees"
/// calories = 450
///
/// [[tray_orders]]
/// patient = "p1"
/// slot = "breakfast"
/// scheduled_for = "2026-08-06T08:00:00"
/// recipes = ["r1"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub patients: Vec<PatientEntry>,
    #[serde(default)]
    pub diet_orders: Vec<DietOrder>,
    #[serde(default)]
    pub recipes: Vec<Recipe>,
    #[serde(default)]
    pub tray_orders: Vec<TrayOrderEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientEntry {
    pub id: String,
    pub name: String,
    /// Active diet-order association, when the patient has one.
    pub diet_order: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrayOrderEntry {
    pub patient: String,
    pub slot: MealSlot,
    pub scheduled_for: NaiveDateTime,
    pub recipes: Vec<String>,
}

impl Dataset {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}
