use crate::config::dataset::Dataset;
use crate::core::consumption::{day_end, day_start, now_local, served_window};
use crate::domain::model::{
    DailyBudget, DietOrder, ExecutionResult, MealSlot, Patient, PrepExecution, Recipe,
    RecipeCategory, TrayOrder,
};
use crate::domain::ports::{ExecutionLog, OrderStore, PatientDirectory};
use crate::utils::error::{PrepError, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Mutex-guarded store playing every collaborator role in one process.
/// Each locked section is one transaction: a tray order is inserted with all
/// of its recipes or not at all, and the lease insert is conditional on the
/// same lock.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    patients: Vec<Patient>,
    diet_orders: HashMap<String, DietOrder>,
    /// patient id -> active diet order id. At most one per patient.
    associations: HashMap<String, String>,
    recipes: Vec<Recipe>,
    tray_orders: Vec<TrayOrder>,
    executions: Vec<PrepExecution>,
    leases: HashSet<(MealSlot, NaiveDate)>,
}

impl Tables {
    fn consumed_calories(&self, patient_id: &str, now: NaiveDateTime) -> i64 {
        let Some((start, end)) = served_window(now.date(), now) else {
            return 0;
        };
        self.tray_orders
            .iter()
            .filter(|o| {
                o.patient_id == patient_id && o.scheduled_for >= start && o.scheduled_for <= end
            })
            .flat_map(|o| o.recipes.iter())
            .map(|r| r.calories)
            .sum()
    }

    fn diet_order_for(&self, patient_id: &str) -> Option<&DietOrder> {
        self.associations
            .get(patient_id)
            .and_then(|order_id| self.diet_orders.get(order_id))
    }

    fn insert_tray_order(
        &mut self,
        patient_id: &str,
        serve_time: NaiveDateTime,
        slot: MealSlot,
        recipe_ids: &[String],
    ) -> Result<TrayOrder> {
        // Resolve every id before touching the table; one unknown id rejects
        // the whole order.
        let mut recipes = Vec::with_capacity(recipe_ids.len());
        let mut missing = Vec::new();
        for id in recipe_ids {
            match self.recipes.iter().find(|r| &r.id == id) {
                Some(recipe) => recipes.push(recipe.clone()),
                None => missing.push(id.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(PrepError::StorageError {
                message: format!("Invalid recipe ids: {}", missing.join(", ")),
            });
        }

        let order = TrayOrder {
            id: Uuid::new_v4().to_string(),
            patient_id: patient_id.to_string(),
            slot,
            scheduled_for: serve_time,
            recipes,
        };
        self.tray_orders.push(order.clone());
        Ok(order)
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a dataset, validating referential integrity.
    pub fn from_dataset(dataset: Dataset) -> Result<Self> {
        let mut tables = Tables::default();
        tables.recipes = dataset.recipes;

        for order in dataset.diet_orders {
            tables.diet_orders.insert(order.id.clone(), order);
        }

        for entry in dataset.patients {
            if let Some(order_id) = &entry.diet_order {
                if !tables.diet_orders.contains_key(order_id) {
                    return Err(PrepError::ConfigError {
                        message: format!(
                            "Patient {} references unknown diet order {}",
                            entry.id, order_id
                        ),
                    });
                }
                tables.associations.insert(entry.id.clone(), order_id.clone());
            }
            tables.patients.push(Patient {
                id: entry.id,
                name: entry.name,
            });
        }

        for entry in dataset.tray_orders {
            tables.insert_tray_order(
                &entry.patient,
                entry.scheduled_for,
                entry.slot,
                &entry.recipes,
            )?;
        }

        Ok(Self {
            inner: Mutex::new(tables),
        })
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // A poisoned lock only means another thread panicked mid-write in a
        // test; the data is still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_patient(&self, patient: Patient) {
        self.tables().patients.push(patient);
    }

    pub fn add_diet_order(&self, order: DietOrder) {
        self.tables().diet_orders.insert(order.id.clone(), order);
    }

    pub fn assign_diet_order(&self, patient_id: &str, diet_order_id: &str) {
        self.tables()
            .associations
            .insert(patient_id.to_string(), diet_order_id.to_string());
    }

    pub fn add_recipe(&self, recipe: Recipe) {
        self.tables().recipes.push(recipe);
    }

    /// Seeds a pre-existing tray order, e.g. one committed by an earlier run
    /// or placed by the patient themselves.
    pub fn seed_tray_order(
        &self,
        patient_id: &str,
        scheduled_for: NaiveDateTime,
        slot: MealSlot,
        recipe_ids: &[String],
    ) -> Result<TrayOrder> {
        self.tables()
            .insert_tray_order(patient_id, scheduled_for, slot, recipe_ids)
    }

    pub fn tray_order_count(&self) -> usize {
        self.tables().tray_orders.len()
    }
}

#[async_trait]
impl PatientDirectory for InMemoryStore {
    async fn find_patients(&self) -> Result<Vec<Patient>> {
        Ok(self.tables().patients.clone())
    }

    async fn find_diet_order(&self, patient_id: &str) -> Result<Option<DietOrder>> {
        Ok(self.tables().diet_order_for(patient_id).cloned())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn tray_orders_between(
        &self,
        patient_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<TrayOrder>> {
        Ok(self
            .tables()
            .tray_orders
            .iter()
            .filter(|o| {
                o.patient_id == patient_id && o.scheduled_for >= start && o.scheduled_for <= end
            })
            .cloned()
            .collect())
    }

    async fn has_order_for(
        &self,
        patient_id: &str,
        date: NaiveDate,
        slot: MealSlot,
    ) -> Result<bool> {
        let (start, end) = (day_start(date), day_end(date));
        Ok(self.tables().tray_orders.iter().any(|o| {
            o.patient_id == patient_id
                && o.slot == slot
                && o.scheduled_for >= start
                && o.scheduled_for <= end
        }))
    }

    async fn available_recipes(
        &self,
        patient_id: &str,
        category: Option<RecipeCategory>,
    ) -> Result<Vec<Recipe>> {
        let tables = self.tables();
        let Some(diet_order) = tables.diet_order_for(patient_id) else {
            return Err(PrepError::StorageError {
                message: format!("Patient {} has no diet order", patient_id),
            });
        };

        let consumed = tables.consumed_calories(patient_id, now_local());
        let remaining = DailyBudget::resolve(diet_order, consumed).remaining();

        let mut recipes: Vec<Recipe> = tables
            .recipes
            .iter()
            .filter(|r| r.calories <= remaining && category.map_or(true, |c| r.category == c))
            .cloned()
            .collect();
        recipes.sort_by(|a, b| b.calories.cmp(&a.calories));
        Ok(recipes)
    }

    async fn commit_tray_order(
        &self,
        patient_id: &str,
        serve_time: NaiveDateTime,
        slot: MealSlot,
        recipe_ids: &[String],
    ) -> Result<TrayOrder> {
        self.tables()
            .insert_tray_order(patient_id, serve_time, slot, recipe_ids)
    }
}

#[async_trait]
impl ExecutionLog for InMemoryStore {
    async fn try_acquire_lease(&self, slot: MealSlot, day: NaiveDate) -> Result<bool> {
        Ok(self.tables().leases.insert((slot, day)))
    }

    async fn commit_execution(&self, slot: MealSlot, result: &ExecutionResult) -> Result<()> {
        let record = PrepExecution {
            id: Uuid::new_v4().to_string(),
            slot,
            executed_at: now_local(),
            patients_processed: result.patients_processed,
            orders_created: result.orders_created,
            errors: result.errors.clone(),
        };
        self.tables().executions.push(record);
        Ok(())
    }

    async fn list_executions(
        &self,
        slot: Option<MealSlot>,
        limit: usize,
    ) -> Result<Vec<PrepExecution>> {
        let mut executions: Vec<PrepExecution> = self
            .tables()
            .executions
            .iter()
            .filter(|e| slot.map_or(true, |s| e.slot == s))
            .cloned()
            .collect();
        executions.sort_by(|a, b| b.executed_at.cmp(&a.executed_at));
        executions.truncate(limit);
        Ok(executions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn recipe(id: &str, category: RecipeCategory, calories: i64) -> Recipe {
        Recipe {
            id: id.to_string(),
            name: format!("Recipe {}", id),
            category,
            calories,
        }
    }

    fn store_with_patient(maximum: Option<i64>) -> InMemoryStore {
        let store = InMemoryStore::new();
        store.add_patient(Patient {
            id: "p1".to_string(),
            name: "Pat".to_string(),
        });
        store.add_diet_order(DietOrder {
            id: "d1".to_string(),
            name: "Standard".to_string(),
            minimum_calories: Some(1500),
            maximum_calories: maximum,
        });
        store.assign_diet_order("p1", "d1");
        store
    }

    #[tokio::test]
    async fn test_lease_is_granted_once() {
        let store = InMemoryStore::new();
        let day = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();

        assert!(store.try_acquire_lease(MealSlot::Lunch, day).await.unwrap());
        assert!(!store.try_acquire_lease(MealSlot::Lunch, day).await.unwrap());
        // Other slots and other days are independent keys.
        assert!(store.try_acquire_lease(MealSlot::Dinner, day).await.unwrap());
        assert!(store
            .try_acquire_lease(MealSlot::Lunch, day + Duration::days(1))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_commit_rejects_unknown_recipe_ids_atomically() {
        let store = store_with_patient(Some(2500));
        store.add_recipe(recipe("r1", RecipeCategory::Entrees, 400));

        let serve = now_local();
        let result = store
            .commit_tray_order(
                "p1",
                serve,
                MealSlot::Lunch,
                &["r1".to_string(), "ghost".to_string()],
            )
            .await;

        assert!(matches!(result, Err(PrepError::StorageError { .. })));
        // Nothing was committed, not even the valid half.
        assert_eq!(store.tray_order_count(), 0);
    }

    #[tokio::test]
    async fn test_available_recipes_respect_remaining_budget() {
        let store = store_with_patient(Some(2000));
        store.add_recipe(recipe("big", RecipeCategory::Entrees, 1900));
        store.add_recipe(recipe("medium", RecipeCategory::Entrees, 900));
        store.add_recipe(recipe("small", RecipeCategory::Entrees, 300));
        store.add_recipe(recipe("soup", RecipeCategory::Sides, 150));

        // A 900 kcal tray already served today shrinks the remaining budget
        // to 1100, which excludes "big".
        store
            .seed_tray_order("p1", now_local(), MealSlot::Breakfast, &["medium".to_string()])
            .unwrap();
        store.add_recipe(recipe("served", RecipeCategory::Entrees, 0));

        let entrees = store
            .available_recipes("p1", Some(RecipeCategory::Entrees))
            .await
            .unwrap();
        let ids: Vec<&str> = entrees.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["medium", "small", "served"]);
    }

    #[tokio::test]
    async fn test_available_recipes_without_diet_order_is_an_error() {
        let store = InMemoryStore::new();
        store.add_patient(Patient {
            id: "p9".to_string(),
            name: "No policy".to_string(),
        });

        assert!(store.available_recipes("p9", None).await.is_err());
    }

    #[tokio::test]
    async fn test_executions_listed_newest_first_with_limit() {
        let store = InMemoryStore::new();
        for _ in 0..3 {
            store
                .commit_execution(MealSlot::Breakfast, &ExecutionResult::default())
                .await
                .unwrap();
        }
        store
            .commit_execution(MealSlot::Dinner, &ExecutionResult::default())
            .await
            .unwrap();

        let all = store.list_executions(None, 10).await.unwrap();
        assert_eq!(all.len(), 4);
        assert!(all.windows(2).all(|w| w[0].executed_at >= w[1].executed_at));

        let breakfast = store
            .list_executions(Some(MealSlot::Breakfast), 2)
            .await
            .unwrap();
        assert_eq!(breakfast.len(), 2);
        assert!(breakfast.iter().all(|e| e.slot == MealSlot::Breakfast));
    }
}
