use crate::domain::model::{
    DietOrder, ExecutionResult, MealSlot, Patient, PrepExecution, Recipe, RecipeCategory,
    TrayOrder,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

/// Patient and diet-order administration, owned elsewhere. Read-only here.
#[async_trait]
pub trait PatientDirectory: Send + Sync {
    /// Full snapshot of all patients.
    async fn find_patients(&self) -> Result<Vec<Patient>>;

    /// The patient's active diet-order association, if any.
    async fn find_diet_order(&self, patient_id: &str) -> Result<Option<DietOrder>>;
}

/// Tray orders and recipe availability against the shared store.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Tray orders (with their recipes) scheduled inside [start, end].
    async fn tray_orders_between(
        &self,
        patient_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<TrayOrder>>;

    /// Whether the patient already has an order for (date, slot).
    async fn has_order_for(&self, patient_id: &str, date: NaiveDate, slot: MealSlot)
        -> Result<bool>;

    /// Recipes that still fit the patient's remaining daily budget, sorted
    /// descending by calories.
    async fn available_recipes(
        &self,
        patient_id: &str,
        category: Option<RecipeCategory>,
    ) -> Result<Vec<Recipe>>;

    /// Commits an order and all of its recipe links as one atomic unit.
    async fn commit_tray_order(
        &self,
        patient_id: &str,
        serve_time: NaiveDateTime,
        slot: MealSlot,
        recipe_ids: &[String],
    ) -> Result<TrayOrder>;
}

/// Audit log of scheduler runs and the per-(slot, day) execution lease.
#[async_trait]
pub trait ExecutionLog: Send + Sync {
    /// Conditional insert keyed by (slot, day). Returns true exactly once
    /// per key; a false return means another run already owns the day.
    async fn try_acquire_lease(&self, slot: MealSlot, day: NaiveDate) -> Result<bool>;

    /// Persists the immutable audit record for a completed run.
    async fn commit_execution(&self, slot: MealSlot, result: &ExecutionResult) -> Result<()>;

    /// Past executions, newest first, optionally filtered by slot.
    async fn list_executions(
        &self,
        slot: Option<MealSlot>,
        limit: usize,
    ) -> Result<Vec<PrepExecution>>;
}

/// One value that can play every collaborator role the scheduler needs.
pub trait PrepStore: PatientDirectory + OrderStore + ExecutionLog {}

impl<T: PatientDirectory + OrderStore + ExecutionLog> PrepStore for T {}

/// Injectable selection strategy over candidate pools, so composition is
/// deterministic under test.
pub trait Selector: Send {
    /// Index into a non-empty pool of `len` items.
    fn pick_index(&mut self, len: usize) -> usize;
}
