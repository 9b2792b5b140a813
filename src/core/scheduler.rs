use crate::core::budget::adjusted_target;
use crate::core::composer::MealComposer;
use crate::core::consumption::{now_local, ConsumptionAccumulator};
use crate::domain::model::{
    DailyBudget, ExecutionResult, MealSlot, Patient, PatientError, PrepExecution, Recipe,
    RecipeCategory, RecipePools,
};
use crate::domain::ports::{ExecutionLog, PrepStore, Selector};
use crate::utils::error::Result;
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Arc;

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

pub const NO_DIET_ORDER: &str = "No diet order found";
pub const NO_MEAL_WITHIN_BUDGET: &str = "Could not build a meal within calorie budget";

/// At-most-once execution per (slot, calendar day), backed by the execution
/// lease in the log. The conditional insert is the idempotency token; there
/// is no separate check-then-act step to race against.
pub struct ExecutionGuard<'a, L: ExecutionLog + ?Sized> {
    log: &'a L,
}

impl<'a, L: ExecutionLog + ?Sized> ExecutionGuard<'a, L> {
    pub fn new(log: &'a L) -> Self {
        Self { log }
    }

    /// True when this invocation won the day and may proceed.
    pub async fn try_begin(&self, slot: MealSlot, day: NaiveDate) -> Result<bool> {
        self.log.try_acquire_lease(slot, day).await
    }
}

/// How one patient fared within a run. Failures are data, not control flow;
/// nothing crosses patient boundaries.
enum PatientOutcome {
    Ordered,
    AlreadyServed,
    Failed(String),
}

/// The orchestrator: turns calorie budgets into committed tray orders for
/// every patient, one slot at a time.
pub struct PrepScheduler<S: PrepStore, R: Selector> {
    store: Arc<S>,
    composer: MealComposer<R>,
}

impl<S: PrepStore, R: Selector> PrepScheduler<S, R> {
    pub fn new(store: Arc<S>, composer: MealComposer<R>) -> Self {
        Self { store, composer }
    }

    /// Runs one prep pass for `slot` on the current calendar day.
    ///
    /// Exactly one invocation per (slot, day) does real work; later ones get
    /// a zero-valued result and no second audit record. Per-patient failures
    /// are collected into the result; only lease acquisition and audit
    /// persistence failures abort the run.
    pub async fn run(&mut self, slot: MealSlot) -> Result<ExecutionResult> {
        let now = now_local();
        let today = now.date();

        let guard = ExecutionGuard::new(self.store.as_ref());
        if !guard.try_begin(slot, today).await? {
            tracing::info!(%slot, "already ran ordering for this slot today, no action taken");
            return Ok(ExecutionResult::default());
        }

        let serve_time = slot.serve_time(today);
        let patients = self.store.find_patients().await?;
        tracing::info!(%slot, patients = patients.len(), "starting prep run");

        let mut report = ExecutionResult::default();
        for patient in &patients {
            report.patients_processed += 1;

            let outcome = self
                .process_patient(patient, slot, today, serve_time)
                .await
                .unwrap_or_else(|e| PatientOutcome::Failed(e.to_string()));

            match outcome {
                PatientOutcome::Ordered => report.orders_created += 1,
                PatientOutcome::AlreadyServed => {
                    tracing::debug!(patient = %patient.id, "order already exists, skipping");
                }
                PatientOutcome::Failed(error) => {
                    tracing::warn!(patient = %patient.id, %error, "no order created");
                    report.errors.push(PatientError {
                        patient_id: patient.id.clone(),
                        error,
                    });
                }
            }
        }

        // One audit record per run, written even when nothing was ordered.
        // Failing to write it breaks the idempotency contract, so it is
        // fatal rather than collected.
        self.store.commit_execution(slot, &report).await?;

        tracing::info!(
            %slot,
            processed = report.patients_processed,
            orders = report.orders_created,
            errors = report.errors.len(),
            "prep run complete"
        );
        Ok(report)
    }

    async fn process_patient(
        &mut self,
        patient: &Patient,
        slot: MealSlot,
        today: NaiveDate,
        serve_time: NaiveDateTime,
    ) -> Result<PatientOutcome> {
        if self.store.has_order_for(&patient.id, today, slot).await? {
            return Ok(PatientOutcome::AlreadyServed);
        }

        let Some(diet_order) = self.store.find_diet_order(&patient.id).await? else {
            return Ok(PatientOutcome::Failed(NO_DIET_ORDER.to_string()));
        };

        let consumed = ConsumptionAccumulator::new(self.store.as_ref())
            .consumed_calories(&patient.id, today)
            .await?;
        let budget = DailyBudget::resolve(&diet_order, consumed);

        let pools = RecipePools {
            entrees: self.available(&patient.id, RecipeCategory::Entrees).await?,
            beverages: self.available(&patient.id, RecipeCategory::Beverages).await?,
            sides: self.available(&patient.id, RecipeCategory::Sides).await?,
            desserts: self.available(&patient.id, RecipeCategory::Desserts).await?,
        };

        let target = adjusted_target(slot, &budget);
        let meal = self.composer.compose(slot, target, &pools);
        if meal.is_empty() {
            return Ok(PatientOutcome::Failed(NO_MEAL_WITHIN_BUDGET.to_string()));
        }

        let recipe_ids: Vec<String> = meal.iter().map(|r| r.id.clone()).collect();
        self.store
            .commit_tray_order(&patient.id, serve_time, slot, &recipe_ids)
            .await?;

        Ok(PatientOutcome::Ordered)
    }

    async fn available(&self, patient_id: &str, category: RecipeCategory) -> Result<Vec<Recipe>> {
        self.store
            .available_recipes(patient_id, Some(category))
            .await
    }

    /// Audit history, newest first.
    pub async fn executions(
        &self,
        slot: Option<MealSlot>,
        limit: usize,
    ) -> Result<Vec<PrepExecution>> {
        self.store.list_executions(slot, limit).await
    }
}
