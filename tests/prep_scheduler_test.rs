use mealprep::core::consumption::now_local;
use mealprep::core::scheduler::{NO_DIET_ORDER, NO_MEAL_WITHIN_BUDGET};
use mealprep::domain::model::{
    DietOrder, ExecutionResult, MealSlot, Patient, Recipe, RecipeCategory,
};
use mealprep::domain::ports::OrderStore;
use mealprep::{InMemoryStore, MealComposer, PrepScheduler, UniformSelector};
use std::sync::Arc;

fn patient(id: &str) -> Patient {
    Patient {
        id: id.to_string(),
        name: format!("Patient {}", id),
    }
}

fn recipe(id: &str, category: RecipeCategory, calories: i64) -> Recipe {
    Recipe {
        id: id.to_string(),
        name: format!("Recipe {}", id),
        category,
        calories,
    }
}

fn standard_diet() -> DietOrder {
    DietOrder {
        id: "standard".to_string(),
        name: "Standard 2000".to_string(),
        minimum_calories: Some(1500),
        maximum_calories: Some(2500),
    }
}

/// Store with one patient on the standard diet. The single entree lands
/// within the quick-snack threshold of the 1212 kcal lunch target, so every
/// randomized attempt exits early and composition is deterministic.
fn single_patient_store() -> Arc<InMemoryStore> {
    let store = InMemoryStore::new();
    store.add_patient(patient("p1"));
    store.add_diet_order(standard_diet());
    store.assign_diet_order("p1", "standard");
    store.add_recipe(recipe("casserole", RecipeCategory::Entrees, 1150));
    store.add_recipe(recipe("green-beans", RecipeCategory::Sides, 40));
    Arc::new(store)
}

fn scheduler(store: &Arc<InMemoryStore>) -> PrepScheduler<InMemoryStore, UniformSelector> {
    PrepScheduler::new(Arc::clone(store), MealComposer::default())
}

#[tokio::test]
async fn test_lunch_run_commits_one_order_within_budget() {
    let store = single_patient_store();
    let mut scheduler = scheduler(&store);

    let result = scheduler.run(MealSlot::Lunch).await.unwrap();
    assert_eq!(result.patients_processed, 1);
    assert_eq!(result.orders_created, 1);
    assert!(result.errors.is_empty());

    let today = now_local().date();
    let orders = store
        .tray_orders_between(
            "p1",
            today.and_hms_opt(0, 0, 0).unwrap(),
            today.and_hms_opt(23, 59, 59).unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);

    let order = &orders[0];
    assert_eq!(order.slot, MealSlot::Lunch);
    assert_eq!(order.scheduled_for, MealSlot::Lunch.serve_time(today));

    // DietOrder{1500, 2500}, nothing consumed: lunch target is 1212 and the
    // committed tray must not exceed it.
    let total: i64 = order.recipes.iter().map(|r| r.calories).sum();
    assert!(total <= 1212, "tray exceeds budget: {}", total);
    assert!(order.recipes.iter().any(|r| r.id == "casserole"));
}

#[tokio::test]
async fn test_second_run_same_day_is_a_no_op() {
    let store = single_patient_store();
    let mut scheduler = scheduler(&store);

    let first = scheduler.run(MealSlot::Lunch).await.unwrap();
    assert_eq!(first.orders_created, 1);

    let second = scheduler.run(MealSlot::Lunch).await.unwrap();
    assert_eq!(second, ExecutionResult::default());

    // No duplicate order, no second audit record.
    assert_eq!(store.tray_order_count(), 1);
    let executions = scheduler.executions(Some(MealSlot::Lunch), 10).await.unwrap();
    assert_eq!(executions.len(), 1);
}

#[tokio::test]
async fn test_other_slots_are_unaffected_by_the_lease() {
    let store = single_patient_store();
    let mut scheduler = scheduler(&store);

    scheduler.run(MealSlot::Lunch).await.unwrap();
    let dinner = scheduler.run(MealSlot::Dinner).await.unwrap();
    assert_eq!(dinner.patients_processed, 1);

    let executions = scheduler.executions(None, 10).await.unwrap();
    assert_eq!(executions.len(), 2);
}

#[tokio::test]
async fn test_every_patient_is_accounted_for() {
    let store = single_patient_store();
    // p2 has no diet order at all; p3 already has a lunch tray for today.
    store.add_patient(patient("p2"));
    store.add_patient(patient("p3"));
    store.assign_diet_order("p3", "standard");
    let today = now_local().date();
    store
        .seed_tray_order(
            "p3",
            MealSlot::Lunch.serve_time(today),
            MealSlot::Lunch,
            &["casserole".to_string()],
        )
        .unwrap();

    let mut scheduler = scheduler(&store);
    let result = scheduler.run(MealSlot::Lunch).await.unwrap();

    assert_eq!(result.patients_processed, 3);
    assert_eq!(result.orders_created, 1);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].patient_id, "p2");
    assert_eq!(result.errors[0].error, NO_DIET_ORDER);

    // created + errors + implicit skips add up to the full patient set.
    let skips = result.patients_processed - result.orders_created - result.errors.len();
    assert_eq!(skips, 1);

    // The audit record carries the same accounting.
    let executions = scheduler.executions(Some(MealSlot::Lunch), 10).await.unwrap();
    assert_eq!(executions[0].patients_processed, 3);
    assert_eq!(executions[0].orders_created, 1);
    assert_eq!(executions[0].errors, result.errors);
}

#[tokio::test]
async fn test_unbuildable_budget_is_reported_not_fatal() {
    let store = InMemoryStore::new();
    store.add_patient(patient("p1"));
    store.add_diet_order(standard_diet());
    store.assign_diet_order("p1", "standard");
    // The only recipe blows past the whole daily range, so the pools served
    // to the composer are empty and every attempt fails.
    store.add_recipe(recipe("banquet", RecipeCategory::Entrees, 5000));

    let mut scheduler = scheduler(&Arc::new(store));
    let result = scheduler.run(MealSlot::Dinner).await.unwrap();

    assert_eq!(result.patients_processed, 1);
    assert_eq!(result.orders_created, 0);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].error, NO_MEAL_WITHIN_BUDGET);

    // The run itself still completed and left its audit record.
    let executions = scheduler.executions(Some(MealSlot::Dinner), 10).await.unwrap();
    assert_eq!(executions.len(), 1);
    assert_eq!(executions[0].errors.len(), 1);
}

#[tokio::test]
async fn test_heavy_morning_consumption_leaves_only_the_fallback() {
    let store = InMemoryStore::new();
    store.add_patient(patient("p1"));
    store.add_diet_order(standard_diet());
    store.assign_diet_order("p1", "standard");
    store.add_recipe(recipe("feast", RecipeCategory::Entrees, 1600));
    store.add_recipe(recipe("water", RecipeCategory::Sides, 0));

    // A 1600 kcal breakfast already served: the lunch target drops to
    // 606 - (1600 - 606) = -388, so only the zero-calorie fallback fits.
    store
        .seed_tray_order("p1", now_local(), MealSlot::Breakfast, &["feast".to_string()])
        .unwrap();

    let store = Arc::new(store);
    let mut scheduler = scheduler(&store);
    let result = scheduler.run(MealSlot::Lunch).await.unwrap();
    assert_eq!(result.orders_created, 1);

    let today = now_local().date();
    let orders = store
        .tray_orders_between(
            "p1",
            today.and_hms_opt(0, 0, 0).unwrap(),
            today.and_hms_opt(23, 59, 59).unwrap(),
        )
        .await
        .unwrap();
    let lunch = orders.iter().find(|o| o.slot == MealSlot::Lunch).unwrap();
    let ids: Vec<&str> = lunch.recipes.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["water"]);
}
