use crate::domain::model::{DailyBudget, MealSlot};

/// Calories set aside for the dessert that rides on the dinner tray.
pub const DESSERT_CALORIE_APPROXIMATION: i64 = 120;

/// Calorie target for one meal, adjusted for what the patient has already
/// consumed today.
///
/// The base is one third of the midpoint of the daily range — an even
/// three-meal split. Dinner gets the dessert allowance on top; breakfast and
/// lunch each give up half of it. The adjustment then removes the *expected*
/// prior-meal allotment from actual consumption, so only unexpected over- or
/// under-consumption (snacks, refused trays) shifts the target.
///
/// The result may be zero or negative; the composer handles that.
pub fn adjusted_target(slot: MealSlot, budget: &DailyBudget) -> i64 {
    // Saturating: an unbounded maximum is modeled as i64::MAX.
    let base = budget.maximum.saturating_add(budget.minimum) / 2 / 3;
    let dinner_target = base.saturating_add(DESSERT_CALORIE_APPROXIMATION);
    let light_meal_target = base - DESSERT_CALORIE_APPROXIMATION / 2;

    match slot {
        MealSlot::Dinner => dinner_target - (budget.consumed - 2 * light_meal_target),
        MealSlot::Lunch => light_meal_target - (budget.consumed - light_meal_target),
        MealSlot::Breakfast => light_meal_target - budget.consumed,
    }
}
