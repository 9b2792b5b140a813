use crate::domain::model::{MealSlot, Recipe, RecipePools};
use crate::domain::ports::Selector;
use rand::Rng;

/// Budgets at or under this are served as a snack-sized tray instead of a
/// full meal.
pub const QUICK_SNACK_THRESHOLD: i64 = 100;

/// Randomized attempts before composition gives up.
const MAX_ATTEMPTS: usize = 5;

/// Extra side picks at the end of every attempt.
const EXTRA_SIDE_PICKS: usize = 2;

/// Production selection strategy: uniform over the pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct UniformSelector;

impl Selector for UniformSelector {
    fn pick_index(&mut self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Assembles concrete meals from categorized recipe pools without exceeding
/// a calorie target.
pub struct MealComposer<R: Selector> {
    selector: R,
}

impl Default for MealComposer<UniformSelector> {
    fn default() -> Self {
        Self::new(UniformSelector)
    }
}

impl<R: Selector> MealComposer<R> {
    pub fn new(selector: R) -> Self {
        Self { selector }
    }

    /// Selects a meal for `target` calories. An empty result means no meal
    /// could be assembled within budget; the caller must treat that as "no
    /// meal available" rather than retry.
    pub fn compose(&mut self, slot: MealSlot, target: i64, pools: &RecipePools) -> Vec<Recipe> {
        let fallback = zero_calorie_fallback(pools);

        // Nothing left to spend: at most the zero-calorie fallback.
        if target <= 0 {
            return distinct([fallback.cloned()]);
        }

        // Snack-sized budget: the cheapest side that fits, plus the fallback.
        if target <= QUICK_SNACK_THRESHOLD {
            let snack = cheapest_side_within(pools, target);
            return distinct([snack.cloned(), fallback.cloned()]);
        }

        for _ in 0..MAX_ATTEMPTS {
            if let Some(meal) = self.attempt(slot, target, pools, fallback) {
                return meal;
            }
        }

        // All attempts exhausted without landing on the budget.
        Vec::new()
    }

    /// One randomized attempt. Starts from a fresh draft every time; no
    /// state leaks between attempts.
    fn attempt(
        &mut self,
        slot: MealSlot,
        target: i64,
        pools: &RecipePools,
        fallback: Option<&Recipe>,
    ) -> Option<Vec<Recipe>> {
        let mut draft = Draft::start(target);

        // An entree is admitted only strictly under the remaining budget.
        if let Some(entree) = self.pick(&pools.entrees) {
            if entree.calories < draft.remaining {
                draft = draft.with_entree(entree);
            }
        }

        // Near-budget early exit: the entree plus a snack-sized side is a
        // good enough meal.
        if draft.remaining <= QUICK_SNACK_THRESHOLD {
            if let Some(side) = cheapest_side_within(pools, target) {
                draft = draft.with_side(side);
            }
            return Some(draft.assemble(fallback));
        }

        if let Some(side) = self.pick(&pools.sides) {
            if draft.remaining >= side.calories {
                draft = draft.with_side(side);
            }
        }

        // Dinner trays may carry a dessert in the single extra-item slot.
        if slot == MealSlot::Dinner {
            if let Some(dessert) = self.pick(&pools.desserts) {
                if draft.remaining >= dessert.calories {
                    draft = draft.with_extra(dessert);
                }
            }
        }

        // A beverage that fits takes the extra-item slot, replacing any
        // dessert admitted above. Both deduct from the budget.
        if let Some(beverage) = self.pick(&pools.beverages) {
            if draft.remaining >= beverage.calories {
                draft = draft.with_extra(beverage);
            }
        }

        for _ in 0..EXTRA_SIDE_PICKS {
            if let Some(side) = self.pick(&pools.sides) {
                if draft.remaining >= side.calories {
                    draft = draft.with_side(side);
                }
            }
        }

        // The attempt lands only when the budget is fully spent.
        (draft.remaining <= 0).then(|| draft.assemble(fallback))
    }

    fn pick<'a>(&mut self, pool: &'a [Recipe]) -> Option<&'a Recipe> {
        if pool.is_empty() {
            return None;
        }
        pool.get(self.selector.pick_index(pool.len()))
    }
}

/// Composition state for a single attempt. Every admission produces a new
/// draft value; attempts never share drafts.
#[derive(Debug, Clone, Default)]
struct Draft {
    entree: Option<Recipe>,
    sides: Vec<Recipe>,
    /// At most one of dessert or beverage.
    extra: Option<Recipe>,
    remaining: i64,
}

impl Draft {
    fn start(target: i64) -> Self {
        Self {
            remaining: target,
            ..Self::default()
        }
    }

    fn with_entree(self, recipe: &Recipe) -> Self {
        Self {
            entree: Some(recipe.clone()),
            remaining: self.remaining - recipe.calories,
            ..self
        }
    }

    fn with_side(mut self, recipe: &Recipe) -> Self {
        self.sides.push(recipe.clone());
        Self {
            remaining: self.remaining - recipe.calories,
            ..self
        }
    }

    fn with_extra(self, recipe: &Recipe) -> Self {
        Self {
            extra: Some(recipe.clone()),
            remaining: self.remaining - recipe.calories,
            ..self
        }
    }

    /// Final recipe list: entree, sides, extra, then the fallback unless one
    /// of the picks already is that recipe.
    fn assemble(self, fallback: Option<&Recipe>) -> Vec<Recipe> {
        let mut meal: Vec<Recipe> = self
            .entree
            .into_iter()
            .chain(self.sides)
            .chain(self.extra)
            .collect();

        if let Some(fallback) = fallback {
            if meal.iter().all(|r| r.id != fallback.id) {
                meal.push(fallback.clone());
            }
        }

        meal
    }
}

/// The first zero-calorie side, offered even when the budget is spent.
fn zero_calorie_fallback(pools: &RecipePools) -> Option<&Recipe> {
    pools.sides.iter().find(|r| r.calories == 0)
}

fn cheapest_side_within(pools: &RecipePools, limit: i64) -> Option<&Recipe> {
    pools
        .sides
        .iter()
        .filter(|r| r.calories <= limit)
        .min_by_key(|r| r.calories)
}

fn distinct(items: impl IntoIterator<Item = Option<Recipe>>) -> Vec<Recipe> {
    let mut meal: Vec<Recipe> = Vec::new();
    for recipe in items.into_iter().flatten() {
        if meal.iter().all(|r| r.id != recipe.id) {
            meal.push(recipe);
        }
    }
    meal
}
