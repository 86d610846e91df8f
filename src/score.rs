use crate::model::{Cost, Task};

const IMPACT_WEIGHT: f64 = 1.1;

/// Estimated worth of doing a task: favors high impact, low cost, high
/// priority and fun work.
pub fn calculate_value(task: &Task) -> f64 {
    let impact = task.impact.ordinal() as f64;
    let cheapness = (Cost::XXL.ordinal() - task.cost.ordinal()) as f64;
    let base = (impact * IMPACT_WEIGHT + 1.0) * (cheapness + 1.0);
    base * task.priority.multiplier() * task.fun.multiplier()
}

/// Coarse bucket of a value for compact listings.
pub fn value_label(value: f64) -> &'static str {
    if value > 30.0 {
        "$$$$"
    } else if value > 22.0 {
        "$$$"
    } else if value > 13.0 {
        "$$"
    } else if value > 7.0 {
        "$"
    } else {
        ""
    }
}
