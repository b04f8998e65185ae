use crate::nutrition_client::{NutrientQuantity, NutritionRecord};

/// One food entity extracted from a provider record, with its nutrient
/// values already rounded to output precision.
#[derive(Debug, Clone)]
pub struct SubItemRow {
    pub food: String,
    pub weight_g: f64,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn quantity_or_zero(q: &Option<NutrientQuantity>) -> f64 {
    q.as_ref().map(|n| n.quantity).unwrap_or(0.0)
}

/// Flattens every OK sub-item of a record into rows, preserving provider
/// order. Sub-items whose status is not "OK", or which carry no nutrients
/// block, are dropped. Missing nutrient fields count as 0, not as absent.
///
/// Calories and weight round to the nearest gram/kcal; protein, carbs and
/// fat keep one decimal.
pub fn flatten_record(record: &NutritionRecord) -> Vec<SubItemRow> {
    let mut rows = Vec::new();
    for entry in &record.ingredients {
        for item in &entry.parsed {
            if item.status != "OK" {
                continue;
            }
            let nutrients = match &item.nutrients {
                Some(n) => n,
                None => continue,
            };
            rows.push(SubItemRow {
                food: item.food.clone(),
                weight_g: item.weight.round(),
                calories: quantity_or_zero(&nutrients.energy).round(),
                protein_g: round1(quantity_or_zero(&nutrients.protein)),
                carbs_g: round1(quantity_or_zero(&nutrients.carbs)),
                fat_g: round1(quantity_or_zero(&nutrients.fat)),
            });
        }
    }
    rows
}
