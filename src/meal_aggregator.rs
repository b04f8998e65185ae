use serde::{Deserialize, Serialize};

use crate::ingredient_normalizer::{flatten_record, round1, round2};
use crate::nutrition_client::LookupOutcome;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct MacroTotals {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

/// One line of the user-facing itemization: one row per failed phrase, one
/// row per parsed sub-item of a successful phrase. `input` is always the
/// original phrase text; for failed rows `food` repeats it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BreakdownRow {
    pub input: String,
    pub food: String,
    pub weight_g: f64,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl BreakdownRow {
    fn zeroed(phrase: &str) -> Self {
        Self {
            input: phrase.to_string(),
            food: phrase.to_string(),
            weight_g: 0.0,
            calories: 0.0,
            protein_g: 0.0,
            carbs_g: 0.0,
            fat_g: 0.0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AggregateResult {
    pub macros: MacroTotals,
    #[serde(rename = "totalWeight_g")]
    pub total_weight_g: f64,
    #[serde(rename = "normalizedText")]
    pub normalized_text: String,
    pub breakdown: Vec<BreakdownRow>,
    pub confidence: f64,
    pub warnings: Vec<String>,
}

/// Aggregation output plus the parsed sub-item count the orchestrator needs
/// for its all-phrases-failed check.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub result: AggregateResult,
    pub parsed_count: usize,
}

/// Combines per-phrase lookup outcomes (aligned 1:1 with `phrases`) into a
/// single estimate. Every phrase contributes at least one breakdown row, so
/// the row count never drops below the phrase count. Totals sum the
/// already-rounded row values and round once more; that double rounding is
/// deliberate output compatibility.
pub fn aggregate(phrases: &[String], outcomes: &[LookupOutcome]) -> Aggregation {
    let mut breakdown: Vec<BreakdownRow> = Vec::with_capacity(phrases.len());
    let mut failed_inputs: Vec<&str> = Vec::new();
    let mut parsed_foods: Vec<String> = Vec::new();
    let mut parsed_count = 0usize;

    let mut calories = 0.0;
    let mut protein_g = 0.0;
    let mut carbs_g = 0.0;
    let mut fat_g = 0.0;
    let mut weight_g = 0.0;

    for (phrase, outcome) in phrases.iter().zip(outcomes.iter()) {
        let rows = match outcome {
            LookupOutcome::Failure => Vec::new(),
            LookupOutcome::Success(record) => flatten_record(record),
        };

        // A success that parsed into nothing is the same as a failure.
        if rows.is_empty() {
            failed_inputs.push(phrase);
            breakdown.push(BreakdownRow::zeroed(phrase));
            continue;
        }

        for row in rows {
            calories += row.calories;
            protein_g += row.protein_g;
            carbs_g += row.carbs_g;
            fat_g += row.fat_g;
            weight_g += row.weight_g;
            parsed_count += 1;
            parsed_foods.push(row.food.clone());
            breakdown.push(BreakdownRow {
                input: phrase.clone(),
                food: row.food,
                weight_g: row.weight_g,
                calories: row.calories,
                protein_g: row.protein_g,
                carbs_g: row.carbs_g,
                fat_g: row.fat_g,
            });
        }
    }

    let mut warnings = Vec::new();
    if !failed_inputs.is_empty() {
        warnings.push(format!("Could not parse: {}", failed_inputs.join(", ")));
    }

    let macros = MacroTotals {
        calories: calories.round(),
        protein_g: round1(protein_g),
        carbs_g: round1(carbs_g),
        fat_g: round1(fat_g),
    };

    let normalized_text = if parsed_foods.is_empty() {
        phrases.join(", ")
    } else {
        parsed_foods.join(", ")
    };

    let confidence = confidence_score(parsed_count, phrases.len(), &macros);
    if confidence < 0.5 {
        warnings.push("Low confidence estimate - consider adding more detail".to_string());
    }

    Aggregation {
        result: AggregateResult {
            macros,
            total_weight_g: weight_g.round(),
            normalized_text,
            breakdown,
            confidence,
            warnings,
        },
        parsed_count,
    }
}

/// Blends lookup success rate with macro-field completeness. The multiplier
/// runs from 0.5 (no non-zero macro in the totals) to 1.0 (all four
/// present), so a batch that resolved every phrase but yielded only
/// calories scores below one with a full profile. Clamped to 1.0 and
/// rounded to 2 decimals.
///
/// The denominator is the original phrase count; a phrase that decomposes
/// into several sub-items can push the raw rate above 1 before the clamp.
pub fn confidence_score(parsed_count: usize, phrase_count: usize, totals: &MacroTotals) -> f64 {
    if phrase_count == 0 {
        return 0.0;
    }
    let success_rate = parsed_count as f64 / phrase_count as f64;
    let has_macros = [totals.calories, totals.protein_g, totals.carbs_g, totals.fat_g]
        .iter()
        .filter(|v| **v > 0.0)
        .count();
    let raw = success_rate * (0.5 + has_macros as f64 / 8.0);
    round2(raw.min(1.0))
}
