use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use meal_estimator::meal_analyzer::{naive_split, AnalysisError, MealAnalyzer};
use meal_estimator::nutrition_client::{
    EdamamClient, EdamamConfig, LookupError, LookupOutcome, NutritionLookup, NutritionRecord,
};

fn ok_record(food: &str, weight: f64, kcal: f64, protein: f64, carbs: f64, fat: f64) -> NutritionRecord {
    serde_json::from_value(json!({
        "ingredients": [{
            "parsed": [{
                "food": food,
                "weight": weight,
                "status": "OK",
                "nutrients": {
                    "ENERC_KCAL": { "quantity": kcal },
                    "PROCNT": { "quantity": protein },
                    "CHOCDF": { "quantity": carbs },
                    "FAT": { "quantity": fat }
                }
            }]
        }]
    }))
    .expect("test record should deserialize")
}

/// Scripted lookup: each phrase maps to an outcome, optionally delivered
/// after a delay so tests can invert completion order.
#[derive(Clone)]
enum Script {
    Ok(NutritionRecord),
    DelayedOk(u64, NutritionRecord),
    Fail,
    RateLimit,
}

struct ScriptedLookup {
    scripts: HashMap<String, Script>,
}

impl ScriptedLookup {
    fn new(entries: Vec<(&str, Script)>) -> Arc<Self> {
        Arc::new(Self {
            scripts: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        })
    }
}

#[async_trait]
impl NutritionLookup for ScriptedLookup {
    async fn lookup(&self, phrase: &str) -> Result<LookupOutcome, LookupError> {
        match self.scripts.get(phrase) {
            Some(Script::Ok(record)) => Ok(LookupOutcome::Success(record.clone())),
            Some(Script::DelayedOk(ms, record)) => {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
                Ok(LookupOutcome::Success(record.clone()))
            }
            Some(Script::Fail) => Ok(LookupOutcome::Failure),
            Some(Script::RateLimit) => Err(LookupError::RateLimited),
            None => Ok(LookupOutcome::Failure),
        }
    }
}

fn phrases(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn empty_input_is_rejected() {
    let analyzer = MealAnalyzer::new(ScriptedLookup::new(vec![]));
    let result = analyzer.analyze_ingredients(&[]).await;
    assert!(matches!(result, Err(AnalysisError::InputEmpty)));
}

#[tokio::test]
async fn all_failed_lookups_surface_as_too_vague() {
    let analyzer = MealAnalyzer::new(ScriptedLookup::new(vec![("xyzinvalid", Script::Fail)]));
    let result = analyzer.analyze_ingredients(&phrases(&["xyzinvalid"])).await;
    assert!(matches!(result, Err(AnalysisError::InputTooVague)));
}

#[tokio::test]
async fn partial_failure_still_succeeds_with_warning() {
    let analyzer = MealAnalyzer::new(ScriptedLookup::new(vec![
        (
            "150g chicken",
            Script::Ok(ok_record("chicken", 150.0, 300.0, 30.0, 2.0, 10.0)),
        ),
        ("xyzinvalid", Script::Fail),
    ]));

    let result = analyzer
        .analyze_ingredients(&phrases(&["150g chicken", "xyzinvalid"]))
        .await
        .expect("one parsed phrase is enough for a result");

    assert_eq!(result.breakdown.len(), 2);
    assert_eq!(result.breakdown[0].food, "chicken");
    assert_eq!(result.breakdown[1].food, "xyzinvalid");
    assert_eq!(result.warnings[0], "Could not parse: xyzinvalid");
    assert_eq!(result.confidence, 0.5);
}

#[tokio::test]
async fn rate_limit_on_any_phrase_aborts_the_batch() {
    let analyzer = MealAnalyzer::new(ScriptedLookup::new(vec![
        (
            "2 large eggs",
            Script::Ok(ok_record("egg", 100.0, 140.0, 12.0, 1.0, 10.0)),
        ),
        ("70g white bread", Script::RateLimit),
    ]));

    let result = analyzer
        .analyze_ingredients(&phrases(&["2 large eggs", "70g white bread"]))
        .await;
    assert!(matches!(result, Err(AnalysisError::ProviderRateLimit)));
    if let Err(e) = result {
        assert_eq!(e.code(), "PROVIDER_RATE_LIMIT");
    }
}

#[tokio::test]
async fn output_is_invariant_to_completion_order() {
    let eggs = ok_record("egg", 100.0, 140.0, 12.0, 1.0, 10.0);
    let bread = ok_record("white bread", 70.0, 180.0, 6.0, 34.0, 2.0);
    let input = phrases(&["2 large eggs", "70g white bread"]);

    // First phrase finishes last; breakdown order must still follow input
    // order.
    let delayed = MealAnalyzer::new(ScriptedLookup::new(vec![
        ("2 large eggs", Script::DelayedOk(50, eggs.clone())),
        ("70g white bread", Script::Ok(bread.clone())),
    ]));
    let prompt = MealAnalyzer::new(ScriptedLookup::new(vec![
        ("2 large eggs", Script::Ok(eggs)),
        ("70g white bread", Script::Ok(bread)),
    ]));

    let delayed_result = delayed
        .analyze_ingredients(&input)
        .await
        .expect("delayed batch should succeed");
    let prompt_result = prompt
        .analyze_ingredients(&input)
        .await
        .expect("prompt batch should succeed");

    assert_eq!(delayed_result, prompt_result);
    assert_eq!(delayed_result.breakdown[0].food, "egg");
    assert_eq!(delayed_result.breakdown[1].food, "white bread");
    assert_eq!(delayed_result.macros.calories, 320.0);
}

#[tokio::test]
async fn legacy_text_entry_splits_on_commas_and_newlines() {
    let analyzer = MealAnalyzer::new(ScriptedLookup::new(vec![
        (
            "2 large eggs",
            Script::Ok(ok_record("egg", 100.0, 140.0, 12.0, 1.0, 10.0)),
        ),
        (
            "70g white bread",
            Script::Ok(ok_record("white bread", 70.0, 180.0, 6.0, 34.0, 2.0)),
        ),
    ]));

    let result = analyzer
        .analyze_meal_text(" 2 large eggs ,\n70g white bread,\n")
        .await
        .expect("split phrases should analyze");

    assert_eq!(result.breakdown.len(), 2);
    assert_eq!(result.macros.calories, 320.0);
}

#[tokio::test]
async fn legacy_text_entry_rejects_blank_text() {
    let analyzer = MealAnalyzer::new(ScriptedLookup::new(vec![]));
    let result = analyzer.analyze_meal_text("  , \n , ").await;
    assert!(matches!(result, Err(AnalysisError::InputEmpty)));
}

#[test]
fn naive_split_trims_and_drops_empties() {
    assert_eq!(
        naive_split("eggs, bread\n banana ,,\n"),
        vec!["eggs".to_string(), "bread".to_string(), "banana".to_string()]
    );
    assert!(naive_split("  \n , ").is_empty());
}

#[test]
fn error_body_carries_stable_codes() {
    assert_eq!(AnalysisError::InputEmpty.code(), "INPUT_EMPTY");
    assert_eq!(AnalysisError::InputTooVague.code(), "INPUT_TOO_VAGUE");
    assert_eq!(AnalysisError::ProviderRateLimit.code(), "PROVIDER_RATE_LIMIT");

    let body = AnalysisError::InputTooVague.to_error_body();
    assert!(body.message.contains("quantities"));
    let value = serde_json::to_value(&body).expect("error body should serialize");
    assert_eq!(value["code"], "INPUT_TOO_VAGUE");
    assert!(value.get("details").is_none());
}

// Live test against the real Edamam API. Requires EDAMAM_APP_ID and
// EDAMAM_APP_KEY; run with `cargo test -- --ignored`.
#[tokio::test]
#[ignore]
async fn live_edamam_lookup_roundtrip() {
    dotenv::dotenv().ok();
    if std::env::var("EDAMAM_APP_ID").is_err() || std::env::var("EDAMAM_APP_KEY").is_err() {
        println!("Skipping live_edamam_lookup_roundtrip: Edamam credentials not set.");
        return;
    }

    let config = EdamamConfig::from_env().expect("credentials checked above");
    let analyzer = MealAnalyzer::new(Arc::new(EdamamClient::new(config)));

    let result = analyzer
        .analyze_ingredients(&phrases(&["150g chicken breast"]))
        .await
        .expect("live lookup should succeed");

    assert!(!result.breakdown.is_empty());
    assert!(result.macros.calories > 0.0);
    assert!(result.confidence > 0.0 && result.confidence <= 1.0);
}
