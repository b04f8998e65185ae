use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tokio::fs;

use meal_estimator::cli::parse_args;
use meal_estimator::meal_analyzer::{AnalysisError, MealAnalyzer};
use meal_estimator::meal_segmenter::{LlmSegmenter, NaiveSegmenter, TextSegmenter};
use meal_estimator::nutrition_client::{EdamamClient, EdamamConfig};

const OPENROUTER_API_KEY_ENV_VAR: &str = "OPENROUTER_API_KEY";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok(); // Load .env for API credentials
    env_logger::init();

    let cli_args = parse_args();

    let meal_text = match (&cli_args.meal_text, &cli_args.meal_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read meal file '{}'", path))?,
        (None, None) => bail!("Provide a meal description inline or via --meal-file"),
    };

    let config = EdamamConfig::from_env()
        .context("Failed to load Edamam credentials (EDAMAM_APP_ID / EDAMAM_APP_KEY)")?;
    let analyzer = MealAnalyzer::new(Arc::new(EdamamClient::new(config)));

    let segmenter: Box<dyn TextSegmenter> = if cli_args.llm {
        Box::new(
            LlmSegmenter::new(OPENROUTER_API_KEY_ENV_VAR)
                .context("Failed to initialize LLM segmenter")?,
        )
    } else {
        Box::new(NaiveSegmenter)
    };

    println!("Segmenting meal description...");
    let phrases = segmenter.segment(&meal_text).await;
    println!("Analyzing {} ingredient phrase(s)...", phrases.len());

    match analyzer.analyze_ingredients(&phrases).await {
        Ok(result) => {
            let payload = serde_json::to_string_pretty(&result)
                .context("Failed to serialize analysis result")?;
            println!("{}", payload);
            Ok(())
        }
        Err(e) => {
            let body = e.to_error_body();
            if let AnalysisError::Internal(detail) = &e {
                // Internal detail stays in the server-side log only.
                log::error!("Internal analysis failure: {}", detail);
            }
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&body)
                    .context("Failed to serialize error payload")?
            );
            Err(anyhow::anyhow!("Meal analysis failed: {}", e))
        }
    }
}
