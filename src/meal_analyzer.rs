use serde::Serialize;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::meal_aggregator::{aggregate, AggregateResult};
use crate::nutrition_client::{LookupError, LookupOutcome, NutritionLookup};

/// Terminal errors for one meal-analysis request. Per-phrase lookup
/// failures never surface here; they are absorbed into zero-valued
/// breakdown rows and warnings. Only an empty input, a fully failed batch,
/// or a provider rate limit ends the request.
#[derive(Debug)]
pub enum AnalysisError {
    InputEmpty,
    InputTooVague,
    ProviderRateLimit,
    ProviderUnavailable(String),
    ProviderParseFailed(String),
    Internal(String),
}

impl AnalysisError {
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::InputEmpty => "INPUT_EMPTY",
            AnalysisError::InputTooVague => "INPUT_TOO_VAGUE",
            AnalysisError::ProviderRateLimit => "PROVIDER_RATE_LIMIT",
            AnalysisError::ProviderUnavailable(_) => "PROVIDER_UNAVAILABLE",
            AnalysisError::ProviderParseFailed(_) => "PROVIDER_PARSE_FAILED",
            AnalysisError::Internal(_) => "INTERNAL",
        }
    }

    /// Caller-facing payload: stable code, human-readable message, optional
    /// detail. Internal detail stays server-side (logs), not in the body.
    pub fn to_error_body(&self) -> ErrorBody {
        let (message, details) = match self {
            AnalysisError::InputEmpty => ("No ingredients to analyze".to_string(), None),
            AnalysisError::InputTooVague => (
                "Could not identify any ingredients - try adding quantities, e.g. '150g chicken breast'"
                    .to_string(),
                None,
            ),
            AnalysisError::ProviderRateLimit => (
                "Nutrition provider rate limit reached - try again shortly".to_string(),
                None,
            ),
            AnalysisError::ProviderUnavailable(detail) => {
                ("Nutrition provider unavailable".to_string(), Some(detail.clone()))
            }
            AnalysisError::ProviderParseFailed(detail) => {
                ("Nutrition provider returned an unreadable response".to_string(), Some(detail.clone()))
            }
            AnalysisError::Internal(_) => ("Internal error".to_string(), None),
        };
        ErrorBody {
            code: self.code(),
            message,
            details,
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::InputEmpty => write!(f, "No ingredients to analyze"),
            AnalysisError::InputTooVague => {
                write!(f, "No ingredient yielded usable nutrition data")
            }
            AnalysisError::ProviderRateLimit => write!(f, "Nutrition provider rate limit hit"),
            AnalysisError::ProviderUnavailable(detail) => {
                write!(f, "Nutrition provider unavailable: {}", detail)
            }
            AnalysisError::ProviderParseFailed(detail) => {
                write!(f, "Nutrition provider response unreadable: {}", detail)
            }
            AnalysisError::Internal(detail) => write!(f, "Internal error: {}", detail),
        }
    }
}

impl Error for AnalysisError {}

#[derive(Debug, Serialize, Clone)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Splits raw meal text on commas and newlines, trimming each segment and
/// dropping empties. The legacy entry point for callers without their own
/// segmenter.
pub fn naive_split(text: &str) -> Vec<String> {
    text.split(|c| c == ',' || c == '\n')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Fan-out/fan-in coordinator: one concurrent lookup per phrase, outcomes
/// paired back to their original index so the aggregate is deterministic in
/// input order regardless of completion order.
pub struct MealAnalyzer<L: NutritionLookup> {
    lookup: Arc<L>,
}

impl<L: NutritionLookup + 'static> MealAnalyzer<L> {
    pub fn new(lookup: Arc<L>) -> Self {
        Self { lookup }
    }

    pub async fn analyze_ingredients(
        &self,
        phrases: &[String],
    ) -> Result<AggregateResult, AnalysisError> {
        if phrases.is_empty() {
            return Err(AnalysisError::InputEmpty);
        }

        let mut tasks = JoinSet::new();
        for (idx, phrase) in phrases.iter().enumerate() {
            let lookup = Arc::clone(&self.lookup);
            let phrase = phrase.clone();
            tasks.spawn(async move { (idx, lookup.lookup(&phrase).await) });
        }

        // Results land in completion order; slot them back by index. A rate
        // limit on any phrase aborts the whole batch and the remaining
        // in-flight results are never consulted.
        let mut outcomes: Vec<Option<LookupOutcome>> = phrases.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (idx, result) =
                joined.map_err(|e| AnalysisError::Internal(format!("lookup task failed: {}", e)))?;
            match result {
                Ok(outcome) => outcomes[idx] = Some(outcome),
                Err(LookupError::RateLimited) => return Err(AnalysisError::ProviderRateLimit),
            }
        }
        let outcomes: Vec<LookupOutcome> = outcomes
            .into_iter()
            .map(|o| o.unwrap_or(LookupOutcome::Failure))
            .collect();

        let aggregation = aggregate(phrases, &outcomes);
        if aggregation.parsed_count == 0 {
            return Err(AnalysisError::InputTooVague);
        }
        Ok(aggregation.result)
    }

    /// Legacy entry point: raw, un-segmented meal text, split naively on
    /// commas and newlines.
    pub async fn analyze_meal_text(&self, text: &str) -> Result<AggregateResult, AnalysisError> {
        let phrases = naive_split(text);
        if phrases.is_empty() {
            return Err(AnalysisError::InputEmpty);
        }
        self.analyze_ingredients(&phrases).await
    }
}
