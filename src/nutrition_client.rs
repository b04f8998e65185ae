use async_trait::async_trait;
use log::warn;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::env;
use std::error::Error;
use std::fmt;

pub const DEFAULT_EDAMAM_BASE_URL: &str = "https://api.edamam.com";

/// Credentials and endpoint for the Edamam nutrition-data API. Built once
/// (usually from the environment) and handed to the client at construction;
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct EdamamConfig {
    pub app_id: String,
    pub app_key: String,
    pub base_url: String,
}

impl EdamamConfig {
    pub fn from_env() -> Result<Self, LookupConfigError> {
        Ok(Self {
            app_id: env::var("EDAMAM_APP_ID")
                .map_err(|_| LookupConfigError::MissingEnvVar("EDAMAM_APP_ID"))?,
            app_key: env::var("EDAMAM_APP_KEY")
                .map_err(|_| LookupConfigError::MissingEnvVar("EDAMAM_APP_KEY"))?,
            base_url: env::var("EDAMAM_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_EDAMAM_BASE_URL.to_string()),
        })
    }
}

#[derive(Debug)]
pub enum LookupConfigError {
    MissingEnvVar(&'static str),
}

impl fmt::Display for LookupConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupConfigError::MissingEnvVar(name) => {
                write!(f, "Required environment variable not set: {}", name)
            }
        }
    }
}

impl Error for LookupConfigError {}

/// The only lookup failure that propagates out of a batch. Every other
/// provider failure is absorbed into `LookupOutcome::Failure` for the one
/// phrase it affected.
#[derive(Debug)]
pub enum LookupError {
    RateLimited,
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::RateLimited => write!(f, "Nutrition provider rate limit hit (429)"),
        }
    }
}

impl Error for LookupError {}

/// Result of one phrase lookup. A `Success` whose record contains zero OK
/// sub-items is treated by the aggregator exactly like a `Failure`.
#[derive(Debug, Clone)]
pub enum LookupOutcome {
    Success(NutritionRecord),
    Failure,
}

// Edamam nutrition-data response shape. Only the fields the normalizer
// consumes are modelled; everything else in the payload is ignored.

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NutritionRecord {
    #[serde(default)]
    pub ingredients: Vec<IngredientEntry>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct IngredientEntry {
    #[serde(default)]
    pub parsed: Vec<ParsedSubItem>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ParsedSubItem {
    pub food: String,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub status: String,
    pub nutrients: Option<NutrientBlock>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NutrientBlock {
    #[serde(rename = "ENERC_KCAL")]
    pub energy: Option<NutrientQuantity>,
    #[serde(rename = "PROCNT")]
    pub protein: Option<NutrientQuantity>,
    #[serde(rename = "CHOCDF")]
    pub carbs: Option<NutrientQuantity>,
    #[serde(rename = "FAT")]
    pub fat: Option<NutrientQuantity>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NutrientQuantity {
    #[serde(default)]
    pub quantity: f64,
}

/// Capability seam between the orchestrator and the provider, so batches
/// can be driven end-to-end against stub lookups in tests.
#[async_trait]
pub trait NutritionLookup: Send + Sync {
    async fn lookup(&self, phrase: &str) -> Result<LookupOutcome, LookupError>;
}

#[derive(Debug, Clone)]
pub struct EdamamClient {
    client: Client,
    config: EdamamConfig,
}

impl EdamamClient {
    pub fn new(config: EdamamConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl NutritionLookup for EdamamClient {
    /// One provider round trip per phrase; phrases are never batched into a
    /// single call. Ordinary failures (non-2xx other than 429, transport
    /// faults, malformed success bodies) are logged and returned as
    /// `Failure` so the rest of the batch continues.
    async fn lookup(&self, phrase: &str) -> Result<LookupOutcome, LookupError> {
        let url = format!("{}/api/nutrition-data", self.config.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("app_id", self.config.app_id.as_str()),
                ("app_key", self.config.app_key.as_str()),
                ("ingr", phrase),
            ])
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!("Nutrition lookup failed for '{}': transport error: {}", phrase, e);
                return Ok(LookupOutcome::Failure);
            }
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(LookupError::RateLimited);
        }
        if !status.is_success() {
            warn!("Nutrition lookup failed for '{}': status {}", phrase, status);
            return Ok(LookupOutcome::Failure);
        }

        match response.json::<NutritionRecord>().await {
            Ok(record) => Ok(LookupOutcome::Success(record)),
            Err(e) => {
                warn!("Nutrition lookup failed for '{}': invalid body: {}", phrase, e);
                Ok(LookupOutcome::Failure)
            }
        }
    }
}
