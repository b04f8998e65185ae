pub mod api_connection;
pub mod cli;
pub mod meal_segmenter;
pub mod nutrition_client;
pub mod ingredient_normalizer;
pub mod meal_aggregator;
pub mod meal_analyzer;
