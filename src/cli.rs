use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Meal description given inline, e.g. "2 large eggs, 70g white bread"
    #[arg(conflicts_with = "meal_file")]
    pub meal_text: Option<String>,

    /// Path to a text file holding the meal description
    #[arg(short, long)]
    pub meal_file: Option<String>,

    /// Segment the meal text with the LLM instead of the naive
    /// comma/newline split
    #[arg(long)]
    pub llm: bool,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
