use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use smarttrip_agents::ItineraryPlanner;
use smarttrip_core::{build_prompt, is_valid_image_url, parse_itinerary_response, TripForm};
use smarttrip_generation::{GeminiConfig, Generator};
use smarttrip_observability::{init_tracing, AppMetrics};

#[derive(Debug, Parser)]
#[command(name = "smarttrip")]
#[command(about = "SmartTrip itinerary generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate itinerary options and print them as JSON.
    Plan {
        #[command(flatten)]
        trip: TripArgs,
        #[command(flatten)]
        gemini: GeminiArgs,
        /// Regenerate this many extra times, keeping only the last set.
        #[arg(long, default_value_t = 0)]
        regenerate: u8,
        /// Mark this option index as selected before printing.
        #[arg(long)]
        select: Option<usize>,
    },
    /// Print the prompt that would be sent for a trip.
    Prompt {
        #[command(flatten)]
        trip: TripArgs,
    },
    /// Decode a saved model response.
    Parse { file: PathBuf },
    /// Report whether an image URL would be kept.
    CheckImage { url: String },
}

#[derive(Debug, Args)]
struct TripArgs {
    #[arg(long)]
    destination: String,
    #[arg(long)]
    start: NaiveDate,
    #[arg(long)]
    end: NaiveDate,
    #[arg(long = "interest", required = true)]
    interests: Vec<String>,
    #[arg(long, default_value_t = 1000)]
    budget: i64,
    #[arg(long, default_value = "solo")]
    group: String,
}

impl TripArgs {
    fn into_form(self) -> TripForm {
        TripForm {
            destination: self.destination,
            start_date: Some(self.start),
            end_date: Some(self.end),
            interests: self.interests,
            budget: self.budget,
            group_type: self.group,
        }
    }
}

#[derive(Debug, Args)]
struct GeminiArgs {
    #[arg(long, env = "SMARTTRIP_GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, env = "SMARTTRIP_GEMINI_MODEL")]
    model: Option<String>,
}

impl GeminiArgs {
    fn into_config(self) -> GeminiConfig {
        let mut config = GeminiConfig::from_env();
        if let Some(api_key) = self.api_key {
            config.api_key = Some(api_key);
        }
        if let Some(model) = self.model {
            config.model = model;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing("smarttrip_cli");
    let cli = Cli::parse();
    let today = Local::now().date_naive();

    match cli.command {
        Command::Plan {
            trip,
            gemini,
            regenerate,
            select,
        } => {
            let generator = Generator::gemini(gemini.into_config())?;
            let planner = ItineraryPlanner::new(Arc::new(generator), AppMetrics::shared());

            let (session, mut view) = planner.plan(&trip.into_form(), today).await?;
            for _ in 0..regenerate {
                view = planner.regenerate(&session).await?;
            }
            if let Some(index) = select {
                session.select(index)?;
                view = session.view();
            }

            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Command::Prompt { trip } => {
            let request = trip.into_form().validate(today)?;
            println!("{}", build_prompt(&request));
        }
        Command::Parse { file } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("failed reading {}", file.display()))?;
            let parsed = parse_itinerary_response(&text)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "images_dropped": parsed.images_dropped,
                    "options": parsed.options,
                }))?
            );
        }
        Command::CheckImage { url } => {
            if is_valid_image_url(Some(&url)) {
                println!("valid");
            } else {
                println!("invalid");
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
