use clap::{Parser, Subcommand};
use hybrid_rec::{Dataset, HybridConfig, Recommender, SnapshotLoader};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hybrid-rec")]
#[command(about = "Hybrid CF + content-based restaurant recommendations")]
#[command(version)]
struct Args {
    /// Directory holding rating_final.csv, geoplaces2.csv and chefmozcuisine.csv
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// JSON file overriding the default weights and evaluation settings
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Top-N hybrid recommendations for one user
    Recommend {
        user_id: String,

        #[arg(short = 'n', long, default_value = "10")]
        top_n: usize,
    },

    /// Held-out RMSE and Precision@K
    Evaluate {
        #[arg(short, long)]
        k: Option<usize>,

        /// Random seed for the holdout split
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Users that can receive recommendations
    Users,
}

/// JSON body for `recommend`, and whether the user was found.
fn recommend_output(recommender: &dyn Recommender, user_id: &str, top_n: usize) -> anyhow::Result<(Value, bool)> {
    match recommender.recommend(user_id, top_n) {
        Ok(recommendations) => Ok((
            json!({
                "user_id": user_id,
                "count": recommendations.len(),
                "recommendations": recommendations,
            }),
            true,
        )),
        Err(err) if err.is_not_found() => {
            tracing::warn!("{err}");
            Ok((json!({ "error": format!("User {user_id} not found") }), false))
        }
        Err(err) => Err(err.into()),
    }
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => HybridConfig::load(path)?,
        None => HybridConfig::default(),
    };
    if let Command::Evaluate { k, seed } = &args.command {
        if let Some(k) = k {
            config.evaluation.k = *k;
        }
        if let Some(seed) = seed {
            config.evaluation.seed = *seed;
        }
        config.validate()?;
    }

    tracing::info!(dir = %args.data_dir.display(), "Loading data");
    let dataset = Dataset::from_dir(&args.data_dir)?;
    let mut loader = SnapshotLoader::new(dataset, config);
    let snapshot = loader.get()?;

    let (output, found) = match args.command {
        Command::Recommend { user_id, top_n } => recommend_output(snapshot.as_ref(), &user_id, top_n)?,
        Command::Evaluate { .. } => (serde_json::to_value(snapshot.evaluate()?)?, true),
        Command::Users => (json!({ "users": snapshot.users() }), true),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(if found { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
