//! Offline training CLI for the dengue outbreak model.
//!
//! Joins the climate series with per-barangay case counts, fits the random
//! forest and writes the model and encoder artifacts the server loads.

use std::path::PathBuf;

use clap::Parser;
use dengue_forecast_backend::classifier::ForestParams;
use dengue_forecast_backend::services::training::{self, TrainingJob, TrainingReport};
use dengue_forecast_backend::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Train the dengue outbreak classifier.
#[derive(Parser)]
#[command(name = "moskita-train")]
#[command(about = "Train the dengue outbreak random forest")]
struct Cli {
    /// Climate CSV (`date,rainfall,temperature,humidity`).
    #[arg(long)]
    climate: Option<PathBuf>,

    /// Dengue case CSV (`date,barangay,cases`).
    #[arg(long)]
    cases: Option<PathBuf>,

    /// Directory for the model and encoder files.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Number of trees.
    #[arg(long)]
    n_estimators: Option<usize>,

    /// Maximum tree depth.
    #[arg(long)]
    max_depth: Option<usize>,

    /// Random seed for the split and the forest.
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    fn into_job(self, config: &Config) -> TrainingJob {
        let mut job = TrainingJob::from_config(config);
        if let Some(climate) = self.climate {
            job.climate_csv = climate;
        }
        if let Some(cases) = self.cases {
            job.cases_csv = cases;
        }
        if let Some(dir) = self.output_dir {
            job.model_path = dir.join(file_name(&job.model_path, "rf_dengue_model.json"));
            job.encoder_path = dir.join(file_name(&job.encoder_path, "barangay_encoder.json"));
        }
        job.params = ForestParams {
            n_estimators: self.n_estimators.unwrap_or(job.params.n_estimators),
            max_depth: self.max_depth.unwrap_or(job.params.max_depth),
            seed: self.seed.unwrap_or(job.params.seed),
            ..job.params
        };
        job
    }
}

fn file_name(path: &std::path::Path, fallback: &str) -> PathBuf {
    path.file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(fallback))
}

fn print_report(report: &TrainingReport) {
    let metrics = &report.metrics;
    println!("Samples: {} (train {}, test {})", report.samples, report.train_samples, report.test_samples);
    println!("Outbreak samples: {}", report.outbreak_samples);
    println!();
    println!("Accuracy:  {:.4}", metrics.accuracy);
    println!("Precision: {:.4}", metrics.precision);
    println!("Recall:    {:.4}", metrics.recall);
    println!("F1 Score:  {:.4}", metrics.f1_score);
    println!();
    let cm = &metrics.confusion_matrix;
    println!("Confusion matrix: TN {}  FP {}  FN {}  TP {}", cm.tn, cm.fp, cm.fn_, cm.tp);
    println!();
    println!("Feature importance:");
    for item in &metrics.feature_importance {
        println!("  {:20} {:.4}", item.feature, item.importance);
    }
    println!();
    println!("Barangay mapping:");
    for (code, barangay) in report.barangays.iter().enumerate() {
        println!("  {} = {}", code, barangay);
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moskita_train=info,dengue_forecast_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::load()?;
    let job = Cli::parse().into_job(&config);

    tracing::info!(
        "Training from {} and {}",
        job.climate_csv.display(),
        job.cases_csv.display()
    );
    let report = training::run(&job)?;
    print_report(&report);

    println!();
    println!("Model saved to {}", job.model_path.display());
    println!("Encoder saved to {}", job.encoder_path.display());
    Ok(())
}
