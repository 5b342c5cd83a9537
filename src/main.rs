use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::error;

use property_price::config::PipelineConfig;
use property_price::model::EstimatorKind;
use property_price::pipeline::TrainingPipeline;
use property_price::serving::{InferenceAdapter, PropertyInput};
use property_price::{PipelineError, Result};

#[derive(Debug, Parser)]
#[command(
    name = "property-price",
    about = "Clean sale records, train price estimators and predict single properties",
    after_help = "Log verbosity follows RUST_LOG, e.g. RUST_LOG=property_price=debug."
)]
struct Cli {
    #[arg(long, global = true, value_name = "FILE", help = "JSON pipeline configuration")]
    config: Option<PathBuf>,
    #[arg(
        long = "artifact-dir",
        global = true,
        value_name = "DIR",
        help = "Directory holding preprocessor.bin and estimator.bin"
    )]
    artifact_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Normalize, format, impute and deduplicate a raw sales CSV.
    Clean {
        #[arg(long, value_name = "CSV")]
        input: PathBuf,
        #[arg(long, value_name = "CSV")]
        output: PathBuf,
    },
    /// Derive features from a cleaned CSV and write the canonical feature table.
    Engineer {
        #[arg(long, value_name = "CSV")]
        input: PathBuf,
        #[arg(long, value_name = "CSV")]
        output: PathBuf,
    },
    /// Train on a raw sales CSV, print evaluation metrics and save artifacts.
    Train {
        #[arg(long, value_name = "CSV")]
        input: PathBuf,
        #[arg(long, help = "Seed for the train/test split")]
        seed: Option<u64>,
        #[arg(long = "test-size", help = "Share of rows held out for evaluation")]
        test_size: Option<f64>,
        #[arg(long, value_name = "ESTIMATOR", help = "Estimator to persist: ridge or knn")]
        select: Option<EstimatorKind>,
        #[arg(long = "report", value_name = "JSON", help = "Also write the report as JSON")]
        report: Option<PathBuf>,
    },
    /// Predict the price of one property, or of a JSON array of properties.
    Predict {
        #[arg(long, value_name = "JSON")]
        input: PathBuf,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PredictInput {
    One(PropertyInput),
    Many(Vec<PropertyInput>),
}

fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "command failed");
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = cli.artifact_dir {
        config.artifact_dir = dir;
    }

    match cli.command {
        Command::Clean { input, output } => {
            let table = TrainingPipeline::new(config).clean_file(&input, &output)?;
            println!(
                "wrote {} rows x {} columns to {}",
                table.n_rows(),
                table.n_cols(),
                output.display()
            );
        }
        Command::Engineer { input, output } => {
            let table = TrainingPipeline::new(config).engineer_file(&input, &output)?;
            println!(
                "wrote {} rows x {} columns to {}",
                table.n_rows(),
                table.n_cols(),
                output.display()
            );
        }
        Command::Train {
            input,
            seed,
            test_size,
            select,
            report,
        } => {
            if let Some(seed) = seed {
                config.seed = seed;
            }
            if let Some(test_size) = test_size {
                config.test_size = test_size;
            }
            if let Some(kind) = select {
                config.selected_estimator = kind;
            }
            config.validate()?;

            let summary = TrainingPipeline::new(config.clone()).run(&input)?;
            println!(
                "{} rows ({} train / {} test), {} features",
                summary.rows,
                summary.train_rows,
                summary.test_rows,
                summary.feature_names.len()
            );
            for evaluation in &summary.evaluations {
                let marker = if evaluation.estimator == summary.selected { "*" } else { " " };
                println!("{} {:<6} {}", marker, evaluation.estimator, evaluation.metrics);
            }
            println!("artifacts saved to {}", config.artifact_dir.display());
            if let Some(path) = report {
                fs::write(&path, serde_json::to_string_pretty(&summary)?)?;
            }
        }
        Command::Predict { input } => {
            let raw = fs::read_to_string(&input)?;
            let inputs = match serde_json::from_str::<PredictInput>(&raw).map_err(|e| {
                PipelineError::InvalidParameter(format!("{}: {}", input.display(), e))
            })? {
                PredictInput::One(one) => vec![one],
                PredictInput::Many(many) => many,
            };

            let adapter = InferenceAdapter::new();
            adapter.load(&config)?;
            for property in &inputs {
                println!("{}", format_currency(adapter.predict(property)?));
            }
        }
    }
    Ok(())
}

/// `1234567.891` → `$1,234,567.89`.
fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let digits = (cents / 100).to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1_234_567.891), "$1,234,567.89");
        assert_eq!(format_currency(999.5), "$999.50");
        assert_eq!(format_currency(1000.0), "$1,000.00");
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(-2500.0), "-$2,500.00");
    }

    #[test]
    fn test_cli_parses_train() {
        let cli = Cli::try_parse_from([
            "property-price",
            "train",
            "--input",
            "melb.csv",
            "--select",
            "knn",
            "--artifact-dir",
            "out",
        ])
        .unwrap();
        assert_eq!(cli.artifact_dir, Some(PathBuf::from("out")));
        match cli.command {
            Command::Train { select, .. } => assert_eq!(select, Some(EstimatorKind::Knn)),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
