use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use county_choropleth::config::AppConfig;
use county_choropleth::types::MetricKind;
use county_choropleth::{data, processing};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricArg {
    Density,
    Unemployment,
}

impl From<MetricArg> for MetricKind {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Density => MetricKind::Density,
            MetricArg::Unemployment => MetricKind::Unemployment,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Join the datasets and print fills, summaries and legends as JSON
    Report {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        /// Metric used to shade the features
        #[arg(short, long, value_enum, default_value = "density")]
        metric: MetricArg,
    },
    /// Print only the classifier and legend of one metric
    Legend {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        #[arg(short, long, value_enum, default_value = "density")]
        metric: MetricArg,
    },
}

async fn prepare_from(config: &AppConfig) -> anyhow::Result<processing::PreparedMap> {
    let inputs = data::load_inputs(&config.input).await?;
    Ok(processing::prepare(config, inputs))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Report { config, metric } => {
            let app_config = AppConfig::load_from_file(config)?;
            let map = prepare_from(&app_config).await?;
            let report = map.report(&app_config, MetricKind::from(*metric));
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Legend { config, metric } => {
            let app_config = AppConfig::load_from_file(config)?;
            let metric = MetricKind::from(*metric);
            let map = prepare_from(&app_config).await?;
            let view = map
                .view(metric, app_config.metrics.style(metric), &app_config.legend)
                .with_context(|| format!("No legend for {} metric", metric))?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
    }

    Ok(())
}
