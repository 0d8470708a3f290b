use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use futures::stream::{self, StreamExt};

use listing_extract::{ExtractError, Extraction, ExtractorConfig, ListingExtractor};

#[derive(Parser)]
#[command(
    name = "listing-extract",
    about = "Extract listing records from saved real-estate pages, one JSON object per file"
)]
struct Cli {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Look up coordinates for listings that embed none
    #[arg(long)]
    geocode: bool,
    /// Files processed concurrently
    #[arg(short, long, default_value = "4")]
    jobs: usize,
    /// Pretty-print each record
    #[arg(long)]
    pretty: bool,
    /// HTML files to extract
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ExtractorConfig::from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ExtractorConfig::default(),
    };
    if cli.geocode {
        config.geocoder.enabled = true;
    }

    let extractor = Arc::new(ListingExtractor::from_config(config));
    let total = cli.files.len();

    let mut outputs = stream::iter(cli.files)
        .map(|path| {
            let extractor = Arc::clone(&extractor);
            async move {
                let task_path = path.clone();
                let outcome =
                    tokio::task::spawn_blocking(move || extractor.extract_file(&task_path)).await;
                (path, outcome)
            }
        })
        .buffered(cli.jobs.max(1));

    let mut failed = 0usize;
    while let Some((path, outcome)) = outputs.next().await {
        let extraction = match outcome {
            Ok(Ok(extraction)) => extraction,
            Ok(Err(ExtractError::GeocoderUnavailable { reason, extraction })) => {
                tracing::warn!(file = %path.display(), %reason, "stored without coordinates");
                *extraction
            }
            Ok(Err(e)) => {
                tracing::error!(file = %path.display(), "{}", e);
                failed += 1;
                continue;
            }
            Err(e) => {
                tracing::error!(file = %path.display(), "worker failed: {}", e);
                failed += 1;
                continue;
            }
        };
        println!("{}", render(&extraction, cli.pretty)?);
    }

    tracing::info!(
        files = total,
        failed,
        elapsed_secs = t0.elapsed().as_secs_f64(),
        "done"
    );

    if failed > 0 {
        anyhow::bail!("{} of {} files could not be read", failed, total);
    }
    Ok(())
}

fn render(extraction: &Extraction, pretty: bool) -> anyhow::Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(extraction)?
    } else {
        serde_json::to_string(extraction)?
    };
    Ok(json)
}
