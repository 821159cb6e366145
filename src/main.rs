use anyhow::{Context, Result};
use clap::Parser;
use flight_facts::cli::Args;
use flight_facts::processor::FlightFactProcessor;
use std::process;
use tracing::debug;

fn main() {
    let args = Args::parse();

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        tokio::select! {
            result = run(args) => result,
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\nReceived CTRL+C, shutting down...");
                Err(anyhow::anyhow!("Processing interrupted by user"))
            }
        }
    });

    if let Err(error) = result {
        eprintln!("Error: {:#}", error);
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    setup_logging(&args)?;

    let config = args.to_config().context("Invalid arguments")?;
    debug!("Running with configuration: {:?}", config);

    let mut processor =
        FlightFactProcessor::new(args.extract_dir.clone(), args.output_dir.clone())
            .with_config(config);
    if let Some(time_dim) = &args.time_dim {
        processor = processor.with_snapshot(time_dim.clone());
    }

    processor.process().await.with_context(|| {
        format!(
            "Failed to build fact table from {}",
            args.extract_dir.display()
        )
    })?;

    Ok(())
}

/// Set up structured logging based on CLI arguments
fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("flight_facts={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}
