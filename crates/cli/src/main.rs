//! BookProbe CLI - Main Entry Point

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use bookprobe_cli::commands::{appointment, data, inspect, payment, suite};
use bookprobe_cli::output::{self, print_error};
use bookprobe_e2e::ProbeConfig;

/// Browser probes for the appointment-booking and payment site
#[derive(Parser)]
#[command(name = "bookprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// TOML configuration file
    #[arg(long, env = "BOOKPROBE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Show the browser window
    #[arg(long, global = true)]
    headed: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a payment link with one payment method
    Payment(payment::PaymentArgs),

    /// Run the booking-form scenario suite
    Suite(suite::SuiteArgs),

    /// Drive an appointment flow end to end
    Appointment(appointment::AppointmentArgs),

    /// List the selects, buttons and inputs of a page
    Explore(inspect::ExploreArgs),

    /// Connection, markup and accessibility report for a page
    Diagnose(inspect::UrlArgs),

    /// Walk the tooling against the target, or a neutral page when offline
    Demo,

    /// Fill whatever generic form a page has
    FillSample(inspect::UrlArgs),

    /// Open the test appointment page and leave it open
    Open(inspect::OpenArgs),

    /// Generate test records or list fixture cases
    Data(data::DataArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = ProbeConfig::load(cli.config.as_deref())?;
    if cli.headed {
        config.browser.headless = false;
    }

    let format = cli.format;
    let outcome = match cli.command {
        Commands::Payment(args) => payment::execute(args, &config, format).await,
        Commands::Suite(args) => suite::execute(args, &config, format).await,
        Commands::Appointment(args) => appointment::execute(args, &config, format).await,
        Commands::Explore(args) => inspect::explore(args, &config, format).await,
        Commands::Diagnose(args) => inspect::diagnose(args, &config, format).await,
        Commands::Demo => inspect::demo(&config, format).await,
        Commands::FillSample(args) => inspect::fill_sample(args, &config, format).await,
        Commands::Open(args) => inspect::open(args, &config).await,
        Commands::Data(args) => data::execute(args, format),
    };

    match outcome {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            print_error(&format!("{:#}", e));
            std::process::exit(1);
        }
    }
}
