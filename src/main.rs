use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use railwatch::commands::{stations, watch};
use railwatch::models::query::{SeatClass, TrainClass};
use railwatch::validation::{parse_date, parse_time};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "railwatch")]
#[command(about = "Korail seat-availability monitor", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a route for open seats until a limit trips or Ctrl-C
    Watch {
        /// Departure station (Korean name; aliases accepted)
        #[arg(short, long)]
        departure: String,

        /// Arrival station
        #[arg(short, long)]
        arrival: String,

        /// Departure date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,

        /// Start of the preferred departure window (HH:MM)
        #[arg(long = "from", value_parser = parse_time)]
        window_start: NaiveTime,

        /// End of the preferred departure window (HH:MM)
        #[arg(long = "to", value_parser = parse_time)]
        window_end: NaiveTime,

        /// Train class filter
        #[arg(long, value_enum, default_value = "ktx")]
        train_class: TrainClass,

        /// Seat class filter
        #[arg(long, value_enum, default_value = "general")]
        seat_class: SeatClass,

        /// Passenger count (1-9)
        #[arg(short, long, default_value_t = 1)]
        passengers: u8,

        /// Notification channels, comma separated (desktop,sound,webhook)
        #[arg(long)]
        notify: Option<String>,

        /// Base check interval in seconds (minimum 30)
        #[arg(long)]
        interval: Option<f64>,

        /// Config file path (default: ~/.config/railwatch/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List supported stations and aliases
    Stations,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("RAILWATCH_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Watch {
            departure,
            arrival,
            date,
            window_start,
            window_end,
            train_class,
            seat_class,
            passengers,
            notify,
            interval,
            config,
        } => watch::execute(watch::WatchOptions {
            departure,
            arrival,
            date,
            window_start,
            window_end,
            train_class,
            seat_class,
            passengers,
            notify,
            interval,
            config,
        }),
        Commands::Stations => stations::execute(),
    }
}
