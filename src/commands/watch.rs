//! Watch command - runs one monitoring session to completion.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveTime};
use colored::Colorize;

use crate::korail::KorailClient;
use crate::models::config::{parse_channel_list, MonitorConfig};
use crate::models::constants::DEFAULT_BASE_INTERVAL_SECS;
use crate::models::query::{SeatClass, TrainClass};
use crate::monitor::{MonitorSession, SessionReport};
use crate::notify::Notifier;
use crate::validation;

/// Parsed CLI input for one watch session.
pub struct WatchOptions {
    pub departure: String,
    pub arrival: String,
    pub date: NaiveDate,
    pub window_start: NaiveTime,
    pub window_end: NaiveTime,
    pub train_class: TrainClass,
    pub seat_class: SeatClass,
    pub passengers: u8,
    /// Comma-separated channel list, e.g. `desktop,sound,webhook`.
    pub notify: Option<String>,
    /// Base check interval override in seconds.
    pub interval: Option<f64>,
    pub config: Option<PathBuf>,
}

/// Execute the watch command: assemble config and query, install the
/// Ctrl-C handler, run the session, print the report.
pub fn execute(opts: WatchOptions) -> Result<()> {
    let mut config = MonitorConfig::load(opts.config.as_deref())?;

    if let Some(list) = &opts.notify {
        config.notify.channels = parse_channel_list(list).map_err(anyhow::Error::msg)?;
    }
    if let Some(interval) = opts.interval {
        if interval < DEFAULT_BASE_INTERVAL_SECS {
            println!(
                "{} Interval below {DEFAULT_BASE_INTERVAL_SECS}s hammers the upstream API; using {DEFAULT_BASE_INTERVAL_SECS}s",
                "!".yellow().bold()
            );
        }
        config.polling.base_interval_secs = interval.max(DEFAULT_BASE_INTERVAL_SECS);
    }

    let query = validation::build_query(
        &opts.departure,
        &opts.arrival,
        opts.date,
        opts.window_start,
        opts.window_end,
        opts.train_class,
        opts.seat_class,
        opts.passengers,
        Local::now().date_naive(),
    )?;

    let notifier = Notifier::from_config(&config.notify)?;
    let source = KorailClient::new(&config.http)?;

    let channel_labels: Vec<&str> = config
        .notify
        .channels
        .iter()
        .map(|c| c.label())
        .collect();

    let session = MonitorSession::new(config, source, notifier);
    let handle = session.handle();

    ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("Stop requested, finishing up...");
        handle.stop();
    })
    .context("Failed to install Ctrl-C handler")?;

    println!("{}", crate::LOGO);
    println!("{} Watching {}", "→".cyan().bold(), query.summary());
    println!(
        "{} Notifying via {}; press Ctrl-C to stop",
        "─".dimmed(),
        channel_labels.join(", ")
    );
    println!();

    let report = session.run(query);
    print_report(&report);
    Ok(())
}

fn print_report(report: &SessionReport) {
    println!();
    println!(
        "{} Session {} finished: {}",
        "✓".green().bold(),
        report.session_id,
        report.stop_reason.describe().bold()
    );
    println!(
        "  requests       {} ({:.1}% ok)",
        report.total_requests, report.success_rate
    );
    println!("  detections     {}", report.detections);
    println!("  notifications  {}", report.notifications_sent);
    println!("  avg response   {:.0}ms", report.avg_response_ms);
    println!("  duration       {:.1}m", report.duration_secs / 60.0);

    if report.detections == 0 {
        println!();
        println!("{} No seats appeared this session", "─".dimmed());
    }
}
