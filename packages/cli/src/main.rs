#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal front end for the tick monitor dashboard.
//!
//! Every subcommand drives the same [`RefreshOrchestrator`] the interactive
//! menu uses; running without a subcommand opens the menu.
//!
//! Uses `indicatif-log-bridge` (via [`tick_monitor_cli_utils::init_logger`])
//! so that log lines and the update spinner never fight for the terminal.

mod console;
mod interactive;

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tick_monitor_client::HttpDashboardClient;
use tick_monitor_dashboard::{DashboardConfig, RefreshOrchestrator, UpdateOutcome};
use tick_monitor_dashboard_models::{ExportFormat, FilterState, MapPeriod, View};

use crate::console::ConsolePresenter;

/// Orchestrator wired to the real backend and the terminal.
pub type Dashboard = RefreshOrchestrator<HttpDashboardClient, ConsolePresenter>;

#[derive(Parser)]
#[command(name = "tick_monitor", about = "Tick-bite case monitoring dashboard")]
struct Cli {
    /// Backend base URL (overrides `TICK_MONITOR_API_URL` and config files)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh all views, or only the ones given with --view
    Refresh {
        /// View to refresh (stats, graph, sources, map, forecast, comparison, news)
        #[arg(long = "view")]
        views: Vec<View>,
    },
    /// Ask the backend to ingest new data, then reload stats, graph and sources
    Update,
    /// Search source reports
    Sources {
        /// Free-text search over title and content
        #[arg(long)]
        search: Option<String>,
        /// Settlement filter
        #[arg(long)]
        location: Option<String>,
        /// Provenance filter
        #[arg(long)]
        source: Option<String>,
        /// Risk label filter (e.g. "Высокий")
        #[arg(long)]
        risk_level: Option<String>,
    },
    /// Show weekly cases for a date range (YYYY-MM-DD). Both bounds are
    /// needed for the range to apply.
    Graph {
        #[arg(long)]
        start_date: Option<NaiveDate>,
        #[arg(long)]
        end_date: Option<NaiveDate>,
    },
    /// Show the case map
    Map {
        /// Time window: all, week or month
        #[arg(long, default_value = "all")]
        period: MapPeriod,
    },
    /// Download an export of the case data
    Export {
        /// csv, excel or pdf
        format: ExportFormat,
        #[arg(long)]
        start_date: Option<NaiveDate>,
        #[arg(long)]
        end_date: Option<NaiveDate>,
        /// Destination file (default: `tick_monitor_export.<ext>`)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Toggle and persist the dark theme
    Theme,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = tick_monitor_cli_utils::init_logger();
    let cli = Cli::parse();

    let mut config = DashboardConfig::load()?;
    if let Some(url) = cli.api_url {
        config = config.with_api_url(url);
    }
    log::info!("Using backend {}", config.api_base_url);

    let api = HttpDashboardClient::new(&config.api_base_url)?;
    let presenter = ConsolePresenter::new(&multi);
    let mut dashboard = Dashboard::new(api, presenter, config, Local::now().date_naive());

    let Some(command) = cli.command else {
        return interactive::run(&mut dashboard).await;
    };

    match command {
        Commands::Refresh { views } => {
            if views.is_empty() {
                dashboard.start().await;
            } else {
                dashboard.refresh_views(&views).await;
            }
        }
        Commands::Update => report_update(&dashboard.update_data().await),
        Commands::Sources {
            search,
            location,
            source,
            risk_level,
        } => {
            let filter = FilterState {
                search: search.unwrap_or_default(),
                location,
                source,
                risk_level,
                ..dashboard.state().filter().clone()
            };
            dashboard.apply_filters(filter).await;
        }
        Commands::Graph {
            start_date,
            end_date,
        } => {
            dashboard.set_date_range(start_date, end_date).await;
        }
        Commands::Map { period } => {
            dashboard.set_map_period(period).await;
        }
        Commands::Export {
            format,
            start_date,
            end_date,
            output,
        } => {
            if start_date.is_some() || end_date.is_some() {
                let filter = FilterState {
                    start_date,
                    end_date,
                    ..dashboard.state().filter().clone()
                };
                dashboard.replace_filter(filter);
            }
            let path = output
                .unwrap_or_else(|| PathBuf::from(format!("tick_monitor_export.{}", format.extension())));
            export(&dashboard, format, &path).await?;
        }
        Commands::Theme => {
            let dark = dashboard.toggle_theme()?;
            log::info!("Dark theme {}", if dark { "on" } else { "off" });
        }
    }

    Ok(())
}

/// Downloads an export for the dashboard's current filter to `path`.
///
/// # Errors
///
/// Returns an error if the download fails or the file cannot be written.
pub async fn export(
    dashboard: &Dashboard,
    format: ExportFormat,
    path: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = dashboard.export_request(format);
    log::info!("Exporting {format} from {}", dashboard.export_url(format)?);
    let bytes = dashboard.api().download(&request).await?;
    tokio::fs::write(path, &bytes).await?;
    println!("Saved {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Prints the result of the update action.
pub fn report_update(outcome: &UpdateOutcome) {
    match outcome {
        UpdateOutcome::Refreshed { message, .. } => {
            println!("{}", message.as_deref().unwrap_or("Данные успешно обновлены!"));
        }
        UpdateOutcome::Failed { message } => {
            log::warn!("Update failed: {message}");
        }
    }
}
