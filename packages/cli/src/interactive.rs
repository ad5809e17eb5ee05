//! Menu-driven dashboard session using `dialoguer`.

use std::path::PathBuf;

use chrono::NaiveDate;
use dialoguer::{Input, Select};
use tick_monitor_dashboard_models::{ExportFormat, FilterState, MapPeriod, lenient::parse_date};
use tick_monitor_risk_models::RiskBand;

use crate::{Dashboard, export, report_update};

/// Top-level actions of the dashboard menu.
enum MenuAction {
    RefreshAll,
    UpdateData,
    SearchSources,
    ResetFilters,
    DateRange,
    MapPeriod,
    Export,
    ToggleTheme,
    Quit,
}

impl MenuAction {
    const ALL: &[Self] = &[
        Self::RefreshAll,
        Self::UpdateData,
        Self::SearchSources,
        Self::ResetFilters,
        Self::DateRange,
        Self::MapPeriod,
        Self::Export,
        Self::ToggleTheme,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::RefreshAll => "Refresh all views",
            Self::UpdateData => "Update data from sources",
            Self::SearchSources => "Search source reports",
            Self::ResetFilters => "Reset filters",
            Self::DateRange => "Change graph date range",
            Self::MapPeriod => "Change map period",
            Self::Export => "Export data",
            Self::ToggleTheme => "Toggle dark theme",
            Self::Quit => "Quit",
        }
    }
}

/// Runs the interactive menu until the user quits.
///
/// Loads every view once, then loops over the menu.
///
/// # Errors
///
/// Returns an error if a prompt fails, an export cannot be written, or the
/// theme preference cannot be saved.
pub async fn run(dashboard: &mut Dashboard) -> Result<(), Box<dyn std::error::Error>> {
    dashboard.start().await;

    let labels: Vec<&str> = MenuAction::ALL.iter().map(MenuAction::label).collect();

    loop {
        println!();
        let idx = Select::new()
            .with_prompt("Tick monitor")
            .items(&labels)
            .default(0)
            .interact()?;

        match MenuAction::ALL[idx] {
            MenuAction::RefreshAll => {
                dashboard.refresh_all().await;
            }
            MenuAction::UpdateData => report_update(&dashboard.update_data().await),
            MenuAction::SearchSources => {
                let filter = prompt_filter(dashboard.state().filter())?;
                dashboard.apply_filters(filter).await;
            }
            MenuAction::ResetFilters => {
                dashboard.reset_filters().await;
            }
            MenuAction::DateRange => {
                let current = dashboard.state().filter();
                let start = prompt_date("Start date", current.start_date)?;
                let end = prompt_date("End date", current.end_date)?;
                dashboard.set_date_range(start, end).await;
            }
            MenuAction::MapPeriod => {
                let periods = [MapPeriod::All, MapPeriod::Week, MapPeriod::Month];
                let names: Vec<&str> = periods.iter().map(AsRef::as_ref).collect();
                let current = periods
                    .iter()
                    .position(|p| *p == dashboard.state().map_period())
                    .unwrap_or(0);
                let idx = Select::new()
                    .with_prompt("Map period")
                    .items(&names)
                    .default(current)
                    .interact()?;
                dashboard.set_map_period(periods[idx]).await;
            }
            MenuAction::Export => {
                let formats = [ExportFormat::Csv, ExportFormat::Excel, ExportFormat::Pdf];
                let names: Vec<&str> = formats.iter().map(AsRef::as_ref).collect();
                let idx = Select::new()
                    .with_prompt("Format")
                    .items(&names)
                    .default(0)
                    .interact()?;
                let format = formats[idx];
                let path: String = Input::new()
                    .with_prompt("Save to")
                    .default(format!("tick_monitor_export.{}", format.extension()))
                    .interact_text()?;
                if let Err(e) = export(dashboard, format, &PathBuf::from(path)).await {
                    log::error!("Export failed: {e}");
                }
            }
            MenuAction::ToggleTheme => {
                dashboard.toggle_theme()?;
            }
            MenuAction::Quit => return Ok(()),
        }
    }
}

/// Asks for each text filter, pre-filled with the current values.
fn prompt_filter(current: &FilterState) -> Result<FilterState, dialoguer::Error> {
    let search = prompt_text("Search", &current.search)?;
    let location = prompt_text("Location", current.location.as_deref().unwrap_or(""))?;
    let source = prompt_text("Source", current.source.as_deref().unwrap_or(""))?;

    let mut levels = vec!["(any)"];
    levels.extend(RiskBand::all().iter().map(|b| b.label()));
    let selected = current
        .risk_level
        .as_deref()
        .and_then(|l| levels.iter().position(|x| *x == l))
        .unwrap_or(0);
    let idx = Select::new()
        .with_prompt("Risk level")
        .items(&levels)
        .default(selected)
        .interact()?;

    Ok(FilterState {
        search,
        location: Some(location).filter(|s| !s.trim().is_empty()),
        source: Some(source).filter(|s| !s.trim().is_empty()),
        risk_level: (idx > 0).then(|| levels[idx].to_string()),
        ..current.clone()
    })
}

fn prompt_text(prompt: &str, current: &str) -> Result<String, dialoguer::Error> {
    Input::new()
        .with_prompt(prompt)
        .default(current.to_string())
        .allow_empty(true)
        .interact_text()
}

/// Asks for a date; an empty answer clears it.
fn prompt_date(
    prompt: &str,
    current: Option<NaiveDate>,
) -> Result<Option<NaiveDate>, dialoguer::Error> {
    let default = current.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
    let text: String = Input::new()
        .with_prompt(format!("{prompt} (YYYY-MM-DD, empty for none)"))
        .default(default)
        .allow_empty(true)
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() || parse_date(input).is_some() {
                Ok(())
            } else {
                Err("expected YYYY-MM-DD")
            }
        })
        .interact_text()?;
    Ok(parse_date(&text))
}
