//! Terminal [`Presenter`].
//!
//! Charts are drawn as horizontal bars, maps as a marker list. Chart and map
//! handles are numbered in creation order and their lifecycle is logged, so
//! the destroy-before-create order is visible with `RUST_LOG=debug`.

use std::sync::atomic::{AtomicU64, Ordering};

use console::{Color, style};
use tick_monitor_cli_utils::{MultiProgress, OverlaySpinner};
use tick_monitor_dashboard::transform::{
    ChartSpec, ComparisonRow, ForecastRow, MarkerSpec, NewsEntry, SourcesList, StatsCards,
    WeekCard,
};
use tick_monitor_dashboard::{ChartHandle, ChartMount, GeoPoint, MapHandle, Presenter};
use tick_monitor_dashboard_models::{NewsPriority, View};
use tick_monitor_geo::BoundingBox;
use tick_monitor_risk_models::{NO_DATA_COLOR, RiskBand};

/// Width of the longest bar, in characters.
const BAR_WIDTH: usize = 40;

/// Draws dashboard views on stdout.
pub struct ConsolePresenter {
    multi: MultiProgress,
    overlay: OverlaySpinner,
    next_handle: AtomicU64,
}

impl ConsolePresenter {
    #[must_use]
    pub fn new(multi: &MultiProgress) -> Self {
        Self {
            multi: multi.clone(),
            overlay: OverlaySpinner::new(multi, "Обновление данных..."),
            next_handle: AtomicU64::new(0),
        }
    }

    fn next(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Prints lines without tearing an active spinner.
    fn print(&self, lines: &[String]) {
        self.multi.suspend(|| {
            for line in lines {
                println!("{line}");
            }
        });
    }
}

impl Presenter for ConsolePresenter {
    fn create_chart(&self, mount: ChartMount, spec: &ChartSpec) -> ChartHandle {
        let handle = ChartHandle(self.next());
        log::debug!("chart #{} created on {mount:?}", handle.0);

        let mut lines = vec![heading(mount.view())];
        for series in &spec.series {
            let bars = bar_lines(&spec.labels, &series.values, BAR_WIDTH);
            for (i, line) in bars.into_iter().enumerate() {
                let color = series.colors.get(i).map_or(NO_DATA_COLOR, String::as_str);
                lines.push(style(line).fg(terminal_color(color)).to_string());
            }
        }
        self.print(&lines);
        handle
    }

    fn destroy_chart(&self, handle: ChartHandle) {
        log::debug!("chart #{} destroyed", handle.0);
    }

    fn create_map(&self, center: GeoPoint, zoom: u8) -> MapHandle {
        let handle = MapHandle(self.next());
        log::debug!("map #{} created", handle.0);
        self.print(&[
            heading(View::Map),
            format!("центр {:.4}, {:.4}, масштаб {zoom}", center.lat, center.lng),
        ]);
        handle
    }

    fn place_marker(&self, _map: MapHandle, marker: &MarkerSpec) {
        let dot = style("●").fg(terminal_color(marker.color));
        let popup = marker.popup.replace('\n', " | ");
        self.print(&[format!(
            "{dot} {:.4}, {:.4} r={:.0} {}: {popup}",
            marker.lat, marker.lng, marker.radius, marker.label
        )]);
    }

    fn fit_bounds(&self, _map: MapHandle, bounds: &BoundingBox) {
        self.print(&[format!(
            "границы: {:.4}..{:.4} с.ш., {:.4}..{:.4} в.д.",
            bounds.south, bounds.north, bounds.west, bounds.east
        )]);
    }

    fn destroy_map(&self, handle: MapHandle) {
        log::debug!("map #{} destroyed", handle.0);
    }

    fn render_stats(&self, stats: &StatsCards) {
        let mut lines = vec![
            heading(View::Stats),
            week_line("Текущая неделя", &stats.current),
            week_line("Прошлая неделя", &stats.previous),
        ];
        if let Some(change) = stats.change_percent {
            lines.push(format!("Изменение: {change:+.1}%"));
        }
        self.print(&lines);
    }

    fn render_sources(&self, sources: &SourcesList) {
        let mut lines = vec![heading(View::Sources)];
        for row in &sources.rows {
            let title = row.title.as_deref().unwrap_or("");
            lines.push(format!(
                "{:<12} {:<20} {:>5} {} {:<16} {title}",
                row.date,
                row.location,
                row.cases,
                band_label(row.band),
                row.source,
            ));
            if let Some(url) = &row.url {
                lines.push(format!("{:>13}{}", "", style(url).dim()));
            }
        }
        let shown = sources.rows.len();
        lines.push(match sources.total {
            Some(total) => format!("Показано {shown} из {total}"),
            None => format!("Показано {shown}"),
        });
        if !sources.filters_applied.is_empty() {
            lines.push(format!("Фильтры: {}", sources.filters_applied.join(", ")));
        }
        self.print(&lines);
    }

    fn render_forecast_table(&self, rows: &[ForecastRow]) {
        let mut lines = vec![format!("{:<16} {:>8} {:>10}", "Месяц", "Случаи", "В неделю")];
        for row in rows {
            lines.push(format!(
                "{:<16} {:>8} {:>10.1} {}",
                row.month,
                row.total_cases,
                row.avg_weekly,
                band_label(row.band)
            ));
        }
        self.print(&lines);
    }

    fn render_comparison_table(&self, rows: &[ComparisonRow]) {
        let mut lines = vec![format!("{:<6} {:>8} {:>10} {:>8}", "Год", "Случаи", "В месяц", "Записи")];
        for row in rows {
            let records = row
                .records_count
                .map_or_else(|| "-".to_string(), |n| n.to_string());
            lines.push(format!(
                "{:<6} {:>8} {:>10.1} {records:>8}",
                row.year, row.total_cases, row.avg_per_month
            ));
        }
        self.print(&lines);
    }

    fn render_news(&self, entries: &[NewsEntry]) {
        let mut lines = vec![heading(View::News)];
        for entry in entries {
            let marker = match entry.priority {
                NewsPriority::High => style("!!").red().bold(),
                NewsPriority::Medium => style("! ").yellow(),
                NewsPriority::Low => style("  ").dim(),
            };
            lines.push(match &entry.location {
                Some(location) => format!("{marker} {} {} ({location})", entry.date, entry.text),
                None => format!("{marker} {} {}", entry.date, entry.text),
            });
        }
        self.print(&lines);
    }

    fn show_placeholder(&self, view: View, text: &str) {
        self.print(&[heading(view), style(text).italic().dim().to_string()]);
    }

    fn set_loading(&self, view: View, loading: bool) {
        log::trace!("{view} loading={loading}");
    }

    fn set_overlay(&self, active: bool) {
        if active {
            self.overlay.raise();
        } else {
            self.overlay.lower();
        }
    }

    fn alert(&self, message: &str) {
        self.print(&[format!("{} {message}", style("Ошибка:").red().bold())]);
    }

    fn apply_theme(&self, dark: bool) {
        let name = if dark { "тёмная" } else { "светлая" };
        self.print(&[format!("Тема: {name}")]);
    }
}

fn heading(view: View) -> String {
    let title = match view {
        View::Stats => "Статистика",
        View::Graph => "Случаи по неделям",
        View::Sources => "Источники",
        View::Map => "Карта",
        View::Forecast => "Прогноз",
        View::Comparison => "Сравнение по годам",
        View::News => "Новости",
    };
    style(format!("== {title} ==")).bold().to_string()
}

fn week_line(name: &str, week: &WeekCard) -> String {
    format!("{name}: {} ({}) {}", week.cases, week.date, band_label(week.band))
}

fn band_label(band: RiskBand) -> String {
    style(band.label()).fg(terminal_color(band.color())).to_string()
}

/// Nearest terminal color for one of the risk palette colors.
fn terminal_color(hex: &str) -> Color {
    match hex.to_ascii_lowercase().as_str() {
        "#00c853" => Color::Green,
        "#ffd600" => Color::Yellow,
        "#ff6f00" => Color::Color256(208),
        "#d32f2f" => Color::Red,
        "#9e9e9e" => Color::Color256(246),
        _ => Color::White,
    }
}

/// Plain-text horizontal bars, scaled so the largest value spans `width`.
fn bar_lines(labels: &[String], values: &[f64], width: usize) -> Vec<String> {
    let label_width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let max = values.iter().copied().fold(0.0_f64, f64::max);

    labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let value = values.get(i).copied().unwrap_or(0.0);
            let len = if max > 0.0 {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
                let scaled = (value / max * width as f64).round() as usize;
                scaled
            } else {
                0
            };
            format!("{label:<label_width$} {} {value}", "█".repeat(len))
        })
        .collect()
}
