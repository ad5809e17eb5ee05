//! Conversion of decoded backend payloads into presenter-ready view models.
//!
//! Every function here is pure. Colors and labels always come from
//! `tick_monitor_risk_models`; nothing in this module picks a color on its
//! own.

use serde::Serialize;
use tick_monitor_client::ClientError;
use tick_monitor_dashboard_models::{
    CaseRecord, ComparisonResponse, ForecastResponse, GraphResponse, NewsFeedResponse,
    NewsPriority, SourcesResponse, StatsResponse, WeekStats,
};
use tick_monitor_geo::{BoundingBox, ClusterPopup, ClusterSet};
use tick_monitor_risk_models::{RiskBand, classify_map_cases};

/// Placeholder shown when a view could not be loaded.
pub const LOAD_FAILED_TEXT: &str = "Не удалось загрузить данные";
/// Placeholder shown when a view loaded but has nothing to show.
pub const EMPTY_TEXT: &str = "Нет данных за выбранный период";
/// Alert shown when the update trigger fails without a backend message.
pub const UPDATE_FAILED_TEXT: &str = "Ошибка при обновлении данных";
/// Series name of case charts.
pub const CASES_SERIES: &str = "Случаи";

/// Smallest marker radius, in pixels.
pub const MIN_MARKER_RADIUS: f64 = 6.0;
/// Largest marker radius, in pixels.
pub const MAX_MARKER_RADIUS: f64 = 30.0;

/// Text that replaces a view's content after `error`.
///
/// A message supplied by the backend is shown as is; transport and parse
/// failures get the generic text.
#[must_use]
pub fn failure_text(error: &ClientError) -> String {
    error
        .backend_message()
        .map_or_else(|| LOAD_FAILED_TEXT.to_string(), str::to_string)
}

/// How a series is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// One bar per label.
    Bar,
    /// A polyline through the points.
    Line,
}

/// One plotted series; `colors` is parallel to `values`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    /// Legend name.
    pub name: String,
    /// Y values.
    pub values: Vec<f64>,
    /// Per-point colors.
    pub colors: Vec<String>,
}

/// Everything a chart capability needs to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    /// Drawing style.
    pub kind: ChartKind,
    /// X-axis labels.
    pub labels: Vec<String>,
    /// Plotted series.
    pub series: Vec<Series>,
}

/// One stats card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekCard {
    /// Case total.
    pub cases: u64,
    /// Week date as sent by the backend.
    pub date: String,
    /// Risk band from the reported label.
    pub band: RiskBand,
}

impl WeekCard {
    fn from_week(week: &WeekStats) -> Self {
        Self {
            cases: week.cases,
            date: week.date.clone(),
            band: week.risk_level,
        }
    }
}

/// The stats view: this week, last week, and the change between them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsCards {
    /// The running week.
    pub current: WeekCard,
    /// The week before.
    pub previous: WeekCard,
    /// Percent change of current over previous; `None` when the previous
    /// week had no cases.
    pub change_percent: Option<f64>,
}

/// Builds the stats cards.
#[must_use]
pub fn stats_cards(stats: &StatsResponse) -> StatsCards {
    StatsCards {
        current: WeekCard::from_week(&stats.current_week),
        previous: WeekCard::from_week(&stats.previous_week),
        change_percent: week_over_week(stats.current_week.cases, stats.previous_week.cases),
    }
}

#[allow(clippy::cast_precision_loss)]
fn week_over_week(current: u64, previous: u64) -> Option<f64> {
    if previous == 0 {
        return None;
    }
    Some((current as f64 - previous as f64) / previous as f64 * 100.0)
}

/// Builds the weekly bar chart. A bar without a backend color is colored
/// with the map magnitude table.
#[must_use]
pub fn graph_chart(graph: &GraphResponse) -> ChartSpec {
    let cases: Vec<u64> = (0..graph.weeks.len())
        .map(|i| graph.cases.get(i).copied().unwrap_or(0))
        .collect();
    let colors = cases
        .iter()
        .enumerate()
        .map(|(i, &n)| match graph.colors.get(i) {
            Some(color) if !color.trim().is_empty() => color.clone(),
            _ => classify_map_cases(n).color().to_string(),
        })
        .collect();

    ChartSpec {
        kind: ChartKind::Bar,
        labels: graph.weeks.clone(),
        series: vec![Series {
            name: CASES_SERIES.to_string(),
            values: cases.iter().map(|&n| count_to_f64(n)).collect(),
            colors,
        }],
    }
}

/// One row of the sources list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRow {
    /// Report date.
    pub date: String,
    /// Settlement.
    pub location: String,
    /// Case count.
    pub cases: u64,
    /// Provenance.
    pub source: String,
    /// Risk band from the reported label.
    pub band: RiskBand,
    /// Headline, when present.
    pub title: Option<String>,
    /// Link to the report, when present.
    pub url: Option<String>,
}

impl From<&CaseRecord> for SourceRow {
    fn from(record: &CaseRecord) -> Self {
        Self {
            date: record.date.clone(),
            location: record.location.clone(),
            cases: record.cases,
            source: record.source.clone(),
            band: record.risk_level,
            title: record.title.clone(),
            url: record.url.clone(),
        }
    }
}

/// The sources view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourcesList {
    /// Rows in backend order.
    pub rows: Vec<SourceRow>,
    /// Matches before the result cap, when the backend reports it.
    pub total: Option<u64>,
    /// `name=value` pairs of the filters the backend says it applied.
    pub filters_applied: Vec<String>,
}

/// Builds the sources list.
#[must_use]
pub fn sources_list(response: &SourcesResponse) -> SourcesList {
    SourcesList {
        rows: response.sources.iter().map(SourceRow::from).collect(),
        total: response.total,
        filters_applied: response
            .filters_applied
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| match v.as_str() {
                Some(s) => format!("{k}={s}"),
                None => format!("{k}={v}"),
            })
            .collect(),
    }
}

/// A circle marker for one cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerSpec {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
    /// Radius in pixels, growing with the case count.
    pub radius: f64,
    /// Fill color of the cluster's map risk class.
    pub color: &'static str,
    /// Label of the cluster's map risk class.
    pub label: &'static str,
    /// Popup text.
    pub popup: String,
}

/// Where the map viewport goes after the markers are placed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Viewport {
    /// No clusters: reset to the configured center and zoom.
    Default,
    /// Fit the box containing every cluster.
    Fit(BoundingBox),
}

/// Markers and viewport of one map snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPlan {
    /// One marker per cluster, in coordinate order.
    pub markers: Vec<MarkerSpec>,
    /// Viewport to apply.
    pub viewport: Viewport,
}

/// Plans the map rendering of a cluster set.
#[must_use]
pub fn map_plan(clusters: &ClusterSet) -> MapPlan {
    let markers = clusters
        .iter()
        .map(|cluster| {
            let class = cluster.risk_class();
            MarkerSpec {
                lat: cluster.key.lat(),
                lng: cluster.key.lng(),
                radius: marker_radius(cluster.cases),
                color: class.color(),
                label: class.label(),
                popup: popup_text(&cluster.popup()),
            }
        })
        .collect();

    MapPlan {
        markers,
        viewport: clusters.bounds().map_or(Viewport::Default, Viewport::Fit),
    }
}

/// Marker radius for a case count: grows with the square root, clamped to
/// [`MIN_MARKER_RADIUS`]..=[`MAX_MARKER_RADIUS`].
#[must_use]
pub fn marker_radius(cases: u64) -> f64 {
    2.0f64
        .mul_add(count_to_f64(cases).sqrt(), MIN_MARKER_RADIUS)
        .clamp(MIN_MARKER_RADIUS, MAX_MARKER_RADIUS)
}

/// Multi-line popup text for a cluster.
#[must_use]
pub fn popup_text(popup: &ClusterPopup) -> String {
    let mut text = format!(
        "{}\nСлучаев: {}\nИсточников: {}",
        popup.location, popup.cases, popup.distinct_sources
    );
    if !popup.first_dates.is_empty() {
        text.push_str("\nДаты: ");
        text.push_str(&popup.first_dates.join(", "));
    }
    text
}

/// One row of the forecast table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRow {
    /// Month label.
    pub month: String,
    /// Predicted total.
    pub total_cases: i64,
    /// Predicted weekly average.
    pub avg_weekly: f64,
    /// Band from the forecast threshold table.
    pub band: RiskBand,
}

/// Builds the forecast table rows.
#[must_use]
pub fn forecast_rows(forecast: &ForecastResponse) -> Vec<ForecastRow> {
    forecast
        .forecast
        .iter()
        .map(|point| ForecastRow {
            month: point.month.clone(),
            total_cases: point.total_cases,
            avg_weekly: point.avg_weekly,
            band: point.risk_band(),
        })
        .collect()
}

/// Builds the forecast line chart.
#[must_use]
pub fn forecast_chart(rows: &[ForecastRow]) -> ChartSpec {
    #[allow(clippy::cast_precision_loss)]
    let values = rows.iter().map(|r| r.total_cases as f64).collect();
    ChartSpec {
        kind: ChartKind::Line,
        labels: rows.iter().map(|r| r.month.clone()).collect(),
        series: vec![Series {
            name: CASES_SERIES.to_string(),
            values,
            colors: rows.iter().map(|r| r.band.color().to_string()).collect(),
        }],
    }
}

/// One year of the comparison table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    /// Year label.
    pub year: String,
    /// Cases in the year.
    pub total_cases: u64,
    /// Average per month.
    pub avg_per_month: f64,
    /// Number of reports, when reported.
    pub records_count: Option<u64>,
}

/// Builds the comparison rows in ascending year order.
#[must_use]
pub fn comparison_rows(comparison: &ComparisonResponse) -> Vec<ComparisonRow> {
    comparison
        .comparison
        .iter()
        .map(|(year, summary)| ComparisonRow {
            year: year.clone(),
            total_cases: summary.total_cases,
            avg_per_month: summary.avg_per_month,
            records_count: summary.records_count,
        })
        .collect()
}

/// Builds the comparison bar chart of yearly totals.
#[must_use]
pub fn comparison_chart(rows: &[ComparisonRow]) -> ChartSpec {
    ChartSpec {
        kind: ChartKind::Bar,
        labels: rows.iter().map(|r| r.year.clone()).collect(),
        series: vec![Series {
            name: CASES_SERIES.to_string(),
            values: rows.iter().map(|r| count_to_f64(r.total_cases)).collect(),
            colors: rows
                .iter()
                .map(|r| classify_map_cases(r.total_cases).color().to_string())
                .collect(),
        }],
    }
}

/// One news feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsEntry {
    /// Headline.
    pub text: String,
    /// Date.
    pub date: String,
    /// Settlement, when given.
    pub location: Option<String>,
    /// Case count, when given.
    pub cases: Option<u64>,
    /// Priority.
    pub priority: NewsPriority,
}

/// Builds the news entries, keeping backend order.
#[must_use]
pub fn news_entries(feed: &NewsFeedResponse) -> Vec<NewsEntry> {
    feed.news
        .iter()
        .map(|item| NewsEntry {
            text: item.text.clone(),
            date: item.date.clone(),
            location: item.location.clone(),
            cases: item.cases,
            priority: item.priority,
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn count_to_f64(n: u64) -> f64 {
    n as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tick_monitor_risk_models::NO_DATA_COLOR;

    fn record(lat: f64, lng: f64, cases: u64, source: &str, date: &str) -> CaseRecord {
        CaseRecord {
            lat: Some(lat),
            lng: Some(lng),
            cases,
            source: source.to_string(),
            date: date.to_string(),
            location: "Тюмень".to_string(),
            ..CaseRecord::default()
        }
    }

    #[test]
    fn failure_text_prefers_backend_message() {
        let backend = ClientError::Backend {
            message: "Модель не обучена".to_string(),
        };
        assert_eq!(failure_text(&backend), "Модель не обучена");

        let parse = ClientError::Json(serde_json::from_str::<u8>("x").unwrap_err());
        assert_eq!(failure_text(&parse), LOAD_FAILED_TEXT);
    }

    #[test]
    fn week_over_week_change() {
        let stats: StatsResponse = serde_json::from_value(json!({
            "current_week": {"cases": 30, "risk_level": "Низкий"},
            "previous_week": {"cases": 20, "risk_level": "Низкий"}
        }))
        .unwrap();
        let cards = stats_cards(&stats);
        assert!((cards.change_percent.unwrap() - 50.0).abs() < 1e-9);

        let stats = StatsResponse::default();
        assert_eq!(stats_cards(&stats).change_percent, None);
    }

    #[test]
    fn graph_colors_fall_back_to_map_table() {
        let graph = GraphResponse {
            weeks: vec!["01.05-07.05".into(), "08.05-14.05".into(), "15.05-21.05".into()],
            cases: vec![0, 120],
            colors: vec!["#123456".into(), String::new()],
        };
        let chart = graph_chart(&graph);
        let series = &chart.series[0];
        assert_eq!(series.values, vec![0.0, 120.0, 0.0]);
        assert_eq!(
            series.colors,
            vec![
                "#123456".to_string(),
                RiskBand::High.color().to_string(),
                NO_DATA_COLOR.to_string(),
            ]
        );
        assert_eq!(chart.kind, ChartKind::Bar);
    }

    #[test]
    fn sources_list_keeps_metadata() {
        let response: SourcesResponse = serde_json::from_value(json!({
            "sources": [{"date": "01.05.2024", "cases": 4, "risk_level": "Умеренный"}],
            "total": 57,
            "filters_applied": {"search": "клещ", "location": null, "limit": 20}
        }))
        .unwrap();
        let list = sources_list(&response);
        assert_eq!(list.rows.len(), 1);
        assert_eq!(list.rows[0].band, RiskBand::Moderate);
        assert_eq!(list.total, Some(57));
        assert_eq!(list.filters_applied, vec!["limit=20", "search=клещ"]);
    }

    #[test]
    fn map_plan_for_the_two_record_scenario() {
        let records = [
            record(57.0, 65.0, 10, "a", "01.05.2024"),
            record(57.0, 65.0, 40, "b", "02.05.2024"),
        ];
        let plan = map_plan(&ClusterSet::aggregate(&records));

        assert_eq!(plan.markers.len(), 1);
        let marker = &plan.markers[0];
        assert_eq!(marker.color, "#ffd600");
        assert_eq!(marker.label, "Умеренный");
        assert!(marker.popup.contains("Случаев: 50"));
        assert!(marker.popup.contains("Источников: 2"));
        assert!(matches!(plan.viewport, Viewport::Fit(_)));
    }

    #[test]
    fn empty_map_uses_default_viewport() {
        let plan = map_plan(&ClusterSet::default());
        assert!(plan.markers.is_empty());
        assert_eq!(plan.viewport, Viewport::Default);
    }

    #[test]
    fn marker_radius_is_clamped() {
        assert!((marker_radius(0) - MIN_MARKER_RADIUS).abs() < f64::EPSILON);
        assert!((marker_radius(100) - 26.0).abs() < 1e-9);
        assert!((marker_radius(10_000) - MAX_MARKER_RADIUS).abs() < f64::EPSILON);
        assert!(marker_radius(4) < marker_radius(9));
    }

    #[test]
    fn popup_lists_first_three_dates() {
        let popup = ClusterPopup {
            location: "Ишим".to_string(),
            cases: 9,
            distinct_sources: 1,
            first_dates: vec!["01.05.2024".into(), "02.05.2024".into()],
        };
        assert_eq!(
            popup_text(&popup),
            "Ишим\nСлучаев: 9\nИсточников: 1\nДаты: 01.05.2024, 02.05.2024"
        );
    }

    #[test]
    fn forecast_rows_use_forecast_table() {
        let forecast: ForecastResponse = serde_json::from_value(json!({
            "forecast": [
                {"month": "Май", "total_cases": 605, "avg_weekly": 151.2},
                {"month": "Июнь", "total_cases": 599, "avg_weekly": 149.7}
            ]
        }))
        .unwrap();
        let rows = forecast_rows(&forecast);
        assert_eq!(rows[0].band, RiskBand::VeryHigh);
        assert_eq!(rows[1].band, RiskBand::High);

        let chart = forecast_chart(&rows);
        assert_eq!(chart.kind, ChartKind::Line);
        assert_eq!(chart.labels, vec!["Май", "Июнь"]);
        assert_eq!(chart.series[0].colors[0], RiskBand::VeryHigh.color());
    }

    #[test]
    fn comparison_rows_are_year_ordered() {
        let comparison: ComparisonResponse = serde_json::from_value(json!({
            "comparison": {
                "2025": {"total_cases": 30, "avg_per_month": 2.5},
                "2023": {"total_cases": 10, "avg_per_month": 0.8}
            }
        }))
        .unwrap();
        let rows = comparison_rows(&comparison);
        let years: Vec<&str> = rows.iter().map(|r| r.year.as_str()).collect();
        assert_eq!(years, vec!["2023", "2025"]);
        assert_eq!(comparison_chart(&rows).series[0].values, vec![10.0, 30.0]);
    }

    #[test]
    fn news_keeps_backend_order() {
        let feed: NewsFeedResponse = serde_json::from_value(json!({
            "news": [
                {"text": "low first", "date": "02.05.2024", "priority": "low"},
                {"text": "high second", "date": "01.05.2024", "priority": "high", "cases": 12}
            ]
        }))
        .unwrap();
        let entries = news_entries(&feed);
        assert_eq!(entries[0].text, "low first");
        assert_eq!(entries[1].priority, NewsPriority::High);
        assert_eq!(entries[1].cases, Some(12));
    }
}
