#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Backend response schema and client-side filter types for the tick
//! monitor dashboard.
//!
//! The response types mirror the JSON returned by the monitoring backend's
//! `/api/*` endpoints. Every field is read leniently (see [`lenient`]): a
//! missing number is `0`, a missing string is empty, and an unknown risk
//! label is [`RiskBand::Low`]. Nothing in a payload is a validation error
//! by itself.

pub mod lenient;

use std::collections::BTreeMap;

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use tick_monitor_risk_models::{RiskBand, classify_forecast_cases};

/// One independently refreshed presentation unit of the dashboard.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum View {
    /// Current vs previous week summary cards.
    Stats,
    /// Weekly case bar chart.
    Graph,
    /// Filterable list of source reports.
    Sources,
    /// Clustered case map.
    Map,
    /// Monthly forecast chart and table.
    Forecast,
    /// Year-over-year comparison.
    Comparison,
    /// Generated news feed.
    News,
}

impl View {
    /// Returns all views in dashboard order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Stats,
            Self::Graph,
            Self::Sources,
            Self::Map,
            Self::Forecast,
            Self::Comparison,
            Self::News,
        ]
    }

    /// Views reloaded after a manual data update.
    #[must_use]
    pub const fn update_trio() -> &'static [Self] {
        &[Self::Stats, Self::Graph, Self::Sources]
    }
}

/// A single case report as delivered by the backend.
///
/// Used both for `/api/sources` rows and `/api/map-data` locations; the map
/// endpoint omits the text fields and the sources endpoint may omit the
/// coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Report date as sent by the backend (`dd.mm.yyyy` or ISO).
    #[serde(default, deserialize_with = "lenient::string")]
    pub date: String,
    /// Number of cases in this report.
    #[serde(default, deserialize_with = "lenient::count")]
    pub cases: u64,
    /// Settlement or district name.
    #[serde(default, deserialize_with = "lenient::string")]
    pub location: String,
    /// Latitude (WGS84), if geocoded.
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub lat: Option<f64>,
    /// Longitude (WGS84), if geocoded.
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub lng: Option<f64>,
    /// Provenance (news site, channel, agency).
    #[serde(default, deserialize_with = "lenient::string")]
    pub source: String,
    /// Reported risk label.
    #[serde(default)]
    pub risk_level: RiskBand,
    /// Headline.
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub title: Option<String>,
    /// Body text.
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub content: Option<String>,
    /// Link to the original report.
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub url: Option<String>,
}

impl CaseRecord {
    /// Returns the `(lat, lng)` pair when both coordinates are present.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.lat?, self.lng?))
    }

    /// Parses [`Self::date`] into a calendar date.
    #[must_use]
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        lenient::parse_date(&self.date)
    }
}

/// Case summary for one week.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekStats {
    /// Total cases in the week.
    #[serde(default, deserialize_with = "lenient::count")]
    pub cases: u64,
    /// Week date as formatted by the backend.
    #[serde(default, deserialize_with = "lenient::string")]
    pub date: String,
    /// Reported risk label.
    #[serde(default)]
    pub risk_level: RiskBand,
}

/// `GET /api/stats`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResponse {
    /// The running week.
    #[serde(default, deserialize_with = "lenient::object")]
    pub current_week: WeekStats,
    /// The week before.
    #[serde(default, deserialize_with = "lenient::object")]
    pub previous_week: WeekStats,
}

/// `GET /api/graph`
///
/// Parallel arrays, one entry per week bar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphResponse {
    /// Week labels (`dd.mm-dd.mm`).
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub weeks: Vec<String>,
    /// Case totals per week.
    #[serde(default, deserialize_with = "lenient::count_list")]
    pub cases: Vec<u64>,
    /// Bar colors chosen by the backend.
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub colors: Vec<String>,
}

/// `GET /api/sources`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourcesResponse {
    /// Matching reports, newest first.
    #[serde(default, deserialize_with = "lenient::list")]
    pub sources: Vec<CaseRecord>,
    /// Total number of matches before the result cap, when reported.
    #[serde(default, deserialize_with = "lenient::optional_count")]
    pub total: Option<u64>,
    /// Echo of the filters the backend applied, when reported.
    #[serde(default, deserialize_with = "lenient::object")]
    pub filters_applied: BTreeMap<String, serde_json::Value>,
}

/// `GET /api/map-data`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapDataResponse {
    /// Geocoded report locations, one per report.
    #[serde(default, deserialize_with = "lenient::list")]
    pub locations: Vec<CaseRecord>,
}

/// One month of the case forecast.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Month label.
    #[serde(default, deserialize_with = "lenient::string")]
    pub month: String,
    /// Predicted total for the month.
    #[serde(default, deserialize_with = "lenient::signed")]
    pub total_cases: i64,
    /// Predicted weekly average.
    #[serde(default, deserialize_with = "lenient::number")]
    pub avg_weekly: f64,
}

impl ForecastPoint {
    /// Risk band derived from the forecast threshold table.
    #[must_use]
    pub const fn risk_band(&self) -> RiskBand {
        classify_forecast_cases(self.total_cases)
    }
}

/// `GET /api/forecast`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    /// Monthly forecast points in chronological order.
    #[serde(default, deserialize_with = "lenient::list")]
    pub forecast: Vec<ForecastPoint>,
}

/// Priority of a generated news item.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(from = "Option<serde_json::Value>", rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum NewsPriority {
    /// Routine item.
    #[default]
    Low,
    /// Notable item.
    Medium,
    /// Urgent item.
    High,
}

impl From<Option<serde_json::Value>> for NewsPriority {
    fn from(value: Option<serde_json::Value>) -> Self {
        value
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or_default()
    }
}

/// One entry of the generated news feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Headline text.
    #[serde(default, deserialize_with = "lenient::string")]
    pub text: String,
    /// Item date as formatted by the backend.
    #[serde(default, deserialize_with = "lenient::string")]
    pub date: String,
    /// Settlement the item is about.
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub location: Option<String>,
    /// Case count mentioned in the item.
    #[serde(default, deserialize_with = "lenient::optional_count")]
    pub cases: Option<u64>,
    /// Priority (`high`, `medium`, `low`).
    #[serde(default)]
    pub priority: NewsPriority,
    /// Generator category (e.g. `alert`, `trend`).
    #[serde(
        default,
        rename = "type",
        deserialize_with = "lenient::optional_string"
    )]
    pub kind: Option<String>,
}

/// `GET /api/news-feed`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsFeedResponse {
    /// Items in backend order.
    #[serde(default, deserialize_with = "lenient::list")]
    pub news: Vec<NewsItem>,
}

/// Aggregate numbers for one calendar year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearSummary {
    /// Cases recorded during the year.
    #[serde(default, deserialize_with = "lenient::count")]
    pub total_cases: u64,
    /// Average cases per month.
    #[serde(default, deserialize_with = "lenient::number")]
    pub avg_per_month: f64,
    /// Number of underlying reports, when reported.
    #[serde(default, deserialize_with = "lenient::optional_count")]
    pub records_count: Option<u64>,
}

/// `GET /api/analytics/compare`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResponse {
    /// Per-year aggregates keyed by year label. `BTreeMap` keeps years in
    /// ascending order.
    #[serde(default, deserialize_with = "lenient::object")]
    pub comparison: BTreeMap<String, YearSummary>,
}

/// `POST /api/update`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResponse {
    /// Status keyword (`started`).
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub status: Option<String>,
    /// Human-readable message.
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub message: Option<String>,
}

/// Time window requested from `/api/map-data`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MapPeriod {
    /// Every stored report.
    #[default]
    All,
    /// The last seven days.
    Week,
    /// The last thirty days.
    Month,
}

/// File format offered by `/api/export/{format}`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExportFormat {
    /// Comma-separated values.
    Csv,
    /// Excel workbook.
    Excel,
    /// PDF report.
    Pdf,
}

impl ExportFormat {
    /// File extension of the downloaded document.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Excel => "xlsx",
            Self::Pdf => "pdf",
        }
    }
}

/// The user's active filter values.
///
/// Text fields are stored as entered; emptiness is decided when a request
/// is built, so a field holding only whitespace counts as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    /// Free-text search over title and content.
    pub search: String,
    /// Settlement filter.
    pub location: Option<String>,
    /// Provenance filter.
    pub source: Option<String>,
    /// Risk label filter (canonical Russian label).
    pub risk_level: Option<String>,
    /// Inclusive start of the date range.
    pub start_date: Option<NaiveDate>,
    /// Inclusive end of the date range.
    pub end_date: Option<NaiveDate>,
}

impl FilterState {
    /// Startup filter: empty text filters and a date range covering the
    /// `range_months` months up to and including `today`.
    #[must_use]
    pub fn initial(today: NaiveDate, range_months: u32) -> Self {
        let start = today
            .checked_sub_months(Months::new(range_months))
            .unwrap_or(NaiveDate::MIN);
        Self {
            start_date: Some(start),
            end_date: Some(today),
            ..Self::default()
        }
    }

    /// The date range, only when both bounds are set.
    #[must_use]
    pub const fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    /// Text filters in request order, `None` where the field is unset or
    /// blank.
    #[must_use]
    pub fn text_filters(&self) -> [(&'static str, Option<&str>); 4] {
        [
            ("search", non_blank(Some(self.search.as_str()))),
            ("location", non_blank(self.location.as_deref())),
            ("source", non_blank(self.source.as_deref())),
            ("risk_level", non_blank(self.risk_level.as_deref())),
        ]
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn case_record_reads_sparse_map_location() {
        let record: CaseRecord = serde_json::from_value(json!({
            "lat": 57.1522,
            "lng": 65.5272,
            "location": "Тюмень",
            "cases": 12,
            "date": "03.05.2024",
            "source": "rospotrebnadzor"
        }))
        .unwrap();

        assert_eq!(record.coordinates(), Some((57.1522, 65.5272)));
        assert_eq!(record.cases, 12);
        assert_eq!(record.risk_level, RiskBand::Low);
        assert_eq!(record.title, None);
        assert_eq!(
            record.parsed_date(),
            NaiveDate::from_ymd_opt(2024, 5, 3)
        );
    }

    #[test]
    fn case_record_without_coordinates() {
        let record: CaseRecord = serde_json::from_value(json!({
            "cases": null,
            "risk_level": "Высокий",
            "title": "Клещи в парке",
            "url": "https://example.org/a"
        }))
        .unwrap();

        assert_eq!(record.coordinates(), None);
        assert_eq!(record.cases, 0);
        assert_eq!(record.location, "");
        assert_eq!(record.risk_level, RiskBand::High);
        assert_eq!(record.url.as_deref(), Some("https://example.org/a"));
    }

    #[test]
    fn half_coordinates_are_not_coordinates() {
        let record = CaseRecord {
            lat: Some(57.0),
            ..CaseRecord::default()
        };
        assert_eq!(record.coordinates(), None);
    }

    #[test]
    fn stats_response_tolerates_missing_week() {
        let stats: StatsResponse = serde_json::from_value(json!({
            "current_week": {"cases": 7, "date": "13.05.2024", "risk_level": "Умеренный"}
        }))
        .unwrap();
        assert_eq!(stats.current_week.cases, 7);
        assert_eq!(stats.current_week.risk_level, RiskBand::Moderate);
        assert_eq!(stats.previous_week, WeekStats::default());
    }

    #[test]
    fn non_string_risk_level_does_not_fail_the_list() {
        let response: SourcesResponse = serde_json::from_value(json!({
            "sources": [{"cases": 3, "risk_level": 2}, {"cases": 1}]
        }))
        .unwrap();
        assert_eq!(response.sources.len(), 2);
        assert_eq!(response.sources[0].cases, 3);
        assert_eq!(response.sources[0].risk_level, RiskBand::Low);
    }

    #[test]
    fn null_collections_read_as_empty() {
        let sources: SourcesResponse =
            serde_json::from_value(json!({"sources": null, "filters_applied": null})).unwrap();
        assert!(sources.sources.is_empty());
        assert!(sources.filters_applied.is_empty());

        let map: MapDataResponse = serde_json::from_value(json!({"locations": null})).unwrap();
        assert!(map.locations.is_empty());

        let forecast: ForecastResponse = serde_json::from_value(json!({"forecast": null})).unwrap();
        assert!(forecast.forecast.is_empty());

        let news: NewsFeedResponse = serde_json::from_value(json!({"news": null})).unwrap();
        assert!(news.news.is_empty());

        let cmp: ComparisonResponse = serde_json::from_value(json!({"comparison": null})).unwrap();
        assert!(cmp.comparison.is_empty());
    }

    #[test]
    fn null_weeks_read_as_empty_weeks() {
        let stats: StatsResponse = serde_json::from_value(json!({
            "current_week": null,
            "previous_week": {"cases": 4, "date": "06.05.2024"}
        }))
        .unwrap();
        assert_eq!(stats.current_week, WeekStats::default());
        assert_eq!(stats.previous_week.cases, 4);
    }

    #[test]
    fn forecast_point_band_uses_forecast_table() {
        let point: ForecastPoint = serde_json::from_value(json!({
            "month": "Май 2026", "total_cases": 605, "avg_weekly": 151.25
        }))
        .unwrap();
        assert_eq!(point.risk_band(), RiskBand::VeryHigh);

        let point = ForecastPoint {
            total_cases: 599,
            ..point
        };
        assert_eq!(point.risk_band(), RiskBand::High);
    }

    #[test]
    fn news_priority_is_lenient() {
        let feed: NewsFeedResponse = serde_json::from_value(json!({
            "news": [
                {"text": "a", "date": "01.05.2024", "priority": "HIGH", "type": "alert"},
                {"text": "b", "date": "02.05.2024", "priority": "urgent"},
                {"text": "c", "date": "03.05.2024"},
                {"text": "d", "date": "04.05.2024", "priority": 1}
            ]
        }))
        .unwrap();
        let priorities: Vec<NewsPriority> = feed.news.iter().map(|n| n.priority).collect();
        assert_eq!(
            priorities,
            vec![
                NewsPriority::High,
                NewsPriority::Low,
                NewsPriority::Low,
                NewsPriority::Low
            ]
        );
        assert_eq!(feed.news[0].kind.as_deref(), Some("alert"));
    }

    #[test]
    fn comparison_years_are_sorted() {
        let cmp: ComparisonResponse = serde_json::from_value(json!({
            "comparison": {
                "2024": {"total_cases": 300, "avg_per_month": 25.0},
                "2022": {"total_cases": 100, "avg_per_month": 8.3},
                "2023": {"total_cases": 200, "avg_per_month": 16.6, "records_count": 40}
            }
        }))
        .unwrap();
        let years: Vec<&str> = cmp.comparison.keys().map(String::as_str).collect();
        assert_eq!(years, vec!["2022", "2023", "2024"]);
        assert_eq!(cmp.comparison["2023"].records_count, Some(40));
    }

    #[test]
    fn initial_filter_covers_last_two_months() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
        let filter = FilterState::initial(today, 2);
        assert_eq!(
            filter.date_range(),
            Some((NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(), today))
        );
        assert!(filter.search.is_empty());
        assert_eq!(filter.location, None);
    }

    #[test]
    fn date_range_requires_both_bounds() {
        let filter = FilterState {
            start_date: NaiveDate::from_ymd_opt(2024, 5, 1),
            ..FilterState::default()
        };
        assert_eq!(filter.date_range(), None);
    }

    #[test]
    fn text_filters_drop_blank_values() {
        let filter = FilterState {
            search: "  ".to_string(),
            location: Some("Ишим".to_string()),
            source: Some(String::new()),
            risk_level: None,
            ..FilterState::default()
        };
        let set: Vec<&str> = filter
            .text_filters()
            .iter()
            .filter_map(|(name, value)| value.map(|_| *name))
            .collect();
        assert_eq!(set, vec!["location"]);
    }

    #[test]
    fn text_filters_send_values_as_entered() {
        let filter = FilterState {
            search: " клещ ".to_string(),
            ..FilterState::default()
        };
        assert_eq!(filter.text_filters()[0], ("search", Some(" клещ ")));
    }

    #[test]
    fn view_names_are_snake_case() {
        assert_eq!(View::Comparison.to_string(), "comparison");
        assert_eq!("news".parse::<View>().unwrap(), View::News);
        assert_eq!(MapPeriod::default().as_ref(), "all");
        assert_eq!(ExportFormat::Excel.as_ref(), "excel");
        assert_eq!(ExportFormat::Excel.extension(), "xlsx");
    }
}
