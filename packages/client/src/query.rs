//! Request descriptors for every backend endpoint.
//!
//! [`QueryBuilder`] turns the dashboard's [`FilterState`] into concrete
//! requests. Two rules are enforced here:
//!
//! * text filters are sent in the fixed order `search`, `location`,
//!   `source`, `risk_level`, and blank fields are left out entirely;
//! * the `start_date`/`end_date` pair is all-or-nothing. If either bound is
//!   missing, neither is sent and the backend returns its full range.

use chrono::NaiveDate;
use tick_monitor_dashboard_models::{ExportFormat, FilterState, MapPeriod, View};

use crate::ClientError;

/// `GET` weekly stats.
pub const STATS_PATH: &str = "/api/stats";
/// `GET` weekly bar chart data.
pub const GRAPH_PATH: &str = "/api/graph";
/// `GET` source report list.
pub const SOURCES_PATH: &str = "/api/sources";
/// `GET` geocoded report locations.
pub const MAP_DATA_PATH: &str = "/api/map-data";
/// `GET` monthly forecast.
pub const FORECAST_PATH: &str = "/api/forecast";
/// `GET` generated news feed.
pub const NEWS_FEED_PATH: &str = "/api/news-feed";
/// `GET` year-over-year comparison.
pub const COMPARE_PATH: &str = "/api/analytics/compare";
/// `POST` trigger backend ingestion.
pub const UPDATE_PATH: &str = "/api/update";
/// Prefix of `GET /api/export/{format}`.
pub const EXPORT_PATH_PREFIX: &str = "/api/export";

/// Result-size cap sent with every sources request unless configured
/// otherwise.
pub const DEFAULT_SOURCES_LIMIT: u32 = 20;

/// Date format of the `start_date`/`end_date` query parameters.
pub const QUERY_DATE_FORMAT: &str = "%Y-%m-%d";

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Read-only fetch.
    Get,
    /// State-changing call.
    Post,
}

/// Endpoint path plus ordered query parameters.
///
/// Parameters are kept unencoded; encoding happens once, in
/// [`RequestDescriptor::url`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    /// HTTP method.
    pub method: Method,
    /// Absolute path below the API host (starts with `/`).
    pub path: String,
    /// Query parameters in the order they are sent.
    pub query: Vec<(String, String)>,
}

impl RequestDescriptor {
    /// A `GET` request without parameters.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// A `POST` request without parameters.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn with_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query.push((name.to_string(), value.into()));
        self
    }

    /// Value of the first parameter named `name`.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Resolves the descriptor against `base`, URL-encoding each parameter.
    ///
    /// The base may carry a path prefix (e.g. `https://host/monitor`); the
    /// request path is appended to it rather than replacing it. Any query or
    /// fragment on the base is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if `base` cannot be a base URL.
    pub fn url(&self, base: &reqwest::Url) -> Result<reqwest::Url, ClientError> {
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl {
                message: format!("{base}: not a base URL"),
            });
        }
        let mut url = base.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.set_path(&format!("{}{}", base.path().trim_end_matches('/'), self.path));
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url)
    }
}

/// Builds the request for each dashboard view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryBuilder {
    sources_limit: u32,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCES_LIMIT)
    }
}

impl QueryBuilder {
    /// Creates a builder with the given sources result-size cap.
    #[must_use]
    pub const fn new(sources_limit: u32) -> Self {
        Self { sources_limit }
    }

    /// `GET /api/stats`
    #[must_use]
    pub fn stats(&self) -> RequestDescriptor {
        RequestDescriptor::get(STATS_PATH)
    }

    /// `GET /api/graph`, date-filtered only when both bounds are set.
    #[must_use]
    pub fn graph(&self, filter: &FilterState) -> RequestDescriptor {
        with_date_range(RequestDescriptor::get(GRAPH_PATH), filter)
    }

    /// `GET /api/sources` with the result cap and every non-blank text
    /// filter, in fixed order.
    #[must_use]
    pub fn sources(&self, filter: &FilterState) -> RequestDescriptor {
        filter.text_filters().into_iter().fold(
            RequestDescriptor::get(SOURCES_PATH).with_param("limit", self.sources_limit.to_string()),
            |request, (name, value)| match value {
                Some(value) => request.with_param(name, value),
                None => request,
            },
        )
    }

    /// `GET /api/map-data?view=<period>`
    #[must_use]
    pub fn map_data(&self, period: MapPeriod) -> RequestDescriptor {
        RequestDescriptor::get(MAP_DATA_PATH).with_param("view", period.as_ref())
    }

    /// `GET /api/forecast`
    #[must_use]
    pub fn forecast(&self) -> RequestDescriptor {
        RequestDescriptor::get(FORECAST_PATH)
    }

    /// `GET /api/news-feed`
    #[must_use]
    pub fn news_feed(&self) -> RequestDescriptor {
        RequestDescriptor::get(NEWS_FEED_PATH)
    }

    /// `GET /api/analytics/compare`
    #[must_use]
    pub fn comparison(&self) -> RequestDescriptor {
        RequestDescriptor::get(COMPARE_PATH)
    }

    /// `POST /api/update`
    #[must_use]
    pub fn update(&self) -> RequestDescriptor {
        RequestDescriptor::post(UPDATE_PATH)
    }

    /// `GET /api/export/{format}`, date-filtered only when both bounds are
    /// set.
    #[must_use]
    pub fn export(&self, format: ExportFormat, filter: &FilterState) -> RequestDescriptor {
        with_date_range(
            RequestDescriptor::get(format!("{EXPORT_PATH_PREFIX}/{}", format.as_ref())),
            filter,
        )
    }

    /// The request that refreshes `view`.
    #[must_use]
    pub fn for_view(&self, view: View, filter: &FilterState, period: MapPeriod) -> RequestDescriptor {
        match view {
            View::Stats => self.stats(),
            View::Graph => self.graph(filter),
            View::Sources => self.sources(filter),
            View::Map => self.map_data(period),
            View::Forecast => self.forecast(),
            View::Comparison => self.comparison(),
            View::News => self.news_feed(),
        }
    }
}

fn with_date_range(request: RequestDescriptor, filter: &FilterState) -> RequestDescriptor {
    match filter.date_range() {
        Some((start, end)) => request
            .with_param("start_date", format_date(start))
            .with_param("end_date", format_date(end)),
        None => request,
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(QUERY_DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> reqwest::Url {
        reqwest::Url::parse("http://localhost:5000").unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn sources_with_only_search_adds_one_parameter() {
        let filter = FilterState {
            search: "клещ".to_string(),
            start_date: Some(date(2024, 3, 1)),
            end_date: Some(date(2024, 5, 1)),
            ..FilterState::default()
        };
        let request = QueryBuilder::default().sources(&filter);

        assert_eq!(request.path, SOURCES_PATH);
        assert_eq!(
            request.query,
            vec![
                ("limit".to_string(), "20".to_string()),
                ("search".to_string(), "клещ".to_string()),
            ]
        );
    }

    #[test]
    fn sources_parameters_keep_fixed_order() {
        let filter = FilterState {
            search: "укус".to_string(),
            location: Some("Тобольск".to_string()),
            source: Some("rss".to_string()),
            risk_level: Some("Высокий".to_string()),
            ..FilterState::default()
        };
        let names: Vec<String> = QueryBuilder::new(50)
            .sources(&filter)
            .query
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(
            names,
            vec!["limit", "search", "location", "source", "risk_level"]
        );
    }

    #[test]
    fn empty_filters_are_omitted_not_sent_blank() {
        let filter = FilterState {
            search: String::new(),
            location: Some("   ".to_string()),
            source: Some(String::new()),
            risk_level: None,
            ..FilterState::default()
        };
        let request = QueryBuilder::default().sources(&filter);
        assert_eq!(request.query.len(), 1);
        assert_eq!(request.param("limit"), Some("20"));
        assert_eq!(request.param("location"), None);
    }

    #[test]
    fn graph_with_half_range_is_unfiltered() {
        let filter = FilterState {
            start_date: Some(date(2024, 4, 1)),
            end_date: None,
            ..FilterState::default()
        };
        let request = QueryBuilder::default().graph(&filter);
        assert_eq!(request, RequestDescriptor::get(GRAPH_PATH));

        let filter = FilterState {
            start_date: None,
            end_date: Some(date(2024, 4, 1)),
            ..FilterState::default()
        };
        assert!(QueryBuilder::default().graph(&filter).query.is_empty());
    }

    #[test]
    fn graph_with_full_range_sends_both_dates() {
        let filter = FilterState {
            start_date: Some(date(2024, 4, 1)),
            end_date: Some(date(2024, 5, 31)),
            ..FilterState::default()
        };
        let request = QueryBuilder::default().graph(&filter);
        assert_eq!(request.param("start_date"), Some("2024-04-01"));
        assert_eq!(request.param("end_date"), Some("2024-05-31"));
    }

    #[test]
    fn export_follows_the_same_date_rule() {
        let half = FilterState {
            end_date: Some(date(2024, 5, 31)),
            ..FilterState::default()
        };
        let request = QueryBuilder::default().export(ExportFormat::Pdf, &half);
        assert_eq!(request.path, "/api/export/pdf");
        assert!(request.query.is_empty());

        let full = FilterState {
            start_date: Some(date(2024, 5, 1)),
            ..half
        };
        let url = QueryBuilder::default()
            .export(ExportFormat::Csv, &full)
            .url(&base())
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/api/export/csv?start_date=2024-05-01&end_date=2024-05-31"
        );
    }

    #[test]
    fn url_encodes_each_parameter() {
        let filter = FilterState {
            search: "a&b c".to_string(),
            ..FilterState::default()
        };
        let url = QueryBuilder::default().sources(&filter).url(&base()).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/api/sources?limit=20&search=a%26b+c"
        );
    }

    #[test]
    fn url_without_parameters_has_no_query() {
        let url = QueryBuilder::default().stats().url(&base()).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/stats");
        assert_eq!(url.query(), None);
    }

    #[test]
    fn url_keeps_base_path_prefix() {
        let base = reqwest::Url::parse("https://example.org/monitor/").unwrap();
        let url = QueryBuilder::default().forecast().url(&base).unwrap();
        assert_eq!(url.as_str(), "https://example.org/monitor/api/forecast");
    }

    #[test]
    fn base_query_and_fragment_are_not_carried_over() {
        let base = reqwest::Url::parse("https://example.org/monitor?token=x#top").unwrap();
        let url = QueryBuilder::default()
            .map_data(MapPeriod::Month)
            .url(&base)
            .unwrap();
        assert_eq!(url.as_str(), "https://example.org/monitor/api/map-data?view=month");
    }

    #[test]
    fn map_data_sends_period() {
        let request = QueryBuilder::default().map_data(MapPeriod::Week);
        assert_eq!(request.param("view"), Some("week"));
        assert_eq!(
            QueryBuilder::default()
                .map_data(MapPeriod::default())
                .param("view"),
            Some("all")
        );
    }

    #[test]
    fn for_view_routes_every_view() {
        let builder = QueryBuilder::default();
        let filter = FilterState::default();
        let paths: Vec<String> = View::all()
            .iter()
            .map(|v| builder.for_view(*v, &filter, MapPeriod::All).path)
            .collect();
        assert_eq!(
            paths,
            vec![
                STATS_PATH,
                GRAPH_PATH,
                SOURCES_PATH,
                MAP_DATA_PATH,
                FORECAST_PATH,
                COMPARE_PATH,
                NEWS_FEED_PATH,
            ]
        );
        assert_eq!(builder.update().method, Method::Post);
    }
}
