//! Fetch, transform and render cycles for every dashboard view.
//!
//! Each view is refreshed with exactly one request. Requests for several
//! views are in flight together and each view renders as soon as its own
//! response settles, in completion order. A failing view shows its
//! placeholder and leaves the other views alone.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use futures::StreamExt as _;
use futures::stream::FuturesUnordered;
use serde_json::Value;
use tick_monitor_client::decode::decode;
use tick_monitor_client::{ClientError, DashboardApi, QueryBuilder, RequestDescriptor};
use tick_monitor_dashboard_models::{
    ComparisonResponse, ExportFormat, FilterState, ForecastResponse, GraphResponse,
    MapDataResponse, MapPeriod, NewsFeedResponse, SourcesResponse, StatsResponse,
    UpdateResponse, View,
};
use tick_monitor_geo::ClusterSet;

use crate::config::DashboardConfig;
use crate::preferences::{PreferenceError, PreferenceStore};
use crate::presenter::{ChartMount, Presenter};
use crate::state::ViewState;
use crate::transform::{self, EMPTY_TEXT, UPDATE_FAILED_TEXT, Viewport};

/// How one view's refresh ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewOutcome {
    /// Data was drawn.
    Rendered,
    /// The request succeeded but there was nothing to draw.
    Empty,
    /// The request or its decoding failed; a placeholder is shown.
    Failed,
}

/// Outcome of every view touched by one refresh.
pub type RefreshReport = BTreeMap<View, ViewOutcome>;

/// Outcome of the manual update action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The backend accepted the update; stats, graph and sources were
    /// reloaded after the settle delay.
    Refreshed {
        /// Message returned by the backend, if any.
        message: Option<String>,
        /// Outcome of the reload.
        report: RefreshReport,
    },
    /// The trigger failed; the user was alerted with `message`.
    Failed {
        /// Text of the alert.
        message: String,
    },
}

/// Drives the dashboard.
pub struct RefreshOrchestrator<A, P> {
    api: A,
    presenter: P,
    state: ViewState,
    config: DashboardConfig,
    queries: QueryBuilder,
    preferences: PreferenceStore,
}

impl<A: DashboardApi, P: Presenter> RefreshOrchestrator<A, P> {
    /// Creates an orchestrator whose filter starts at the configured range
    /// ending on `today`, with the persisted theme.
    ///
    /// An unreadable preference file is logged and treated as the light
    /// theme.
    #[must_use]
    pub fn new(api: A, presenter: P, config: DashboardConfig, today: NaiveDate) -> Self {
        let preferences = PreferenceStore::new(config.theme_file.clone());
        let dark_theme = preferences.load_dark_theme().unwrap_or_else(|e| {
            log::warn!("Ignoring theme preference: {e}");
            false
        });
        let filter = FilterState::initial(today, config.default_range_months);

        Self {
            api,
            presenter,
            state: ViewState::new(filter, dark_theme),
            queries: QueryBuilder::new(config.sources_limit),
            config,
            preferences,
        }
    }

    /// Backend client.
    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Rendering target.
    #[must_use]
    pub const fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Current view state.
    #[must_use]
    pub const fn state(&self) -> &ViewState {
        &self.state
    }

    /// Resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Applies the persisted theme and loads every view.
    pub async fn start(&mut self) -> RefreshReport {
        self.presenter.apply_theme(self.state.dark_theme());
        self.refresh_all().await
    }

    /// Refreshes every view.
    pub async fn refresh_all(&mut self) -> RefreshReport {
        self.refresh_views(View::all()).await
    }

    /// Refreshes the given views concurrently. Duplicates are refreshed
    /// once.
    pub async fn refresh_views(&mut self, views: &[View]) -> RefreshReport {
        let Self {
            api,
            presenter,
            state,
            config,
            queries,
            ..
        } = self;
        let api = &*api;

        let requests: Vec<(View, RequestDescriptor)> = views
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|view| {
                (
                    view,
                    queries.for_view(view, state.filter(), state.map_period()),
                )
            })
            .collect();

        for (view, request) in &requests {
            log::debug!("Loading {view}: {} {:?}", request.path, request.query);
            state.begin_loading(*view);
            presenter.set_loading(*view, true);
        }

        let mut pending: FuturesUnordered<_> = requests
            .iter()
            .map(|(view, request)| async move { (*view, api.send(request).await) })
            .collect();

        let mut report = RefreshReport::new();
        while let Some((view, result)) = pending.next().await {
            state.finish_loading(view);
            presenter.set_loading(view, false);
            let outcome = settle_view(presenter, state, config, view, result);
            log::debug!("{view} settled: {outcome:?}");
            report.insert(view, outcome);
        }
        report
    }

    /// Replaces the filter and reloads the sources list, the only view the
    /// text filters apply to.
    pub async fn apply_filters(&mut self, filter: FilterState) -> RefreshReport {
        self.state.set_filter(filter);
        self.refresh_views(&[View::Sources]).await
    }

    /// Replaces the filter without reloading anything (used before an
    /// export, which is not a view).
    pub fn replace_filter(&mut self, filter: FilterState) {
        self.state.set_filter(filter);
    }

    /// Restores the startup filter and reloads sources and graph.
    pub async fn reset_filters(&mut self) -> RefreshReport {
        self.state.reset_filter();
        self.refresh_views(&[View::Sources, View::Graph]).await
    }

    /// Sets the graph date range and reloads the graph. A half-open range
    /// is kept as entered; the graph request then carries no dates.
    pub async fn set_date_range(
        &mut self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> RefreshReport {
        let filter = FilterState {
            start_date: start,
            end_date: end,
            ..self.state.filter().clone()
        };
        self.state.set_filter(filter);
        self.refresh_views(&[View::Graph]).await
    }

    /// Switches the map time window and reloads only the map.
    pub async fn set_map_period(&mut self, period: MapPeriod) -> RefreshReport {
        self.state.set_map_period(period);
        self.refresh_views(&[View::Map]).await
    }

    /// Triggers backend ingestion.
    ///
    /// The overlay is raised first and lowered on every path. On success
    /// the stats, graph and sources views are reloaded after the settle
    /// delay; on failure the user is alerted and nothing is reloaded.
    pub async fn update_data(&mut self) -> UpdateOutcome {
        self.set_overlay(true);
        log::info!("Triggering data update");

        let request = self.queries.update();
        let result = self
            .api
            .send(&request)
            .await
            .and_then(decode::<UpdateResponse>);

        let outcome = match result {
            Ok(response) => {
                let delay = self.config.settle_delay();
                log::info!(
                    "Update accepted ({}), reloading in {delay:?}",
                    response.status.as_deref().unwrap_or("ok")
                );
                tokio::time::sleep(delay).await;
                let report = self.refresh_views(View::update_trio()).await;
                UpdateOutcome::Refreshed {
                    message: response.message,
                    report,
                }
            }
            Err(e) => {
                log::error!("Data update failed: {e}");
                let message = e
                    .backend_message()
                    .map_or_else(|| UPDATE_FAILED_TEXT.to_string(), str::to_string);
                self.presenter.alert(&message);
                UpdateOutcome::Failed { message }
            }
        };

        self.set_overlay(false);
        outcome
    }

    /// The export request for the current filter. Dates are included only
    /// when both bounds are set.
    #[must_use]
    pub fn export_request(&self, format: ExportFormat) -> RequestDescriptor {
        self.queries.export(format, self.state.filter())
    }

    /// Absolute export URL for the current filter.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if the URL cannot be built.
    pub fn export_url(&self, format: ExportFormat) -> Result<reqwest::Url, ClientError> {
        self.api.url_for(&self.export_request(format))
    }

    /// Flips the theme, applies it and persists it.
    ///
    /// The theme is applied even if persisting fails.
    ///
    /// # Errors
    ///
    /// Returns [`PreferenceError`] if the preference cannot be saved.
    pub fn toggle_theme(&mut self) -> Result<bool, PreferenceError> {
        let dark = !self.state.dark_theme();
        self.state.set_dark_theme(dark);
        self.presenter.apply_theme(dark);
        self.preferences.save_dark_theme(dark)?;
        Ok(dark)
    }

    fn set_overlay(&mut self, active: bool) {
        self.state.set_overlay(active);
        self.presenter.set_overlay(active);
    }
}

fn settle_view<P: Presenter>(
    presenter: &P,
    state: &mut ViewState,
    config: &DashboardConfig,
    view: View,
    result: Result<Value, ClientError>,
) -> ViewOutcome {
    match result.and_then(|body| draw_view(presenter, state, config, view, body)) {
        Ok(outcome) => outcome,
        Err(e) => {
            if e.backend_message().is_some() {
                log::warn!("{view}: backend reported: {e}");
            } else {
                log::error!("{view}: failed to load: {e}");
            }
            state.clear_view(presenter, view);
            presenter.show_placeholder(view, &transform::failure_text(&e));
            ViewOutcome::Failed
        }
    }
}

fn draw_view<P: Presenter>(
    presenter: &P,
    state: &mut ViewState,
    config: &DashboardConfig,
    view: View,
    body: Value,
) -> Result<ViewOutcome, ClientError> {
    let outcome = match view {
        View::Stats => {
            let stats: StatsResponse = decode(body)?;
            presenter.render_stats(&transform::stats_cards(&stats));
            ViewOutcome::Rendered
        }
        View::Graph => {
            let graph: GraphResponse = decode(body)?;
            if graph.weeks.is_empty() {
                empty_view(presenter, state, view)
            } else {
                state.replace_chart(presenter, ChartMount::Graph, &transform::graph_chart(&graph));
                ViewOutcome::Rendered
            }
        }
        View::Sources => {
            let sources: SourcesResponse = decode(body)?;
            if sources.sources.is_empty() {
                empty_view(presenter, state, view)
            } else {
                presenter.render_sources(&transform::sources_list(&sources));
                ViewOutcome::Rendered
            }
        }
        View::Map => {
            let data: MapDataResponse = decode(body)?;
            let clusters = ClusterSet::aggregate(&data.locations);
            let plan = transform::map_plan(&clusters);
            let map = state.replace_map(
                presenter,
                config.default_map_center,
                config.default_map_zoom,
            );
            for marker in &plan.markers {
                presenter.place_marker(map, marker);
            }
            match plan.viewport {
                Viewport::Fit(bounds) => {
                    presenter.fit_bounds(map, &bounds);
                    ViewOutcome::Rendered
                }
                Viewport::Default => ViewOutcome::Empty,
            }
        }
        View::Forecast => {
            let forecast: ForecastResponse = decode(body)?;
            let rows = transform::forecast_rows(&forecast);
            if rows.is_empty() {
                empty_view(presenter, state, view)
            } else {
                state.replace_chart(
                    presenter,
                    ChartMount::Forecast,
                    &transform::forecast_chart(&rows),
                );
                presenter.render_forecast_table(&rows);
                ViewOutcome::Rendered
            }
        }
        View::Comparison => {
            let comparison: ComparisonResponse = decode(body)?;
            let rows = transform::comparison_rows(&comparison);
            if rows.is_empty() {
                empty_view(presenter, state, view)
            } else {
                state.replace_chart(
                    presenter,
                    ChartMount::Comparison,
                    &transform::comparison_chart(&rows),
                );
                presenter.render_comparison_table(&rows);
                ViewOutcome::Rendered
            }
        }
        View::News => {
            let feed: NewsFeedResponse = decode(body)?;
            let entries = transform::news_entries(&feed);
            if entries.is_empty() {
                empty_view(presenter, state, view)
            } else {
                presenter.render_news(&entries);
                ViewOutcome::Rendered
            }
        }
    };
    Ok(outcome)
}

fn empty_view<P: Presenter>(presenter: &P, state: &mut ViewState, view: View) -> ViewOutcome {
    state.clear_view(presenter, view);
    presenter.show_placeholder(view, EMPTY_TEXT);
    ViewOutcome::Empty
}
