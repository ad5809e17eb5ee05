//! Rendering seam between the dashboard and a concrete front end.
//!
//! The dashboard never draws anything itself. It hands view models to a
//! [`Presenter`], which owns the actual chart and map capabilities and
//! identifies the objects it creates with opaque handles. The dashboard
//! keeps those handles in [`crate::state::ViewState`] so it can destroy an
//! old chart before creating its replacement on the same mount point.

use std::sync::atomic::{AtomicU64, Ordering};

use tick_monitor_dashboard_models::View;
use tick_monitor_geo::BoundingBox;

use crate::config::GeoPoint;
use crate::transform::{
    ChartSpec, ComparisonRow, ForecastRow, MarkerSpec, NewsEntry, SourcesList, StatsCards,
};

/// Identifies a chart created by a [`Presenter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChartHandle(pub u64);

/// Identifies a map created by a [`Presenter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MapHandle(pub u64);

/// Mount point that holds at most one chart at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChartMount {
    /// Weekly cases bar chart.
    Graph,
    /// Monthly forecast line chart.
    Forecast,
    /// Year-over-year bar chart.
    Comparison,
}

impl ChartMount {
    /// The view a mount belongs to.
    #[must_use]
    pub const fn view(self) -> View {
        match self {
            Self::Graph => View::Graph,
            Self::Forecast => View::Forecast,
            Self::Comparison => View::Comparison,
        }
    }

    /// The chart mount of `view`, if it has one.
    #[must_use]
    pub const fn of_view(view: View) -> Option<Self> {
        match view {
            View::Graph => Some(Self::Graph),
            View::Forecast => Some(Self::Forecast),
            View::Comparison => Some(Self::Comparison),
            View::Stats | View::Sources | View::Map | View::News => None,
        }
    }
}

/// Front end that draws dashboard views.
///
/// Implementations must be `Send + Sync` so a presenter can be shared with
/// background tasks. All methods take `&self`; implementations use interior
/// mutability for any bookkeeping.
pub trait Presenter: Send + Sync {
    /// Creates a chart on `mount` and returns its handle.
    fn create_chart(&self, mount: ChartMount, spec: &ChartSpec) -> ChartHandle;

    /// Destroys a chart previously returned by [`Presenter::create_chart`].
    fn destroy_chart(&self, handle: ChartHandle);

    /// Creates an empty map centered on `center`.
    fn create_map(&self, center: GeoPoint, zoom: u8) -> MapHandle;

    /// Places one circle marker on a map.
    fn place_marker(&self, map: MapHandle, marker: &MarkerSpec);

    /// Moves the map viewport so `bounds` is fully visible.
    fn fit_bounds(&self, map: MapHandle, bounds: &BoundingBox);

    /// Destroys a map previously returned by [`Presenter::create_map`].
    fn destroy_map(&self, handle: MapHandle);

    /// Draws the weekly stats cards.
    fn render_stats(&self, stats: &StatsCards);

    /// Draws the sources list.
    fn render_sources(&self, sources: &SourcesList);

    /// Draws the forecast table (the chart goes through
    /// [`Presenter::create_chart`]).
    fn render_forecast_table(&self, rows: &[ForecastRow]);

    /// Draws the year comparison table.
    fn render_comparison_table(&self, rows: &[ComparisonRow]);

    /// Draws the news feed.
    fn render_news(&self, entries: &[NewsEntry]);

    /// Replaces the content of `view` with a text message.
    fn show_placeholder(&self, view: View, text: &str);

    /// Marks `view` as loading or idle.
    fn set_loading(&self, view: View, loading: bool);

    /// Shows or hides the blocking update overlay.
    fn set_overlay(&self, active: bool);

    /// Shows a blocking alert.
    fn alert(&self, message: &str);

    /// Switches between the dark and the light theme.
    fn apply_theme(&self, dark: bool);
}

/// A [`Presenter`] that draws nothing.
///
/// Handles are still unique so callers that track them behave the same as
/// with a real front end.
#[derive(Debug, Default)]
pub struct NullPresenter {
    next_handle: AtomicU64,
}

impl NullPresenter {
    fn next(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl Presenter for NullPresenter {
    fn create_chart(&self, _mount: ChartMount, _spec: &ChartSpec) -> ChartHandle {
        ChartHandle(self.next())
    }
    fn destroy_chart(&self, _handle: ChartHandle) {}
    fn create_map(&self, _center: GeoPoint, _zoom: u8) -> MapHandle {
        MapHandle(self.next())
    }
    fn place_marker(&self, _map: MapHandle, _marker: &MarkerSpec) {}
    fn fit_bounds(&self, _map: MapHandle, _bounds: &BoundingBox) {}
    fn destroy_map(&self, _handle: MapHandle) {}
    fn render_stats(&self, _stats: &StatsCards) {}
    fn render_sources(&self, _sources: &SourcesList) {}
    fn render_forecast_table(&self, _rows: &[ForecastRow]) {}
    fn render_comparison_table(&self, _rows: &[ComparisonRow]) {}
    fn render_news(&self, _entries: &[NewsEntry]) {}
    fn show_placeholder(&self, _view: View, _text: &str) {}
    fn set_loading(&self, _view: View, _loading: bool) {}
    fn set_overlay(&self, _active: bool) {}
    fn alert(&self, _message: &str) {}
    fn apply_theme(&self, _dark: bool) {}
}
