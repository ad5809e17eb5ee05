//! The single dashboard state instance.

use std::collections::BTreeMap;

use tick_monitor_dashboard_models::{FilterState, MapPeriod, View};

use crate::config::GeoPoint;
use crate::presenter::{ChartHandle, ChartMount, MapHandle, Presenter};
use crate::transform::ChartSpec;

/// Fetch state of one view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewStatus {
    /// No request outstanding.
    #[default]
    Idle,
    /// A request was issued and has not settled yet.
    Loading,
}

/// Filters, theme, per-view status and the live chart/map handles.
///
/// Handles are replaced only through [`ViewState::replace_chart`] and
/// [`ViewState::replace_map`], which destroy the previous object before
/// creating the new one, so each mount holds at most one live object.
#[derive(Debug)]
pub struct ViewState {
    filter: FilterState,
    default_filter: FilterState,
    map_period: MapPeriod,
    dark_theme: bool,
    overlay: bool,
    status: BTreeMap<View, ViewStatus>,
    charts: BTreeMap<ChartMount, ChartHandle>,
    map: Option<MapHandle>,
}

impl ViewState {
    /// Creates the state with `filter` as both the current and the reset
    /// filter.
    #[must_use]
    pub fn new(filter: FilterState, dark_theme: bool) -> Self {
        Self {
            default_filter: filter.clone(),
            filter,
            map_period: MapPeriod::default(),
            dark_theme,
            overlay: false,
            status: BTreeMap::new(),
            charts: BTreeMap::new(),
            map: None,
        }
    }

    /// Active filter.
    #[must_use]
    pub const fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// Replaces the active filter.
    pub fn set_filter(&mut self, filter: FilterState) {
        self.filter = filter;
    }

    /// Restores the startup filter.
    pub fn reset_filter(&mut self) {
        self.filter = self.default_filter.clone();
    }

    /// Selected map time window.
    #[must_use]
    pub const fn map_period(&self) -> MapPeriod {
        self.map_period
    }

    /// Selects the map time window.
    pub const fn set_map_period(&mut self, period: MapPeriod) {
        self.map_period = period;
    }

    /// Whether the dark theme is on.
    #[must_use]
    pub const fn dark_theme(&self) -> bool {
        self.dark_theme
    }

    /// Sets the dark-theme flag.
    pub const fn set_dark_theme(&mut self, dark: bool) {
        self.dark_theme = dark;
    }

    /// Whether the blocking update overlay is shown.
    #[must_use]
    pub const fn overlay(&self) -> bool {
        self.overlay
    }

    /// Records the overlay state.
    pub const fn set_overlay(&mut self, active: bool) {
        self.overlay = active;
    }

    /// Load status of `view`; views never loaded are idle.
    #[must_use]
    pub fn status(&self, view: View) -> ViewStatus {
        self.status.get(&view).copied().unwrap_or_default()
    }

    /// `Idle -> Loading`.
    pub fn begin_loading(&mut self, view: View) {
        self.status.insert(view, ViewStatus::Loading);
    }

    /// `Loading -> Idle`.
    pub fn finish_loading(&mut self, view: View) {
        self.status.insert(view, ViewStatus::Idle);
    }

    /// Live chart on `mount`.
    #[must_use]
    pub fn chart(&self, mount: ChartMount) -> Option<ChartHandle> {
        self.charts.get(&mount).copied()
    }

    /// Live map.
    #[must_use]
    pub const fn map(&self) -> Option<MapHandle> {
        self.map
    }

    /// Number of charts currently alive across all mounts.
    #[must_use]
    pub fn live_chart_count(&self) -> usize {
        self.charts.len()
    }

    /// Destroys the chart on `mount`, if any, then creates a new one.
    pub fn replace_chart<P: Presenter + ?Sized>(
        &mut self,
        presenter: &P,
        mount: ChartMount,
        spec: &ChartSpec,
    ) -> ChartHandle {
        self.clear_chart(presenter, mount);
        let handle = presenter.create_chart(mount, spec);
        log::debug!("Created chart {handle:?} on {mount:?}");
        self.charts.insert(mount, handle);
        handle
    }

    /// Destroys the chart on `mount`, if any.
    pub fn clear_chart<P: Presenter + ?Sized>(&mut self, presenter: &P, mount: ChartMount) {
        if let Some(old) = self.charts.remove(&mount) {
            log::debug!("Destroying chart {old:?} on {mount:?}");
            presenter.destroy_chart(old);
        }
    }

    /// Destroys the current map, if any, then creates a new one.
    pub fn replace_map<P: Presenter + ?Sized>(
        &mut self,
        presenter: &P,
        center: GeoPoint,
        zoom: u8,
    ) -> MapHandle {
        self.clear_map(presenter);
        let handle = presenter.create_map(center, zoom);
        log::debug!("Created map {handle:?}");
        self.map = Some(handle);
        handle
    }

    /// Destroys the current map, if any.
    pub fn clear_map<P: Presenter + ?Sized>(&mut self, presenter: &P) {
        if let Some(old) = self.map.take() {
            log::debug!("Destroying map {old:?}");
            presenter.destroy_map(old);
        }
    }

    /// Destroys whatever chart or map `view` owns.
    pub fn clear_view<P: Presenter + ?Sized>(&mut self, presenter: &P, view: View) {
        if view == View::Map {
            self.clear_map(presenter);
        } else if let Some(mount) = ChartMount::of_view(view) {
            self.clear_chart(presenter, mount);
        }
    }
}
