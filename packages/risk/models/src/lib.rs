#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Risk band taxonomy and classification tables.
//!
//! Every view of the dashboard (weekly stats, source lists, map markers,
//! forecast tables) speaks in terms of the same four ordered [`RiskBand`]s.
//! The views disagree on numeric scale, so each one classifies through its
//! own table:
//!
//! * reported labels go through [`RiskBand::from_label`],
//! * cumulative map cluster counts go through [`classify_map_cases`],
//! * monthly forecast totals go through [`classify_forecast_cases`].
//!
//! Display colors and labels live here and nowhere else.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumString};

/// Display color for the "no data" class (neutral gray).
pub const NO_DATA_COLOR: &str = "#9e9e9e";

/// Display label for the "no data" class.
pub const NO_DATA_LABEL: &str = "Нет данных";

/// Canonical risk severity, ordered from [`RiskBand::Low`] to
/// [`RiskBand::VeryHigh`].
///
/// Deserialization is total: any value that is not one of the canonical
/// Russian labels (`null`, a missing field, a number) becomes
/// [`RiskBand::Low`].
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
#[serde(from = "Option<Value>")]
pub enum RiskBand {
    /// Few or no reported cases.
    #[default]
    #[serde(rename = "Низкий")]
    #[strum(to_string = "Низкий", serialize = "Нет данных")]
    Low,
    /// Noticeable activity.
    #[serde(rename = "Умеренный")]
    #[strum(to_string = "Умеренный")]
    Moderate,
    /// High activity.
    #[serde(rename = "Высокий")]
    #[strum(to_string = "Высокий")]
    High,
    /// Peak activity.
    #[serde(rename = "Очень высокий")]
    #[strum(to_string = "Очень высокий")]
    VeryHigh,
}

impl RiskBand {
    /// Resolves a reported risk label to a band.
    ///
    /// `"Нет данных"`, unknown labels and empty input all resolve to
    /// [`RiskBand::Low`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        label.trim().parse().unwrap_or_default()
    }

    /// Canonical display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Низкий",
            Self::Moderate => "Умеренный",
            Self::High => "Высокий",
            Self::VeryHigh => "Очень высокий",
        }
    }

    /// Display color as a CSS hex string.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Low => "#00c853",
            Self::Moderate => "#ffd600",
            Self::High => "#ff6f00",
            Self::VeryHigh => "#d32f2f",
        }
    }

    /// Returns all variants in ascending severity order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Low, Self::Moderate, Self::High, Self::VeryHigh]
    }
}

impl From<Option<Value>> for RiskBand {
    fn from(value: Option<Value>) -> Self {
        match value {
            Some(Value::String(label)) => Self::from_label(&label),
            _ => Self::Low,
        }
    }
}

/// Classification of a magnitude that may carry no data at all.
///
/// Only the map table produces [`RiskClass::NoData`]; a zero count there is
/// a distinct gray class rather than [`RiskBand::Low`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskClass {
    /// Nothing reported.
    NoData,
    /// A regular risk band.
    Band(RiskBand),
}

impl RiskClass {
    /// Display color as a CSS hex string.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::NoData => NO_DATA_COLOR,
            Self::Band(band) => band.color(),
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NoData => NO_DATA_LABEL,
            Self::Band(band) => band.label(),
        }
    }
}

/// Lower bounds of the upper three bands of a magnitude table.
///
/// Each bound is inclusive for the band it opens: a value equal to
/// `moderate` is [`RiskBand::Moderate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// First value classified as [`RiskBand::Moderate`].
    pub moderate: i64,
    /// First value classified as [`RiskBand::High`].
    pub high: i64,
    /// First value classified as [`RiskBand::VeryHigh`].
    pub very_high: i64,
}

impl Thresholds {
    /// Classifies `value` against this table. Anything below `moderate`
    /// (negative values included) is [`RiskBand::Low`].
    #[must_use]
    pub const fn classify(&self, value: i64) -> RiskBand {
        if value < self.moderate {
            RiskBand::Low
        } else if value < self.high {
            RiskBand::Moderate
        } else if value < self.very_high {
            RiskBand::High
        } else {
            RiskBand::VeryHigh
        }
    }
}

/// Map marker table, applied to cumulative cluster case counts.
pub const MAP_THRESHOLDS: Thresholds = Thresholds {
    moderate: 50,
    high: 100,
    very_high: 150,
};

/// Forecast table, applied to predicted monthly totals.
pub const FORECAST_THRESHOLDS: Thresholds = Thresholds {
    moderate: 200,
    high: 400,
    very_high: 600,
};

/// Classifies a cumulative map cluster count.
///
/// `0` is [`RiskClass::NoData`]; every positive count lands in a band of
/// [`MAP_THRESHOLDS`].
#[must_use]
pub const fn classify_map_cases(cases: u64) -> RiskClass {
    if cases == 0 {
        return RiskClass::NoData;
    }
    #[allow(clippy::cast_possible_wrap)]
    let value = if cases > i64::MAX as u64 {
        i64::MAX
    } else {
        cases as i64
    };
    RiskClass::Band(MAP_THRESHOLDS.classify(value))
}

/// Classifies a forecast monthly total against [`FORECAST_THRESHOLDS`].
#[must_use]
pub const fn classify_forecast_cases(total_cases: i64) -> RiskBand {
    FORECAST_THRESHOLDS.classify(total_cases)
}
