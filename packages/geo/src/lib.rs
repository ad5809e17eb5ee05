#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Exact-coordinate clustering of geocoded case reports.
//!
//! The backend geocodes reports to a fixed table of settlement centroids, so
//! many reports share literally the same `(lat, lng)`. [`ClusterSet::aggregate`]
//! folds those into one [`LocationCluster`] per coordinate pair, summing case
//! counts and keeping every contributing source and date in input order.
//!
//! Coordinates are compared bit-for-bit. Two points that differ in the last
//! digit are two clusters; there is no proximity merging.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use tick_monitor_dashboard_models::CaseRecord;
use tick_monitor_risk_models::{RiskClass, classify_map_cases};

/// Number of dates listed in a cluster popup.
pub const POPUP_DATE_COUNT: usize = 3;

/// Exact identity of a coordinate pair.
///
/// Equality, ordering and hashing use the IEEE-754 bit patterns, with `-0.0`
/// folded into `0.0` so that the two zeros are the same point.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateKey {
    lat: f64,
    lng: f64,
}

impl CoordinateKey {
    /// Creates a key from a latitude/longitude pair.
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        // Adding +0.0 turns -0.0 into +0.0 and leaves everything else alone.
        Self {
            lat: lat + 0.0,
            lng: lng + 0.0,
        }
    }

    /// Latitude.
    #[must_use]
    pub const fn lat(self) -> f64 {
        self.lat
    }

    /// Longitude.
    #[must_use]
    pub const fn lng(self) -> f64 {
        self.lng
    }

    const fn bits(self) -> (u64, u64) {
        (self.lat.to_bits(), self.lng.to_bits())
    }
}

impl PartialEq for CoordinateKey {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for CoordinateKey {}

impl Hash for CoordinateKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

impl PartialOrd for CoordinateKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CoordinateKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.lat
            .total_cmp(&other.lat)
            .then_with(|| self.lng.total_cmp(&other.lng))
    }
}

impl std::fmt::Display for CoordinateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// All reports sharing one exact coordinate pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationCluster {
    /// Coordinate identity of the cluster.
    pub key: CoordinateKey,
    /// Location name of the first report seen at this point.
    pub location: String,
    /// Sum of the case counts of every report at this point.
    pub cases: u64,
    /// Source of each report, in input order, duplicates kept.
    pub sources: Vec<String>,
    /// Date of each report, in input order, duplicates kept.
    pub dates: Vec<String>,
}

impl LocationCluster {
    fn new(key: CoordinateKey, location: &str) -> Self {
        Self {
            key,
            location: location.to_string(),
            cases: 0,
            sources: Vec::new(),
            dates: Vec::new(),
        }
    }

    fn absorb(&mut self, record: &CaseRecord) {
        self.cases = self.cases.saturating_add(record.cases);
        self.sources.push(record.source.clone());
        self.dates.push(record.date.clone());
    }

    /// Map-context risk classification of the cumulative case count.
    #[must_use]
    pub const fn risk_class(&self) -> RiskClass {
        classify_map_cases(self.cases)
    }

    /// Builds the popup summary shown for this cluster's marker.
    ///
    /// Source deduplication happens here and only here; the cluster itself
    /// keeps every source as reported.
    #[must_use]
    pub fn popup(&self) -> ClusterPopup {
        let distinct_sources = self
            .sources
            .iter()
            .filter(|s| !s.is_empty())
            .collect::<BTreeSet<_>>()
            .len();

        ClusterPopup {
            location: self.location.clone(),
            cases: self.cases,
            distinct_sources,
            first_dates: self.dates.iter().take(POPUP_DATE_COUNT).cloned().collect(),
        }
    }
}

/// Render-time summary of a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterPopup {
    /// Location name.
    pub location: String,
    /// Cumulative cases.
    pub cases: u64,
    /// Number of distinct non-empty sources.
    pub distinct_sources: usize,
    /// The first [`POPUP_DATE_COUNT`] dates in input order.
    pub first_dates: Vec<String>,
}

/// A geographic bounding box in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a degenerate box around a single point.
    #[must_use]
    pub const fn around(lat: f64, lng: f64) -> Self {
        Self {
            west: lng,
            south: lat,
            east: lng,
            north: lat,
        }
    }

    /// Grows the box to include the given point.
    pub fn extend(&mut self, lat: f64, lng: f64) {
        self.west = self.west.min(lng);
        self.east = self.east.max(lng);
        self.south = self.south.min(lat);
        self.north = self.north.max(lat);
    }
}

/// The clusters of one map snapshot.
///
/// A set is always built from scratch by [`ClusterSet::aggregate`]; there is
/// no way to add records to an existing set, so a reload can never leave
/// clusters from a previous snapshot behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterSet {
    clusters: BTreeMap<CoordinateKey, LocationCluster>,
}

impl ClusterSet {
    /// Groups records by exact coordinate pair in a single pass.
    ///
    /// Records without both coordinates are skipped.
    #[must_use]
    pub fn aggregate<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a CaseRecord>,
    {
        let mut clusters: BTreeMap<CoordinateKey, LocationCluster> = BTreeMap::new();
        let mut skipped = 0_usize;

        for record in records {
            let Some((lat, lng)) = record.coordinates() else {
                skipped += 1;
                continue;
            };
            let key = CoordinateKey::new(lat, lng);
            clusters
                .entry(key)
                .or_insert_with(|| LocationCluster::new(key, &record.location))
                .absorb(record);
        }

        if skipped > 0 {
            log::debug!("Skipped {skipped} map record(s) without coordinates");
        }
        log::debug!("Aggregated map records into {} cluster(s)", clusters.len());

        Self { clusters }
    }

    /// Number of clusters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Whether the snapshot produced no clusters at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Looks up the cluster at an exact coordinate pair.
    #[must_use]
    pub fn get(&self, lat: f64, lng: f64) -> Option<&LocationCluster> {
        self.clusters.get(&CoordinateKey::new(lat, lng))
    }

    /// Iterates clusters in coordinate order.
    pub fn iter(&self) -> impl Iterator<Item = &LocationCluster> {
        self.clusters.values()
    }

    /// Smallest box containing every cluster, `None` for an empty set.
    #[must_use]
    pub fn bounds(&self) -> Option<BoundingBox> {
        let mut keys = self.clusters.keys();
        let first = keys.next()?;
        let mut bbox = BoundingBox::around(first.lat(), first.lng());
        for key in keys {
            bbox.extend(key.lat(), key.lng());
        }
        Some(bbox)
    }
}

impl<'a> IntoIterator for &'a ClusterSet {
    type Item = &'a LocationCluster;
    type IntoIter = std::collections::btree_map::Values<'a, CoordinateKey, LocationCluster>;

    fn into_iter(self) -> Self::IntoIter {
        self.clusters.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tick_monitor_risk_models::RiskBand;

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

    fn total_cases(set: &ClusterSet) -> u64 {
        set.iter().map(|c| c.cases).sum()
    }

    #[test]
    fn same_coordinates_merge_into_one_cluster() {
        let records = vec![
            record(57.0, 65.0, 10, "A", "2024-05-01"),
            record(57.0, 65.0, 40, "B", "2024-05-03"),
        ];
        let set = ClusterSet::aggregate(&records);

        assert_eq!(set.len(), 1);
        let cluster = set.get(57.0, 65.0).unwrap();
        assert_eq!(cluster.cases, 50);
        assert_eq!(cluster.sources, vec!["A", "B"]);
        assert_eq!(cluster.dates, vec!["2024-05-01", "2024-05-03"]);
        assert_eq!(cluster.risk_class(), RiskClass::Band(RiskBand::Moderate));
        assert_eq!(cluster.risk_class().color(), "#ffd600");
    }

    #[test]
    fn last_digit_difference_is_a_separate_cluster() {
        let records = vec![
            record(57.1522, 65.5272, 5, "A", "01.05.2024"),
            record(57.1522, 65.5273, 5, "A", "01.05.2024"),
            record(57.1523, 65.5272, 5, "A", "01.05.2024"),
        ];
        let set = ClusterSet::aggregate(&records);
        assert_eq!(set.len(), 3);
        assert!(set.iter().all(|c| c.cases == 5));
    }

    #[test]
    fn aggregation_is_order_independent() {
        let records = vec![
            record(57.0, 65.0, 10, "A", "d1"),
            record(58.1981, 68.2597, 7, "B", "d2"),
            record(57.0, 65.0, 40, "C", "d3"),
            record(56.1125, 69.4903, 1, "A", "d4"),
        ];
        let mut reversed = records.clone();
        reversed.reverse();

        let forward = ClusterSet::aggregate(&records);
        let backward = ClusterSet::aggregate(&reversed);

        let summary = |set: &ClusterSet| -> Vec<(String, u64)> {
            set.iter().map(|c| (c.key.to_string(), c.cases)).collect()
        };
        assert_eq!(summary(&forward), summary(&backward));
        assert_eq!(total_cases(&forward), 58);

        // Per-cluster provenance follows input order.
        assert_eq!(forward.get(57.0, 65.0).unwrap().sources, vec!["A", "C"]);
        assert_eq!(backward.get(57.0, 65.0).unwrap().sources, vec!["C", "A"]);
    }

    #[test]
    fn records_without_coordinates_are_skipped() {
        let mut missing = record(0.0, 0.0, 99, "X", "d");
        missing.lat = None;
        let records = vec![missing, record(57.0, 65.0, 1, "A", "d")];
        let set = ClusterSet::aggregate(&records);
        assert_eq!(set.len(), 1);
        assert_eq!(total_cases(&set), 1);
    }

    #[test]
    fn empty_input_yields_empty_set_without_bounds() {
        let set = ClusterSet::aggregate(std::iter::empty::<&CaseRecord>());
        assert!(set.is_empty());
        assert_eq!(set.bounds(), None);
    }

    #[test]
    fn negative_zero_is_the_same_point() {
        let records = vec![record(0.0, 65.0, 1, "A", "d"), record(-0.0, 65.0, 2, "B", "d")];
        assert_eq!(ClusterSet::aggregate(&records).len(), 1);
    }

    #[test]
    fn popup_dedups_sources_but_cluster_keeps_them() {
        let records = vec![
            record(57.0, 65.0, 1, "A", "01.05"),
            record(57.0, 65.0, 1, "A", "01.05"),
            record(57.0, 65.0, 1, "B", "02.05"),
            record(57.0, 65.0, 1, "A", "03.05"),
        ];
        let set = ClusterSet::aggregate(&records);
        let cluster = set.get(57.0, 65.0).unwrap();
        let popup = cluster.popup();

        assert_eq!(cluster.sources.len(), 4);
        assert_eq!(popup.distinct_sources, 2);
        assert_eq!(popup.first_dates, vec!["01.05", "01.05", "02.05"]);
        assert_eq!(popup.cases, 4);
    }

    #[test]
    fn bounds_cover_every_cluster() {
        let records = vec![
            record(57.1522, 65.5272, 1, "A", "d"),
            record(55.5278, 70.3389, 1, "A", "d"),
            record(58.1981, 68.2597, 1, "A", "d"),
        ];
        let bbox = ClusterSet::aggregate(&records).bounds().unwrap();
        assert!((bbox.south - 55.5278).abs() < f64::EPSILON);
        assert!((bbox.north - 58.1981).abs() < f64::EPSILON);
        assert!((bbox.west - 65.5272).abs() < f64::EPSILON);
        assert!((bbox.east - 70.3389).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_case_cluster_is_no_data() {
        let set = ClusterSet::aggregate(&[record(57.0, 65.0, 0, "A", "d")]);
        assert_eq!(set.get(57.0, 65.0).unwrap().risk_class(), RiskClass::NoData);
    }
}
