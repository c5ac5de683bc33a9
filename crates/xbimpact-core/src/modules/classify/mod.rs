//! Distance classification: nearest distance from a reference geometry to a
//! frontier, mapped through an ordered threshold table onto a [`RiskLevel`].

use super::frontier::Frontier;
use crate::common::constants::{
    CORRIDOR_HIGH_UPPER_M, CORRIDOR_MEDIUM_UPPER_M, SCARP_HIGH_UPPER_M, SCARP_MEDIUM_UPPER_M,
};
use crate::domain::{ImpactError, ImpactResult, RiskLevel};
use crate::numerics::{Point2, distance2, point_segment_distance, segment_segment_distance};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdBand {
    /// Inclusive upper bound in metres.
    pub up_to: f64,
    pub level: RiskLevel,
}

/// Ordered bands covering `[0, +inf)`: each band owns `(previous up_to, up_to]`
/// and `otherwise` owns everything above the last band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdTable {
    pub bands: Vec<ThresholdBand>,
    pub otherwise: RiskLevel,
}

impl ThresholdTable {
    pub fn scarp_distance() -> Self {
        Self {
            bands: vec![
                ThresholdBand {
                    up_to: SCARP_HIGH_UPPER_M,
                    level: RiskLevel::High,
                },
                ThresholdBand {
                    up_to: SCARP_MEDIUM_UPPER_M,
                    level: RiskLevel::Medium,
                },
            ],
            otherwise: RiskLevel::Low,
        }
    }

    pub fn corridor_width() -> Self {
        Self {
            bands: vec![
                ThresholdBand {
                    up_to: CORRIDOR_HIGH_UPPER_M,
                    level: RiskLevel::High,
                },
                ThresholdBand {
                    up_to: CORRIDOR_MEDIUM_UPPER_M,
                    level: RiskLevel::Medium,
                },
            ],
            otherwise: RiskLevel::Low,
        }
    }

    pub fn validate(&self, table_name: &str) -> ImpactResult<()> {
        if self.bands.is_empty() {
            return Err(ImpactError::configuration(
                "CONFIG.THRESHOLD_TABLE",
                format!("threshold table '{}' has no bands", table_name),
            ));
        }

        let mut previous = 0.0_f64;
        for (index, band) in self.bands.iter().enumerate() {
            if !band.up_to.is_finite() || band.up_to < 0.0 {
                return Err(ImpactError::configuration(
                    "CONFIG.THRESHOLD_TABLE",
                    format!(
                        "threshold table '{}' band {} has invalid upper bound {}",
                        table_name, index, band.up_to
                    ),
                ));
            }
            if index > 0 && band.up_to <= previous {
                return Err(ImpactError::configuration(
                    "CONFIG.THRESHOLD_TABLE",
                    format!(
                        "threshold table '{}' is not strictly ascending at band {} ({} <= {})",
                        table_name, index, band.up_to, previous
                    ),
                ));
            }
            previous = band.up_to;
        }

        Ok(())
    }

    pub fn levels(&self) -> impl Iterator<Item = RiskLevel> + '_ {
        self.bands
            .iter()
            .map(|band| band.level)
            .chain(std::iter::once(self.otherwise))
    }

    pub fn highest_level(&self) -> RiskLevel {
        self.levels().max().unwrap_or(RiskLevel::High)
    }
}

/// Maps a distance onto the table. Bucket upper bounds are closed.
///
/// A zero or NaN distance means the reference geometry touches the frontier;
/// it resolves to the table's highest level instead of propagating NaN.
pub fn classify(distance: f64, table: &ThresholdTable) -> RiskLevel {
    if distance.is_nan() || distance == 0.0 {
        return table.highest_level();
    }

    table
        .bands
        .iter()
        .find(|band| distance <= band.up_to)
        .map_or(table.otherwise, |band| band.level)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReferenceGeometry {
    Point(Point2),
    Segment(Point2, Point2),
}

impl ReferenceGeometry {
    pub fn distance_to_point(&self, target: Point2) -> f64 {
        match self {
            Self::Point(point) => distance2(*point, target),
            Self::Segment(start, end) => point_segment_distance(target, *start, *end),
        }
    }

    pub fn distance_to_segment(&self, start: Point2, end: Point2) -> f64 {
        match self {
            Self::Point(point) => point_segment_distance(*point, start, end),
            Self::Segment(a0, a1) => segment_segment_distance(*a0, *a1, start, end),
        }
    }
}

/// A fixed point of interest with its assigned mesh row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferencePoint {
    pub id: String,
    pub alongshore: f64,
    pub geometry: ReferenceGeometry,
    pub row: usize,
}

/// Minimum distance to any frontier point; `+inf` for an empty frontier.
pub fn nearest_distance(reference: &ReferenceGeometry, frontier: &Frontier) -> f64 {
    frontier
        .points()
        .iter()
        .map(|entry| reference.distance_to_point(entry.point))
        .fold(f64::INFINITY, f64::min)
}

/// Minimum distance to the frontier rendered as a polyline (rows ascending).
pub fn nearest_distance_to_polyline(reference: &ReferenceGeometry, frontier: &Frontier) -> f64 {
    let points = frontier.points();
    match points.len() {
        0 => f64::INFINITY,
        1 => reference.distance_to_point(points[0].point),
        _ => points
            .windows(2)
            .map(|pair| reference.distance_to_segment(pair[0].point, pair[1].point))
            .fold(f64::INFINITY, f64::min),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RowPairing {
    /// Measure against the whole frontier.
    #[default]
    AnyRow,
    /// Only measure when the reference point's own row has a frontier point.
    SameRow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FrontierGeometry {
    #[default]
    Points,
    Polyline,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub distance: f64,
    pub level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistanceClassifier {
    table: ThresholdTable,
    pairing: RowPairing,
    geometry: FrontierGeometry,
}

impl DistanceClassifier {
    pub fn new(table: ThresholdTable, pairing: RowPairing, geometry: FrontierGeometry) -> Self {
        Self {
            table,
            pairing,
            geometry,
        }
    }

    pub fn table(&self) -> &ThresholdTable {
        &self.table
    }

    pub fn nearest_distance(&self, reference: &ReferencePoint, frontier: &Frontier) -> f64 {
        if self.pairing == RowPairing::SameRow && frontier.point_for_row(reference.row).is_none() {
            return f64::INFINITY;
        }

        match self.geometry {
            FrontierGeometry::Points => nearest_distance(&reference.geometry, frontier),
            FrontierGeometry::Polyline => {
                nearest_distance_to_polyline(&reference.geometry, frontier)
            }
        }
    }

    pub fn measure(&self, reference: &ReferencePoint, frontier: &Frontier) -> Measurement {
        let distance = self.nearest_distance(reference, frontier);
        Measurement {
            distance,
            level: classify(distance, &self.table),
        }
    }
}
