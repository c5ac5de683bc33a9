use crate::common::config::RunConfig;
use crate::domain::{ImpactError, ImpactResult, IndicatorKind, RiskLevel};
use crate::modules::classify::{
    DistanceClassifier, ReferenceGeometry, ReferencePoint, RowPairing,
};
use crate::modules::frontier::{Frontier, FrontierSweep, SkippedStep};
use crate::modules::series::MeshTimeSeries;
use crate::numerics::deterministic_argsort;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::info;

/// A reference point as supplied, before it is matched to a mesh row.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceInput {
    pub id: String,
    pub alongshore: f64,
    pub geometry: ReferenceGeometry,
}

/// Sorts references by alongshore ordinate and gives each the row of its rank.
/// The reference set must hold exactly one point per mesh row.
pub fn assign_reference_rows(
    inputs: Vec<ReferenceInput>,
    mesh_rows: usize,
) -> ImpactResult<Vec<ReferencePoint>> {
    if inputs.len() != mesh_rows {
        return Err(ImpactError::configuration(
            "CONFIG.REFERENCE_ROWS",
            format!(
                "{} reference points supplied for a mesh with {} rows; \
                 the reference set does not belong to this mesh",
                inputs.len(),
                mesh_rows
            ),
        ));
    }

    let mut seen = BTreeSet::new();
    for input in &inputs {
        if !input.alongshore.is_finite() {
            return Err(ImpactError::configuration(
                "CONFIG.REFERENCE_ALONGSHORE",
                format!(
                    "reference point '{}' has a non-finite alongshore ordinate",
                    input.id
                ),
            ));
        }
        if !seen.insert(input.id.as_str()) {
            return Err(ImpactError::configuration(
                "CONFIG.REFERENCE_ID",
                format!("reference point id '{}' appears more than once", input.id),
            ));
        }
    }

    let ordinates: Vec<f64> = inputs.iter().map(|input| input.alongshore).collect();
    let order = deterministic_argsort(&ordinates);
    Ok(order
        .into_iter()
        .enumerate()
        .map(|(row, position)| {
            let input = &inputs[position];
            ReferencePoint {
                id: input.id.clone(),
                alongshore: input.alongshore,
                geometry: input.geometry,
                row,
            }
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorRecord {
    pub reference_id: String,
    pub row: usize,
    pub indicator: IndicatorKind,
    /// `None` for the overall record.
    pub time: Option<f64>,
    /// `+inf` (written as `null`) when there was no frontier to measure to.
    pub distance: f64,
    pub level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepIndicators {
    pub step_index: usize,
    pub time: f64,
    pub water_line: Frontier,
    pub erosion_scarp: Option<Frontier>,
    pub records: Vec<IndicatorRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverallIndicators {
    pub water_line: Frontier,
    pub erosion_scarp: Frontier,
    pub records: Vec<IndicatorRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRun {
    pub reference_points: Vec<ReferencePoint>,
    pub steps: Vec<StepIndicators>,
    pub overall: OverallIndicators,
    pub skipped_steps: Vec<SkippedStep>,
}

impl IndicatorRun {
    pub fn overall_records(
        &self,
        indicator: IndicatorKind,
    ) -> impl Iterator<Item = &IndicatorRecord> {
        self.overall
            .records
            .iter()
            .filter(move |record| record.indicator == indicator)
    }

    /// Worst level over every per-step and overall record of `indicator`.
    pub fn highest_level(&self, indicator: IndicatorKind) -> Option<RiskLevel> {
        self.steps
            .iter()
            .flat_map(|step| step.records.iter())
            .chain(self.overall.records.iter())
            .filter(|record| record.indicator == indicator)
            .map(|record| record.level)
            .max()
    }

    /// Overall records whose reference row had no frontier at all.
    pub fn rows_without_frontier(&self, indicator: IndicatorKind) -> usize {
        let frontier = match indicator {
            IndicatorKind::ScarpDistance => &self.overall.erosion_scarp,
            IndicatorKind::CorridorWidth => &self.overall.water_line,
        };
        self.reference_points
            .iter()
            .filter(|reference| frontier.point_for_row(reference.row).is_none())
            .count()
    }
}

/// Traces both frontiers over a run and classifies every reference point
/// against them, step by step and once more against the run envelopes.
#[derive(Debug, Clone)]
pub struct IndicatorPipeline {
    config: RunConfig,
    scarp: DistanceClassifier,
    corridor: DistanceClassifier,
}

impl IndicatorPipeline {
    pub fn new(config: RunConfig) -> Self {
        let scarp = DistanceClassifier::new(
            config.scarp_distance_table.clone(),
            config.scarp_row_pairing,
            config.frontier_geometry,
        );
        let corridor = DistanceClassifier::new(
            config.corridor_width_table.clone(),
            config.corridor_row_pairing,
            config.frontier_geometry,
        );
        Self {
            config,
            scarp,
            corridor,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn run<S>(&self, series: &S, references: Vec<ReferenceInput>) -> ImpactResult<IndicatorRun>
    where
        S: MeshTimeSeries + ?Sized,
    {
        let reference_points = assign_reference_rows(references, series.geometry().rows())?;
        let sweep = FrontierSweep::prepare(series, &self.config)?;

        info!(
            references = reference_points.len(),
            scarp_pairing = pairing_name(self.config.scarp_row_pairing),
            corridor_pairing = pairing_name(self.config.corridor_row_pairing),
            "computing storm impact indicators"
        );

        let mut steps = Vec::new();
        let outcome = sweep.run(|frontiers, _| {
            let records = self.classify_all(
                &reference_points,
                Some(frontiers.time),
                &frontiers.water_line,
                frontiers.erosion_scarp.as_ref(),
            );
            steps.push(StepIndicators {
                step_index: frontiers.step_index,
                time: frontiers.time,
                water_line: frontiers.water_line.clone(),
                erosion_scarp: frontiers.erosion_scarp.clone(),
                records,
            });
            Ok(())
        })?;

        let records = self.classify_all(
            &reference_points,
            None,
            &outcome.water_line,
            Some(&outcome.erosion_scarp),
        );

        let run = IndicatorRun {
            reference_points,
            steps,
            overall: OverallIndicators {
                water_line: outcome.water_line,
                erosion_scarp: outcome.erosion_scarp,
                records,
            },
            skipped_steps: outcome.skipped_steps,
        };

        info!(
            steps = run.steps.len(),
            skipped = run.skipped_steps.len(),
            scarp_rows_without_frontier = run.rows_without_frontier(IndicatorKind::ScarpDistance),
            corridor_rows_without_frontier =
                run.rows_without_frontier(IndicatorKind::CorridorWidth),
            "indicators finished"
        );
        Ok(run)
    }

    fn classify_all(
        &self,
        reference_points: &[ReferencePoint],
        time: Option<f64>,
        water_line: &Frontier,
        erosion_scarp: Option<&Frontier>,
    ) -> Vec<IndicatorRecord> {
        let mut records = Vec::with_capacity(reference_points.len() * 2);
        for reference in reference_points {
            records.push(self.record(IndicatorKind::CorridorWidth, reference, time, water_line));
            if let Some(scarp) = erosion_scarp {
                records.push(self.record(IndicatorKind::ScarpDistance, reference, time, scarp));
            }
        }
        records
    }

    fn record(
        &self,
        indicator: IndicatorKind,
        reference: &ReferencePoint,
        time: Option<f64>,
        frontier: &Frontier,
    ) -> IndicatorRecord {
        let classifier = match indicator {
            IndicatorKind::ScarpDistance => &self.scarp,
            IndicatorKind::CorridorWidth => &self.corridor,
        };
        let measurement = classifier.measure(reference, frontier);
        IndicatorRecord {
            reference_id: reference.id.clone(),
            row: reference.row,
            indicator,
            time,
            distance: measurement.distance,
            level: measurement.level,
        }
    }
}

fn pairing_name(pairing: RowPairing) -> &'static str {
    match pairing {
        RowPairing::AnyRow => "any_row",
        RowPairing::SameRow => "same_row",
    }
}

#[cfg(test)]
mod tests {
    use super::{ReferenceInput, assign_reference_rows};
    use crate::domain::ImpactErrorCategory;
    use crate::modules::classify::ReferenceGeometry;

    fn input(id: &str, alongshore: f64) -> ReferenceInput {
        ReferenceInput {
            id: id.to_string(),
            alongshore,
            geometry: ReferenceGeometry::Point([0.0, alongshore]),
        }
    }

    #[test]
    fn rows_follow_numeric_alongshore_order_not_names() {
        let assigned = assign_reference_rows(
            vec![input("P10", 20.0), input("P2", 5.0), input("P1", 12.5)],
            3,
        )
        .expect("rows should assign");

        let ids: Vec<&str> = assigned.iter().map(|point| point.id.as_str()).collect();
        assert_eq!(ids, vec!["P2", "P1", "P10"]);
        let rows: Vec<usize> = assigned.iter().map(|point| point.row).collect();
        assert_eq!(rows, vec![0, 1, 2]);
    }

    #[test]
    fn equal_ordinates_keep_input_order() {
        let assigned = assign_reference_rows(vec![input("B", 1.0), input("A", 1.0)], 2)
            .expect("rows should assign");
        assert_eq!(assigned[0].id, "B");
        assert_eq!(assigned[1].id, "A");
    }

    #[test]
    fn reference_count_must_match_mesh_rows() {
        let error = assign_reference_rows(
            vec![input("A", 0.0), input("B", 1.0), input("C", 2.0), input("D", 3.0)],
            5,
        )
        .expect_err("count mismatch should fail");
        assert_eq!(error.category(), ImpactErrorCategory::ConfigurationError);
        assert_eq!(error.placeholder(), "CONFIG.REFERENCE_ROWS");
    }

    #[test]
    fn duplicate_ids_and_missing_ordinates_are_rejected() {
        let duplicate = assign_reference_rows(vec![input("A", 0.0), input("A", 1.0)], 2)
            .expect_err("duplicate ids should fail");
        assert_eq!(duplicate.placeholder(), "CONFIG.REFERENCE_ID");

        let missing = assign_reference_rows(vec![input("A", f64::NAN)], 1)
            .expect_err("nan ordinate should fail");
        assert_eq!(missing.placeholder(), "CONFIG.REFERENCE_ALONGSHORE");
    }
}
