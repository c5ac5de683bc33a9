//! Indicator stage: classifies reference points against the traced frontiers.

mod model;
mod pipeline;

pub use model::{
    IndicatorDocument, IndicatorSummary, IndicatorTotals, LevelCounts, overall_indicator_path,
    step_indicator_path,
};
pub use pipeline::{
    IndicatorPipeline, IndicatorRecord, IndicatorRun, OverallIndicators, ReferenceInput,
    StepIndicators, assign_reference_rows,
};

use super::StageExecutor;
use super::helpers::{ArtifactWriter, artifact_list, validate_request_shape};
use super::manifest::ManifestTimeSeries;
use crate::common::config::RunContext;
use crate::domain::{
    ImpactError, ImpactResult, IndicatorKind, PipelineStage, StageArtifact, StageRequest,
    StageResult,
};
use std::path::Path;

pub(crate) const INDICATORS_REQUIRED_INPUTS: [&str; 1] = ["run.json"];
pub(crate) const INDICATORS_EXPECTED_OUTPUTS: [&str; 3] = [
    "corridor_width_overall.json",
    "scarp_distance_overall.json",
    "indicators_summary.json",
];
pub(crate) const INDICATORS_SUMMARY: &str = "indicators_summary.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorsContract {
    pub required_inputs: Vec<StageArtifact>,
    pub expected_outputs: Vec<StageArtifact>,
}

pub struct IndicatorsStage;

impl IndicatorsStage {
    pub fn contract_for_request(&self, request: &StageRequest) -> StageResult<IndicatorsContract> {
        validate_request_shape(request, PipelineStage::Indicators)?;
        Ok(IndicatorsContract {
            required_inputs: artifact_list(&INDICATORS_REQUIRED_INPUTS),
            expected_outputs: artifact_list(&INDICATORS_EXPECTED_OUTPUTS),
        })
    }
}

impl StageExecutor for IndicatorsStage {
    fn execute(&self, request: &StageRequest) -> StageResult<Vec<StageArtifact>> {
        validate_request_shape(request, PipelineStage::Indicators)?;
        let series = ManifestTimeSeries::open(&request.manifest_path)?;
        let references = series.reference_inputs()?.ok_or_else(|| {
            ImpactError::configuration(
                "CONFIG.REFERENCE_POINTS_MISSING",
                format!(
                    "indicators need 'referencePoints' in '{}'",
                    request.manifest_path.display()
                ),
            )
        })?;

        let manifest = series.manifest();
        let run = IndicatorPipeline::new(manifest.config.clone()).run(&series, references)?;
        let context = RunContext {
            run_id: &manifest.run_id,
            epsg: manifest.epsg,
            config: &manifest.config,
        };
        let (_, artifacts) =
            write_indicator_run(&run, context, manifest.steps.len(), &request.output_dir)?;
        Ok(artifacts)
    }
}

/// Writes per-step and overall indicator records plus the run summary.
pub fn write_indicator_run(
    run: &IndicatorRun,
    context: RunContext<'_>,
    steps_total: usize,
    output_dir: &Path,
) -> ImpactResult<(IndicatorSummary, Vec<StageArtifact>)> {
    let mut writer = ArtifactWriter::create(output_dir, PipelineStage::Indicators)?;
    let indicators = [IndicatorKind::CorridorWidth, IndicatorKind::ScarpDistance];

    for step in &run.steps {
        for indicator in indicators {
            let records: Vec<&IndicatorRecord> = step
                .records
                .iter()
                .filter(|record| record.indicator == indicator)
                .collect();
            if records.is_empty() {
                continue;
            }
            let document = IndicatorDocument {
                run_id: context.run_id,
                epsg: context.epsg,
                indicator,
                step_index: Some(step.step_index),
                time: Some(step.time),
                records,
            };
            writer.json(&step_indicator_path(indicator, step.time), &document)?;
        }
    }

    for indicator in indicators {
        let document = IndicatorDocument {
            run_id: context.run_id,
            epsg: context.epsg,
            indicator,
            step_index: None,
            time: None,
            records: run.overall_records(indicator).collect(),
        };
        writer.json(&overall_indicator_path(indicator), &document)?;
    }

    let summary = IndicatorSummary::from_run(context.run_id, steps_total, run);
    writer.json(INDICATORS_SUMMARY, &summary)?;
    Ok((summary, writer.finish()))
}

#[cfg(test)]
mod tests {
    use super::{IndicatorPipeline, IndicatorsStage, ReferenceInput, write_indicator_run};
    use crate::common::config::{RunConfig, RunContext, WaterLineMethod};
    use crate::domain::{IndicatorKind, PipelineStage, RiskLevel, StageArtifact, StageRequest};
    use crate::modules::StageExecutor;
    use crate::modules::classify::ReferenceGeometry;
    use crate::modules::mesh::{Grid, MeshField, MeshGeometry};
    use crate::modules::series::InMemoryTimeSeries;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    const ROWS: usize = 3;
    const COLS: usize = 6;

    fn eroding_series() -> InMemoryTimeSeries {
        let x_row: Vec<f64> = (0..COLS).map(|col| col as f64 * 10.0).collect();
        let x = Grid::from_rows(&vec![x_row; ROWS]).expect("x grid should build");
        let y = Grid::from_rows(
            &(0..ROWS)
                .map(|row| vec![row as f64 * 10.0; COLS])
                .collect::<Vec<_>>(),
        )
        .expect("y grid should build");
        let mut series =
            InMemoryTimeSeries::new(MeshGeometry::new(x, y).expect("geometry should build"));

        for step in 0..7 {
            let mut bed = vec![vec![1.0; COLS]; ROWS];
            if step >= 5 {
                bed[0][4] = 0.4;
            }
            series.push_step(
                step as f64 * 3600.0,
                BTreeMap::from([
                    (MeshField::BedLevel, Grid::from_rows(&bed).expect("bed")),
                    (MeshField::MaxWaterLevel, Grid::filled(ROWS, COLS, 0.0).expect("grid")),
                ]),
            );
        }
        series
    }

    fn references() -> Vec<ReferenceInput> {
        (0..ROWS)
            .map(|row| ReferenceInput {
                id: format!("R{row}"),
                alongshore: row as f64 * 10.0,
                geometry: ReferenceGeometry::Point([40.0, row as f64 * 10.0]),
            })
            .collect()
    }

    fn config() -> RunConfig {
        RunConfig {
            water_line_method: WaterLineMethod::FlowDepth { min_depth: 0.05 },
            ..RunConfig::default()
        }
    }

    #[test]
    fn single_eroding_row_stays_isolated_through_the_run() {
        let run = IndicatorPipeline::new(config())
            .run(&eroding_series(), references())
            .expect("indicators should run");

        let step_five = run
            .steps
            .iter()
            .find(|step| step.step_index == 5)
            .expect("step 5 should be processed");
        let scarp = step_five
            .erosion_scarp
            .as_ref()
            .expect("erosion window should be active at step 5");
        assert_eq!(scarp.len(), 1);
        assert_eq!(scarp.points()[0].row, 0);
        assert_eq!(scarp.points()[0].column, 4);

        assert_eq!(run.overall.erosion_scarp.rows().collect::<Vec<_>>(), vec![0]);

        let overall: Vec<_> = run.overall_records(IndicatorKind::ScarpDistance).collect();
        assert_eq!(overall.len(), ROWS);
        assert_eq!(overall[0].level, RiskLevel::High);
        for record in &overall[1..] {
            assert!(record.distance.is_infinite());
            assert_eq!(record.level, RiskLevel::Low);
        }
        assert_eq!(run.rows_without_frontier(IndicatorKind::ScarpDistance), 2);
    }

    #[test]
    fn indicator_artifacts_record_unreached_rows_as_null() {
        let config = config();
        let run = IndicatorPipeline::new(config.clone())
            .run(&eroding_series(), references())
            .expect("indicators should run");
        let context = RunContext {
            run_id: "scenario-a",
            epsg: None,
            config: &config,
        };
        let temp = TempDir::new().expect("tempdir should be created");

        let (summary, artifacts) = write_indicator_run(&run, context, 7, temp.path())
            .expect("artifacts should be written");

        assert_eq!(summary.steps_processed, 7);
        assert_eq!(summary.steps_skipped, 0);
        let scarp_totals = summary
            .indicators
            .iter()
            .find(|totals| totals.indicator == IndicatorKind::ScarpDistance)
            .expect("scarp totals should exist");
        assert_eq!(scarp_totals.steps_classified, 4);
        assert_eq!(scarp_totals.overall_levels.high, 1);
        assert_eq!(scarp_totals.overall_levels.low, 2);

        let names: Vec<String> = artifacts.iter().map(StageArtifact::display_name).collect();
        assert!(names.contains(&"corridor_width/corridor_width_000.00hrs.json".to_string()));
        assert!(names.contains(&"scarp_distance/scarp_distance_003.00hrs.json".to_string()));
        assert!(!names.contains(&"scarp_distance/scarp_distance_002.00hrs.json".to_string()));

        let overall: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(temp.path().join("scarp_distance_overall.json"))
                .expect("overall scarp distances should exist"),
        )
        .expect("overall scarp distances should parse");
        assert_eq!(overall["records"][0]["level"], "High");
        assert!(overall["records"][1]["distance"].is_null());
        assert_eq!(overall["records"][1]["level"], "Low");
    }

    #[test]
    fn executor_rejects_post_process_requests() {
        let request = StageRequest::new("R1", PipelineStage::PostProcess, "run.json", "out");
        assert!(IndicatorsStage.execute(&request).is_err());
    }
}
